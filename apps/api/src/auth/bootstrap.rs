use std::str::FromStr;

use axum::Json;
use axum::extract::State;
use rebanho_core::{AppError, NonEmptyString, Principal, PrincipalId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::dto::SessionResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_PRINCIPAL_KEY;

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub token: String,
    pub principal_id: Option<String>,
    pub email: Option<String>,
    pub display_name: String,
}

pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<Json<SessionResponse>> {
    if payload.token != state.bootstrap_token {
        warn!("bootstrap sign-in rejected");
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let principal_id = payload
        .principal_id
        .as_deref()
        .map(PrincipalId::from_str)
        .transpose()?
        .unwrap_or_default();
    let display_name = NonEmptyString::new(payload.display_name)?;
    let principal = Principal::new(principal_id, payload.email, display_name.as_str());

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_PRINCIPAL_KEY, &principal)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session principal: {error}"))
        })?;

    // A fresh sign-in never trusts previously cached flags.
    let flags = state
        .identity_service
        .refresh_coarse_flags(principal.id(), true)
        .await;

    info!(principal_id = %principal.id(), "bootstrap sign-in");
    Ok(Json(SessionResponse::new(&principal, flags)))
}
