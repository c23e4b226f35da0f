use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rebanho_core::{AppError, Principal};
use tower_sessions::Session;
use tracing::info;

use crate::dto::SessionResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_PRINCIPAL_KEY, SessionIdentityProvider};

pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<StatusCode> {
    let principal = session
        .get::<Principal>(SESSION_PRINCIPAL_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session principal: {error}")))?;

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if let Some(principal) = principal {
        state
            .permission_service
            .evict_principal(principal.id())
            .await;
        state
            .identity_service
            .forget_principal(principal.id())
            .await;
        info!(principal_id = %principal.id(), "principal signed out");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<SessionResponse>> {
    let provider = SessionIdentityProvider::new(session);
    let principal = state
        .identity_service
        .resolve_current_principal(&provider)
        .await
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    // Token refreshes land here; cached flags are reused while fresh.
    let flags = state
        .identity_service
        .refresh_coarse_flags(principal.id(), false)
        .await;

    Ok(Json(SessionResponse::new(&principal, flags)))
}
