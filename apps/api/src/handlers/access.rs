use axum::Json;
use axum::extract::{Extension, Query, State};
use rebanho_core::Principal;
use rebanho_domain::PermissionKey;
use tracing::debug;

use crate::dto::{AccessCheckQuery, AccessCheckResponse, AccessSummaryResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn access_summary_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<AccessSummaryResponse>> {
    Ok(Json(summarize(&state, &principal, false).await))
}

pub async fn refresh_access_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<AccessSummaryResponse>> {
    Ok(Json(summarize(&state, &principal, true).await))
}

/// Answers one capability question; malformed keys are denied, never rejected.
pub async fn access_check_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AccessCheckQuery>,
) -> ApiResult<Json<AccessCheckResponse>> {
    let allowed = match PermissionKey::new(
        query.subject.as_str(),
        query.action.as_str(),
        query.resource_type.clone(),
    ) {
        Ok(requested) => state.permission_service.can(&principal, &requested).await,
        Err(error) => {
            debug!(%error, principal_id = %principal.id(), "malformed permission check denied");
            false
        }
    };

    Ok(Json(AccessCheckResponse {
        subject: query.subject,
        action: query.action,
        resource_type: query.resource_type,
        allowed,
    }))
}

async fn summarize(
    state: &AppState,
    principal: &Principal,
    force_refresh: bool,
) -> AccessSummaryResponse {
    let access = state
        .permission_service
        .resolve(principal, force_refresh)
        .await;
    let is_admin = state.permission_service.is_admin(principal).await;
    let flags = state
        .identity_service
        .refresh_coarse_flags(principal.id(), false)
        .await;

    AccessSummaryResponse::new(principal, access, is_admin, flags)
}

#[cfg(test)]
mod tests;
