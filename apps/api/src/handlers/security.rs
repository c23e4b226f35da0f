use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use rebanho_application::CreateProfileInput;
use rebanho_core::Principal;
use rebanho_domain::{PermissionId, ProfileId};

use crate::dto::{
    CreateProfileRequest, GrantResponse, PermissionResponse, ProfileResponse, UpdateGrantRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_profiles_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let profiles = state
        .profile_admin_service
        .list_profiles(&principal)
        .await?
        .into_iter()
        .map(ProfileResponse::from)
        .collect();

    Ok(Json(profiles))
}

pub async fn create_profile_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateProfileRequest>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    let profile = state
        .profile_admin_service
        .create_profile(
            &principal,
            CreateProfileInput {
                name: payload.name,
                display_name: payload.display_name,
                level: payload.level,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

pub async fn deactivate_profile_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile_id = ProfileId::from_str(profile_id.as_str())?;
    let profile = state
        .profile_admin_service
        .deactivate_profile(&principal, profile_id)
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn list_permission_catalog_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .profile_admin_service
        .list_permission_catalog(&principal)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn list_profile_grants_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<Vec<GrantResponse>>> {
    let profile_id = ProfileId::from_str(profile_id.as_str())?;
    let grants = state
        .profile_admin_service
        .list_profile_grants(&principal, profile_id)
        .await?
        .into_iter()
        .map(GrantResponse::from)
        .collect();

    Ok(Json(grants))
}

pub async fn update_profile_grant_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(profile_id): Path<String>,
    Json(payload): Json<UpdateGrantRequest>,
) -> ApiResult<Json<GrantResponse>> {
    let profile_id = ProfileId::from_str(profile_id.as_str())?;
    let permission_id = PermissionId::from_str(payload.permission_id.as_str())?;

    let grant = state
        .permission_service
        .grant_permission(&principal, profile_id, permission_id, payload.granted)
        .await?;

    Ok(Json(GrantResponse::from(grant)))
}
