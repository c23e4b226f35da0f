use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod conversions;

/// Incoming payload for custom profile creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-profile-request.ts"
)]
pub struct CreateProfileRequest {
    pub name: String,
    pub display_name: String,
    pub level: i32,
}

/// Incoming payload for granting or revoking one permission on a profile.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-grant-request.ts"
)]
pub struct UpdateGrantRequest {
    pub permission_id: String,
    pub granted: bool,
}

/// API representation of a profile.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/profile-response.ts"
)]
pub struct ProfileResponse {
    pub profile_id: String,
    pub name: String,
    pub display_name: String,
    pub level: i32,
    pub is_active: bool,
    pub is_system: bool,
}

/// API representation of a catalog permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub permission_id: String,
    pub key: String,
    pub subject: String,
    pub action: String,
    pub resource_type: Option<String>,
    pub description: String,
    pub is_sensitive: bool,
}

/// API representation of one profile grant row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-response.ts"
)]
pub struct GrantResponse {
    pub profile_id: String,
    pub permission: PermissionResponse,
    pub granted: bool,
    pub updated_at: String,
    pub updated_by: Option<String>,
}
