use rebanho_core::Principal;
use rebanho_domain::CoarseFlags;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of the signed-in principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/principal-response.ts"
)]
pub struct PrincipalResponse {
    pub principal_id: String,
    pub email: Option<String>,
    pub display_name: String,
}

/// Coarse system-level flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/coarse-flags-response.ts"
)]
pub struct CoarseFlagsResponse {
    pub is_admin: bool,
    pub is_site_admin: bool,
    pub is_mission_pastor: bool,
}

/// Session payload returned on sign-in and identity lookups.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/session-response.ts"
)]
pub struct SessionResponse {
    pub principal: PrincipalResponse,
    pub flags: CoarseFlagsResponse,
}

impl SessionResponse {
    pub fn new(principal: &Principal, flags: CoarseFlags) -> Self {
        Self {
            principal: PrincipalResponse::from(principal),
            flags: CoarseFlagsResponse::from(flags),
        }
    }
}

impl From<&Principal> for PrincipalResponse {
    fn from(value: &Principal) -> Self {
        Self {
            principal_id: value.id().to_string(),
            email: value.email().map(str::to_owned),
            display_name: value.display_name().to_owned(),
        }
    }
}

impl From<CoarseFlags> for CoarseFlagsResponse {
    fn from(value: CoarseFlags) -> Self {
        Self {
            is_admin: value.is_admin,
            is_site_admin: value.is_site_admin,
            is_mission_pastor: value.is_mission_pastor,
        }
    }
}
