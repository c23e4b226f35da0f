use rebanho_application::ResolvedAccess;
use rebanho_core::Principal;
use rebanho_domain::CoarseFlags;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::{CoarseFlagsResponse, PrincipalResponse};
use super::security::ProfileResponse;

/// Effective access of the signed-in principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/access-summary-response.ts"
)]
pub struct AccessSummaryResponse {
    pub principal: PrincipalResponse,
    pub profile: Option<ProfileResponse>,
    pub permissions: Vec<String>,
    pub is_admin: bool,
    pub flags: CoarseFlagsResponse,
}

impl AccessSummaryResponse {
    pub fn new(
        principal: &Principal,
        access: ResolvedAccess,
        is_admin: bool,
        flags: CoarseFlags,
    ) -> Self {
        Self {
            principal: PrincipalResponse::from(principal),
            permissions: access.permissions.iter().map(ToString::to_string).collect(),
            profile: access.profile.map(ProfileResponse::from),
            is_admin,
            flags: CoarseFlagsResponse::from(flags),
        }
    }
}

/// Query string of a single permission check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/access-check-query.ts"
)]
pub struct AccessCheckQuery {
    pub subject: String,
    pub action: String,
    pub resource_type: Option<String>,
}

/// Outcome of a single permission check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/access-check-response.ts"
)]
pub struct AccessCheckResponse {
    pub subject: String,
    pub action: String,
    pub resource_type: Option<String>,
    pub allowed: bool,
}
