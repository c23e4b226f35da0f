mod access;
mod common;
mod security;

pub use access::{AccessCheckQuery, AccessCheckResponse, AccessSummaryResponse};
pub use common::{CoarseFlagsResponse, HealthResponse, PrincipalResponse, SessionResponse};
pub use security::{
    CreateProfileRequest, GrantResponse, PermissionResponse, ProfileResponse, UpdateGrantRequest,
};
