//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod access_session;
mod identity_service;
mod permission_service;
mod profile_admin_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    Clock, CoarseFlagRepository, CreateProfileInput, DEFAULT_FRESHNESS_WINDOW_SECONDS,
    DecisionCache, DecisionCacheEntry, GrantRecord, IdentityProvider, PermissionStore,
    ProfileAdminRepository, SystemClock, UpsertGrantInput, default_freshness_window,
};
pub use access_session::{AccessSession, AuthEvent, PrincipalState};
pub use identity_service::IdentityService;
pub use permission_service::{PermissionService, ResolvedAccess};
pub use profile_admin_service::ProfileAdminService;
