use rebanho_application::{IdentityService, PermissionService, ProfileAdminService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_service: PermissionService,
    pub identity_service: IdentityService,
    pub profile_admin_service: ProfileAdminService,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
