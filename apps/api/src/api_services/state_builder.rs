use std::sync::Arc;

use rebanho_application::{
    Clock, IdentityService, PermissionService, ProfileAdminService, SystemClock,
};
use rebanho_infrastructure::{
    InMemoryDecisionCache, PostgresCoarseFlagRepository, PostgresPermissionStore,
    PostgresProfileAdminRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Decisions stay process-local; a restart always re-resolves.
    let decision_cache = Arc::new(InMemoryDecisionCache::with_freshness_window(
        clock.clone(),
        config.permission_cache_ttl,
    ));
    let permission_service = PermissionService::new(
        Arc::new(PostgresPermissionStore::new(pool.clone())),
        decision_cache,
    );
    let identity_service = IdentityService::new(
        Arc::new(PostgresCoarseFlagRepository::new(pool.clone())),
        clock,
    )
    .with_freshness_window(config.permission_cache_ttl);
    let profile_admin_service = ProfileAdminService::new(
        permission_service.clone(),
        Arc::new(PostgresProfileAdminRepository::new(pool)),
    );

    AppState {
        permission_service,
        identity_service,
        profile_admin_service,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    }
}
