use async_trait::async_trait;
use rebanho_core::{AppResult, Principal, PrincipalId};
use rebanho_domain::CoarseFlags;

/// Port answering who holds the active session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the signed-in principal, or `None` without an active session.
    async fn current_principal(&self) -> AppResult<Option<Principal>>;
}

/// Remote source of coarse system-level flags.
#[async_trait]
pub trait CoarseFlagRepository: Send + Sync {
    /// Loads admin, site-admin and mission-pastor flags for a principal.
    async fn coarse_flags(&self, principal_id: PrincipalId) -> AppResult<CoarseFlags>;
}
