use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use rebanho_core::{Principal, PrincipalId};
use rebanho_domain::CoarseFlags;

use crate::access_ports::{Clock, CoarseFlagRepository, IdentityProvider, default_freshness_window};

#[derive(Debug, Clone, Copy)]
struct CachedFlags {
    flags: CoarseFlags,
    resolved_at: DateTime<Utc>,
}

/// Resolves the calling principal and its coarse system-level flags.
///
/// Identity checks gate rendering, so every remote failure degrades to
/// anonymous or to all-false flags instead of surfacing an error.
#[derive(Clone)]
pub struct IdentityService {
    flag_repository: Arc<dyn CoarseFlagRepository>,
    clock: Arc<dyn Clock>,
    freshness_window: TimeDelta,
    flags_cache: Arc<RwLock<HashMap<PrincipalId, CachedFlags>>>,
}

impl IdentityService {
    /// Creates an identity service with the default freshness window.
    #[must_use]
    pub fn new(flag_repository: Arc<dyn CoarseFlagRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            flag_repository,
            clock,
            freshness_window: default_freshness_window(),
            flags_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Overrides how long resolved flags are trusted.
    #[must_use]
    pub fn with_freshness_window(mut self, freshness_window: TimeDelta) -> Self {
        self.freshness_window = freshness_window;
        self
    }

    /// Returns the principal holding the active session, `None` when anonymous.
    pub async fn resolve_current_principal(
        &self,
        provider: &dyn IdentityProvider,
    ) -> Option<Principal> {
        match provider.current_principal().await {
            Ok(principal) => principal,
            Err(error) => {
                warn!(%error, "identity lookup failed, treating caller as anonymous");
                None
            }
        }
    }

    /// Returns coarse flags for a principal, served from cache while fresh.
    pub async fn refresh_coarse_flags(
        &self,
        principal_id: PrincipalId,
        force_refresh: bool,
    ) -> CoarseFlags {
        let now = self.clock.now();

        if !force_refresh
            && let Some(cached) = self.flags_cache.read().await.get(&principal_id)
            && now.signed_duration_since(cached.resolved_at) < self.freshness_window
        {
            debug!(%principal_id, "coarse flags served from cache");
            return cached.flags;
        }

        match self.flag_repository.coarse_flags(principal_id).await {
            Ok(flags) => {
                self.flags_cache.write().await.insert(
                    principal_id,
                    CachedFlags {
                        flags,
                        resolved_at: self.clock.now(),
                    },
                );
                debug!(%principal_id, ?flags, "coarse flags resolved");
                flags
            }
            Err(error) => {
                warn!(%principal_id, %error, "coarse flag lookup failed, clearing elevated flags");
                self.flags_cache.write().await.remove(&principal_id);
                CoarseFlags::none()
            }
        }
    }

    /// Drops memoized flags for a principal.
    pub async fn forget_principal(&self, principal_id: PrincipalId) {
        self.flags_cache.write().await.remove(&principal_id);
    }
}
