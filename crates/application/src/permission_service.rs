use std::sync::Arc;

use rebanho_core::{AppError, AppResult, Principal, PrincipalId};
use rebanho_domain::{ADMIN_MANAGE_SYSTEM, PermissionKey, PermissionSet, Profile, ProfileId};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::access_ports::{DecisionCache, DecisionCacheEntry, PermissionStore};

mod grants;
mod in_flight;
mod resolution;

use in_flight::KeyedLocks;

/// Permissions and profile resolved for one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccess {
    /// Effective profile, `None` for principals on the default set.
    pub profile: Option<Profile>,
    /// Effective permission keys.
    pub permissions: PermissionSet,
}

impl ResolvedAccess {
    /// Fail-closed resolution: no profile and no permissions.
    #[must_use]
    pub fn denied() -> Self {
        Self {
            profile: None,
            permissions: PermissionSet::empty(),
        }
    }

    /// Returns whether the resolution answers the requested key.
    #[must_use]
    pub fn allows(&self, requested: &PermissionKey) -> bool {
        self.permissions.allows(requested)
    }
}

impl From<DecisionCacheEntry> for ResolvedAccess {
    fn from(entry: DecisionCacheEntry) -> Self {
        Self {
            profile: entry.profile,
            permissions: entry.permissions,
        }
    }
}

/// Application service mapping principals to checkable permission sets.
#[derive(Clone)]
pub struct PermissionService {
    store: Arc<dyn PermissionStore>,
    cache: Arc<dyn DecisionCache>,
    in_flight: Arc<KeyedLocks<PrincipalId>>,
    // Bumped on every profile eviction. Resolutions that overlap a bump
    // return their result without caching it.
    eviction_epoch: Arc<RwLock<u64>>,
}

impl PermissionService {
    /// Creates a permission service over a store and a decision cache.
    #[must_use]
    pub fn new(store: Arc<dyn PermissionStore>, cache: Arc<dyn DecisionCache>) -> Self {
        Self {
            store,
            cache,
            in_flight: Arc::new(KeyedLocks::default()),
            eviction_epoch: Arc::new(RwLock::new(0)),
        }
    }

    /// Returns whether the principal holds the requested permission.
    pub async fn can(&self, principal: &Principal, requested: &PermissionKey) -> bool {
        self.resolve(principal, false).await.allows(requested)
    }

    /// Returns whether the principal holds the system administration permission.
    pub async fn is_admin(&self, principal: &Principal) -> bool {
        match admin_key() {
            Ok(key) => self.can(principal, &key).await,
            Err(error) => {
                warn!(%error, "admin permission key is invalid");
                false
            }
        }
    }

    /// Ensures the principal holds the system administration permission.
    pub async fn require_admin(&self, principal: &Principal) -> AppResult<()> {
        if self.is_admin(principal).await {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "principal '{}' is missing permission '{}.{}'",
            principal.id(),
            ADMIN_MANAGE_SYSTEM.0,
            ADMIN_MANAGE_SYSTEM.1
        )))
    }

    /// Drops the cached decisions of one principal.
    pub async fn evict_principal(&self, principal_id: PrincipalId) {
        if let Err(error) = self.cache.evict(principal_id).await {
            warn!(%principal_id, %error, "failed to evict cached decisions");
        }
    }

    /// Drops the cached decisions of every principal resolved to a profile.
    ///
    /// Resolutions still running when this is called do not cache their
    /// result, so rows they read before the change cannot outlive it.
    pub async fn evict_profile(&self, profile_id: ProfileId) -> AppResult<usize> {
        let mut epoch = self.eviction_epoch.write().await;
        *epoch = epoch.wrapping_add(1);

        let evicted = self.cache.evict_by_profile(profile_id).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to evict cached decisions for profile '{profile_id}': {error}"
            ))
        })?;
        drop(epoch);

        debug!(%profile_id, evicted, "evicted cached decisions for profile");
        Ok(evicted)
    }
}

fn admin_key() -> AppResult<PermissionKey> {
    PermissionKey::new(ADMIN_MANAGE_SYSTEM.0, ADMIN_MANAGE_SYSTEM.1, None)
}
