use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use rebanho_application::{Clock, DecisionCache, DecisionCacheEntry, default_freshness_window};
use rebanho_core::{AppResult, PrincipalId};
use rebanho_domain::{PermissionSet, Profile, ProfileId};
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local decision cache adapter.
///
/// Entries live only as long as the process and are never persisted.
pub struct InMemoryDecisionCache {
    clock: Arc<dyn Clock>,
    freshness_window: TimeDelta,
    entries: RwLock<HashMap<PrincipalId, DecisionCacheEntry>>,
}

impl InMemoryDecisionCache {
    /// Creates an empty cache using the default freshness window.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_freshness_window(clock, default_freshness_window())
    }

    /// Creates an empty cache trusting entries for `freshness_window`.
    #[must_use]
    pub fn with_freshness_window(clock: Arc<dyn Clock>, freshness_window: TimeDelta) -> Self {
        Self {
            clock,
            freshness_window,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of cached principals, stale entries included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether no principal is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DecisionCache for InMemoryDecisionCache {
    async fn get(&self, principal_id: PrincipalId) -> AppResult<Option<DecisionCacheEntry>> {
        Ok(self.entries.read().await.get(&principal_id).cloned())
    }

    async fn put(
        &self,
        principal_id: PrincipalId,
        permissions: PermissionSet,
        profile: Option<Profile>,
    ) -> AppResult<DecisionCacheEntry> {
        let entry = DecisionCacheEntry {
            permissions,
            profile,
            resolved_at: self.clock.now(),
        };

        self.entries
            .write()
            .await
            .insert(principal_id, entry.clone());

        Ok(entry)
    }

    fn is_fresh(&self, entry: &DecisionCacheEntry) -> bool {
        entry.is_fresh_at(self.clock.now(), self.freshness_window)
    }

    async fn evict(&self, principal_id: PrincipalId) -> AppResult<()> {
        self.entries.write().await.remove(&principal_id);
        Ok(())
    }

    async fn evict_by_profile(&self, profile_id: ProfileId) -> AppResult<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.belongs_to_profile(profile_id));
        let evicted = before - entries.len();

        debug!(%profile_id, evicted, "evicted cached decisions for profile");
        Ok(evicted)
    }
}
