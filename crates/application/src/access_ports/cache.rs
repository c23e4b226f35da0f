use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use rebanho_core::{AppResult, PrincipalId};
use rebanho_domain::{PermissionSet, Profile, ProfileId};

/// Default freshness window for resolved decisions and coarse flags.
pub const DEFAULT_FRESHNESS_WINDOW_SECONDS: i64 = 300;

/// Returns [`DEFAULT_FRESHNESS_WINDOW_SECONDS`] as a duration.
#[must_use]
pub fn default_freshness_window() -> TimeDelta {
    TimeDelta::seconds(DEFAULT_FRESHNESS_WINDOW_SECONDS)
}

/// Resolved permissions memoized for one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionCacheEntry {
    /// Resolved permission keys.
    pub permissions: PermissionSet,
    /// Resolved profile, `None` for principals on the default set.
    pub profile: Option<Profile>,
    /// Instant the entry was resolved.
    pub resolved_at: DateTime<Utc>,
}

impl DecisionCacheEntry {
    /// Returns whether the entry is younger than `window` at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        now.signed_duration_since(self.resolved_at) < window
    }

    /// Returns whether the entry was resolved for the given profile.
    #[must_use]
    pub fn belongs_to_profile(&self, profile_id: ProfileId) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|profile| profile.id() == profile_id)
    }
}

/// Process-local memoization of resolved permissions keyed by principal.
///
/// Faults reported by an implementation never block resolution; callers fall
/// through to the permission store.
#[async_trait]
pub trait DecisionCache: Send + Sync {
    /// Returns the entry for a principal, fresh or not.
    async fn get(&self, principal_id: PrincipalId) -> AppResult<Option<DecisionCacheEntry>>;

    /// Stores a resolution stamped with the current time and returns the entry.
    async fn put(
        &self,
        principal_id: PrincipalId,
        permissions: PermissionSet,
        profile: Option<Profile>,
    ) -> AppResult<DecisionCacheEntry>;

    /// Returns whether an entry may still be trusted.
    fn is_fresh(&self, entry: &DecisionCacheEntry) -> bool;

    /// Removes the entry for one principal.
    async fn evict(&self, principal_id: PrincipalId) -> AppResult<()>;

    /// Removes every entry resolved for the given profile and returns how many.
    async fn evict_by_profile(&self, profile_id: ProfileId) -> AppResult<usize>;
}
