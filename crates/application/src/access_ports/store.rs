use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rebanho_core::{AppResult, Principal, PrincipalId};
use rebanho_domain::{Permission, PermissionId, Profile, ProfileId};

/// Grant row joined with its catalog permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecord {
    /// Profile owning the grant.
    pub profile_id: ProfileId,
    /// Granted or revoked catalog permission.
    pub permission: Permission,
    /// Whether the permission is currently granted.
    pub granted: bool,
    /// Last change timestamp.
    pub updated_at: DateTime<Utc>,
    /// Administrator who last changed the row.
    pub updated_by: Option<PrincipalId>,
}

/// Input payload for grant upserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertGrantInput {
    /// Target profile.
    pub profile_id: ProfileId,
    /// Target catalog permission.
    pub permission_id: PermissionId,
    /// New grant value.
    pub granted: bool,
    /// Administrator performing the change.
    pub updated_by: PrincipalId,
}

/// Remote permission store consumed by the permission resolver.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Returns the profile assigned on the principal's membership record.
    ///
    /// Membership rows are matched by principal id first, then by email.
    async fn profile_for_principal(&self, principal: &Principal) -> AppResult<Option<Profile>>;

    /// Returns the legacy free-text church role on the membership record.
    async fn legacy_role_for_principal(&self, principal: &Principal)
    -> AppResult<Option<String>>;

    /// Finds a profile by machine name.
    async fn find_profile_by_name(&self, name: &str) -> AppResult<Option<Profile>>;

    /// Lists every grant row of a profile, granted or not.
    async fn grants_for_profile(&self, profile_id: ProfileId) -> AppResult<Vec<GrantRecord>>;

    /// Inserts or replaces the grant row for one profile and permission.
    ///
    /// Fails with `NotFound` when either side does not exist.
    async fn upsert_grant(&self, input: UpsertGrantInput) -> AppResult<GrantRecord>;
}
