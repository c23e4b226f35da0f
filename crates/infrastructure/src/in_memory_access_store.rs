use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rebanho_application::{
    CoarseFlagRepository, CreateProfileInput, GrantRecord, PermissionStore,
    ProfileAdminRepository, UpsertGrantInput,
};
use rebanho_core::{AppError, AppResult, Principal, PrincipalId};
use rebanho_domain::{CoarseFlags, Permission, PermissionId, Profile, ProfileId};
use tokio::sync::RwLock;

/// Membership record linking a principal to church data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    /// Linked principal, when the member has an account.
    pub principal_id: Option<PrincipalId>,
    /// Contact email used when no principal is linked.
    pub email: Option<String>,
    /// Assigned profile.
    pub profile_id: Option<ProfileId>,
    /// Legacy free-text church role.
    pub legacy_role: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredGrant {
    granted: bool,
    updated_at: chrono::DateTime<Utc>,
    updated_by: Option<PrincipalId>,
}

/// In-memory access store for local runs and tests.
///
/// Implements the permission store, the profile administration repository and
/// the coarse flag source over one shared state.
#[derive(Debug, Default)]
pub struct InMemoryAccessStore {
    profiles: RwLock<HashMap<ProfileId, Profile>>,
    permissions: RwLock<Vec<Permission>>,
    grants: RwLock<HashMap<(ProfileId, PermissionId), StoredGrant>>,
    members: RwLock<Vec<MemberRecord>>,
    coarse_flags: RwLock<HashMap<PrincipalId, CoarseFlags>>,
}

impl InMemoryAccessStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a profile.
    pub async fn insert_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id(), profile);
    }

    /// Adds a catalog permission.
    pub async fn insert_permission(&self, permission: Permission) {
        let mut permissions = self.permissions.write().await;
        permissions.retain(|stored| stored.id != permission.id);
        permissions.push(permission);
    }

    /// Adds a membership record.
    pub async fn insert_member(&self, member: MemberRecord) {
        self.members.write().await.push(member);
    }

    /// Sets the coarse flags reported for a principal.
    pub async fn set_coarse_flags(&self, principal_id: PrincipalId, flags: CoarseFlags) {
        self.coarse_flags.write().await.insert(principal_id, flags);
    }

    async fn member_for(&self, principal: &Principal) -> Option<MemberRecord> {
        let members = self.members.read().await;
        let by_id = members
            .iter()
            .find(|member| member.principal_id == Some(principal.id()));
        let by_email = || {
            principal.email().and_then(|email| {
                members.iter().find(|member| {
                    member
                        .email
                        .as_deref()
                        .is_some_and(|stored| stored.trim().eq_ignore_ascii_case(email))
                })
            })
        };

        by_id.or_else(by_email).cloned()
    }

    async fn permission_by_id(&self, permission_id: PermissionId) -> Option<Permission> {
        self.permissions
            .read()
            .await
            .iter()
            .find(|permission| permission.id == permission_id)
            .cloned()
    }
}

#[async_trait]
impl PermissionStore for InMemoryAccessStore {
    async fn profile_for_principal(&self, principal: &Principal) -> AppResult<Option<Profile>> {
        let Some(profile_id) = self
            .member_for(principal)
            .await
            .and_then(|member| member.profile_id)
        else {
            return Ok(None);
        };

        Ok(self.profiles.read().await.get(&profile_id).cloned())
    }

    async fn legacy_role_for_principal(
        &self,
        principal: &Principal,
    ) -> AppResult<Option<String>> {
        Ok(self
            .member_for(principal)
            .await
            .and_then(|member| member.legacy_role))
    }

    async fn find_profile_by_name(&self, name: &str) -> AppResult<Option<Profile>> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .find(|profile| profile.name() == name)
            .cloned())
    }

    async fn grants_for_profile(&self, profile_id: ProfileId) -> AppResult<Vec<GrantRecord>> {
        let permissions = self.permissions.read().await;
        let grants = self.grants.read().await;

        let mut records: Vec<GrantRecord> = permissions
            .iter()
            .filter_map(|permission| {
                grants
                    .get(&(profile_id, permission.id))
                    .map(|grant| GrantRecord {
                        profile_id,
                        permission: permission.clone(),
                        granted: grant.granted,
                        updated_at: grant.updated_at,
                        updated_by: grant.updated_by,
                    })
            })
            .collect();
        records.sort_by(|left, right| {
            left.permission
                .key
                .to_string()
                .cmp(&right.permission.key.to_string())
        });

        Ok(records)
    }

    async fn upsert_grant(&self, input: UpsertGrantInput) -> AppResult<GrantRecord> {
        if !self.profiles.read().await.contains_key(&input.profile_id) {
            return Err(AppError::NotFound(format!(
                "profile '{}' was not found",
                input.profile_id
            )));
        }

        let permission = self
            .permission_by_id(input.permission_id)
            .await
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "permission '{}' was not found",
                    input.permission_id
                ))
            })?;

        let stored = StoredGrant {
            granted: input.granted,
            updated_at: Utc::now(),
            updated_by: Some(input.updated_by),
        };
        self.grants
            .write()
            .await
            .insert((input.profile_id, input.permission_id), stored.clone());

        Ok(GrantRecord {
            profile_id: input.profile_id,
            permission,
            granted: stored.granted,
            updated_at: stored.updated_at,
            updated_by: stored.updated_by,
        })
    }
}

#[async_trait]
impl ProfileAdminRepository for InMemoryAccessStore {
    async fn list_profiles(&self) -> AppResult<Vec<Profile>> {
        let mut profiles: Vec<Profile> = self.profiles.read().await.values().cloned().collect();
        profiles.sort_by(|left, right| {
            right
                .level()
                .cmp(&left.level())
                .then_with(|| left.name().cmp(right.name()))
        });

        Ok(profiles)
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let mut permissions = self.permissions.read().await.clone();
        permissions.sort_by_key(|permission| permission.key.to_string());
        Ok(permissions)
    }

    async fn find_profile(&self, profile_id: ProfileId) -> AppResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(&profile_id).cloned())
    }

    async fn create_profile(&self, input: CreateProfileInput) -> AppResult<Profile> {
        let profile = Profile::new(
            ProfileId::new(),
            input.name,
            input.display_name,
            input.level,
            true,
            false,
        )?;

        let mut profiles = self.profiles.write().await;
        if profiles
            .values()
            .any(|stored| stored.name() == profile.name())
        {
            return Err(AppError::Conflict(format!(
                "profile '{}' already exists",
                profile.name()
            )));
        }

        profiles.insert(profile.id(), profile.clone());
        Ok(profile)
    }

    async fn set_profile_active(
        &self,
        profile_id: ProfileId,
        is_active: bool,
    ) -> AppResult<Profile> {
        let mut profiles = self.profiles.write().await;
        let stored = profiles
            .get(&profile_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("profile '{profile_id}' was not found")))?;

        let updated = Profile::new(
            stored.id(),
            stored.name(),
            stored.display_name(),
            stored.level(),
            is_active,
            stored.is_system(),
        )?;
        profiles.insert(profile_id, updated.clone());

        Ok(updated)
    }
}

#[async_trait]
impl CoarseFlagRepository for InMemoryAccessStore {
    async fn coarse_flags(&self, principal_id: PrincipalId) -> AppResult<CoarseFlags> {
        Ok(self
            .coarse_flags
            .read()
            .await
            .get(&principal_id)
            .copied()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests;
