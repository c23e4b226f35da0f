use std::sync::Arc;

use tracing::info;

use rebanho_core::{AppError, AppResult, NonEmptyString, Principal};
use rebanho_domain::{Permission, Profile, ProfileId};

use crate::PermissionService;
use crate::access_ports::{CreateProfileInput, GrantRecord, ProfileAdminRepository};

/// Application service for profile and catalog administration.
#[derive(Clone)]
pub struct ProfileAdminService {
    permission_service: PermissionService,
    repository: Arc<dyn ProfileAdminRepository>,
}

impl ProfileAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permission_service: PermissionService,
        repository: Arc<dyn ProfileAdminRepository>,
    ) -> Self {
        Self {
            permission_service,
            repository,
        }
    }

    /// Returns all profiles for administrative users.
    pub async fn list_profiles(&self, actor: &Principal) -> AppResult<Vec<Profile>> {
        self.permission_service.require_admin(actor).await?;
        self.repository.list_profiles().await
    }

    /// Returns the permission catalog for administrative users.
    pub async fn list_permission_catalog(&self, actor: &Principal) -> AppResult<Vec<Permission>> {
        self.permission_service.require_admin(actor).await?;
        self.repository.list_permissions().await
    }

    /// Returns every grant row of one profile.
    pub async fn list_profile_grants(
        &self,
        actor: &Principal,
        profile_id: ProfileId,
    ) -> AppResult<Vec<GrantRecord>> {
        self.permission_service.require_admin(actor).await?;
        self.require_profile(profile_id).await?;
        self.permission_service.grants_for_profile(profile_id).await
    }

    /// Creates a custom profile.
    pub async fn create_profile(
        &self,
        actor: &Principal,
        input: CreateProfileInput,
    ) -> AppResult<Profile> {
        self.permission_service.require_admin(actor).await?;

        let display_name = NonEmptyString::new(input.display_name)?;
        let profile = self
            .repository
            .create_profile(CreateProfileInput {
                name: input.name.trim().to_owned(),
                display_name: display_name.into(),
                level: input.level,
            })
            .await?;

        info!(actor = %actor.id(), profile = profile.name(), "profile created");
        Ok(profile)
    }

    /// Soft-disables a profile and drops cached decisions resolved for it.
    ///
    /// System profiles cannot be deactivated.
    pub async fn deactivate_profile(
        &self,
        actor: &Principal,
        profile_id: ProfileId,
    ) -> AppResult<Profile> {
        self.permission_service.require_admin(actor).await?;

        let profile = self.require_profile(profile_id).await?;
        if profile.is_system() {
            return Err(AppError::Conflict(format!(
                "profile '{}' is reserved by the system and cannot be deactivated",
                profile.name()
            )));
        }

        if !profile.is_active() {
            return Ok(profile);
        }

        let profile = self
            .repository
            .set_profile_active(profile_id, false)
            .await?;
        let evicted = self.permission_service.evict_profile(profile_id).await?;

        info!(actor = %actor.id(), profile = profile.name(), evicted, "profile deactivated");
        Ok(profile)
    }

    async fn require_profile(&self, profile_id: ProfileId) -> AppResult<Profile> {
        self.repository
            .find_profile(profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile '{profile_id}' was not found")))
    }
}
