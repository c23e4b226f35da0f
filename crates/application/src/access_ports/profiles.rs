use async_trait::async_trait;
use rebanho_core::AppResult;
use rebanho_domain::{Permission, Profile, ProfileId};

/// Input payload for creating custom profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProfileInput {
    /// Unique snake_case machine name.
    pub name: String,
    /// Human-facing name.
    pub display_name: String,
    /// Seniority level.
    pub level: i32,
}

/// Repository port for profile administration.
#[async_trait]
pub trait ProfileAdminRepository: Send + Sync {
    /// Lists all profiles, active or not, ordered by level descending.
    async fn list_profiles(&self) -> AppResult<Vec<Profile>>;

    /// Lists the immutable permission catalog.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Finds one profile by id.
    async fn find_profile(&self, profile_id: ProfileId) -> AppResult<Option<Profile>>;

    /// Creates a non-system, active profile.
    async fn create_profile(&self, input: CreateProfileInput) -> AppResult<Profile>;

    /// Flips the active flag of a profile.
    async fn set_profile_active(&self, profile_id: ProfileId, is_active: bool)
    -> AppResult<Profile>;
}
