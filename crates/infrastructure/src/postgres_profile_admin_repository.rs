use async_trait::async_trait;
use sqlx::PgPool;

use rebanho_application::{CreateProfileInput, ProfileAdminRepository};
use rebanho_core::{AppError, AppResult};
use rebanho_domain::{Permission, Profile, ProfileId};

use crate::postgres_permission_store::{PermissionRow, ProfileRow};

/// PostgreSQL-backed repository for profile administration.
#[derive(Clone)]
pub struct PostgresProfileAdminRepository {
    pool: PgPool,
}

impl PostgresProfileAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileAdminRepository for PostgresProfileAdminRepository {
    async fn list_profiles(&self) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, display_name, level, is_active, is_system
            FROM profiles
            ORDER BY level DESC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list profiles: {error}")))?;

        rows.into_iter().map(ProfileRow::into_profile).collect()
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                id AS permission_id,
                subject,
                action,
                resource_type,
                description,
                is_sensitive
            FROM permissions
            ORDER BY subject, action, resource_type
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission catalog: {error}"))
        })?;

        rows.into_iter().map(PermissionRow::into_permission).collect()
    }

    async fn find_profile(&self, profile_id: ProfileId) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, display_name, level, is_active, is_system
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(profile_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find profile '{profile_id}': {error}"))
        })?;

        row.map(ProfileRow::into_profile).transpose()
    }

    async fn create_profile(&self, input: CreateProfileInput) -> AppResult<Profile> {
        let candidate = Profile::new(
            ProfileId::new(),
            input.name,
            input.display_name,
            input.level,
            true,
            false,
        )?;

        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (id, name, display_name, level, is_active, is_system)
            VALUES ($1, $2, $3, $4, TRUE, FALSE)
            RETURNING id, name, display_name, level, is_active, is_system
            "#,
        )
        .bind(candidate.id().as_uuid())
        .bind(candidate.name())
        .bind(candidate.display_name())
        .bind(candidate.level())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_profile_conflict(error, candidate.name()))?;

        row.into_profile()
    }

    async fn set_profile_active(
        &self,
        profile_id: ProfileId,
        is_active: bool,
    ) -> AppResult<Profile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET is_active = $2
            WHERE id = $1
            RETURNING id, name, display_name, level, is_active, is_system
            "#,
        )
        .bind(profile_id.as_uuid())
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update profile '{profile_id}' status: {error}"
            ))
        })?
        .ok_or_else(|| AppError::NotFound(format!("profile '{profile_id}' was not found")))?;

        row.into_profile()
    }
}

fn map_profile_conflict(error: sqlx::Error, profile_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("profile '{profile_name}' already exists"));
    }

    AppError::Internal(format!("failed to create profile: {error}"))
}
