use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use rebanho_application::{GrantRecord, PermissionStore, UpsertGrantInput};
use rebanho_core::{AppError, AppResult, Principal, PrincipalId};
use rebanho_domain::{Permission, PermissionId, PermissionKey, Profile, ProfileId};

/// PostgreSQL-backed permission store.
#[derive(Clone)]
pub struct PostgresPermissionStore {
    pool: PgPool,
}

impl PostgresPermissionStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProfileRow {
    pub(crate) id: uuid::Uuid,
    pub(crate) name: String,
    pub(crate) display_name: String,
    pub(crate) level: i32,
    pub(crate) is_active: bool,
    pub(crate) is_system: bool,
}

impl ProfileRow {
    pub(crate) fn into_profile(self) -> AppResult<Profile> {
        Profile::new(
            ProfileId::from_uuid(self.id),
            self.name,
            self.display_name,
            self.level,
            self.is_active,
            self.is_system,
        )
        .map_err(|error| AppError::Internal(format!("failed to decode profile row: {error}")))
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PermissionRow {
    pub(crate) permission_id: uuid::Uuid,
    pub(crate) subject: String,
    pub(crate) action: String,
    pub(crate) resource_type: Option<String>,
    pub(crate) description: String,
    pub(crate) is_sensitive: bool,
}

impl PermissionRow {
    pub(crate) fn into_permission(self) -> AppResult<Permission> {
        let key = PermissionKey::new(self.subject.as_str(), self.action.as_str(), self.resource_type)
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode permission '{}.{}': {error}",
                    self.subject, self.action
                ))
            })?;

        Ok(Permission {
            id: PermissionId::from_uuid(self.permission_id),
            key,
            description: self.description,
            is_sensitive: self.is_sensitive,
        })
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    profile_id: uuid::Uuid,
    granted: bool,
    updated_at: DateTime<Utc>,
    updated_by: Option<uuid::Uuid>,
    #[sqlx(flatten)]
    permission: PermissionRow,
}

impl GrantRow {
    fn into_record(self) -> AppResult<GrantRecord> {
        Ok(GrantRecord {
            profile_id: ProfileId::from_uuid(self.profile_id),
            permission: self.permission.into_permission()?,
            granted: self.granted,
            updated_at: self.updated_at,
            updated_by: self.updated_by.map(PrincipalId::from_uuid),
        })
    }
}

#[async_trait]
impl PermissionStore for PostgresPermissionStore {
    async fn profile_for_principal(&self, principal: &Principal) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                profiles.id,
                profiles.name,
                profiles.display_name,
                profiles.level,
                profiles.is_active,
                profiles.is_system
            FROM (
                SELECT profile_id
                FROM members
                WHERE user_id = $1
                    OR ($2::TEXT IS NOT NULL AND lower(email) = $2)
                ORDER BY (user_id = $1) DESC NULLS LAST
                LIMIT 1
            ) AS member
            INNER JOIN profiles
                ON profiles.id = member.profile_id
            "#,
        )
        .bind(principal.id().as_uuid())
        .bind(principal.email())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load profile for principal '{}': {error}",
                principal.id()
            ))
        })?;

        row.map(ProfileRow::into_profile).transpose()
    }

    async fn legacy_role_for_principal(
        &self,
        principal: &Principal,
    ) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT papel_igreja
            FROM (
                SELECT papel_igreja
                FROM members
                WHERE user_id = $1
                    OR ($2::TEXT IS NOT NULL AND lower(email) = $2)
                ORDER BY (user_id = $1) DESC NULLS LAST
                LIMIT 1
            ) AS member
            WHERE papel_igreja IS NOT NULL
            "#,
        )
        .bind(principal.id().as_uuid())
        .bind(principal.email())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load legacy role for principal '{}': {error}",
                principal.id()
            ))
        })
    }

    async fn find_profile_by_name(&self, name: &str) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, display_name, level, is_active, is_system
            FROM profiles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find profile '{name}': {error}"))
        })?;

        row.map(ProfileRow::into_profile).transpose()
    }

    async fn grants_for_profile(&self, profile_id: ProfileId) -> AppResult<Vec<GrantRecord>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT
                grants.profile_id,
                grants.granted,
                grants.updated_at,
                grants.updated_by,
                permissions.id AS permission_id,
                permissions.subject,
                permissions.action,
                permissions.resource_type,
                permissions.description,
                permissions.is_sensitive
            FROM profile_permissions AS grants
            INNER JOIN permissions
                ON permissions.id = grants.permission_id
            WHERE grants.profile_id = $1
            ORDER BY permissions.subject, permissions.action, permissions.resource_type
            "#,
        )
        .bind(profile_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load grants for profile '{profile_id}': {error}"
            ))
        })?;

        rows.into_iter().map(GrantRow::into_record).collect()
    }

    async fn upsert_grant(&self, input: UpsertGrantInput) -> AppResult<GrantRecord> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            WITH upserted AS (
                INSERT INTO profile_permissions (
                    profile_id,
                    permission_id,
                    granted,
                    updated_at,
                    updated_by
                )
                VALUES ($1, $2, $3, now(), $4)
                ON CONFLICT (profile_id, permission_id) DO UPDATE
                SET granted = EXCLUDED.granted,
                    updated_at = EXCLUDED.updated_at,
                    updated_by = EXCLUDED.updated_by
                RETURNING profile_id, permission_id, granted, updated_at, updated_by
            )
            SELECT
                upserted.profile_id,
                upserted.granted,
                upserted.updated_at,
                upserted.updated_by,
                permissions.id AS permission_id,
                permissions.subject,
                permissions.action,
                permissions.resource_type,
                permissions.description,
                permissions.is_sensitive
            FROM upserted
            INNER JOIN permissions
                ON permissions.id = upserted.permission_id
            "#,
        )
        .bind(input.profile_id.as_uuid())
        .bind(input.permission_id.as_uuid())
        .bind(input.granted)
        .bind(input.updated_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_grant_error(error, &input))?;

        row.into_record()
    }
}

fn map_grant_error(error: sqlx::Error, input: &UpsertGrantInput) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!(
            "profile '{}' or permission '{}' was not found",
            input.profile_id, input.permission_id
        ));
    }

    AppError::Internal(format!(
        "failed to upsert grant for profile '{}': {error}",
        input.profile_id
    ))
}
