use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rebanho_application::CoarseFlagRepository;
use rebanho_core::{AppError, AppResult, PrincipalId};
use rebanho_domain::CoarseFlags;

/// PostgreSQL-backed source of coarse system-level flags.
#[derive(Clone)]
pub struct PostgresCoarseFlagRepository {
    pool: PgPool,
}

impl PostgresCoarseFlagRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CoarseFlagRow {
    is_admin: bool,
    is_site_admin: bool,
    is_mission_pastor: bool,
}

#[async_trait]
impl CoarseFlagRepository for PostgresCoarseFlagRepository {
    async fn coarse_flags(&self, principal_id: PrincipalId) -> AppResult<CoarseFlags> {
        let row = sqlx::query_as::<_, CoarseFlagRow>(
            r#"
            SELECT
                EXISTS (
                    SELECT 1 FROM user_roles
                    WHERE user_id = $1 AND role = 'admin'
                ) AS is_admin,
                EXISTS (
                    SELECT 1 FROM user_roles
                    WHERE user_id = $1 AND role = 'site_admin'
                ) AS is_site_admin,
                EXISTS (
                    SELECT 1 FROM missions
                    WHERE pastor_user_id = $1 AND is_active
                ) AS is_mission_pastor
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load coarse flags for principal '{principal_id}': {error}"
            ))
        })?;

        Ok(CoarseFlags {
            is_admin: row.is_admin,
            is_site_admin: row.is_site_admin,
            is_mission_pastor: row.is_mission_pastor,
        })
    }
}
