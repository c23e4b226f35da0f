use rebanho_domain::PermissionId;
use tracing::error;

use crate::access_ports::{GrantRecord, UpsertGrantInput};

use super::*;

impl PermissionService {
    /// Grants or revokes one permission on a profile.
    ///
    /// Requires the actor to hold the system administration permission. On
    /// success every cached decision resolved for the profile is evicted, so
    /// the next check of any affected principal sees the new grant. Failures
    /// are returned as-is and never retried.
    pub async fn grant_permission(
        &self,
        actor: &Principal,
        profile_id: ProfileId,
        permission_id: PermissionId,
        granted: bool,
    ) -> AppResult<GrantRecord> {
        self.require_admin(actor).await?;

        let grant = self
            .store
            .upsert_grant(UpsertGrantInput {
                profile_id,
                permission_id,
                granted,
                updated_by: actor.id(),
            })
            .await
            .inspect_err(|failure| {
                error!(
                    actor = %actor.id(),
                    %profile_id,
                    %permission_id,
                    granted,
                    error = %failure,
                    "grant update rejected"
                );
            })?;

        if grant.granted && grant.permission.is_sensitive {
            warn!(
                actor = %actor.id(),
                %profile_id,
                permission = %grant.permission.key,
                "sensitive permission granted"
            );
        }

        let evicted = self.evict_profile(profile_id).await?;

        info!(
            actor = %actor.id(),
            %profile_id,
            permission = %grant.permission.key,
            granted,
            evicted,
            "grant updated"
        );

        Ok(grant)
    }
}
