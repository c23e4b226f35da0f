use rebanho_domain::legacy_role_profile_name;

use crate::access_ports::GrantRecord;

use super::*;

impl PermissionService {
    /// Loads the principal's profile and renders its granted permissions.
    ///
    /// The membership profile assignment wins over the legacy church role;
    /// the legacy label is only translated when no profile is assigned.
    /// Principals without an active profile receive the default view-only set.
    pub async fn load_profile_and_grants(&self, principal: &Principal) -> AppResult<ResolvedAccess> {
        let assigned = match self.store.profile_for_principal(principal).await? {
            Some(profile) => Some(profile),
            None => self.legacy_profile(principal).await?,
        };

        let Some(profile) = assigned else {
            debug!(principal_id = %principal.id(), "no profile assigned, using default permissions");
            return Ok(ResolvedAccess {
                profile: None,
                permissions: PermissionSet::default_set(),
            });
        };

        if !profile.is_active() {
            debug!(
                principal_id = %principal.id(),
                profile = profile.name(),
                "assigned profile is inactive, using default permissions"
            );
            return Ok(ResolvedAccess {
                profile: None,
                permissions: PermissionSet::default_set(),
            });
        }

        let grants = self.store.grants_for_profile(profile.id()).await?;
        let permissions = PermissionSet::from_keys(
            grants
                .into_iter()
                .filter(|grant| grant.granted)
                .map(|grant| grant.permission.key),
        );

        Ok(ResolvedAccess {
            profile: Some(profile),
            permissions,
        })
    }

    /// Returns the principal's resolution, served from cache while fresh.
    ///
    /// Resolution failures fail closed and are never cached.
    pub async fn resolve(&self, principal: &Principal, force_refresh: bool) -> ResolvedAccess {
        self.resolve_while(principal, force_refresh, &|| true)
            .await
            .unwrap_or_else(ResolvedAccess::denied)
    }

    /// Resolves like [`Self::resolve`] but discards the result when
    /// `is_current` reports that the requesting session moved on.
    ///
    /// Returns `None` for discarded resolutions. Concurrent calls for one
    /// principal share a single remote resolution.
    pub async fn resolve_while(
        &self,
        principal: &Principal,
        force_refresh: bool,
        is_current: &(dyn Fn() -> bool + Send + Sync),
    ) -> Option<ResolvedAccess> {
        let principal_id = principal.id();

        if !force_refresh && let Some(access) = self.fresh_cached(principal_id).await {
            return Some(access);
        }

        let _guard = self.in_flight.acquire(principal_id).await;
        self.resolve_exclusive(principal, force_refresh, is_current)
            .await
    }

    /// Lists every grant row of a profile, granted or not.
    pub async fn grants_for_profile(&self, profile_id: ProfileId) -> AppResult<Vec<GrantRecord>> {
        self.store.grants_for_profile(profile_id).await
    }

    async fn resolve_exclusive(
        &self,
        principal: &Principal,
        force_refresh: bool,
        is_current: &(dyn Fn() -> bool + Send + Sync),
    ) -> Option<ResolvedAccess> {
        let principal_id = principal.id();

        // Another caller may have finished while this one waited on the key.
        if !force_refresh && let Some(access) = self.fresh_cached(principal_id).await {
            return Some(access);
        }

        let started_epoch = *self.eviction_epoch.read().await;
        let resolved = match self.load_profile_and_grants(principal).await {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!(%principal_id, %error, "permission resolution failed, denying all permissions");
                return is_current().then(ResolvedAccess::denied);
            }
        };

        if !is_current() {
            debug!(%principal_id, "session changed during resolution, discarding result");
            return None;
        }

        let epoch = self.eviction_epoch.read().await;
        if *epoch != started_epoch {
            debug!(%principal_id, "profile grants changed during resolution, result not cached");
        } else if let Err(error) = self
            .cache
            .put(
                principal_id,
                resolved.permissions.clone(),
                resolved.profile.clone(),
            )
            .await
        {
            warn!(%principal_id, %error, "failed to cache resolved permissions");
        }
        drop(epoch);

        info!(
            %principal_id,
            profile = resolved.profile.as_ref().map(Profile::name),
            permissions = resolved.permissions.len(),
            "permissions resolved"
        );

        Some(resolved)
    }

    async fn fresh_cached(&self, principal_id: PrincipalId) -> Option<ResolvedAccess> {
        match self.cache.get(principal_id).await {
            Ok(Some(entry)) if self.cache.is_fresh(&entry) => Some(ResolvedAccess::from(entry)),
            Ok(_) => None,
            Err(error) => {
                warn!(%principal_id, %error, "decision cache read failed, resolving remotely");
                None
            }
        }
    }

    async fn legacy_profile(&self, principal: &Principal) -> AppResult<Option<Profile>> {
        let Some(label) = self.store.legacy_role_for_principal(principal).await? else {
            return Ok(None);
        };

        let Some(profile_name) = legacy_role_profile_name(label.as_str()) else {
            debug!(principal_id = %principal.id(), label = label.as_str(), "legacy church role has no profile counterpart");
            return Ok(None);
        };

        self.store.find_profile_by_name(profile_name).await
    }
}
