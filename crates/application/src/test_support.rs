//! Port fakes shared by service tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tokio::sync::Mutex;

use rebanho_core::{AppError, AppResult, Principal, PrincipalId};
use rebanho_domain::{
    CoarseFlags, Permission, PermissionId, PermissionKey, PermissionSet, Profile, ProfileId,
};

use crate::access_ports::{
    Clock, CoarseFlagRepository, CreateProfileInput, DecisionCache, DecisionCacheEntry,
    GrantRecord, IdentityProvider, PermissionStore, ProfileAdminRepository, UpsertGrantInput,
    default_freshness_window,
};

pub(crate) struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .unwrap_or_default();
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub(crate) fn advance(&self, delta: TimeDelta) {
        self.millis
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

pub(crate) fn principal(name: &str) -> Principal {
    Principal::new(
        PrincipalId::new(),
        Some(format!("{name}@igreja.example")),
        name,
    )
}

pub(crate) fn profile(name: &str, level: i32) -> Profile {
    Profile::new(ProfileId::new(), name, name.replace('_', " "), level, true, false)
        .unwrap_or_else(|error| panic!("invalid fixture profile '{name}': {error}"))
}

pub(crate) fn key(value: &str) -> PermissionKey {
    PermissionKey::from_str(value)
        .unwrap_or_else(|error| panic!("invalid fixture key '{value}': {error}"))
}

#[derive(Default)]
pub(crate) struct FakePermissionStore {
    profiles: Mutex<Vec<Profile>>,
    assignments: Mutex<HashMap<PrincipalId, ProfileId>>,
    legacy_roles: Mutex<HashMap<PrincipalId, String>>,
    permissions: Mutex<Vec<Permission>>,
    grants: Mutex<HashMap<(ProfileId, PermissionId), GrantRecord>>,
    read_delay: Mutex<Option<Duration>>,
    grant_read_delay: Mutex<Option<Duration>>,
    pub(crate) profile_lookups: AtomicUsize,
    pub(crate) upserts: AtomicUsize,
    pub(crate) fail_reads: AtomicBool,
    pub(crate) fail_upserts: AtomicBool,
}

impl FakePermissionStore {
    pub(crate) async fn add_profile(&self, profile: Profile) -> Profile {
        self.profiles.lock().await.push(profile.clone());
        profile
    }

    pub(crate) async fn replace_profile(&self, profile: Profile) {
        let mut profiles = self.profiles.lock().await;
        profiles.retain(|stored| stored.id() != profile.id());
        profiles.push(profile);
    }

    pub(crate) async fn assign(&self, principal: &Principal, profile: &Profile) {
        self.assignments
            .lock()
            .await
            .insert(principal.id(), profile.id());
    }

    pub(crate) async fn set_legacy_role(&self, principal: &Principal, label: &str) {
        self.legacy_roles
            .lock()
            .await
            .insert(principal.id(), label.to_owned());
    }

    pub(crate) async fn add_permission(&self, value: &str, is_sensitive: bool) -> Permission {
        let permission = Permission {
            id: PermissionId::new(),
            key: key(value),
            description: format!("allows {value}"),
            is_sensitive,
        };
        self.permissions.lock().await.push(permission.clone());
        permission
    }

    pub(crate) async fn set_grant(&self, profile: &Profile, permission: &Permission, granted: bool) {
        self.grants.lock().await.insert(
            (profile.id(), permission.id),
            GrantRecord {
                profile_id: profile.id(),
                permission: permission.clone(),
                granted,
                updated_at: Utc::now(),
                updated_by: None,
            },
        );
    }

    pub(crate) async fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().await = Some(delay);
    }

    /// Delays returning grant rows that were already read.
    pub(crate) async fn set_grant_read_delay(&self, delay: Duration) {
        *self.grant_read_delay.lock().await = Some(delay);
    }

    pub(crate) fn lookups(&self) -> usize {
        self.profile_lookups.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("permission store unavailable".to_owned()));
        }

        Ok(())
    }

    async fn profile_by_id(&self, profile_id: ProfileId) -> Option<Profile> {
        self.profiles
            .lock()
            .await
            .iter()
            .find(|profile| profile.id() == profile_id)
            .cloned()
    }
}

#[async_trait]
impl PermissionStore for FakePermissionStore {
    async fn profile_for_principal(&self, principal: &Principal) -> AppResult<Option<Profile>> {
        self.profile_lookups.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_reads()?;

        let assigned = self.assignments.lock().await.get(&principal.id()).copied();
        match assigned {
            Some(profile_id) => Ok(self.profile_by_id(profile_id).await),
            None => Ok(None),
        }
    }

    async fn legacy_role_for_principal(
        &self,
        principal: &Principal,
    ) -> AppResult<Option<String>> {
        self.check_reads()?;
        Ok(self.legacy_roles.lock().await.get(&principal.id()).cloned())
    }

    async fn find_profile_by_name(&self, name: &str) -> AppResult<Option<Profile>> {
        self.check_reads()?;
        Ok(self
            .profiles
            .lock()
            .await
            .iter()
            .find(|profile| profile.name() == name)
            .cloned())
    }

    async fn grants_for_profile(&self, profile_id: ProfileId) -> AppResult<Vec<GrantRecord>> {
        self.check_reads()?;
        let grants: Vec<GrantRecord> = self
            .grants
            .lock()
            .await
            .values()
            .filter(|grant| grant.profile_id == profile_id)
            .cloned()
            .collect();

        let delay = *self.grant_read_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(grants)
    }

    async fn upsert_grant(&self, input: UpsertGrantInput) -> AppResult<GrantRecord> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("failed to upsert grant".to_owned()));
        }

        if self.profile_by_id(input.profile_id).await.is_none() {
            return Err(AppError::NotFound(format!(
                "profile '{}' was not found",
                input.profile_id
            )));
        }

        let permission = self
            .permissions
            .lock()
            .await
            .iter()
            .find(|permission| permission.id == input.permission_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{}' was not found", input.permission_id))
            })?;

        let record = GrantRecord {
            profile_id: input.profile_id,
            permission,
            granted: input.granted,
            updated_at: Utc::now(),
            updated_by: Some(input.updated_by),
        };
        self.grants
            .lock()
            .await
            .insert((input.profile_id, input.permission_id), record.clone());

        Ok(record)
    }
}

pub(crate) struct FakeDecisionCache {
    clock: Arc<ManualClock>,
    entries: Mutex<HashMap<PrincipalId, DecisionCacheEntry>>,
    pub(crate) fail: AtomicBool,
}

impl FakeDecisionCache {
    pub(crate) fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub(crate) async fn contains(&self, principal_id: PrincipalId) -> bool {
        self.entries.lock().await.contains_key(&principal_id)
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("decision cache is full".to_owned()));
        }

        Ok(())
    }
}

#[async_trait]
impl DecisionCache for FakeDecisionCache {
    async fn get(&self, principal_id: PrincipalId) -> AppResult<Option<DecisionCacheEntry>> {
        self.check()?;
        Ok(self.entries.lock().await.get(&principal_id).cloned())
    }

    async fn put(
        &self,
        principal_id: PrincipalId,
        permissions: PermissionSet,
        profile: Option<Profile>,
    ) -> AppResult<DecisionCacheEntry> {
        self.check()?;
        let entry = DecisionCacheEntry {
            permissions,
            profile,
            resolved_at: self.clock.now(),
        };
        self.entries
            .lock()
            .await
            .insert(principal_id, entry.clone());
        Ok(entry)
    }

    fn is_fresh(&self, entry: &DecisionCacheEntry) -> bool {
        entry.is_fresh_at(self.clock.now(), default_freshness_window())
    }

    async fn evict(&self, principal_id: PrincipalId) -> AppResult<()> {
        self.entries.lock().await.remove(&principal_id);
        Ok(())
    }

    async fn evict_by_profile(&self, profile_id: ProfileId) -> AppResult<usize> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.belongs_to_profile(profile_id));
        Ok(before - entries.len())
    }
}

#[derive(Default)]
pub(crate) struct FakeCoarseFlagRepository {
    flags: Mutex<HashMap<PrincipalId, CoarseFlags>>,
    pub(crate) calls: AtomicUsize,
    pub(crate) fail: AtomicBool,
}

impl FakeCoarseFlagRepository {
    pub(crate) async fn set_flags(&self, principal_id: PrincipalId, flags: CoarseFlags) {
        self.flags.lock().await.insert(principal_id, flags);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoarseFlagRepository for FakeCoarseFlagRepository {
    async fn coarse_flags(&self, principal_id: PrincipalId) -> AppResult<CoarseFlags> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("authorization store timed out".to_owned()));
        }

        Ok(self
            .flags
            .lock()
            .await
            .get(&principal_id)
            .copied()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub(crate) struct FakeIdentityProvider {
    principal: Mutex<Option<Principal>>,
    pub(crate) fail: AtomicBool,
}

impl FakeIdentityProvider {
    pub(crate) async fn set_principal(&self, principal: Option<Principal>) {
        *self.principal.lock().await = principal;
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn current_principal(&self) -> AppResult<Option<Principal>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("identity store unreachable".to_owned()));
        }

        Ok(self.principal.lock().await.clone())
    }
}

#[derive(Default)]
pub(crate) struct FakeProfileAdminRepository {
    pub(crate) profiles: Mutex<Vec<Profile>>,
    pub(crate) permissions: Mutex<Vec<Permission>>,
}

#[async_trait]
impl ProfileAdminRepository for FakeProfileAdminRepository {
    async fn list_profiles(&self) -> AppResult<Vec<Profile>> {
        let mut profiles = self.profiles.lock().await.clone();
        profiles.sort_by_key(|profile| std::cmp::Reverse(profile.level()));
        Ok(profiles)
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(self.permissions.lock().await.clone())
    }

    async fn find_profile(&self, profile_id: ProfileId) -> AppResult<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .await
            .iter()
            .find(|profile| profile.id() == profile_id)
            .cloned())
    }

    async fn create_profile(&self, input: CreateProfileInput) -> AppResult<Profile> {
        let mut profiles = self.profiles.lock().await;
        if profiles.iter().any(|profile| profile.name() == input.name) {
            return Err(AppError::Conflict(format!(
                "profile '{}' already exists",
                input.name
            )));
        }

        let profile = Profile::new(
            ProfileId::new(),
            input.name,
            input.display_name,
            input.level,
            true,
            false,
        )?;
        profiles.push(profile.clone());
        Ok(profile)
    }

    async fn set_profile_active(
        &self,
        profile_id: ProfileId,
        is_active: bool,
    ) -> AppResult<Profile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .iter_mut()
            .find(|profile| profile.id() == profile_id)
            .ok_or_else(|| AppError::NotFound(format!("profile '{profile_id}' was not found")))?;

        let updated = Profile::new(
            profile.id(),
            profile.name(),
            profile.display_name(),
            profile.level(),
            is_active,
            profile.is_system(),
        )?;
        *profile = updated.clone();
        Ok(updated)
    }
}
