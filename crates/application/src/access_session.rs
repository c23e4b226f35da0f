use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info};

use rebanho_core::{AppError, AppResult, Principal};
use rebanho_domain::{
    ADMIN_MANAGE_SYSTEM, CoarseFlags, PermissionId, PermissionKey, Profile, ProfileId,
};

use crate::access_ports::{GrantRecord, IdentityProvider};
use crate::{IdentityService, PermissionService, ResolvedAccess};

/// Lifecycle of the principal behind one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalState {
    /// No active session.
    Anonymous,
    /// Sign-in started but no principal is established yet.
    Authenticating,
    /// Principal established; `flags` is `None` while still pending.
    Authenticated {
        /// Signed-in principal.
        principal: Principal,
        /// Coarse flags, once resolved.
        flags: Option<CoarseFlags>,
    },
}

impl PrincipalState {
    /// Returns the signed-in principal, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated { principal, .. } => Some(principal),
            Self::Anonymous | Self::Authenticating => None,
        }
    }
}

/// Identity events emitted by the authentication backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Credentials were submitted.
    SignInStarted,
    /// A fresh sign-in completed.
    SignedIn(Principal),
    /// The access token was silently renewed.
    TokenRefreshed,
    /// The user signed out.
    SignedOut,
    /// The session expired server-side.
    SessionExpired,
}

/// Per-session authorization facade consumed by pages, buttons and routes.
///
/// This is the embeddable client facade: a long-lived client holds one
/// instance and feeds it [`AuthEvent`]s. The HTTP handlers are stateless per
/// request and call [`PermissionService`] and [`IdentityService`] directly
/// with the principal stored in the server session.
///
/// Every principal change bumps a generation counter; resolutions that land
/// after the counter moved are discarded instead of applied.
pub struct AccessSession {
    identity_provider: Arc<dyn IdentityProvider>,
    identity_service: IdentityService,
    permission_service: PermissionService,
    state: RwLock<PrincipalState>,
    generation: Arc<AtomicU64>,
}

impl AccessSession {
    /// Creates an anonymous session.
    #[must_use]
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        identity_service: IdentityService,
        permission_service: PermissionService,
    ) -> Self {
        Self {
            identity_provider,
            identity_service,
            permission_service,
            state: RwLock::new(PrincipalState::Anonymous),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Establishes the principal from the identity source, as on page load.
    pub async fn initialize(&self) -> PrincipalState {
        match self
            .identity_service
            .resolve_current_principal(self.identity_provider.as_ref())
            .await
        {
            Some(principal) => self.handle_auth_event(AuthEvent::SignedIn(principal)).await,
            None => self.handle_auth_event(AuthEvent::SignedOut).await,
        }
    }

    /// Applies an identity event and returns the resulting state.
    pub async fn handle_auth_event(&self, event: AuthEvent) -> PrincipalState {
        match event {
            AuthEvent::SignInStarted => {
                self.bump_generation();
                let previous = self.replace_state(PrincipalState::Authenticating).await;
                self.forget(previous).await;
            }
            AuthEvent::SignedIn(principal) => {
                let generation = self.bump_generation();
                let previous = self
                    .replace_state(PrincipalState::Authenticated {
                        principal: principal.clone(),
                        flags: None,
                    })
                    .await;
                if previous.principal().map(Principal::id) != Some(principal.id()) {
                    self.forget(previous).await;
                }

                info!(principal_id = %principal.id(), "principal signed in");
                let flags = self
                    .identity_service
                    .refresh_coarse_flags(principal.id(), true)
                    .await;
                self.apply_flags(generation, flags).await;
            }
            AuthEvent::TokenRefreshed => {
                let generation = self.generation.load(Ordering::SeqCst);
                if let Some(principal) = self.current_principal().await {
                    let flags = self
                        .identity_service
                        .refresh_coarse_flags(principal.id(), false)
                        .await;
                    self.apply_flags(generation, flags).await;
                }
            }
            AuthEvent::SignedOut | AuthEvent::SessionExpired => {
                self.bump_generation();
                let previous = self.replace_state(PrincipalState::Anonymous).await;
                if let Some(principal) = previous.principal() {
                    info!(principal_id = %principal.id(), ?event, "principal signed out");
                }
                self.forget(previous).await;
            }
        }

        self.state().await
    }

    /// Returns a snapshot of the principal lifecycle.
    pub async fn state(&self) -> PrincipalState {
        self.state.read().await.clone()
    }

    /// Returns the signed-in principal, if any.
    pub async fn current_principal(&self) -> Option<Principal> {
        self.state.read().await.principal().cloned()
    }

    /// Returns resolved coarse flags, all false while anonymous or pending.
    pub async fn coarse_flags(&self) -> CoarseFlags {
        match &*self.state.read().await {
            PrincipalState::Authenticated {
                flags: Some(flags), ..
            } => *flags,
            _ => CoarseFlags::none(),
        }
    }

    /// Re-resolves the current principal's permissions.
    pub async fn refresh_permissions(&self, force_refresh: bool) {
        self.resolve(force_refresh).await;
    }

    /// Returns whether the current principal may perform `action` on `subject`.
    ///
    /// Anonymous sessions, malformed keys and failed resolutions all deny.
    pub async fn can(&self, subject: &str, action: &str, resource_type: Option<&str>) -> bool {
        match PermissionKey::new(subject, action, resource_type.map(str::to_owned)) {
            Ok(requested) => self.can_key(&requested).await,
            Err(error) => {
                debug!(%error, "malformed permission check denied");
                false
            }
        }
    }

    /// Returns whether the current principal holds the canonical key.
    pub async fn can_key(&self, requested: &PermissionKey) -> bool {
        self.resolve(false)
            .await
            .is_some_and(|access| access.allows(requested))
    }

    /// Returns whether the current principal holds the system administration permission.
    pub async fn is_admin(&self) -> bool {
        self.can(ADMIN_MANAGE_SYSTEM.0, ADMIN_MANAGE_SYSTEM.1, None)
            .await
    }

    /// Returns the current principal's effective profile.
    pub async fn current_profile(&self) -> Option<Profile> {
        self.resolve(false).await.and_then(|access| access.profile)
    }

    /// Grants or revokes a permission on a profile as the current principal.
    pub async fn grant_permission(
        &self,
        profile_id: ProfileId,
        permission_id: PermissionId,
        granted: bool,
    ) -> AppResult<GrantRecord> {
        let actor = self
            .current_principal()
            .await
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

        self.permission_service
            .grant_permission(&actor, profile_id, permission_id, granted)
            .await
    }

    async fn resolve(&self, force_refresh: bool) -> Option<ResolvedAccess> {
        let generation = self.generation.load(Ordering::SeqCst);
        let principal = self.current_principal().await?;
        let counter = Arc::clone(&self.generation);

        self.permission_service
            .resolve_while(&principal, force_refresh, &move || {
                counter.load(Ordering::SeqCst) == generation
            })
            .await
    }

    async fn apply_flags(&self, generation: u64, flags: CoarseFlags) {
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("session changed while flags resolved, discarding flags");
            return;
        }

        if let PrincipalState::Authenticated {
            flags: current_flags,
            ..
        } = &mut *state
        {
            *current_flags = Some(flags);
        }
    }

    async fn replace_state(&self, next: PrincipalState) -> PrincipalState {
        std::mem::replace(&mut *self.state.write().await, next)
    }

    async fn forget(&self, previous: PrincipalState) {
        if let Some(principal) = previous.principal() {
            self.permission_service.evict_principal(principal.id()).await;
            self.identity_service.forget_principal(principal.id()).await;
        }
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}
