use async_trait::async_trait;
use rebanho_application::IdentityProvider;
use rebanho_core::{AppError, AppResult, Principal};
use tower_sessions::Session;

use super::SESSION_PRINCIPAL_KEY;

/// Identity source backed by the request's cookie session.
pub struct SessionIdentityProvider {
    session: Session,
}

impl SessionIdentityProvider {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentityProvider {
    async fn current_principal(&self) -> AppResult<Option<Principal>> {
        self.session
            .get::<Principal>(SESSION_PRINCIPAL_KEY)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read session principal: {error}"))
            })
    }
}
