use serde::{Deserialize, Serialize};

use crate::PrincipalId;

/// Authenticated actor persisted in the session.
///
/// Coarse authorization flags are never part of the principal; they are
/// re-derived from the authorization store on every fresh sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: PrincipalId,
    email: Option<String>,
    display_name: String,
}

impl Principal {
    /// Creates a principal from identity store data.
    #[must_use]
    pub fn new(id: PrincipalId, email: Option<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.map(|value| value.trim().to_lowercase()),
            display_name: display_name.into(),
        }
    }

    /// Returns the stable principal identifier.
    #[must_use]
    pub fn id(&self) -> PrincipalId {
        self.id
    }

    /// Returns the normalized email, if the identity store returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the display name for the principal.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}
