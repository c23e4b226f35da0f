use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rebanho_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Segment value that matches any subject or any action.
pub const WILDCARD_SEGMENT: &str = "all";

/// Canonical key every "is admin" convenience resolves through.
pub const ADMIN_MANAGE_SYSTEM: (&str, &str) = ("admin", "manage_system");

/// Keys granted to principals without an active profile.
pub const DEFAULT_PERMISSION_KEYS: &[&str] = &["events.view", "content.view", "gallery.view"];

/// Identifier of a catalog permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for PermissionId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self).map_err(|error| {
            AppError::Validation(format!("invalid permission id '{value}': {error}"))
        })
    }
}

/// Canonical `subject.action[.resourceType]` capability key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey {
    subject: String,
    action: String,
    resource_type: Option<String>,
}

impl PermissionKey {
    /// Builds a key from its parts, validating each segment.
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        resource_type: Option<String>,
    ) -> AppResult<Self> {
        let subject = normalize_segment(subject.into(), "subject")?;
        let action = normalize_segment(action.into(), "action")?;
        let resource_type = resource_type
            .map(|value| normalize_segment(value, "resource type"))
            .transpose()?;

        Ok(Self {
            subject,
            action,
            resource_type,
        })
    }

    /// Returns the subject segment.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the action segment.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the optional resource type qualifier.
    #[must_use]
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// Returns the `subject.all` wildcard covering this key.
    #[must_use]
    pub fn subject_wildcard(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            action: WILDCARD_SEGMENT.to_owned(),
            resource_type: None,
        }
    }

    /// Returns the `all.action` wildcard covering this key.
    #[must_use]
    pub fn action_wildcard(&self) -> Self {
        Self {
            subject: WILDCARD_SEGMENT.to_owned(),
            action: self.action.clone(),
            resource_type: None,
        }
    }

    /// Returns the key without its resource type qualifier, if it has one.
    #[must_use]
    pub fn unscoped(&self) -> Option<Self> {
        self.resource_type.as_ref().map(|_| Self {
            subject: self.subject.clone(),
            action: self.action.clone(),
            resource_type: None,
        })
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.resource_type {
            Some(resource_type) => {
                write!(formatter, "{}.{}.{resource_type}", self.subject, self.action)
            }
            None => write!(formatter, "{}.{}", self.subject, self.action),
        }
    }
}

impl FromStr for PermissionKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.trim().split('.').collect();
        match parts.as_slice() {
            [subject, action] => Self::new(*subject, *action, None),
            [subject, action, resource_type] => {
                Self::new(*subject, *action, Some((*resource_type).to_owned()))
            }
            _ => Err(AppError::Validation(format!(
                "permission key '{value}' must be 'subject.action' or 'subject.action.resource_type'"
            ))),
        }
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.to_string()
    }
}

fn normalize_segment(value: String, label: &str) -> AppResult<String> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AppError::Validation(format!(
            "permission {label} must not be empty"
        )));
    }

    if normalized.contains('.') || normalized.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "permission {label} '{normalized}' must not contain dots or whitespace"
        )));
    }

    Ok(normalized)
}

/// Catalog entry describing an atomic capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Stable catalog identifier.
    pub id: PermissionId,
    /// Canonical key.
    pub key: PermissionKey,
    /// Human description shown to administrators.
    pub description: String,
    /// Administrators are warned before granting sensitive permissions.
    pub is_sensitive: bool,
}

/// Resolved set of permission keys for one principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    keys: BTreeSet<PermissionKey>,
}

impl PermissionSet {
    /// Creates a set from resolved keys.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Returns the empty set used when resolution fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the minimal view-only set for principals without a profile.
    #[must_use]
    pub fn default_set() -> Self {
        Self::from_keys(
            DEFAULT_PERMISSION_KEYS
                .iter()
                .filter_map(|value| PermissionKey::from_str(value).ok()),
        )
    }

    /// Returns whether the set answers the requested key.
    ///
    /// Checks the exact key, then the unscoped form of a scoped key, then the
    /// `subject.all` wildcard, then the `all.action` wildcard.
    #[must_use]
    pub fn allows(&self, requested: &PermissionKey) -> bool {
        if self.keys.contains(requested) {
            return true;
        }

        if requested
            .unscoped()
            .is_some_and(|unscoped| self.keys.contains(&unscoped))
        {
            return true;
        }

        self.keys.contains(&requested.subject_wildcard())
            || self.keys.contains(&requested.action_wildcard())
    }

    /// Returns whether the set contains no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Iterates keys in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionKey> {
        self.keys.iter()
    }
}
