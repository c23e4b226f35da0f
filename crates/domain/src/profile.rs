use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rebanho_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a profile (role bundle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Creates a random profile identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a profile identifier from an existing UUID value.
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

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ProfileId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid profile id '{value}': {error}")))
    }
}

/// Named bundle of grants assigned to members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    id: ProfileId,
    name: String,
    display_name: String,
    level: i32,
    is_active: bool,
    is_system: bool,
}

impl Profile {
    /// Creates a profile, validating the machine name.
    pub fn new(
        id: ProfileId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        level: i32,
        is_active: bool,
        is_system: bool,
    ) -> AppResult<Self> {
        let name = validate_machine_name(name.into())?;
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "profile '{name}' must have a display name"
            )));
        }

        Ok(Self {
            id,
            name,
            display_name,
            level,
            is_active,
            is_system,
        })
    }

    /// Returns the profile identifier.
    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    /// Returns the machine name, e.g. `supervisor_regional`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the human-facing name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the seniority level.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns whether the profile is enabled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the profile is reserved by the system.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Returns whether this profile is strictly more senior than `other`.
    #[must_use]
    pub fn outranks(&self, other: &Self) -> bool {
        self.level > other.level
    }

    /// Returns a copy flagged as inactive.
    #[must_use]
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

fn validate_machine_name(value: String) -> AppResult<String> {
    let trimmed = value.trim();
    let is_valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .next()
            .is_some_and(|first| first.is_ascii_lowercase())
        && trimmed
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_');

    if !is_valid {
        return Err(AppError::Validation(format!(
            "profile name '{value}' must be snake_case starting with a letter"
        )));
    }

    Ok(trimmed.to_owned())
}

/// Legacy church role label to profile name translation.
///
/// Membership rows may still carry the free-text `papel_igreja` field. It is
/// only consulted when no profile is assigned, and never trusted verbatim.
const LEGACY_ROLE_PROFILES: &[(&str, &str)] = &[
    ("admin", "administrador_geral"),
    ("administrador", "administrador_geral"),
    ("pastor", "pastor"),
    ("pastor_missao", "pastor_missao"),
    ("pastor_de_missao", "pastor_missao"),
    ("supervisor", "supervisor_regional"),
    ("supervisor_regional", "supervisor_regional"),
    ("lider", "lider_celula"),
    ("lider_celula", "lider_celula"),
    ("lider_de_celula", "lider_celula"),
    ("tesoureiro", "tesoureiro"),
    ("secretario", "secretaria"),
    ("secretaria", "secretaria"),
    ("membro", "membro"),
];

/// Translates a legacy `papel_igreja` label to a profile machine name.
///
/// Returns `None` for labels without a counterpart, such as `visitante`.
#[must_use]
pub fn legacy_role_profile_name(label: &str) -> Option<&'static str> {
    let normalized = normalize_legacy_label(label);
    LEGACY_ROLE_PROFILES
        .iter()
        .find(|(legacy, _)| *legacy == normalized)
        .map(|(_, profile_name)| *profile_name)
}

fn normalize_legacy_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|character| match character {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            ' ' | '-' => '_',
            other => other,
        })
        .collect()
}
