use serde::{Deserialize, Serialize};

/// Cheap system-level booleans resolved independently of the permission set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoarseFlags {
    /// Principal administers the whole installation.
    pub is_admin: bool,
    /// Principal administers the public site content.
    pub is_site_admin: bool,
    /// Principal is the pastor responsible for a mission.
    pub is_mission_pastor: bool,
}

impl CoarseFlags {
    /// Returns the fail-closed value with every flag cleared.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns whether any elevated flag is set.
    #[must_use]
    pub fn any(&self) -> bool {
        self.is_admin || self.is_site_admin || self.is_mission_pastor
    }
}
