use rebanho_application::GrantRecord;
use rebanho_domain::{Permission, Profile};

use super::{GrantResponse, PermissionResponse, ProfileResponse};

impl From<Profile> for ProfileResponse {
    fn from(value: Profile) -> Self {
        Self {
            profile_id: value.id().to_string(),
            name: value.name().to_owned(),
            display_name: value.display_name().to_owned(),
            level: value.level(),
            is_active: value.is_active(),
            is_system: value.is_system(),
        }
    }
}

impl From<Permission> for PermissionResponse {
    fn from(value: Permission) -> Self {
        Self {
            permission_id: value.id.to_string(),
            key: value.key.to_string(),
            subject: value.key.subject().to_owned(),
            action: value.key.action().to_owned(),
            resource_type: value.key.resource_type().map(str::to_owned),
            description: value.description,
            is_sensitive: value.is_sensitive,
        }
    }
}

impl From<GrantRecord> for GrantResponse {
    fn from(value: GrantRecord) -> Self {
        Self {
            profile_id: value.profile_id.to_string(),
            permission: PermissionResponse::from(value.permission),
            granted: value.granted,
            updated_at: value.updated_at.to_rfc3339(),
            updated_by: value.updated_by.map(|principal_id| principal_id.to_string()),
        }
    }
}
