//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod flags;
mod permission;
mod profile;

pub use flags::CoarseFlags;
pub use permission::{
    ADMIN_MANAGE_SYSTEM, DEFAULT_PERMISSION_KEYS, Permission, PermissionId, PermissionKey,
    PermissionSet, WILDCARD_SEGMENT,
};
pub use profile::{Profile, ProfileId, legacy_role_profile_name};
