//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_access_store;
mod in_memory_decision_cache;
mod postgres_coarse_flag_repository;
mod postgres_permission_store;
mod postgres_profile_admin_repository;

pub use in_memory_access_store::{InMemoryAccessStore, MemberRecord};
pub use in_memory_decision_cache::InMemoryDecisionCache;
pub use postgres_coarse_flag_repository::PostgresCoarseFlagRepository;
pub use postgres_permission_store::PostgresPermissionStore;
pub use postgres_profile_admin_repository::PostgresProfileAdminRepository;
