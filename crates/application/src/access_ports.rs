mod cache;
mod clock;
mod identity;
mod profiles;
mod store;

pub use cache::{
    DEFAULT_FRESHNESS_WINDOW_SECONDS, DecisionCache, DecisionCacheEntry, default_freshness_window,
};
pub use clock::{Clock, SystemClock};
pub use identity::{CoarseFlagRepository, IdentityProvider};
pub use profiles::{CreateProfileInput, ProfileAdminRepository};
pub use store::{GrantRecord, PermissionStore, UpsertGrantInput};
