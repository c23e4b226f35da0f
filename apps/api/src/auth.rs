mod bootstrap;
mod session;
mod session_identity;

pub use bootstrap::bootstrap_handler;
pub use session::{logout_handler, me_handler};
pub use session_identity::SessionIdentityProvider;

pub const SESSION_PRINCIPAL_KEY: &str = "principal";
