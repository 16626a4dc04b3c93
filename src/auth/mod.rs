//! Authentication module
//!
//! GitHub OAuth login flow, encrypted state tokens, and
//! database-backed sessions.

pub mod github;
pub mod middleware;
pub mod oauth;
pub mod session;
pub mod state;

pub use middleware::{CurrentSession, MaybeSession};
pub use oauth::auth_router;
pub use session::{Session, SessionProblem};
pub use state::{OAuthState, StateCrypto};
