//! Bearer token issuing and verification, plus the axum guard that attaches
//! the caller's identity to authenticated requests.

pub mod guard;
pub mod token;

pub use guard::{bearer_token, require_auth, AuthUser};
pub use token::{Claims, TokenError, TokenKeys};
