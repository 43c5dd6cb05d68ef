//! Agent accounts and bearer-token sessions.
//!
//! Account and session state lives behind [`AccountStore`] so the HTTP layer
//! can run against any backing store. Tokens are opaque random strings; only
//! their SHA-256 digests are persisted. Passwords are stored as bcrypt hashes.

pub mod credentials;
pub mod domain;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{
    Credentials, IssuedTokens, PasswordChange, Registration, Session, SessionId, SessionPolicy,
    UserAccount, UserId, UserProfile, UserView,
};
pub use router::{account_router, bearer_token, require_user};
pub use service::{AccountError, AccountService, SessionView};
pub use store::{AccountStore, StoreError};
