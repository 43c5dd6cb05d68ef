use super::domain::{Session, UserAccount, UserId};

/// Persistence boundary for accounts and sessions, injected into the service.
pub trait AccountStore: Send + Sync {
    /// Insert a new account; emails are unique.
    fn insert_user(&self, account: UserAccount) -> Result<UserAccount, StoreError>;
    fn update_user(&self, account: UserAccount) -> Result<(), StoreError>;
    fn lookup_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;
    fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Insert or replace a session by id.
    fn save_session(&self, session: Session) -> Result<(), StoreError>;
    fn session_by_access(&self, access_hash: &[u8; 32]) -> Result<Option<Session>, StoreError>;
    fn session_by_refresh(&self, refresh_hash: &[u8; 32]) -> Result<Option<Session>, StoreError>;
    fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
