use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::credentials::{
    generate_token, hash_password, hash_token, is_strong_password, is_valid_email,
    verify_password,
};
use super::domain::{
    Credentials, IssuedTokens, PasswordChange, Registration, Session, SessionId, SessionPolicy,
    UserAccount, UserId, UserProfile, UserView,
};
use super::store::{AccountStore, StoreError};

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Registration, login and session lifecycle over an injected [`AccountStore`].
pub struct AccountService<S> {
    store: Arc<S>,
    policy: SessionPolicy,
}

impl<S> AccountService<S>
where
    S: AccountStore + 'static,
{
    pub fn new(store: Arc<S>, policy: SessionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Create an account and open its first session.
    pub fn register(
        &self,
        registration: Registration,
        now: DateTime<Utc>,
    ) -> Result<(UserView, IssuedTokens), AccountError> {
        let email = normalize_email(&registration.email);
        if !is_valid_email(&email) {
            return Err(AccountError::InvalidEmail);
        }
        if !is_strong_password(&registration.password) {
            return Err(AccountError::WeakPassword);
        }
        if self.store.lookup_user_by_email(&email)?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let account = UserAccount {
            id: UserId(USER_SEQUENCE.fetch_add(1, Ordering::Relaxed)),
            email,
            password_hash: hash_password(&registration.password, self.policy.password_cost)?,
            profile: registration.profile,
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: now,
            last_login: None,
        };

        let account = self.store.insert_user(account).map_err(|err| match err {
            StoreError::Conflict => AccountError::EmailTaken,
            other => AccountError::Store(other),
        })?;
        let tokens = self.open_session(account.id, now)?;

        info!(user_id = account.id.0, "account registered");
        Ok((account.view(), tokens))
    }

    pub fn login(
        &self,
        credentials: Credentials,
        now: DateTime<Utc>,
    ) -> Result<(UserView, IssuedTokens), AccountError> {
        let email = normalize_email(&credentials.email);
        let mut account = self
            .store
            .lookup_user_by_email(&email)?
            .ok_or(AccountError::InvalidCredentials)?;

        if account.is_locked(now) {
            warn!(user_id = account.id.0, "login attempt on locked account");
            return Err(AccountError::Locked {
                until: account.locked_until.unwrap_or(now),
            });
        }
        if !account.is_active {
            return Err(AccountError::Inactive);
        }

        if !verify_password(&credentials.password, &account.password_hash) {
            account.failed_login_attempts = account.failed_login_attempts.saturating_add(1);
            if account.failed_login_attempts >= self.policy.max_failed_logins {
                account.locked_until = Some(now + self.policy.lockout);
                account.failed_login_attempts = 0;
                warn!(user_id = account.id.0, "account locked after repeated failures");
            }
            self.store.update_user(account)?;
            return Err(AccountError::InvalidCredentials);
        }

        account.failed_login_attempts = 0;
        account.locked_until = None;
        account.last_login = Some(now);
        self.store.update_user(account.clone())?;

        let tokens = self.open_session(account.id, now)?;
        info!(user_id = account.id.0, "login succeeded");
        Ok((account.view(), tokens))
    }

    /// Exchange a refresh token for a new access token on the same session.
    pub fn refresh(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, AccountError> {
        let mut session = self
            .store
            .session_by_refresh(&hash_token(refresh_token))?
            .filter(|session| session.refresh_valid(now))
            .ok_or(AccountError::InvalidToken)?;

        self.active_user(session.user_id)?
            .ok_or(AccountError::InvalidToken)?;

        let access_token = generate_token();
        session.access_hash = hash_token(&access_token);
        session.access_expires_at = now + self.policy.access_ttl;
        let expires_at = session.access_expires_at;
        self.store.save_session(session)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token: refresh_token.to_string(),
            token_type: "Bearer",
            expires_at,
        })
    }

    /// Resolve an access token to its account, if the session is still live.
    pub fn authenticate(
        &self,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserAccount>, AccountError> {
        let session = match self.store.session_by_access(&hash_token(access_token))? {
            Some(session) if session.access_valid(now) => session,
            _ => return Ok(None),
        };
        self.active_user(session.user_id)
    }

    pub fn logout(&self, access_token: &str) -> Result<bool, AccountError> {
        match self.store.session_by_access(&hash_token(access_token))? {
            Some(mut session) if session.active => {
                session.active = false;
                let user_id = session.user_id;
                self.store.save_session(session)?;
                info!(user_id = user_id.0, "session closed");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn logout_all(&self, user_id: UserId) -> Result<usize, AccountError> {
        let closed = self.close_sessions(user_id, None)?;
        info!(user_id = user_id.0, closed, "all sessions closed");
        Ok(closed)
    }

    /// Replace the caller's password and close every other session they hold.
    /// Returns the number of sessions closed.
    pub fn change_password(
        &self,
        access_token: &str,
        change: PasswordChange,
        now: DateTime<Utc>,
    ) -> Result<usize, AccountError> {
        let current = self
            .store
            .session_by_access(&hash_token(access_token))?
            .filter(|session| session.access_valid(now))
            .ok_or(AccountError::InvalidToken)?;
        let mut account = self
            .active_user(current.user_id)?
            .ok_or(AccountError::InvalidToken)?;

        if !verify_password(&change.current_password, &account.password_hash) {
            return Err(AccountError::IncorrectPassword);
        }
        if !is_strong_password(&change.new_password) {
            return Err(AccountError::WeakPassword);
        }

        account.password_hash = hash_password(&change.new_password, self.policy.password_cost)?;
        let user_id = account.id;
        self.store.update_user(account)?;

        let closed = self.close_sessions(user_id, Some(current.id))?;
        info!(user_id = user_id.0, closed, "password changed");
        Ok(closed)
    }

    pub fn update_profile(
        &self,
        user_id: UserId,
        update: UserProfile,
    ) -> Result<UserView, AccountError> {
        let mut account = self
            .active_user(user_id)?
            .ok_or(AccountError::InvalidToken)?;
        account.profile.apply(update);
        self.store.update_user(account.clone())?;

        info!(user_id = user_id.0, "profile updated");
        Ok(account.view())
    }

    /// Public view of the token's owner, or `None` when the token is not live.
    pub fn validate_token(
        &self,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserView>, AccountError> {
        Ok(self
            .authenticate(access_token, now)?
            .map(|account| account.view()))
    }

    pub fn sessions(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionView>, AccountError> {
        let mut sessions: Vec<SessionView> = self
            .store
            .sessions_for_user(user_id)?
            .into_iter()
            .filter(|session| session.refresh_valid(now))
            .map(|session| SessionView {
                id: session.id,
                created_at: session.created_at,
                access_expires_at: session.access_expires_at,
                refresh_expires_at: session.refresh_expires_at,
            })
            .collect();
        sessions.sort_by_key(|session| session.created_at);
        Ok(sessions)
    }

    fn close_sessions(
        &self,
        user_id: UserId,
        keep: Option<SessionId>,
    ) -> Result<usize, AccountError> {
        let mut closed = 0;
        for mut session in self.store.sessions_for_user(user_id)? {
            if session.active && Some(session.id) != keep {
                session.active = false;
                self.store.save_session(session)?;
                closed += 1;
            }
        }
        Ok(closed)
    }

    fn active_user(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountError> {
        Ok(self
            .store
            .lookup_user(user_id)?
            .filter(|account| account.is_active))
    }

    fn open_session(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, AccountError> {
        let access_token = generate_token();
        let refresh_token = generate_token();
        let session = Session {
            id: SessionId(SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed)),
            user_id,
            access_hash: hash_token(&access_token),
            refresh_hash: hash_token(&refresh_token),
            access_expires_at: now + self.policy.access_ttl,
            refresh_expires_at: now + self.policy.refresh_ttl,
            created_at: now,
            active: true,
        };
        let expires_at = session.access_expires_at;
        self.store.save_session(session)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_at,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Session metadata safe to show the account owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid email format")]
    InvalidEmail,
    #[error(
        "password must be at least 8 characters long and contain uppercase, lowercase, digit, and special character"
    )]
    WeakPassword,
    #[error("user with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is temporarily locked until {until}")]
    Locked { until: DateTime<Utc> },
    #[error("account is deactivated")]
    Inactive,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("current password is incorrect")]
    IncorrectPassword,
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
