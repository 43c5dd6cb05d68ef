use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::DEFAULT_PASSWORD_COST;

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Stored account. The password hash never leaves the service boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub profile: UserProfile,
    pub is_active: bool,
    pub failed_login_attempts: u8,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserAccount {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| now < until)
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            profile: self.profile.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// Optional agent details captured at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl UserProfile {
    /// Overwrite the fields `update` provides; absent fields keep their value.
    pub fn apply(&mut self, update: UserProfile) {
        let UserProfile {
            first_name,
            last_name,
            phone,
            agency_name,
            license_number,
            bio,
            website,
        } = update;
        for (field, value) in [
            (&mut self.first_name, first_name),
            (&mut self.last_name, last_name),
            (&mut self.phone, phone),
            (&mut self.agency_name, agency_name),
            (&mut self.license_number, license_number),
            (&mut self.bio, bio),
            (&mut self.website, website),
        ] {
            if value.is_some() {
                *field = value;
            }
        }
    }
}

/// Public representation of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Server-side session. Tokens are stored only as SHA-256 digests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub access_hash: [u8; 32],
    pub refresh_hash: [u8; 32],
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl Session {
    pub fn access_valid(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.access_expires_at
    }

    pub fn refresh_valid(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.refresh_expires_at
    }
}

/// Raw tokens handed to the client exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// Token lifetimes, lockout rules and the bcrypt work factor for new hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
    pub max_failed_logins: u8,
    pub lockout: chrono::Duration,
    pub password_cost: u32,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl: chrono::Duration::hours(24),
            refresh_ttl: chrono::Duration::days(30),
            max_failed_logins: 5,
            lockout: chrono::Duration::minutes(30),
            password_cost: DEFAULT_PASSWORD_COST,
        }
    }
}
