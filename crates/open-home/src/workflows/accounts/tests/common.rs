use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::accounts::credentials::MIN_PASSWORD_COST;
use crate::workflows::accounts::domain::{
    Credentials, Registration, Session, SessionId, SessionPolicy, UserAccount, UserId,
    UserProfile,
};
use crate::workflows::accounts::service::AccountService;
use crate::workflows::accounts::store::{AccountStore, StoreError};

pub(crate) const PASSWORD: &str = "Harbour#2025";

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 4, 8, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn registration(email: &str) -> Registration {
    Registration {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        profile: UserProfile {
            first_name: Some("Priya".to_string()),
            agency_name: Some("Harbour Realty".to_string()),
            ..UserProfile::default()
        },
    }
}

pub(crate) fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}

/// Default policy with the cheapest bcrypt cost so hashing stays fast under test.
pub(crate) fn fast_policy() -> SessionPolicy {
    SessionPolicy {
        password_cost: MIN_PASSWORD_COST,
        ..SessionPolicy::default()
    }
}

pub(crate) fn build_service() -> (AccountService<MemoryAccounts>, Arc<MemoryAccounts>) {
    let store = Arc::new(MemoryAccounts::default());
    let service = AccountService::new(store.clone(), fast_policy());
    (service, store)
}

#[derive(Default)]
pub(crate) struct MemoryAccounts {
    users: Mutex<HashMap<UserId, UserAccount>>,
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl AccountStore for MemoryAccounts {
    fn insert_user(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        if users.values().any(|existing| existing.email == account.email) {
            return Err(StoreError::Conflict);
        }
        users.insert(account.id, account.clone());
        Ok(account)
    }

    fn update_user(&self, account: UserAccount) -> Result<(), StoreError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        match users.get_mut(&account.id) {
            Some(existing) => {
                *existing = account;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn lookup_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.users.lock().expect("users mutex poisoned").get(&id).cloned())
    }

    fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .users
            .lock()
            .expect("users mutex poisoned")
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    fn save_session(&self, session: Session) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .expect("sessions mutex poisoned")
            .insert(session.id, session);
        Ok(())
    }

    fn session_by_access(&self, access_hash: &[u8; 32]) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .expect("sessions mutex poisoned")
            .values()
            .find(|session| &session.access_hash == access_hash)
            .cloned())
    }

    fn session_by_refresh(&self, refresh_hash: &[u8; 32]) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .expect("sessions mutex poisoned")
            .values()
            .find(|session| &session.refresh_hash == refresh_hash)
            .cloned())
    }

    fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .expect("sessions mutex poisoned")
            .values()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl MemoryAccounts {
    pub(crate) fn deactivate(&self, id: UserId) {
        let mut users = self.users.lock().expect("users mutex poisoned");
        if let Some(account) = users.get_mut(&id) {
            account.is_active = false;
        }
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("json body")
}
