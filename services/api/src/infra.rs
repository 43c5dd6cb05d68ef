use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use open_home::config::InspectionConfig;
use open_home::workflows::accounts::{
    AccountService, AccountStore, Session, SessionId, StoreError, UserAccount, UserId,
};
use open_home::workflows::inspections::{
    collect_inspections, FileInspectionSource, InspectionQuery, InspectionSource,
    MockInspectionSource, SourceError, SourcedInspections,
};
use open_home::workflows::portfolio::{
    AnalysisId, AnalysisRecord, CriteriaId, PortfolioRepository, PortfolioService, Property,
    PropertyId, RepositoryError, SavedCriteria,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

pub(crate) type Accounts = AccountService<InMemoryAccountStore>;
pub(crate) type Portfolio = PortfolioService<InMemoryPortfolioRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) sources: Arc<InspectionSources>,
    pub(crate) accounts: Arc<Accounts>,
    pub(crate) portfolio: Arc<Portfolio>,
}

/// Primary listing source with the mock generator behind it. Without a
/// primary the mock generator answers every query.
pub(crate) struct InspectionSources {
    primary: Option<Box<dyn InspectionSource>>,
    mock: MockInspectionSource,
}

impl InspectionSources {
    pub(crate) fn new(
        primary: Option<Box<dyn InspectionSource>>,
        mock: MockInspectionSource,
    ) -> Self {
        Self { primary, mock }
    }

    pub(crate) fn from_config(config: &InspectionConfig) -> Self {
        let primary = config
            .fixture_path
            .as_ref()
            .map(|path| Box::new(FileInspectionSource::new(path)) as Box<dyn InspectionSource>);
        let mock = match config.mock_seed {
            Some(seed) => MockInspectionSource::seeded(seed),
            None => MockInspectionSource::new(),
        };
        Self::new(primary, mock)
    }

    pub(crate) fn data_source(&self) -> &'static str {
        match &self.primary {
            Some(primary) => primary.source_name(),
            None => self.mock.source_name(),
        }
    }

    pub(crate) fn collect(
        &self,
        query: &InspectionQuery,
    ) -> Result<SourcedInspections, SourceError> {
        match &self.primary {
            Some(primary) => collect_inspections(primary.as_ref(), &self.mock, query),
            None => self.mock_only(query),
        }
    }

    pub(crate) fn mock_only(
        &self,
        query: &InspectionQuery,
    ) -> Result<SourcedInspections, SourceError> {
        Ok(SourcedInspections {
            records: self.mock.fetch(query)?,
            data_source: self.mock.source_name(),
        })
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAccountStore {
    users: Arc<Mutex<HashMap<UserId, UserAccount>>>,
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl AccountStore for InMemoryAccountStore {
    fn insert_user(&self, account: UserAccount) -> Result<UserAccount, StoreError> {
        let mut guard = self.users.lock().expect("account mutex poisoned");
        if guard.values().any(|existing| existing.email == account.email) {
            return Err(StoreError::Conflict);
        }
        guard.insert(account.id, account.clone());
        Ok(account)
    }

    fn update_user(&self, account: UserAccount) -> Result<(), StoreError> {
        let mut guard = self.users.lock().expect("account mutex poisoned");
        if guard.contains_key(&account.id) {
            guard.insert(account.id, account);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn lookup_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let guard = self.users.lock().expect("account mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let guard = self.users.lock().expect("account mutex poisoned");
        Ok(guard.values().find(|account| account.email == email).cloned())
    }

    /// Closed and refresh-expired sessions are dropped on every write, so a
    /// session saved as inactive is simply removed.
    fn save_session(&self, session: Session) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.remove(&session.id);
        guard.retain(|_, existing| existing.refresh_valid(now));
        if session.refresh_valid(now) {
            guard.insert(session.id, session);
        }
        Ok(())
    }

    fn session_by_access(&self, access_hash: &[u8; 32]) -> Result<Option<Session>, StoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard
            .values()
            .find(|session| &session.access_hash == access_hash)
            .cloned())
    }

    fn session_by_refresh(&self, refresh_hash: &[u8; 32]) -> Result<Option<Session>, StoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard
            .values()
            .find(|session| &session.refresh_hash == refresh_hash)
            .cloned())
    }

    fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard
            .values()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPortfolioRepository {
    properties: Arc<Mutex<HashMap<PropertyId, Property>>>,
    analyses: Arc<Mutex<HashMap<AnalysisId, AnalysisRecord>>>,
    criteria: Arc<Mutex<HashMap<CriteriaId, SavedCriteria>>>,
}

impl PortfolioRepository for InMemoryPortfolioRepository {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.properties.lock().expect("property mutex poisoned");
        if guard.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(property.id, property.clone());
        Ok(property)
    }

    fn fetch_property(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        let guard = self.properties.lock().expect("property mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn properties_for(&self, user_id: UserId) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.properties.lock().expect("property mutex poisoned");
        Ok(guard
            .values()
            .filter(|property| property.user_id == user_id)
            .cloned()
            .collect())
    }

    fn insert_analysis(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        let mut guard = self.analyses.lock().expect("analysis mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn analyses_for(&self, user_id: UserId) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        let guard = self.analyses.lock().expect("analysis mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }

    fn insert_criteria(&self, criteria: SavedCriteria) -> Result<SavedCriteria, RepositoryError> {
        let mut guard = self.criteria.lock().expect("criteria mutex poisoned");
        if guard.contains_key(&criteria.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(criteria.id, criteria.clone());
        Ok(criteria)
    }

    fn criteria_for(&self, property_id: PropertyId) -> Result<Vec<SavedCriteria>, RepositoryError> {
        let guard = self.criteria.lock().expect("criteria mutex poisoned");
        Ok(guard
            .values()
            .filter(|criteria| criteria.property_id == property_id)
            .cloned()
            .collect())
    }
}
