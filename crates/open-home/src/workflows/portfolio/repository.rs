use crate::workflows::accounts::UserId;

use super::domain::{AnalysisRecord, Property, PropertyId, SavedCriteria};

/// Storage for properties, their saved criteria and saved analyses.
pub trait PortfolioRepository: Send + Sync {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError>;
    fn fetch_property(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn properties_for(&self, user_id: UserId) -> Result<Vec<Property>, RepositoryError>;

    fn insert_analysis(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError>;
    fn analyses_for(&self, user_id: UserId) -> Result<Vec<AnalysisRecord>, RepositoryError>;

    fn insert_criteria(&self, criteria: SavedCriteria) -> Result<SavedCriteria, RepositoryError>;
    fn criteria_for(&self, property_id: PropertyId) -> Result<Vec<SavedCriteria>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
