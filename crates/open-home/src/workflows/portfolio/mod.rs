//! Agent property portfolio, per-property similarity criteria and saved
//! competition analyses.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AnalysisDraft, AnalysisId, AnalysisRecord, CriteriaId, NewCriteria, NewProperty, Property,
    PropertyId, SavedCriteria, DEFAULT_LISTING_STATUS,
};
pub use repository::{PortfolioRepository, RepositoryError};
pub use router::{portfolio_error_response, portfolio_router, PortfolioState};
pub use service::{PortfolioError, PortfolioService, DEFAULT_HISTORY_LIMIT};
