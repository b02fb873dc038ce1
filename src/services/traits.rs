//! Trait abstraction for the registry services to enable mocking in tests

use crate::state::{
    AddressQuery, AddressSuggestion, AnalysisQuery, AnalysisResult, NameRequest, QuickSearchName,
};
use async_trait::async_trait;

/// Failure reported by a registry service call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,

    #[error("not found")]
    NotFound,

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Registry services consumed by the wizard. Responses arrive already
/// parsed into the state's record types.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NameRequestApi: Send + Sync {
    /// Existing names similar to the one being typed
    async fn quick_search(&self, name: &str) -> ApiResult<Vec<QuickSearchName>>;

    /// Address completion candidates
    async fn address_search(&self, query: &AddressQuery) -> ApiResult<Vec<AddressSuggestion>>;

    /// Analyze a proposed name for conflicts and designation problems
    async fn analyze_name(&self, query: &AnalysisQuery) -> ApiResult<AnalysisResult>;

    /// Fetch an existing reservation by number, authenticated by a
    /// contact detail on file
    async fn fetch_request(&self, nr_num: &str, contact: &str) -> ApiResult<NameRequest>;
}
