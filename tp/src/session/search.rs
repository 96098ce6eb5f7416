//! Search executor seam
//!
//! Searching is somebody else's I/O. The session hands the executor a
//! snapshot of TripFacts and feeds the outcome back in as an ordinary event.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TripFacts;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("timeout")]
    Timeout,

    #[error("{0}")]
    Failed(String),
}

#[async_trait]
pub trait SearchExecutor: Send + Sync {
    /// Run a search for the given facts; results are delivered elsewhere
    async fn search(&self, facts: TripFacts) -> Result<(), SearchError>;
}
