pub mod catalog_repo;
pub mod models;
pub mod order_repo;
pub mod user_repo;

use crate::domain::errors::WorkflowError;

// Persistence-layer failures surface as a generic store error; the workflow
// never retries them.

impl From<diesel::result::Error> for WorkflowError {
    fn from(e: diesel::result::Error) -> Self {
        WorkflowError::StoreUnavailable(e.to_string())
    }
}

impl From<r2d2::Error> for WorkflowError {
    fn from(e: r2d2::Error) -> Self {
        WorkflowError::StoreUnavailable(e.to_string())
    }
}
