pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;

use actix_web::error::BlockingError;

use crate::domain::errors::WorkflowError;
use crate::domain::order::{Identity, Role};
use crate::errors::AppError;

pub(crate) fn blocking_error(e: BlockingError) -> AppError {
    AppError::Internal(e.to_string())
}

pub(crate) fn require_admin(identity: Identity) -> Result<(), AppError> {
    match identity.role() {
        Some(Role::Admin) => Ok(()),
        Some(_) => Err(WorkflowError::Forbidden.into()),
        None => Err(WorkflowError::Unauthenticated.into()),
    }
}
