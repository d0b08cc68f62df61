use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::WorkflowError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for the UI to branch on.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Workflow(e) => match e {
                WorkflowError::EmptyOrder => "EMPTY_ORDER",
                WorkflowError::MissingGuestContact { .. } => "MISSING_GUEST_CONTACT",
                WorkflowError::InvalidQuantity { .. } => "INVALID_QUANTITY",
                WorkflowError::MissingDeliveryAddress => "MISSING_DELIVERY_ADDRESS",
                WorkflowError::UnknownOrInactiveProduct { .. } => "UNKNOWN_OR_INACTIVE_PRODUCT",
                WorkflowError::Unauthenticated => "UNAUTHENTICATED",
                WorkflowError::Forbidden => "FORBIDDEN",
                WorkflowError::SelfTransitionForbidden { .. } => "SELF_TRANSITION_FORBIDDEN",
                WorkflowError::NoOpTransition { .. } => "NO_OP_TRANSITION",
                WorkflowError::TerminalOrderLocked { .. } => "TERMINAL_ORDER_LOCKED",
                WorkflowError::TransitionNotPermitted { .. } => "TRANSITION_NOT_PERMITTED",
                WorkflowError::ArchiveNotAllowed { .. } => "ARCHIVE_NOT_ALLOWED",
                WorkflowError::NotFound { .. } => "NOT_FOUND",
                WorkflowError::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
                WorkflowError::InvalidCredentials => "INVALID_CREDENTIALS",
                WorkflowError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            },
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Workflow(e) => match e {
                WorkflowError::EmptyOrder
                | WorkflowError::MissingGuestContact { .. }
                | WorkflowError::InvalidQuantity { .. }
                | WorkflowError::MissingDeliveryAddress
                | WorkflowError::UnknownOrInactiveProduct { .. } => StatusCode::BAD_REQUEST,
                WorkflowError::Unauthenticated | WorkflowError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                WorkflowError::Forbidden
                | WorkflowError::SelfTransitionForbidden { .. }
                | WorkflowError::TransitionNotPermitted { .. } => StatusCode::FORBIDDEN,
                WorkflowError::NoOpTransition { .. }
                | WorkflowError::TerminalOrderLocked { .. }
                | WorkflowError::ArchiveNotAllowed { .. }
                | WorkflowError::EmailAlreadyRegistered => StatusCode::CONFLICT,
                WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
                WorkflowError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Never leak internal details to the client.
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": message,
            "code": self.code(),
        }))
    }
}
