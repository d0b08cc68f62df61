use thiserror::Error;

use super::order::{OrderState, Role};

/// Every rejection the order workflow can produce. Each variant carries the
/// structured detail the API layer needs to render an actionable message,
/// never a bare "error".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("an order must contain at least one line item")]
    EmptyOrder,

    #[error("guest orders require a {field}")]
    MissingGuestContact { field: &'static str },

    #[error("line item for product {product_id} must have a quantity of at least 1")]
    InvalidQuantity { product_id: i32 },

    #[error("delivery orders require a delivery address")]
    MissingDeliveryAddress,

    #[error("unknown or inactive products: {product_ids:?}")]
    UnknownOrInactiveProduct { product_ids: Vec<i32> },

    #[error("authentication required")]
    Unauthenticated,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("staff may not change the state of their own order {order_id}")]
    SelfTransitionForbidden { order_id: i32 },

    #[error("order is already in state {state}")]
    NoOpTransition { state: OrderState },

    #[error("order in terminal state {state} cannot be modified")]
    TerminalOrderLocked { state: OrderState },

    #[error("transition {from} -> {to} is not permitted for role {role}")]
    TransitionNotPermitted {
        from: OrderState,
        to: OrderState,
        role: Role,
    },

    #[error("only unarchived orders in a terminal state can be archived (state {state}, archived {archived})")]
    ArchiveNotAllowed { state: OrderState, archived: bool },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("email is already registered")]
    EmailAlreadyRegistered,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("storage unavailable: {0}")]
    StoreUnavailable(String),
}
