//! Role-scoped order state machine.
//!
//! The transition table is the single source of truth for who may move an
//! order between states. Side effects (first-entry timestamps and the
//! auto-archive on delivery) are planned here and committed by the repository
//! in the same atomic update as the state write.

use chrono::{DateTime, Utc};

use super::errors::WorkflowError;
use super::order::{OrderState, OrderView, Role, TransitionPatch};

/// Target states `role` may move an order to from `from`.
///
/// STAFF walks the happy path one step at a time and may never cancel;
/// ADMIN may skip ahead and cancel; CUSTOMER may not drive the workflow at
/// all. Terminal states have no outgoing edges for anyone.
pub fn allowed_targets(role: Role, from: OrderState) -> &'static [OrderState] {
    use OrderState::*;
    match (role, from) {
        (Role::Staff, Pending) => &[Processing],
        (Role::Staff, Processing) => &[Ready],
        (Role::Staff, Ready) => &[Delivered],
        (Role::Admin, Pending) => &[Processing, Ready, Delivered, Cancelled],
        (Role::Admin, Processing) => &[Ready, Delivered, Cancelled],
        (Role::Admin, Ready) => &[Delivered, Cancelled],
        (Role::Customer, _) => &[],
        (_, Delivered) | (_, Cancelled) => &[],
    }
}

/// Decide whether `role` may move an order from `current` to `requested`.
///
/// Checks, in order: same-state no-op, terminal lock, permission table.
pub fn validate_transition(
    current: OrderState,
    requested: OrderState,
    role: Role,
) -> Result<(), WorkflowError> {
    if current == requested {
        return Err(WorkflowError::NoOpTransition { state: current });
    }
    if current.is_terminal() {
        return Err(WorkflowError::TerminalOrderLocked { state: current });
    }
    if !allowed_targets(role, current).contains(&requested) {
        return Err(WorkflowError::TransitionNotPermitted {
            from: current,
            to: requested,
            role,
        });
    }
    Ok(())
}

/// Validate a transition against the order's current state and compute the
/// field changes that must commit atomically with it.
///
/// `processed_at` / `delivered_at` are set only on first entry into
/// PROCESSING / DELIVERED. Reaching DELIVERED also archives the order in the
/// same update: delivered orders leave the active operational view.
pub fn plan_transition(
    order: &OrderView,
    requested: OrderState,
    role: Role,
    now: DateTime<Utc>,
) -> Result<TransitionPatch, WorkflowError> {
    validate_transition(order.state, requested, role)?;

    let mut patch = TransitionPatch {
        new_state: requested,
        processed_at: None,
        delivered_at: None,
        archived: None,
        archived_at: None,
    };

    if requested == OrderState::Processing && order.processed_at.is_none() {
        patch.processed_at = Some(now);
    }

    if requested == OrderState::Delivered {
        if order.delivered_at.is_none() {
            patch.delivered_at = Some(now);
        }
        if !order.archived {
            patch.archived = Some(true);
            patch.archived_at = Some(now);
        }
    }

    Ok(patch)
}

/// Manual archival is only legal once an order has reached a terminal state
/// and has not been archived yet (delivery already archives automatically).
pub fn check_archivable(order: &OrderView) -> Result<(), WorkflowError> {
    if order.archived || !order.state.is_terminal() {
        return Err(WorkflowError::ArchiveNotAllowed {
            state: order.state,
            archived: order.archived,
        });
    }
    Ok(())
}
