use chrono::{DateTime, Utc};

use super::errors::WorkflowError;
use super::order::{
    CatalogProduct, ListResult, NewOrderRecord, OrderFilter, OrderState, OrderView,
    TransitionPatch,
};
use super::user::{NewUserRecord, UserRecord};

/// Read-only product lookup used to validate and price line items.
pub trait ProductCatalog: Send + Sync + 'static {
    /// Batch lookup; products missing from the result simply do not exist.
    fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<CatalogProduct>, WorkflowError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Persist the order and all of its lines as a single atomic unit.
    fn create(&self, order: NewOrderRecord) -> Result<OrderView, WorkflowError>;

    fn find_by_id(&self, id: i32) -> Result<Option<OrderView>, WorkflowError>;

    fn list(
        &self,
        filter: OrderFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, WorkflowError>;

    /// Apply `patch` if and only if the order is still in `expected` state.
    /// Returns `None` when the compare-and-swap misses, in which case the
    /// caller re-reads and re-evaluates against the now-current state.
    fn apply_transition(
        &self,
        id: i32,
        expected: OrderState,
        patch: &TransitionPatch,
    ) -> Result<Option<OrderView>, WorkflowError>;

    /// Set `archived` if it is still false. `None` means another writer
    /// archived the order first.
    fn apply_archive(
        &self,
        id: i32,
        archived_at: DateTime<Utc>,
    ) -> Result<Option<OrderView>, WorkflowError>;
}

pub trait UserStore: Send + Sync + 'static {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, WorkflowError>;
    fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, WorkflowError>;
    fn insert(&self, user: NewUserRecord) -> Result<UserRecord, WorkflowError>;
}
