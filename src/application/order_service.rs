//! Order workflow orchestration: creation with server-side pricing, state
//! transitions, and archival.
//!
//! All catalog prices are fetched once per request and used for both
//! validation and pricing; client-submitted prices never exist in the
//! command types. Transition writes go through the repository's
//! compare-and-swap so concurrent updates against the same order cannot both
//! apply; a losing writer re-reads and re-validates against the fresh state.

use bigdecimal::BigDecimal;
use chrono::Utc;

use crate::domain::errors::WorkflowError;
use crate::domain::order::{
    CreateOrderCommand, DeliveryType, Identity, ListResult, NewLineRecord, NewOrderRecord,
    OrderFilter, OrderState, OrderView, Role,
};
use crate::domain::ports::{OrderRepository, ProductCatalog};
use crate::domain::state_machine;

/// Attempts before a contended transition gives up. The first retry already
/// covers the realistic race; further misses indicate a pathological writer.
const MAX_TRANSITION_ATTEMPTS: u32 = 3;

pub struct OrderService<R, C> {
    repo: R,
    catalog: C,
}

impl<R: OrderRepository, C: ProductCatalog> OrderService<R, C> {
    pub fn new(repo: R, catalog: C) -> Self {
        Self { repo, catalog }
    }

    /// Validate, price, and persist a new order.
    ///
    /// Preconditions are checked in a fixed order, failing fast on the first
    /// violation: non-empty items, guest contact (anonymous callers only),
    /// product existence/activity, delivery address.
    pub fn create_order(
        &self,
        requester: Identity,
        cmd: CreateOrderCommand,
    ) -> Result<OrderView, WorkflowError> {
        if cmd.items.is_empty() {
            return Err(WorkflowError::EmptyOrder);
        }
        if let Some(item) = cmd.items.iter().find(|i| i.quantity < 1) {
            return Err(WorkflowError::InvalidQuantity {
                product_id: item.product_id,
            });
        }

        if requester == Identity::Anonymous {
            if !has_text(&cmd.guest_name) {
                return Err(WorkflowError::MissingGuestContact { field: "name" });
            }
            if !has_text(&cmd.guest_phone) {
                return Err(WorkflowError::MissingGuestContact { field: "phone" });
            }
        }

        let mut ids: Vec<i32> = cmd.items.iter().map(|i| i.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let products = self.catalog.find_by_ids(&ids)?;

        let missing: Vec<i32> = ids
            .iter()
            .copied()
            .filter(|id| !products.iter().any(|p| p.id == *id && p.active))
            .collect();
        if !missing.is_empty() {
            return Err(WorkflowError::UnknownOrInactiveProduct {
                product_ids: missing,
            });
        }

        let delivery_address = match cmd.delivery_type {
            DeliveryType::Delivery => {
                if !has_text(&cmd.delivery_address) {
                    return Err(WorkflowError::MissingDeliveryAddress);
                }
                cmd.delivery_address
            }
            // A supplied address on a pickup order is ignored.
            DeliveryType::Pickup => None,
        };

        let mut total = BigDecimal::from(0);
        let mut lines = Vec::with_capacity(cmd.items.len());
        for item in &cmd.items {
            // Lookup cannot fail here: every id was checked above.
            let product = products
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or(WorkflowError::UnknownOrInactiveProduct {
                    product_ids: vec![item.product_id],
                })?;
            total += &product.price * BigDecimal::from(item.quantity);
            lines.push(NewLineRecord {
                product_id: product.id,
                quantity: item.quantity,
                unit_price: product.price.clone(),
            });
        }

        let (guest_name, guest_phone, guest_email) = match requester {
            Identity::Anonymous => (cmd.guest_name, cmd.guest_phone, cmd.guest_email),
            Identity::User { .. } => (None, None, None),
        };

        self.repo.create(NewOrderRecord {
            user_id: requester.user_id(),
            guest_name,
            guest_phone,
            guest_email,
            delivery_type: cmd.delivery_type,
            delivery_address,
            total,
            lines,
        })
    }

    /// Fetch a single order. Customers may only read their own.
    pub fn get_order(&self, requester: Identity, id: i32) -> Result<OrderView, WorkflowError> {
        let (actor_id, role) = require_user(requester)?;
        let order = self
            .repo
            .find_by_id(id)?
            .ok_or(WorkflowError::NotFound { entity: "order" })?;
        if role == Role::Customer && order.owner_id() != Some(actor_id) {
            return Err(WorkflowError::Forbidden);
        }
        Ok(order)
    }

    /// List orders, newest first. Customers are scoped to their own orders;
    /// staff and admins see everything.
    pub fn list_orders(
        &self,
        requester: Identity,
        archived: Option<bool>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, WorkflowError> {
        let (actor_id, role) = require_user(requester)?;
        let filter = OrderFilter {
            owner_id: (role == Role::Customer).then_some(actor_id),
            archived,
        };
        self.repo.list(filter, page, limit)
    }

    /// Move an order to `requested`, applying the state machine's side
    /// effects atomically with the state write.
    pub fn change_state(
        &self,
        requester: Identity,
        order_id: i32,
        requested: OrderState,
    ) -> Result<OrderView, WorkflowError> {
        let (actor_id, role) = require_user(requester)?;
        if !role.is_back_office() {
            return Err(WorkflowError::Forbidden);
        }

        let mut order = self
            .repo
            .find_by_id(order_id)?
            .ok_or(WorkflowError::NotFound { entity: "order" })?;

        // Self-dealing is checked before the permission table: staff may not
        // drive orders they placed themselves.
        if order.owner_id() == Some(actor_id) {
            return Err(WorkflowError::SelfTransitionForbidden { order_id });
        }

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let patch = state_machine::plan_transition(&order, requested, role, Utc::now())?;
            match self.repo.apply_transition(order_id, order.state, &patch)? {
                Some(updated) => return Ok(updated),
                // CAS miss: a concurrent transition won. Re-read and
                // re-evaluate against the now-current state.
                None => {
                    order = self
                        .repo
                        .find_by_id(order_id)?
                        .ok_or(WorkflowError::NotFound { entity: "order" })?;
                }
            }
        }
        Err(WorkflowError::StoreUnavailable(
            "order is being updated concurrently".to_string(),
        ))
    }

    /// Manually archive a terminal order (administrative operation, outside
    /// the state machine's normal edges).
    pub fn archive_order(
        &self,
        requester: Identity,
        order_id: i32,
    ) -> Result<OrderView, WorkflowError> {
        let (_, role) = require_user(requester)?;
        if !role.is_back_office() {
            return Err(WorkflowError::Forbidden);
        }

        let order = self
            .repo
            .find_by_id(order_id)?
            .ok_or(WorkflowError::NotFound { entity: "order" })?;
        state_machine::check_archivable(&order)?;

        match self.repo.apply_archive(order_id, Utc::now())? {
            Some(updated) => Ok(updated),
            // Lost the race to another archiver; report against fresh state.
            None => Err(WorkflowError::ArchiveNotAllowed {
                state: order.state,
                archived: true,
            }),
        }
    }
}

fn require_user(identity: Identity) -> Result<(i32, Role), WorkflowError> {
    match identity {
        Identity::Anonymous => Err(WorkflowError::Unauthenticated),
        Identity::User { id, role } => Ok((id, role)),
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::domain::order::{CatalogProduct, LineItemRequest, OrderLineView, OwnerView, TransitionPatch};
    use crate::domain::ports::{OrderRepository, ProductCatalog};

    // ── In-memory fakes ──────────────────────────────────────────────────────

    struct FakeCatalog {
        products: Vec<CatalogProduct>,
    }

    impl ProductCatalog for FakeCatalog {
        fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<CatalogProduct>, WorkflowError> {
            Ok(self
                .products
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct FakeOrders {
        orders: Mutex<Vec<OrderView>>,
    }

    impl FakeOrders {
        fn seed(&self, order: OrderView) {
            self.orders.lock().unwrap().push(order);
        }

        fn count(&self) -> usize {
            self.orders.lock().unwrap().len()
        }
    }

    fn apply_patch(order: &mut OrderView, patch: &TransitionPatch) {
        order.state = patch.new_state;
        if let Some(ts) = patch.processed_at {
            order.processed_at = Some(ts);
        }
        if let Some(ts) = patch.delivered_at {
            order.delivered_at = Some(ts);
        }
        if let Some(flag) = patch.archived {
            order.archived = flag;
        }
        if let Some(ts) = patch.archived_at {
            order.archived_at = Some(ts);
        }
        order.updated_at = Utc::now();
    }

    impl OrderRepository for FakeOrders {
        fn create(&self, order: NewOrderRecord) -> Result<OrderView, WorkflowError> {
            let mut orders = self.orders.lock().unwrap();
            let id = orders.len() as i32 + 1;
            let now = Utc::now();
            let view = OrderView {
                id,
                owner: order.user_id.map(|id| OwnerView {
                    id,
                    email: format!("user{id}@example.com"),
                }),
                guest_name: order.guest_name,
                guest_phone: order.guest_phone,
                guest_email: order.guest_email,
                delivery_type: order.delivery_type,
                delivery_address: order.delivery_address,
                total: order.total,
                state: OrderState::Pending,
                archived: false,
                archived_at: None,
                processed_at: None,
                delivered_at: None,
                created_at: now,
                updated_at: now,
                lines: order
                    .lines
                    .iter()
                    .enumerate()
                    .map(|(i, l)| OrderLineView {
                        id: i as i32 + 1,
                        product_id: l.product_id,
                        product_name: format!("product {}", l.product_id),
                        quantity: l.quantity,
                        unit_price: l.unit_price.clone(),
                    })
                    .collect(),
            };
            orders.push(view.clone());
            Ok(view)
        }

        fn find_by_id(&self, id: i32) -> Result<Option<OrderView>, WorkflowError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.id == id)
                .cloned())
        }

        fn list(
            &self,
            filter: OrderFilter,
            _page: i64,
            _limit: i64,
        ) -> Result<ListResult, WorkflowError> {
            let items: Vec<OrderView> = self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|o| {
                    filter.owner_id.is_none_or(|id| o.owner_id() == Some(id))
                        && filter.archived.is_none_or(|a| o.archived == a)
                })
                .cloned()
                .collect();
            let total = items.len() as i64;
            Ok(ListResult { items, total })
        }

        fn apply_transition(
            &self,
            id: i32,
            expected: OrderState,
            patch: &TransitionPatch,
        ) -> Result<Option<OrderView>, WorkflowError> {
            let mut orders = self.orders.lock().unwrap();
            let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
                return Ok(None);
            };
            if order.state != expected {
                return Ok(None);
            }
            apply_patch(order, patch);
            Ok(Some(order.clone()))
        }

        fn apply_archive(
            &self,
            id: i32,
            archived_at: DateTime<Utc>,
        ) -> Result<Option<OrderView>, WorkflowError> {
            let mut orders = self.orders.lock().unwrap();
            let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
                return Ok(None);
            };
            if order.archived {
                return Ok(None);
            }
            order.archived = true;
            order.archived_at = Some(archived_at);
            Ok(Some(order.clone()))
        }
    }

    /// Repository whose first transition attempt loses a simulated race: the
    /// order is flipped by a "concurrent" writer and the CAS misses.
    struct ContendedOrders {
        inner: FakeOrders,
        misses: AtomicU32,
        winner_state: OrderState,
    }

    impl OrderRepository for ContendedOrders {
        fn create(&self, order: NewOrderRecord) -> Result<OrderView, WorkflowError> {
            self.inner.create(order)
        }

        fn find_by_id(&self, id: i32) -> Result<Option<OrderView>, WorkflowError> {
            self.inner.find_by_id(id)
        }

        fn list(
            &self,
            filter: OrderFilter,
            page: i64,
            limit: i64,
        ) -> Result<ListResult, WorkflowError> {
            self.inner.list(filter, page, limit)
        }

        fn apply_transition(
            &self,
            id: i32,
            expected: OrderState,
            patch: &TransitionPatch,
        ) -> Result<Option<OrderView>, WorkflowError> {
            if self.misses.fetch_add(1, Ordering::SeqCst) == 0 {
                let mut orders = self.inner.orders.lock().unwrap();
                let order = orders.iter_mut().find(|o| o.id == id).unwrap();
                order.state = self.winner_state;
                return Ok(None);
            }
            self.inner.apply_transition(id, expected, patch)
        }

        fn apply_archive(
            &self,
            id: i32,
            archived_at: DateTime<Utc>,
        ) -> Result<Option<OrderView>, WorkflowError> {
            self.inner.apply_archive(id, archived_at)
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn money(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog {
            products: vec![
                CatalogProduct {
                    id: 1,
                    name: "pan de bono".to_string(),
                    price: money("5000"),
                    active: true,
                },
                CatalogProduct {
                    id: 2,
                    name: "torta de chocolate".to_string(),
                    price: money("42000"),
                    active: true,
                },
                CatalogProduct {
                    id: 3,
                    name: "descontinuado".to_string(),
                    price: money("1000"),
                    active: false,
                },
            ],
        }
    }

    fn service() -> OrderService<FakeOrders, FakeCatalog> {
        OrderService::new(FakeOrders::default(), catalog())
    }

    fn guest_pickup(items: Vec<LineItemRequest>) -> CreateOrderCommand {
        CreateOrderCommand {
            items,
            delivery_type: DeliveryType::Pickup,
            delivery_address: None,
            guest_name: Some("Ana".to_string()),
            guest_phone: Some("3000000000".to_string()),
            guest_email: None,
        }
    }

    fn line(product_id: i32, quantity: i32) -> LineItemRequest {
        LineItemRequest {
            product_id,
            quantity,
        }
    }

    fn staff() -> Identity {
        Identity::User {
            id: 77,
            role: Role::Staff,
        }
    }

    fn admin() -> Identity {
        Identity::User {
            id: 88,
            role: Role::Admin,
        }
    }

    fn seeded_order(state: OrderState, owner: Option<i32>) -> OrderView {
        let now = Utc::now();
        OrderView {
            id: 1,
            owner: owner.map(|id| OwnerView {
                id,
                email: format!("user{id}@example.com"),
            }),
            guest_name: None,
            guest_phone: None,
            guest_email: None,
            delivery_type: DeliveryType::Pickup,
            delivery_address: None,
            total: money("10000"),
            state,
            archived: false,
            archived_at: None,
            processed_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
            lines: vec![],
        }
    }

    // ── Creation & pricing ───────────────────────────────────────────────────

    #[test]
    fn guest_pickup_order_is_priced_from_the_catalog() {
        let svc = service();
        let order = svc
            .create_order(Identity::Anonymous, guest_pickup(vec![line(1, 2)]))
            .unwrap();

        assert_eq!(order.total, money("10000"));
        assert_eq!(order.state, OrderState::Pending);
        assert!(!order.archived);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].unit_price, money("5000"));
    }

    #[test]
    fn total_sums_across_multiple_lines() {
        let svc = service();
        let order = svc
            .create_order(Identity::Anonymous, guest_pickup(vec![line(1, 3), line(2, 1)]))
            .unwrap();
        assert_eq!(order.total, money("57000"));
    }

    #[test]
    fn empty_order_is_rejected() {
        let svc = service();
        let err = svc
            .create_order(Identity::Anonymous, guest_pickup(vec![]))
            .unwrap_err();
        assert_eq!(err, WorkflowError::EmptyOrder);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let svc = service();
        let err = svc
            .create_order(Identity::Anonymous, guest_pickup(vec![line(1, 0)]))
            .unwrap_err();
        assert_eq!(err, WorkflowError::InvalidQuantity { product_id: 1 });
    }

    #[test]
    fn guest_without_phone_is_rejected() {
        let svc = service();
        let mut cmd = guest_pickup(vec![line(1, 1)]);
        cmd.guest_phone = Some("   ".to_string());
        let err = svc.create_order(Identity::Anonymous, cmd).unwrap_err();
        assert_eq!(err, WorkflowError::MissingGuestContact { field: "phone" });
    }

    #[test]
    fn guest_without_name_is_rejected() {
        let svc = service();
        let mut cmd = guest_pickup(vec![line(1, 1)]);
        cmd.guest_name = None;
        let err = svc.create_order(Identity::Anonymous, cmd).unwrap_err();
        assert_eq!(err, WorkflowError::MissingGuestContact { field: "name" });
    }

    #[test]
    fn authenticated_creation_needs_no_guest_contact() {
        let svc = service();
        let mut cmd = guest_pickup(vec![line(1, 1)]);
        cmd.guest_name = None;
        cmd.guest_phone = None;
        let order = svc
            .create_order(
                Identity::User {
                    id: 5,
                    role: Role::Customer,
                },
                cmd,
            )
            .unwrap();
        assert_eq!(order.owner_id(), Some(5));
    }

    #[test]
    fn authenticated_creation_drops_supplied_guest_fields() {
        let svc = service();
        let order = svc
            .create_order(
                Identity::User {
                    id: 5,
                    role: Role::Customer,
                },
                guest_pickup(vec![line(1, 1)]),
            )
            .unwrap();
        assert_eq!(order.guest_name, None);
        assert_eq!(order.guest_phone, None);
    }

    #[test]
    fn inactive_product_rejects_the_whole_order() {
        let svc = service();
        let err = svc
            .create_order(Identity::Anonymous, guest_pickup(vec![line(1, 1), line(3, 1)]))
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::UnknownOrInactiveProduct {
                product_ids: vec![3]
            }
        );
        assert_eq!(svc.repo.count(), 0, "no partial order may be persisted");
    }

    #[test]
    fn unknown_product_id_is_reported() {
        let svc = service();
        let err = svc
            .create_order(Identity::Anonymous, guest_pickup(vec![line(999, 1)]))
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::UnknownOrInactiveProduct {
                product_ids: vec![999]
            }
        );
    }

    #[test]
    fn delivery_without_address_is_rejected() {
        let svc = service();
        let mut cmd = guest_pickup(vec![line(1, 1)]);
        cmd.delivery_type = DeliveryType::Delivery;
        let err = svc.create_order(Identity::Anonymous, cmd).unwrap_err();
        assert_eq!(err, WorkflowError::MissingDeliveryAddress);
    }

    #[test]
    fn delivery_keeps_its_address() {
        let svc = service();
        let mut cmd = guest_pickup(vec![line(1, 1)]);
        cmd.delivery_type = DeliveryType::Delivery;
        cmd.delivery_address = Some("Calle 10 #4-32".to_string());
        let order = svc.create_order(Identity::Anonymous, cmd).unwrap();
        assert_eq!(order.delivery_address.as_deref(), Some("Calle 10 #4-32"));
    }

    #[test]
    fn pickup_ignores_a_supplied_address() {
        let svc = service();
        let mut cmd = guest_pickup(vec![line(1, 1)]);
        cmd.delivery_address = Some("Calle 10 #4-32".to_string());
        let order = svc.create_order(Identity::Anonymous, cmd).unwrap();
        assert_eq!(order.delivery_address, None);
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    #[test]
    fn staff_moves_pending_to_processing_and_processed_at_is_set() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Pending, None));

        let updated = svc.change_state(staff(), 1, OrderState::Processing).unwrap();
        assert_eq!(updated.state, OrderState::Processing);
        assert!(updated.processed_at.is_some());
    }

    #[test]
    fn staff_cannot_skip_to_ready() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Pending, None));

        let err = svc.change_state(staff(), 1, OrderState::Ready).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::TransitionNotPermitted {
                from: OrderState::Pending,
                to: OrderState::Ready,
                role: Role::Staff,
            }
        );
    }

    #[test]
    fn delivery_archives_in_the_same_update() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Ready, None));

        let updated = svc.change_state(admin(), 1, OrderState::Delivered).unwrap();
        assert_eq!(updated.state, OrderState::Delivered);
        assert!(updated.delivered_at.is_some());
        assert!(updated.archived);
        assert!(updated.archived_at.is_some());
    }

    #[test]
    fn delivered_orders_are_locked() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Delivered, None));

        let err = svc.change_state(admin(), 1, OrderState::Cancelled).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::TerminalOrderLocked {
                state: OrderState::Delivered
            }
        );
    }

    #[test]
    fn admin_cannot_transition_their_own_order() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Pending, Some(88)));

        let err = svc.change_state(admin(), 1, OrderState::Processing).unwrap_err();
        assert_eq!(err, WorkflowError::SelfTransitionForbidden { order_id: 1 });
    }

    #[test]
    fn customers_cannot_drive_the_workflow() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Pending, None));

        let err = svc
            .change_state(
                Identity::User {
                    id: 5,
                    role: Role::Customer,
                },
                1,
                OrderState::Processing,
            )
            .unwrap_err();
        assert_eq!(err, WorkflowError::Forbidden);
    }

    #[test]
    fn anonymous_callers_cannot_transition() {
        let svc = service();
        let err = svc
            .change_state(Identity::Anonymous, 1, OrderState::Processing)
            .unwrap_err();
        assert_eq!(err, WorkflowError::Unauthenticated);
    }

    #[test]
    fn transition_on_missing_order_is_not_found() {
        let svc = service();
        let err = svc.change_state(staff(), 42, OrderState::Processing).unwrap_err();
        assert_eq!(err, WorkflowError::NotFound { entity: "order" });
    }

    #[test]
    fn losing_a_concurrent_transition_reports_against_fresh_state() {
        // A concurrent writer moves the order to PROCESSING between our read
        // and our CAS. The retry re-evaluates PROCESSING -> PROCESSING and
        // reports the no-op, never a lost update.
        let repo = ContendedOrders {
            inner: FakeOrders::default(),
            misses: AtomicU32::new(0),
            winner_state: OrderState::Processing,
        };
        repo.inner.seed(seeded_order(OrderState::Pending, None));
        let svc = OrderService::new(repo, catalog());

        let err = svc.change_state(staff(), 1, OrderState::Processing).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::NoOpTransition {
                state: OrderState::Processing
            }
        );
    }

    #[test]
    fn losing_writer_succeeds_on_retry_when_still_legal() {
        // Concurrent winner moved PENDING -> PROCESSING. ADMIN may reach
        // READY from either state, so the retry lands.
        let repo = ContendedOrders {
            inner: FakeOrders::default(),
            misses: AtomicU32::new(0),
            winner_state: OrderState::Processing,
        };
        repo.inner.seed(seeded_order(OrderState::Pending, None));
        let svc = OrderService::new(repo, catalog());

        let updated = svc.change_state(admin(), 1, OrderState::Ready).unwrap();
        assert_eq!(updated.state, OrderState::Ready);
    }

    // ── Archival ─────────────────────────────────────────────────────────────

    #[test]
    fn cancelled_orders_can_be_archived() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Cancelled, None));

        let updated = svc.archive_order(staff(), 1).unwrap();
        assert!(updated.archived);
        assert!(updated.archived_at.is_some());
    }

    #[test]
    fn active_orders_cannot_be_archived() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Processing, None));

        let err = svc.archive_order(admin(), 1).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::ArchiveNotAllowed {
                state: OrderState::Processing,
                archived: false
            }
        );
    }

    #[test]
    fn archiving_twice_is_rejected() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Cancelled, None));

        svc.archive_order(staff(), 1).unwrap();
        let err = svc.archive_order(staff(), 1).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::ArchiveNotAllowed {
                state: OrderState::Cancelled,
                archived: true
            }
        );
    }

    #[test]
    fn customers_cannot_archive() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Cancelled, None));

        let err = svc
            .archive_order(
                Identity::User {
                    id: 5,
                    role: Role::Customer,
                },
                1,
            )
            .unwrap_err();
        assert_eq!(err, WorkflowError::Forbidden);
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    #[test]
    fn customer_reads_only_their_own_order() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Pending, Some(5)));

        let owner = Identity::User {
            id: 5,
            role: Role::Customer,
        };
        let stranger = Identity::User {
            id: 6,
            role: Role::Customer,
        };
        assert!(svc.get_order(owner, 1).is_ok());
        assert_eq!(svc.get_order(stranger, 1).unwrap_err(), WorkflowError::Forbidden);
    }

    #[test]
    fn staff_reads_any_order() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Pending, Some(5)));
        assert!(svc.get_order(staff(), 1).is_ok());
    }

    #[test]
    fn customer_listing_is_scoped_to_their_orders() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Pending, Some(5)));
        let mut other = seeded_order(OrderState::Pending, Some(6));
        other.id = 2;
        svc.repo.seed(other);

        let result = svc
            .list_orders(
                Identity::User {
                    id: 5,
                    role: Role::Customer,
                },
                None,
                1,
                20,
            )
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].owner_id(), Some(5));
    }

    #[test]
    fn admin_listing_sees_all_and_filters_archived() {
        let svc = service();
        svc.repo.seed(seeded_order(OrderState::Pending, Some(5)));
        let mut archived = seeded_order(OrderState::Cancelled, Some(6));
        archived.id = 2;
        archived.archived = true;
        archived.archived_at = Some(Utc::now());
        svc.repo.seed(archived);

        let all = svc.list_orders(admin(), None, 1, 20).unwrap();
        assert_eq!(all.total, 2);

        let only_archived = svc.list_orders(admin(), Some(true), 1, 20).unwrap();
        assert_eq!(only_archived.total, 1);
        assert!(only_archived.items[0].archived);
    }
}
