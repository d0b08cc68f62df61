use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of an order. DELIVERED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Pending,
    Processing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "PENDING",
            OrderState::Processing => "PROCESSING",
            OrderState::Ready => "READY",
            OrderState::Delivered => "DELIVERED",
            OrderState::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderState::Pending),
            "PROCESSING" => Some(OrderState::Processing),
            "READY" => Some(OrderState::Ready),
            "DELIVERED" => Some(OrderState::Delivered),
            "CANCELLED" => Some(OrderState::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Cancelled)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    Pickup,
    Delivery,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Pickup => "PICKUP",
            DeliveryType::Delivery => "DELIVERY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PICKUP" => Some(DeliveryType::Pickup),
            "DELIVERY" => Some(DeliveryType::Delivery),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed role set; the transition table in `state_machine` is exhaustive
/// over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Staff => "STAFF",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CUSTOMER" => Some(Role::Customer),
            "STAFF" => Some(Role::Staff),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_back_office(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped caller identity, resolved from the bearer token before any
/// engine runs. Never held in ambient/global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User { id: i32, role: Role },
}

impl Identity {
    pub fn user_id(&self) -> Option<i32> {
        match self {
            Identity::Anonymous => None,
            Identity::User { id, .. } => Some(*id),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Anonymous => None,
            Identity::User { role, .. } => Some(*role),
        }
    }
}

// ── Creation inputs ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LineItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}

/// Raw order request as submitted by the caller. Prices are deliberately
/// absent: the engine only trusts the catalog.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub items: Vec<LineItemRequest>,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
}

/// Catalog snapshot used for validation and pricing within one request.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub active: bool,
}

/// A fully priced order ready to be persisted atomically.
#[derive(Debug, Clone)]
pub struct NewOrderRecord {
    pub user_id: Option<i32>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub total: BigDecimal,
    pub lines: Vec<NewLineRecord>,
}

#[derive(Debug, Clone)]
pub struct NewLineRecord {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

// ── Read models ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OwnerView {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i32,
    pub owner: Option<OwnerView>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub total: BigDecimal,
    pub state: OrderState,
    pub archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

impl OrderView {
    pub fn owner_id(&self) -> Option<i32> {
        self.owner.as_ref().map(|o| o.id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub owner_id: Option<i32>,
    pub archived: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Field changes a single transition commits together with the state write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPatch {
    pub new_state: OrderState,
    pub processed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub archived: Option<bool>,
    pub archived_at: Option<DateTime<Utc>>,
}
