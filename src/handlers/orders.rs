use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthedUser, MaybeUser};
use crate::domain::order::{
    CreateOrderCommand, DeliveryType, LineItemRequest, OrderState, OrderView,
};
use crate::errors::AppError;
use crate::AppOrderService;

use super::blocking_error;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderLineRequest {
    pub product_id: i32,
    pub quantity: i32,
}

/// No price fields: the server prices every line from the catalog.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderLineRequest>,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStateRequest {
    pub new_state: OrderState,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderOwnerResponse {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub owner: Option<OrderOwnerResponse>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub total: String,
    pub state: OrderState,
    pub archived: bool,
    pub archived_at: Option<String>,
    pub processed_at: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            id: o.id,
            owner: o.owner.map(|owner| OrderOwnerResponse {
                id: owner.id,
                email: owner.email,
            }),
            guest_name: o.guest_name,
            guest_phone: o.guest_phone,
            guest_email: o.guest_email,
            delivery_type: o.delivery_type,
            delivery_address: o.delivery_address,
            total: o.total.to_string(),
            state: o.state,
            archived: o.archived,
            archived_at: o.archived_at.map(|t| t.to_rfc3339()),
            processed_at: o.processed_at.map(|t| t.to_rfc3339()),
            delivered_at: o.delivered_at.map(|t| t.to_rfc3339()),
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            lines: o
                .lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    id: l.id,
                    product_id: l.product_id,
                    product_name: l.product_name,
                    quantity: l.quantity,
                    unit_price: l.unit_price.to_string(),
                })
                .collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub archived: Option<bool>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Creates an order for a signed-in customer or a guest. Totals are computed
/// from current catalog prices; the order and all of its lines are persisted
/// in one transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Validation failed"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    svc: web::Data<AppOrderService>,
    requester: MaybeUser,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let identity = requester.0;

    let cmd = CreateOrderCommand {
        items: body
            .items
            .into_iter()
            .map(|l| LineItemRequest {
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect(),
        delivery_type: body.delivery_type,
        delivery_address: body.delivery_address,
        guest_name: body.guest_name,
        guest_phone: body.guest_phone,
        guest_email: body.guest_email,
    };

    let order = web::block(move || svc.create_order(identity, cmd))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 403, description = "Not the order's owner"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    svc: web::Data<AppOrderService>,
    requester: AuthedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let identity = requester.0;

    let order = web::block(move || svc.get_order(identity, order_id))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Paginated, newest first. Customers see only their own orders.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("archived" = Option<bool>, Query, description = "Filter by archived flag"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    svc: web::Data<AppOrderService>,
    requester: AuthedUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let identity = requester.0;
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let archived = params.archived;

    let result = web::block(move || svc.list_orders(identity, archived, page, limit))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// PUT /orders/{id}/status
///
/// Moves an order through the workflow. Staff and admin only, subject to the
/// role transition table and the self-dealing rule.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = ChangeStateRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 403, description = "Transition not permitted for this role"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already in that state or terminal"),
    ),
    tag = "orders"
)]
pub async fn change_order_state(
    svc: web::Data<AppOrderService>,
    requester: AuthedUser,
    path: web::Path<i32>,
    body: web::Json<ChangeStateRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let identity = requester.0;
    let new_state = body.into_inner().new_state;

    let order = web::block(move || svc.change_state(identity, order_id, new_state))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/archive
///
/// Manually archives a delivered or cancelled order.
#[utoipa::path(
    put,
    path = "/orders/{id}/archive",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order archived", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order not in a terminal state or already archived"),
    ),
    tag = "orders"
)]
pub async fn archive_order(
    svc: web::Data<AppOrderService>,
    requester: AuthedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let identity = requester.0;

    let order = web::block(move || svc.archive_order(identity, order_id))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
