use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthedUser;
use crate::domain::errors::WorkflowError;
use crate::errors::AppError;
use crate::infrastructure::catalog_repo::DieselProductCatalog;
use crate::infrastructure::models::{NewProductRow, ProductRow};

use super::{blocking_error, require_admin};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub price: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: i32,
    pub active: bool,
}

impl From<ProductRow> for ProductResponse {
    fn from(p: ProductRow) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            price: p.price.to_string(),
            description: p.description,
            image_url: p.image_url,
            category_id: p.category_id,
            active: p.active,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListProductsParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub active: Option<bool>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListProductsResponse {
    pub items: Vec<ProductResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw).map_err(|e| AppError::BadRequest(format!("Invalid price '{raw}': {e}")))
}

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("active" = Option<bool>, Query, description = "Filter by active flag"),
    ),
    responses((status = 200, description = "Paginated product list", body = ListProductsResponse)),
    tag = "catalog"
)]
pub async fn list_products(
    catalog: web::Data<DieselProductCatalog>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let active = params.active;

    let (rows, total) = web::block(move || catalog.list_products(active, page, limit))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        items: rows.into_iter().map(ProductResponse::from).collect(),
        total,
        page,
        limit,
    }))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    catalog: web::Data<DieselProductCatalog>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = web::block(move || catalog.get_product(id))
        .await
        .map_err(blocking_error)??
        .ok_or(WorkflowError::NotFound { entity: "product" })?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// POST /products (admin)
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 403, description = "Admin only"),
    ),
    tag = "catalog"
)]
pub async fn create_product(
    catalog: web::Data<DieselProductCatalog>,
    requester: AuthedUser,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(requester.0)?;
    let body = body.into_inner();
    let price = parse_price(&body.price)?;

    let row = NewProductRow {
        name: body.name,
        price,
        description: body.description,
        image_url: body.image_url,
        category_id: body.category_id,
        active: body.active,
    };
    let product = web::block(move || catalog.create_product(row))
        .await
        .map_err(blocking_error)??;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// PUT /products/{id} (admin)
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn update_product(
    catalog: web::Data<DieselProductCatalog>,
    requester: AuthedUser,
    path: web::Path<i32>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(requester.0)?;
    let id = path.into_inner();
    let body = body.into_inner();
    let price = body.price.as_deref().map(parse_price).transpose()?;

    let product = web::block(move || {
        catalog.update_product(
            id,
            body.name,
            price,
            body.description,
            body.image_url,
            body.category_id,
            body.active,
        )
    })
    .await
    .map_err(blocking_error)??
    .ok_or(WorkflowError::NotFound { entity: "product" })?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /products/{id} (admin)
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_product(
    catalog: web::Data<DieselProductCatalog>,
    requester: AuthedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    require_admin(requester.0)?;
    let id = path.into_inner();
    let deleted = web::block(move || catalog.delete_product(id))
        .await
        .map_err(blocking_error)??;
    if !deleted {
        return Err(WorkflowError::NotFound { entity: "product" }.into());
    }
    Ok(HttpResponse::NoContent().finish())
}
