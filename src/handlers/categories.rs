use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthedUser;
use crate::domain::errors::WorkflowError;
use crate::errors::AppError;
use crate::infrastructure::catalog_repo::DieselProductCatalog;
use crate::infrastructure::models::{CategoryRow, NewCategoryRow};

use super::{blocking_error, require_admin};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub image_url: Option<String>,
}

impl From<CategoryRow> for CategoryResponse {
    fn from(c: CategoryRow) -> Self {
        CategoryResponse {
            id: c.id,
            name: c.name,
            image_url: c.image_url,
        }
    }
}

/// GET /categories
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories", body = [CategoryResponse])),
    tag = "catalog"
)]
pub async fn list_categories(
    catalog: web::Data<DieselProductCatalog>,
) -> Result<HttpResponse, AppError> {
    let rows = web::block(move || catalog.list_categories())
        .await
        .map_err(blocking_error)??;
    let items: Vec<CategoryResponse> = rows.into_iter().map(CategoryResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// POST /categories (admin)
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 403, description = "Admin only"),
    ),
    tag = "catalog"
)]
pub async fn create_category(
    catalog: web::Data<DieselProductCatalog>,
    requester: AuthedUser,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(requester.0)?;
    let body = body.into_inner();
    let category = web::block(move || {
        catalog.create_category(NewCategoryRow {
            name: body.name,
            image_url: body.image_url,
        })
    })
    .await
    .map_err(blocking_error)??;
    Ok(HttpResponse::Created().json(CategoryResponse::from(category)))
}

/// PUT /categories/{id} (admin)
#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn update_category(
    catalog: web::Data<DieselProductCatalog>,
    requester: AuthedUser,
    path: web::Path<i32>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(requester.0)?;
    let id = path.into_inner();
    let body = body.into_inner();
    let category = web::block(move || catalog.update_category(id, body.name, body.image_url))
        .await
        .map_err(blocking_error)??
        .ok_or(WorkflowError::NotFound { entity: "category" })?;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

/// DELETE /categories/{id} (admin)
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_category(
    catalog: web::Data<DieselProductCatalog>,
    requester: AuthedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    require_admin(requester.0)?;
    let id = path.into_inner();
    let deleted = web::block(move || catalog.delete_category(id))
        .await
        .map_err(blocking_error)??;
    if !deleted {
        return Err(WorkflowError::NotFound { entity: "category" }.into());
    }
    Ok(HttpResponse::NoContent().finish())
}
