use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::auth_service::AuthenticatedUser;
use crate::auth::AuthedUser;
use crate::domain::order::Role;
use crate::domain::user::UserRecord;
use crate::errors::AppError;
use crate::AppAuthService;

use super::blocking_error;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(u: UserRecord) -> Self {
        UserResponse {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

impl From<AuthenticatedUser> for SessionResponse {
    fn from(s: AuthenticatedUser) -> Self {
        SessionResponse {
            user: s.user.into(),
            access_token: s.tokens.access_token,
            refresh_token: s.tokens.refresh_token,
        }
    }
}

/// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    svc: web::Data<AppAuthService>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let session = web::block(move || svc.register(&body.email, &body.password, body.name))
        .await
        .map_err(blocking_error)??;
    Ok(HttpResponse::Created().json(SessionResponse::from(session)))
}

/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    svc: web::Data<AppAuthService>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let session = web::block(move || svc.login(&body.email, &body.password))
        .await
        .map_err(blocking_error)??;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

/// POST /auth/refresh
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Fresh token pair", body = SessionResponse),
        (status = 401, description = "Invalid refresh token"),
    ),
    tag = "auth"
)]
pub async fn refresh(
    svc: web::Data<AppAuthService>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let session = web::block(move || svc.refresh(&body.refresh_token))
        .await
        .map_err(blocking_error)??;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

/// GET /auth/me
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not signed in"),
    ),
    tag = "auth"
)]
pub async fn me(
    svc: web::Data<AppAuthService>,
    requester: AuthedUser,
) -> Result<HttpResponse, AppError> {
    let identity = requester.0;
    let user = web::block(move || svc.current_user(identity))
        .await
        .map_err(blocking_error)??;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
