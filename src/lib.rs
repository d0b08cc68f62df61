pub mod application;
pub mod auth;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::auth_service::AuthService;
use application::order_service::OrderService;
use infrastructure::catalog_repo::DieselProductCatalog;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::user_repo::DieselUserStore;

pub use auth::JwtKeys;
pub use db::{create_pool, DbPool};

pub type AppOrderService = OrderService<DieselOrderRepository, DieselProductCatalog>;
pub type AppAuthService = AuthService<DieselUserStore>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::orders::change_order_state,
        handlers::orders::archive_order,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::me,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::categories::list_categories,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
    ),
    tags(
        (name = "orders", description = "Order creation and workflow"),
        (name = "auth", description = "Accounts and tokens"),
        (name = "catalog", description = "Products and categories"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    keys: JwtKeys,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        let orders = AppOrderService::new(
            DieselOrderRepository::new(pool.clone()),
            DieselProductCatalog::new(pool.clone()),
        );
        let auth_svc = AppAuthService::new(DieselUserStore::new(pool.clone()), keys.clone());
        let catalog = DieselProductCatalog::new(pool.clone());

        App::new()
            .app_data(web::Data::new(orders))
            .app_data(web::Data::new(auth_svc))
            .app_data(web::Data::new(catalog))
            .app_data(web::Data::new(keys.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(handlers::auth::register))
                    .route("/login", web::post().to(handlers::auth::login))
                    .route("/refresh", web::post().to(handlers::auth::refresh))
                    .route("/me", web::get().to(handlers::auth::me)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route(
                        "/{id}/status",
                        web::put().to(handlers::orders::change_order_state),
                    )
                    .route(
                        "/{id}/archive",
                        web::put().to(handlers::orders::archive_order),
                    ),
            )
            .service(
                web::scope("/products")
                    .route("", web::get().to(handlers::products::list_products))
                    .route("", web::post().to(handlers::products::create_product))
                    .route("/{id}", web::get().to(handlers::products::get_product))
                    .route("/{id}", web::put().to(handlers::products::update_product))
                    .route("/{id}", web::delete().to(handlers::products::delete_product)),
            )
            .service(
                web::scope("/categories")
                    .route("", web::get().to(handlers::categories::list_categories))
                    .route("", web::post().to(handlers::categories::create_category))
                    .route("/{id}", web::put().to(handlers::categories::update_category))
                    .route(
                        "/{id}",
                        web::delete().to(handlers::categories::delete_category),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
