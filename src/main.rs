use axum::middleware::from_fn;
use axum::{Extension, Router};
use dotenvy::dotenv;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod config;
mod db;
mod middleware;
mod utils;
mod validation;
mod workflow;

use crate::config::Config;
use crate::db::queries::admin::AdminDoc;
use crate::db::queries::notification::NotificationDoc;
use crate::db::queries::request::RequestDoc;
use crate::middleware::auth::{create_admin_cache, jwt_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    Config::init();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let pool = db::pool::get_db_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_cache = create_admin_cache();

    let merged_doc = RequestDoc::openapi()
        .merge_from(AdminDoc::openapi())
        .merge_from(NotificationDoc::openapi());

    // Private routes
    let private_routes = Router::new()
        .merge(api::request::request_routes())
        .merge(api::admin::admin_routes())
        .merge(api::notification::notification_routes())
        .route_layer(from_fn(jwt_middleware));

    let app = Router::new()
        .merge(api::health::health_routes())
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc).path("/rapidoc"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(admin_cache))
        .with_state(pool.clone());

    run_server(app, pool).await?;
    tracing::info!("Shutdown complete.");
    Ok(())
}

async fn run_server(app: Router, pool: PgPool) -> anyhow::Result<()> {
    let addr = Config::get().bind_addr;
    tracing::info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Closing database pool...");
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    signal::ctrl_c().await.ok();
    tracing::info!("Received Ctrl+C, shutting down...");
}
