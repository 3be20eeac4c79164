use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use anytime_server::auth::TokenVerifier;
use anytime_server::config::Config;
use anytime_server::routes::create_routes;
use anytime_server::state::AppState;
use anytime_server::store::{AnytimeStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("anytime_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let store: Arc<dyn AnytimeStore> = if config.uses_memory_store() {
        tracing::warn!("Using the in-memory store, data is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await
            .expect("Failed to connect to database");

        tracing::info!("Successfully connected to database");

        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        tracing::info!("Migrations run successfully");
        Arc::new(PgStore::new(pool))
    };

    let state = AppState::new(store, TokenVerifier::new(&config.auth_jwt_secret));
    let app = create_routes(state, config.request_timeout);

    let addr = config.bind_addr();
    tracing::info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
