use std::sync::Arc;

use mediavault::config;
use mediavault::identity::ClerkProvider;
use mediavault::media::CloudinaryService;
use mediavault::state::AppState;
use mediavault::store::PgVaultStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Media Vault API in {:?} mode", config.environment);

    let store = PgVaultStore::connect(&config.database.url, config.database.max_connections)
        .await
        .unwrap_or_else(|e| panic!("failed to connect database: {}", e));

    let state = Arc::new(AppState {
        store: Arc::new(store),
        media: Arc::new(CloudinaryService::new(config.media.clone())),
        identity: Arc::new(ClerkProvider::new(config.identity.clone())),
    });

    let app = mediavault::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Media Vault API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
