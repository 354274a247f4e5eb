use std::sync::Arc;

use dotenvy::dotenv;
use log::info;
use tower_http::cors::CorsLayer;

use okrserver::api_router::configure_api_routes;
use okrserver::config::AppConfig;
use okrserver::shared::state::AppState;
use okrserver::shared::utils::create_conn;
use okrserver::storage::{DieselStore, OkrStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    let pool = create_conn(&config.database.url, config.database.max_connections)?;
    let store: Arc<dyn OkrStore> = Arc::new(DieselStore::new(pool));
    let state = Arc::new(AppState::new(config.clone(), store));

    let app = configure_api_routes()
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("okrserver listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
