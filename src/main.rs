use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod availability;
mod config;
mod display;
mod engine;
mod geo;
mod model;
mod provider;
mod routes;
mod session;

use config::Config;
use engine::SelectionEngine;
use provider::{mock::MockProvider, supabase::SupabaseProvider, DataProvider};
use routes::{create_router, AppState};
use session::init_session_store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adventure_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let tz = config.timezone()?;

    let provider: Arc<dyn DataProvider> = if config.use_mock_provider {
        tracing::warn!("USE_MOCK_PROVIDER is set, serving built-in sample data");
        Arc::new(MockProvider::sample(tz, chrono::Utc::now()))
    } else {
        Arc::new(SupabaseProvider::new(&config)?)
    };

    let engine = Arc::new(SelectionEngine::new(
        provider,
        config.region,
        config.search_settings(),
        tz,
    ));

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        engine,
        sessions: init_session_store(),
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server starting on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
