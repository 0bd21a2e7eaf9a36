use std::{env, sync::Arc};

use coursegen::{
    config::{Config, StorageConfig},
    gateway::{CourseGateway, GeminiClient},
    repository::{postgres, MemoryStore, PgStore, SharedStore},
    AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "coursegen=info,tower_http=info,axum=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: SharedStore = match &config.storage {
        StorageConfig::Memory => {
            tracing::info!("using in-memory storage seeded with sample courses");
            Arc::new(MemoryStore::with_samples())
        }
        StorageConfig::Postgres {
            url,
            max_connections,
        } => {
            let db = postgres::connect(url, *max_connections).await?;
            let store = PgStore::new(db);
            store.migrate().await?;
            tracing::info!("using postgres storage");
            Arc::new(store)
        }
    };

    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; course generation will fail");
    }
    let gateway = CourseGateway::new(Arc::new(GeminiClient::new(&config.gemini)?));

    let app = coursegen::app(AppState { store, gateway });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
