use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medquery_api_rest::{AppState, router};
use medquery_core::{
    AnalysisService, CoreConfig, Database, GeminiClient, GenerationConfig,
    config::{api_key_from_env_value, database_path_from_env_value, generation_url_from_env_value},
};

/// Main entry point for the MedQuery web application
///
/// Serves the question page and the analysis endpoint on one address.
///
/// # Environment Variables
/// - `MEDQUERY_ADDR`: listen address (default: "0.0.0.0:3000")
/// - `MEDQUERY_DATABASE_PATH`: SQLite file provisioned by `medquery provision`
///   (default: "healthcare_db.sqlite3")
/// - `GOOGLE_API_KEY`: key for the generation service
/// - `MEDQUERY_GENERATION_URL`: generation service base URL
///   (default: "https://generativelanguage.googleapis.com")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medquery_run=info".parse()?)
                .add_directive("medquery_core=info".parse()?)
                .add_directive("medquery_api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDQUERY_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let api_key = api_key_from_env_value(std::env::var("GOOGLE_API_KEY").ok());
    if api_key.is_none() {
        tracing::warn!("GOOGLE_API_KEY is not set; every analysis will fail until it is");
    }

    let cfg = CoreConfig::new(
        database_path_from_env_value(std::env::var("MEDQUERY_DATABASE_PATH").ok()),
        GenerationConfig::new(
            api_key,
            generation_url_from_env_value(std::env::var("MEDQUERY_GENERATION_URL").ok()),
        ),
    )?;

    if !cfg.database_path().exists() {
        tracing::warn!(
            "Database {} does not exist yet; run `medquery provision` first",
            cfg.database_path().display()
        );
    }

    let generator = Arc::new(GeminiClient::new(cfg.generation().clone()));
    let service = AnalysisService::new(Database::new(&cfg), generator);
    let app = router(AppState::new(service));

    tracing::info!("++ Starting MedQuery on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
