use demand_forecast::InferenceService;
use demand_server::{create_app, AppState, ServerConfig, ServerError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "demand_server=info,demand_forecast=info,tower_http=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env();
    let service = InferenceService::from_artifacts(&config.scaler_path, &config.model_dir)?;
    let app = create_app(AppState::new(service), &config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        "demand_server v{} listening on {} (allowed origin {})",
        env!("CARGO_PKG_VERSION"),
        config.bind_addr(),
        config.allowed_origin
    );
    axum::serve(listener, app).await?;
    Ok(())
}
