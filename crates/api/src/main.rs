use anyhow::Result;
use stroll_api::{build_app, AppConfig};
use stroll_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("stroll_api");

    let config = AppConfig::from_env();
    let bind = config.bind.clone();
    let model = config.model.clone();
    let mode = config.response_mode;

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(
        bind = %bind,
        model = %model,
        mode = mode.as_str(),
        "stroll tour api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
