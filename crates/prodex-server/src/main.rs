use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use prodex_server::config::{ServerConfig, load_env_files};
use prodex_server::routes;
use prodex_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_files();
    let config = ServerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("prodex={}", config.log_level).parse()?)
                .add_directive(format!("tower_http={}", config.log_level).parse()?),
        )
        .with_target(false)
        .init();

    let pipeline = prodex_client::build_pipeline(&config.pipeline)?;
    let state = Arc::new(AppState::new(pipeline, config.environment.clone()));
    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        "Server running in {} mode on port {}",
        config.environment,
        config.port
    );
    tracing::info!(
        "Swagger documentation available at http://localhost:{}/api-docs",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
