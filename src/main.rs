use anyhow::Result;
use config::Config;
use solar_forecast::{api, config, state::AppState, telemetry};
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    init_tracing(&cfg.logging);

    let app_state = AppState::new(cfg.clone());
    if !app_state.model().is_available() {
        warn!(
            path = %cfg.model.path.display(),
            "serving without a model; /forecast will fail until restart"
        );
    }

    let app = api::router(app_state, &cfg);

    let addr = cfg.server.socket_addr()?;
    info!(%addr, "starting solar forecast service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}
