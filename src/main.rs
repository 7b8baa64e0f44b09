//! Pomo Clock - a Pomodoro work/rest countdown clock
//!
//! This is the main entry point for the pomo-clock application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use pomo_clock::{
    alarm::AudioAlarm,
    api::create_router,
    config::Config,
    state::AppState,
    tasks::console_clock_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.validate()?;

    // Logs go to stderr so they do not tear the terminal clock on stdout
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomo_clock={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting pomo-clock v1.0.0");
    info!(
        "Configuration: host={}, port={}, work={}min, rest={}min, alarm={}, auto_cycle={}",
        config.host, config.port, config.work, config.rest, config.alarm, config.auto_cycle
    );

    let alarm = Arc::new(AudioAlarm::new(config.alarm_config()));
    let state = Arc::new(AppState::new(
        config.timer_settings(),
        alarm,
        config.port,
        config.host.clone(),
    ));

    if !config.headless {
        let face_rx = state.subscribe();
        tokio::spawn(async move {
            console_clock_task(face_rx).await;
        });
    }

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Control server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /interval/:minutes - Select 5/15/30/45/60/75/90/105 minutes for the current phase");
    info!("  POST /start/work        - Start a focus phase");
    info!("  POST /start/rest        - Start a rest phase");
    info!("  POST /stop              - Stop the countdown");
    info!("  POST /skip              - End the current phase now");
    info!("  GET  /status            - Current phase, intervals and clock");
    info!("  GET  /health            - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.stop();
    info!("Shutdown complete");
    Ok(())
}
