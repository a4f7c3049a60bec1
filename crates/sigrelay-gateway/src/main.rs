//! sigrelay gateway
//!
//! - WebSocket endpoint: /v1/ws?ticket=...
//! - WebRTC signaling (group join, call offer/answer, signal, hangup)
//! - Background sweep of idle empty channels

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use sigrelay_gateway::signaling::ChannelRegistry;
use sigrelay_gateway::{app_state, config, router};

fn spawn_channel_sweeper(channels: Arc<ChannelRegistry>, every: Duration, max_age: Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            let purged = channels.purge_idle(max_age);
            if purged > 0 {
                tracing::debug!(purged, remaining = channels.len(), "idle channels purged");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "sigrelay.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.gateway.listen.parse()?;
    let sweep_every = Duration::from_millis(cfg.signaling.sweep_interval_ms);
    let channel_ttl = Duration::from_millis(cfg.signaling.channel_idle_timeout_ms);

    let state = app_state::AppState::new(cfg)?;
    spawn_channel_sweeper(Arc::clone(&state.realtime().channels), sweep_every, channel_ttl);
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "sigrelay-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
