//! Shared application state for the sigrelay gateway.
//!
//! Builds the realtime core, the signaling engine and the dispatcher once at
//! startup. Startup errors are returned, never panicked.

use std::collections::HashMap;
use std::sync::Arc;

use sigrelay_core::error::{Result, SigRelayError};
use sigrelay_core::signaling::HashAuthenticator;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::obs::metrics::GatewayMetrics;
use crate::realtime::{ConnectionDirectory, RealtimeCore};
use crate::services::{PingService, WebRtcService};
use crate::signaling::{EngineSettings, SignalingEngine};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    realtime: Arc<RealtimeCore>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<GatewayMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    tickets: HashMap<String, String>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let realtime = Arc::new(RealtimeCore::new());
        let metrics = Arc::new(GatewayMetrics::default());

        // One secret per process; tags do not survive a restart.
        let auth = Arc::new(HashAuthenticator::generate()?);
        let directory: Arc<dyn ConnectionDirectory> = realtime.sessions.clone();
        let engine = Arc::new(SignalingEngine::new(
            Arc::clone(&realtime.channels),
            directory,
            auth,
            EngineSettings {
                min_payload_version: cfg.signaling.min_payload_version,
                group_pipeline: cfg.signaling.group_pipeline(),
            },
        ));

        let dispatcher = Dispatcher::new();
        dispatcher.register_text(Arc::new(WebRtcService::new(engine, Arc::clone(&metrics))));
        dispatcher.register_text(Arc::new(PingService::new()));
        if dispatcher.registered_types().len() != 2 {
            return Err(SigRelayError::Internal("duplicate service registration".into()));
        }

        let tickets = cfg.auth.tickets.clone();
        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, tickets }),
            realtime,
            dispatcher: Arc::new(dispatcher),
            metrics,
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    /// Resolve a connect ticket to the user id it authenticates.
    pub fn resolve_ticket(&self, ticket: &str) -> Result<String> {
        self.inner
            .tickets
            .get(ticket)
            .cloned()
            .ok_or(SigRelayError::AuthFailed)
    }

    pub fn realtime(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.realtime)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }
}
