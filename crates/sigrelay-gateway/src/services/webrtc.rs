use std::sync::Arc;

use async_trait::async_trait;

use sigrelay_core::error::Result;
use sigrelay_core::protocol::rtm::TYPE_WEBRTC;
use sigrelay_core::protocol::webrtc::decode_envelope;

use crate::dispatch::TextService;
use crate::obs::metrics::GatewayMetrics;
use crate::realtime::RealtimeCtx;
use crate::signaling::SignalingEngine;

/// Routes `webrtc` envelopes into the signaling engine.
pub struct WebRtcService {
    engine: Arc<SignalingEngine>,
    metrics: Arc<GatewayMetrics>,
}

impl WebRtcService {
    pub fn new(engine: Arc<SignalingEngine>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { engine, metrics }
    }
}

#[async_trait]
impl TextService for WebRtcService {
    fn msg_type(&self) -> &'static str {
        TYPE_WEBRTC
    }

    async fn handle(&self, ctx: RealtimeCtx, text: String) -> Result<()> {
        let env = decode_envelope(&text)?;
        let subtype = env.subtype.as_str();

        let res = self.engine.handle(ctx.connection(), env);
        let outcome = match &res {
            Ok(()) => "ok",
            Err(e) => e.client_code().as_str(),
        };
        self.metrics
            .signaling_messages
            .inc(&[("subtype", subtype), ("outcome", outcome)]);
        res
    }
}
