use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use sigrelay_core::error::{Result, SigRelayError};

use crate::realtime::RealtimeCtx;

/// Services keyed by RTM message type (`"webrtc"`, `"ping"`, ...).
#[async_trait]
pub trait TextService: Send + Sync {
    fn msg_type(&self) -> &'static str;
    /// Handle one text frame. `text` is the full frame, already known to carry
    /// this service's `type`.
    async fn handle(&self, ctx: RealtimeCtx, text: String) -> Result<()>;
}

/// Registry and dispatcher for text services.
#[derive(Default)]
pub struct Dispatcher {
    text: DashMap<&'static str, Arc<dyn TextService>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            text: DashMap::new(),
        }
    }

    pub fn register_text(&self, svc: Arc<dyn TextService>) {
        self.text.insert(svc.msg_type(), svc);
    }

    pub fn registered_types(&self) -> Vec<&'static str> {
        self.text.iter().map(|e| *e.key()).collect()
    }

    pub async fn dispatch_text(&self, ctx: RealtimeCtx, msg_type: &str, text: String) -> Result<()> {
        let handler = self
            .text
            .get(msg_type)
            .ok_or_else(|| SigRelayError::bad(format!("unknown type: {msg_type}")))?
            .value()
            .clone();
        handler.handle(ctx, text).await
    }
}
