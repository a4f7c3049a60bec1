use async_trait::async_trait;

use sigrelay_core::error::Result;
use sigrelay_core::protocol::rtm::{PongReply, TYPE_PING};

use crate::dispatch::TextService;
use crate::realtime::RealtimeCtx;

/// Application-level keepalive: answers `ping` with a correlated `pong`.
#[derive(Default)]
pub struct PingService;

impl PingService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextService for PingService {
    fn msg_type(&self) -> &'static str {
        TYPE_PING
    }

    async fn handle(&self, ctx: RealtimeCtx, _text: String) -> Result<()> {
        ctx.reply(&PongReply::new(ctx.request_id()));
        Ok(())
    }
}
