//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Resolve the `ticket` query parameter to a user and bind the connection
//! - Lifecycle: ping/pong + idle timeout
//! - Decode the header once, dispatch by type, answer failures with a
//!   correlated error reply

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, Query, State},
    response::Response,
};
use std::pin::Pin;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, Sleep};
use tracing::Instrument;

use sigrelay_core::error::{Result, SigRelayError};
use sigrelay_core::protocol::rtm::ErrorReply;

use crate::app_state::AppState;
use crate::realtime::{Connection, RealtimeCtx};
use crate::transport::codec::{decode, frame_len, Inbound};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub ticket: String,
}

fn hello_json(user: &str, session: &str) -> String {
    json!({
        "type": "hello",
        "self": { "id": user },
        "session": session
    })
    .to_string()
}

fn error_json(err: &SigRelayError, reply_to: u64) -> String {
    serde_json::to_string(&ErrorReply::new(err, reply_to))
        .unwrap_or_else(|_| r#"{"type":"error","error":{"code":"internal_error","msg":"internal error"}}"#.into())
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    ws: WebSocketUpgrade,
    Query(q): Query<WsQuery>,
) -> Response {
    let max_frame = app.cfg().gateway.max_frame_bytes;
    ws.max_message_size(max_frame).on_upgrade(move |socket| async move {
        if let Err(e) = run_session(app, q, socket).await {
            tracing::debug!(error = %e, "session ended with error");
        }
    })
}

async fn run_session(app: AppState, q: WsQuery, socket: WebSocket) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // ---- auth ticket -> user_id
    let user_id = match app.resolve_ticket(&q.ticket) {
        Ok(u) => u,
        Err(e) => {
            let _ = ws_tx.send(Message::Text(error_json(&e, 0))).await;
            return Err(e);
        }
    };

    let core = app.realtime();
    let gw = &app.cfg().gateway;
    let (out_tx, out_rx) = mpsc::channel::<Message>(gw.outbound_queue);
    let session_id = core.sessions.next_session_id();
    let conn = Connection::bound(session_id.clone(), user_id.clone(), out_tx);

    let span = tracing::info_span!("session", session = %session_id, user = %user_id);
    let metrics = app.metrics();
    metrics.ws_upgrades.inc(&[]);
    metrics.ws_active_sessions.inc(&[]);
    core.attach(&conn);

    let res = session_loop(&app, &conn, &mut ws_tx, &mut ws_rx, out_rx)
        .instrument(span.clone())
        .await;

    core.detach(&conn);
    metrics.ws_active_sessions.dec(&[]);
    span.in_scope(|| tracing::debug!("session closed"));
    res
}

/// Idle deadline that only inbound activity pushes back.
struct IdleTimer {
    timeout: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl IdleTimer {
    fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sleep: Box::pin(tokio::time::sleep(timeout)),
        }
    }

    fn touch(&mut self) {
        self.sleep.as_mut().reset(Instant::now() + self.timeout);
    }

    /// Resolves once the deadline passes. Dropping the future keeps the deadline.
    async fn expired(&mut self) {
        self.sleep.as_mut().await
    }
}

async fn session_loop(
    app: &AppState,
    conn: &Connection,
    ws_tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    ws_rx: &mut futures_util::stream::SplitStream<WebSocket>,
    mut out_rx: mpsc::Receiver<Message>,
) -> Result<()> {
    let gw = &app.cfg().gateway;
    let dispatcher = app.dispatcher();
    let metrics = app.metrics();

    conn.send_raw(Message::Text(hello_json(
        conn.bound_user().unwrap_or_default(),
        conn.session_id(),
    )));
    tracing::info!("session bound");

    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut idle = IdleTimer::new(idle_timeout);

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                idle.touch();

                if frame_len(&msg) > gw.max_frame_bytes {
                    let err = SigRelayError::bad("frame too large");
                    let _ = ws_tx.send(Message::Text(error_json(&err, 0))).await;
                    break;
                }

                match decode(msg) {
                    Ok(Inbound::Text { header, text }) => {
                        let ctx = RealtimeCtx::new(conn.clone(), header.id);
                        if let Err(e) = dispatcher.dispatch_text(ctx, &header.msg_type, text).await {
                            match &e {
                                SigRelayError::Internal(detail) => {
                                    tracing::error!(msg_type = %header.msg_type, id = header.id, %detail, "request failed");
                                }
                                other => {
                                    tracing::warn!(msg_type = %header.msg_type, id = header.id, error = %other, "request rejected");
                                }
                            }
                            metrics.service_errors.inc(&[("type", header.msg_type.as_str()), ("code", e.client_code().as_str())]);
                            conn.send(&ErrorReply::new(&e, header.id));
                        }
                    }
                    Ok(Inbound::Ping(payload)) => conn.send_raw(Message::Pong(payload)),
                    Ok(Inbound::Pong(_)) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        metrics.decode_errors.inc(&[]);
                        tracing::warn!(error = %e, "undecodable frame");
                        conn.send(&ErrorReply::new(&e, 0));
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                conn.send_raw(Message::Ping(Vec::new()));
            }

            _ = idle.expired() => {
                tracing::info!("idle timeout");
                break;
            }
        }
    }

    Ok(())
}
