//! WebSocket upgrade + message loop. Each text frame is parsed as a
//! `ClientWsMessage` and handed to the connection's `WidgetSession`.
//! Besides client frames the loop waits on two timers: the reveal delay of a
//! pending game comparison and the one-second brain-writing clock.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use chrono::Utc;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::{Reply, WidgetSession};
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "studyhall", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Frames the loop cares about.
#[derive(Debug)]
pub(crate) enum Inbound {
  Text(String),
  Ping(Vec<u8>),
  Other,
}

/// Both directions of a client connection.
pub(crate) trait Transport {
  /// None once the peer is gone.
  fn recv(&mut self) -> impl Future<Output = Option<Inbound>> + Send;
  fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), axum::Error>> + Send;
  fn pong(&mut self, payload: Vec<u8>) -> impl Future<Output = Result<(), axum::Error>> + Send;
}

impl Transport for WebSocket {
  async fn recv(&mut self) -> Option<Inbound> {
    match WebSocket::recv(self).await {
      Some(Ok(Message::Text(txt))) => Some(Inbound::Text(txt)),
      Some(Ok(Message::Ping(payload))) => Some(Inbound::Ping(payload)),
      Some(Ok(Message::Close(_))) | Some(Err(_)) | None => None,
      Some(Ok(_)) => Some(Inbound::Other),
    }
  }

  async fn send_text(&mut self, text: String) -> Result<(), axum::Error> { self.send(Message::Text(text)).await }

  async fn pong(&mut self, payload: Vec<u8>) -> Result<(), axum::Error> { self.send(Message::Pong(payload)).await }
}

fn encode(msg: &ServerWsMessage) -> String {
  serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
  info!(target: "studyhall", "WebSocket connected");
  let session = WidgetSession::new(state.default_locale());
  run_session(socket, session, state).await;
  info!(target: "studyhall", "WebSocket disconnected");
}

/// Handle one parsed message. Messages that read content files run on the
/// blocking pool; the session travels there and back. None if that task died.
async fn dispatch(
  mut session: WidgetSession,
  msg: ClientWsMessage,
  state: &Arc<AppState>,
) -> Option<(WidgetSession, Reply)> {
  if !msg.reads_content() {
    let reply = session.handle(msg, state, Utc::now());
    return Some((session, reply));
  }
  let state = Arc::clone(state);
  let task = tokio::task::spawn_blocking(move || {
    let reply = session.handle(msg, &state, Utc::now());
    (session, reply)
  });
  match task.await {
    Ok(done) => Some(done),
    Err(e) => {
      error!(target: "studyhall", error = %e, "Widget task failed");
      None
    }
  }
}

#[instrument(level = "info", skip_all)]
pub(crate) async fn run_session<T: Transport>(mut transport: T, mut session: WidgetSession, state: Arc<AppState>) {
  let mut settle_at: Option<Instant> = None;
  let mut clock = interval(Duration::from_secs(1));
  clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

  'conn: loop {
    let outgoing: Vec<ServerWsMessage> = tokio::select! {
      incoming = transport.recv() => {
        let Some(frame) = incoming else { break 'conn };
        match frame {
          Inbound::Text(txt) => {
            let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(parsed) => {
                debug!(target: "widgets", msg = %trunc_for_log(&txt, 200), "WS received");
                let Some((back, reply)) = dispatch(session, parsed, &state).await else { break 'conn };
                session = back;
                reply
              }
              Err(e) => Reply::error(format!("Invalid JSON: {}", e)),
            };
            if let Some(delay) = reply.settle_after {
              settle_at = Some(Instant::now() + delay);
            }
            if reply.restart_clock {
              clock.reset();
            }
            reply.messages
          }
          Inbound::Ping(payload) => {
            let _ = transport.pong(payload).await;
            Vec::new()
          }
          Inbound::Other => Vec::new(),
        }
      }
      _ = sleep_until(settle_at.unwrap_or_else(Instant::now)), if settle_at.is_some() => {
        settle_at = None;
        session.settle().into_iter().collect()
      }
      _ = clock.tick(), if session.round_running() => {
        session.tick(1).into_iter().collect()
      }
    };

    for msg in &outgoing {
      if let Err(e) = transport.send_text(encode(msg)).await {
        error!(target: "studyhall", error = %e, "WS send error");
        break 'conn;
      }
    }
  }
}
