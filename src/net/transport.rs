//! Connection to the data store: inbound event queue and outbound calls

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    client::IntoClientRequest,
    http::{header::AUTHORIZATION, HeaderValue},
    Message,
};
use tracing::{debug, error, info, warn};

use crate::util::rate_limit::OutboundLimiter;
use crate::world::types::Identity;

use super::protocol::{ClientMsg, RowEvent, ServerMsg};

/// Events produced by the transport, drained once per frame by the session
#[derive(Debug)]
pub enum NetEvent {
    /// Session identity issued by the server
    Connected { identity: Identity, token: String },
    SubscriptionApplied,
    /// Row changes of one transaction
    Transaction(Vec<RowEvent>),
    /// Connection ended; `error` is set when it ended abnormally
    Disconnected { error: Option<TransportError> },
}

pub type NetEventSender = mpsc::UnboundedSender<NetEvent>;
pub type NetEventReceiver = mpsc::UnboundedReceiver<NetEvent>;

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid auth token header")]
    InvalidToken,
}

/// Fire-and-forget calls to the server
pub trait Outbound {
    fn send(&self, msg: ClientMsg);

    fn subscribe_all(&self) {
        self.send(ClientMsg::subscribe_all());
    }

    fn enter_game(&self, name: &str) {
        self.send(ClientMsg::EnterGame {
            name: name.to_string(),
        });
    }

    fn update_player_input(&self, horizontal: f32, jump: bool) {
        self.send(ClientMsg::UpdatePlayerInput { horizontal, jump });
    }

    /// Ask the transport to close the connection
    fn disconnect(&self) {}
}

enum Outgoing {
    Msg(ClientMsg),
    Close,
}

/// Outbound half of a websocket connection
#[derive(Clone)]
pub struct WsOutbound {
    tx: mpsc::UnboundedSender<Outgoing>,
    limiter: OutboundLimiter,
}

impl Outbound for WsOutbound {
    fn send(&self, msg: ClientMsg) {
        if matches!(msg, ClientMsg::UpdatePlayerInput { .. }) && !self.limiter.check_input() {
            warn!("Input call over outbound ceiling, dropped");
            return;
        }
        if self.tx.send(Outgoing::Msg(msg)).is_err() {
            debug!("Outbound channel closed");
        }
    }

    fn disconnect(&self) {
        let _ = self.tx.send(Outgoing::Close);
    }
}

/// Open a websocket connection to `url` in the background.
///
/// Every outcome, including a failed connect, is reported on the returned
/// event queue.
pub fn connect(url: String, token: Option<String>) -> (WsOutbound, NetEventReceiver) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let error = run_connection(&url, token, out_rx, &event_tx).await.err();
        if let Some(e) = &error {
            error!(error = %e, "Connection ended with error");
        } else {
            info!("Connection closed");
        }
        let _ = event_tx.send(NetEvent::Disconnected { error });
    });

    let outbound = WsOutbound {
        tx: out_tx,
        limiter: OutboundLimiter::new(),
    };
    (outbound, event_rx)
}

async fn run_connection(
    url: &str,
    token: Option<String>,
    mut out_rx: mpsc::UnboundedReceiver<Outgoing>,
    event_tx: &NetEventSender,
) -> Result<(), TransportError> {
    let mut request = url.into_client_request()?;
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| TransportError::InvalidToken)?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    let (stream, _) = tokio_tungstenite::connect_async(request).await?;
    info!(url = %url, "WebSocket connected");
    let (mut ws_sink, mut ws_stream) = stream.split();

    // Writer task: outbound calls -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(outgoing) = out_rx.recv().await {
            match outgoing {
                Outgoing::Msg(msg) => {
                    let json = match serde_json::to_string(&msg) {
                        Ok(json) => json,
                        Err(e) => {
                            error!(error = %e, "Failed to encode client message");
                            continue;
                        }
                    };
                    if let Err(e) = ws_sink.send(Message::Text(json)).await {
                        debug!(error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Outgoing::Close => {
                    let _ = ws_sink.close().await;
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> event queue
    let mut result = Ok(());
    while let Some(frame) = ws_stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerMsg>(&text) {
                Ok(msg) => {
                    if let Some(event) = into_event(msg) {
                        if event_tx.send(event).is_err() {
                            debug!("Event queue closed");
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse server message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!("Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
            Ok(Message::Close(_)) => {
                info!("Server initiated close");
                break;
            }
            Err(e) => {
                result = Err(e.into());
                break;
            }
        }
    }

    writer_handle.abort();
    result
}

fn into_event(msg: ServerMsg) -> Option<NetEvent> {
    match msg {
        ServerMsg::IdentityToken { identity, token } => {
            Some(NetEvent::Connected { identity, token })
        }
        ServerMsg::SubscriptionApplied => Some(NetEvent::SubscriptionApplied),
        ServerMsg::TransactionUpdate { events } => Some(NetEvent::Transaction(events)),
        ServerMsg::Error { code, message } => {
            warn!(code = %code, message = %message, "Server reported error");
            None
        }
    }
}
