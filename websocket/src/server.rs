//! WebSocket server implementation.
//!
//! Accepts WebSocket connections at `/ws`. Every committed ledger record is
//! pushed into one broadcast channel; each client subscription runs a
//! forwarder task that filters the channel and writes matching records.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use ballot_ledger::{EventFilter, EventRecord, Ledger};
use ballot_types::BlockNumber;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::subscriptions::{ClientMessage, ServerMessage, Subscription};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Shared state for the WebSocket server.
pub struct WsState {
    pub ledger: Arc<Ledger>,
    /// Every committed record, in commit order.
    pub events_tx: broadcast::Sender<EventRecord>,
}

impl WsState {
    /// Create the state and register it as a listener of `ledger`.
    pub fn attach(ledger: Arc<Ledger>, channel_capacity: usize) -> Self {
        let (events_tx, _) = broadcast::channel(channel_capacity);
        let tx = events_tx.clone();
        ledger.subscribe(Box::new(move |record| {
            // No receivers just means no client is connected.
            let _ = tx.send(record.clone());
        }));
        Self { ledger, events_tx }
    }
}

/// Build the `/ws` router.
pub fn router(state: Arc<WsState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// The WebSocket server, configured with an address and shared state.
pub struct WebSocketServer {
    pub addr: SocketAddr,
    pub state: Arc<WsState>,
}

impl WebSocketServer {
    pub fn new(addr: SocketAddr, state: Arc<WsState>) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(Arc::clone(&self.state));
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("WebSocket server listening on {}", self.addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
///
/// A connection holds at most one subscription; subscribing again replaces
/// it. The forwarder task is aborted on unsubscribe and on disconnect.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(ws_sender));
    let mut forwarder: Option<JoinHandle<()>> = None;

    debug!("New WebSocket client connected");

    while let Some(msg_result) = ws_receiver.next().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                handle_text_message(&text, &state, &mut forwarder, &ws_sender).await;
            }
            Message::Close(_) => {
                debug!("Client sent close frame");
                break;
            }
            Message::Ping(data) => {
                let mut sender = ws_sender.lock().await;
                let _ = sender.send(Message::Pong(data)).await;
            }
            _ => {}
        }
    }

    if let Some(handle) = forwarder.take() {
        handle.abort();
    }
    debug!("WebSocket client disconnected");
}

async fn send_message(ws_sender: &WsSender, msg: &ServerMessage) -> bool {
    let text = match serde_json::to_string(msg) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to encode server message: {}", e);
            return false;
        }
    };
    let mut sender = ws_sender.lock().await;
    sender.send(Message::Text(text)).await.is_ok()
}

async fn send_error(ws_sender: &WsSender, message: String) {
    send_message(ws_sender, &ServerMessage::Error { message }).await;
}

/// Process a text message from the client.
async fn handle_text_message(
    text: &str,
    state: &Arc<WsState>,
    forwarder: &mut Option<JoinHandle<()>>,
    ws_sender: &WsSender,
) {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            send_error(ws_sender, format!("Invalid message: {}", e)).await;
            return;
        }
    };

    match client_msg {
        ClientMessage::Subscribe {
            kinds,
            session_id,
            from_block,
        } => {
            let subscription = match Subscription::new(kinds, session_id) {
                Ok(s) => s,
                Err(e) => {
                    send_error(ws_sender, e).await;
                    return;
                }
            };
            if let Some(handle) = forwarder.take() {
                handle.abort();
            }

            // Listen before reading the watermark so no commit falls in between.
            let rx = state.events_tx.subscribe();
            let watermark = from_block.map(|from| (from, last_committed(&state.ledger)));

            send_message(
                ws_sender,
                &ServerMessage::Ack {
                    action: "subscribe".to_string(),
                },
            )
            .await;

            let ledger = Arc::clone(&state.ledger);
            let sender = Arc::clone(ws_sender);
            *forwarder = Some(tokio::spawn(async move {
                forward_events(ledger, rx, sender, subscription, watermark).await;
            }));
            debug!(?session_id, ?from_block, "Client subscribed");
        }
        ClientMessage::Unsubscribe => {
            let reply = match forwarder.take() {
                Some(handle) => {
                    handle.abort();
                    ServerMessage::Ack {
                        action: "unsubscribe".to_string(),
                    }
                }
                None => ServerMessage::Error {
                    message: "Not subscribed".to_string(),
                },
            };
            send_message(ws_sender, &reply).await;
        }
        ClientMessage::Ping => {
            send_message(ws_sender, &ServerMessage::Pong).await;
        }
    }
}

/// Highest committed block, `None` on an empty ledger.
fn last_committed(ledger: &Ledger) -> Option<BlockNumber> {
    let next = ledger.summary().next_block.as_u64();
    next.checked_sub(1).map(BlockNumber::new)
}

/// Forwarder task: replays history up to the watermark, then relays live
/// records strictly above it.
async fn forward_events(
    ledger: Arc<Ledger>,
    mut rx: broadcast::Receiver<EventRecord>,
    ws_sender: WsSender,
    subscription: Subscription,
    watermark: Option<(BlockNumber, Option<BlockNumber>)>,
) {
    let floor = watermark.map(|(from, _)| from);
    let mut replayed_up_to: Option<BlockNumber> = None;
    if let Some((from, Some(last))) = watermark {
        replayed_up_to = Some(last);
        let filter = EventFilter {
            kind: None,
            session_id: subscription.session_id,
            from_block: Some(from),
            to_block: Some(last),
        };
        let history = tokio::task::spawn_blocking(move || ledger.events(&filter)).await;
        let records = match history {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                send_error(&ws_sender, format!("Replay failed: {}", e)).await;
                return;
            }
            Err(e) => {
                warn!("replay task failed: {}", e);
                return;
            }
        };
        for record in records.into_iter().filter(|r| subscription.matches(r)) {
            if !send_message(&ws_sender, &ServerMessage::Event { record }).await {
                return;
            }
        }
    }

    loop {
        match rx.recv().await {
            Ok(record) => {
                if replayed_up_to.is_some_and(|last| record.block <= last)
                    || floor.is_some_and(|from| record.block < from)
                {
                    continue;
                }
                if subscription.matches(&record)
                    && !send_message(&ws_sender, &ServerMessage::Event { record }).await
                {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Client lagged behind by {} records", n);
                send_error(&ws_sender, format!("Lagged: {} records dropped", n)).await;
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Event channel closed");
                break;
            }
        }
    }
}
