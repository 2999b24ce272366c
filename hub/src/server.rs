//! WebSocket server
//!
//! Each connection is handled on its own task and its messages are routed
//! strictly in order. Replies go through a per-connection channel drained by a
//! writer task, which also lets the hub broadcast to every connected client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, RwLock};

use crate::error::{HubError, HubResult};
use crate::router::MessageRouter;

/// How often finished workflows are swept when retention is configured
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

type ClientSender = mpsc::UnboundedSender<String>;

/// Shared server state
pub struct HubState {
    router: Arc<MessageRouter>,
    clients: RwLock<HashMap<u64, ClientSender>>,
    next_client: AtomicU64,
}

impl HubState {
    pub fn new(router: Arc<MessageRouter>) -> Arc<Self> {
        Arc::new(Self {
            router,
            clients: RwLock::new(HashMap::new()),
            next_client: AtomicU64::new(0),
        })
    }

    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }

    /// Add a client; frames sent to it arrive on the returned receiver
    pub async fn register_client(&self) -> (u64, mpsc::UnboundedReceiver<String>) {
        let id = self.next_client.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.write().await.insert(id, tx);
        (id, rx)
    }

    pub async fn unregister_client(&self, id: u64) {
        self.clients.write().await.remove(&id);
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Send a frame to one client; false when it is gone
    pub async fn send_to(&self, id: u64, frame: String) -> bool {
        match self.clients.read().await.get(&id) {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    /// Send a frame to every client, returning how many accepted it
    pub async fn broadcast(&self, frame: &str) -> usize {
        self.clients
            .read()
            .await
            .values()
            .filter(|tx| tx.send(frame.to_string()).is_ok())
            .count()
    }
}

/// Create the axum router
pub fn create_router(state: Arc<HubState>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve until the listener fails
pub async fn serve(
    state: Arc<HubState>,
    host: &str,
    port: u16,
    retention: Option<Duration>,
) -> HubResult<()> {
    if let Some(max_age) = retention {
        spawn_sweeper(state.clone(), max_age);
    }

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| HubError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!("Starting agent hub on ws://{}", addr);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

fn spawn_sweeper(state: Arc<HubState>, max_age: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state.router.orchestrator().prune_finished(max_age);
            if removed > 0 {
                tracing::info!(removed, "pruned finished workflows");
            }
        }
    });
}

pub async fn health(State(state): State<Arc<HubState>>) -> Json<Value> {
    Json(json!({ "status": "ok", "clients": state.client_count().await }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<HubState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<HubState>) {
    let (mut sender, mut receiver) = socket.split();
    let (client_id, mut outbound) = state.register_client().await;
    tracing::info!(client_id, "client connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    'connection: while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                for reply in state.router.route(&text).await {
                    if !state.send_to(client_id, reply).await {
                        tracing::warn!(client_id, "failed to send reply");
                        break 'connection;
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.unregister_client(client_id).await;
    writer.abort();
    tracing::info!(client_id, "client disconnected");
}
