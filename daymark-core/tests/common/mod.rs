//! In-process backend for the integration tests: `/availability` answers
//! with a configurable reply and `/ws` forwards pushed messages.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use daymark_core::SyncSettings;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use url::Url;

#[derive(Clone)]
struct BackendState {
    reply: Arc<Mutex<(u16, String)>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pushes: broadcast::Sender<String>,
    subscribed: mpsc::UnboundedSender<String>,
}

pub struct Backend {
    pub addr: SocketAddr,
    state: BackendState,
    /// First message of every WebSocket connection.
    pub subscriptions: mpsc::UnboundedReceiver<String>,
}

impl Backend {
    pub async fn start() -> Backend {
        let (pushes, _) = broadcast::channel(16);
        let (subscribed, subscriptions) = mpsc::unbounded_channel();
        let state = BackendState {
            reply: Arc::new(Mutex::new((200, r#"{"data": {}}"#.to_string()))),
            queries: Arc::new(Mutex::new(Vec::new())),
            pushes,
            subscribed,
        };

        let app = Router::new()
            .route("/availability", get(availability))
            .route("/ws", get(push_socket))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Backend {
            addr,
            state,
            subscriptions,
        }
    }

    pub fn settings(&self) -> SyncSettings {
        SyncSettings::new(Url::parse(&format!("http://{}", self.addr)).unwrap()).unwrap()
    }

    pub fn reply_with(&self, status: u16, body: impl Into<String>) {
        *self.state.reply.lock().unwrap() = (status, body.into());
    }

    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        self.state.queries.lock().unwrap().clone()
    }

    /// Send a text message to every connected client.
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.state.pushes.send(text.into());
    }
}

async fn availability(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.queries.lock().unwrap().push(query);
    let (status, body) = state.reply.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), body)
}

async fn push_socket(ws: WebSocketUpgrade, State(state): State<BackendState>) -> Response {
    ws.on_upgrade(move |socket| forward_pushes(socket, state))
}

async fn forward_pushes(mut socket: WebSocket, state: BackendState) {
    let mut pushes = state.pushes.subscribe();
    if let Some(Ok(Message::Text(text))) = socket.recv().await {
        let _ = state.subscribed.send(text.to_string());
    }
    while let Ok(text) = pushes.recv().await {
        if socket.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
}
