use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use maze_chase_engine::constants::{CELL_SIZE, TICK_MS, TOTAL_HUNTERS, TOTAL_PREYS};
use maze_chase_engine::protocol::{parse_client_message, ParsedClientMessage};
use maze_chase_engine::session::{GameSession, HunterStrategy, SessionOptions, SystemClock};
use maze_chase_engine::types::Intent;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    preys: Option<usize>,
    #[arg(long)]
    hunters: Option<usize>,
    #[arg(long)]
    strategy: Option<String>,
    #[arg(long)]
    layout: Option<PathBuf>,
    #[arg(long)]
    cell_size: Option<f32>,
}

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<String>,
    intent: Intent,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    session: GameSession,
}

impl ServerState {
    fn merge_intents(&mut self) {
        let merged = Intent::merge_all(self.clients.values().map(|client| &client.intent));
        self.session.set_intent(merged);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let options = session_options(&cli)?;
    log::info!(
        "[server] seed={} preys={} hunters={} strategy={:?}",
        options.seed,
        options.preys,
        options.hunters,
        options.strategy
    );

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let session = GameSession::new(options, Box::new(SystemClock)).context("invalid maze layout")?;
    let state = Arc::new(Mutex::new(ServerState {
        clients: HashMap::new(),
        session,
    }));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        log::info!("[server] static file root: {}", static_dir.to_string_lossy());
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        log::warn!("[server] static file root not found, serving websocket only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    log::info!("[server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")?;
    Ok(())
}

fn session_options(cli: &Cli) -> anyhow::Result<SessionOptions> {
    let mut options = SessionOptions {
        seed: cli.seed.unwrap_or_else(rand::random),
        preys: cli.preys.unwrap_or(TOTAL_PREYS),
        hunters: cli.hunters.unwrap_or(TOTAL_HUNTERS),
        cell_size: cli.cell_size.unwrap_or(CELL_SIZE),
        ..SessionOptions::default()
    };
    if let Some(raw) = cli.strategy.as_deref() {
        options.strategy = HunterStrategy::parse(raw)
            .with_context(|| format!("unknown hunter strategy: {raw}"))?;
    }
    if let Some(path) = cli.layout.as_ref() {
        options.layout = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read layout {}", path.display()))?;
    }
    Ok(options)
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("static")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        guard.clients.insert(
            client_id.clone(),
            ClientContext {
                tx: tx.clone(),
                intent: Intent::default(),
            },
        );
        let snapshot = guard.session.build_snapshot(false);
        let welcome = json!({
            "type": "welcome",
            "clientId": &client_id,
            "maze": guard.session.maze().to_init(),
            "snapshot": snapshot,
        });
        send_to_client(&mut guard, &client_id, &welcome);
        log::info!("[server] client connected: {client_id}");
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(state.clone(), &client_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
        guard.merge_intents();
    }
    log::info!("[server] client disconnected: {client_id}");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Input { intent } => {
            if let Some(client) = guard.clients.get_mut(client_id) {
                client.intent = intent;
            }
            guard.merge_intents();
            return;
        }
        ParsedClientMessage::Ping { t } => {
            let pong = json!({
                "type": "pong",
                "t": t,
                "serverTime": chrono::Utc::now().timestamp_millis(),
            });
            send_to_client(&mut guard, client_id, &pong);
            return;
        }
        ParsedClientMessage::Stats => {
            guard.session.log_status();
            return;
        }
        ParsedClientMessage::AssetsLoaded => guard.session.assets_loaded(),
        ParsedClientMessage::Next => guard.session.next_screen(),
        ParsedClientMessage::Pause => guard.session.toggle_pause(),
        ParsedClientMessage::Restart => guard.session.restart(),
        ParsedClientMessage::Victory => guard.session.force_victory(),
        ParsedClientMessage::Debug { enabled } => guard.session.set_debug_mode(enabled),
    }
    broadcast_state(&mut guard);
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_session(&mut guard);
        }
    });
}

fn tick_session(state: &mut ServerState) {
    let Some(token) = state.session.pending_frame() else {
        return;
    };
    if !state.session.run_frame(token) {
        return;
    }
    broadcast_state(state);
}

fn broadcast_state(state: &mut ServerState) {
    let snapshot = state.session.build_snapshot(true);
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
    );

    if state.session.screen().is_round_over() && state.session.pending_frame().is_none() {
        let summary = state.session.summary();
        broadcast(
            state,
            &json!({
                "type": "round_over",
                "summary": summary,
            }),
        );
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value) {
    let Some(client) = state.clients.get(client_id) else {
        return;
    };
    if client.tx.try_send(message.to_string()).is_err() {
        log::warn!("[server] outbound queue full for {client_id}, message dropped");
    }
}

fn broadcast(state: &mut ServerState, message: &Value) {
    let payload = message.to_string();
    for (client_id, client) in &state.clients {
        if client.tx.try_send(payload.clone()).is_err() {
            log::debug!("[server] dropped broadcast for {client_id}");
        }
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
