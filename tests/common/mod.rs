//! Shared test utilities for streamdash integration tests.
//!
//! Provides an in-process fake watchdog backend (WebSocket state sync plus the
//! REST endpoints), a recording surface and polling helpers.

#![allow(dead_code)]

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use streamdash::config::DashConfig;
use streamdash::dashboard::{HistoryChart, Page, Surface};
use tokio::sync::broadcast;

// =============================================================================
// Fake backend
// =============================================================================

struct Inner {
    state: Mutex<Value>,
    patches: Mutex<Vec<Value>>,
    history: Mutex<Value>,
    history_delay: Mutex<Duration>,
    history_status: AtomicU16,
    history_calls: AtomicU32,
    locales: Mutex<HashMap<String, Value>>,
    locale_delays: Mutex<HashMap<String, Duration>>,
    locale_calls: AtomicU32,
    check_now_status: AtomicU16,
    check_now_calls: AtomicU32,
    ws_connections: AtomicU32,
    pushes: broadcast::Sender<String>,
    kicks: broadcast::Sender<()>,
}

/// In-process watchdog backend speaking the UI-sync contract.
///
/// Every socket gets the full state on connect. Each patch is merged into the
/// state and answered with a full push to all sockets.
#[derive(Clone)]
pub struct FakeBackend {
    inner: Arc<Inner>,
    url: String,
}

/// Default state pushed by the fake backend.
pub fn default_state() -> Value {
    json!({
        "youtube_is_live": false,
        "obs_is_streaming": false,
        "check_interval": 900,
        "live_mode": false,
        "live_mode_timeout": 3600,
        "obs_enabled": true,
        "youtube_enabled": true,
        "last_check_timestamp": null,
        "live_mode_end_timestamp": null
    })
}

impl FakeBackend {
    pub async fn start() -> Self {
        Self::start_with_state(default_state()).await
    }

    pub async fn start_with_state(state: Value) -> Self {
        let (pushes, _) = broadcast::channel(64);
        let (kicks, _) = broadcast::channel(8);
        let inner = Arc::new(Inner {
            state: Mutex::new(state),
            patches: Mutex::new(Vec::new()),
            history: Mutex::new(json!([])),
            history_delay: Mutex::new(Duration::ZERO),
            history_status: AtomicU16::new(200),
            history_calls: AtomicU32::new(0),
            locales: Mutex::new(HashMap::new()),
            locale_delays: Mutex::new(HashMap::new()),
            locale_calls: AtomicU32::new(0),
            check_now_status: AtomicU16::new(200),
            check_now_calls: AtomicU32::new(0),
            ws_connections: AtomicU32::new(0),
            pushes,
            kicks,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let backend = FakeBackend {
            inner,
            url: format!("http://{}", addr),
        };

        let app = Router::new()
            .route("/ws", get(ws_handler))
            .route("/api/check-now", post(check_now_handler))
            .route("/api/history", get(history_handler))
            .route("/locales/:file", get(locale_handler))
            .with_state(backend.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        backend
    }

    /// Base URL to put into `[server] base_url`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> Value {
        self.inner.state.lock().unwrap().clone()
    }

    /// Patches received so far, in arrival order.
    pub fn patches(&self) -> Vec<Value> {
        self.inner.patches.lock().unwrap().clone()
    }

    pub fn ws_connections(&self) -> u32 {
        self.inner.ws_connections.load(Ordering::SeqCst)
    }

    pub fn check_now_calls(&self) -> u32 {
        self.inner.check_now_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> u32 {
        self.inner.history_calls.load(Ordering::SeqCst)
    }

    pub fn locale_calls(&self) -> u32 {
        self.inner.locale_calls.load(Ordering::SeqCst)
    }

    pub fn set_history(&self, history: Value) {
        *self.inner.history.lock().unwrap() = history;
    }

    /// Delay history answers. The body is taken when the request arrives.
    pub fn set_history_delay(&self, delay: Duration) {
        *self.inner.history_delay.lock().unwrap() = delay;
    }

    pub fn fail_history(&self, status: u16) {
        self.inner.history_status.store(status, Ordering::SeqCst);
    }

    pub fn set_locale(&self, language: &str, table: Value) {
        self.inner
            .locales
            .lock()
            .unwrap()
            .insert(language.to_string(), table);
    }

    pub fn set_locale_delay(&self, language: &str, delay: Duration) {
        self.inner
            .locale_delays
            .lock()
            .unwrap()
            .insert(language.to_string(), delay);
    }

    pub fn fail_check_now(&self, status: u16) {
        self.inner.check_now_status.store(status, Ordering::SeqCst);
    }

    /// Merge `fields` into the state and push it to every socket.
    pub fn update_state(&self, fields: Value) {
        self.merge(&fields);
        self.push_current();
    }

    pub fn push_current(&self) {
        let _ = self.inner.pushes.send(self.state_frame());
    }

    /// Close every open socket from the server side.
    pub fn kick_all(&self) {
        let _ = self.inner.kicks.send(());
    }

    fn state_frame(&self) -> String {
        self.inner.state.lock().unwrap().to_string()
    }

    fn merge(&self, fields: &Value) {
        let mut state = self.inner.state.lock().unwrap();
        if let (Some(target), Some(source)) = (state.as_object_mut(), fields.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
            if target.get("youtube_enabled") == Some(&Value::Bool(false)) {
                target.insert("obs_enabled".to_string(), Value::Bool(false));
            }
        }
    }

    fn apply_patch(&self, text: &str) {
        let Ok(patch) = serde_json::from_str::<Value>(text) else {
            return;
        };
        self.inner.patches.lock().unwrap().push(patch.clone());
        self.merge(&patch);
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(backend): State<FakeBackend>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, backend))
}

async fn handle_socket(mut socket: WebSocket, backend: FakeBackend) {
    backend.inner.ws_connections.fetch_add(1, Ordering::SeqCst);
    let mut pushes = backend.inner.pushes.subscribe();
    let mut kicks = backend.inner.kicks.subscribe();

    if socket
        .send(Message::Text(backend.state_frame()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            _ = kicks.recv() => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            Ok(frame) = pushes.recv() => {
                if socket.send(Message::Text(frame)).await.is_err() {
                    return;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    backend.apply_patch(&text);
                    backend.push_current();
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn check_now_handler(State(backend): State<FakeBackend>) -> Response {
    backend.inner.check_now_calls.fetch_add(1, Ordering::SeqCst);
    let status = backend.inner.check_now_status.load(Ordering::SeqCst);
    if status != 200 {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (code, "check failed").into_response();
    }
    backend.update_state(json!({ "last_check_timestamp": chrono::Utc::now().to_rfc3339() }));
    Json(json!({ "status": "ok" })).into_response()
}

async fn history_handler(State(backend): State<FakeBackend>) -> Response {
    backend.inner.history_calls.fetch_add(1, Ordering::SeqCst);
    let status = backend.inner.history_status.load(Ordering::SeqCst);
    let body = backend.inner.history.lock().unwrap().clone();
    let delay = *backend.inner.history_delay.lock().unwrap();

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if status != 200 {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (code, "history unavailable").into_response();
    }
    Json(body).into_response()
}

async fn locale_handler(
    State(backend): State<FakeBackend>,
    Path(file): Path<String>,
) -> Response {
    backend.inner.locale_calls.fetch_add(1, Ordering::SeqCst);
    let language = file.trim_end_matches(".json").to_string();
    let table = backend.inner.locales.lock().unwrap().get(&language).cloned();
    let delay = backend
        .inner
        .locale_delays
        .lock()
        .unwrap()
        .get(&language)
        .copied();

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    match table {
        Some(table) => Json(table).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Base URL of a port with nothing listening on it.
pub async fn dead_backend_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// =============================================================================
// Session helpers
// =============================================================================

/// Config pointing at `backend`, with the language state kept in `state_dir`.
pub fn test_config(backend: &FakeBackend, state_dir: &FsPath) -> DashConfig {
    config_for_url(backend.url(), state_dir)
}

/// Fast-ticking config for an arbitrary backend URL.
pub fn config_for_url(url: &str, state_dir: &FsPath) -> DashConfig {
    let mut config = DashConfig::default();
    config.server.base_url = url.to_string();
    config.server.request_timeout_seconds = 5;
    config.connection.connect_timeout_seconds = 5;
    config.countdown.tick_millis = 50;
    config.locale.state_file = state_dir.join("streamdash-state.json");
    config
}

/// One painted frame.
#[derive(Clone)]
pub struct Frame {
    pub page: Page,
    pub chart: Option<HistoryChart>,
}

/// Surface that keeps every frame for inspection while the session runs.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl RecordingSurface {
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Frame> {
        self.frames.lock().unwrap().last().cloned()
    }

    /// Whether any frame so far satisfies `check`.
    pub fn any(&self, check: impl Fn(&Frame) -> bool) -> bool {
        self.frames.lock().unwrap().iter().any(check)
    }
}

impl Surface for RecordingSurface {
    fn paint(&mut self, page: &Page, chart: Option<&HistoryChart>) {
        self.frames.lock().unwrap().push(Frame {
            page: page.clone(),
            chart: chart.cloned(),
        });
    }
}

/// Poll `condition` every 10ms until it holds; panic after 5s.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("Timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
