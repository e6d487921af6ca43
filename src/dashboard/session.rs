//! Dashboard session: the single owner of socket, timers, chart and page
//!
//! Everything happens on one cooperative loop. Socket frames, timer ticks,
//! user actions and finished REST calls all arrive as events; REST calls are
//! spawned and post their result back instead of blocking the loop.

use super::chart::{ChartData, HistoryChart};
use super::countdown::{effective_interval, CountdownEngine, TimerKind, TimerTick};
use super::editor::{ConfigEditor, Control};
use super::page::Page;
use super::types::{HistoryEntry, ServerState};
use crate::client::{
    ApiClient, ApiError, ConnectionEvent, ConnectionManager, Connector, RetryPolicy,
};
use crate::config::{DashConfig, ExpiryPolicy};
use crate::i18n::{LanguageStore, Translations};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Something that can show the page.
pub trait Surface {
    fn paint(&mut self, page: &Page, chart: Option<&HistoryChart>);
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Edit(Control),
    CheckNow,
    SetLanguage(String),
    RefreshHistory,
    Quit,
}

/// Completion of a spawned REST call. History and language results carry
/// the number of the request that produced them; only the latest request of
/// each kind is applied.
#[derive(Debug)]
pub enum TaskResult {
    History {
        request: u64,
        result: Result<Vec<HistoryEntry>, ApiError>,
    },
    Language {
        request: u64,
        language: String,
        result: Result<Translations, ApiError>,
    },
    CheckNow(Result<(), ApiError>),
}

/// Input to [`DashboardSession::handle`].
#[derive(Debug)]
pub enum SessionEvent {
    Connection(ConnectionEvent),
    Tick(TimerTick),
    User(UserAction),
    Task(TaskResult),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Counters reported when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub pushes: u64,
    pub edits_sent: u64,
    pub edits_failed: u64,
    pub history_fetches: u64,
}

/// Receiving ends of the session's internal channels.
struct SessionChannels {
    connection: mpsc::UnboundedReceiver<ConnectionEvent>,
    ticks: mpsc::UnboundedReceiver<TimerTick>,
    results: mpsc::UnboundedReceiver<TaskResult>,
}

pub struct DashboardSession<C: Connector, S: Surface> {
    id: Uuid,
    api: ApiClient,
    connection: ConnectionManager<C>,
    countdown: CountdownEngine,
    editor: ConfigEditor,
    translations: Translations,
    language_store: LanguageStore,
    default_language: String,
    live_mode_interval: u64,
    on_expiry: ExpiryPolicy,
    page: Page,
    state: Option<ServerState>,
    chart: Option<HistoryChart>,
    surface: S,
    results: mpsc::UnboundedSender<TaskResult>,
    history_request: u64,
    language_request: u64,
    channels: Option<SessionChannels>,
    cancel: CancellationToken,
    clock: fn() -> DateTime<Utc>,
    stats: SessionStats,
}

impl<C: Connector, S: Surface> DashboardSession<C, S> {
    pub fn new(config: &DashConfig, api: ApiClient, connector: C, surface: S) -> Self {
        let (conn_tx, conn_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        Self {
            id: Uuid::new_v4(),
            api,
            connection: ConnectionManager::new(
                connector,
                RetryPolicy::from(&config.connection),
                conn_tx,
            ),
            countdown: CountdownEngine::new(
                Duration::from_millis(config.countdown.tick_millis),
                tick_tx,
            ),
            editor: ConfigEditor::new(),
            translations: Translations::empty(&config.locale.default_language),
            language_store: LanguageStore::new(&config.locale.state_file),
            default_language: config.locale.default_language.clone(),
            live_mode_interval: config.countdown.live_mode_interval_seconds,
            on_expiry: config.countdown.on_expiry,
            page: Page::default(),
            state: None,
            chart: None,
            surface,
            results: result_tx,
            history_request: 0,
            language_request: 0,
            channels: Some(SessionChannels {
                connection: conn_rx,
                ticks: tick_rx,
                results: result_rx,
            }),
            cancel: CancellationToken::new(),
            clock: Utc::now,
            stats: SessionStats::default(),
        }
    }

    /// Replace the wall clock (for testing).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn state(&self) -> Option<&ServerState> {
        self.state.as_ref()
    }

    pub fn chart(&self) -> Option<&HistoryChart> {
        self.chart.as_ref()
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    pub fn active_timers(&self) -> usize {
        self.countdown.active_timers()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Token that ends [`run`](Self::run) when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Session start: language, socket, first history fetch.
    pub async fn start(&mut self) {
        let language = self.language_store.resolve(&self.default_language);
        tracing::info!(session_id = %self.id, language = %language, "Starting dashboard session");

        self.spawn_language_load(language);
        if let Err(e) = self.connection.open().await {
            tracing::warn!(error = %e, "Dashboard starts disconnected");
        }
        self.page.connection = self.connection.state();
        self.spawn_history_fetch();
        self.paint();
    }

    /// Run until the user quits, the action stream ends or the token is cancelled.
    pub async fn run(self, actions: mpsc::UnboundedReceiver<UserAction>) -> SessionStats {
        let span = tracing::info_span!("session", id = %self.id);
        self.event_loop(actions).instrument(span).await
    }

    async fn event_loop(mut self, mut actions: mpsc::UnboundedReceiver<UserAction>) -> SessionStats {
        let Some(mut channels) = self.channels.take() else {
            tracing::error!("Session channels already taken");
            return self.stats;
        };

        self.start().await;

        loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => SessionEvent::Shutdown,
                Some(event) = channels.connection.recv() => SessionEvent::Connection(event),
                Some(tick) = channels.ticks.recv() => SessionEvent::Tick(tick),
                Some(result) = channels.results.recv() => SessionEvent::Task(result),
                action = actions.recv() => match action {
                    Some(action) => SessionEvent::User(action),
                    None => SessionEvent::Shutdown,
                },
            };

            if self.handle(event).await == Flow::Stop {
                break;
            }
        }

        self.teardown();
        self.stats
    }

    /// Process one event.
    pub async fn handle(&mut self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Connection(ConnectionEvent::Frame { link_id, text }) => {
                if !self.connection.is_current(link_id) {
                    tracing::debug!(link_id, "Dropping frame from stale link");
                    return Flow::Continue;
                }
                match ServerState::from_frame(&text) {
                    Ok(state) => self.on_push(state),
                    Err(e) => tracing::warn!(error = %e, "Ignoring unparseable state push"),
                }
            }
            SessionEvent::Connection(ConnectionEvent::Closed { link_id, reason }) => {
                self.connection.handle_closed(link_id, reason.as_deref());
                self.page.connection = self.connection.state();
                self.paint();
            }
            SessionEvent::Tick(tick) => self.on_tick(tick).await,
            SessionEvent::User(action) => return self.on_action(action).await,
            SessionEvent::Task(result) => self.on_task_result(result),
            SessionEvent::Shutdown => return Flow::Stop,
        }
        Flow::Continue
    }

    fn on_push(&mut self, state: ServerState) {
        self.stats.pushes += 1;
        tracing::debug!(
            youtube = ?state.youtube_is_live,
            obs = ?state.obs_is_streaming,
            live_mode = state.live_mode,
            "State push"
        );

        self.page.apply_state(&state, &self.translations);
        self.editor.sync(&state);
        self.page.saving = self.editor.is_saving();

        let effective =
            effective_interval(state.check_interval, state.live_mode, self.live_mode_interval);
        self.page.set_effective_interval(effective, &self.translations);

        self.countdown
            .restart_next_check(state.last_check_timestamp, effective);
        if state.last_check_timestamp.is_none() {
            self.page.last_check = "-".to_string();
            self.page.next_check = "--:--".to_string();
        }
        let visible = self
            .countdown
            .restart_live_mode(state.live_mode, state.live_mode_end_timestamp);
        if !visible {
            self.page.live_mode_countdown = None;
        }

        self.state = Some(state);
        self.page.connection = self.connection.state();
        self.refresh_countdowns();
        self.spawn_history_fetch();
        self.paint();
    }

    /// Redraw the countdown texts outside a tick. A wrap seen here stays
    /// pending so the next next-check tick still acts on it.
    fn refresh_countdowns(&mut self) {
        let now = (self.clock)();
        if let Some(snapshot) = self.countdown.peek_next_check(now) {
            self.page
                .set_next_check(snapshot.elapsed, snapshot.remaining, &self.translations);
        }
        if let Some(remaining) = self.countdown.poll_live_mode(now) {
            self.page
                .set_live_mode_countdown(Some(remaining), &self.translations);
        }
    }

    async fn on_tick(&mut self, tick: TimerTick) {
        if !self.countdown.is_current(&tick) {
            return;
        }
        let now = (self.clock)();
        match tick.kind {
            TimerKind::NextCheck => {
                if let Some(snapshot) = self.countdown.poll_next_check(now) {
                    self.page
                        .set_next_check(snapshot.elapsed, snapshot.remaining, &self.translations);
                    if snapshot.expired && self.on_expiry == ExpiryPolicy::Resync {
                        self.resync().await;
                    }
                }
            }
            TimerKind::LiveMode => {
                if let Some(remaining) = self.countdown.poll_live_mode(now) {
                    self.page
                        .set_live_mode_countdown(Some(remaining), &self.translations);
                }
            }
        }
        self.paint();
    }

    /// Countdown ran out under the resync policy: reload history and reopen
    /// the socket so the backend pushes its current state.
    async fn resync(&mut self) {
        tracing::info!("Next-check countdown expired, resyncing");
        self.spawn_history_fetch();
        if let Err(e) = self.connection.reopen().await {
            tracing::warn!(error = %e, "Resync could not reopen the socket");
        }
        self.page.connection = self.connection.state();
    }

    async fn on_action(&mut self, action: UserAction) -> Flow {
        match action {
            UserAction::Edit(control) => self.apply_edit(control).await,
            UserAction::CheckNow => {
                self.editor.mark_saving();
                self.page.saving = true;
                self.paint();
                let api = self.api.clone();
                let results = self.results.clone();
                tokio::spawn(async move {
                    let result = api.check_now().await;
                    let _ = results.send(TaskResult::CheckNow(result));
                });
            }
            UserAction::SetLanguage(language) => self.spawn_language_load(language),
            UserAction::RefreshHistory => self.spawn_history_fetch(),
            UserAction::Quit => return Flow::Stop,
        }
        Flow::Continue
    }

    async fn apply_edit(&mut self, control: Control) {
        let edits = match self.editor.change(control) {
            Ok(edits) => edits,
            Err(e) => {
                tracing::warn!(error = %e, "Edit rejected");
                return;
            }
        };

        self.page.controls = self.editor.controls().clone();
        self.page.saving = true;
        self.paint();

        for edit in &edits {
            match self.connection.send(edit).await {
                Ok(outcome) => {
                    self.stats.edits_sent += 1;
                    tracing::debug!(?outcome, fields = ?edit.fields(), "Edit delivered");
                }
                Err(e) => {
                    self.stats.edits_failed += 1;
                    tracing::error!(error = %e, fields = ?edit.fields(), "Could not deliver edit");
                    self.editor.clear_saving();
                    self.page.saving = false;
                    break;
                }
            }
        }

        self.page.connection = self.connection.state();
        self.paint();
    }

    fn on_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::History { request, .. } if request != self.history_request => {
                tracing::debug!(request, latest = self.history_request, "Dropping superseded history");
            }
            TaskResult::History { result: Ok(entries), .. } => {
                let data = ChartData::from_history(&entries);
                match self.chart.as_mut() {
                    Some(chart) => chart.update(data),
                    None => self.chart = Some(HistoryChart::new(data, &self.translations)),
                }
                self.paint();
            }
            TaskResult::History { result: Err(e), .. } => {
                tracing::warn!(error = %e, "History fetch failed, keeping last chart");
            }
            TaskResult::Language {
                request, language, ..
            } if request != self.language_request => {
                tracing::debug!(language = %language, request, "Dropping superseded language load");
            }
            TaskResult::Language {
                language, result, ..
            } => match result {
                Ok(translations) => self.apply_language(&language, translations),
                Err(e) => {
                    tracing::error!(language = %language, error = %e, "Could not load language");
                }
            },
            TaskResult::CheckNow(Ok(())) => {
                tracing::info!("Manual check triggered");
                self.spawn_history_fetch();
            }
            TaskResult::CheckNow(Err(e)) => {
                tracing::error!(error = %e, "Manual check failed");
                self.editor.clear_saving();
                self.page.saving = false;
                self.paint();
            }
        }
    }

    fn apply_language(&mut self, language: &str, translations: Translations) {
        tracing::info!(language, entries = translations.len(), "Language loaded");
        self.translations = translations;

        self.page.translate_labels(&self.translations);
        self.page.retranslate_statuses(&self.translations);
        if let Some(state) = &self.state {
            let effective =
                effective_interval(state.check_interval, state.live_mode, self.live_mode_interval);
            self.page.set_effective_interval(effective, &self.translations);
        }
        self.refresh_countdowns();
        if let Some(chart) = self.chart.as_mut() {
            chart.relabel(&self.translations);
        }

        if let Err(e) = self.language_store.save(language) {
            tracing::warn!(error = %e, "Could not persist language");
        }
        self.paint();
    }

    fn spawn_history_fetch(&mut self) {
        self.stats.history_fetches += 1;
        self.history_request += 1;
        let request = self.history_request;
        let api = self.api.clone();
        let results = self.results.clone();
        tokio::spawn(async move {
            let result = api.history().await;
            let _ = results.send(TaskResult::History { request, result });
        });
    }

    fn spawn_language_load(&mut self, language: String) {
        self.language_request += 1;
        let request = self.language_request;
        let api = self.api.clone();
        let results = self.results.clone();
        tokio::spawn(async move {
            let result = api.locale(&language).await;
            let _ = results.send(TaskResult::Language {
                request,
                language,
                result,
            });
        });
    }

    fn paint(&mut self) {
        self.surface.paint(&self.page, self.chart.as_ref());
    }

    /// Stop timers and close the socket.
    pub fn teardown(&mut self) {
        tracing::info!(session_id = %self.id, "Tearing down dashboard session");
        self.countdown.shutdown();
        self.connection.shutdown();
        self.page.connection = self.connection.state();
        self.cancel.cancel();
    }
}
