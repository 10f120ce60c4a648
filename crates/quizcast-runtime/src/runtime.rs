//! Main runtime orchestration.
//!
//! One loop owns the round context. Source events (tagged with the session
//! generation that produced them), control messages and connection results
//! all arrive on a single ordered intake queue and are handled to
//! completion, one at a time. Reconnect backoff is a timer branch of the
//! same loop, so control messages stay responsive while waiting.
//!
//! ```text
//!  LiveSource ──events──▶ ┌──────────┐          ┌──────────┐
//!  stdin ──control──────▶ │  intake  │ ──loop─▶ │  Router  │ ──▶ Notifier
//!  connect tasks ───────▶ └──────────┘    │     └──────────┘
//!                                         └──▶ Supervisor (reconnect timer)
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quizcast_adapter_tiktok::TikTokAdapter;
//! use quizcast_runtime::QuizRuntime;
//!
//! let mut runtime = QuizRuntime::builder().profile("production").build()?;
//! runtime.register_source::<TikTokAdapter>()?;
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use quizcast_core::{
    AnswerMatcher, BoxedNotifier, BoxedSource, ChatEvent, ConfigurableSource, ControlMessage,
    FanoutNotifier, Notification, SessionHandle, SourceResult, SourceSession,
    clean_target, notify_best_effort,
};
use quizcast_transport::ControlReader;

use crate::config::{ConfigLoader, ConfigResult, NotifierConfig, QuizcastConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::router::Router;
use crate::state::StateStore;
use crate::status::StatusHandle;
use crate::supervisor::{Decision, ReconnectPolicy, Supervisor};

const INTAKE_CAPACITY: usize = 1024;

/// Reason reported when the upstream drops the session.
const UPSTREAM_DISCONNECT: &str = "disconnect_event";

/// Reason reported for operator disconnects.
const MANUAL_DISCONNECT: &str = "manual";

// =============================================================================
// Intake
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptKind {
    /// The connection requested at startup.
    Startup,
    /// An operator `connect`.
    Operator,
    /// A supervisor retry.
    Reconnect,
}

enum Intake {
    Control(ControlMessage),
    Event { generation: u64, event: ChatEvent },
    StreamEnded { generation: u64 },
    Attempt {
        generation: u64,
        kind: AttemptKind,
        result: SourceResult<SourceSession>,
    },
}

/// Sends control messages into a running [`QuizRuntime`].
#[derive(Clone)]
pub struct ControlSender {
    tx: mpsc::Sender<Intake>,
}

impl ControlSender {
    /// Queues `message`. Returns false once the runtime has stopped.
    pub async fn send(&self, message: ControlMessage) -> bool {
        self.tx.send(Intake::Control(message)).await.is_ok()
    }
}

// =============================================================================
// QuizRuntime
// =============================================================================

/// The quizcast runtime: attaches to a live source, routes its events and
/// delivers notifications.
pub struct QuizRuntime {
    config: QuizcastConfig,
    source: Option<BoxedSource>,
    notifiers: Vec<BoxedNotifier>,
    intake_tx: mpsc::Sender<Intake>,
    intake_rx: mpsc::Receiver<Intake>,
    status: StatusHandle,
}

impl QuizRuntime {
    /// Loads configuration from the default locations.
    pub fn load_config() -> ConfigResult<Self> {
        Self::builder().build()
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and initializes logging.
    pub fn from_config(config: &QuizcastConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );

        let (intake_tx, intake_rx) = mpsc::channel(INTAKE_CAPACITY);
        Self {
            config: config.clone(),
            source: None,
            notifiers: Vec::new(),
            intake_tx,
            intake_rx,
            status: StatusHandle::default(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QuizcastConfig {
        &self.config
    }

    /// Registers a source built from its `[adapters.<name>]` section.
    ///
    /// Falls back to the source's default configuration when the section
    /// is absent.
    pub fn register_source<S>(&mut self) -> RuntimeResult<()>
    where
        S: ConfigurableSource + 'static,
    {
        let source: S = build_source(&self.config)?;
        self.source = Some(Arc::new(source));
        info!(adapter = S::name(), "Registered source");
        Ok(())
    }

    /// Uses an already-built source.
    pub fn with_source(mut self, source: BoxedSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Adds a notification sink. When none are added, sinks are built from
    /// `[notifier]`.
    pub fn with_notifier(mut self, notifier: BoxedNotifier) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Returns a sender for control messages.
    pub fn control_sender(&self) -> ControlSender {
        ControlSender {
            tx: self.intake_tx.clone(),
        }
    }

    /// Returns the shared status handle.
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(self) -> RuntimeResult<()> {
        info!("quizcast is running. Press Ctrl+C to stop.");
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let cancel = CancellationToken::new();
        let driver = self.into_driver(cancel.clone()).await?;
        let result = driver.run(shutdown).await;
        cancel.cancel();

        info!("Runtime stopped");
        result
    }

    async fn into_driver(self, cancel: CancellationToken) -> RuntimeResult<Driver> {
        let source = self.source.ok_or(RuntimeError::NoSource)?;

        let mut notifiers = self.notifiers;
        if notifiers.is_empty() {
            notifiers = build_notifiers(&self.config.notifier)?;
        }
        if notifiers.is_empty() {
            warn!("No notification sinks enabled");
        }
        let notifier: BoxedNotifier = Arc::new(FanoutNotifier::new(
            notifiers,
            self.config.notifier.timeout(),
        ));

        let state = StateStore::new(&self.config.state.path);
        let persisted = match state.load().await {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable state file");
                Default::default()
            }
        };

        let mut supervisor = Supervisor::new(ReconnectPolicy::from(&self.config.reconnect));
        let configured = self
            .config
            .session
            .target
            .as_deref()
            .map(clean_target)
            .filter(|t| !t.is_empty());
        let target = match configured {
            Some(target) => {
                if persisted.streamer_username.as_deref() != Some(target.as_str())
                    && let Err(e) = state.remember_target(&target).await
                {
                    warn!(error = %e, "Failed to save session state");
                }
                Some(target)
            }
            None => persisted.streamer_username.clone(),
        };
        if let Some(target) = &target {
            supervisor.start(target.clone());
        }
        self.status.update(|s| s.streamer_username.clone_from(&target));

        if self.config.control.stdin {
            spawn_stdin_control(self.intake_tx.clone(), cancel);
        }

        Ok(Driver {
            source,
            notifier,
            router: Router::new(AnswerMatcher::new(self.config.matching.clone())),
            supervisor,
            state,
            status: self.status,
            intake_tx: self.intake_tx,
            intake_rx: self.intake_rx,
            generation: 0,
            session: None,
            reconnect_at: None,
            auto_start: self.config.session.auto_start,
            exit_on_connect_failure: self.config.session.exit_on_connect_failure,
        })
    }
}

/// Builds a source from its `[adapters.<name>]` section, or from its
/// default configuration when the section is absent.
pub fn build_source<S>(config: &QuizcastConfig) -> RuntimeResult<S>
where
    S: ConfigurableSource,
{
    let name = S::name();

    let source_config: S::Config = if let Some(value) = config.adapters.get(name) {
        value.clone().deserialize().map_err(|e| {
            RuntimeError::AdapterConfigDeserialize(format!(
                "Failed to deserialize config for adapter '{name}': {e}"
            ))
        })?
    } else {
        warn!(
            adapter = name,
            "No configuration found for adapter, using default"
        );
        Default::default()
    };

    Ok(S::from_config(source_config))
}

/// Builds the sinks enabled in `[notifier]`.
pub fn build_notifiers(config: &NotifierConfig) -> RuntimeResult<Vec<BoxedNotifier>> {
    #[allow(unused_mut)]
    let mut sinks: Vec<BoxedNotifier> = Vec::new();

    #[cfg(feature = "http-client")]
    if config.http.enabled {
        use quizcast_transport::HttpNotifier;
        sinks.push(Arc::new(HttpNotifier::new(
            config.http.url.clone(),
            config.timeout(),
        )?));
        debug!(url = %config.http.url, "Registered HTTP sink");
    }
    #[cfg(not(feature = "http-client"))]
    if config.http.enabled {
        warn!("HTTP sink enabled but the http-client feature is off");
    }

    if config.file.enabled {
        use quizcast_transport::FileNotifier;
        sinks.push(Arc::new(FileNotifier::new(config.file.path.clone())));
        debug!(path = %config.file.path.display(), "Registered file sink");
    }

    Ok(sinks)
}

fn spawn_stdin_control(tx: mpsc::Sender<Intake>, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut reader = ControlReader::stdin();
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break,
                message = reader.next_message() => message,
            };
            let Some(message) = message else {
                debug!("Control input closed");
                break;
            };
            if tx.send(Intake::Control(message)).await.is_err() {
                break;
            }
        }
    });
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                let _ = signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down");
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down");
    }
}

// =============================================================================
// Driver
// =============================================================================

struct ActiveSession {
    target: String,
    handle: SessionHandle,
}

/// The single-writer loop state.
struct Driver {
    source: BoxedSource,
    notifier: BoxedNotifier,
    router: Router,
    supervisor: Supervisor,
    state: StateStore,
    status: StatusHandle,
    intake_tx: mpsc::Sender<Intake>,
    intake_rx: mpsc::Receiver<Intake>,
    /// Bumped whenever the current session or attempt is abandoned.
    generation: u64,
    session: Option<ActiveSession>,
    reconnect_at: Option<Instant>,
    auto_start: bool,
    exit_on_connect_failure: bool,
}

impl Driver {
    async fn run<F>(mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.auto_start {
            if self.supervisor.target().is_some() {
                self.connect(AttemptKind::Startup);
            } else {
                warn!("Auto-start requested but no target is known");
            }
        }

        let result = loop {
            let reconnect_at = self.reconnect_at;
            tokio::select! {
                _ = &mut shutdown => break Ok(()),

                item = self.intake_rx.recv() => {
                    let Some(item) = item else { break Ok(()) };
                    if let Err(e) = self.handle(item).await {
                        break Err(e);
                    }
                }

                _ = sleep_until(reconnect_at), if reconnect_at.is_some() => {
                    self.reconnect_at = None;
                    self.connect(AttemptKind::Reconnect);
                }
            }
        };

        self.close_session();
        result
    }

    async fn handle(&mut self, item: Intake) -> RuntimeResult<()> {
        match item {
            Intake::Control(message) => self.on_control(message).await,
            Intake::Event { generation, event } => {
                if generation != self.generation {
                    trace!(
                        generation,
                        current = self.generation,
                        event = event.event_name(),
                        "Dropping event from stale session"
                    );
                    return Ok(());
                }
                self.on_event(event).await;
            }
            Intake::StreamEnded { generation } => {
                if generation == self.generation && self.session.is_some() {
                    self.on_upstream_disconnect("event stream ended").await;
                }
            }
            Intake::Attempt {
                generation,
                kind,
                result,
            } => return self.on_attempt(generation, kind, result).await,
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Connection management
    // -------------------------------------------------------------------------

    /// Abandons the current session and starts a connection attempt.
    fn connect(&mut self, kind: AttemptKind) {
        let Some(target) = self.supervisor.target().map(str::to_string) else {
            warn!("No target to connect to");
            return;
        };

        self.close_session();
        self.generation += 1;
        self.reconnect_at = None;

        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let tx = self.intake_tx.clone();
        debug!(target = %target, generation, ?kind, "Connection attempt");
        tokio::spawn(async move {
            let result = source.connect(&target).await;
            let _ = tx
                .send(Intake::Attempt {
                    generation,
                    kind,
                    result,
                })
                .await;
        });
    }

    async fn on_attempt(
        &mut self,
        generation: u64,
        kind: AttemptKind,
        result: SourceResult<SourceSession>,
    ) -> RuntimeResult<()> {
        if generation != self.generation {
            if let Ok(session) = result {
                debug!(target = %session.target, "Closing session from stale attempt");
                session.handle.close();
            }
            return Ok(());
        }

        match result {
            Ok(session) => {
                self.supervisor.on_connected();
                self.status.update(|s| s.reconnect_attempts = 0);
                self.attach(session);
                Ok(())
            }
            Err(e) => {
                let target = self.supervisor.target().unwrap_or_default().to_string();
                self.status.update(|s| {
                    s.connected = false;
                    s.room_id = None;
                });
                match kind {
                    AttemptKind::Startup | AttemptKind::Operator if e.is_user_correctable() => {
                        error!(target = %target, error = %e, "Connection failed");
                        self.supervisor.stop();
                        if kind == AttemptKind::Startup && self.exit_on_connect_failure {
                            return Err(RuntimeError::Source(e));
                        }
                    }
                    AttemptKind::Startup | AttemptKind::Operator => {
                        warn!(target = %target, error = %e, "Connection failed, retrying");
                        let decision = self.supervisor.on_attempt_failed(&e);
                        self.apply(decision, &e.to_string()).await;
                    }
                    AttemptKind::Reconnect => {
                        warn!(target = %target, error = %e, "Reconnect attempt failed");
                        let decision = self.supervisor.on_attempt_failed(&e);
                        self.apply(decision, &e.to_string()).await;
                    }
                }
                Ok(())
            }
        }
    }

    /// Forwards a live session's events into the intake queue.
    fn attach(&mut self, session: SourceSession) {
        let SourceSession {
            target,
            room_id,
            mut events,
            handle,
        } = session;
        info!(target = %target, room_id = ?room_id, "Session attached");

        let generation = self.generation;
        let tx = self.intake_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if tx.send(Intake::Event { generation, event }).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(Intake::StreamEnded { generation }).await;
        });

        self.session = Some(ActiveSession { target, handle });
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(target = %session.target, "Closing session");
            session.handle.close();
        }
    }

    async fn apply(&mut self, decision: Decision, reason: &str) {
        match decision {
            Decision::Retry { attempt, delay } => {
                info!(attempt, delay_secs = delay.as_secs(), "Scheduling reconnect");
                self.reconnect_at = Some(Instant::now() + delay);
                self.status.update(|s| s.reconnect_attempts = attempt);
            }
            Decision::GiveUp { attempts } => {
                let target = self.supervisor.target().unwrap_or_default().to_string();
                error!(target = %target, attempts, reason, "Giving up on reconnecting");
                self.reconnect_at = None;
                self.status.update(|s| s.reconnect_attempts = attempts);
                self.notify(Notification::reconnect_failed(&target, attempts, reason))
                    .await;
            }
            Decision::Stop => {}
        }
    }

    async fn on_upstream_disconnect(&mut self, reason: &str) {
        info!(reason, "Session disconnected");
        self.close_session();
        self.generation += 1;
        self.status.update(|s| {
            s.connected = false;
            s.room_id = None;
        });
        self.notify(Notification::disconnected(UPSTREAM_DISCONNECT))
            .await;

        let decision = self.supervisor.on_disconnected();
        self.apply(decision, reason).await;
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    async fn on_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Connected { target, room_id } => {
                self.status.update(|s| {
                    s.connected = true;
                    s.streamer_username = Some(target.clone());
                    s.room_id.clone_from(&room_id);
                });
                self.notify(Notification::connected(&target, room_id.as_deref()))
                    .await;
            }
            ChatEvent::Disconnected { reason } => {
                self.on_upstream_disconnect(&reason).await;
            }
            ChatEvent::LiveEnded => {
                info!("Broadcast ended");
                self.close_session();
                self.generation += 1;
                self.supervisor.stop();
                self.status.update(|s| {
                    s.connected = false;
                    s.room_id = None;
                });
                self.notify(Notification::live_ended()).await;
            }
            payload => {
                if let Some(notification) = self.router.route(&payload) {
                    self.notify(notification).await;
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Control
    // -------------------------------------------------------------------------

    async fn on_control(&mut self, message: ControlMessage) {
        debug!(action = message.action(), "Control message");
        match message {
            ControlMessage::UpdateRound(update) => {
                self.router.replace_round(update.into());
                let round = self.router.round();
                let (active, phrase) = (round.active, round.phrase.clone());
                self.status.update(|s| {
                    s.game_active = active;
                    s.current_phrase = phrase;
                });
            }
            ControlMessage::Connect { username } => {
                let target = clean_target(&username);
                if target.is_empty() {
                    warn!(username = %username, "Ignoring connect without a target");
                    return;
                }
                if let Err(e) = self.state.remember_target(&target).await {
                    warn!(error = %e, "Failed to save session state");
                }
                self.supervisor.start(target.clone());
                self.status.update(|s| {
                    s.streamer_username = Some(target);
                    s.connected = false;
                    s.room_id = None;
                    s.reconnect_attempts = 0;
                });
                self.connect(AttemptKind::Operator);
            }
            ControlMessage::Disconnect => {
                info!("Disconnect requested");
                self.close_session();
                self.generation += 1;
                self.reconnect_at = None;
                self.supervisor.stop();
                self.status.update(|s| {
                    s.connected = false;
                    s.room_id = None;
                    s.reconnect_attempts = 0;
                });
                self.notify(Notification::disconnected(MANUAL_DISCONNECT))
                    .await;
            }
            ControlMessage::GetStatus => {
                let status = self.status.snapshot().to_notification();
                self.notify(status).await;
            }
        }
    }

    async fn notify(&self, notification: Notification) {
        notify_best_effort(self.notifier.as_ref(), &notification).await;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`QuizRuntime`] with custom configuration.
///
/// ```rust,ignore
/// let runtime = QuizRuntime::builder()
///     .config_file("config/quizcast.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: QuizcastConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> ConfigResult<QuizRuntime> {
        let config = self.config_loader.load()?;
        Ok(QuizRuntime::from_config(&config))
    }

    /// Loads the configuration without building a runtime, so callers can
    /// apply command-line overrides first.
    pub fn load(self) -> ConfigResult<QuizcastConfig> {
        self.config_loader.load()
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
