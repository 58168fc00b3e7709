//! Async driver for [`MeasurementSession`].
//!
//! One tokio task owns the session, the sample subscription, the poll timer
//! and the pending permission/submission futures. Everything is multiplexed
//! through a single `select!` loop, so the session is never touched from two
//! places at once and the resource handles live exactly as long as the state
//! that acquired them.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::machine::{MeasurementSession, SessionEffect, SessionSnapshot};
use super::status::StatusMessage;
use crate::clock::{TimeSource, TokioTimeSource};
use crate::config::AppConfig;
use crate::error::{log_session_error, SessionError, SubmissionError};
use crate::i18n::StatusCatalog;
use crate::sensor::{PermissionGate, PermissionOutcome, RawReading, SampleSubscription, SensorSource};
use crate::submission::Submitter;
use crate::telemetry::{SessionEvent, TelemetryCollector, TelemetryRecord};
use crate::units::{DisplayUnit, UnitConverter};

const COMMAND_BUFFER: usize = 32;

/// User actions forwarded to the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Stop,
    Zero,
    MeasureAgain,
    Submit,
    Shutdown,
}

/// Timing and presentation settings
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub threshold_ms: u64,
    pub poll_interval: Duration,
    pub unit: DisplayUnit,
    pub percent_grade_limit: i64,
    pub language: String,
}

impl RunnerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            threshold_ms: config.stability.threshold_ms,
            poll_interval: config.stability.poll_interval(),
            unit: config.display.unit,
            percent_grade_limit: config.display.percent_grade_limit,
            language: config.locale.language.clone(),
        }
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Sending side of a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    telemetry: Arc<TelemetryCollector>,
}

impl SessionHandle {
    /// Queue a command. Fails only once the runner has exited.
    pub async fn send(
        &self,
        command: SessionCommand,
    ) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.commands.send(command).await
    }

    pub async fn start(&self) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.send(SessionCommand::Start).await
    }

    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.send(SessionCommand::Stop).await
    }

    pub async fn zero(&self) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.send(SessionCommand::Zero).await
    }

    pub async fn measure_again(&self) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.send(SessionCommand::MeasureAgain).await
    }

    pub async fn submit(&self) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.send(SessionCommand::Submit).await
    }

    pub async fn shutdown(&self) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn events(&self) -> broadcast::Receiver<TelemetryRecord> {
        self.telemetry.subscribe()
    }

    pub fn telemetry(&self) -> &Arc<TelemetryCollector> {
        &self.telemetry
    }
}

/// Owns a session and its live resources
pub struct SessionRunner {
    session: MeasurementSession,
    settings: RunnerSettings,
    converter: UnitConverter,
    catalog: StatusCatalog,
    sensor: Arc<dyn SensorSource>,
    permission: Arc<dyn PermissionGate>,
    submitter: Arc<dyn Submitter>,
    clock: Arc<dyn TimeSource>,
    telemetry: Arc<TelemetryCollector>,
    subscription: Option<SampleSubscription>,
    poll: Option<Interval>,
    pending_permission: Option<BoxFuture<'static, PermissionOutcome>>,
    pending_submit: Option<BoxFuture<'static, Result<(), SubmissionError>>>,
}

impl SessionRunner {
    pub fn new(
        settings: RunnerSettings,
        sensor: Arc<dyn SensorSource>,
        permission: Arc<dyn PermissionGate>,
        submitter: Arc<dyn Submitter>,
    ) -> Self {
        Self {
            session: MeasurementSession::new(settings.threshold_ms),
            converter: UnitConverter::new(settings.percent_grade_limit),
            settings,
            catalog: StatusCatalog::builtin().clone(),
            sensor,
            permission,
            submitter,
            clock: Arc::new(TokioTimeSource::new()),
            telemetry: Arc::new(TelemetryCollector::default()),
            subscription: None,
            poll: None,
            pending_permission: None,
            pending_submit: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryCollector>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_catalog(mut self, catalog: StatusCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn telemetry(&self) -> &Arc<TelemetryCollector> {
        &self.telemetry
    }

    /// Run on a new task
    pub fn spawn(self) -> (SessionHandle, JoinHandle<SessionSnapshot>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = SessionHandle {
            commands: tx,
            telemetry: Arc::clone(&self.telemetry),
        };
        (handle, tokio::spawn(self.run(rx)))
    }

    /// Drive the session until `Shutdown` or until every handle is dropped
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) -> SessionSnapshot {
        tracing::info!(
            threshold_ms = self.settings.threshold_ms,
            poll_ms = self.settings.poll_interval.as_millis() as u64,
            "session runner started"
        );
        self.publish_status();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                reading = next_reading(&mut self.subscription) => self.handle_reading(reading),
                _ = next_tick(&mut self.poll) => self.handle_tick(),
                outcome = settle(&mut self.pending_permission) => {
                    self.pending_permission = None;
                    self.handle_permission(outcome);
                }
                result = settle(&mut self.pending_submit) => {
                    self.pending_submit = None;
                    self.handle_submission(result);
                }
            }
        }

        self.subscription = None;
        self.poll = None;
        let snapshot = self.session.snapshot();
        tracing::info!(state = ?snapshot.state, "session runner stopped");
        snapshot
    }

    fn handle_command(&mut self, command: SessionCommand) {
        tracing::debug!(?command, state = ?self.session.state(), "command");
        let status_before = self.session.status().clone();

        let result = match command {
            SessionCommand::Start => self
                .session
                .request_start(self.permission.requires_authorization()),
            SessionCommand::Stop => self.session.stop(),
            SessionCommand::Zero => self.session.zero(),
            SessionCommand::MeasureAgain => self.session.measure_again(),
            SessionCommand::Submit => self.session.begin_submit(),
            SessionCommand::Shutdown => Ok(Vec::new()),
        };

        match result {
            Ok(effects) => {
                if command == SessionCommand::Stop {
                    // A permission prompt answered after stop must not restart sampling
                    self.pending_permission = None;
                }
                self.apply(effects);
            }
            Err(err) => {
                log_session_error(&err, "SessionRunner::handle_command");
                self.publish(SessionEvent::error(&err));
                if self.session.status() != &status_before {
                    self.publish_status();
                }
            }
        }
    }

    fn handle_reading(&mut self, reading: Option<RawReading>) {
        let now = self.clock.now_ms();
        let reading = match reading {
            Some(reading) => reading,
            None => {
                tracing::warn!("sensor feed closed");
                self.subscription = None;
                RawReading::unavailable()
            }
        };

        let result = self.session.on_reading(reading, now);
        if reading.pitch.is_some() {
            if let Some(pitch) = self.session.current_pitch() {
                let display = self.converter.format(pitch.degrees(), self.settings.unit);
                self.publish(SessionEvent::Reading { pitch, display });
            }
        }
        self.apply_result(result, "SessionRunner::handle_reading");
    }

    fn handle_tick(&mut self) {
        let now = self.clock.now_ms();
        let result = self.session.on_poll_tick(now);
        self.apply_result(result, "SessionRunner::handle_tick");
    }

    fn handle_permission(&mut self, outcome: PermissionOutcome) {
        tracing::info!(?outcome, "permission resolved");
        let result = self.session.permission_resolved(outcome);
        self.apply_result(result, "SessionRunner::handle_permission");
    }

    fn handle_submission(&mut self, result: Result<(), SubmissionError>) {
        tracing::info!(ok = result.is_ok(), "submission resolved");
        let result = self.session.submission_resolved(result);
        self.apply_result(result, "SessionRunner::handle_submission");
    }

    fn apply_result(&mut self, result: Result<Vec<SessionEffect>, SessionError>, context: &str) {
        match result {
            Ok(effects) => self.apply(effects),
            Err(err) => {
                log_session_error(&err, context);
                self.publish(SessionEvent::error(&err));
            }
        }
    }

    fn apply(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::RequestPermission => {
                    self.pending_permission = Some(self.permission.request());
                }
                SessionEffect::StartSampling => {
                    // Old handle goes first so two feeds never overlap
                    self.subscription = None;
                    match self.sensor.subscribe() {
                        Ok(subscription) => self.subscription = Some(subscription),
                        Err(err) => {
                            log_session_error(&err, "SessionRunner::start_sampling");
                            self.publish(SessionEvent::error(&err));
                        }
                    }
                }
                SessionEffect::StopSampling => {
                    self.subscription = None;
                }
                SessionEffect::StartPolling => {
                    let period = self.settings.poll_interval;
                    let mut interval = time::interval_at(Instant::now() + period, period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    self.poll = Some(interval);
                }
                SessionEffect::CancelPolling => {
                    self.poll = None;
                }
                SessionEffect::Submit { value } => {
                    self.publish(SessionEvent::Submitting { value });
                    self.pending_submit = Some(self.submitter.submit(value));
                }
                SessionEffect::PromptConfirm { final_pitch } => {
                    tracing::info!(%final_pitch, "pitch locked");
                    self.publish(SessionEvent::ConfirmPrompt { final_pitch });
                }
                SessionEffect::Status(message) => self.publish_message(&message),
                SessionEffect::StateChanged { from, to } => {
                    self.publish(SessionEvent::StateChanged { from, to });
                }
                SessionEffect::Failure(err) => {
                    log_session_error(&err, "MeasurementSession");
                    self.publish(SessionEvent::error(&err));
                }
            }
        }
    }

    fn publish_status(&self) {
        self.publish_message(self.session.status());
    }

    fn publish_message(&self, message: &StatusMessage) {
        let text = self.catalog.render(message, &self.settings.language);
        self.publish(SessionEvent::Status {
            key: message.key,
            text,
        });
    }

    fn publish(&self, event: SessionEvent) {
        self.telemetry.publish(self.clock.now_ms(), event);
    }
}

async fn next_reading(subscription: &mut Option<SampleSubscription>) -> Option<RawReading> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => pending().await,
    }
}

async fn next_tick(poll: &mut Option<Interval>) -> Instant {
    match poll {
        Some(interval) => interval.tick().await,
        None => pending().await,
    }
}

async fn settle<T>(future: &mut Option<BoxFuture<'static, T>>) -> T {
    match future {
        Some(future) => future.await,
        None => pending().await,
    }
}
