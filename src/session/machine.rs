// MeasurementSession - pure transition core of the roof-pitch capture
//
// No I/O happens here. Every operation takes the current inputs (readings,
// timestamps, permission and submission outcomes) and returns the effects the
// driver has to carry out, in order. Teardown effects always precede the
// acquisition effects that replace them, so a driver applying them in order
// never holds two subscriptions or two timers.

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationOffset, OffsetCalibrator};
use crate::error::{SessionError, SubmissionError};
use crate::sensor::{AngleSample, PermissionOutcome, RawReading};
use crate::stability::{Observation, RoundedAngle, StabilityDetector, DEFAULT_THRESHOLD_MS};

use super::state::SessionState;
use super::status::{StatusKey, StatusMessage};

/// Instruction for the driver
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// Ask the platform for sensor access and feed the outcome back
    RequestPermission,
    /// Open the sample subscription
    StartSampling,
    /// Drop the sample subscription
    StopSampling,
    /// Start the stability poll timer
    StartPolling,
    /// Stop the stability poll timer
    CancelPolling,
    /// Deliver the locked value and feed the outcome back
    Submit { value: RoundedAngle },
    /// Show the locked value and offer "send" / "measure again"
    PromptConfirm { final_pitch: RoundedAngle },
    Status(StatusMessage),
    StateChanged { from: SessionState, to: SessionState },
    /// A non-fatal problem the host should surface
    Failure(SessionError),
}

/// Serializable view of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub current_pitch: Option<RoundedAngle>,
    pub final_pitch: Option<RoundedAngle>,
    pub stable_since_ms: Option<u64>,
    pub status: StatusMessage,
    pub submit_in_flight: bool,
    pub offset: CalibrationOffset,
    pub zero_armed: bool,
}

/// State machine for one measurement session
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    state: SessionState,
    detector: StabilityDetector,
    calibrator: OffsetCalibrator,
    last_sample: Option<AngleSample>,
    current_pitch: Option<RoundedAngle>,
    final_pitch: Option<RoundedAngle>,
    holding_announced: bool,
    submit_in_flight: bool,
    status: StatusMessage,
    last_error: Option<SessionError>,
}

impl MeasurementSession {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            state: SessionState::Idle,
            detector: StabilityDetector::new(threshold_ms),
            calibrator: OffsetCalibrator::new(),
            last_sample: None,
            current_pitch: None,
            final_pitch: None,
            holding_announced: false,
            submit_in_flight: false,
            status: StatusMessage::new(StatusKey::Initial),
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn current_pitch(&self) -> Option<RoundedAngle> {
        self.current_pitch
    }

    pub fn final_pitch(&self) -> Option<RoundedAngle> {
        self.final_pitch
    }

    pub fn last_sample(&self) -> Option<&AngleSample> {
        self.last_sample.as_ref()
    }

    pub fn detector(&self) -> &StabilityDetector {
        &self.detector
    }

    pub fn calibrator(&self) -> &OffsetCalibrator {
        &self.calibrator
    }

    pub fn is_submit_in_flight(&self) -> bool {
        self.submit_in_flight
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            current_pitch: self.current_pitch,
            final_pitch: self.final_pitch,
            stable_since_ms: self.detector.window().stable_since_ms(),
            status: self.status.clone(),
            submit_in_flight: self.submit_in_flight,
            offset: self.calibrator.offset(),
            zero_armed: self.calibrator.is_armed(),
        }
    }

    /// User pressed start
    pub fn request_start(
        &mut self,
        requires_authorization: bool,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        self.expect_state(&[SessionState::Idle], "start")?;

        let mut effects = Vec::new();
        if requires_authorization {
            self.transition(SessionState::AwaitingPermission, &mut effects);
            effects.push(SessionEffect::RequestPermission);
        } else {
            self.enter_measuring(&mut effects);
        }
        Ok(effects)
    }

    /// Authorization finished
    pub fn permission_resolved(
        &mut self,
        outcome: PermissionOutcome,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        self.expect_state(&[SessionState::AwaitingPermission], "resolve permission")?;

        let mut effects = Vec::new();
        match outcome {
            PermissionOutcome::Granted => self.enter_measuring(&mut effects),
            PermissionOutcome::Denied => {
                self.transition(SessionState::Idle, &mut effects);
                self.fail(
                    SessionError::PermissionDenied,
                    StatusMessage::new(StatusKey::PermissionError),
                    &mut effects,
                );
            }
            PermissionOutcome::Failed { reason } => {
                self.transition(SessionState::Idle, &mut effects);
                self.fail(
                    SessionError::PermissionRequestFailed { reason },
                    StatusMessage::new(StatusKey::RequestError),
                    &mut effects,
                );
            }
        }
        Ok(effects)
    }

    /// One reading from the sensor, stamped with the session clock
    ///
    /// Readings outside Measuring are stale deliveries and are ignored.
    pub fn on_reading(
        &mut self,
        reading: RawReading,
        now_ms: u64,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let mut effects = Vec::new();
        if self.state != SessionState::Measuring {
            log::debug!(
                "[MeasurementSession] Ignoring reading while {:?}",
                self.state
            );
            return Ok(effects);
        }

        let Some(sample) = reading.into_sample(now_ms) else {
            let message = StatusMessage::new(StatusKey::SensorError);
            if self.status != message {
                self.fail(SessionError::SensorUnavailable, message, &mut effects);
            }
            return Ok(effects);
        };

        self.last_sample = Some(sample);
        let adjusted = self.calibrator.apply(&sample);
        let pitch = RoundedAngle::from_degrees(adjusted.pitch.abs());
        self.current_pitch = Some(pitch);

        if self.detector.observe(pitch, now_ms) == Observation::Changed {
            self.holding_announced = false;
            self.set_status(StatusMessage::new(StatusKey::Instructions), &mut effects);
        }
        Ok(effects)
    }

    /// Stability poll, on its own cadence
    pub fn on_poll_tick(&mut self, now_ms: u64) -> Result<Vec<SessionEffect>, SessionError> {
        let mut effects = Vec::new();
        if self.state != SessionState::Measuring {
            return Ok(effects);
        }
        let Some(pitch) = self.current_pitch else {
            return Ok(effects);
        };

        if self.detector.is_holding() && !self.holding_announced {
            self.holding_announced = true;
            self.set_status(StatusMessage::new(StatusKey::Holding), &mut effects);
        }

        if self.detector.is_stable(now_ms) {
            self.lock(pitch, &mut effects);
        }
        Ok(effects)
    }

    /// User pressed stop
    pub fn stop(&mut self) -> Result<Vec<SessionEffect>, SessionError> {
        self.expect_state(
            &[SessionState::Measuring, SessionState::AwaitingPermission],
            "stop",
        )?;

        let mut effects = vec![SessionEffect::StopSampling, SessionEffect::CancelPolling];
        self.calibrator.disarm();
        self.transition(SessionState::Idle, &mut effects);
        self.set_status(StatusMessage::new(StatusKey::Initial), &mut effects);
        Ok(effects)
    }

    /// Discard the locked value and measure from scratch
    pub fn measure_again(&mut self) -> Result<Vec<SessionEffect>, SessionError> {
        if self.submit_in_flight {
            return Err(SessionError::SubmitInFlight);
        }
        self.expect_state(&[SessionState::Locked], "measure again")?;

        let mut effects = Vec::new();
        self.enter_measuring(&mut effects);
        Ok(effects)
    }

    /// Zero the calibrator on the latest raw sample, or arm it for the next one
    pub fn zero(&mut self) -> Result<Vec<SessionEffect>, SessionError> {
        if self.state.is_terminal() {
            return Err(self.invalid("zero"));
        }

        if self.state == SessionState::Measuring {
            self.calibrator.zero(self.last_sample.as_ref());
        } else {
            self.calibrator.zero(None);
        }
        log::info!(
            "[MeasurementSession] Zero requested (armed={}, offset={:?})",
            self.calibrator.is_armed(),
            self.calibrator.offset()
        );
        Ok(Vec::new())
    }

    /// User pressed send
    pub fn begin_submit(&mut self) -> Result<Vec<SessionEffect>, SessionError> {
        if self.state.is_terminal() {
            return Err(self.invalid("submit"));
        }
        if self.submit_in_flight {
            return Err(SessionError::SubmitInFlight);
        }

        match (self.state, self.final_pitch) {
            (SessionState::Locked, Some(value)) => {
                self.submit_in_flight = true;
                log::info!("[MeasurementSession] Submitting {}°", value);
                Ok(vec![SessionEffect::Submit { value }])
            }
            _ => {
                self.status = StatusMessage::new(StatusKey::Initial);
                self.last_error = Some(SessionError::NothingToSubmit);
                Err(SessionError::NothingToSubmit)
            }
        }
    }

    /// Submission finished
    pub fn submission_resolved(
        &mut self,
        result: Result<(), SubmissionError>,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        if !self.submit_in_flight {
            return Err(self.invalid("resolve submission"));
        }
        self.submit_in_flight = false;

        let mut effects = Vec::new();
        match result {
            Ok(()) => {
                self.last_error = None;
                self.transition(SessionState::Submitted, &mut effects);
                self.force_status(StatusMessage::new(StatusKey::Success), &mut effects);
            }
            Err(err) => {
                let message = match &err {
                    SubmissionError::Server { status } => {
                        StatusMessage::with_detail(StatusKey::ServerError, status.to_string())
                    }
                    _ => StatusMessage::new(StatusKey::NetworkError),
                };
                self.last_error = Some(SessionError::SubmissionFailed(err.clone()));
                self.force_status(message, &mut effects);
                effects.push(SessionEffect::Failure(SessionError::SubmissionFailed(err)));
            }
        }
        Ok(effects)
    }

    fn enter_measuring(&mut self, effects: &mut Vec<SessionEffect>) {
        effects.push(SessionEffect::StopSampling);
        effects.push(SessionEffect::CancelPolling);

        self.detector.reset();
        self.last_sample = None;
        self.current_pitch = None;
        self.final_pitch = None;
        self.holding_announced = false;
        self.last_error = None;

        self.transition(SessionState::Measuring, effects);
        effects.push(SessionEffect::StartSampling);
        effects.push(SessionEffect::StartPolling);
        self.force_status(StatusMessage::new(StatusKey::Measuring), effects);
    }

    fn lock(&mut self, pitch: RoundedAngle, effects: &mut Vec<SessionEffect>) {
        self.final_pitch = Some(pitch);
        effects.push(SessionEffect::StopSampling);
        effects.push(SessionEffect::CancelPolling);
        self.transition(SessionState::Locked, effects);
        self.force_status(
            StatusMessage::with_detail(StatusKey::Finished, format!("{}°", pitch)),
            effects,
        );
        effects.push(SessionEffect::PromptConfirm { final_pitch: pitch });
    }

    fn transition(&mut self, to: SessionState, effects: &mut Vec<SessionEffect>) {
        let from = self.state;
        if from == to {
            return;
        }
        log::info!("[MeasurementSession] {:?} -> {:?}", from, to);
        self.state = to;
        effects.push(SessionEffect::StateChanged { from, to });
    }

    /// Emit only when the message differs from what is shown
    fn set_status(&mut self, message: StatusMessage, effects: &mut Vec<SessionEffect>) {
        if self.status != message {
            self.force_status(message, effects);
        }
    }

    fn force_status(&mut self, message: StatusMessage, effects: &mut Vec<SessionEffect>) {
        self.status = message.clone();
        effects.push(SessionEffect::Status(message));
    }

    fn fail(
        &mut self,
        err: SessionError,
        message: StatusMessage,
        effects: &mut Vec<SessionEffect>,
    ) {
        self.last_error = Some(err.clone());
        self.force_status(message, effects);
        effects.push(SessionEffect::Failure(err));
    }

    fn expect_state(
        &self,
        allowed: &[SessionState],
        action: &'static str,
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_MS)
    }
}
