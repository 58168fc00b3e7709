//! End-to-end session scenarios on paused tokio time
//!
//! Each test drives a `SessionRunner` through its handle and watches the
//! published telemetry, the way a host screen would.

use std::sync::Arc;
use std::time::Duration;

use pitch_gauge::error::{SessionErrorCodes, SubmissionError};
use pitch_gauge::sensor::{
    ChannelSensor, FixedPermission, NoAuthorization, PermissionGate, RawReading, ScriptEnd,
    ScriptedSensor, SensorSource,
};
use pitch_gauge::session::{
    RunnerSettings, SessionHandle, SessionRunner, SessionSnapshot, SessionState, StatusKey,
};
use pitch_gauge::stability::RoundedAngle;
use pitch_gauge::submission::{ScriptedSubmitter, Submitter};
use pitch_gauge::telemetry::{SessionEvent, TelemetryCollector, TelemetryRecord};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

struct Harness {
    handle: SessionHandle,
    task: JoinHandle<SessionSnapshot>,
    events: UnboundedReceiver<TelemetryRecord>,
}

fn settings() -> RunnerSettings {
    RunnerSettings {
        threshold_ms: 3000,
        poll_interval: Duration::from_millis(500),
        ..RunnerSettings::default()
    }
}

fn launch(
    sensor: Arc<dyn SensorSource>,
    permission: Arc<dyn PermissionGate>,
    submitter: Arc<dyn Submitter>,
) -> Harness {
    let telemetry = Arc::new(TelemetryCollector::default());
    let events = telemetry.subscribe_unbounded();
    let (handle, task) = SessionRunner::new(settings(), sensor, permission, submitter)
        .with_telemetry(telemetry)
        .spawn();
    Harness {
        handle,
        task,
        events,
    }
}

fn steady_sensor(pitch: f64) -> ScriptedSensor {
    ScriptedSensor::from_pitches(&[pitch], Duration::from_millis(100)).with_end(ScriptEnd::RepeatLast)
}

impl Harness {
    /// Collect events until one matches, failing after ten simulated seconds
    async fn until<F>(&mut self, mut matches: F) -> Vec<TelemetryRecord>
    where
        F: FnMut(&SessionEvent) -> bool,
    {
        let mut seen = Vec::new();
        let wait = async {
            while let Some(record) = self.events.recv().await {
                let done = matches(&record.event);
                seen.push(record);
                if done {
                    return;
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(10), wait)
            .await
            .unwrap_or_else(|_| panic!("no matching event; saw {:#?}", seen));
        seen
    }

    async fn until_locked(&mut self) -> (Vec<TelemetryRecord>, RoundedAngle) {
        let records = self
            .until(|event| matches!(event, SessionEvent::ConfirmPrompt { .. }))
            .await;
        let final_pitch = match records.last().map(|r| &r.event) {
            Some(SessionEvent::ConfirmPrompt { final_pitch }) => *final_pitch,
            other => panic!("expected confirm prompt, got {:?}", other),
        };
        (records, final_pitch)
    }

    async fn finish(self) -> SessionSnapshot {
        self.handle.shutdown().await.expect("runner alive");
        self.task.await.expect("runner task")
    }
}

fn status_keys(records: &[TelemetryRecord]) -> Vec<StatusKey> {
    records
        .iter()
        .filter_map(|record| match &record.event {
            SessionEvent::Status { key, .. } => Some(*key),
            _ => None,
        })
        .collect()
}

fn error_codes(records: &[TelemetryRecord]) -> Vec<i32> {
    records
        .iter()
        .filter_map(|record| match &record.event {
            SessionEvent::Error { code, .. } => Some(*code),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn steady_pitch_locks_after_threshold() {
    let mut harness = launch(
        Arc::new(steady_sensor(30.04)),
        Arc::new(NoAuthorization),
        Arc::new(ScriptedSubmitter::always_ok()),
    );
    harness.handle.start().await.unwrap();

    let (records, final_pitch) = harness.until_locked().await;

    assert_eq!(final_pitch, RoundedAngle::from_degrees(30.0));
    assert_eq!(
        status_keys(&records),
        vec![
            StatusKey::Initial,
            StatusKey::Measuring,
            StatusKey::Instructions,
            StatusKey::Holding,
            StatusKey::Finished,
        ]
    );
    let locked_at = records.last().unwrap().timestamp_ms;
    assert!(
        (3000..=3600).contains(&locked_at),
        "locked at {}ms",
        locked_at
    );

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.state, SessionState::Locked);
    assert_eq!(snapshot.final_pitch, Some(final_pitch));
}

#[tokio::test(start_paused = true)]
async fn measure_again_never_doubles_the_subscription() {
    let (sensor, feed) = ChannelSensor::new();
    let probe = sensor.clone();
    let mut harness = launch(
        Arc::new(sensor),
        Arc::new(NoAuthorization),
        Arc::new(ScriptedSubmitter::always_ok()),
    );

    let pusher = tokio::spawn(async move {
        let mut pitch = 12.0;
        loop {
            feed.push(RawReading::pitch_only(pitch));
            tokio::time::sleep(Duration::from_millis(100)).await;
            pitch = 14.0;
        }
    });

    harness.handle.start().await.unwrap();
    let (_, first) = harness.until_locked().await;
    assert_eq!(probe.active_subscriptions(), 0);

    harness.handle.measure_again().await.unwrap();
    harness
        .until(|event| {
            matches!(
                event,
                SessionEvent::StateChanged {
                    to: SessionState::Measuring,
                    ..
                }
            )
        })
        .await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(probe.active_subscriptions(), 1);

    // Measure-again outside Locked is rejected and opens nothing
    harness.handle.measure_again().await.unwrap();
    let records = harness
        .until(|event| matches!(event, SessionEvent::Error { .. }))
        .await;
    assert_eq!(
        error_codes(&records),
        vec![SessionErrorCodes::INVALID_TRANSITION]
    );
    assert_eq!(probe.active_subscriptions(), 1);

    let (_, second) = harness.until_locked().await;
    assert_eq!(first, RoundedAngle::from_degrees(14.0));
    assert_eq!(second, RoundedAngle::from_degrees(14.0));
    assert_eq!(probe.active_subscriptions(), 0);

    pusher.abort();
    harness.finish().await;
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_pending_is_rejected() {
    let submitter = ScriptedSubmitter::always_ok().with_delay(Duration::from_secs(2));
    let mut harness = launch(
        Arc::new(steady_sensor(22.5)),
        Arc::new(NoAuthorization),
        Arc::new(submitter.clone()),
    );
    harness.handle.start().await.unwrap();
    harness.until_locked().await;

    harness.handle.submit().await.unwrap();
    harness.handle.submit().await.unwrap();
    harness.handle.measure_again().await.unwrap();

    let records = harness
        .until(|event| {
            matches!(
                event,
                SessionEvent::StateChanged {
                    to: SessionState::Submitted,
                    ..
                }
            )
        })
        .await;

    assert_eq!(
        error_codes(&records),
        vec![
            SessionErrorCodes::SUBMIT_IN_FLIGHT,
            SessionErrorCodes::SUBMIT_IN_FLIGHT
        ]
    );
    assert_eq!(submitter.received(), vec![RoundedAngle::from_degrees(22.5)]);

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.state, SessionState::Submitted);
    assert!(!snapshot.submit_in_flight);
}

#[tokio::test(start_paused = true)]
async fn server_error_keeps_value_for_retry() {
    let submitter = ScriptedSubmitter::new(vec![Err(SubmissionError::Server { status: 500 })]);
    let mut harness = launch(
        Arc::new(steady_sensor(8.0)),
        Arc::new(NoAuthorization),
        Arc::new(submitter.clone()),
    );
    harness.handle.start().await.unwrap();
    harness.until_locked().await;

    harness.handle.submit().await.unwrap();
    let records = harness
        .until(|event| {
            matches!(
                event,
                SessionEvent::Status {
                    key: StatusKey::ServerError,
                    ..
                }
            )
        })
        .await;
    match &records.last().unwrap().event {
        SessionEvent::Status { text, .. } => assert_eq!(text, "Server error: 500"),
        other => panic!("unexpected {:?}", other),
    }

    harness.handle.submit().await.unwrap();
    let records = harness
        .until(|event| {
            matches!(
                event,
                SessionEvent::Status {
                    key: StatusKey::Success,
                    ..
                }
            )
        })
        .await;
    assert!(records.iter().any(|r| matches!(
        r.event,
        SessionEvent::StateChanged {
            from: SessionState::Locked,
            to: SessionState::Submitted
        }
    )));
    assert_eq!(submitter.received().len(), 2);
    harness.finish().await;
}

#[tokio::test(start_paused = true)]
async fn denied_permission_returns_to_idle_without_sampling() {
    let sensor = steady_sensor(10.0);
    let probe = sensor.clone();
    let mut harness = launch(
        Arc::new(sensor),
        Arc::new(FixedPermission::denied()),
        Arc::new(ScriptedSubmitter::always_ok()),
    );
    harness.handle.start().await.unwrap();

    let records = harness
        .until(|event| {
            matches!(
                event,
                SessionEvent::StateChanged {
                    from: SessionState::AwaitingPermission,
                    to: SessionState::Idle
                }
            )
        })
        .await;
    let tail = harness
        .until(|event| matches!(event, SessionEvent::Error { .. }))
        .await;
    let records = [records, tail].concat();

    assert!(status_keys(&records).contains(&StatusKey::PermissionError));
    assert_eq!(error_codes(&records), vec![SessionErrorCodes::PERMISSION_DENIED]);
    assert_eq!(probe.subscription_count(), 0);

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.state, SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn granted_permission_starts_sampling() {
    let sensor = steady_sensor(5.0);
    let probe = sensor.clone();
    let mut harness = launch(
        Arc::new(sensor),
        Arc::new(FixedPermission::granted()),
        Arc::new(ScriptedSubmitter::always_ok()),
    );
    harness.handle.start().await.unwrap();

    let (_, final_pitch) = harness.until_locked().await;
    assert_eq!(final_pitch, RoundedAngle::from_degrees(5.0));
    assert_eq!(probe.subscription_count(), 1);
    harness.finish().await;
}

#[tokio::test(start_paused = true)]
async fn stop_releases_the_sensor() {
    let (sensor, feed) = ChannelSensor::new();
    let probe = sensor.clone();
    let mut harness = launch(
        Arc::new(sensor),
        Arc::new(NoAuthorization),
        Arc::new(ScriptedSubmitter::always_ok()),
    );
    harness.handle.start().await.unwrap();
    harness
        .until(|event| matches!(event, SessionEvent::Status { key: StatusKey::Measuring, .. }))
        .await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(probe.active_subscriptions(), 1);

    feed.push(RawReading::pitch_only(17.0));
    harness
        .until(|event| matches!(event, SessionEvent::Reading { .. }))
        .await;

    harness.handle.stop().await.unwrap();
    let records = harness
        .until(|event| matches!(event, SessionEvent::Status { key: StatusKey::Initial, .. }))
        .await;
    assert!(records.iter().any(|r| matches!(
        r.event,
        SessionEvent::StateChanged {
            from: SessionState::Measuring,
            to: SessionState::Idle
        }
    )));
    assert_eq!(probe.active_subscriptions(), 0);
    assert!(!feed.has_listeners());

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.state, SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn zero_before_start_makes_first_sample_the_reference() {
    let mut harness = launch(
        Arc::new(steady_sensor(12.3)),
        Arc::new(NoAuthorization),
        Arc::new(ScriptedSubmitter::always_ok()),
    );
    harness.handle.zero().await.unwrap();
    harness.handle.start().await.unwrap();

    let (_, final_pitch) = harness.until_locked().await;
    assert_eq!(final_pitch, RoundedAngle::from_degrees(0.0));

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.offset.pitch_offset, 12.3);
    assert!(!snapshot.zero_armed);
}

#[tokio::test(start_paused = true)]
async fn missing_orientation_reports_sensor_error_once() {
    let sensor = ScriptedSensor::new(
        vec![RawReading::unavailable(), RawReading::unavailable()],
        Duration::from_millis(100),
    );
    let mut harness = launch(
        Arc::new(sensor),
        Arc::new(NoAuthorization),
        Arc::new(ScriptedSubmitter::always_ok()),
    );
    harness.handle.start().await.unwrap();

    let records = harness
        .until(|event| matches!(event, SessionEvent::Error { .. }))
        .await;
    assert_eq!(
        error_codes(&records),
        vec![SessionErrorCodes::SENSOR_UNAVAILABLE]
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
    let mut extra = Vec::new();
    while let Ok(record) = harness.events.try_recv() {
        extra.push(record);
    }
    assert!(error_codes(&extra).is_empty());

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.state, SessionState::Measuring);
    assert_eq!(snapshot.status.key, StatusKey::SensorError);
}

#[tokio::test(start_paused = true)]
async fn submit_before_lock_is_refused() {
    let mut harness = launch(
        Arc::new(steady_sensor(3.0)),
        Arc::new(NoAuthorization),
        Arc::new(ScriptedSubmitter::always_ok()),
    );
    harness.handle.submit().await.unwrap();

    let records = harness
        .until(|event| matches!(event, SessionEvent::Error { .. }))
        .await;
    assert_eq!(
        error_codes(&records),
        vec![SessionErrorCodes::NOTHING_TO_SUBMIT]
    );
    harness.finish().await;
}
