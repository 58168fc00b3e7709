// Session module - roof-pitch measurement lifecycle
//
// `machine` holds the pure transition logic, `runner` drives it on tokio with
// the live sensor subscription, poll timer and pending futures.

pub mod machine;
pub mod runner;
pub mod state;
pub mod status;

pub use machine::{MeasurementSession, SessionEffect, SessionSnapshot};
pub use runner::{RunnerSettings, SessionCommand, SessionHandle, SessionRunner};
pub use state::SessionState;
pub use status::{StatusKey, StatusMessage};
