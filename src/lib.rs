// Pitch Gauge Core - orientation sampling and roof-pitch capture
// Stability-locked angle measurement with a bubble-level companion

// Module declarations
pub mod audio;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod error;
pub mod i18n;
pub mod level;
pub mod sensor;
pub mod session;
pub mod stability;
pub mod submission;
pub mod telemetry;
pub mod units;

// Re-exports for convenience
pub use config::AppConfig;
pub use session::{MeasurementSession, SessionRunner, SessionState};
pub use stability::RoundedAngle;
pub use units::{DisplayReading, DisplayUnit};

/// Initialize logging for binaries
///
/// Installs a `tracing` fmt subscriber that also receives `log` records.
/// Calling it twice is harmless.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(false);
        init_logging(true);
        log::info!("[Test] logging initialized");
    }
}
