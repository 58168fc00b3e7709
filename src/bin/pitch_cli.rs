use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pitch_gauge::audio::{default_tone, ToneCue};
use pitch_gauge::config::AppConfig;
use pitch_gauge::i18n::StatusCatalog;
use pitch_gauge::level::{BubbleMapper, LevelingTool};
use pitch_gauge::sensor::{
    FixedPermission, NoAuthorization, PermissionGate, RawReading, ScriptEnd, ScriptedSensor,
    SensorSource, SimulatedSensor, SimulationProfile,
};
use pitch_gauge::session::{RunnerSettings, SessionRunner, SessionState, StatusKey};
use pitch_gauge::submission::{HttpSubmitter, ScriptedSubmitter, SubmissionTarget, Submitter};
use pitch_gauge::telemetry::{SessionEvent, TelemetryCollector};
use pitch_gauge::units::{DisplayUnit, UnitConverter};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(
    name = "pitch_cli",
    about = "Headless harness for roof-pitch measurement and the bubble level"
)]
struct Cli {
    /// Configuration file (defaults to assets/pitch_gauge.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert one angle to its display value
    Convert {
        #[arg(long, allow_hyphen_values = true)]
        angle: f64,
        #[arg(long)]
        unit: Option<DisplayUnit>,
        /// Print the full reading as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a measurement session until the pitch locks (and optionally submit it)
    Measure {
        /// Readings script: one "<pitch> [roll]" or "null" per line
        #[arg(long)]
        readings: Option<PathBuf>,
        /// Delay between scripted readings
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// Behaviour once the script runs out
        #[arg(long, value_enum, default_value_t = EndArg::Hold)]
        end: EndArg,
        /// Simulated target pitch when no script is given
        #[arg(long, default_value_t = 30.0, allow_hyphen_values = true)]
        target_pitch: f64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        threshold_ms: Option<u64>,
        #[arg(long)]
        poll_ms: Option<u64>,
        #[arg(long)]
        unit: Option<DisplayUnit>,
        #[arg(long)]
        lang: Option<String>,
        /// Simulated authorization step
        #[arg(long, value_enum, default_value_t = PermissionArg::None)]
        permission: PermissionArg,
        /// Submit the locked value
        #[arg(long)]
        submit: bool,
        /// Base URL of the submission endpoint (without it, submission stays in-process)
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        route: Option<String>,
        /// Page path whose last segment is the session id, e.g. /mobile/12345
        #[arg(long, default_value = "/mobile/local")]
        path: String,
        /// Submission attempts after the first one fails
        #[arg(long, default_value_t = 0)]
        retries: u32,
        /// Give up after this long
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Run the bubble level over a readings script
    Level {
        #[arg(long)]
        readings: PathBuf,
        #[arg(long)]
        unit: Option<DisplayUnit>,
        /// Zero on the reading with this index (0-based); before the first reading arms the zero
        #[arg(long)]
        zero_at: Option<usize>,
        /// Enable the level tone
        #[arg(long)]
        audio: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EndArg {
    Hold,
    Repeat,
    Close,
}

impl From<EndArg> for ScriptEnd {
    fn from(end: EndArg) -> Self {
        match end {
            EndArg::Hold => ScriptEnd::Hold,
            EndArg::Repeat => ScriptEnd::RepeatLast,
            EndArg::Close => ScriptEnd::Close,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PermissionArg {
    None,
    Granted,
    Denied,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    pitch_gauge::init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Convert { angle, unit, json } => run_convert(&config, angle, unit, json),
        Commands::Measure {
            readings,
            interval_ms,
            end,
            target_pitch,
            seed,
            threshold_ms,
            poll_ms,
            unit,
            lang,
            permission,
            submit,
            endpoint,
            route,
            path,
            retries,
            timeout_secs,
        } => {
            let mut config = config;
            if let Some(threshold_ms) = threshold_ms {
                config.stability.threshold_ms = threshold_ms;
            }
            if let Some(poll_ms) = poll_ms {
                config.stability.poll_interval_ms = poll_ms;
            }
            if let Some(unit) = unit {
                config.display.unit = unit;
            }
            if let Some(lang) = lang {
                config.locale.language = lang;
            }
            if let Some(endpoint) = endpoint.clone() {
                config.submission.base_url = endpoint;
            }
            if let Some(route) = route {
                config.submission.base_route = route;
            }

            let sensor: Arc<dyn SensorSource> = match readings {
                Some(path) => Arc::new(
                    ScriptedSensor::new(load_readings(&path)?, Duration::from_millis(interval_ms))
                        .with_end(end.into()),
                ),
                None => Arc::new(SimulatedSensor::new(SimulationProfile {
                    target_pitch,
                    seed,
                    ..SimulationProfile::default()
                })),
            };

            let options = MeasureOptions {
                submit,
                use_http: endpoint.is_some(),
                path,
                retries,
                timeout: Duration::from_secs(timeout_secs),
                permission,
            };
            run_measure(config, sensor, options)
        }
        Commands::Level {
            readings,
            unit,
            zero_at,
            audio,
        } => run_level(&config, &readings, unit, zero_at, audio),
    }
}

fn run_convert(config: &AppConfig, angle: f64, unit: Option<DisplayUnit>, json: bool) -> Result<ExitCode> {
    let converter = UnitConverter::new(config.display.percent_grade_limit);
    let reading = converter.format(angle, unit.unwrap_or(config.display.unit));

    if json {
        println!("{}", serde_json::to_string(&reading)?);
    } else {
        println!("{reading}");
    }
    Ok(ExitCode::from(0))
}

struct MeasureOptions {
    submit: bool,
    use_http: bool,
    path: String,
    retries: u32,
    timeout: Duration,
    permission: PermissionArg,
}

fn run_measure(config: AppConfig, sensor: Arc<dyn SensorSource>, options: MeasureOptions) -> Result<ExitCode> {
    let submitter: Arc<dyn Submitter> = if options.use_http {
        let target = SubmissionTarget::from_path(
            config.submission.base_url.clone(),
            config.submission.base_route.clone(),
            &options.path,
        )?;
        Arc::new(HttpSubmitter::with_timeout(target, config.submission.timeout())?)
    } else {
        Arc::new(ScriptedSubmitter::always_ok())
    };

    let permission: Arc<dyn PermissionGate> = match options.permission {
        PermissionArg::None => Arc::new(NoAuthorization),
        PermissionArg::Granted => Arc::new(FixedPermission::granted()),
        PermissionArg::Denied => Arc::new(FixedPermission::denied()),
    };

    let catalog = match &config.locale.translations_path {
        Some(path) => StatusCatalog::load_from_file(path),
        None => StatusCatalog::builtin().clone(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async move {
        let telemetry = Arc::new(TelemetryCollector::default());
        let mut events = telemetry.subscribe();

        let runner = SessionRunner::new(
            RunnerSettings::from_config(&config),
            sensor,
            permission,
            submitter,
        )
        .with_catalog(catalog)
        .with_telemetry(Arc::clone(&telemetry));
        let (handle, task) = runner.spawn();
        handle.start().await?;

        let deadline = tokio::time::Instant::now() + options.timeout;
        let mut attempts_left = options.retries;
        let mut exit = 2;

        loop {
            let record = match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Ok(record)) => record,
                Ok(Err(RecvError::Lagged(skipped))) => {
                    log::warn!("[pitch_cli] Skipped {} events", skipped);
                    continue;
                }
                Ok(Err(RecvError::Closed)) => break,
                Err(_) => {
                    eprintln!("Timed out after {:?}", options.timeout);
                    break;
                }
            };
            println!("{}", serde_json::to_string(&record)?);

            match &record.event {
                SessionEvent::ConfirmPrompt { .. } if options.submit => handle.submit().await?,
                SessionEvent::ConfirmPrompt { .. } => {
                    exit = 0;
                    break;
                }
                SessionEvent::StateChanged {
                    to: SessionState::Submitted,
                    ..
                } => {
                    exit = 0;
                    break;
                }
                SessionEvent::StateChanged {
                    from: SessionState::AwaitingPermission,
                    to: SessionState::Idle,
                } => {
                    exit = 4;
                    break;
                }
                SessionEvent::Status {
                    key: StatusKey::ServerError | StatusKey::NetworkError,
                    ..
                } => {
                    if attempts_left == 0 {
                        exit = 3;
                        break;
                    }
                    attempts_left -= 1;
                    handle.submit().await?;
                }
                _ => {}
            }
        }

        handle.shutdown().await.ok();
        let snapshot = task.await.context("session task failed")?;
        println!("{}", serde_json::to_string(&snapshot)?);
        Ok::<_, anyhow::Error>(ExitCode::from(exit))
    })
}

fn run_level(
    config: &AppConfig,
    readings: &Path,
    unit: Option<DisplayUnit>,
    zero_at: Option<usize>,
    audio: bool,
) -> Result<ExitCode> {
    let readings = load_readings(readings)?;
    let cue = Arc::new(default_tone(&config.audio));
    if audio {
        cue.set_enabled(true);
    }

    let mut tool = LevelingTool::new(
        UnitConverter::new(config.display.percent_grade_limit),
        BubbleMapper::from_config(&config.bubble),
        unit.unwrap_or(config.display.unit),
        cue.clone(),
    );

    if zero_at == Some(0) {
        println!("{}", serde_json::to_string(&tool.zero())?);
    }
    tool.start();

    for (index, reading) in readings.into_iter().enumerate() {
        if let Some(at) = zero_at {
            if at > 0 && index == at {
                println!("{}", serde_json::to_string(&tool.zero())?);
            }
        }
        if let Some(readout) = tool.handle_reading(reading) {
            println!("{}", serde_json::to_string(&readout)?);
        }
    }
    tool.stop();

    eprintln!("level tone played {} time(s)", cue.played());
    Ok(ExitCode::from(0))
}

fn load_readings(path: &Path) -> Result<Vec<RawReading>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut readings = Vec::new();
    for (number, line) in contents.lines().enumerate() {
        match RawReading::parse_line(line) {
            None => {}
            Some(Ok(reading)) => readings.push(reading),
            Some(Err(err)) => {
                return Err(anyhow!("{}:{}: {}", path.display(), number + 1, err));
            }
        }
    }

    if readings.is_empty() {
        return Err(anyhow!("{} contains no readings", path.display()));
    }
    Ok(readings)
}
