use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::EnvFilter;

use peat::audio::{NullSink, OutputSink, WavCaptureSink};
use peat::calibration::{write_calibration_tone, CalibrationModel};
use peat::config::{SessionConfig, DEFAULT_SESSION_FILE};
use peat::observer::{KeyboardResponder, ResponseSource, SimulatedListener};
use peat::scoring::{score_directory, ScoreBasis};
use peat::session::{NoopPacer, Pacer, SessionProgress, SessionRunner, SessionSummary, ThreadPacer};
use peat::stimulus::parse_test_freqs;

#[derive(Parser, Debug)]
#[command(
    name = "peat",
    version,
    about = "Psychophysical estimation of auditory thresholds (2IAFC staircase)"
)]
struct Cli {
    /// Session parameter file
    #[arg(long, global = true, default_value = DEFAULT_SESSION_FILE)]
    session: PathBuf,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an interactive session answered from the keyboard
    Run(RunArgs),
    /// Run a session answered by a simulated listener
    Simulate(SimulateArgs),
    /// Calculate thresholds from a directory of trial logs
    Score(ScoreArgs),
    /// Sound level meter calibration
    #[command(subcommand)]
    Calibrate(CalibrateCommand),
    /// Inspect or create the session file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone)]
struct SessionOverrides {
    /// Subject identifier
    #[arg(long)]
    subject: Option<String>,
    /// Condition label
    #[arg(long)]
    condition: Option<String>,
    /// Comma-separated test frequencies in Hz ("500, 1000, 2000")
    #[arg(long)]
    freqs: Option<String>,
    /// Directory receiving trial logs
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    overrides: SessionOverrides,
    /// Write each presentation to a numbered WAV file in this directory
    #[arg(long)]
    capture_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    overrides: SessionOverrides,
    /// Listener threshold in staircase units (dB)
    #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
    threshold: f64,
    /// Psychometric function slope (dB)
    #[arg(long, default_value_t = 2.0)]
    slope: f64,
    /// Seed for the listener and interval assignment
    #[arg(long, default_value_t = 217)]
    seed: u64,
    /// Sleep through trial timing instead of running instantly
    #[arg(long)]
    realtime: bool,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Directory of trial logs (defaults to the session data directory)
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Number of final reversals to average
    #[arg(long, default_value_t = 4)]
    reversals: usize,
    /// Level column to average
    #[arg(long, value_enum, default_value_t = BasisArg::Desired)]
    basis: BasisArg,
    /// Directory receiving thresholds.csv
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum BasisArg {
    Desired,
    Staircase,
}

impl From<BasisArg> for ScoreBasis {
    fn from(arg: BasisArg) -> Self {
        match arg {
            BasisArg::Desired => ScoreBasis::DesiredLevel,
            BasisArg::Staircase => ScoreBasis::StaircaseLevel,
        }
    }
}

#[derive(Subcommand, Debug)]
enum CalibrateCommand {
    /// Store the SLM offset measured for the calibration tone
    Offset {
        /// Sound level meter reading (dB SPL)
        #[arg(long, allow_hyphen_values = true)]
        reading: f64,
        /// Level the calibration tone was played at (dB FS)
        #[arg(long, allow_hyphen_values = true)]
        cal_level: Option<f64>,
    },
    /// Convert a desired SPL to the dB FS output level
    Level {
        #[arg(long, allow_hyphen_values = true)]
        desired: f64,
    },
    /// Present the calibration signal at the calibration level
    Play {
        /// Custom calibration WAV, saved to the session file
        #[arg(long, conflicts_with = "builtin")]
        cal_file: Option<PathBuf>,
        /// Forget a saved custom file and use the built-in warble
        #[arg(long)]
        builtin: bool,
        /// Write the presentation to a WAV file in this directory
        #[arg(long)]
        capture_dir: Option<PathBuf>,
    },
    /// Write the built-in 1 kHz calibration warble to WAV
    Tone {
        #[arg(long, default_value = "calibration.wav")]
        output: PathBuf,
        #[arg(long, default_value_t = 2.0)]
        duration: f64,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective session parameters as JSON
    Show,
    /// Write default session parameters
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.execute() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("peat error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

impl Cli {
    fn execute(self) -> Result<ExitCode> {
        match self.command {
            Command::Run(args) => run_command(&self.session, args),
            Command::Simulate(args) => simulate_command(&self.session, args),
            Command::Score(args) => score_command(&self.session, args),
            Command::Calibrate(cmd) => calibrate_command(&self.session, cmd),
            Command::Config(cmd) => config_command(&self.session, cmd),
        }
    }
}

fn load_session(path: &Path, overrides: &SessionOverrides) -> Result<SessionConfig> {
    let mut config = SessionConfig::load_from_file(path);
    if let Some(subject) = &overrides.subject {
        config.subject = subject.clone();
    }
    if let Some(condition) = &overrides.condition {
        config.condition = condition.clone();
    }
    if let Some(freqs) = &overrides.freqs {
        config.stimulus.test_freqs =
            parse_test_freqs(freqs).with_context(|| format!("parsing --freqs '{}'", freqs))?;
    }
    if let Some(dir) = &overrides.data_dir {
        config.data_dir = dir.clone();
    }
    config.validate().context("invalid session parameters")?;
    Ok(config)
}

fn run_command(session_path: &Path, args: RunArgs) -> Result<ExitCode> {
    let config = load_session(session_path, &args.overrides)?;
    let sink = output_sink(args.capture_dir.as_deref())?;

    let stdin = io::stdin();
    let mut responder = KeyboardResponder::new(stdin.lock(), io::stdout());
    let (summary, config) = run_session(config, sink, ThreadPacer, None, &mut responder)?;

    config
        .save_to_file(session_path)
        .with_context(|| format!("saving {}", session_path.display()))?;
    print_summary(&summary);
    Ok(ExitCode::SUCCESS)
}

/// WAV capture when a directory is given, otherwise discard presentations
fn output_sink(capture_dir: Option<&Path>) -> Result<Box<dyn OutputSink>> {
    match capture_dir {
        Some(dir) => Ok(Box::new(WavCaptureSink::new(dir, 0).with_context(|| {
            format!("creating capture directory {}", dir.display())
        })?)),
        None => {
            tracing::warn!("[peat] No --capture-dir given; presentations are discarded");
            Ok(Box::new(NullSink::new()))
        }
    }
}

fn simulate_command(session_path: &Path, args: SimulateArgs) -> Result<ExitCode> {
    let config = load_session(session_path, &args.overrides)?;
    let mut listener = SimulatedListener::new(args.threshold, args.slope, args.seed);

    let summary = if args.realtime {
        run_session(config, NullSink::new(), ThreadPacer, Some(args.seed), &mut listener)?.0
    } else {
        run_session(config, NullSink::new(), NoopPacer::new(), Some(args.seed), &mut listener)?.0
    };

    println!("Simulated listener threshold: {:.2}", listener.threshold());
    print_summary(&summary);
    Ok(ExitCode::SUCCESS)
}

/// Run a session while a background thread prints progress
fn run_session<S: OutputSink, P: Pacer>(
    config: SessionConfig,
    sink: S,
    pacer: P,
    seed: Option<u64>,
    responder: &mut dyn ResponseSource,
) -> Result<(SessionSummary, SessionConfig)> {
    let mut runner = SessionRunner::new(config, sink, pacer)?;
    if let Some(seed) = seed {
        runner = runner.with_seed(seed)?;
    }

    let progress = spawn_progress_printer(runner.subscribe());
    let result = runner.run(responder);
    let config = runner.config().clone();
    drop(runner);
    let _ = progress.join();

    let summary = result.context("session failed")?;
    Ok((summary, config))
}

fn spawn_progress_printer(
    mut rx: broadcast::Receiver<SessionProgress>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        match rx.blocking_recv() {
            Ok(SessionProgress::FrequencyStarted {
                freq,
                index,
                total,
                percent,
            }) => println!(
                "Testing {} Hz ({} of {}, {:.0}%)",
                freq, index, total, percent
            ),
            Ok(SessionProgress::FrequencyFinished(summary)) => println!(
                "Finished {} Hz after {} trials",
                summary.freq, summary.trials
            ),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("[peat] progress printer skipped {} events", skipped)
            }
            Err(RecvError::Closed) => break,
        }
    })
}

fn print_summary(summary: &SessionSummary) {
    println!(
        "Subject {} / condition {}: {} trials, log {}",
        summary.subject,
        summary.condition,
        summary.total_trials(),
        summary.log_path.display()
    );
    for freq in &summary.frequencies {
        match freq.threshold {
            Some(threshold) => println!(
                "  {:>6} Hz  threshold {:>7.2}  ({} reversals)",
                freq.freq,
                threshold,
                freq.reversal_levels.len()
            ),
            None => println!("  {:>6} Hz  no reversals", freq.freq),
        }
    }
}

fn score_command(session_path: &Path, args: ScoreArgs) -> Result<ExitCode> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => SessionConfig::load_from_file(session_path).data_dir,
    };
    let (results, output) = score_directory(&dir, args.reversals, args.basis.into(), &args.output_dir)
        .with_context(|| format!("scoring trial logs in {}", dir.display()))?;

    for result in &results {
        let threshold = result
            .threshold
            .map(|t| format!("{:.2}", t))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}\t{}\t{} Hz\t{}",
            result.subject, result.condition, result.freq, threshold
        );
    }
    println!("Wrote {}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn calibrate_command(session_path: &Path, cmd: CalibrateCommand) -> Result<ExitCode> {
    let mut config = SessionConfig::load_from_file(session_path);
    let mut model = CalibrationModel::from_config(&config.calibration);

    match cmd {
        CalibrateCommand::Offset { reading, cal_level } => {
            let cal_level = cal_level.unwrap_or(model.cal_level_db());
            let offset = model.record_reading(reading, cal_level);
            model.apply_to(&mut config.calibration);
            config
                .save_to_file(session_path)
                .with_context(|| format!("saving {}", session_path.display()))?;
            println!("SLM offset: {:.2} dB", offset);
        }
        CalibrateCommand::Level { desired } => {
            let adjusted = model.level_for(desired);
            model.apply_to(&mut config.calibration);
            config
                .save_to_file(session_path)
                .with_context(|| format!("saving {}", session_path.display()))?;
            println!("{:.2} dB SPL -> {:.2} dB FS", desired, adjusted);
        }
        CalibrateCommand::Play {
            cal_file,
            builtin,
            capture_dir,
        } => {
            if builtin {
                model.set_cal_file(None);
            } else if let Some(path) = cal_file {
                model.set_cal_file(Some(path));
            }
            let mut sink = output_sink(capture_dir.as_deref())?;
            let prepared = model
                .present(
                    &mut sink,
                    config.stimulus.sample_rate,
                    &config.audio.channel_routing,
                )
                .context("presenting calibration signal")?;

            model.apply_to(&mut config.calibration);
            config
                .save_to_file(session_path)
                .with_context(|| format!("saving {}", session_path.display()))?;
            println!(
                "Presented {:.2} s calibration signal at {:.2} dB FS on {}",
                prepared.signal.duration_secs(),
                model.cal_level_db(),
                sink.name()
            );
        }
        CalibrateCommand::Tone { output, duration } => {
            let signal = write_calibration_tone(&output, duration, config.stimulus.sample_rate)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "Wrote {:.2} s calibration tone to {}; play it at {:.2} dB FS",
                signal.duration_secs(),
                output.display(),
                model.cal_level_db()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn config_command(session_path: &Path, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => {
            let config = SessionConfig::load_from_file(session_path);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { force } => {
            if session_path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    session_path.display()
                );
            }
            SessionConfig::default()
                .save_to_file(session_path)
                .with_context(|| format!("writing {}", session_path.display()))?;
            println!("Wrote default session parameters to {}", session_path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}
