//! Photo Booth CLI
//!
//! Runs the booth loop. No hardware drivers are linked in: the button is a
//! simulated GPIO that presses itself every few idle ticks and the camera
//! writes generated stills, so the whole flow can be exercised on any host.

use clap::{Parser, Subcommand};
use photo_booth::{
    logging, BoothConfig, Interrupt, MockCamera, MockGpio, Peripherals, RunOutcome,
    SessionController, SystemClock,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "photo-booth", version, about)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Press the button automatically and exit after one session
    #[arg(long)]
    autopress: bool,

    /// Two photos, short prep and a 10 second startup delay
    #[arg(long)]
    fast: bool,

    /// Skip the startup delay
    #[arg(long)]
    no_startup_delay: bool,

    /// Append log lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write Prometheus textfile metrics here after every session
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Simulated button: press on every Nth idle tick
    #[arg(long, default_value_t = 50)]
    press_every: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and validate the configuration, then print it as TOML
    CheckConfig,
}

impl Cli {
    fn apply_overrides(&self, config: &mut BoothConfig) {
        config.test.autopress_button |= self.autopress;
        config.test.fast |= self.fast;
        config.test.no_startup_delay |= self.no_startup_delay;
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
        if let Some(path) = &self.metrics_file {
            config.metrics_file = Some(path.clone());
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match BoothConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::from(2);
            }
        },
        None => BoothConfig::default(),
    };
    cli.apply_overrides(&mut config);

    let config = config.effective();
    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        return ExitCode::from(2);
    }

    if let Some(Command::CheckConfig) = cli.command {
        return match config.to_toml() {
            Ok(toml) => {
                print!("{}", toml);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(2)
            }
        };
    }

    if let Err(e) = logging::init(config.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Photo Booth v{}", photo_booth::VERSION);
    info!("Running with simulated GPIO and camera");

    for asset in config.assets.required(config.capture.photo_count) {
        if !asset.is_file() {
            warn!(path = %asset.display(), "Missing overlay image");
        }
    }

    let interrupt = Interrupt::new();
    let handler = interrupt.clone();
    if let Err(e) = ctrlc::set_handler(move || handler.trigger()) {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let gpio = MockGpio::realtime().press_every(cli.press_every);
    let rig = Peripherals::new(gpio, MockCamera::new(), SystemClock);
    let mut controller = SessionController::new(config, rig, interrupt);

    // Faults and interrupts were already logged and cleaned up by the
    // controller; only a startup abort changes the exit status.
    match controller.run() {
        RunOutcome::Aborted(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
