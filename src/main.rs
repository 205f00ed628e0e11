use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use uci_serial_bridge::config::{Config, ConfigLoader, CONFIG_FILE_NAME};
use uci_serial_bridge::error::BridgeResult;
use uci_serial_bridge::link::SerialConnector;
use uci_serial_bridge::logging::init_logging;
use uci_serial_bridge::output::GuiWriter;
use uci_serial_bridge::session::Session;
use uci_serial_bridge::stdio::run_stdin;
use uci_serial_bridge::RelayEngine;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "uci-serial-bridge",
    version,
    about = "Relays the UCI chess protocol between a GUI and a serial-attached engine.",
    long_about = "Speaks UCI on stdin/stdout and forwards commands to a chess engine on a serial device. Handshakes, readiness checks and searches are always answered, with a fallback move when the device is silent or missing."
)]
struct Args {
    /// Serial port name (e.g. COM15 or /dev/ttyACM0)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Transport timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Log protocol traffic at debug level
    #[arg(short, long)]
    debug: bool,

    /// Append logs to this file instead of stderr
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a default configuration file to ./bridge.toml and exit
    #[arg(long)]
    create_config: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(timeout) = self.timeout {
            config.serial.timeout_secs = timeout;
        }
        if self.debug {
            config.logging.debug = true;
        }
        if let Some(log) = &self.log {
            config.logging.file = Some(log.clone());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be up yet.
            eprintln!("uci-serial-bridge: {e}");
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> BridgeResult<()> {
    if args.create_config {
        ConfigLoader::with_defaults().save_to(CONFIG_FILE_NAME)?;
        println!("Wrote default configuration to {CONFIG_FILE_NAME}");
        return Ok(());
    }

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config_path = loader.config_path.clone();
    let mut config = loader.into_config();
    args.apply(&mut config);
    config.validate()?;

    init_logging(&config.logging)?;
    info!(
        port = %config.serial.port,
        baud = config.serial.baud_rate,
        timeout_secs = config.serial.timeout_secs,
        debug = config.logging.debug,
        config_file = ?config_path,
        "starting uci-serial-bridge {}",
        env!("CARGO_PKG_VERSION")
    );

    let connector = SerialConnector::new(
        config.serial.port.clone(),
        config.serial.port_configuration(),
    );
    let session = Session::new(Box::new(connector), config.engine.identity())
        .with_retry(config.connection.retry_policy());
    let mut engine = RelayEngine::new(session, GuiWriter::stdout())
        .with_budget(config.search.budget())
        .with_fallback_move(config.search.fallback_move.clone());

    if !engine.start().await {
        info!("no device available, answering with fallbacks");
    }

    run_stdin(&mut engine).await
}
