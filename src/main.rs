use clap::Parser;
use serial_plot::config::{Config, ConfigLoader, SampleFormat};
use serial_plot::consumer::{ConsumeSummary, StreamConsumer, TextPlotter};
use serial_plot::error::{AppError, AppResult};
use serial_plot::logging;
use serial_plot::platform::WINDOWS_DEFAULT_PORT;
use serial_plot::port::{list_ports, NativeOpener};
use serial_plot::setup::{begin, PortSession, SetupRequest};
use serial_plot::shutdown::ShutdownSignal;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use tracing::{info, warn};

#[cfg(feature = "tui")]
use serial_plot::tui::SparklinePlotter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial-plot",
    version,
    about = "Plot samples arriving on a serial port.",
    long_about = "Opens the platform's serial device at 115200 8N1, binds blocking input and output streams to it and plots the incoming samples. Linux uses /dev/ttyUSB0 and macOS a fixed FTDI device; only Windows honours the PORT argument."
)]
struct Args {
    /// Serial port to open (Windows only).
    #[arg(default_value = WINDOWS_DEFAULT_PORT)]
    port: String,

    /// Configuration file; must exist when given.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// How bytes become samples: raw or ascii.
    #[arg(long)]
    format: Option<SampleFormat>,

    /// Stop after this many samples (text plotter only).
    #[arg(short = 'n', long)]
    samples: Option<u64>,

    /// Text written to the device before plotting; `\n` and `\r` are expanded.
    #[arg(long, value_name = "TEXT")]
    send: Option<String>,

    /// List available serial ports and exit.
    #[arg(long)]
    list_ports: bool,

    /// Log filter, e.g. `debug` or `serial_plot=trace`.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Plot in a full-screen sparkline instead of printing bars.
    #[cfg(feature = "tui")]
    #[arg(long)]
    tui: bool,
}

impl Args {
    fn uses_tui(&self) -> bool {
        #[cfg(feature = "tui")]
        {
            self.tui && !self.list_ports
        }
        #[cfg(not(feature = "tui"))]
        {
            false
        }
    }

    /// Command-line values win over file and environment.
    fn apply_to(&self, config: &mut Config) {
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(format) = self.format {
            config.plot.format = format;
        }
        if let Some(send) = &self.send {
            config.plot.start_command = Some(send.clone());
        }
    }
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(args: Args) -> AppResult<()> {
    let mut config = ConfigLoader::load(args.config.as_deref())?.into_config();
    args.apply_to(&mut config);
    config.validate()?;

    logging::init(&config.logging, args.log_level.as_deref(), args.uses_tui())?;

    if args.list_ports {
        return print_ports();
    }

    let shutdown = ShutdownSignal::new();
    let request =
        SetupRequest::from_config(&config, Some(args.port.clone())).with_shutdown(shutdown.clone());
    let session = begin(&request, &NativeOpener).map_err(|err| {
        warn!(%err, "Setup failed");
        err
    })?;

    let consumer = build_consumer(&args, &config, session.path());
    let worker_shutdown = shutdown.clone();
    let mut task =
        tokio::task::spawn_blocking(move || run_session(session, consumer, &worker_shutdown));

    let joined = tokio::select! {
        joined = &mut task => joined,
        () = shutdown_signal() => {
            info!("Signal received, starting graceful shutdown");
            shutdown.trigger();
            task.await
        }
    };

    let summary = joined.map_err(|e| AppError::Consumer(e.to_string()))??;
    info!(
        bytes = summary.bytes_read,
        samples = summary.samples,
        "Session finished"
    );
    Ok(())
}

/// Runs on the blocking pool: consume, then clean up whatever happened.
fn run_session(
    mut session: PortSession,
    mut consumer: Box<dyn StreamConsumer>,
    shutdown: &ShutdownSignal,
) -> AppResult<ConsumeSummary> {
    let outcome = consumer.consume(session.streams_mut(), shutdown);

    let report = session.into_cleanup().on_app_exit();
    if !report.is_clean() {
        warn!(failures = report.failures.len(), "Cleanup finished with errors");
    }
    outcome
}

fn build_consumer(args: &Args, config: &Config, port: &str) -> Box<dyn StreamConsumer> {
    #[cfg(feature = "tui")]
    {
        if args.tui {
            info!(port, "Starting sparkline plotter");
            return Box::new(SparklinePlotter::new(port, &config.plot));
        }
    }

    info!(port, format = ?config.plot.format, "Starting text plotter");
    Box::new(TextPlotter::from_config(std::io::stdout(), &config.plot).with_limit(args.samples))
}

fn print_ports() -> AppResult<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        match port.description {
            Some(description) => println!("{}\t{}\t{}", port.name, port.kind, description),
            None => println!("{}\t{}", port.name, port.kind),
        }
    }
    Ok(())
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
