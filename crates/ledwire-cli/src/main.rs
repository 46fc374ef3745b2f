//! `ledwire`: drive a USB-serial LED controller from the terminal.
//!
//! Type `/search` to connect to the first supported device, then `/on`,
//! `/off`, or any text to send it. Replies from the board are printed as
//! they arrive. `--simulate` swaps the serial ports for an in-memory board.

mod error;
mod port;
mod terminal;

use std::{process::ExitCode, time::Duration};

use clap::Parser;
use ledwire_app::Runtime;
use ledwire_core::{DiscoveryMode, SerialTransport, SessionConfig};
use ledwire_harness::{SimDevice, SimTransport};
use ledwire_proto::SerialParams;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{error::CliError, port::PortTransport, terminal::StdinDriver};

/// How often the port list is rescanned in `--auto` mode.
const HOTPLUG_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(name = "ledwire", version, about = "Drive a USB-serial LED controller")]
struct Args {
    /// Only consider this port (e.g. /dev/ttyACM0), whatever its type
    #[arg(short, long)]
    port: Option<String>,

    /// Line speed in bits per second
    #[arg(short, long, default_value_t = SerialParams::DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Interface to send commands to; repeat to send to several
    #[arg(short, long = "interface", value_name = "INTERFACE")]
    interfaces: Vec<u16>,

    /// Connect as soon as a device is attached
    #[arg(long)]
    auto: bool,

    /// Use an in-memory LED board instead of real ports
    #[arg(long)]
    simulate: bool,

    /// Seed for the simulated board's chunking
    #[arg(long, default_value_t = 0, requires = "simulate")]
    seed: u64,

    /// Log filter, e.g. `ledwire_core=debug` (defaults to RUST_LOG, then `warn`)
    #[arg(long)]
    log_filter: Option<String>,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig, CliError> {
        let mut params = SerialParams::default().with_baud_rate(self.baud);
        params.auto_connect = self.auto;
        params.validate()?;

        let mut config = SessionConfig { params, ..SessionConfig::default() };
        if !self.interfaces.is_empty() {
            config.write_interfaces = self.interfaces.clone();
        }
        if self.auto {
            config.discovery = DiscoveryMode::Auto;
        }
        Ok(config)
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_filter.as_deref());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ledwire failed");
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = args.session_config()?;
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(serve(args, config))
}

async fn serve(args: Args, config: SessionConfig) -> Result<(), CliError> {
    if args.simulate {
        let mut transport = SimTransport::with_seed(args.seed);
        if args.auto {
            transport.attach(SimDevice::led_board(1));
        } else {
            transport = transport.with_device(SimDevice::led_board(1));
        }
        info!(seed = args.seed, "using simulated board");
        return drive(transport, config).await;
    }

    let mut transport = PortTransport::new(args.port.clone());
    if args.auto {
        if let Err(e) = transport.watch(HOTPLUG_PERIOD) {
            error!(error = %e, "cannot watch serial ports");
        }
    }
    drive(transport, config).await
}

async fn drive<T: SerialTransport>(transport: T, config: SessionConfig) -> Result<(), CliError> {
    let mut runtime = Runtime::new(StdinDriver::new(), transport, config);
    runtime.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("ledwire").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_session_config() {
        let config = parse(&[]).session_config().unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn interfaces_and_auto() {
        let config = parse(&["-i", "1", "-i", "2", "--auto", "--baud", "115200"])
            .session_config()
            .unwrap();
        assert_eq!(config.write_interfaces, vec![1, 2]);
        assert_eq!(config.discovery, DiscoveryMode::Auto);
        assert_eq!(config.params.baud_rate, 115_200);
        assert!(config.params.auto_connect);
    }

    #[test]
    fn zero_baud_is_rejected() {
        assert!(matches!(parse(&["--baud", "0"]).session_config(), Err(CliError::Params(_))));
    }

    #[test]
    fn runtime_start_failure_is_reported() {
        let err = CliError::from(std::io::Error::other("no threads"));
        assert_eq!(err.to_string(), "failed to start runtime: no threads");
    }

    #[test]
    fn seed_requires_simulate() {
        let args = ["ledwire", "--seed", "3"];
        assert!(Args::try_parse_from(args).is_err());
        assert!(Args::try_parse_from(["ledwire", "--simulate", "--seed", "3"]).is_ok());
    }
}
