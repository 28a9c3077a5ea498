//! adbw - Switch a USB-attached Android device to wireless debugging
//!
//! Usage:
//!     adbw [OPTIONS]
//!
//! Environment Variables:
//!     ADBW_PORT: TCP port adbd listens on (default: 5555)
//!     ADBW_SERIAL: Device serial when several are attached
//!     ADBW_*_TIMEOUT, ADBW_CONNECT_WINDOW, ADBW_POLL_INTERVAL: timing overrides in seconds

use adb_devtools::{
    parse_forward_specs, run_workflow, AdbConnection, ErrorKind, ForwardOutcome, ForwardSpec,
    WorkflowConfig, WorkflowResult, DEFAULT_TCP_PORT,
};
use anyhow::Result;
use clap::Parser;
use std::net::Ipv4Addr;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Connect to an Android device over Wi-Fi
#[derive(Parser, Debug)]
#[command(name = "adbw")]
#[command(about = "Connect to an Android device over Wi-Fi via adb")]
#[command(after_help = r#"Examples:
    # Switch the USB device to TCP and connect over Wi-Fi
    adbw

    # Use another port
    adbw -p 5556

    # Reconnect to a known address, no USB needed
    adbw --ip 192.168.1.42

    # Reverse-forward device port 3000 to host port 8080, and 4000 to itself
    adbw -r 3000,8080 -r 4000
"#)]
struct Cli {
    /// TCP port for wireless debugging
    #[arg(short = 'p', long, env = "ADBW_PORT", default_value_t = DEFAULT_TCP_PORT,
          value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Device IP address, skips Wi-Fi address discovery
    #[arg(long, value_name = "ADDRESS")]
    ip: Option<Ipv4Addr>,

    /// Reverse forwards: `remote,local` pairs or `remote[:local]` tokens
    #[arg(short = 'r', long = "reverse", value_name = "SPECS")]
    reverse: Vec<String>,

    /// Device serial when more than one device is attached
    #[arg(short = 's', long, env = "ADBW_SERIAL")]
    serial: Option<String>,

    /// Debug logging on stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("RUST_LOG")
                .with_default_directive(default.into())
                .from_env_lossy(),
        )
        .init();
}

fn parse_reverse(values: &[String]) -> adb_devtools::Result<Vec<ForwardSpec>> {
    let mut specs = Vec::new();
    for value in values {
        specs.extend(parse_forward_specs(value)?);
    }
    Ok(specs)
}

fn describe(spec: &ForwardSpec, outcome: &ForwardOutcome) -> String {
    let status = match outcome {
        ForwardOutcome::Forwarded => "forwarded".to_string(),
        ForwardOutcome::AlreadyForwarded => "already forwarded".to_string(),
        ForwardOutcome::Failed(e) => format!("failed ({})", e),
    };
    format!("Reverse tcp:{} -> tcp:{}: {}", spec.remote, spec.local, status)
}

fn report(result: &WorkflowResult) {
    let Some(conn) = result.connection() else {
        return;
    };

    let label = conn.device_label.as_deref().unwrap_or("device");
    if conn.already_connected {
        println!("Already connected to {} at {}", label, conn.endpoint);
    } else {
        println!("Connected to {} at {}", label, conn.endpoint);
    }
    println!("{}", conn.endpoint);

    for (spec, outcome) in result.forwards() {
        println!("{}", describe(spec, outcome));
    }

    if !conn.already_connected {
        println!("You can now disconnect the USB cable.");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let forwards = match parse_reverse(&args.reverse) {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(ErrorKind::InvalidArgument.exit_code());
        }
    };

    let adb = match AdbConnection::locate() {
        Ok(adb) => adb,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.kind().exit_code());
        }
    };

    let mut config = WorkflowConfig::new()
        .with_port(args.port)
        .with_forwards(forwards);
    if let Some(serial) = args.serial {
        config = config.with_serial(serial);
    }
    if let Some(ip) = args.ip {
        config = config.with_manual_ip(ip);
    }

    let result = run_workflow(&adb, &config).await;
    match &result {
        WorkflowResult::Failed(failure) => {
            eprintln!("Error: {}", failure);
            std::process::exit(result.exit_code());
        }
        _ => report(&result),
    }

    Ok(())
}
