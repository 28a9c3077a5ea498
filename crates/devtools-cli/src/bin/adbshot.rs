//! adbshot - Capture an Android device screenshot
//!
//! Usage:
//!     adbshot [-l] [-H HEIGHT] [-f [PATH]] [-c] [-s SERIAL]
//!
//! With neither `-f` nor `-c` the screenshot goes to the clipboard.

use adb_devtools::{take_screenshot, AdbConnection, FileTarget, ShotOptions, DEFAULT_LOWRES_HEIGHT};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Capture the screen of a connected Android device
#[derive(Parser, Debug)]
#[command(name = "adbshot")]
#[command(about = "Capture an Android device screenshot to the clipboard or a file")]
struct Cli {
    /// Resize to --height pixels tall
    #[arg(short = 'l', long)]
    lowres: bool,

    /// Target height for --lowres
    #[arg(short = 'H', long, default_value_t = DEFAULT_LOWRES_HEIGHT,
          value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Save as PNG; without PATH, ./screenshot-YYYYmmdd-HHMMSS.png
    #[arg(short = 'f', long, value_name = "PATH", num_args = 0..=1, default_missing_value = "")]
    file: Option<String>,

    /// Copy to the clipboard (default when --file is not given)
    #[arg(short = 'c', long)]
    clipboard: bool,

    /// Device serial
    #[arg(short = 's', long)]
    serial: Option<String>,

    /// Debug logging on stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> ShotOptions {
        ShotOptions {
            serial: self.serial.clone(),
            resize_height: self.lowres.then_some(self.height),
            file: self.file.as_deref().map(|path| match path {
                "" => FileTarget::Auto,
                path => FileTarget::Path(PathBuf::from(path)),
            }),
            clipboard: self.clipboard,
        }
    }
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

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let outcome = match AdbConnection::locate() {
        Ok(adb) => take_screenshot(&adb, &args.options()).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(report) => println!("{}", report),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.kind().exit_code());
        }
    }

    Ok(())
}
