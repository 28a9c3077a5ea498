//! adb_devtools: wireless debugging and screenshot helpers built on `adb`
//!
//! This library provides:
//! - A `DeviceBridge` seam over the `adb` binary (`AdbConnection`)
//! - Device selection, Wi-Fi address discovery and the USB → TCP switch
//! - Reverse port forwarding that tolerates identical existing bindings
//! - Screenshot capture with resizing, file output and clipboard copy
//!
//! # Example
//!
//! ```no_run
//! use adb_devtools::{run_workflow, AdbConnection, WorkflowConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let adb = AdbConnection::locate().expect("adb on PATH");
//!     let config = WorkflowConfig::new().with_port(5555);
//!
//!     let result = run_workflow(&adb, &config).await;
//!     println!("Result: {:?}", result.connection());
//! }
//! ```

// Core modules
pub mod error;
pub mod config;

// Bridge to the adb binary
pub mod adb;
pub mod endpoint;

// Wireless debugging
pub mod discovery;
pub mod forward;
pub mod selector;
pub mod transport;
pub mod workflow;

// Screenshots
pub mod capture;

#[cfg(test)]
mod testing;

pub use error::{AdbError, ErrorKind, Result};

pub use config::{
    BridgeTimingConfig, SwitchTimingConfig, TimingConfig, DEFAULT_TCP_PORT, TIMING_CONFIG,
};

pub use adb::{AdbConnection, ConnectAck, Device, DeviceBridge, DeviceState, TransportKind};
pub use endpoint::{NetworkCandidate, TcpEndpoint};

pub use discovery::discover;
pub use forward::{parse_forward_specs, ForwardOutcome, ForwardSpec, ReverseForwardManager};
pub use selector::select_device;
pub use transport::{SwitchPolicy, TransportState, TransportSwitcher};
pub use workflow::{
    run_workflow, Connection, WorkflowConfig, WorkflowFailure, WorkflowResult, WorkflowStep,
};

pub use capture::{take_screenshot, FileTarget, ShotOptions, ShotReport, DEFAULT_LOWRES_HEIGHT};
