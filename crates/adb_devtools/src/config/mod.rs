//! Configuration module for adb_devtools
//!
//! This module contains:
//! - `timing`: Timeouts and bounded waits for bridge calls and the transport switch

mod timing;

pub use timing::{BridgeTimingConfig, SwitchTimingConfig, TimingConfig, TIMING_CONFIG};

/// Port adbd listens on in TCP mode unless told otherwise
pub const DEFAULT_TCP_PORT: u16 = 5555;
