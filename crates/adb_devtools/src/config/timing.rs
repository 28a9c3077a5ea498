//! Timing configuration for device bridge calls and the transport switch

use lazy_static::lazy_static;
use std::env;
use std::time::Duration;

fn env_secs(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(default)
}

/// Per-call timeouts applied inside the bridge client
#[derive(Debug, Clone)]
pub struct BridgeTimingConfig {
    /// Default timeout for a single adb invocation
    pub command_timeout: f64,
    /// `adb tcpip` restarts adbd and can take noticeably longer
    pub tcpip_timeout: f64,
    /// Timeout for a single `adb connect` attempt
    pub connect_timeout: f64,
    /// Screenshots stream a full PNG over USB
    pub screencap_timeout: f64,
}

impl Default for BridgeTimingConfig {
    fn default() -> Self {
        Self {
            command_timeout: env_secs("ADBW_COMMAND_TIMEOUT", 5.0),
            tcpip_timeout: env_secs("ADBW_TCPIP_TIMEOUT", 10.0),
            connect_timeout: env_secs("ADBW_CONNECT_TIMEOUT", 3.0),
            screencap_timeout: env_secs("ADBSHOT_TIMEOUT", 20.0),
        }
    }
}

/// Bounded waits used by the transport switcher
#[derive(Debug, Clone)]
pub struct SwitchTimingConfig {
    /// How long to wait for the device to report TCP mode after `adb tcpip`
    pub tcp_confirm_timeout: f64,
    /// How long refused `adb connect` attempts are re-tried while adbd restarts
    pub connect_window: f64,
    /// Pause between polls inside either window
    pub poll_interval: f64,
}

impl Default for SwitchTimingConfig {
    fn default() -> Self {
        Self {
            tcp_confirm_timeout: env_secs("ADBW_TCP_CONFIRM_TIMEOUT", 10.0),
            connect_window: env_secs("ADBW_CONNECT_WINDOW", 5.0),
            poll_interval: env_secs("ADBW_POLL_INTERVAL", 0.5),
        }
    }
}

impl SwitchTimingConfig {
    pub fn tcp_confirm_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.tcp_confirm_timeout)
    }

    pub fn connect_window(&self) -> Duration {
        Duration::from_secs_f64(self.connect_window)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval)
    }
}

/// Master timing configuration
#[derive(Debug, Clone, Default)]
pub struct TimingConfig {
    pub bridge: BridgeTimingConfig,
    pub switch: SwitchTimingConfig,
}

lazy_static! {
    /// Global timing configuration instance
    pub static ref TIMING_CONFIG: TimingConfig = TimingConfig::default();
}
