//! Wireless debugging setup: select → discover → switch → forward

use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adb::{ConnectAck, Device, DeviceBridge};
use crate::config::DEFAULT_TCP_PORT;
use crate::discovery::{discover, manual_candidate};
use crate::endpoint::TcpEndpoint;
use crate::error::AdbError;
use crate::forward::{ForwardOutcome, ForwardSpec, ReverseForwardManager};
use crate::selector::select_device;
use crate::transport::{SwitchPolicy, TransportSwitcher};

/// Configuration for one wireless setup run
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub port: u16,
    pub serial: Option<String>,
    pub manual_ip: Option<Ipv4Addr>,
    pub forwards: Vec<ForwardSpec>,
    pub switch_policy: SwitchPolicy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_TCP_PORT,
            serial: None,
            manual_ip: None,
            forwards: Vec::new(),
            switch_policy: SwitchPolicy::default(),
        }
    }
}

impl WorkflowConfig {
    /// Create a new WorkflowConfig
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TCP port adbd should listen on
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Operate on this device instead of picking one
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    /// Skip network discovery and use this address
    pub fn with_manual_ip(mut self, ip: Ipv4Addr) -> Self {
        self.manual_ip = Some(ip);
        self
    }

    /// Reverse forwards to set up once connected
    pub fn with_forwards(mut self, forwards: Vec<ForwardSpec>) -> Self {
        self.forwards = forwards;
        self
    }

    pub fn with_switch_policy(mut self, policy: SwitchPolicy) -> Self {
        self.switch_policy = policy;
        self
    }
}

/// Step of the run a failure belongs to. Forwarding never aborts a run:
/// its failures are reported per forward in `WorkflowResult::ConnectedWithForwards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Selecting,
    Discovering,
    Switching,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Selecting => "device selection",
            Self::Discovering => "network discovery",
            Self::Switching => "transport switch",
        })
    }
}

/// The first failure of a run, tagged with the step it happened in
#[derive(Debug, Error)]
#[error("{step} failed: {error}")]
pub struct WorkflowFailure {
    pub step: WorkflowStep,
    #[source]
    pub error: AdbError,
}

fn failed_at(step: WorkflowStep) -> impl FnOnce(AdbError) -> WorkflowFailure {
    move |error| WorkflowFailure { step, error }
}

/// A device reachable over TCP at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub endpoint: TcpEndpoint,
    /// Brand and model, when a USB or TCP device was selected
    pub device_label: Option<String>,
    /// The adb server was already connected to `endpoint` before this run
    pub already_connected: bool,
}

/// Terminal outcome of a run
#[derive(Debug)]
pub enum WorkflowResult {
    Connected(Connection),
    ConnectedWithForwards(Connection, Vec<(ForwardSpec, ForwardOutcome)>),
    Failed(WorkflowFailure),
}

impl WorkflowResult {
    pub fn connection(&self) -> Option<&Connection> {
        match self {
            Self::Connected(conn) | Self::ConnectedWithForwards(conn, _) => Some(conn),
            Self::Failed(_) => None,
        }
    }

    pub fn forwards(&self) -> &[(ForwardSpec, ForwardOutcome)] {
        match self {
            Self::ConnectedWithForwards(_, outcomes) => outcomes,
            _ => &[],
        }
    }

    /// 0 once connected, whatever happened to individual forwards
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Connected(_) | Self::ConnectedWithForwards(..) => 0,
            Self::Failed(failure) => failure.error.kind().exit_code(),
        }
    }
}

/// Run the whole setup once. Nothing is retried: the first failing step ends the run.
pub async fn run_workflow<B>(bridge: &B, config: &WorkflowConfig) -> WorkflowResult
where
    B: DeviceBridge + ?Sized,
{
    match run_steps(bridge, config).await {
        Ok(result) => result,
        Err(failure) => {
            info!("Aborted: {}", failure);
            WorkflowResult::Failed(failure)
        }
    }
}

async fn run_steps<B>(bridge: &B, config: &WorkflowConfig) -> Result<WorkflowResult, WorkflowFailure>
where
    B: DeviceBridge + ?Sized,
{
    // Selecting
    let devices = bridge
        .list_devices()
        .await
        .map_err(failed_at(WorkflowStep::Selecting))?;

    let selected = match select_device(&devices, config.serial.as_deref()) {
        Ok(device) => Some(device),
        // Reconnecting to a known address needs no USB device
        Err(AdbError::NoDeviceConnected) if config.manual_ip.is_some() => {
            info!("No device attached, connecting to the given address directly");
            None
        }
        Err(e) => return Err(failed_at(WorkflowStep::Selecting)(e)),
    };

    let device_label = match &selected {
        Some(device) => Some(device_label(bridge, device).await),
        None => None,
    };
    if let Some(device) = &selected {
        info!("Selected {} ({:?})", device.serial, device_label);
    }

    // Discovering
    let endpoint = resolve_endpoint(bridge, selected.as_ref(), config)
        .await
        .map_err(failed_at(WorkflowStep::Discovering))?;
    debug!("Endpoint {}", endpoint);

    // Switching
    let serial = endpoint.serial();
    let listed = devices
        .iter()
        .any(|d| d.is_online() && d.serial == serial);

    let already_connected = if listed {
        info!("Already connected to {}", endpoint);
        true
    } else {
        let mut switcher = TransportSwitcher::new(bridge, config.switch_policy);
        let ack = match &selected {
            Some(device) if !device.is_tcp() => switcher.switch(&device.serial, &endpoint).await,
            _ => switcher.reconnect(&endpoint).await,
        }
        .map_err(failed_at(WorkflowStep::Switching))?;
        ack == ConnectAck::AlreadyConnected
    };

    let connection = Connection {
        endpoint,
        device_label,
        already_connected,
    };

    // Forwarding
    if config.forwards.is_empty() {
        return Ok(WorkflowResult::Connected(connection));
    }

    let manager = ReverseForwardManager::new(bridge);
    let outcomes = manager.apply(&connection.endpoint, &config.forwards).await;
    Ok(WorkflowResult::ConnectedWithForwards(connection, outcomes))
}

async fn resolve_endpoint<B>(
    bridge: &B,
    selected: Option<&Device>,
    config: &WorkflowConfig,
) -> Result<TcpEndpoint, AdbError>
where
    B: DeviceBridge + ?Sized,
{
    if let Some(ip) = config.manual_ip {
        let candidate = manual_candidate(ip);
        return TcpEndpoint::new(candidate.address, config.port);
    }

    let Some(device) = selected else {
        return Err(AdbError::NoDeviceConnected);
    };

    // A wireless device's `ip:port` serial already is its endpoint
    if device.is_tcp() {
        if let Ok(endpoint) = device.serial.parse::<TcpEndpoint>() {
            if endpoint.port != config.port {
                warn!(
                    "{} is already connected over TCP, ignoring port {}",
                    device.serial, config.port
                );
            }
            return Ok(endpoint);
        }
    }

    let candidate = discover(bridge, &device.serial).await?;
    info!("Using {} on {}", candidate.address, candidate.interface);
    TcpEndpoint::new(candidate.address, config.port)
}

/// "<brand> <model>" for display; failures only degrade the label
async fn device_label<B>(bridge: &B, device: &Device) -> String
where
    B: DeviceBridge + ?Sized,
{
    let brand = bridge
        .get_property(&device.serial, "ro.product.brand")
        .await
        .unwrap_or_default();
    let model = bridge
        .get_property(&device.serial, "ro.product.model")
        .await
        .ok()
        .filter(|m| !m.is_empty())
        .or_else(|| device.model.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    if brand.is_empty() {
        model
    } else {
        format!("{} {}", brand, model)
    }
}
