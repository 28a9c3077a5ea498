/// Error types for device bridge operations and the wireless workflow
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdbError {
    #[error("adb is not available: {0}")]
    BridgeUnavailable(String),

    #[error("device unreachable: {0}")]
    DeviceUnreachable(String),

    #[error("no device connected. Connect a device and enable USB debugging")]
    NoDeviceConnected,

    #[error("multiple devices connected ({}); pick one with --serial", .0.join(", "))]
    AmbiguousDevice(Vec<String>),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("could not determine a usable IP address on device {0}")]
    NoNetworkFound(String),

    #[error("failed to enable TCP/IP mode: {0}")]
    TransportError(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("{}", forward_conflict_message(.remote, .existing_local))]
    ForwardConflict {
        remote: u16,
        existing_local: Option<u16>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("screenshot capture failed: {0}")]
    Capture(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

fn forward_conflict_message(remote: &u16, existing_local: &Option<u16>) -> String {
    match existing_local {
        Some(local) => format!("device port {} is already forwarded to host port {}", remote, local),
        None => format!("device port {} could not be bound", remote),
    }
}

/// Fieldless classification of [`AdbError`], used for exit codes and matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BridgeUnavailable,
    DeviceUnreachable,
    NoDeviceConnected,
    AmbiguousDevice,
    DeviceNotFound,
    NoNetworkFound,
    TransportError,
    Timeout,
    ConnectionRefused,
    ForwardConflict,
    InvalidArgument,
    Capture,
    Clipboard,
    Io,
    Image,
}

impl AdbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BridgeUnavailable(_) => ErrorKind::BridgeUnavailable,
            Self::DeviceUnreachable(_) => ErrorKind::DeviceUnreachable,
            Self::NoDeviceConnected => ErrorKind::NoDeviceConnected,
            Self::AmbiguousDevice(_) => ErrorKind::AmbiguousDevice,
            Self::DeviceNotFound(_) => ErrorKind::DeviceNotFound,
            Self::NoNetworkFound(_) => ErrorKind::NoNetworkFound,
            Self::TransportError(_) => ErrorKind::TransportError,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::ConnectionRefused(_) => ErrorKind::ConnectionRefused,
            Self::ForwardConflict { .. } => ErrorKind::ForwardConflict,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Capture(_) => ErrorKind::Capture,
            Self::Clipboard(_) => ErrorKind::Clipboard,
            Self::Io(_) => ErrorKind::Io,
            Self::Image(_) => ErrorKind::Image,
        }
    }
}

impl ErrorKind {
    /// Process exit code for a run that aborted with this kind of error
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Io | Self::Image | Self::Capture | Self::Clipboard => 1,
            Self::InvalidArgument => 2,
            Self::BridgeUnavailable => 3,
            Self::NoDeviceConnected => 4,
            Self::AmbiguousDevice => 5,
            Self::DeviceNotFound => 6,
            Self::NoNetworkFound => 7,
            Self::TransportError => 8,
            Self::Timeout => 9,
            Self::ConnectionRefused => 10,
            Self::DeviceUnreachable => 11,
            Self::ForwardConflict => 12,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdbError>;
