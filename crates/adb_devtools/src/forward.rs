//! Reverse port forwarding (device → host) on a connected device

use std::fmt;
use tracing::{info, warn};

use crate::adb::DeviceBridge;
use crate::endpoint::TcpEndpoint;
use crate::error::{AdbError, Result};

/// Device port `remote` reaches host port `local`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardSpec {
    pub remote: u16,
    pub local: u16,
}

impl ForwardSpec {
    pub fn new(remote: u16, local: u16) -> Self {
        Self { remote, local }
    }

    pub fn same_port(port: u16) -> Self {
        Self::new(port, port)
    }
}

impl fmt::Display for ForwardSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.remote == self.local {
            write!(f, "{}", self.remote)
        } else {
            write!(f, "{}:{}", self.remote, self.local)
        }
    }
}

fn parse_port(token: &str) -> Result<u16> {
    match token.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(AdbError::InvalidArgument(format!(
            "invalid reverse port '{}'. Must be 1-65535",
            token.trim()
        ))),
    }
}

/// Parse a `--reverse` value.
///
/// Tokens are comma separated. When any token is written `remote:local`,
/// every token is a single spec (`3000:8080,4000`). Otherwise bare numbers are
/// read as `remote,local` pairs, a trailing single port forwarding to itself
/// (`3000,8080` is 3000 → 8080, `4000` is 4000 → 4000).
pub fn parse_forward_specs(input: &str) -> Result<Vec<ForwardSpec>> {
    let tokens: Vec<&str> = input.split(',').map(str::trim).collect();
    if tokens.iter().any(|t| t.is_empty()) {
        return Err(AdbError::InvalidArgument(format!(
            "invalid reverse spec '{}'",
            input
        )));
    }

    if tokens.iter().any(|t| t.contains(':')) {
        return tokens
            .iter()
            .map(|token| match token.split_once(':') {
                Some((remote, local)) => Ok(ForwardSpec::new(parse_port(remote)?, parse_port(local)?)),
                None => parse_port(token).map(ForwardSpec::same_port),
            })
            .collect();
    }

    let ports = tokens
        .iter()
        .map(|t| parse_port(t))
        .collect::<Result<Vec<u16>>>()?;

    Ok(ports
        .chunks(2)
        .map(|pair| match pair {
            [remote, local] => ForwardSpec::new(*remote, *local),
            [port] => ForwardSpec::same_port(*port),
            _ => unreachable!("chunks(2) yields one or two ports"),
        })
        .collect())
}

/// What happened to one requested forward
#[derive(Debug)]
pub enum ForwardOutcome {
    Forwarded,
    /// The identical binding already existed
    AlreadyForwarded,
    Failed(AdbError),
}

impl ForwardOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Applies reverse forwards one at a time; a failed forward never stops the rest
pub struct ReverseForwardManager<'a, B: ?Sized> {
    bridge: &'a B,
}

impl<'a, B> ReverseForwardManager<'a, B>
where
    B: DeviceBridge + ?Sized,
{
    pub fn new(bridge: &'a B) -> Self {
        Self { bridge }
    }

    /// Forward every spec on the device connected at `endpoint`, in order
    pub async fn apply(
        &self,
        endpoint: &TcpEndpoint,
        specs: &[ForwardSpec],
    ) -> Vec<(ForwardSpec, ForwardOutcome)> {
        let serial = endpoint.serial();
        let mut outcomes = Vec::with_capacity(specs.len());

        for spec in specs {
            let outcome = match self
                .bridge
                .add_reverse_forward(&serial, spec.remote, spec.local)
                .await
            {
                Ok(()) => ForwardOutcome::Forwarded,
                Err(AdbError::ForwardConflict {
                    existing_local: Some(existing),
                    ..
                }) if existing == spec.local => ForwardOutcome::AlreadyForwarded,
                Err(e) => {
                    warn!("Reverse forward {} failed: {}", spec, e);
                    ForwardOutcome::Failed(e)
                }
            };
            info!("Reverse forward {}: {:?}", spec, outcome);
            outcomes.push((*spec, outcome));
        }

        outcomes
    }
}
