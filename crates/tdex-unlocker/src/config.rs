//! Unlocker configuration and flag validation.

use crate::error::UnlockerError;
use clap::Parser;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Default daemon RPC address.
pub const DEFAULT_RPC_ADDRESS: &str = "localhost:9000";

/// Default provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Default `is_ready` polling interval, in seconds.
pub const DEFAULT_INTERVAL_SECS: i64 = 5;

/// Source of the wallet password (and optional TLS certificate).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    /// Secrets read from files on disk.
    File,
}

impl ProviderKind {
    /// Every supported provider.
    pub const ALL: [ProviderKind; 1] = [ProviderKind::File];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::File => "file",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnlockerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(UnlockerError::InvalidConfig(
                "provider must not be null".to_string(),
            ));
        }
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = ProviderKind::ALL.iter().map(|k| k.as_str()).collect();
                UnlockerError::InvalidConfig(format!(
                    "unknown provider '{}', must be one of [{}]",
                    s,
                    known.join(",")
                ))
            })
    }
}

/// Command line flags.
#[derive(Parser, Debug, Clone)]
#[command(name = "tdex-unlockerd")]
#[command(about = "Unlock the TDEX daemon wallet as soon as it is initialized")]
pub struct Args {
    /// Daemon's RPC address in the form host:port
    #[arg(long = "rpc-address", default_value = DEFAULT_RPC_ADDRESS)]
    pub rpc_address: String,

    /// Provider from where to source password and possibly TLS certificate
    #[arg(long, default_value = DEFAULT_PROVIDER)]
    pub provider: String,

    /// Interval in seconds to poll the daemon's IsReady RPC
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS, allow_negative_numbers = true)]
    pub interval: i64,
}

/// Validated unlocker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockerConfig {
    /// Daemon RPC host (empty means localhost).
    pub host: String,
    /// Daemon RPC port.
    pub port: u16,
    /// Secret provider.
    pub provider: ProviderKind,
    /// Polling interval.
    pub interval: Duration,
}

impl Default for UnlockerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            provider: ProviderKind::File,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS as u64),
        }
    }
}

impl UnlockerConfig {
    /// Validate raw flags.
    pub fn from_args(args: &Args) -> Result<Self, UnlockerError> {
        let (host, port) = parse_rpc_address(&args.rpc_address)?;
        let provider = args.provider.parse()?;

        if args.interval <= 0 {
            return Err(UnlockerError::InvalidConfig(
                "interval must be a positive number".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            provider,
            interval: Duration::from_secs(args.interval as u64),
        })
    }

    /// `host:port` with an empty host resolved to localhost.
    pub fn rpc_address(&self) -> String {
        let host = if self.host.is_empty() {
            "localhost"
        } else {
            &self.host
        };
        format!("{}:{}", host, self.port)
    }
}

/// Split and check `host:port`.
///
/// The host must be empty, `localhost`, or an IP address; the port must be
/// above 1024.
pub fn parse_rpc_address(address: &str) -> Result<(String, u16), UnlockerError> {
    if address.is_empty() {
        return Err(UnlockerError::InvalidConfig(
            "rpc-address must not be null".to_string(),
        ));
    }

    let (host, port) = match address.split(':').collect::<Vec<_>>().as_slice() {
        [host, port] => (host.to_string(), *port),
        _ => {
            return Err(UnlockerError::InvalidConfig(
                "rpc-address must be a valid address in the form host:port".to_string(),
            ))
        }
    };

    if !host.is_empty() && host != "localhost" && host.parse::<IpAddr>().is_err() {
        return Err(UnlockerError::InvalidConfig(
            "rpc-address host is invalid".to_string(),
        ));
    }

    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p > 1024)
        .ok_or_else(|| UnlockerError::InvalidConfig("rpc-address port is invalid".to_string()))?;

    Ok((host, port))
}
