//! Error types for netfleet.
//!
//! Transport, channel, driver and platform errors describe what went wrong on
//! the wire. [`DeviceError`] is the per-device classification recorded in a
//! batch report; [`InventoryError`] and [`ReportError`] are the only errors
//! that end a run.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netfleet operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Transport layer errors (SSH connection, negotiation, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// The algorithm policy left nothing to offer for a category
    #[error("No {category} algorithm left after applying the algorithm policy")]
    NoAllowedAlgorithm { category: &'static str },

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts (strict mode)
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host presented a different key than the one recorded
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Failed to acquire target privilege level
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Unknown privilege level detected
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },

    /// No path found between privilege levels
    #[error("No path from privilege '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// No platform registered under this name
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// A platform with this name is already registered
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Why a single device did not reach `Succeeded`.
///
/// Every variant is data in the batch report, never a reason to stop the
/// batch. `EmptyConfiguration` is a warning: the runner skips submission and
/// still reports the device as succeeded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("algorithm negotiation failed: {0}")]
    Negotiation(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("template '{template}' failed to render: {message}")]
    TemplateRender { template: String, message: String },

    #[error("rendering produced no commands")]
    EmptyConfiguration,

    #[error("command '{command}' rejected: {message}")]
    CommandRejected { command: String, message: String },

    #[error("applied but not saved: {0}")]
    SaveFailed(String),

    #[error("discovery output could not be parsed: {0}")]
    Discovery(String),

    #[error("cancelled by operator")]
    Cancelled,
}

impl DeviceError {
    /// Short taxonomy name used in report banners and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AuthenticationError",
            Self::Negotiation(_) => "NegotiationError",
            Self::Timeout(_) => "TimeoutError",
            Self::Network(_) => "NetworkError",
            Self::TemplateRender { .. } => "TemplateRenderError",
            Self::EmptyConfiguration => "EmptyConfigurationError",
            Self::CommandRejected { .. } => "CommandRejectedError",
            Self::SaveFailed(_) => "SaveFailedError",
            Self::Discovery(_) => "DiscoveryError",
            Self::Cancelled => "CancelledError",
        }
    }

    fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::AuthenticationFailed { .. } | TransportError::Key(_) => {
                Self::Authentication(err.to_string())
            }
            TransportError::Timeout(d) => Self::Timeout(d),
            TransportError::NoAllowedAlgorithm { .. } => Self::Negotiation(err.to_string()),
            TransportError::Ssh(e) => Self::from_ssh(e),
            other => Self::Network(other.to_string()),
        }
    }

    fn from_ssh(err: russh::Error) -> Self {
        match err {
            russh::Error::NoCommonAlgo { .. } => Self::Negotiation(err.to_string()),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<Error> for DeviceError {
    fn from(err: Error) -> Self {
        match err {
            Error::Transport(e) => Self::from_transport(e),
            Error::Channel(ChannelError::PatternTimeout(d)) => Self::Timeout(d),
            Error::Driver(e @ DriverError::PrivilegeAcquisitionFailed { .. }) => {
                Self::Authentication(e.to_string())
            }
            other => Self::Network(other.to_string()),
        }
    }
}

/// Errors loading the inventory document.
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("failed to read inventory {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse inventory: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid inventory: {0}")]
    Invalid(String),

    #[error("failed to load templates from {dir}: {message}")]
    Templates { dir: PathBuf, message: String },
}

/// The report artifact could not be produced.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("cannot write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias using netfleet's Error.
pub type Result<T> = std::result::Result<T, Error>;
