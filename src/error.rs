//! Error types for the hddtempd daemon.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while discovering drives or serving reports.
#[derive(Debug, Error)]
pub enum Error {
    /// Device-management service unreachable or returned a malformed
    /// response. Fatal at startup: no partial fleet is acceptable.
    #[error("device service: {0}")]
    Discovery(String),

    /// Hardware-monitor file vanished or became unreadable after it was
    /// detected at discovery.
    #[error("sensor read {path}: {source}")]
    SensorRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Property or power-state query against the device service failed.
    #[error("remote query: {0}")]
    RemoteQuery(#[from] zbus::Error),

    /// A required property was absent or had an unexpected type.
    #[error("property {name} missing or malformed on {interface}")]
    Property {
        interface: &'static str,
        name: &'static str,
    },

    /// The stable device symlink for a drive's WWN did not resolve.
    #[error("device path {path} cannot be resolved: {source}")]
    DevicePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed daemon configuration, rejected before any report is served.
    #[error("invalid configuration: {0}")]
    Protocol(String),

    /// A single drive's report computation exceeded its deadline.
    #[error("report timed out for {0}")]
    Timeout(String),
}
