//! Fatal-at-startup error taxonomy.
//!
//! Everything here terminates the process (spec.md §7: "Configuration
//! error" and "Endpoint error" are the only fatal tiers). Every other
//! failure tier — admission, protocol, authorization, pairing timeout,
//! transport — is handled locally at its unit of work via `tracing` and
//! never constructed as a `RelayError`.

use std::path::PathBuf;

use thiserror::Error;

/// An error that prevents the relay from starting at all.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0} must be set to a non-empty project identifier")]
    MissingProjectId(&'static str),

    #[error("{var} must be a positive integer number of seconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },

    #[error("failed to create parent directory {path:?} for the relay socket")]
    SocketDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind relay socket at {path:?}")]
    SocketBind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set permissions on relay socket at {path:?}")]
    SocketPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
