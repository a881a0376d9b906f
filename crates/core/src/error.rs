//! Error types for the RTSP test server.

use std::path::PathBuf;

/// Failures while loading a single configuration layer.
///
/// These never escape [`crate::config::resolve_from`]: the resolver logs them
/// and decides whether to keep going (see the module docs there).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document has a syntax error.
    #[error("{message}. {}:{line}", .path.display())]
    Parse {
        path: PathBuf,
        /// 1-based line of the offending token.
        line: usize,
        message: String,
    },
}

/// Startup failures that prevent the server from ever serving.
///
/// Every variant is fatal: the binary logs it and exits non-zero before
/// entering the event loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The media engine failed to initialise.
    #[error("media engine initialisation failed: {0}")]
    Init(String),

    /// The server did not hand out a mount point registry.
    #[error("fail to create mount points")]
    MountPointsUnavailable,

    /// The server could not be attached to the main context (port in use, ...).
    #[error("fail to attach rtsp server: {0}")]
    Attach(String),

    /// Installing a signal disposition failed.
    #[error("cannot install handler for {signal}: {source}")]
    Signal {
        signal: nix::sys::signal::Signal,
        #[source]
        source: nix::Error,
    },
}

/// Convenience alias for `Result<T, ServerError>`.
pub type Result<T> = std::result::Result<T, ServerError>;
