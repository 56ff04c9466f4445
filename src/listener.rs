//! The Listener (binds the endpoint, accepts connections) and the Acceptor
//! (validates one connection's header and either pairs or queues it).

use std::fs;
use std::io;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::config::RelayConfig;
use crate::direction::Direction;
use crate::error::RelayError;
use crate::header;
use crate::pipe;
use crate::reaper;
use crate::registry::{PendingHalf, Registry};

/// Binds the relay's listening endpoint and drives its accept loop.
pub struct Listener {
    inner: UnixListener,
    registry: Arc<Registry>,
    config: Arc<RelayConfig>,
}

impl Listener {
    /// Cleans up a stale socket file, creates the parent directory (mode
    /// `0o755`), binds, and chmods the socket to `0o666` so an unprivileged
    /// in-container user can connect. Every failure here is fatal.
    pub fn bind(config: Arc<RelayConfig>, registry: Arc<Registry>) -> Result<Self, RelayError> {
        let path = &config.socket_path;

        create_parent_dir(path).map_err(|source| RelayError::SocketDirCreate {
            path: parent_of(path),
            source,
        })?;

        remove_stale_socket(path)
            .map_err(|source| RelayError::SocketBind { path: path.clone(), source })?;

        let inner = UnixListener::bind(path)
            .map_err(|source| RelayError::SocketBind { path: path.clone(), source })?;

        fs::set_permissions(path, fs::Permissions::from_mode(0o666))
            .map_err(|source| RelayError::SocketPermissions { path: path.clone(), source })?;

        tracing::info!(path = %path.display(), "listener-started");
        Ok(Self { inner, registry, config })
    }

    /// Spawns the Reaper, then accepts connections forever. An accept
    /// failure is logged and never fatal.
    pub async fn run(self) {
        let reaper_registry = Arc::clone(&self.registry);
        let pairing_budget = self.config.pairing_budget;
        let reaper_tick = self.config.reaper_tick;
        tokio::spawn(async move {
            reaper::run(reaper_registry, pairing_budget, reaper_tick).await;
        });

        loop {
            match self.inner.accept().await {
                Ok((stream, _peer_addr)) => {
                    let registry = Arc::clone(&self.registry);
                    let project_id = self.config.project_id.clone();
                    tokio::spawn(async move {
                        accept_one(stream, &registry, &project_id).await;
                    });
                }
                Err(error) => tracing::warn!(%error, "accept-error"),
            }
        }
    }
}

fn parent_of(path: &Path) -> std::path::PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn create_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::DirBuilder::new().recursive(true).mode(0o755).create(parent)
        }
        _ => Ok(()),
    }
}

fn remove_stale_socket(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}

/// Reads and validates one connection's header, then either pairs it with a
/// waiting peer or enqueues it in the registry. Returns only after one of
/// those two outcomes (or an early rejection) has happened; never retains
/// ownership past that point.
async fn accept_one(stream: UnixStream, registry: &Registry, project_id: &str) {
    let mut conn = BufReader::new(stream);
    let mut line = String::new();

    match conn.read_line(&mut line).await {
        Ok(0) => {
            tracing::debug!("connection closed before a header arrived");
            return;
        }
        Ok(_) if !line.ends_with('\n') => {
            // `read_line` returns `Ok(n)` with `n > 0` on EOF mid-line too;
            // a line with no trailing `\n` is a truncated header, not a
            // complete one, and must be treated the same as any other
            // failure to read a newline.
            tracing::warn!("connection closed before a complete header line arrived");
            return;
        }
        Ok(_) => {}
        Err(error) => {
            tracing::warn!(%error, "failed to read header line");
            return;
        }
    }

    let header = match header::parse(line.trim_end_matches(['\n', '\r'])) {
        Ok(header) => header,
        Err(error) => {
            tracing::warn!(%error, line = line.trim_end(), "malformed-header");
            return;
        }
    };

    if header.project_id != project_id {
        tracing::warn!(direction = %header.direction, "project-mismatch");
        return;
    }

    tracing::debug!(direction = %header.direction, "connection-received");

    let half = PendingHalf::new(conn, header.direction);
    match registry.offer_or_take(half) {
        Ok((this_half, peer_half)) => {
            let (upstream, downstream) = match this_half.direction {
                Direction::Upstream => (this_half, peer_half),
                Direction::Downstream => (peer_half, this_half),
                Direction::Unknown => unreachable!("header parsing never yields Unknown"),
            };
            tracing::info!("pair-formed");
            pipe::run(upstream, downstream).await;
        }
        Err(queue_len) => {
            tracing::debug!(queue_len, "queued");
        }
    }
}
