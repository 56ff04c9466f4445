//! `oubliette-relay`: an in-container Unix-domain-socket daemon that pairs
//! an upstream connection with a downstream connection bound for the same
//! project and pipes bytes between them until either side closes.
//!
//! See `SPEC_FULL.md` at the repository root for the full contract.

use std::sync::Arc;

use oubliette_relay::config::RelayConfig;
use oubliette_relay::listener::Listener;
use oubliette_relay::logging;
use oubliette_relay::registry::Registry;

#[tokio::main]
async fn main() {
    logging::init_tracing();

    let config = match RelayConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(error) => {
            tracing::error!(%error, "configuration-error");
            std::process::exit(1);
        }
    };

    let registry = Arc::new(Registry::new());

    let listener = match Listener::bind(Arc::clone(&config), registry) {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "endpoint-error");
            std::process::exit(1);
        }
    };

    let accept_loop = tokio::spawn(listener.run());

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("installing a SIGTERM handler should never fail");

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("received-sigterm");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received-sigint");
        }
        result = accept_loop => {
            // The accept loop runs forever in normal operation; only an
            // unexpected task panic reaches this arm.
            if let Err(error) = result {
                tracing::error!(%error, "accept-loop-task-failed");
                std::process::exit(1);
            }
        }
    }
}
