//! Coinledger is a personal finance ledger served over a JSON HTTP API.
//!
//! It keeps accounts, transactions, transfers, recurring transactions, and
//! categories in an embedded SQLite database, and maintains one invariant
//! above all: an account's balance always equals its starting balance plus
//! the signed effect of every transaction recorded against it. Every
//! mutation that touches a balance runs inside a SQL transaction so the
//! ledger can never be caught halfway through an update.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod app_state;
mod category;
mod db;
mod endpoints;
mod error;
mod logging;
mod recurring;
mod routing;
mod sync;
mod transaction;
mod transfer;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::logging_middleware;
pub use recurring::{MaterializeOutcome, materialize_due};
pub use routing::build_router;
pub use sync::{SyncError, SyncEvent, SyncSink, TracingSink, run_sync_worker};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
