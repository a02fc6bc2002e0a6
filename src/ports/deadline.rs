//! Bounded blocking calls into external ports.
//!
//! The call runs on a dedicated worker thread and the caller waits on a
//! one-slot channel. On timeout the worker is abandoned, not cancelled: it
//! keeps its thread until the call returns, and its result is dropped.
//! Command-backed ports are built with the same limit on their child
//! process, so their abandoned workers kill the child and exit shortly after.

use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::core::errors::{BevError, Result};

/// Run `call`, giving up after `timeout` when one is set.
///
/// Without a timeout the call runs inline on the current thread.
pub fn call_with_deadline<T, F>(port: &'static str, timeout: Option<Duration>, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let Some(timeout) = timeout else {
        return call();
    };

    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new()
        .name(format!("bevid-{port}"))
        .spawn(move || {
            // Receiver may be gone after a timeout.
            let _ = tx.send(call());
        })
        .map_err(|err| BevError::Runtime {
            details: format!("failed to spawn {port} worker: {err}"),
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(port, ?timeout, "port call timed out; abandoning worker");
            Err(BevError::PortTimeout {
                port,
                after: timeout,
            })
        }
        Err(RecvTimeoutError::Disconnected) => {
            tracing::warn!(port, "port worker exited without a result");
            Err(BevError::ChannelClosed { component: port })
        }
    }
}
