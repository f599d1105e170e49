use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `token` when the process receives SIGINT or SIGTERM
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(listen(token, wait_for_signal()))
}

/// Cancels `token` once `signal` yields a signal name. A `None` means no handler
/// could be installed, so only an explicit cancellation ends the wait.
async fn listen<F>(token: CancellationToken, signal: F)
where
    F: Future<Output = Option<&'static str>>,
{
    tokio::select! {
        Some(name) = signal => {
            log::info!("Received {}. Initiating graceful shutdown...", name);
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

/// Maps the outcome of waiting on a handler to the signal name, logging failed registrations
fn received(result: std::io::Result<()>, name: &'static str) -> Option<&'static str> {
    match result {
        Ok(()) => Some(name),
        Err(e) => {
            log::error!("❌ Could not listen for {}: {}", name, e);
            None
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> Option<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => tokio::select! {
            Some(name) = async { received(tokio::signal::ctrl_c().await, "SIGINT") } => Some(name),
            Some(()) = terminate.recv() => Some("SIGTERM"),
            else => None,
        },
        Err(e) => {
            log::error!("❌ Could not listen for SIGTERM: {}", e);
            received(tokio::signal::ctrl_c().await, "SIGINT")
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Option<&'static str> {
    received(tokio::signal::ctrl_c().await, "Ctrl-C")
}
