use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Token that is cancelled when the process receives SIGTERM or SIGINT.
///
/// The driver selects on this while waiting for the pool to drain, so an
/// operator can abandon the wait without the pool cancelling any in-flight
/// work. Handler installation failures are logged and leave the token
/// uncancelled.
pub fn drain_interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let guard = token.clone();

    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(()) => {
                tracing::info!("Interrupt received, abandoning drain wait");
                guard.cancel();
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install signal handlers");
            }
        }
    });

    token
}

async fn wait_for_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
    Ok(())
}
