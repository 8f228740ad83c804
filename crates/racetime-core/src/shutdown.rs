//! Process signal handling.
//!
//! Ctrl-C and (on unix) SIGTERM cancel a shared [`CancellationToken`]. The
//! poll loop and the HTTP server both watch that token.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Wait for a termination signal, then cancel `token`.
///
/// Also returns, without waiting for a signal, if `token` is cancelled by
/// someone else.
pub async fn listen(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
        () = token.cancelled() => return,
    }

    token.cancel();
}

/// Spawn [`listen`] on the current runtime.
pub fn spawn_listener(token: &CancellationToken) -> JoinHandle<()> {
    tokio::spawn(listen(token.clone()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn listener_returns_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let handle = spawn_listener(&token);

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
