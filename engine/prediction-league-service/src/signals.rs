//! Signal handling for graceful shutdown

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Resolve once Ctrl+C (SIGINT) or SIGTERM is received
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let terminate = Arc::new(AtomicBool::new(false));

    // Handle SIGTERM (Unix only)
    #[cfg(unix)]
    {
        use signal_hook::consts::SIGTERM;
        signal_hook::flag::register(SIGTERM, terminate.clone())?;
    }

    tokio::spawn(async move {
        let sigterm = async {
            let mut poll = tokio::time::interval(Duration::from_millis(100));
            while !terminate.load(Ordering::Relaxed) {
                poll.tick().await;
            }
        };

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C signal: {}", e);
                    return;
                }
                info!("Ctrl+C signal received");
            }
            _ = sigterm => {
                info!("SIGTERM signal received");
            }
        }

        let _ = shutdown_tx.send(());
    });

    Ok(shutdown_rx)
}
