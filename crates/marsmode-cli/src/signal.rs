//! SIGINT/SIGTERM handling.
//!
//! The delivery loop is synchronous, so signals are awaited on a dedicated
//! thread running a current-thread tokio runtime. Every signal sets the
//! shared [`ShutdownFlag`]; the loop notices it before its next iteration
//! and disconnects on the way out. Repeated signals never bypass that
//! cleanup.

use std::{future::Future, io, thread};

use marsmode_app::ShutdownFlag;
use tracing::{info, warn};

/// Start the signal thread.
///
/// # Errors
///
/// Returns an error if the runtime or the thread cannot be created.
pub fn spawn(flag: ShutdownFlag) -> io::Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    thread::Builder::new()
        .name("marsmode-signal".to_string())
        .spawn(move || runtime.block_on(relay(flag, shutdown_signal)))
}

/// Request shutdown on every signal `next` yields, until it fails.
async fn relay<F, Fut>(flag: ShutdownFlag, mut next: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    loop {
        if let Err(e) = next().await {
            warn!(error = %e, "signal handler failed");
            return;
        }
        if flag.is_requested() {
            info!("shutdown already requested, waiting for the current iteration");
        } else {
            info!("shutdown requested, finishing current iteration");
        }
        flag.request();
    }
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeated_signals_only_request_shutdown() {
        let flag = ShutdownFlag::new();
        let mut delivered = 0;

        relay(flag.clone(), || {
            delivered += 1;
            let result = if delivered <= 3 { Ok(()) } else { Err(io::Error::other("listener closed")) };
            async move { result }
        })
        .await;

        assert_eq!(delivered, 4);
        assert!(flag.is_requested());
    }
}
