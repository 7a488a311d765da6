//! Ctrl-C handling: the first interrupt cancels the batch, the second exits.

use std::thread;
use stockfetch_core::data::CancelToken;
use tracing::{info, warn};

use crate::report::EXIT_INTERRUPTED;

/// Watch for Ctrl-C on a helper thread running a small signal-only runtime.
///
/// The first signal sets `cancel`, letting in-flight tickers finish while the
/// rest are skipped. A second signal exits immediately.
pub fn install(cancel: CancelToken) {
    let spawned = thread::Builder::new()
        .name("stockfetch-signal".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!(error = %e, "could not start signal runtime; Ctrl-C will abort immediately");
                    return;
                }
            };

            runtime.block_on(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                info!("interrupt received, finishing in-flight tickers");
                eprintln!("\nInterrupted: finishing the current ticker, skipping the rest (Ctrl-C again to quit now)");
                cancel.cancel();

                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\nAborted.");
                    std::process::exit(EXIT_INTERRUPTED);
                }
            });
        });

    if let Err(e) = spawned {
        warn!(error = %e, "could not spawn signal watcher");
    }
}
