// Graceful shutdown handling for signal trapping
//
// Wires process signals to the batch control handle so an interrupted run
// still finishes its in-flight item and writes its reports.

use crate::batch::BatchHandle;
use anyhow::Result;

/// Register signal handlers that request a batch stop.
/// This sets up handlers for SIGINT (Ctrl+C), SIGTERM, and SIGHUP.
#[cfg(unix)]
pub fn register_signal_handlers(handle: BatchHandle) -> Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::thread;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
        .map_err(|e| anyhow::anyhow!("Failed to register signal handlers: {}", e))?;

    thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGINT => {
                    log::info!("Received SIGINT (Ctrl+C), finishing current item");
                    handle.stop();
                }
                SIGTERM => {
                    log::info!("Received SIGTERM, finishing current item");
                    handle.stop();
                }
                SIGHUP => {
                    log::info!("Received SIGHUP, finishing current item");
                    handle.stop();
                }
                _ => {}
            }
        }
    });

    log::info!("Signal handlers registered (SIGINT, SIGTERM, SIGHUP)");
    Ok(())
}

/// Register signal handlers for Windows
#[cfg(windows)]
pub fn register_signal_handlers(handle: BatchHandle) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, finishing current item");
        handle.stop();
    })
    .map_err(|e| anyhow::anyhow!("Failed to register Ctrl+C handler: {}", e))?;

    log::info!("Signal handler registered (Ctrl+C)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::batch::BatchHandle;

    #[test]
    fn test_stop_flag_visible_across_clones() {
        let handle = BatchHandle::new();
        let observer = handle.clone();
        assert!(!observer.is_stop_requested());
        handle.stop();
        assert!(observer.is_stop_requested());
    }

    #[test]
    fn test_pause_and_resume() {
        let handle = BatchHandle::new();
        handle.pause();
        assert!(handle.is_pause_requested());
        handle.resume();
        assert!(!handle.is_pause_requested());
    }
}
