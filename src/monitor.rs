//! Background memory watchdog.
//!
//! A timer-driven thread probes process RSS and asks the indexer to
//! flush when the configured ceiling is exceeded. Backpressure is
//! advisory: transient overshoot is tolerated, and the probe degrades to
//! inert on platforms without a readable RSS.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use crate::indexer::Indexer;

/// Handle for the watchdog thread. Dropping it signals shutdown and
/// joins the thread.
#[derive(Debug)]
pub struct MemoryMonitor {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl MemoryMonitor {
    /// Spawn the watchdog for `indexer`, using the poll interval and
    /// memory ceiling from the indexer's options.
    #[must_use]
    pub fn spawn(indexer: Arc<Indexer>) -> Self {
        let (shutdown, signal) = bounded::<()>(1);
        let interval = indexer.options().monitor_poll_interval;
        let ceiling = indexer.options().memory_ceiling_bytes;

        let handle = std::thread::Builder::new()
            .name("phrasedex-memmon".to_string())
            .spawn(move || loop {
                match signal.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                let Some(rss) = process_rss_bytes() else {
                    tracing::debug!("process rss unavailable, monitor idle");
                    continue;
                };
                if rss <= ceiling {
                    continue;
                }

                tracing::info!(rss, ceiling, "memory ceiling exceeded, requesting flush");
                release_memory_pressure();
                if let Err(err) = indexer.flush() {
                    tracing::warn!(error = %err, "memory-pressure flush failed");
                }
            })
            .ok();

        if handle.is_none() {
            tracing::warn!("memory monitor thread failed to spawn");
        }
        Self { shutdown, handle }
    }
}

impl Drop for MemoryMonitor {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Reclamation hook invoked above the ceiling. Buffer memory returns to
/// the allocator as soon as a flush clears the accumulators, so there is
/// nothing further to release here.
fn release_memory_pressure() {}

/// Resident set size of the current process, if the platform exposes it.
#[cfg(target_os = "linux")]
#[must_use]
pub fn process_rss_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kib: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
            return Some(kib * 1024);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn process_rss_bytes() -> Option<u64> {
    None
}
