//! # Retention Sweeper
//!
//! Background task that periodically asks the collector to prune aged
//! records. The task holds only a `Weak` reference back to the collector, so
//! dropping the collector ends the loop on its own; `stop` ends it promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::collector::ChannelMetricsCollector;

/// Lifecycle handle for the periodic sweep task
///
/// Start and stop serialize on the task mutex, so a stop issued right after
/// a start always sees the spawned handle.
#[derive(Debug)]
pub(crate) struct SweeperHandle {
    running: AtomicBool,
    shutdown: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SweeperHandle {
    pub(crate) fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            shutdown: Arc::new(Notify::new()),
            task: Mutex::new(None),
        }
    }

    /// Spawn the sweep loop unless one is already running
    pub(crate) fn start(&self, collector: Weak<ChannelMetricsCollector>) {
        let mut task = self.task.lock();
        if task.is_some() {
            debug!("Retention sweeper already running");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let shutdown = Arc::clone(&self.shutdown);
        *task = Some(tokio::spawn(run_sweep_loop(collector, shutdown)));
        info!("Retention sweeper started");
    }

    /// Stop the sweep loop; safe to call repeatedly or before `start`
    pub(crate) fn stop(&self) {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            self.shutdown.notify_waiters();
            handle.abort();
            self.running.store(false, Ordering::SeqCst);
            info!("Retention sweeper stopped");
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Sleep, sweep, repeat until shutdown or the collector goes away
///
/// The interval is re-read from the collector's configuration every cycle,
/// so `update_config` changes take effect from the next sleep onward. No
/// strong reference is held across an await.
async fn run_sweep_loop(collector: Weak<ChannelMetricsCollector>, shutdown: Arc<Notify>) {
    loop {
        let interval_seconds = match collector.upgrade() {
            Some(collector) => collector.get_config().sweep_interval_seconds,
            None => break,
        };

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(interval_seconds)) => {
                match collector.upgrade() {
                    Some(collector) => collector.sweep_now(),
                    None => break,
                }
            }
            _ = shutdown.notified() => break,
        }
    }
    debug!("Retention sweeper loop exited");
}
