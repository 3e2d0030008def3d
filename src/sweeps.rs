//! Background sweeps.
//!
//! Named, independently cancellable interval tasks. The loop awaits each
//! sweep before arming the next tick, so runs never overlap; missed ticks
//! are delayed rather than bursted.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Handle to a running periodic sweep. Dropping the handle aborts the task,
/// so tearing down the owner cannot leak a timer.
pub struct SweepTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl SweepTask {
    /// Spawn a sweep running `f` every `period`. The first run happens one
    /// full period after startup.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        info!(sweep = name, period_secs = period.as_secs(), "sweep started");
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; skip the startup tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                debug!(sweep = name, "sweep run");
                f().await;
            }
        });
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stop(&self) {
        info!(sweep = self.name, "sweep stopped");
        self.handle.abort();
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
