//! How an asynchronous wizard step decides it is done

use std::time::Duration;
use tokio::task::JoinHandle;

/// Simulated duration of the dependency install step
pub const DEPENDENCIES_DELAY: Duration = Duration::from_millis(2000);

/// Simulated duration of the scaffolding step
pub const SCAFFOLD_DELAY: Duration = Duration::from_millis(3500);

/// Completion signal for install/scaffold steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CompletionMode {
    /// Launch the work and consider it done after a fixed delay
    Timer,
    /// Wait for the work to finish and report its exit status
    Await,
}

/// A timer that fires a callback once, unless dropped first.
///
/// Dropping the guard before the delay elapses aborts the timer, so no
/// callback runs after the owning step has gone away.
pub struct TimerGuard {
    handle: JoinHandle<()>,
}

impl TimerGuard {
    pub fn start<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        Self { handle }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Wait for `delay`, holding a [`TimerGuard`] for the duration.
///
/// Returns `false` if the timer was cancelled before firing.
pub async fn wait_for_timer(delay: Duration) -> bool {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let _guard = TimerGuard::start(delay, move || {
        let _ = tx.send(());
    });
    rx.await.is_ok()
}
