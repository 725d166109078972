//! Debounced change scheduler.
//!
//! At most one trigger is outstanding. Each `schedule` aborts the previous
//! deferred task and arms a new one carrying a fresh [`TriggerToken`]; the
//! fire message is only honored if its token still matches.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default quiet period before a scheduled render fires.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(200);

/// Identifies one armed trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerToken(u64);

struct PendingTrigger<T> {
    token: TriggerToken,
    payload: T,
    task: JoinHandle<()>,
}

pub struct Scheduler<T> {
    window: Duration,
    generation: u64,
    pending: Option<PendingTrigger<T>>,
}

impl<T> Scheduler<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: 0,
            pending: None,
        }
    }

    /// Replace any outstanding trigger with a new one for `payload`.
    ///
    /// After the window elapses with no further call, `wrap(token)` is sent
    /// on `tx`. Must be called inside a tokio runtime.
    pub fn schedule<M>(&mut self, payload: T, tx: &mpsc::Sender<M>, wrap: fn(TriggerToken) -> M)
    where
        M: Send + 'static,
    {
        self.cancel();

        self.generation += 1;
        let token = TriggerToken(self.generation);
        let window = self.window;
        let tx = tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Receiver gone means the pipeline is shutting down.
            let _ = tx.send(wrap(token)).await;
        });

        self.pending = Some(PendingTrigger {
            token,
            payload,
            task,
        });
    }

    /// Claim the payload for a delivered fire. `None` if `token` was
    /// superseded or cancelled while the message was in flight.
    pub fn accept(&mut self, token: TriggerToken) -> Option<T> {
        if self.pending.as_ref().is_some_and(|p| p.token == token) {
            return self.pending.take().map(|p| p.payload);
        }
        crate::debug!("pipeline"; "dropping stale trigger {:?}", token);
        None
    }

    /// Drop the outstanding trigger, returning its payload.
    pub fn cancel(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        pending.task.abort();
        Some(pending.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl<T> Drop for Scheduler<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }
}
