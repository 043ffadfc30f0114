//! Single-slot delayed task holder.

use std::{
    future::Future,
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tokio::{runtime::Handle, task::JoinHandle};

/// Holds at most one pending delayed task.
///
/// Scheduling a new task aborts the previous one if its delay has not elapsed
/// yet. Once the delay elapses the task is detached onto the runtime and can
/// no longer be cancelled.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    runtime: Handle,
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Must be called from within a tokio runtime.
    pub fn new(delay: Duration) -> Self {
        Self::with_handle(delay, Handle::current())
    }

    pub fn with_handle(delay: Duration, runtime: Handle) -> Self {
        Self { delay, runtime, slot: Mutex::new(None) }
    }

    /// Run `task` after the quiet period, replacing whatever was pending.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let runtime = self.runtime.clone();
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            runtime.spawn(task);
        });

        let previous = self.slot.lock().unwrap_or_else(PoisonError::into_inner).replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drop the pending task. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        let pending = self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        match pending {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(timer) = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            timer.abort();
        }
    }
}
