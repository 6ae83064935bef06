//! Schedulers: where deferred connect and disconnect decisions run.
//!
//! A [`Scheduler`] runs a one-shot task after a delay and hands back a
//! [`TaskHandle`] that cancels it. The trait is object safe so strategies can
//! hold any scheduler as a [`SchedulerRef`].
//!
//! - [`TestScheduler`]: virtual time for deterministic tests.
//! - `LocalScheduler` (feature `tokio-scheduler`): tokio `spawn_local` timers.

use std::{cell::Cell, rc::Rc};

pub use std::time::Duration;

use crate::subscription::Subscription;

#[cfg(feature = "tokio-scheduler")]
mod local_scheduler;
mod test_scheduler;

#[cfg(feature = "tokio-scheduler")]
pub use local_scheduler::LocalScheduler;
pub use test_scheduler::TestScheduler;

/// Runs deferred one-shot tasks.
pub trait Scheduler {
  /// Run `task` once `delay` has elapsed. Cancelling the returned handle
  /// before the task starts prevents it from running.
  fn schedule(&self, task: Box<dyn FnOnce()>, delay: Duration) -> TaskHandle;
}

pub type SchedulerRef = Rc<dyn Scheduler>;

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
  fn schedule(&self, task: Box<dyn FnOnce()>, delay: Duration) -> TaskHandle {
    (**self).schedule(task, delay)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TaskStatus {
  Pending,
  Finished,
  Cancelled,
}

/// Handle to a scheduled task.
///
/// Closed once the task has run or has been cancelled.
#[derive(Clone)]
pub struct TaskHandle {
  status: Rc<Cell<TaskStatus>>,
  #[cfg(feature = "tokio-scheduler")]
  abort: Option<futures::future::AbortHandle>,
}

impl TaskHandle {
  pub fn new() -> Self {
    TaskHandle {
      status: Rc::new(Cell::new(TaskStatus::Pending)),
      #[cfg(feature = "tokio-scheduler")]
      abort: None,
    }
  }

  #[cfg(feature = "tokio-scheduler")]
  pub(crate) fn with_abort(abort: futures::future::AbortHandle) -> Self {
    TaskHandle { abort: Some(abort), ..Self::new() }
  }

  /// Record that the task ran to the end.
  pub fn mark_finished(&self) {
    if self.status.get() == TaskStatus::Pending {
      self.status.set(TaskStatus::Finished);
    }
  }

  pub fn is_finished(&self) -> bool { self.status.get() == TaskStatus::Finished }

  pub fn is_cancelled(&self) -> bool { self.status.get() == TaskStatus::Cancelled }
}

impl Default for TaskHandle {
  fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskHandle")
      .field("status", &self.status.get())
      .finish()
  }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    if self.status.get() != TaskStatus::Pending {
      return;
    }
    self.status.set(TaskStatus::Cancelled);
    #[cfg(feature = "tokio-scheduler")]
    if let Some(abort) = self.abort {
      abort.abort();
    }
  }

  fn is_closed(&self) -> bool { self.status.get() != TaskStatus::Pending }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxshare_macro::test]
  fn handle_lifecycle() {
    let handle = TaskHandle::new();
    assert!(!handle.is_closed());
    handle.mark_finished();
    assert!(handle.is_finished());
    handle.clone().unsubscribe();
    assert!(!handle.is_cancelled());

    let handle = TaskHandle::new();
    handle.clone().unsubscribe();
    handle.mark_finished();
    assert!(handle.is_cancelled());
    assert!(handle.is_closed());
  }
}
