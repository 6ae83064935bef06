use futures::future::{AbortHandle, Abortable};

use super::{Duration, Scheduler, TaskHandle};
use crate::subscription::Subscription;

/// Runs tasks on the current thread's tokio `LocalSet`.
///
/// Must be used from inside `LocalSet::run_until` (or a task spawned on a
/// `LocalSet`), otherwise `spawn_local` panics. A zero delay yields once to the
/// runtime before running the task.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalScheduler;

impl Scheduler for LocalScheduler {
  fn schedule(&self, task: Box<dyn FnOnce()>, delay: Duration) -> TaskHandle {
    let (abort, registration) = AbortHandle::new_pair();
    let handle = TaskHandle::with_abort(abort);
    let finished = handle.clone();
    let fut = async move {
      if delay.is_zero() {
        tokio::task::yield_now().await;
      } else {
        tokio::time::sleep(delay).await;
      }
      if !finished.is_closed() {
        task();
        finished.mark_finished();
      }
    };
    tokio::task::spawn_local(Abortable::new(fut, registration));
    handle
  }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use super::*;

  #[rxshare_macro::test]
  async fn runs_after_delay() {
    let hit = Rc::new(Cell::new(false));
    let c = hit.clone();
    let handle = LocalScheduler.schedule(Box::new(move || c.set(true)), Duration::from_millis(5));
    assert!(!hit.get());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(hit.get());
    assert!(handle.is_finished());
  }

  #[rxshare_macro::test]
  async fn cancelled_task_never_runs() {
    let hit = Rc::new(Cell::new(false));
    let c = hit.clone();
    let handle = LocalScheduler.schedule(Box::new(move || c.set(true)), Duration::ZERO);
    handle.clone().unsubscribe();

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!hit.get());
    assert!(handle.is_cancelled());
  }
}
