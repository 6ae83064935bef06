use super::{Deferred, RefCounter, Step};
use crate::scheduler::{Duration, SchedulerRef};

/// Keep the bridge alive for `duration` after the last consumer detaches.
///
/// Attaching while not connected connects right away. When the count hits
/// zero a cancellation is scheduled on `scheduler`; any attach or detach
/// before it fires supersedes it.
#[derive(Clone)]
pub struct DelayedRefCount {
  duration: Duration,
  scheduler: SchedulerRef,
}

impl DelayedRefCount {
  pub fn new(duration: Duration, scheduler: SchedulerRef) -> Self {
    DelayedRefCount { duration, scheduler }
  }

  #[inline]
  pub fn duration(&self) -> Duration { self.duration }

  pub(crate) fn on_attach(&self, counter: &mut RefCounter) -> Step {
    counter.increment();
    counter.cancel_pending();
    if counter.is_connected() { Step::Idle } else { Step::Connect }
  }

  pub(crate) fn on_detach(&self, counter: &mut RefCounter) -> Step {
    counter.decrement();
    counter.cancel_pending();
    if counter.count() == 0 {
      Step::Defer { task: Deferred::Disconnect, delay: self.duration, scheduler: self.scheduler.clone() }
    } else {
      Step::Idle
    }
  }

  pub(crate) fn on_deferred(&self, task: Deferred, counter: &mut RefCounter) -> Step {
    counter.clear_pending();
    match task {
      Deferred::Disconnect if counter.count() == 0 => Step::Disconnect(counter.take_connection()),
      _ => Step::Idle,
    }
  }
}
