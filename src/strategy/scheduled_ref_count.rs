use super::{Deferred, RefCounter, Step};
use crate::scheduler::{Duration, SchedulerRef};

/// Default ref counting whose connect and disconnect decisions run as tasks
/// on `scheduler` instead of inline.
///
/// Each task re-checks the count when it runs, so a subscribe followed by an
/// unsubscribe before the scheduler gets to run never starts the producer.
#[derive(Clone)]
pub struct ScheduledRefCount {
  scheduler: SchedulerRef,
}

impl ScheduledRefCount {
  pub fn new(scheduler: SchedulerRef) -> Self { ScheduledRefCount { scheduler } }

  fn defer(&self, task: Deferred) -> Step {
    Step::Defer { task, delay: Duration::ZERO, scheduler: self.scheduler.clone() }
  }

  pub(crate) fn on_attach(&self, counter: &mut RefCounter) -> Step {
    counter.increment();
    self.defer(Deferred::Connect)
  }

  pub(crate) fn on_detach(&self, counter: &mut RefCounter) -> Step {
    counter.decrement();
    self.defer(Deferred::Disconnect)
  }

  pub(crate) fn on_deferred(&self, task: Deferred, counter: &mut RefCounter) -> Step {
    match task {
      Deferred::Connect if counter.count() > 0 && !counter.is_connected() => Step::Connect,
      Deferred::Disconnect if counter.count() == 0 && counter.is_connected() => {
        Step::Disconnect(counter.take_connection())
      }
      _ => Step::Idle,
    }
  }
}
