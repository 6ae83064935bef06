//! Sharing strategies.
//!
//! A [`ShareStrategy`] is plain data with two halves:
//!
//! - **timing**: when the shared producer is connected to its channel and
//!   when the connection is cancelled. Each strategy expresses this as pure
//!   step functions over a [`RefCounter`]; the [`RefCountGate`] performs the
//!   resulting steps.
//! - **reuse**: [`ShareStrategy::should_reuse`] decides, once a bridge ends,
//!   whether the channel is kept for the next consumers or dropped.
//!
//! | strategy | timing | reuse |
//! |---|---|---|
//! | [`default_ref_count`](ShareStrategy::default_ref_count) | connect on 0→1, cancel on 1→0 | never |
//! | [`no_ref_count`](ShareStrategy::no_ref_count) | connect once, never cancel | never |
//! | [`limited_ref_count`](ShareStrategy::limited_ref_count) | connect at `limit`, cancel below it | always |
//! | [`delayed_ref_count`](ShareStrategy::delayed_ref_count) | cancel `duration` after the count hits 0 | completed and shared |
//! | [`scheduled_ref_count`](ShareStrategy::scheduled_ref_count) | like default, decided on a scheduler | completed and shared |

use std::{
  fmt::{Debug, Formatter},
  rc::Rc,
};

use crate::{
  scheduler::{Duration, Scheduler, SchedulerRef, TaskHandle},
  subscription::{ConnectionHandle, Subscription},
};

mod default_ref_count;
mod delayed_ref_count;
pub(crate) mod gate;
mod limited_ref_count;
mod no_ref_count;
mod scheduled_ref_count;

pub use default_ref_count::DefaultRefCount;
pub use delayed_ref_count::DelayedRefCount;
pub use gate::RefCountGate;
pub use limited_ref_count::LimitedRefCount;
pub use no_ref_count::NoRefCount;
pub use scheduled_ref_count::ScheduledRefCount;

/// How the most recent bridge ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClosingKind {
  /// Still running, or cancelled before the producer terminated.
  #[default]
  None,
  Completed,
  Errored,
}

/// Input of the reuse decision.
#[derive(Debug)]
pub struct ReuseState<'a, C> {
  pub kind: ClosingKind,
  /// `true` when the bridge ended by itself (the producer terminated),
  /// `false` when its handle was cancelled.
  pub shared: bool,
  pub channel: &'a C,
}

/// The strategy handed to [`Observable::share_with`](crate::observable::Observable::share_with).
#[derive(Clone)]
pub enum ShareStrategy {
  Default(DefaultRefCount),
  NoRefCount(NoRefCount),
  Limited(LimitedRefCount),
  Delayed(DelayedRefCount),
  Scheduled(ScheduledRefCount),
}

impl ShareStrategy {
  pub fn default_ref_count() -> Self { ShareStrategy::Default(DefaultRefCount) }

  pub fn no_ref_count() -> Self { ShareStrategy::NoRefCount(NoRefCount) }

  /// Connect once `limit` consumers are attached. A limit of 0 behaves as 1.
  pub fn limited_ref_count(limit: usize) -> Self {
    ShareStrategy::Limited(LimitedRefCount::new(limit))
  }

  pub fn delayed_ref_count(duration: Duration, scheduler: impl Scheduler + 'static) -> Self {
    ShareStrategy::Delayed(DelayedRefCount::new(duration, Rc::new(scheduler)))
  }

  pub fn scheduled_ref_count(scheduler: impl Scheduler + 'static) -> Self {
    ShareStrategy::Scheduled(ScheduledRefCount::new(Rc::new(scheduler)))
  }

  /// Whether the channel survives the bridge that just ended.
  pub fn should_reuse<C>(&self, state: &ReuseState<'_, C>) -> bool {
    match self {
      ShareStrategy::Default(_) | ShareStrategy::NoRefCount(_) => false,
      ShareStrategy::Limited(_) => true,
      ShareStrategy::Delayed(_) | ShareStrategy::Scheduled(_) => {
        state.shared && state.kind == ClosingKind::Completed
      }
    }
  }

  pub(crate) fn on_attach(&self, counter: &mut RefCounter) -> Step {
    match self {
      ShareStrategy::Default(s) => s.on_attach(counter),
      ShareStrategy::NoRefCount(s) => s.on_attach(counter),
      ShareStrategy::Limited(s) => s.on_attach(counter),
      ShareStrategy::Delayed(s) => s.on_attach(counter),
      ShareStrategy::Scheduled(s) => s.on_attach(counter),
    }
  }

  pub(crate) fn on_detach(&self, counter: &mut RefCounter) -> Step {
    match self {
      ShareStrategy::Default(s) => s.on_detach(counter),
      ShareStrategy::NoRefCount(s) => s.on_detach(counter),
      ShareStrategy::Limited(s) => s.on_detach(counter),
      ShareStrategy::Delayed(s) => s.on_detach(counter),
      ShareStrategy::Scheduled(s) => s.on_detach(counter),
    }
  }

  pub(crate) fn on_deferred(&self, task: Deferred, counter: &mut RefCounter) -> Step {
    match self {
      ShareStrategy::Delayed(s) => s.on_deferred(task, counter),
      ShareStrategy::Scheduled(s) => s.on_deferred(task, counter),
      ShareStrategy::Default(_) | ShareStrategy::NoRefCount(_) | ShareStrategy::Limited(_) => {
        Step::Idle
      }
    }
  }

  /// Whether a connection that just came up should be kept.
  pub(crate) fn keeps_connection(&self, counter: &RefCounter) -> bool {
    match self {
      ShareStrategy::Default(_) | ShareStrategy::Scheduled(_) => counter.count > 0,
      ShareStrategy::NoRefCount(_) | ShareStrategy::Delayed(_) => true,
      ShareStrategy::Limited(s) => counter.count >= s.limit(),
    }
  }
}

impl Default for ShareStrategy {
  fn default() -> Self { Self::default_ref_count() }
}

impl Debug for ShareStrategy {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ShareStrategy::Default(_) => f.write_str("DefaultRefCount"),
      ShareStrategy::NoRefCount(_) => f.write_str("NoRefCount"),
      ShareStrategy::Limited(s) => f.debug_struct("LimitedRefCount").field("limit", &s.limit()).finish(),
      ShareStrategy::Delayed(s) => f
        .debug_struct("DelayedRefCount")
        .field("duration", &s.duration())
        .finish_non_exhaustive(),
      ShareStrategy::Scheduled(_) => f.debug_struct("ScheduledRefCount").finish_non_exhaustive(),
    }
  }
}

/// Running state of one gate: attached consumers, the live connection and
/// the pending deferred cancellation.
#[derive(Debug, Default)]
pub struct RefCounter {
  count: usize,
  connection: ConnectionHandle,
  pending: Option<TaskHandle>,
}

impl RefCounter {
  #[inline]
  pub fn count(&self) -> usize { self.count }

  #[inline]
  pub fn is_connected(&self) -> bool { !self.connection.is_closed() }

  pub(crate) fn increment(&mut self) { self.count += 1; }

  pub(crate) fn decrement(&mut self) {
    debug_assert!(self.count > 0, "ref count decremented below zero");
    self.count = self.count.saturating_sub(1);
  }

  pub(crate) fn take_connection(&mut self) -> ConnectionHandle { self.connection.take() }

  pub(crate) fn set_connection(&mut self, handle: ConnectionHandle) { self.connection = handle; }

  pub(crate) fn set_pending(&mut self, task: TaskHandle) { self.pending = Some(task); }

  pub(crate) fn clear_pending(&mut self) { self.pending = None; }

  pub(crate) fn cancel_pending(&mut self) {
    if let Some(task) = self.pending.take() {
      task.unsubscribe();
    }
  }

  pub fn has_pending(&self) -> bool { self.pending.as_ref().is_some_and(|t| !t.is_closed()) }
}

/// Work deferred onto a scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Deferred {
  Connect,
  Disconnect,
}

/// What the gate does after a counter update.
pub(crate) enum Step {
  Idle,
  Connect,
  Disconnect(ConnectionHandle),
  Defer { task: Deferred, delay: Duration, scheduler: SchedulerRef },
}

impl Debug for Step {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Step::Idle => f.write_str("Idle"),
      Step::Connect => f.write_str("Connect"),
      Step::Disconnect(handle) => f.debug_tuple("Disconnect").field(handle).finish(),
      Step::Defer { task, delay, .. } => {
        f.debug_struct("Defer").field("task", task).field("delay", delay).finish_non_exhaustive()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{prelude::*, subscription::LocalSubscription};

  fn reuse(strategy: &ShareStrategy, kind: ClosingKind, shared: bool) -> bool {
    let channel = ();
    strategy.should_reuse(&ReuseState { kind, shared, channel: &channel })
  }

  #[rxshare_macro::test]
  fn reuse_predicates() {
    TestScheduler::init();
    let kinds = [ClosingKind::None, ClosingKind::Completed, ClosingKind::Errored];
    for kind in kinds {
      for shared in [false, true] {
        assert!(!reuse(&ShareStrategy::default_ref_count(), kind, shared));
        assert!(!reuse(&ShareStrategy::no_ref_count(), kind, shared));
        assert!(reuse(&ShareStrategy::limited_ref_count(2), kind, shared));
      }
    }

    let delayed = ShareStrategy::delayed_ref_count(Duration::from_millis(5), TestScheduler);
    let scheduled = ShareStrategy::scheduled_ref_count(TestScheduler);
    for strategy in [&delayed, &scheduled] {
      assert!(reuse(strategy, ClosingKind::Completed, true));
      assert!(!reuse(strategy, ClosingKind::Completed, false));
      assert!(!reuse(strategy, ClosingKind::Errored, true));
      assert!(!reuse(strategy, ClosingKind::None, false));
    }
  }

  #[rxshare_macro::test]
  fn counter_never_goes_negative() {
    let mut counter = RefCounter::default();
    counter.increment();
    counter.decrement();
    assert_eq!(counter.count(), 0);
    assert!(!counter.is_connected());
  }

  #[rxshare_macro::test]
  fn counter_connection() {
    let mut counter = RefCounter::default();
    counter.set_connection(ConnectionHandle::new(LocalSubscription::new()));
    assert!(counter.is_connected());
    let handle = counter.take_connection();
    assert!(!counter.is_connected());
    assert!(!handle.is_closed());
  }

  #[rxshare_macro::test]
  fn debug_names_the_strategy() {
    assert_eq!(format!("{:?}", ShareStrategy::default()), "DefaultRefCount");
    assert_eq!(
      format!("{:?}", ShareStrategy::limited_ref_count(3)),
      "LimitedRefCount { limit: 3 }"
    );
  }
}
