//! Test Scheduler for deterministic testing of time-based strategies.
//!
//! Provides virtual time that only advances when explicitly instructed,
//! enabling deterministic testing of `delayed_ref_count` and
//! `scheduled_ref_count`.
//!
//! # Usage
//!
//! ```rust
//! use rxshare::prelude::*;
//!
//! // Initialize the test scheduler (required before use)
//! TestScheduler::init();
//!
//! let shared = of(42).share(ShareStrategy::scheduled_ref_count(TestScheduler));
//! shared.subscribe(|v| println!("{v}"));
//!
//! // Nothing has connected yet: the connect decision is queued.
//! TestScheduler::flush();
//! ```
//!
//! # Thread Safety
//!
//! TestScheduler uses thread-local storage, so each thread has its own
//! independent virtual time and task queue. This keeps tests isolated when
//! they run in parallel.

use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap};

use super::{Duration, Scheduler, TaskHandle};
use crate::subscription::Subscription;

// ==================== Internal State ====================

struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
  initialized: bool,
}

impl Default for TestSchedulerState {
  fn default() -> Self {
    Self {
      virtual_time: Duration::ZERO,
      task_queue: BinaryHeap::new(),
      next_task_id: 0,
      initialized: false,
    }
  }
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  task: Box<dyn FnOnce()>,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

thread_local! {
  static TEST_SCHEDULER_STATE: RefCell<TestSchedulerState>
    = RefCell::new(TestSchedulerState::default());
}

// ==================== TestScheduler ====================

/// A virtual time scheduler for deterministic testing.
///
/// This is a zero-sized type that accesses thread-local state.
/// All instances in the same thread share the same virtual time and task queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestScheduler;

impl TestScheduler {
  /// Initialize or reset the test scheduler state.
  ///
  /// This method must be called at the start of each test to ensure clean
  /// state. It resets the virtual time to zero, clears the task queue, and
  /// resets the task ID counter.
  ///
  /// # Panics
  ///
  /// Other methods will panic if `init()` has not been called first.
  pub fn init() {
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      state.virtual_time = Duration::ZERO;
      state.task_queue.clear();
      state.next_task_id = 0;
      state.initialized = true;
    });
  }

  fn ensure_initialized() {
    TEST_SCHEDULER_STATE.with(|state| {
      assert!(
        state.borrow().initialized,
        "TestScheduler::init() must be called before using the scheduler"
      );
    });
  }

  /// Get the current virtual time.
  ///
  /// # Panics
  ///
  /// Panics if `init()` has not been called first.
  pub fn now() -> Duration {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| state.borrow().virtual_time)
  }

  /// Number of queued tasks, cancelled ones included until they are reached.
  pub fn pending_count() -> usize {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| state.borrow().task_queue.len())
  }

  pub fn is_empty() -> bool {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| state.borrow().task_queue.is_empty())
  }

  fn execute_tasks_until(target_time: Option<Duration>) {
    loop {
      let task = TEST_SCHEDULER_STATE.with(|state| {
        let mut state = state.borrow_mut();
        let due = state
          .task_queue
          .peek()
          .is_some_and(|peek| target_time.map_or(true, |limit| peek.scheduled_time <= limit));
        if !due {
          return None;
        }
        let scheduled_task = state.task_queue.pop()?;
        state.virtual_time = scheduled_task.scheduled_time;
        Some(scheduled_task)
      });

      let Some(ScheduledTask { task, handle, .. }) = task else {
        break;
      };

      // The state borrow is released: the task may schedule more work.
      if !handle.is_closed() {
        task();
        handle.mark_finished();
      }
    }
  }

  /// Advance virtual time by the specified duration and execute due tasks.
  ///
  /// Tasks are executed in order of their scheduled time, with FIFO ordering
  /// for tasks scheduled at the same time. Tasks scheduled by a running task
  /// are picked up in the same call when they fall due.
  ///
  /// # Panics
  ///
  /// Panics if `init()` has not been called first.
  pub fn advance_by(duration: Duration) {
    Self::ensure_initialized();
    let target_time = TEST_SCHEDULER_STATE.with(|state| state.borrow().virtual_time + duration);

    Self::execute_tasks_until(Some(target_time));

    TEST_SCHEDULER_STATE.with(|state| {
      state.borrow_mut().virtual_time = target_time;
    });
  }

  /// Execute all pending tasks by advancing time to each task's scheduled time.
  ///
  /// # Panics
  ///
  /// Panics if `init()` has not been called first.
  pub fn flush() {
    Self::ensure_initialized();
    Self::execute_tasks_until(None);
  }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, task: Box<dyn FnOnce()>, delay: Duration) -> TaskHandle {
    TestScheduler::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      let scheduled_time = state.virtual_time + delay;
      let task_id = state.next_task_id;
      state.next_task_id += 1;

      let handle = TaskHandle::new();
      state.task_queue.push(ScheduledTask {
        scheduled_time,
        task_id,
        task,
        handle: handle.clone(),
      });
      handle
    })
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, mem, rc::Rc};

  use super::*;

  fn record(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Box<dyn FnOnce()> {
    let log = log.clone();
    Box::new(move || log.borrow_mut().push(name))
  }

  #[rxshare_macro::test]
  fn test_zero_sized_and_copy() {
    assert_eq!(mem::size_of::<TestScheduler>(), 0);
    let s1 = TestScheduler;
    let _s2 = s1;
    let _s3 = s1;
  }

  #[rxshare_macro::test]
  fn test_init_and_reset() {
    TestScheduler::init();
    TestScheduler::advance_by(Duration::from_millis(100));
    assert_eq!(TestScheduler::now(), Duration::from_millis(100));

    TestScheduler::init();
    assert_eq!(TestScheduler::now(), Duration::ZERO);
    assert!(TestScheduler::is_empty());
  }

  #[cfg(not(target_arch = "wasm32"))]
  #[rxshare_macro::test]
  #[should_panic(expected = "TestScheduler::init() must be called")]
  fn test_panics_without_init() {
    TEST_SCHEDULER_STATE.with(|s| s.borrow_mut().initialized = false);
    TestScheduler::now();
  }

  #[rxshare_macro::test]
  fn test_ordering_by_time_then_fifo() {
    TestScheduler::init();
    let log = Rc::new(RefCell::new(vec![]));
    TestScheduler.schedule(record(&log, "late"), Duration::from_millis(20));
    TestScheduler.schedule(record(&log, "first"), Duration::from_millis(10));
    TestScheduler.schedule(record(&log, "second"), Duration::from_millis(10));
    assert_eq!(TestScheduler::pending_count(), 3);

    TestScheduler::advance_by(Duration::from_millis(10));
    assert_eq!(*log.borrow(), vec!["first", "second"]);
    assert_eq!(TestScheduler::now(), Duration::from_millis(10));

    TestScheduler::flush();
    assert_eq!(*log.borrow(), vec!["first", "second", "late"]);
    assert_eq!(TestScheduler::now(), Duration::from_millis(20));
  }

  #[rxshare_macro::test]
  fn test_cancelled_task_is_skipped() {
    TestScheduler::init();
    let log = Rc::new(RefCell::new(vec![]));
    let handle = TestScheduler.schedule(record(&log, "cancelled"), Duration::ZERO);
    let kept = TestScheduler.schedule(record(&log, "kept"), Duration::ZERO);
    handle.clone().unsubscribe();

    TestScheduler::flush();
    assert_eq!(*log.borrow(), vec!["kept"]);
    assert!(handle.is_cancelled());
    assert!(kept.is_finished());
  }

  #[rxshare_macro::test]
  fn test_task_scheduling_more_work() {
    TestScheduler::init();
    let log = Rc::new(RefCell::new(vec![]));
    let inner = record(&log, "inner");
    let l = log.clone();
    TestScheduler.schedule(
      Box::new(move || {
        l.borrow_mut().push("outer");
        TestScheduler.schedule(inner, Duration::from_millis(5));
      }),
      Duration::from_millis(5),
    );

    TestScheduler::advance_by(Duration::from_millis(10));
    assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    assert!(TestScheduler::is_empty());
  }
}
