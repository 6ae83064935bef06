use super::{Deferred, RefCounter, ShareStrategy, Step};
use crate::{
  connectable::Connect,
  rc::MutRc,
  scheduler::TaskHandle,
  subscription::{LocalSubscription, Subscription},
};

#[derive(Default)]
struct GateState {
  counter: RefCounter,
  connecting: bool,
  reconnect: bool,
}

/// The timing operator: turns attach/detach events into `connect()` calls and
/// cancellations according to a [`ShareStrategy`].
///
/// The gate is the only caller of its connector's `connect()`. No borrow of
/// its state is held while connecting, cancelling or scheduling, so
/// producers may emit, terminate, or attach new consumers synchronously from
/// inside `connect()`.
pub struct RefCountGate<K> {
  connector: K,
  strategy: ShareStrategy,
  state: MutRc<GateState>,
}

impl<K: Clone> Clone for RefCountGate<K> {
  fn clone(&self) -> Self {
    RefCountGate {
      connector: self.connector.clone(),
      strategy: self.strategy.clone(),
      state: self.state.clone(),
    }
  }
}

impl<K> RefCountGate<K> {
  pub fn new(connector: K, strategy: ShareStrategy) -> Self {
    RefCountGate { connector, strategy, state: MutRc::own(GateState::default()) }
  }

  #[inline]
  pub fn strategy(&self) -> &ShareStrategy { &self.strategy }

  pub fn count(&self) -> usize { self.state.rc_deref().counter.count() }

  pub fn is_connected(&self) -> bool { self.state.rc_deref().counter.is_connected() }
}

impl<K: Connect + Clone + 'static> RefCountGate<K> {
  /// Count `subscription` in, then register its count-out on it.
  ///
  /// The count-out is registered after the count-in has been acted upon, so
  /// a consumer closed synchronously by the connect it triggered still
  /// leaves the count at zero, never below.
  pub fn attach(&self, subscription: &LocalSubscription) {
    let step = {
      let mut state = self.state.rc_deref_mut();
      let step = self.strategy.on_attach(&mut state.counter);
      tracing::trace!(count = state.counter.count(), ?step, "ref count attach");
      step
    };
    if let Some(task) = self.run(step) {
      subscription.add(task);
    }
    let gate = self.clone();
    subscription.add_teardown(move || gate.detach());
  }

  fn detach(&self) {
    let step = {
      let mut state = self.state.rc_deref_mut();
      let step = self.strategy.on_detach(&mut state.counter);
      tracing::trace!(count = state.counter.count(), ?step, "ref count detach");
      step
    };
    self.run(step);
  }

  fn fire(&self, task: Deferred) {
    let step = {
      let mut state = self.state.rc_deref_mut();
      self.strategy.on_deferred(task, &mut state.counter)
    };
    tracing::trace!(?task, ?step, "ref count deferred task");
    self.run(step);
  }

  /// Perform `step`. Returns the handle of a deferred connect, which belongs
  /// to the consumer that caused it.
  fn run(&self, step: Step) -> Option<TaskHandle> {
    match step {
      Step::Idle => None,
      Step::Connect => {
        self.establish();
        None
      }
      Step::Disconnect(handle) => {
        tracing::trace!(closed = handle.is_closed(), "ref count disconnect");
        handle.unsubscribe();
        None
      }
      Step::Defer { task, delay, scheduler } => {
        let gate = self.clone();
        let handle = scheduler.schedule(Box::new(move || gate.fire(task)), delay);
        match task {
          Deferred::Connect => Some(handle),
          Deferred::Disconnect => {
            if !handle.is_closed() {
              self.state.rc_deref_mut().counter.set_pending(handle);
            }
            None
          }
        }
      }
    }
  }

  fn establish(&self) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.connecting {
        state.reconnect = true;
        return;
      }
      state.connecting = true;
    }
    loop {
      let handle = self.connector.connect();
      let mut state = self.state.rc_deref_mut();
      let wanted = self.strategy.keeps_connection(&state.counter);
      let retry = std::mem::take(&mut state.reconnect);
      if wanted && !handle.is_closed() {
        state.counter.set_connection(handle);
        state.connecting = false;
        return;
      }
      if wanted && retry {
        // The bridge ended while it was coming up and a consumer asked for
        // a connection meanwhile.
        continue;
      }
      state.connecting = false;
      drop(state);
      handle.unsubscribe();
      return;
    }
  }
}
