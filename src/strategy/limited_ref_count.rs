use super::{RefCounter, Step};

/// Connect exactly when the `limit`-th consumer attaches and cancel as soon
/// as the count drops below `limit`. The channel is kept across crossings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitedRefCount {
  limit: usize,
}

impl LimitedRefCount {
  pub fn new(limit: usize) -> Self { LimitedRefCount { limit: limit.max(1) } }

  #[inline]
  pub fn limit(&self) -> usize { self.limit }

  pub(crate) fn on_attach(&self, counter: &mut RefCounter) -> Step {
    counter.increment();
    if counter.count() == self.limit { Step::Connect } else { Step::Idle }
  }

  pub(crate) fn on_detach(&self, counter: &mut RefCounter) -> Step {
    counter.decrement();
    if counter.count() < self.limit && counter.is_connected() {
      Step::Disconnect(counter.take_connection())
    } else {
      Step::Idle
    }
  }
}
