use super::{RefCounter, Step};

/// Connect the first time a consumer attaches while nothing is connected;
/// never cancel. The producer runs until it terminates by itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoRefCount;

impl NoRefCount {
  pub(crate) fn on_attach(&self, counter: &mut RefCounter) -> Step {
    counter.increment();
    if counter.is_connected() { Step::Idle } else { Step::Connect }
  }

  pub(crate) fn on_detach(&self, counter: &mut RefCounter) -> Step {
    counter.decrement();
    Step::Idle
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::{ConnectionHandle, LocalSubscription};

  #[rxshare_macro::test]
  fn never_disconnects() {
    let strategy = NoRefCount;
    let mut counter = RefCounter::default();

    assert!(matches!(strategy.on_attach(&mut counter), Step::Connect));
    counter.set_connection(ConnectionHandle::new(LocalSubscription::new()));
    assert!(matches!(strategy.on_detach(&mut counter), Step::Idle));
    assert_eq!(counter.count(), 0);
    assert!(counter.is_connected());

    // Still connected: a new consumer does not start a second bridge.
    assert!(matches!(strategy.on_attach(&mut counter), Step::Idle));
  }
}
