use super::{RefCounter, Step};

/// Connect when the first consumer attaches, cancel when the last one
/// detaches. Every cycle gets a fresh channel and a fresh producer run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultRefCount;

impl DefaultRefCount {
  pub(crate) fn on_attach(&self, counter: &mut RefCounter) -> Step {
    counter.increment();
    if counter.count() == 1 { Step::Connect } else { Step::Idle }
  }

  pub(crate) fn on_detach(&self, counter: &mut RefCounter) -> Step {
    counter.decrement();
    if counter.count() == 0 { Step::Disconnect(counter.take_connection()) } else { Step::Idle }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::{ConnectionHandle, LocalSubscription, Subscription};

  #[rxshare_macro::test]
  fn connects_on_first_and_disconnects_on_last() {
    let strategy = DefaultRefCount;
    let mut counter = RefCounter::default();

    assert!(matches!(strategy.on_attach(&mut counter), Step::Connect));
    counter.set_connection(ConnectionHandle::new(LocalSubscription::new()));
    assert!(matches!(strategy.on_attach(&mut counter), Step::Idle));

    assert!(matches!(strategy.on_detach(&mut counter), Step::Idle));
    assert!(matches!(strategy.on_detach(&mut counter), Step::Disconnect(h) if !h.is_closed()));
    assert!(!counter.is_connected());
  }
}
