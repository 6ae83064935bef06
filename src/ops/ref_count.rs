//! Make a connectable producer behave like an ordinary one and automate the
//! way it is connected.
//!
//! Every subscription attaches to the connectable's channel and is counted by
//! a [`RefCountGate`]; the strategy decides when the connectable's own
//! `connect()` is called and when the returned connection is cancelled:
//!
//! - `default_ref_count`: classic ref counting.
//! - `no_ref_count`: connect on first use and never disconnect.
//! - `scheduled_ref_count`: ref counting with decisions run on a scheduler.
//! - `delayed_ref_count`: disconnect only after the count stayed at zero for
//!   a while.
//!
//! The channel belongs to the connectable, so the reuse half of the strategy
//! has no effect here.
use crate::{
  connectable::Connect,
  observable::Observable,
  observer::BoxedObserver,
  strategy::{RefCountGate, ShareStrategy},
  subscriber::Subscriber,
  subscription::{ConnectionHandle, LocalSubscription},
};

pub struct RefCount<S> {
  source: S,
  gate: RefCountGate<CapabilityConnector<S>>,
}

impl<S: Clone> Clone for RefCount<S> {
  fn clone(&self) -> Self { RefCount { source: self.source.clone(), gate: self.gate.clone() } }
}

impl<S: Clone> RefCount<S> {
  pub(crate) fn new(source: S, strategy: ShareStrategy) -> Self {
    let connector = CapabilityConnector(source.clone());
    RefCount { source, gate: RefCountGate::new(connector, strategy) }
  }
}

impl<S> RefCount<S> {
  /// Number of attached consumers.
  pub fn ref_count(&self) -> usize { self.gate.count() }

  pub fn is_connected(&self) -> bool { self.gate.is_connected() }
}

impl<S> Observable for RefCount<S>
where
  S: Observable + Clone + 'static,
  S::Item: 'static,
  S::Err: 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: BoxedObserver<S::Item, S::Err>) -> Self::Unsub {
    let subscription = LocalSubscription::new();
    // The consumer's terminal event closes `subscription`, which counts it out.
    let consumer = Subscriber::new(observer, subscription.clone());
    let unsub = self.source.actual_subscribe(Box::new(consumer));
    subscription.add(unsub);
    self.gate.attach(&subscription);
    subscription
  }
}

/// Connects through the wrapped producer's connect capability.
pub struct CapabilityConnector<S>(S);

impl<S: Clone> Clone for CapabilityConnector<S> {
  fn clone(&self) -> Self { CapabilityConnector(self.0.clone()) }
}

impl<S: Observable> Connect for CapabilityConnector<S> {
  fn connect(&self) -> ConnectionHandle {
    self
      .0
      .connect_capability()
      .map_or(ConnectionHandle::CLOSED, Connect::connect)
  }

  fn is_connected(&self) -> bool { self.0.connect_capability().is_some_and(Connect::is_connected) }
}
