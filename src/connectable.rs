//! Connectable producers and the connect capability.
//!
//! A [`ConnectableObservable`] bridges a source producer with a broadcast
//! channel. Subscribing only attaches to the channel; the source runs once
//! [`Connect::connect`] is called, and one source execution is multicast to
//! every attached consumer.
//!
//! # Example
//!
//! ```rust
//! use rxshare::prelude::*;
//!
//! let connectable = from_iter([1, 2]).publish();
//!
//! connectable.fork().subscribe(|v| println!("Observer 1: {}", v));
//! connectable.fork().subscribe(|v| println!("Observer 2: {}", v));
//!
//! // Start execution
//! connectable.connect();
//! ```

use crate::{
  error::CapabilityError,
  observable::Observable,
  observer::BoxedObserver,
  rc::MutRc,
  subject::BroadcastChannel,
  subscriber::Subscriber,
  subscription::{ConnectionHandle, LocalSubscription, Subscription},
};

/// The connect capability: start bridging a producer into its channel.
pub trait Connect {
  /// Bridge the producer into its channel and return the bridge's handle.
  /// While connected, calling again returns the live handle and never starts
  /// a second bridge.
  fn connect(&self) -> ConnectionHandle;

  fn is_connected(&self) -> bool;
}

/// Check that `source` exposes the connect capability and hand it back
/// unchanged.
pub fn as_connectable<S: Observable>(source: S) -> Result<S, CapabilityError> {
  if source.connect_capability().is_some() {
    Ok(source)
  } else {
    Err(CapabilityError::of::<S>())
  }
}

/// A producer that only runs after an explicit `connect()`.
///
/// It holds a source and a channel. Subscribers listen to the channel, and
/// `connect()` subscribes the channel to the source. The connection closes
/// when the source terminates or the returned handle is cancelled.
pub struct ConnectableObservable<S, C> {
  source: S,
  channel: C,
  connection: MutRc<ConnectionHandle>,
}

impl<S, C> ConnectableObservable<S, C> {
  pub fn new(source: S, channel: C) -> Self {
    ConnectableObservable { source, channel, connection: MutRc::own(ConnectionHandle::CLOSED) }
  }
}

impl<S, C: Clone> ConnectableObservable<S, C> {
  /// A handle to the channel consumers attach to.
  pub fn fork(&self) -> C { self.channel.clone() }
}

impl<S: Clone, C: Clone> Clone for ConnectableObservable<S, C> {
  fn clone(&self) -> Self {
    ConnectableObservable {
      source: self.source.clone(),
      channel: self.channel.clone(),
      connection: self.connection.clone(),
    }
  }
}

impl<S, C> Connect for ConnectableObservable<S, C>
where
  S: Observable + Clone + 'static,
  S::Item: 'static,
  S::Err: 'static,
  C: BroadcastChannel<S::Item, S::Err>,
{
  fn connect(&self) -> ConnectionHandle {
    {
      let current = self.connection.rc_deref();
      if !current.is_closed() {
        return current.clone();
      }
    }
    if self.channel.is_stopped() {
      return ConnectionHandle::CLOSED;
    }

    let subscription = LocalSubscription::new();
    let handle = ConnectionHandle::new(subscription.clone());
    // Stored before the source runs so a re-entrant connect sees it.
    *self.connection.rc_deref_mut() = handle.clone();

    let bridge = Subscriber::new(self.channel.clone(), subscription.clone());
    let unsub = self.source.clone().actual_subscribe(Box::new(bridge));
    subscription.add(unsub);
    tracing::debug!(connected = !subscription.is_closed(), "connectable connected");
    handle
  }

  fn is_connected(&self) -> bool { !self.connection.rc_deref().is_closed() }
}

impl<S, C> Observable for ConnectableObservable<S, C>
where
  S: Observable + Clone + 'static,
  S::Item: 'static,
  S::Err: 'static,
  C: BroadcastChannel<S::Item, S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = C::Unsub;

  fn actual_subscribe(self, observer: BoxedObserver<S::Item, S::Err>) -> Self::Unsub {
    self.channel.actual_subscribe(observer)
  }

  fn connect_capability(&self) -> Option<&dyn Connect> { Some(self) }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::prelude::*;

  #[rxshare_macro::test]
  fn runs_source_only_on_connect() {
    let runs = Rc::new(RefCell::new(0));
    let r = runs.clone();
    let source = create(move |mut subscriber: Subscriber<BoxedObserver<i32, ()>>| {
      *r.borrow_mut() += 1;
      subscriber.next(1);
      subscriber.next(2);
      subscriber.complete();
    });
    let connectable = source.publish();

    let seen = Rc::new(RefCell::new(vec![]));
    let (a, b) = (seen.clone(), seen.clone());
    connectable.fork().subscribe(move |v| a.borrow_mut().push(v));
    connectable.clone().subscribe(move |v| b.borrow_mut().push(v * 10));
    assert_eq!(*runs.borrow(), 0);

    let handle = connectable.connect();
    assert_eq!(*runs.borrow(), 1);
    assert_eq!(*seen.borrow(), vec![1, 10, 2, 20]);
    assert!(handle.is_closed());
    assert!(!connectable.is_connected());

    // The channel is stopped: no second run.
    assert!(connectable.connect().is_closed());
    assert_eq!(*runs.borrow(), 1);
  }

  #[rxshare_macro::test]
  fn connect_is_idempotent_while_connected() {
    let source = Subject::<i32, ()>::new();
    let connectable = source.clone().publish();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    connectable.fork().subscribe(move |v| s.borrow_mut().push(v));

    let first = connectable.connect();
    let second = connectable.connect();
    assert!(connectable.is_connected());
    assert_eq!(source.observer_count(), 1);

    source.clone().next(1);
    assert_eq!(*seen.borrow(), vec![1]);

    second.unsubscribe();
    assert!(first.is_closed());
    assert!(!connectable.is_connected());
    source.clone().next(2);
    assert_eq!(*seen.borrow(), vec![1]);
  }

  #[rxshare_macro::test]
  fn capability_check() {
    let connectable = of(1).publish();
    assert!(as_connectable(connectable).is_ok());

    let err = as_connectable(of(1)).err();
    assert!(err.is_some_and(|e| e.producer().contains("Of")));
  }
}
