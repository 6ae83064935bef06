//! The producer side of the reactive model.
//!
//! An [`Observable`] pushes values into one observer per subscription.
//! Subscribing consumes the observable, so a cold producer is cloned to be
//! subscribed again, and every clone restarts its work.

use crate::{
  connectable::{as_connectable, Connect, ConnectableObservable},
  error::CapabilityError,
  observer::{BoxedObserver, FnMutObserver, Observer, ObserverAll},
  ops::{ref_count::RefCount, share_with::ShareWith},
  strategy::ShareStrategy,
  subject::{BroadcastChannel, Subject},
  subscription::Subscription,
};

mod create;
mod from_iter;
mod trivial;

pub use create::*;
pub use from_iter::*;
pub use trivial::*;

pub trait Observable: Sized {
  type Item;
  type Err;
  type Unsub: Subscription + 'static;

  /// Attach `observer` and start producing. Everything else in this trait
  /// funnels into this method.
  fn actual_subscribe(self, observer: BoxedObserver<Self::Item, Self::Err>) -> Self::Unsub;

  /// The connect capability of this producer, if it has one.
  ///
  /// Connectable producers override this to return themselves; every other
  /// producer keeps the `None` default.
  fn connect_capability(&self) -> Option<&dyn Connect> { None }

  /// Subscribe with a `next` callback only.
  fn subscribe<N>(self, next: N) -> Self::Unsub
  where
    N: FnMut(Self::Item) + 'static,
  {
    self.actual_subscribe(Box::new(FnMutObserver(next)))
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Self::Unsub
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
    C: FnOnce() + 'static,
  {
    self.actual_subscribe(Box::new(ObserverAll::new(next, error, complete)))
  }

  fn subscribe_with<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    self.actual_subscribe(Box::new(observer))
  }

  /// Share one execution of this producer among many consumers through a
  /// [`Subject`] created per connection cycle.
  ///
  /// See [`share_with`](Observable::share_with).
  fn share(
    self, strategy: ShareStrategy,
  ) -> ShareWith<Self, Subject<Self::Item, Self::Err>, fn() -> Subject<Self::Item, Self::Err>>
  where
    Self: Clone + 'static,
    Self::Item: Clone + 'static,
    Self::Err: Clone + 'static,
  {
    self.share_with(strategy, Subject::new as fn() -> _)
  }

  /// Share one execution of this producer among many consumers.
  ///
  /// Consumers attach to a broadcast channel built by `factory`. `strategy`
  /// decides when the producer is connected to that channel, when it is
  /// disconnected, and whether the channel survives the end of a bridge.
  ///
  /// ```rust
  /// use std::{cell::RefCell, rc::Rc};
  ///
  /// use rxshare::prelude::*;
  ///
  /// let shared = from_iter([1, 2, 3]).share_with(ShareStrategy::limited_ref_count(2), || {
  ///   Subject::<i32, ()>::replay(3)
  /// });
  ///
  /// let seen = Rc::new(RefCell::new(vec![]));
  /// let s = seen.clone();
  /// shared.clone().subscribe(move |v| s.borrow_mut().push(v));
  /// assert!(seen.borrow().is_empty());
  ///
  /// // The second consumer reaches the limit and connects the producer.
  /// shared.subscribe(|_| {});
  /// assert_eq!(*seen.borrow(), vec![1, 2, 3]);
  /// ```
  fn share_with<C, F>(self, strategy: ShareStrategy, factory: F) -> ShareWith<Self, C, F>
  where
    Self: Clone + 'static,
    C: BroadcastChannel<Self::Item, Self::Err>,
    F: Fn() -> C + 'static,
  {
    ShareWith::new(self, strategy, factory)
  }

  /// A connectable producer that multicasts through a fresh [`Subject`].
  fn publish(self) -> ConnectableObservable<Self, Subject<Self::Item, Self::Err>>
  where
    Self::Item: Clone + 'static,
    Self::Err: Clone + 'static,
  {
    ConnectableObservable::new(self, Subject::new())
  }

  /// A connectable producer that multicasts through `channel`.
  fn multicast<C>(self, channel: C) -> ConnectableObservable<Self, C>
  where
    C: BroadcastChannel<Self::Item, Self::Err>,
  {
    ConnectableObservable::new(self, channel)
  }

  /// Drive this connectable producer's `connect` with `strategy`.
  ///
  /// Fails with [`CapabilityError`] when the producer has no connect
  /// capability.
  fn ref_count_with(self, strategy: ShareStrategy) -> Result<RefCount<Self>, CapabilityError>
  where
    Self: Clone + 'static,
  {
    as_connectable(self).map(|source| RefCount::new(source, strategy))
  }
}
