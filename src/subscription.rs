//! Subscriptions: handles that stop an observable from delivering events.
//!
//! [`LocalSubscription`] is the composite used throughout the crate. It owns a
//! list of teardowns that run once, on the first `unsubscribe`. A teardown
//! added to an already closed subscription runs immediately, which is what
//! lets callers register cleanup after a synchronous producer has already
//! finished.

use std::{
  any::Any,
  fmt::{Debug, Formatter},
};

use smallvec::SmallVec;

use crate::rc::MutRc;

mod connection;
pub use connection::ConnectionHandle;

/// Subscription returned from `Observable::subscribe` to allow unsubscribing.
pub trait Subscription {
  /// Stop receiving events. Releasing an already closed subscription is a
  /// no-op.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;
}

/// A subscription with nothing to release. Used by producers that finish
/// synchronously.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<T: Subscription> Subscription for Option<T> {
  fn unsubscribe(self) {
    if let Some(inner) = self {
      inner.unsubscribe()
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().map_or(true, Subscription::is_closed) }
}

type Teardown = Box<dyn FnOnce()>;

#[derive(Default)]
struct Inner {
  closed: bool,
  teardown: SmallVec<[Teardown; 2]>,
}

#[derive(Clone, Default)]
pub struct LocalSubscription(MutRc<Inner>);

impl LocalSubscription {
  pub fn new() -> Self { Self::default() }

  /// Release `subscription` together with this one.
  pub fn add<S: Subscription + 'static>(&self, subscription: S) {
    if !self.is_same(&subscription) {
      self.add_teardown(move || subscription.unsubscribe());
    }
  }

  /// Register a closure to run on unsubscribe. Runs it right away when this
  /// subscription is already closed.
  pub fn add_teardown<F: FnOnce() + 'static>(&self, f: F) {
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      f();
    } else {
      inner.teardown.push(Box::new(f));
    }
  }

  pub fn teardown_size(&self) -> usize { self.0.rc_deref().teardown.len() }

  fn is_same(&self, other: &dyn Any) -> bool {
    other
      .downcast_ref::<Self>()
      .is_some_and(|other| self.0.ptr_eq(&other.0))
  }
}

impl Subscription for LocalSubscription {
  fn unsubscribe(self) {
    let teardown = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    for f in teardown {
      f();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl Debug for LocalSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.rc_deref();
    f.debug_struct("LocalSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// Implements `must_use` to prevent immediate drop.
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(Some(subscription)) }

  /// Give the subscription back without unsubscribing it.
  pub fn release(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe()
    }
  }
}
