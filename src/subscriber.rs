use crate::{
  observer::Observer,
  subscription::{LocalSubscription, Subscription},
};

/// An observer paired with the subscription that stops it.
///
/// Values are dropped once the subscription is closed. A terminal event is
/// forwarded first and then closes the subscription, so the producer's
/// teardowns run after every observer has seen the end of the stream.
pub struct Subscriber<O> {
  observer: Option<O>,
  subscription: LocalSubscription,
}

impl<O> Subscriber<O> {
  pub fn new(observer: O, subscription: LocalSubscription) -> Self {
    Subscriber { observer: Some(observer), subscription }
  }

  #[inline]
  pub fn subscription(&self) -> &LocalSubscription { &self.subscription }

  /// Shortcut for `self.subscription().add_teardown(f)`.
  pub fn add_teardown<F: FnOnce() + 'static>(&self, f: F) { self.subscription.add_teardown(f) }
}

impl<Item, Err, O> Observer<Item, Err> for Subscriber<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.subscription.is_closed() {
      return;
    }
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value)
    }
  }

  fn error(mut self, err: Err) {
    if !self.subscription.is_closed() {
      if let Some(observer) = self.observer.take() {
        observer.error(err);
      }
    }
    self.subscription.unsubscribe();
  }

  fn complete(mut self) {
    if !self.subscription.is_closed() {
      if let Some(observer) = self.observer.take() {
        observer.complete();
      }
    }
    self.subscription.unsubscribe();
  }

  fn is_closed(&self) -> bool {
    self.subscription.is_closed() || self.observer.as_ref().map_or(true, Observer::is_closed)
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::observer::ObserverAll;

  #[rxshare_macro::test]
  fn terminal_event_closes_subscription() {
    let log = Rc::new(RefCell::new(vec![]));
    let subscription = LocalSubscription::new();
    let l = log.clone();
    subscription.add_teardown(move || l.borrow_mut().push("teardown"));

    let (n, c) = (log.clone(), log.clone());
    let mut subscriber = Subscriber::new(
      ObserverAll::new(move |_: i32| n.borrow_mut().push("next"), |_: ()| {}, move || {
        c.borrow_mut().push("complete")
      }),
      subscription.clone(),
    );
    subscriber.next(1);
    Observer::<i32, ()>::complete(subscriber);

    assert_eq!(*log.borrow(), vec!["next", "complete", "teardown"]);
    assert!(subscription.is_closed());
  }

  #[rxshare_macro::test]
  fn closed_subscriber_drops_values() {
    let seen = Rc::new(RefCell::new(vec![]));
    let subscription = LocalSubscription::new();
    let s = seen.clone();
    let mut subscriber = Subscriber::new(
      crate::observer::FnMutObserver(move |v: i32| s.borrow_mut().push(v)),
      subscription.clone(),
    );
    Observer::<i32, ()>::next(&mut subscriber, 1);
    subscription.unsubscribe();
    Observer::<i32, ()>::next(&mut subscriber, 2);
    assert!(Observer::<i32, ()>::is_closed(&subscriber));
    assert_eq!(*seen.borrow(), vec![1]);
  }
}
