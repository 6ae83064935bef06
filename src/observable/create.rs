use std::marker::PhantomData;

use crate::{
  observable::Observable,
  observer::BoxedObserver,
  subscriber::Subscriber,
  subscription::LocalSubscription,
};

/// Creates an observable from a function that drives a [`Subscriber`].
///
/// The function runs once per subscription. It may emit synchronously, keep
/// the subscriber somewhere to emit later, and register cleanup with
/// [`Subscriber::add_teardown`]; the cleanup runs when the subscription ends.
///
/// # Examples
///
/// ```
/// use rxshare::prelude::*;
///
/// create(|mut subscriber: Subscriber<BoxedObserver<i32, ()>>| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
/// })
/// .subscribe(|v| println!("{v}"));
/// ```
pub fn create<F, Item, Err>(subscribe: F) -> Create<F, Item, Err>
where
  F: FnOnce(Subscriber<BoxedObserver<Item, Err>>),
{
  Create { func: subscribe, _marker: PhantomData }
}

pub struct Create<F, Item, Err> {
  func: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Create { func: self.func.clone(), _marker: PhantomData } }
}

impl<F, Item, Err> Observable for Create<F, Item, Err>
where
  F: FnOnce(Subscriber<BoxedObserver<Item, Err>>),
{
  type Item = Item;
  type Err = Err;
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: BoxedObserver<Item, Err>) -> Self::Unsub {
    let subscription = LocalSubscription::new();
    (self.func)(Subscriber::new(observer, subscription.clone()));
    subscription
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxshare_macro::test]
  fn emits_and_tears_down() {
    let log = Rc::new(RefCell::new(vec![]));
    let l = log.clone();
    let source = create(move |mut subscriber: Subscriber<BoxedObserver<i32, ()>>| {
      let l2 = l.clone();
      subscriber.add_teardown(move || l2.borrow_mut().push(-1));
      subscriber.next(1);
      subscriber.complete();
    });

    let n = log.clone();
    let subscription = source.subscribe(move |v| n.borrow_mut().push(v));
    assert_eq!(*log.borrow(), vec![1, -1]);
    assert!(subscription.is_closed());
  }

  #[rxshare_macro::test]
  fn unsubscribe_runs_teardown() {
    let stopped = Rc::new(RefCell::new(false));
    let keep = Rc::new(RefCell::new(None));
    let (s, k) = (stopped.clone(), keep.clone());
    let source = create(move |subscriber: Subscriber<BoxedObserver<i32, ()>>| {
      let s = s.clone();
      subscriber.add_teardown(move || *s.borrow_mut() = true);
      *k.borrow_mut() = Some(subscriber);
    });

    let subscription = source.subscribe(|_| {});
    assert!(!*stopped.borrow());
    subscription.unsubscribe();
    assert!(*stopped.borrow());

    let subscriber = keep.borrow_mut().take();
    assert!(subscriber.is_some_and(|s| s.is_closed()));
  }
}
