use std::marker::PhantomData;

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subscription::LocalSubscription,
};

/// Creates an observable that emits no items, just terminates with an error.
pub fn throw_err<Err>(e: Err) -> ThrowErr<Err> { ThrowErr(e) }

#[derive(Clone)]
pub struct ThrowErr<Err>(Err);

impl<Err> Observable for ThrowErr<Err> {
  type Item = ();
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe(self, observer: BoxedObserver<(), Err>) -> Self::Unsub { observer.error(self.0) }
}

/// Creates an observable that produces no values.
///
/// Completes immediately. Never emits an error.
pub fn empty<Item>() -> Empty<Item> { Empty(PhantomData) }

pub struct Empty<Item>(PhantomData<fn() -> Item>);

impl<Item> Clone for Empty<Item> {
  fn clone(&self) -> Self { Empty(PhantomData) }
}

impl<Item> Observable for Empty<Item> {
  type Item = Item;
  type Err = ();
  type Unsub = ();

  fn actual_subscribe(self, observer: BoxedObserver<Item, ()>) -> Self::Unsub { observer.complete() }
}

/// Creates an observable that never emits anything and never terminates.
///
/// The returned subscription stays open until it is unsubscribed.
pub fn never<Item>() -> Never<Item> { Never(PhantomData) }

pub struct Never<Item>(PhantomData<fn() -> Item>);

impl<Item> Clone for Never<Item> {
  fn clone(&self) -> Self { Never(PhantomData) }
}

impl<Item: 'static> Observable for Never<Item> {
  type Item = Item;
  type Err = ();
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: BoxedObserver<Item, ()>) -> Self::Unsub {
    let subscription = LocalSubscription::new();
    subscription.add_teardown(move || drop(observer));
    subscription
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use crate::prelude::*;

  #[rxshare_macro::test]
  fn throw_err_errors() {
    let hit = Rc::new(Cell::new(None));
    let h = hit.clone();
    throw_err("boom").subscribe_all(|_| {}, move |e| h.set(Some(e)), || {});
    assert_eq!(hit.get(), Some("boom"));
  }

  #[rxshare_macro::test]
  fn empty_completes() {
    let hit = Rc::new(Cell::new(false));
    let h = hit.clone();
    empty::<i32>().subscribe_all(|_| {}, |_| {}, move || h.set(true));
    assert!(hit.get());
  }

  #[rxshare_macro::test]
  fn never_stays_open() {
    let hit = Rc::new(Cell::new(false));
    let h = hit.clone();
    let subscription = never::<i32>().subscribe_all(|_| {}, |_| {}, move || h.set(true));
    assert!(!subscription.is_closed());
    subscription.unsubscribe();
    assert!(!hit.get());
  }
}
