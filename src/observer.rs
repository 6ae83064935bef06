//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. `error` and `complete` consume the observer, so at most one
/// terminal notification can ever be delivered.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  fn error(self, err: Err);

  /// Handle completion of the observable
  fn complete(self);

  /// Returns `true` if the observer is closed and will not accept more values.
  ///
  /// Sources use this to stop emitting early.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Helper trait to enable object-safe Observers (`Box<dyn Observer>`)
///
/// `Observer` is not object-safe because terminal methods take `self` by
/// value. DynObserver mirrors the interface but adapts it for vtables.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { self.error(err); }
  fn box_complete(self: Box<Self>) { self.complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// Boxed observer. Every producer in this crate receives its observer in this
/// form so that channels can hold heterogeneous observers.
pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err>>;

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Observer built from a single `next` closure.
///
/// Errors and completion are ignored; use [`ObserverAll`] to observe them.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item, Err> Observer<Item, Err> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn error(self, _err: Err) {}

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer built from `next`, `error` and `complete` closures.
#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> ObserverAll<N, E, C> {
  #[inline]
  pub fn new(next: N, error: E, complete: C) -> Self { ObserverAll { next, error, complete } }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline]
  fn error(self, err: Err) { (self.error)(err); }

  #[inline]
  fn complete(self) { (self.complete)(); }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Option observer - None ignores all events, Some delegates to inner
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().map_or(true, Observer::is_closed) }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  struct TestObserver {
    values: Vec<i32>,
  }

  impl Observer<i32, ()> for TestObserver {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn error(self, _: ()) {}

    fn complete(self) {}

    fn is_closed(&self) -> bool { false }
  }

  #[rxshare_macro::test]
  fn test_observer_trait() {
    let mut obs = TestObserver { values: vec![] };
    obs.next(1);
    obs.next(2);
    assert_eq!(obs.values, vec![1, 2]);
    assert!(!obs.is_closed());
  }

  #[rxshare_macro::test]
  fn test_boxed_observer_delegates_terminal() {
    let log = Rc::new(RefCell::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    let mut boxed: BoxedObserver<i32, ()> = Box::new(ObserverAll::new(
      move |v: i32| n.borrow_mut().push(v),
      |_: ()| {},
      move || c.borrow_mut().push(-1),
    ));
    boxed.next(7);
    boxed.complete();
    assert_eq!(*log.borrow(), vec![7, -1]);
  }

  #[rxshare_macro::test]
  fn test_none_observer_is_closed() {
    let none: Option<FnMutObserver<fn(i32)>> = None;
    assert!(Observer::<i32, ()>::is_closed(&none));
  }
}
