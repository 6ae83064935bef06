use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
};

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error.
/// Stops early once the observer is closed.
///
/// # Examples
///
/// ```
/// use rxshare::prelude::*;
///
/// from_iter(0..10).subscribe(|v| println!("{},", v));
/// ```
pub fn from_iter<Iter>(iter: Iter) -> ObservableIter<Iter>
where
  Iter: IntoIterator,
{
  ObservableIter(iter)
}

#[derive(Clone)]
pub struct ObservableIter<Iter>(Iter);

impl<Iter> Observable for ObservableIter<Iter>
where
  Iter: IntoIterator,
{
  type Item = Iter::Item;
  type Err = ();
  type Unsub = ();

  fn actual_subscribe(self, mut observer: BoxedObserver<Iter::Item, ()>) -> Self::Unsub {
    for v in self.0 {
      if observer.is_closed() {
        return;
      }
      observer.next(v);
    }
    observer.complete();
  }
}

/// Creates an observable producing a single value.
///
/// Completes immediately after emitting the value given. Never emits an error.
pub fn of<Item>(v: Item) -> Of<Item> { Of(v) }

#[derive(Clone)]
pub struct Of<Item>(Item);

impl<Item> Observable for Of<Item> {
  type Item = Item;
  type Err = ();
  type Unsub = ();

  fn actual_subscribe(self, mut observer: BoxedObserver<Item, ()>) -> Self::Unsub {
    observer.next(self.0);
    observer.complete();
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxshare_macro::test]
  fn emits_all_then_completes() {
    let log = Rc::new(RefCell::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    from_iter(vec![1, 2, 3]).subscribe_all(
      move |v| n.borrow_mut().push(v),
      |_| {},
      move || c.borrow_mut().push(0),
    );
    assert_eq!(*log.borrow(), vec![1, 2, 3, 0]);
  }

  #[rxshare_macro::test]
  fn of_single_value() {
    let hits = Rc::new(RefCell::new(vec![]));
    let h = hits.clone();
    of("a").subscribe(move |v| h.borrow_mut().push(v));
    assert_eq!(*hits.borrow(), vec!["a"]);
  }
}
