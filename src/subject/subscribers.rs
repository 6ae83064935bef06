use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use smallvec::SmallVec;

use super::Terminal;
use crate::observer::{BoxedObserver, Observer};

/// One observer attached to a subject.
///
/// The observer sits behind its own cell so a broadcast can run without
/// holding the subject's state borrowed. `closed` is raised by unsubscribe
/// and by terminal events; a closed slot is skipped.
pub(crate) struct Slot<Item, Err> {
  observer: RefCell<Option<BoxedObserver<Item, Err>>>,
  closed: Cell<bool>,
  /// Terminal event raised while the observer was inside `next`.
  pending: Cell<Option<Terminal<Err>>>,
}

impl<Item, Err> Slot<Item, Err> {
  pub(crate) fn new(observer: BoxedObserver<Item, Err>) -> Self {
    Slot {
      observer: RefCell::new(Some(observer)),
      closed: Cell::new(false),
      pending: Cell::new(None),
    }
  }

  #[inline]
  pub(crate) fn is_closed(&self) -> bool { self.closed.get() }

  /// Close the slot and release its observer. When the observer is running
  /// right now it is released as soon as its `next` returns.
  pub(crate) fn close(&self) -> Option<BoxedObserver<Item, Err>> {
    self.closed.set(true);
    self
      .observer
      .try_borrow_mut()
      .ok()
      .and_then(|mut observer| observer.take())
  }

  /// Close the slot for a terminal event and hand back the observer that
  /// should receive it. An observer running `next` right now gets the event
  /// from [`Slot::next`] once that call returns.
  pub(crate) fn finish(
    &self, terminal: impl FnOnce() -> Terminal<Err>,
  ) -> Option<BoxedObserver<Item, Err>> {
    let was_closed = self.closed.replace(true);
    match self.observer.try_borrow_mut() {
      Ok(mut observer) => observer.take(),
      Err(_) => {
        if !was_closed {
          self.pending.set(Some(terminal()));
        }
        None
      }
    }
  }

  pub(crate) fn next(&self, value: Item) {
    if self.closed.get() {
      return;
    }
    {
      // A re-entrant emission to the observer that is currently running is
      // dropped for that observer.
      let Ok(mut observer) = self.observer.try_borrow_mut() else {
        return;
      };
      match observer.as_mut() {
        Some(observer) if !observer.is_closed() => observer.next(value),
        Some(_) => self.closed.set(true),
        None => {}
      }
    }
    if self.closed.get() {
      self.release();
    }
  }

  /// Deliver the terminal event deferred while `next` was running, or just
  /// drop the observer of a slot closed meanwhile.
  fn release(&self) {
    let observer = self
      .observer
      .try_borrow_mut()
      .ok()
      .and_then(|mut observer| observer.take());
    if let (Some(terminal), Some(observer)) = (self.pending.take(), observer) {
      terminal.deliver(observer);
    }
  }
}

/// Subscribers container with ID-based add/remove.
///
/// Broadcasting works on a snapshot of the slots taken with the subject
/// state borrowed, then released before any observer runs, so observers may
/// subscribe, unsubscribe or emit into the same subject.
pub(crate) struct Subscribers<Item, Err> {
  slots: SmallVec<[(usize, Rc<Slot<Item, Err>>); 2]>,
  next_id: usize,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { slots: SmallVec::new(), next_id: 0 } }
}

impl<Item, Err> Subscribers<Item, Err> {
  /// Add a slot and return its unique ID.
  pub(crate) fn add(&mut self, slot: Rc<Slot<Item, Err>>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.slots.push((id, slot));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<Rc<Slot<Item, Err>>> {
    let idx = self.slots.iter().position(|(slot_id, _)| *slot_id == id)?;
    Some(self.slots.remove(idx).1)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.slots.len() }

  pub(crate) fn snapshot(&self) -> SmallVec<[Rc<Slot<Item, Err>>; 2]> {
    self.slots.iter().map(|(_, slot)| slot.clone()).collect()
  }

  pub(crate) fn drain(&mut self) -> SmallVec<[Rc<Slot<Item, Err>>; 2]> {
    self.slots.drain(..).map(|(_, slot)| slot).collect()
  }
}

/// Send `value` to every slot. The value is cloned for all slots but the
/// last one, which receives the moved value.
pub(crate) fn broadcast_value<Item: Clone, Err>(slots: &[Rc<Slot<Item, Err>>], value: Item) {
  let mut iter = slots.iter().filter(|slot| !slot.is_closed()).peekable();
  while let Some(slot) = iter.next() {
    if iter.peek().is_some() {
      slot.next(value.clone());
    } else {
      slot.next(value);
      break;
    }
  }
}

pub(crate) fn broadcast_error<Item, Err: Clone>(slots: &[Rc<Slot<Item, Err>>], err: Err) {
  // Every slot is closed before the first observer hears about the error.
  let observers: SmallVec<[BoxedObserver<Item, Err>; 2]> = slots
    .iter()
    .filter_map(|slot| slot.finish(|| Terminal::Errored(err.clone())))
    .collect();
  let mut iter = observers.into_iter().peekable();
  while let Some(observer) = iter.next() {
    if iter.peek().is_some() {
      observer.error(err.clone());
    } else {
      observer.error(err);
      break;
    }
  }
}

pub(crate) fn broadcast_complete<Item, Err>(slots: &[Rc<Slot<Item, Err>>]) {
  let observers: SmallVec<[BoxedObserver<Item, Err>; 2]> =
    slots.iter().filter_map(|slot| slot.finish(|| Terminal::Completed)).collect();
  for observer in observers {
    observer.complete();
  }
}
