//! Subjects: broadcast channels that are both observer and observable.
//!
//! A [`Subject`] forwards every event it receives to all attached observers.
//! After `complete` or `error` it is stopped for good; observers attaching
//! later receive the same terminal event right away. [`Subject::replay`]
//! additionally buffers the most recent values and replays them to every new
//! observer before anything else.

use std::{collections::VecDeque, rc::Rc};

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::MutRc,
  subscription::Subscription,
};

mod subscribers;
use subscribers::{broadcast_complete, broadcast_error, broadcast_value, Slot, Subscribers};

/// A multicast sink/source pair shared by many observers.
///
/// This is what `share_with` fans a producer out through. `is_stopped` turns
/// `true` once the channel received a terminal event and never turns back.
pub trait BroadcastChannel<Item, Err>:
  Observable<Item = Item, Err = Err> + Observer<Item, Err> + Clone + 'static
{
  fn is_stopped(&self) -> bool;

  /// Whether both handles point at the same channel.
  fn same_channel(&self, other: &Self) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Terminal<Err> {
  Completed,
  Errored(Err),
}

impl<Err> Terminal<Err> {
  pub(crate) fn deliver<Item>(self, observer: BoxedObserver<Item, Err>) {
    match self {
      Terminal::Completed => observer.complete(),
      Terminal::Errored(err) => observer.error(err),
    }
  }
}

struct SubjectCore<Item, Err> {
  observers: Subscribers<Item, Err>,
  terminal: Option<Terminal<Err>>,
  replay: Option<(usize, VecDeque<Item>)>,
}

pub struct Subject<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
}

impl<Item, Err> Subject<Item, Err> {
  /// A publish subject: observers only see events emitted after they attach.
  pub fn new() -> Self { Self::with_replay(None) }

  /// A subject that replays the last `buffer` values to every new observer.
  pub fn replay(buffer: usize) -> Self { Self::with_replay(Some((buffer, VecDeque::new()))) }

  fn with_replay(replay: Option<(usize, VecDeque<Item>)>) -> Self {
    Subject {
      core: MutRc::own(SubjectCore { observers: Subscribers::default(), terminal: None, replay }),
    }
  }

  pub fn observer_count(&self) -> usize { self.core.rc_deref().observers.len() }

  pub fn is_stopped(&self) -> bool { self.core.rc_deref().terminal.is_some() }

}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject { core: self.core.clone() } }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let slots = {
      let mut core = self.core.rc_deref_mut();
      if core.terminal.is_some() {
        return;
      }
      if let Some((cap, buffer)) = core.replay.as_mut() {
        if *cap > 0 {
          if buffer.len() == *cap {
            buffer.pop_front();
          }
          buffer.push_back(value.clone());
        }
      }
      core.observers.snapshot()
    };
    broadcast_value(&slots, value);
  }

  fn error(self, err: Err) {
    let slots = {
      let mut core = self.core.rc_deref_mut();
      if core.terminal.is_some() {
        return;
      }
      core.terminal = Some(Terminal::Errored(err.clone()));
      core.observers.drain()
    };
    broadcast_error(&slots, err);
  }

  fn complete(self) {
    let slots = {
      let mut core = self.core.rc_deref_mut();
      if core.terminal.is_some() {
        return;
      }
      core.terminal = Some(Terminal::Completed);
      core.observers.drain()
    };
    broadcast_complete(&slots);
  }

  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, mut observer: BoxedObserver<Item, Err>) -> Self::Unsub {
    let buffered: Vec<Item> = self
      .core
      .rc_deref()
      .replay
      .as_ref()
      .map(|(_, buffer)| buffer.iter().cloned().collect())
      .unwrap_or_default();
    for value in buffered {
      if observer.is_closed() {
        break;
      }
      observer.next(value);
    }

    let mut core = self.core.rc_deref_mut();
    if let Some(terminal) = core.terminal.clone() {
      drop(core);
      terminal.deliver(observer);
      return SubjectSubscription { registered: None };
    }
    let slot = Rc::new(Slot::new(observer));
    let id = core.observers.add(slot.clone());
    drop(core);
    SubjectSubscription { registered: Some((self.core, id, slot)) }
  }
}

impl<Item, Err> BroadcastChannel<Item, Err> for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn is_stopped(&self) -> bool { Subject::is_stopped(self) }

  fn same_channel(&self, other: &Self) -> bool { self.core.ptr_eq(&other.core) }
}

/// Subscription handle for a Subject.
///
/// Unsubscribing removes the observer from the subject; it never stops the
/// subject itself.
pub struct SubjectSubscription<Item, Err> {
  registered: Option<(MutRc<SubjectCore<Item, Err>>, usize, Rc<Slot<Item, Err>>)>,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    let Some((core, id, slot)) = self.registered else {
      return;
    };
    let observer = slot.close();
    core.rc_deref_mut().observers.remove(id);
    drop(observer);
  }

  fn is_closed(&self) -> bool {
    self
      .registered
      .as_ref()
      .map_or(true, |(_, _, slot)| slot.is_closed())
  }
}
