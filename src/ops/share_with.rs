//! The sharing orchestrator behind `Observable::share_with`.
//!
//! One [`ShareWith`] value (and its clones) owns:
//!
//! - the current broadcast channel, created lazily by the factory;
//! - the [`ClosingKind`] of the most recent bridge;
//! - a [`RefCountGate`] that counts consumers and decides, through the
//!   strategy, when to call [`ShareConnector::connect`].
//!
//! A bridge is the subscription of the source into the channel. When it
//! ends, either because the source terminated (`shared = true`) or because
//! the gate cancelled it (`shared = false`), the strategy's reuse predicate
//! decides whether the channel is kept for later consumers.

use std::rc::Rc;

use crate::{
  connectable::Connect,
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::MutRc,
  strategy::{ClosingKind, RefCountGate, ReuseState, ShareStrategy},
  subject::BroadcastChannel,
  subscriber::Subscriber,
  subscription::{ConnectionHandle, LocalSubscription, Subscription},
};

struct ShareState<C> {
  channel: Option<C>,
  kind: ClosingKind,
  /// Id of the live bridge.
  bridge: Option<usize>,
  next_bridge: usize,
}

impl<C> Default for ShareState<C> {
  fn default() -> Self {
    ShareState { channel: None, kind: ClosingKind::None, bridge: None, next_bridge: 0 }
  }
}

/// A producer shared among many consumers. Clone it to hand it out; all
/// clones share one channel and one gate.
pub struct ShareWith<S, C, F> {
  factory: Rc<F>,
  state: MutRc<ShareState<C>>,
  gate: RefCountGate<ShareConnector<S, C>>,
}

impl<S: Clone, C, F> Clone for ShareWith<S, C, F> {
  fn clone(&self) -> Self {
    ShareWith { factory: self.factory.clone(), state: self.state.clone(), gate: self.gate.clone() }
  }
}

impl<S, C, F> ShareWith<S, C, F>
where
  S: Observable + Clone + 'static,
  C: BroadcastChannel<S::Item, S::Err>,
  F: Fn() -> C,
{
  pub(crate) fn new(source: S, strategy: ShareStrategy, factory: F) -> Self {
    let state = MutRc::own(ShareState::default());
    let connector =
      ShareConnector { source, state: state.clone(), strategy: Rc::new(strategy.clone()) };
    ShareWith { factory: Rc::new(factory), state, gate: RefCountGate::new(connector, strategy) }
  }

  fn acquire_channel(&self) -> C {
    if let Some(channel) = self.state.rc_deref().channel.clone() {
      return channel;
    }
    let channel = (*self.factory)();
    let mut state = self.state.rc_deref_mut();
    // The factory may have subscribed to this very share and installed a
    // channel of its own.
    if let Some(current) = state.channel.clone() {
      return current;
    }
    state.channel = Some(channel.clone());
    state.kind = ClosingKind::None;
    tracing::debug!("share channel created");
    channel
  }
}

impl<S, C, F> ShareWith<S, C, F> {
  pub fn strategy(&self) -> &ShareStrategy { self.gate.strategy() }

  /// Whether a bridge from the source into the channel is live.
  pub fn is_connected(&self) -> bool { self.state.rc_deref().bridge.is_some() }

  /// How the most recent bridge ended.
  pub fn closing_kind(&self) -> ClosingKind { self.state.rc_deref().kind }

  /// Number of attached consumers.
  pub fn ref_count(&self) -> usize { self.gate.count() }

  /// Whether a channel is currently held.
  pub fn has_channel(&self) -> bool { self.state.rc_deref().channel.is_some() }
}

impl<S, C, F> Observable for ShareWith<S, C, F>
where
  S: Observable + Clone + 'static,
  S::Item: 'static,
  S::Err: 'static,
  C: BroadcastChannel<S::Item, S::Err>,
  F: Fn() -> C,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: BoxedObserver<S::Item, S::Err>) -> Self::Unsub {
    let channel = self.acquire_channel();
    let subscription = LocalSubscription::new();
    let consumer = Subscriber::new(observer, subscription.clone());
    let unsub = channel.actual_subscribe(Box::new(consumer));
    subscription.add(unsub);
    self.gate.attach(&subscription);
    subscription
  }
}

/// The connect capability the gate drives: bridges the source into the
/// current channel.
pub struct ShareConnector<S, C> {
  source: S,
  state: MutRc<ShareState<C>>,
  strategy: Rc<ShareStrategy>,
}

impl<S: Clone, C> Clone for ShareConnector<S, C> {
  fn clone(&self) -> Self {
    ShareConnector {
      source: self.source.clone(),
      state: self.state.clone(),
      strategy: self.strategy.clone(),
    }
  }
}

impl<S, C> Connect for ShareConnector<S, C>
where
  S: Observable + Clone + 'static,
  S::Item: 'static,
  S::Err: 'static,
  C: BroadcastChannel<S::Item, S::Err>,
{
  fn connect(&self) -> ConnectionHandle {
    let (channel, id) = {
      let mut state = self.state.rc_deref_mut();
      match state.channel.clone() {
        Some(channel) if !channel.is_stopped() => {
          let id = state.next_bridge;
          state.next_bridge += 1;
          state.bridge = Some(id);
          state.kind = ClosingKind::None;
          (channel, id)
        }
        _ => return ConnectionHandle::CLOSED,
      }
    };

    let connection = LocalSubscription::new();
    let bridge_end = LocalSubscription::new();
    {
      let (state, strategy, channel, connection) =
        (self.state.clone(), self.strategy.clone(), channel.clone(), connection.clone());
      bridge_end.add_teardown(move || {
        if !settle::<S::Item, S::Err, C>(&state, &strategy, &channel, id, true) {
          connection.unsubscribe();
        }
      });
    }
    {
      // Settles a cancellation before the bridge end can report it as a
      // natural one.
      let (state, strategy, channel) = (self.state.clone(), self.strategy.clone(), channel.clone());
      connection.add_teardown(move || {
        settle::<S::Item, S::Err, C>(&state, &strategy, &channel, id, false);
      });
    }
    connection.add(bridge_end.clone());

    let bridge = BridgeObserver {
      channel: Some(channel),
      state: self.state.clone(),
      end: bridge_end.clone(),
    };
    let unsub = self.source.clone().actual_subscribe(Box::new(bridge));
    bridge_end.add(unsub);
    tracing::debug!(live = !connection.is_closed(), "share bridge established");
    ConnectionHandle::new(connection)
  }

  fn is_connected(&self) -> bool { self.state.rc_deref().bridge.is_some() }
}

/// Run the reuse decision for bridge `id`, which just ended. Returns whether
/// the channel is kept.
fn settle<Item, Err, C>(
  state: &MutRc<ShareState<C>>, strategy: &ShareStrategy, channel: &C, id: usize, shared: bool,
) -> bool
where
  C: BroadcastChannel<Item, Err>,
{
  let mut state = state.rc_deref_mut();
  if state.bridge != Some(id) {
    // Already settled through the other end of the same bridge.
    return true;
  }
  state.bridge = None;
  let kind = state.kind;
  let reuse = strategy.should_reuse(&ReuseState { kind, shared, channel });
  tracing::debug!(?kind, shared, reuse, "share bridge ended");
  if !reuse && state.channel.as_ref().is_some_and(|held| held.same_channel(channel)) {
    state.channel = None;
  }
  reuse
}

/// Forwards the source into the channel and records how the source ended.
struct BridgeObserver<C> {
  channel: Option<C>,
  state: MutRc<ShareState<C>>,
  end: LocalSubscription,
}

impl<C> BridgeObserver<C> {
  fn terminate(mut self, kind: ClosingKind, deliver: impl FnOnce(C)) {
    self.state.rc_deref_mut().kind = kind;
    if let Some(channel) = self.channel.take() {
      deliver(channel);
    }
    self.end.unsubscribe();
  }
}

impl<C, Item, Err> Observer<Item, Err> for BridgeObserver<C>
where
  C: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.end.is_closed() {
      return;
    }
    if let Some(channel) = self.channel.as_mut() {
      channel.next(value);
    }
  }

  fn error(self, err: Err) {
    if self.end.is_closed() {
      return;
    }
    self.terminate(ClosingKind::Errored, |channel| channel.error(err));
  }

  fn complete(self) {
    if self.end.is_closed() {
      return;
    }
    self.terminate(ClosingKind::Completed, |channel| channel.complete());
  }

  fn is_closed(&self) -> bool { self.end.is_closed() }
}
