use super::{LocalSubscription, Subscription};

/// Cancelable handle of one producer-to-channel bridge.
///
/// Cancelling the handle ends the bridge only; consumers attached to the
/// channel keep their own subscriptions. [`ConnectionHandle::CLOSED`] stands
/// for "nothing is connected" and may be cancelled any number of times.
#[derive(Clone, Debug, Default)]
pub struct ConnectionHandle(Option<LocalSubscription>);

impl ConnectionHandle {
  pub const CLOSED: ConnectionHandle = ConnectionHandle(None);

  pub fn new(subscription: LocalSubscription) -> Self { ConnectionHandle(Some(subscription)) }

  /// Cancel the bridge without giving up the handle.
  pub fn cancel(&self) {
    if let Some(subscription) = &self.0 {
      subscription.clone().unsubscribe();
    }
  }

  /// Take the handle out, leaving [`ConnectionHandle::CLOSED`] behind.
  pub fn take(&mut self) -> ConnectionHandle { std::mem::take(self) }
}

impl Subscription for ConnectionHandle {
  fn unsubscribe(self) { self.cancel() }

  fn is_closed(&self) -> bool { self.0.as_ref().map_or(true, Subscription::is_closed) }
}
