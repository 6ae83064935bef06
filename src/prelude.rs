//! Prelude module for convenient imports

pub use crate::{
  connectable::{as_connectable, Connect, ConnectableObservable},
  error::CapabilityError,
  observable::*,
  observer::{BoxedObserver, FnMutObserver, Observer, ObserverAll},
  ops::{RefCount, ShareWith},
  strategy::{ClosingKind, ReuseState, ShareStrategy},
  subject::{BroadcastChannel, Subject, SubjectSubscription},
  subscriber::Subscriber,
  subscription::{ConnectionHandle, LocalSubscription, Subscription, SubscriptionGuard},
};
// Schedulers
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::LocalScheduler;
pub use crate::scheduler::{Duration, Scheduler, SchedulerRef, TaskHandle, TestScheduler};
