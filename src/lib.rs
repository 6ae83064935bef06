//! # rxshare: pluggable sharing strategies for reactive producers
//!
//! Many consumers attach to and detach from one, possibly expensive,
//! producer. A [`ShareStrategy`] decides when the producer is actually
//! started ("connected") and stopped, and whether the broadcast channel that
//! fans its values out survives from one connection cycle to the next.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxshare::prelude::*;
//!
//! let shared = from_iter(0..3).share(ShareStrategy::default_ref_count());
//!
//! shared.clone().subscribe(|v| println!("first: {}", v));
//! shared.subscribe(|v| println!("second: {}", v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A producer; `share_with` / `share` live here |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`BroadcastChannel`] | Multicast channel, e.g. [`Subject`] |
//! | [`ShareStrategy`] | Connection timing plus channel reuse policy |
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`** (default): `LocalScheduler`, which runs deferred
//!   strategy decisions on a tokio `LocalSet`.
//!
//! Everything is single threaded: shared state lives in `Rc<RefCell<_>>`.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`BroadcastChannel`]: subject::BroadcastChannel
//! [`Subject`]: subject::Subject
//! [`ShareStrategy`]: strategy::ShareStrategy

pub mod connectable;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod strategy;
pub mod subject;
pub mod subscriber;
pub mod subscription;
