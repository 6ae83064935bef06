//! Error types of the sharing engine.
//!
//! Errors raised by a producer travel through the observer's `Err` type and
//! never through these types.

use thiserror::Error;

/// A producer handed to a connect-gated operator does not expose the connect
/// capability.
///
/// Raised synchronously by [`as_connectable`](crate::connectable::as_connectable)
/// and [`Observable::ref_count_with`](crate::observable::Observable::ref_count_with).
/// Retrying with the same producer fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a connectable producer, got `{producer}`")]
pub struct CapabilityError {
  producer: &'static str,
}

impl CapabilityError {
  pub fn of<P: ?Sized>() -> Self { CapabilityError { producer: std::any::type_name::<P>() } }

  /// Type name of the rejected producer.
  pub fn producer(&self) -> &'static str { self.producer }
}
