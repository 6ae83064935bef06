//! Shared mutable cells used by subjects, subscriptions and the sharing
//! engine.
//!
//! Everything in this crate runs on one thread, so shared state is an
//! `Rc<RefCell<T>>`. Borrows returned by [`MutRc::rc_deref_mut`] must never be
//! held across a call into user code (observers, producers, factories,
//! schedulers): those may re-enter the same cell.

use std::{
  cell::{Ref, RefCell, RefMut},
  fmt::{Debug, Formatter},
  rc::Rc,
};

#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  #[inline]
  pub fn rc_deref(&self) -> Ref<'_, T> { self.0.borrow() }

  #[inline]
  pub fn rc_deref_mut(&self) -> RefMut<'_, T> { self.0.borrow_mut() }

  /// Mutable borrow that yields `None` instead of panicking when the cell is
  /// already borrowed further up the stack.
  #[inline]
  pub fn try_rc_deref_mut(&self) -> Option<RefMut<'_, T>> { self.0.try_borrow_mut().ok() }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<T> From<T> for MutRc<T> {
  fn from(t: T) -> Self { Self::own(t) }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Debug> Debug for MutRc<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.0.try_borrow() {
      Ok(inner) => f.debug_tuple("MutRc").field(&*inner).finish(),
      Err(_) => f.write_str("MutRc(<borrowed>)"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxshare_macro::test]
  fn clones_share_the_cell() {
    let a = MutRc::own(1);
    let b = a.clone();
    *b.rc_deref_mut() += 1;
    assert_eq!(*a.rc_deref(), 2);
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&MutRc::own(2)));
  }

  #[rxshare_macro::test]
  fn try_borrow_while_borrowed() {
    let a = MutRc::own(0);
    let guard = a.rc_deref_mut();
    assert!(a.try_rc_deref_mut().is_none());
    drop(guard);
    assert!(a.try_rc_deref_mut().is_some());
  }
}
