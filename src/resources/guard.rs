//! Release guard for handles created during multi-step construction.

use std::fmt::Debug;

use crate::backend::Backend;

/// Owns a freshly created handle until construction finishes.
///
/// If the guard is dropped while still armed, the handle is released through
/// the backend. [`Owned::disarm`] hands the handle over to the finished
/// resource instead.
pub(crate) struct Owned<'a, B: Backend, H: Copy + Debug> {
    backend: &'a B,
    handle: H,
    release: fn(&B, H),
    armed: bool,
}

impl<'a, B: Backend, H: Copy + Debug> Owned<'a, B, H> {
    pub(crate) fn new(backend: &'a B, handle: H, release: fn(&B, H)) -> Self {
        Self {
            backend,
            handle,
            release,
            armed: true,
        }
    }

    pub(crate) fn get(&self) -> H {
        self.handle
    }

    /// Stop guarding the handle and return it.
    pub(crate) fn disarm(mut self) -> H {
        self.armed = false;
        self.handle
    }
}

impl<B: Backend, H: Copy + Debug> Drop for Owned<'_, B, H> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!(
                "{}: releasing {:?} after failed construction",
                self.backend.name(),
                self.handle
            );
            (self.release)(self.backend, self.handle);
        }
    }
}
