use derive_more::{Debug, Deref};

use crate::CompletionSignal;

/// One unit of outstanding work, retired on drop.
///
/// Created by [`CompletionSignal::guard`]. Dereferences to the signal it
/// belongs to.
#[must_use = "dropping the guard retires its unit of work immediately"]
#[derive(Debug, Deref)]
pub struct DoneGuard(CompletionSignal);

impl DoneGuard {
    #[inline]
    pub(crate) fn new(signal: CompletionSignal) -> Self {
        signal.add(1);
        Self(signal)
    }

    /// Consumes the guard.
    ///
    /// This is equivalent to dropping the guard.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for DoneGuard {
    #[inline]
    fn drop(&mut self) {
        self.0.done();
    }
}
