use std::sync::{LockResult, PoisonError};

#[cfg(all(not(loom), not(feature = "portable-atomic")))]
pub use core::sync::atomic::{self as _atomic, AtomicU8};
#[cfg(all(not(loom), feature = "portable-atomic"))]
pub use portable_atomic::{self as _atomic, AtomicU8};
#[cfg(loom)]
pub use loom::sync::atomic::{self as _atomic, AtomicU8};

pub mod atomic {
    pub use super::_atomic::Ordering::*;
}

#[cfg(not(loom))]
pub use core::cell::UnsafeCell;
#[cfg(loom)]
pub use loom::cell::UnsafeCell;

#[cfg(not(loom))]
pub use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread,
};
#[cfg(loom)]
pub use loom::{
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread,
};

/// Takes the guard out of a poisoned lock.
///
/// State behind the signal's lock is checked before it is written, so a panic
/// raised while holding it never leaves a half-applied update behind.
#[inline]
pub fn unpoison<T>(res: LockResult<T>) -> T {
    res.unwrap_or_else(PoisonError::into_inner)
}

macro_rules! trace {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        ::log::trace!(target: "completion_signal", $($arg)+);
        #[cfg(not(feature = "log"))]
        let _ = format_args!($($arg)+);
    };
}

pub(crate) use trace;
