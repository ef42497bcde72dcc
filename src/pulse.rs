use core::{
    mem,
    panic::{RefUnwindSafe, UnwindSafe},
    pin::Pin,
    task::{Context, Poll, Waker},
};

use derive_more::Debug;

use crate::utils::*;

const DONE: u8 = 0b001;
const LOCK: u8 = 0b010;
const DROPPED: u8 = 0b100;

/// Shared state of one `Ready`/`Pulse` pair.
///
/// `LOCK` grants exclusive access to `waker`. Whoever sets it while it was
/// clear owns the slot until it clears it again (the receiver while polling)
/// or forever (the first side to finish).
pub(crate) struct Slot {
    state: AtomicU8,
    waker: UnsafeCell<Option<Waker>>,
}

unsafe impl Send for Slot {}
unsafe impl Sync for Slot {}
impl UnwindSafe for Slot {}
impl RefUnwindSafe for Slot {}

impl Slot {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
            waker: UnsafeCell::new(None),
        }
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.state.load(atomic::Acquire) & DONE != 0
    }

    /// # Safety
    ///
    /// The caller must own `LOCK`.
    #[inline]
    unsafe fn with_waker<R, F: FnOnce(&mut Option<Waker>) -> R>(&self, f: F) -> R {
        #[cfg(not(loom))]
        {
            f(unsafe { &mut *self.waker.get() })
        }
        #[cfg(loom)]
        {
            self.waker
                .get()
                .with(|ptr| f(unsafe { &mut *ptr.cast_mut() }))
        }
    }

    /// Parks `waker` in the slot unless the pulse has fired. Returns whether
    /// it has.
    fn register(&self, waker: &Waker) -> bool {
        if self.state.fetch_or(LOCK, atomic::Acquire) & DONE != 0 {
            return true;
        }
        debug_assert!(!self.is_abandoned());

        // `LOCK` must be released even if cloning the waker unwinds.
        let unlock = Unlock(&self.state);
        unsafe {
            self.with_waker(|parked| {
                if !parked.as_ref().is_some_and(|old| old.will_wake(waker)) {
                    *parked = Some(waker.clone());
                }
            });
        }
        mem::forget(unlock);

        if self.state.fetch_and(!LOCK, atomic::AcqRel) & DONE == 0 {
            return false;
        }
        // The pulse fired while the slot was held and left the waker to us.
        drop(unsafe { self.with_waker(Option::take) });
        self.state.fetch_or(LOCK, atomic::Release);
        true
    }

    /// Sets `flag` and takes `LOCK` for good, handing back the parked waker
    /// when nobody else held the slot.
    fn finish(&self, flag: u8) -> Option<Waker> {
        if self.state.fetch_or(flag | LOCK, atomic::AcqRel) & LOCK != 0 {
            return None;
        }
        unsafe { self.with_waker(Option::take) }
    }

    #[inline]
    fn is_abandoned(&self) -> bool {
        self.state.load(atomic::Acquire) & DROPPED != 0
    }
}

/// Creates a pending readiness handle and the pulse that releases it.
pub(crate) fn pair() -> (Ready, Pulse) {
    let slot = Arc::new(Slot::new());
    (Ready(Some(slot.clone())), Pulse(slot))
}

/// Readiness handle of one completion cycle.
///
/// Resolves once the cycle it was obtained from has drained. A handle never
/// moves on to a later cycle: once ready it stays ready.
///
/// # Cancellation safety
///
/// This future is cancellation safe.
///
/// It is also safe to poll again after completion.
///
/// ```rust
/// # use completion_signal::CompletionSignal;
/// # futures_executor::block_on(async {
/// let signal = CompletionSignal::new();
/// signal.add(1);
/// let mut ready = core::pin::pin!(signal.channel());
///
/// assert!(!ready.is_ready());
///
/// signal.done();
///
/// ready.as_mut().await;
/// assert!(ready.is_ready());
///
/// // It is safe to await again (re-poll)
/// ready.as_mut().await;
/// assert!(ready.is_ready());
/// # });
/// ```
#[must_use = "futures do nothing unless you `.await` or poll them"]
#[derive(Debug)]
pub struct Ready(#[debug("ready: {}", _0.as_ref().is_none_or(|slot| slot.is_done()))] Option<Arc<Slot>>);

impl Ready {
    /// Checks if the cycle behind this handle has drained.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_signal::{CompletionSignal, Ready};
    ///
    /// assert!(Ready::default().is_ready());
    ///
    /// let signal = CompletionSignal::new();
    /// assert!(signal.channel().is_ready());
    ///
    /// signal.add(1);
    /// assert!(!signal.channel().is_ready());
    /// # signal.done();
    /// ```
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.0.as_ref().is_none_or(|slot| slot.is_done())
    }
}

impl Default for Ready {
    /// A handle that is ready from the start.
    #[inline]
    fn default() -> Self {
        Self(None)
    }
}

impl Future for Ready {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &self.0 {
            Some(slot) if !slot.register(cx.waker()) => Poll::Pending,
            _ => Poll::Ready(()),
        }
    }
}

impl Drop for Ready {
    #[inline]
    fn drop(&mut self) {
        if let Some(slot) = &self.0 {
            drop(slot.finish(DROPPED));
        }
    }
}

#[cfg(feature = "futures-core")]
impl futures_core::FusedFuture for Ready {
    #[inline]
    fn is_terminated(&self) -> bool {
        self.is_ready()
    }
}

/// Sending half of a readiness handle. Dropping it releases the `Ready`.
pub(crate) struct Pulse(Arc<Slot>);

impl Pulse {
    /// Whether the matching `Ready` is gone, so nobody can observe this pulse.
    #[inline]
    pub fn is_orphaned(&self) -> bool {
        self.0.is_abandoned()
    }
}

impl Drop for Pulse {
    #[inline]
    fn drop(&mut self) {
        if let Some(waker) = self.0.finish(DONE) {
            waker.wake();
        }
    }
}

struct Unlock<'a>(&'a AtomicU8);

impl Drop for Unlock<'_> {
    #[inline]
    fn drop(&mut self) {
        self.0.fetch_and(!LOCK, atomic::AcqRel);
    }
}
