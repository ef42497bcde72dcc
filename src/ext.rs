use core::{
    ops::Deref,
    pin::Pin,
    task::{Context, Poll, ready},
};

use derive_more::Debug;
use pin_project_lite::pin_project;

use crate::{CompletionSignal, DoneGuard};

pin_project! {
    /// Future counted as one unit of work on a [`CompletionSignal`].
    ///
    /// Created by [`TrackExt::track`].
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    #[derive(Debug)]
    pub struct Tracked<F> {
        #[pin]
        inner: F,
        guard: Option<DoneGuard>,
    }
}

impl<F> Deref for Tracked<F> {
    type Target = F;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<F> Tracked<F> {
    pub fn inner_pin(self: Pin<&mut Self>) -> Pin<&mut F> {
        self.project().inner
    }

    /// Checks whether the unit of work is still outstanding.
    pub fn is_tracked(&self) -> bool {
        self.guard.is_some()
    }
}

/// Extension for counting futures as work on a [`CompletionSignal`].
pub trait TrackExt: Sized {
    /// Adds one unit of work to `signal`, retired when `self` completes or is
    /// dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_signal::{CompletionSignal, TrackExt};
    ///
    /// # futures_executor::block_on(async {
    /// let signal = CompletionSignal::new();
    /// let job = async { 21 * 2 }.track(&signal);
    /// assert_eq!(signal.pending(), 1);
    ///
    /// assert_eq!(job.await, 42);
    /// signal.channel().await;
    /// assert_eq!(signal.pending(), 0);
    /// # });
    /// ```
    fn track(self, signal: &CompletionSignal) -> Tracked<Self>;
}

impl<F: Future> TrackExt for F {
    fn track(self, signal: &CompletionSignal) -> Tracked<Self> {
        Tracked {
            inner: self,
            guard: Some(signal.guard()),
        }
    }
}

impl<F: Future> Future for Tracked<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let output = ready!(this.inner.poll(cx));
        drop(this.guard.take());
        Poll::Ready(output)
    }
}
