use core::{fmt, mem};

use crate::{
    guard::DoneGuard,
    pulse::{self, Pulse, Ready},
    utils::*,
};

/// A wait group whose drain event can be awaited.
///
/// Work is registered with [`add`](Self::add) and retired with
/// [`done`](Self::done). Every time the outstanding count climbs from zero a
/// new *cycle* starts; [`channel`](Self::channel) returns a [`Ready`] handle
/// that resolves once the cycle active at call time has drained. Because the
/// handle is a plain future, it can be raced against a timer or any other
/// event instead of blocking the caller.
///
/// Cloning a `CompletionSignal` yields another handle to the same signal.
///
/// # Cycles
///
/// The signal can be reused indefinitely. Each cycle gets its own readiness
/// channel and its own monitor thread, which blocks until the cycle's count
/// reaches zero and then releases every handle subscribed to that cycle.
///
/// A handle obtained while the signal is idle is ready immediately, and a
/// handle obtained during a cycle stays bound to that cycle: it resolves when
/// that cycle drains, even if more work has been added since.
///
/// # Panics
///
/// Retiring more work than was added panics, as does overflowing the count.
///
/// # Examples
///
/// ```
/// use completion_signal::CompletionSignal;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let signal = CompletionSignal::new();
///
/// signal.add(3);
/// for _ in 0..3 {
///     let worker = signal.clone();
///     std::thread::spawn(move || {
///         // Long-running task
///         worker.done();
///     });
/// }
///
/// tokio::select! {
///     _ = signal.channel() => {}
///     _ = tokio::time::sleep(Duration::from_secs(5)) => panic!("workers timed out"),
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    drained: Condvar,
}

struct State {
    pending: usize,
    /// Zero crossings so far, which is also the id of the accumulating cycle.
    completed: u64,
    /// Cycle whose monitor has not retired its channel yet.
    armed: Option<u64>,
    channel: Channel,
}

enum Channel {
    Closed,
    Open(Vec<Pulse>),
}

impl Channel {
    fn subscribe(&mut self) -> Ready {
        match self {
            Channel::Closed => Ready::default(),
            Channel::Open(pulses) => {
                if pulses.len() == pulses.capacity() {
                    pulses.retain(|pulse| !pulse.is_orphaned());
                }
                let (ready, pulse) = pulse::pair();
                pulses.push(pulse);
                ready
            }
        }
    }

    /// Closes the channel. Dropping the returned pulses releases the waiters.
    #[must_use]
    fn close(&mut self) -> Vec<Pulse> {
        match mem::replace(self, Channel::Closed) {
            Channel::Open(pulses) => pulses,
            Channel::Closed => Vec::new(),
        }
    }
}

impl State {
    /// Starts cycle `self.completed`, retiring a drained cycle whose monitor
    /// has not caught up yet.
    #[must_use]
    fn arm(&mut self, inner: &Arc<Inner>) -> Vec<Pulse> {
        debug_assert_eq!(self.pending, 0);
        let retired = match self.armed.take() {
            Some(cycle) => {
                trace!("cycle {} retired before its monitor ran", cycle);
                self.channel.close()
            }
            None => Vec::new(),
        };

        let cycle = self.completed;
        trace!("arming cycle {}", cycle);
        self.armed = Some(cycle);
        self.channel = Channel::Open(Vec::new());

        let inner = inner.clone();
        thread::spawn(move || inner.monitor(cycle));

        retired
    }
}

impl Inner {
    #[inline]
    fn lock(&self) -> MutexGuard<'_, State> {
        unpoison(self.state.lock())
    }

    fn monitor(&self, cycle: u64) {
        let mut state = self.lock();
        while state.completed == cycle {
            state = unpoison(self.drained.wait(state));
        }

        if state.armed != Some(cycle) {
            return;
        }
        state.armed = None;
        let pulses = state.channel.close();
        drop(state);

        trace!("cycle {} drained, releasing {} waiters", cycle, pulses.len());
        drop(pulses);
    }
}

impl CompletionSignal {
    /// Creates an idle `CompletionSignal`.
    ///
    /// A handle taken from an idle signal is ready immediately, since there is
    /// no work to wait for.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_signal::CompletionSignal;
    ///
    /// let signal = CompletionSignal::new();
    /// assert!(signal.is_idle());
    /// assert!(signal.channel().is_ready());
    /// ```
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    pending: 0,
                    completed: 0,
                    armed: None,
                    channel: Channel::Closed,
                }),
                drained: Condvar::new(),
            }),
        }
    }

    /// Adds `delta`, which may be negative, to the outstanding count.
    ///
    /// A positive `delta` on an idle signal starts a new cycle. While a cycle
    /// is accumulating work, further additions extend it.
    ///
    /// # Panics
    ///
    /// Panics if the count would drop below zero or overflow `usize`.
    pub fn add(&self, delta: isize) {
        let mut state = self.inner.lock();
        let Some(pending) = state.pending.checked_add_signed(delta) else {
            if delta < 0 {
                panic!("negative pending count");
            }
            panic!("pending count overflow");
        };

        let retired = if delta > 0 && state.pending == 0 {
            state.arm(&self.inner)
        } else {
            Vec::new()
        };

        state.pending = pending;
        if delta < 0 && pending == 0 {
            state.completed += 1;
            self.inner.drained.notify_all();
        }
        drop(state);

        drop(retired);
    }

    /// Retires one unit of work.
    ///
    /// # Panics
    ///
    /// Panics if there is no outstanding work.
    #[inline]
    pub fn done(&self) {
        self.add(-1);
    }

    /// Returns a handle that resolves when the current cycle drains.
    ///
    /// The handle is ready immediately if nothing is outstanding, including
    /// right after the last [`done`](Self::done) of a cycle.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_signal::CompletionSignal;
    ///
    /// # futures_executor::block_on(async {
    /// let signal = CompletionSignal::new();
    /// signal.add(1);
    ///
    /// let first = signal.channel();
    /// let second = signal.channel();
    /// assert!(!first.is_ready());
    ///
    /// signal.done();
    /// first.await;
    /// second.await;
    ///
    /// // Nothing is outstanding, so late subscribers do not wait.
    /// signal.channel().await;
    /// # });
    /// ```
    pub fn channel(&self) -> Ready {
        let mut state = self.inner.lock();
        // A drained cycle may still be open until its monitor runs.
        if state.pending == 0 {
            return Ready::default();
        }
        state.channel.subscribe()
    }

    /// Blocks the current thread until the current cycle drains.
    ///
    /// Returns immediately if there is no outstanding work.
    pub fn wait(&self) {
        let mut state = self.inner.lock();
        let cycle = state.completed;
        while state.pending > 0 && state.completed == cycle {
            state = unpoison(self.inner.drained.wait(state));
        }
    }

    /// Returns the current outstanding count.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending
    }

    /// Checks whether nothing is outstanding.
    ///
    /// When this is `true`, [`channel`](Self::channel) hands out handles that
    /// are already ready.
    pub fn is_idle(&self) -> bool {
        self.inner.lock().pending == 0
    }

    /// Adds one unit of work that is retired when the returned guard drops.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_signal::CompletionSignal;
    ///
    /// let signal = CompletionSignal::new();
    /// let guard = signal.guard();
    /// assert_eq!(signal.pending(), 1);
    ///
    /// std::thread::spawn(move || {
    ///     // Long-running task
    ///     guard.release();
    /// });
    ///
    /// signal.wait();
    /// assert_eq!(signal.pending(), 0);
    /// ```
    pub fn guard(&self) -> DoneGuard {
        DoneGuard::new(self.clone())
    }
}

impl Default for CompletionSignal {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("CompletionSignal")
            .field("pending", &state.pending)
            .field("cycle", &state.completed)
            .field("armed", &state.armed.is_some())
            .finish()
    }
}
