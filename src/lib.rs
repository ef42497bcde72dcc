//! A rearmable completion signal for wait groups.
//!
//! [`CompletionSignal`] counts outstanding work like a wait group, but instead
//! of only offering a blocking `wait`, it hands out [`Ready`] futures that
//! resolve when the outstanding count drains back to zero. A `Ready` can be
//! raced against a timeout or any other event, and the signal can be reused
//! for any number of add/drain cycles.
//!
//! The futures are executor-agnostic: waiting is done by one monitor thread per
//! active cycle, and `Ready` only parks a waker.
//!
//! # Usage
//!
//! ## Awaiting a cycle
//!
//! ```rust
//! # use completion_signal::CompletionSignal;
//! # futures_executor::block_on(async {
//! let signal = CompletionSignal::new();
//! signal.add(2);
//! for _ in 0..2 {
//!     let worker = signal.clone();
//!     std::thread::spawn(move || {
//!         // Long-running task
//!         worker.done();
//!     });
//! }
//! // Wait for both tasks to complete
//! signal.channel().await;
//! # });
//! ```
//!
//! ## Racing against a timeout
//!
//! ```rust
//! # use completion_signal::CompletionSignal;
//! # use std::time::Duration;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let signal = CompletionSignal::new();
//! let guard = signal.guard();
//! tokio::spawn(async move {
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!     guard.release();
//! });
//!
//! tokio::select! {
//!     _ = signal.channel() => {}
//!     _ = tokio::time::sleep(Duration::from_secs(2)) => panic!("timed out"),
//! }
//! # }
//! ```
//!
//! ## Reuse
//!
//! ```rust
//! # use completion_signal::CompletionSignal;
//! # futures_executor::block_on(async {
//! let signal = CompletionSignal::new();
//! for round in 1..=3 {
//!     signal.add(round);
//!     let ready = signal.channel();
//!     for _ in 0..round {
//!         signal.done();
//!     }
//!     ready.await;
//! }
//! // Nothing outstanding: resolves right away
//! signal.channel().await;
//! # });
//! ```
//!
//! # Cycle binding
//!
//! A [`Ready`] belongs to the cycle that was active when it was created. Once
//! that cycle drains it stays ready, even if new work has been added since;
//! call [`CompletionSignal::channel`] again to wait for the newer cycle.

mod ext;
mod guard;
mod pulse;
mod signal;
mod utils;

pub use crate::{
    ext::{TrackExt, Tracked},
    guard::DoneGuard,
    pulse::Ready,
    signal::CompletionSignal,
};
