use core::{
    pin::Pin,
    task::{Context, Poll},
};

use futures_test::task::new_count_waker;

use crate::CompletionSignal;

#[cfg(not(loom))]
const _DRAIN_ROUNDS: usize = 1000;
#[cfg(loom)]
const _DRAIN_ROUNDS: usize = 2;

#[cfg_attr(not(loom), test)]
pub fn test_signal_ready_when_idle() {
    let (waker, counter) = new_count_waker();
    let mut cx = Context::from_waker(&waker);
    let signal = CompletionSignal::new();
    assert!(signal.is_idle());
    let mut rx = core::pin::pin!(signal.channel());
    assert!(rx.is_ready());
    assert_eq!(rx.as_mut().poll(&mut cx), Poll::Ready(()));
    assert_eq!(rx.as_mut().poll(&mut cx), Poll::Ready(()));
    assert_eq!(counter.get(), 0);
}

#[cfg_attr(not(loom), test)]
pub fn test_signal_pending_before_last_done() {
    let (waker, counter) = new_count_waker();
    let mut cx = Context::from_waker(&waker);
    let signal = CompletionSignal::new();
    signal.add(3);
    assert!(!signal.is_idle());
    let mut rx = core::pin::pin!(signal.channel());
    assert_eq!(rx.as_mut().poll(&mut cx), Poll::Pending);
    signal.done();
    assert_eq!(rx.as_mut().poll(&mut cx), Poll::Pending);
    signal.done();
    assert_eq!(rx.as_mut().poll(&mut cx), Poll::Pending);
    assert_eq!(signal.pending(), 1);
    assert_eq!(counter.get(), 0);
    signal.done();
    signal.wait();
    assert_eq!(signal.pending(), 0);
}

#[cfg_attr(not(loom), test)]
pub fn test_signal_add_extends_cycle() {
    let (waker, counter) = new_count_waker();
    let mut cx = Context::from_waker(&waker);
    let signal = CompletionSignal::new();
    signal.add(1);
    let mut rx = core::pin::pin!(signal.channel());
    assert_eq!(rx.as_mut().poll(&mut cx), Poll::Pending);
    signal.add(2);
    signal.done();
    signal.done();
    assert_eq!(rx.as_mut().poll(&mut cx), Poll::Pending);
    assert_eq!(counter.get(), 0);
    signal.done();
    signal.wait();
}

#[cfg_attr(not(loom), test)]
pub fn test_signal_negative_add() {
    let (waker, counter) = new_count_waker();
    let mut cx = Context::from_waker(&waker);
    let signal = CompletionSignal::new();
    signal.add(3);
    let mut rx = core::pin::pin!(signal.channel());
    signal.add(-2);
    assert_eq!(rx.as_mut().poll(&mut cx), Poll::Pending);
    assert_eq!(signal.pending(), 1);
    assert_eq!(counter.get(), 0);
    signal.add(-1);
    signal.wait();
    assert_eq!(signal.pending(), 0);
}

#[cfg_attr(not(loom), test)]
pub fn test_signal_add_zero_when_idle() {
    let signal = CompletionSignal::new();
    signal.add(0);
    assert!(signal.is_idle());
    assert_eq!(signal.pending(), 0);
    assert!(signal.channel().is_ready());
}

#[cfg_attr(not(loom), test)]
pub fn test_signal_wait_when_idle() {
    let signal = CompletionSignal::new();
    signal.wait();
    signal.wait();
    assert!(signal.is_idle());
}

#[cfg_attr(not(loom), test)]
pub fn test_signal_drop_handle_before_done() {
    let signal = CompletionSignal::new();
    signal.add(1);
    drop(signal.channel());
    let rx = signal.channel();
    drop(rx);
    signal.done();
    signal.wait();
}

#[cfg_attr(not(loom), test)]
pub fn test_signal_drop_polled_handle() {
    let (waker, counter) = new_count_waker();
    let mut cx = Context::from_waker(&waker);

    let signal = CompletionSignal::new();
    signal.add(1);
    let mut rx = signal.channel();
    assert_eq!(Pin::new(&mut rx).poll(&mut cx), Poll::Pending);

    drop(rx);

    signal.done();
    signal.wait();
    assert_eq!(counter.get(), 0);
}

#[cfg_attr(not(loom), test)]
pub fn test_signal_ready_right_after_drain() {
    let signal = CompletionSignal::new();
    for _ in 0.._DRAIN_ROUNDS {
        signal.add(1);
        let rx = signal.channel();
        signal.done();
        assert!(signal.is_idle());
        assert!(signal.channel().is_ready());
        signal.wait();
        assert!(signal.is_idle());
        assert!(signal.channel().is_ready());
        drop(rx);
    }
}
