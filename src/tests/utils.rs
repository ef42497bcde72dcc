use crate::utils::*;

pub(super) use crate::utils::{Arc, thread};

#[cfg(loom)]
pub(super) use super::loom::FutureTestExt;
#[cfg(not(loom))]
pub(super) use futures_test::future::FutureTestExt;

pub(super) struct SharedData(AtomicU8);

impl SharedData {
    pub fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub fn load(&self) -> bool {
        self.0.load(atomic::Acquire) != 0
    }

    pub fn store(&self) {
        self.0.store(1, atomic::Release);
    }
}

pub(super) struct SharedCount(AtomicU8);

impl SharedCount {
    pub fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub fn get(&self) -> u8 {
        self.0.load(atomic::Acquire)
    }

    pub fn incr(&self) {
        self.0.fetch_add(1, atomic::AcqRel);
    }
}
