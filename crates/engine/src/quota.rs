//! Usage quota, tracked externally in production.
//!
//! `check_and_consume` must be called once per export attempt (and once per
//! batch operation) before any rasterization or compositing work starts.

use std::sync::atomic::{AtomicU32, Ordering};

pub trait QuotaService {
    /// Consume one unit of quota. Returns false when the allowance is spent;
    /// callers must then abort before doing any expensive work.
    fn check_and_consume(&self) -> bool;
}

/// Fixed-allowance quota counter.
#[derive(Debug)]
pub struct MeteredQuota {
    remaining: AtomicU32,
}

impl MeteredQuota {
    pub fn new(allowance: u32) -> Self {
        Self { remaining: AtomicU32::new(allowance) }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Relaxed)
    }
}

impl QuotaService for MeteredQuota {
    fn check_and_consume(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }
}
