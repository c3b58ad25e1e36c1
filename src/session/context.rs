//! Shared per-session context: navigation sink, generation counter and the
//! single verification-in-flight gate.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Navigation sink supplied by the hosting shell. `replace` must not leave
/// the abandoned entry reachable via back-navigation.
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);
    fn replace(&self, path: &str);
}

/// Session-wide coordination state. The generation counter is bumped whenever
/// local session state is superseded (logout, forced clear, teardown); any
/// async result carrying a stale generation is discarded unapplied.
#[derive(Debug, Default)]
pub struct SessionCtx {
    generation: AtomicU64,
    verify_inflight: AtomicBool,
}

impl SessionCtx {
    pub fn new() -> Self { Self::default() }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate all pending async results.
    pub fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns true if the caller won the right to start a verification.
    pub fn begin_verify(&self) -> bool {
        !self.verify_inflight.swap(true, Ordering::SeqCst)
    }

    pub fn end_verify(&self) {
        self.verify_inflight.store(false, Ordering::SeqCst);
    }

    pub fn verify_inflight(&self) -> bool {
        self.verify_inflight.load(Ordering::SeqCst)
    }
}
