//! Concurrency-based admission control.
//!
//! # Responsibilities
//! - Bound the number of in-flight requests on the client path
//! - Reject (shed) work above the ceiling instead of queuing it
//! - Guarantee slot release on every exit path via a Drop guard
//!
//! # Design Decisions
//! - Memoryless: the decision is purely "would in_flight + 1 exceed the
//!   ceiling", unlike a token bucket there is no refill history
//! - Lock-free CAS admission; two concurrent callers cannot both take the
//!   last slot

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Shared in-flight counter with a hard ceiling.
///
/// One process-lifetime instance, shared by all handler tasks.
#[derive(Debug)]
pub struct AdmissionController {
    in_flight: AtomicUsize,
    max_in_flight: usize,
}

impl AdmissionController {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight,
        }
    }

    /// Try to reserve a concurrency slot.
    ///
    /// Returns `None` when the ceiling is reached; the caller must shed the
    /// request without any upstream work. On success the returned permit
    /// releases the slot when dropped.
    pub fn try_admit(self: &Arc<Self>) -> Option<AdmissionPermit> {
        let mut prev = self.in_flight.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_in_flight {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => prev = observed,
            }
        }
        metrics::set_admitted(prev + 1);
        Some(AdmissionPermit {
            controller: self.clone(),
        })
    }

    /// Current number of admitted, not yet completed requests.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    fn release(&self) {
        let prev = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        metrics::set_admitted(prev.saturating_sub(1));
    }
}

/// RAII permit for one admitted request.
///
/// Dropping the permit releases the slot exactly once, including when the
/// handler unwinds.
#[derive(Debug)]
pub struct AdmissionPermit {
    controller: Arc<AdmissionController>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.controller.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn permit_drop_releases_slot() {
        let ctrl = Arc::new(AdmissionController::new(1));

        let permit = ctrl.try_admit().expect("first admit");
        assert_eq!(ctrl.in_flight(), 1);
        assert!(ctrl.try_admit().is_none());

        drop(permit);
        assert_eq!(ctrl.in_flight(), 0);
        assert!(ctrl.try_admit().is_some());
    }

    #[test]
    fn concurrent_admission_never_exceeds_ceiling() {
        const CEILING: usize = 8;
        const CALLERS: usize = 64;

        let ctrl = Arc::new(AdmissionController::new(CEILING));
        let admitted = Arc::new(AtomicUsize::new(0));
        // All threads race try_admit, and none releases until every
        // thread has attempted.
        let start = Arc::new(Barrier::new(CALLERS));
        let hold = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let ctrl = ctrl.clone();
                let admitted = admitted.clone();
                let start = start.clone();
                let hold = hold.clone();
                thread::spawn(move || {
                    start.wait();
                    let permit = ctrl.try_admit();
                    if permit.is_some() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                    hold.wait();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), CEILING);
        assert_eq!(ctrl.in_flight(), 0);
    }
}
