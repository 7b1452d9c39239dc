//! Completion detection
//!
//! Tracks how many nodes have been discovered but not yet processed. The
//! traversal registers a node before it descends into its children and
//! enqueues it only after them, so the count cannot fall to zero while any
//! part of the tree is still undiscovered. When it does reach zero, a
//! one-shot signal is fired and every waiter is released.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Pending-node counter with a one-shot completion signal
#[derive(Debug, Default)]
pub struct CompletionDetector {
    pending: AtomicU64,
    registered: AtomicU64,
    completed: AtomicU64,
    fired: AtomicBool,
    done: Mutex<bool>,
    signal: Condvar,
}

impl CompletionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A node has been discovered
    pub fn register(&self) {
        self.registered.fetch_add(1, Ordering::Relaxed);
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// A previously registered node has been processed
    pub fn complete(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        let previous = self.pending.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "complete() without matching register()");

        if previous == 1 {
            self.fire();
        }
    }

    /// Release all waiters, at most once per detector
    fn fire(&self) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let mut done = self.done.lock();
        *done = true;
        self.signal.notify_all();
    }

    /// Block until the pending count has reached zero
    pub fn await_completion(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.signal.wait(&mut done);
        }
    }

    /// Block for at most `timeout`; returns true if completion was signalled
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut done = self.done.lock();
        if !*done {
            self.signal.wait_for(&mut done, timeout);
        }
        *done
    }

    /// Whether the completion signal has fired
    pub fn is_complete(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Nodes discovered but not yet processed
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::SeqCst)
    }

    /// Total nodes ever registered
    pub fn registered(&self) -> u64 {
        self.registered.load(Ordering::Relaxed)
    }

    /// Total nodes ever completed
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

/// RAII guard calling [`CompletionDetector::complete`] on drop
///
/// Holding one while processing a node guarantees the pending count is
/// released on every exit path, including early returns and panics.
pub struct PendingGuard<'a> {
    detector: &'a CompletionDetector,
}

impl<'a> PendingGuard<'a> {
    pub fn new(detector: &'a CompletionDetector) -> Self {
        Self { detector }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.detector.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fires_when_count_reaches_zero() {
        let detector = CompletionDetector::new();
        detector.register();
        detector.register();

        detector.complete();
        assert!(!detector.is_complete());
        assert_eq!(detector.pending(), 1);

        detector.complete();
        assert!(detector.is_complete());
        assert_eq!(detector.pending(), 0);
        assert!(detector.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_fires_only_once() {
        let detector = CompletionDetector::new();
        detector.register();
        detector.complete();
        assert!(detector.is_complete());

        // A second drop to zero does not re-fire
        detector.register();
        detector.complete();
        assert!(detector.is_complete());
        assert_eq!(detector.registered(), 2);
        assert_eq!(detector.completed(), 2);
    }

    #[test]
    fn test_wait_timeout_before_completion() {
        let detector = CompletionDetector::new();
        detector.register();
        assert!(!detector.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_releases_multiple_waiters() {
        let detector = Arc::new(CompletionDetector::new());
        detector.register();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let detector = Arc::clone(&detector);
                thread::spawn(move || detector.await_completion())
            })
            .collect();

        detector.complete();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }

    #[test]
    fn test_guard_completes_on_panic() {
        let detector = Arc::new(CompletionDetector::new());
        detector.register();

        let d = Arc::clone(&detector);
        let result = thread::spawn(move || {
            let _guard = PendingGuard::new(&d);
            panic!("metric computation failed");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(detector.pending(), 0);
        assert!(detector.is_complete());
    }
}
