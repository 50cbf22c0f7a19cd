// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative turn-taking between a free-running worker and requesters.
//!
//! The worker holds the lock while it works and only releases it at
//! [`Rendezvous::checkpoint`]. Requesters bump an atomic pending counter
//! before touching the lock, so the worker notices them at its next
//! checkpoint without any lock traffic on the hot path:
//!
//! ```text
//!   requester                          worker
//!   ─────────                          ──────
//!   pending += 1
//!   lock ·····(blocked)·····           checkpoint: pending > 0
//!                                        granted = true, notify, wait
//!   granted? ─► pending -= 1
//!   run closure on state
//!   granted = false, notify ─────────► wakes, resumes (or grants again
//!                                        while idle)
//! ```
//!
//! A worker yields at most once per checkpoint while busy, and every request
//! is serviced within one unit of worker progress. While the worker blocks on
//! something external ([`Rendezvous::unlocked`]) or after it has exited
//! ([`Rendezvous::close`]) the rendezvous is *open* and requests run without
//! waiting for a turn.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// State guarded by a [`Rendezvous`], plus the turn flag.
#[derive(Debug)]
pub(crate) struct Turn<S> {
    granted: bool,
    open: bool,
    pub(crate) state: S,
}

/// Lock guard held by the worker between checkpoints.
pub(crate) type WorkerGuard<'a, S> = MutexGuard<'a, Turn<S>>;

#[derive(Debug)]
pub(crate) struct Rendezvous<S> {
    shared: Mutex<Turn<S>>,
    changed: Condvar,
    pending: AtomicUsize,
}

impl<S> Rendezvous<S> {
    pub(crate) fn new(state: S) -> Self {
        Self {
            shared: Mutex::new(Turn {
                granted: false,
                open: false,
                state,
            }),
            changed: Condvar::new(),
            pending: AtomicUsize::new(0),
        }
    }

    /// Acquires the lock for the worker.
    pub(crate) fn lock(&self) -> WorkerGuard<'_, S> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&'a self, guard: WorkerGuard<'a, S>) -> WorkerGuard<'a, S> {
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a requester is waiting for a turn.
    pub(crate) fn has_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Hands the turn to one requester and waits until it is returned.
    fn yield_turn<'a>(&'a self, mut guard: WorkerGuard<'a, S>) -> WorkerGuard<'a, S> {
        guard.granted = true;
        self.changed.notify_all();
        while guard.granted {
            guard = self.wait(guard);
        }
        guard
    }

    /// Worker safe point.
    ///
    /// Yields to pending requesters. While `is_idle` holds the worker keeps
    /// yielding, sleeping until a request gives it something to do.
    pub(crate) fn checkpoint<'a>(
        &'a self,
        mut guard: WorkerGuard<'a, S>,
        is_idle: impl Fn(&S) -> bool,
    ) -> WorkerGuard<'a, S> {
        if is_idle(&guard.state) || self.has_pending() {
            loop {
                guard = self.yield_turn(guard);
                if !is_idle(&guard.state) {
                    break;
                }
            }
        }
        guard
    }

    /// Releases the lock while `f` runs, letting requests through freely.
    pub(crate) fn unlocked<'a, R>(
        &'a self,
        mut guard: WorkerGuard<'a, S>,
        f: impl FnOnce() -> R,
    ) -> (WorkerGuard<'a, S>, R) {
        guard.open = true;
        drop(guard);
        self.changed.notify_all();
        let out = f();
        let mut guard = self.lock();
        guard.open = false;
        (guard, out)
    }

    /// Opens the rendezvous for good. Called by the worker on exit so that
    /// late requests do not wait for a turn that never comes.
    pub(crate) fn close(&self, mut guard: WorkerGuard<'_, S>) {
        guard.open = true;
        drop(guard);
        self.changed.notify_all();
    }

    /// Runs `f` on the shared state during the worker's next safe point.
    ///
    /// Must not be called from the worker thread while it holds the lock.
    pub(crate) fn request<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.lock();
        while !guard.granted && !guard.open {
            guard = self.wait(guard);
        }
        self.pending.fetch_sub(1, Ordering::SeqCst);
        let out = f(&mut guard.state);
        if !guard.open {
            guard.granted = false;
        }
        drop(guard);
        self.changed.notify_all();
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        remaining: u32,
        done: u32,
        shutdown: bool,
    }

    fn spawn_worker(r: &Arc<Rendezvous<Counter>>) -> thread::JoinHandle<u32> {
        let r = Arc::clone(r);
        thread::spawn(move || {
            let mut guard = r.lock();
            let mut steps = 0;
            loop {
                guard = r.checkpoint(guard, |c| c.remaining == 0 && !c.shutdown);
                if guard.state.shutdown {
                    return steps;
                }
                guard.state.remaining -= 1;
                guard.state.done += 1;
                steps += 1;
            }
        })
    }

    #[test]
    fn requests_run_while_worker_is_idle() {
        let r = Arc::new(Rendezvous::new(Counter::default()));
        let worker = spawn_worker(&r);
        r.request(|c| c.remaining = 5);
        r.request(|c| c.remaining += 3);
        let mut done = 0;
        while done < 8 {
            done = r.request(|c| c.done);
        }
        r.request(|c| c.shutdown = true);
        assert_eq!(worker.join().unwrap(), 8);
    }

    #[test]
    fn busy_worker_services_many_requesters() {
        let r = Arc::new(Rendezvous::new(Counter::default()));
        let worker = spawn_worker(&r);
        r.request(|c| c.remaining = 1_000_000);
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        r.request(|c| c.remaining += 1);
                    }
                });
            }
        });
        let (remaining, done) = r.request(|c| {
            c.shutdown = true;
            (c.remaining, c.done)
        });
        assert_eq!(remaining + done, 1_000_200);
        let steps = worker.join().unwrap();
        assert_eq!(steps, done);
        assert!(!r.has_pending());
    }

    #[test]
    fn requests_run_while_worker_is_blocked_elsewhere() {
        let r = Arc::new(Rendezvous::new(Counter::default()));
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let worker = {
            let r = Arc::clone(&r);
            thread::spawn(move || {
                let guard = r.lock();
                // Blocks until the requester below has been serviced.
                let (guard, ()) = r.unlocked(guard, || rx.recv().unwrap());
                let done = guard.state.done;
                r.close(guard);
                done
            })
        };
        r.request(|c| c.done = 7);
        tx.send(()).unwrap();
        assert_eq!(worker.join().unwrap(), 7);
        // Closed: requests keep working after the worker is gone.
        assert_eq!(r.request(|c| c.done), 7);
    }
}
