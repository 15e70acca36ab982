//! Timeout service
//!
//! The scheduler never runs its own clock: it registers and cancels
//! timeouts through this trait and leaves tick-counting and expiry to the
//! embedding platform. This module also provides a modest reference
//! implementation, [`TickTimeoutQueue`], for platforms that don't already
//! have their own timer wheel.

use crate::tcb::TCB;
use crate::wait_queue::WaitQueue;
use spin::Mutex;

/// Returned by [`TimeoutService::timeout_abort`] when the timeout had
/// already started firing on another core/interrupt before the abort could
/// take effect. Treated as a no-op by the caller, not an error to propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortRace;

/// Registers and cancels per-thread timeouts.
pub trait TimeoutService: Sync {
    /// Arrange for `thread` to become ready after `ticks` elapse.
    ///
    /// `wait_q`, when present, is the wait queue `thread` is currently
    /// linked into; the timeout handler removes it from there as part of
    /// readying it. When absent, `thread` was put to sleep directly (no
    /// synchronization object involved).
    fn timeout_add(&self, thread: *mut TCB, wait_q: Option<*mut WaitQueue>, ticks: u32);

    /// Cancel a previously registered timeout for `thread`.
    ///
    /// Returns `Err(AbortRace)` if the timeout has already begun firing;
    /// the caller must treat that as "the timeout wins, do nothing further"
    /// rather than retrying or erroring out.
    fn timeout_abort(&self, thread: *mut TCB) -> Result<(), AbortRace>;
}

const MAX_TIMEOUTS: usize = 64;

#[derive(Clone, Copy)]
struct Entry {
    thread: *mut TCB,
    wait_q: Option<*mut WaitQueue>,
    deadline: u32,
    firing: bool,
}

struct Inner {
    entries: [Option<Entry>; MAX_TIMEOUTS],
    now: u32,
}

unsafe impl Send for Entry {}
unsafe impl Send for Inner {}

/// A fixed-capacity, tick-driven reference timeout queue.
///
/// Not a production timer wheel: a linear scan over a bounded array, styled
/// after this crate's other fixed-capacity collections rather than a heap.
/// Good enough as the default for platforms that have no better timer
/// source and for tests.
pub struct TickTimeoutQueue {
    inner: Mutex<Inner>,
}

impl TickTimeoutQueue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: [None; MAX_TIMEOUTS],
                now: 0,
            }),
        }
    }

    /// Advance the clock by one tick, readying every thread whose deadline
    /// has passed.
    ///
    /// Call this from the platform's tick interrupt handler. Readying a
    /// thread here does not reschedule; the caller decides when to ask the
    /// scheduler to reschedule (typically once, after draining all expired
    /// entries).
    pub fn tick(&self) {
        let expired: [(*mut TCB, Option<*mut WaitQueue>); MAX_TIMEOUTS] = {
            let mut inner = self.inner.lock();
            inner.now = inner.now.wrapping_add(1);
            let now = inner.now;
            let mut out = [(core::ptr::null_mut(), None); MAX_TIMEOUTS];
            let mut n = 0;
            for slot in inner.entries.iter_mut() {
                if let Some(entry) = slot {
                    if entry.deadline <= now {
                        entry.firing = true;
                        out[n] = (entry.thread, entry.wait_q);
                        n += 1;
                    }
                }
            }
            inner.entries.iter_mut().for_each(|slot| {
                if let Some(entry) = slot {
                    if entry.firing {
                        *slot = None;
                    }
                }
            });
            out
        };
        for (thread, wait_q) in expired.into_iter().take_while(|(p, _)| !p.is_null()) {
            unsafe {
                // The thread is still linked into `wait_q` while its timeout
                // is live; it must come off that list before `ready_thread`
                // links it into the ready queue, or the node ends up linked
                // into two lists at once.
                if let Some(wq_ptr) = wait_q {
                    (*wq_ptr).remove(thread);
                }
                crate::kernel::ready_thread(thread);
            }
        }
    }
}

impl Default for TickTimeoutQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutService for TickTimeoutQueue {
    fn timeout_add(&self, thread: *mut TCB, wait_q: Option<*mut WaitQueue>, ticks: u32) {
        let mut inner = self.inner.lock();
        let deadline = inner.now.wrapping_add(ticks.max(1));
        let slot = inner
            .entries
            .iter_mut()
            .find(|e| e.is_none())
            .expect("TickTimeoutQueue: no free timeout slots");
        *slot = Some(Entry {
            thread,
            wait_q,
            deadline,
            firing: false,
        });
    }

    fn timeout_abort(&self, thread: *mut TCB) -> Result<(), AbortRace> {
        let mut inner = self.inner.lock();
        let slot = inner
            .entries
            .iter_mut()
            .find(|e| matches!(e, Some(entry) if entry.thread == thread));
        match slot {
            Some(slot) => match slot {
                Some(entry) if entry.firing => Err(AbortRace),
                _ => {
                    *slot = None;
                    Ok(())
                }
            },
            None => Ok(()),
        }
    }
}
