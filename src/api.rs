//! Public scheduling API
//!
//! The primitives an embedding kernel's syscall layer calls directly:
//! voluntary yield, sleep/wakeup, priority changes, and the scheduler-lock
//! pair that lets a thread finish a short critical section without being
//! preempted. `pend`/`pend_current` (blocking on a synchronization object)
//! live in [`crate::wait_queue`] and are re-exported here for convenience.

use crate::collaborators::platform;
use crate::config::{Priority, TICKS_PER_SEC};
use crate::kernel;
use crate::tcb::{StateFlags, TCB};

pub use crate::wait_queue::{pend, pend_current};

/// The currently running thread.
pub fn current() -> *mut TCB {
    kernel::current()
}

/// `t`'s current priority.
pub fn priority_get(t: *mut TCB) -> Priority {
    unsafe { (*t).prio }
}

/// The thread that would run next if a switch happened right now, exposed
/// for an architecture's ISR-exit path to consult without going through a
/// full `reschedule`.
pub fn get_next_ready_thread() -> *mut TCB {
    kernel::get_next_ready_thread()
}

/// Voluntarily give up the CPU to the next thread of equal-or-higher
/// priority, if any. A no-op if no one else is ready at `current`'s
/// priority or above.
pub fn yield_now() {
    debug_assert!(!platform().in_isr(), "yield_now is not callable from interrupt context");
    let key = platform().irq_lock();
    unsafe {
        let (cur, next) = kernel::with_kernel(|k| {
            let cur = k.current();
            k.ready().remove(cur);
            k.ready().add(cur);
            (cur, k.peek_next_ready())
        });
        if cur == next {
            platform().irq_unlock(key);
        } else {
            platform().swap(key);
        }
    }
}

/// Sleep `current` for `duration_ms`, or yield once if `duration_ms == 0`.
pub fn sleep(duration_ms: i32) {
    debug_assert!(!platform().in_isr(), "sleep is not callable from interrupt context");
    if duration_ms == 0 {
        yield_now();
        return;
    }
    let key = platform().irq_lock();
    unsafe {
        let cur = kernel::with_kernel(|k| {
            let cur = k.current();
            (*cur).state_flags.insert(StateFlags::TIMING);
            k.ready().remove(cur);
            cur
        });
        let ticks = crate::time::ms_to_ticks(duration_ms, TICKS_PER_SEC);
        platform().timeout_add(cur, None, ticks);
        platform().swap(key);
    }
}

/// Ready `t` early, cancelling its pending sleep timeout.
///
/// A no-op if `t` is blocked on a wait queue rather than a bare [`sleep`]
/// (waking a thread blocked on a synchronization object is that object's
/// job, not this one's) or if its timeout already began firing before the
/// cancellation could land.
pub fn wakeup(t: *mut TCB) {
    let key = platform().irq_lock();
    unsafe {
        if (*t).is_pending_on_wait_queue() {
            platform().irq_unlock(key);
            return;
        }
        if platform().timeout_abort(t).is_err() {
            platform().irq_unlock(key);
            return;
        }
        kernel::ready_thread(t);
        if platform().in_isr() {
            platform().irq_unlock(key);
        } else {
            kernel::reschedule(key);
        }
    }
}

/// Change `t`'s priority, re-sorting it into whichever queue it currently
/// occupies (ready or a wait queue) and rescheduling if the change could
/// affect who should be running.
pub fn priority_set(t: *mut TCB, new_prio: Priority) {
    debug_assert!(!platform().in_isr(), "priority_set is not callable from interrupt context");
    let key = platform().irq_lock();
    unsafe {
        let old_prio = (*t).prio;
        if old_prio == new_prio {
            platform().irq_unlock(key);
            return;
        }

        let flags = (*t).state_flags;
        if flags.contains(StateFlags::PENDING) {
            if let Some(wq_ptr) = (*t).pending_wait_q {
                let wq = &mut *wq_ptr;
                wq.remove(t);
                (*t).prio = new_prio;
                wq.insert(t);
            } else {
                (*t).prio = new_prio;
            }
        } else if (*t).link.is_linked() {
            // Only a thread actually linked into the ready queue can be
            // removed from it. A thread that is merely sleeping (`TIMING`
            // set, no `PENDING`) left the ready queue in `sleep` and isn't
            // linked anywhere; inferring ready-queue membership from the
            // absence of `DEAD`/`SUSPENDED` would wrongly reach into that
            // thread's priority slot and corrupt it.
            kernel::with_kernel(|k| {
                k.ready().remove(t);
                (*t).prio = new_prio;
                k.ready().add(t);
            });
        } else {
            (*t).prio = new_prio;
        }
    }
    unsafe {
        kernel::reschedule(key);
    }
}

/// Increment `current`'s scheduler-lock count. While held, `reschedule`
/// won't switch away from `current` no matter what becomes ready. Not
/// callable from interrupt context.
pub fn sched_lock() {
    debug_assert!(!platform().in_isr(), "sched_lock is not callable from interrupt context");
    kernel::with_kernel(|k| unsafe {
        (*k.current()).sched_locked += 1;
    });
}

/// Decrement `current`'s scheduler-lock count and, if it reaches zero,
/// reschedule.
///
/// # Panics
/// If called more times than [`sched_lock`] for the current thread.
pub fn sched_unlock() {
    debug_assert!(!platform().in_isr(), "sched_unlock is not callable from interrupt context");
    let key = platform().irq_lock();
    kernel::with_kernel(|k| unsafe {
        let cur = k.current();
        assert!((*cur).sched_locked > 0, "sched_unlock called with sched_locked == 0");
        (*cur).sched_locked -= 1;
    });
    unsafe {
        kernel::reschedule(key);
    }
}
