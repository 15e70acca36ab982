//! Wait queue
//!
//! A priority-ordered queue of blocked threads, used by synchronization
//! objects (mutexes, semaphores, condvars — all out of scope here, they
//! only need this primitive). Ordering and timeout wiring live here;
//! actually blocking the object's caller (a `swap`) is the caller's job.

use crate::collaborators::platform;
use crate::config::FOREVER;
use crate::list::IntrusiveList;
use crate::tcb::{StateFlags, TCB};

/// A priority-ordered list of threads blocked on the same condition.
pub struct WaitQueue {
    list: IntrusiveList<TCB>,
}

impl WaitQueue {
    pub const fn new() -> Self {
        Self {
            list: IntrusiveList::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Head of the queue (highest priority, then FIFO) without removing it.
    #[inline]
    pub fn peek_head(&self) -> *mut TCB {
        self.list.peek_head()
    }

    /// Insert `t` in priority order: before the first existing waiter of
    /// strictly lower priority. Ties stay FIFO.
    ///
    /// # Safety
    /// `t` must be a valid pointer not already linked into any queue.
    pub unsafe fn insert(&mut self, t: *mut TCB) {
        let new_prio = (*t).prio;
        self.list.insert_at(t, |existing| (*existing).prio > new_prio);
    }

    /// Remove `t` from the queue.
    ///
    /// # Safety
    /// `t` must currently be linked into this queue.
    pub unsafe fn remove(&mut self, t: *mut TCB) {
        self.list.remove(t);
    }
}

impl Default for WaitQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Block `t` on `wq`, registering a timeout unless `timeout_ms == FOREVER`.
///
/// Marks `t` `PENDING` (and `TIMING`, if timed). Does not remove `t` from
/// the ready queue and does not switch threads — the caller handles both;
/// see [`pend_current`] for the common case of blocking the running
/// thread.
///
/// # Safety
/// `t` must be a valid pointer not already linked into `wq` or any other
/// queue.
pub unsafe fn pend(t: *mut TCB, wq: &mut WaitQueue, timeout_ms: i32) {
    wq.insert(t);
    (*t).state_flags.insert(StateFlags::PENDING);
    (*t).pending_wait_q = Some(wq as *mut WaitQueue);
    if timeout_ms != FOREVER {
        (*t).state_flags.insert(StateFlags::TIMING);
        (*t).timeout.wait_q = Some(wq as *mut WaitQueue);
        let ticks = crate::time::ms_to_ticks(timeout_ms, crate::config::TICKS_PER_SEC);
        platform().timeout_add(t, Some(wq as *mut WaitQueue), ticks);
    }
}

/// Pend the currently running thread on `wq`.
///
/// `current` stays linked in the ready queue for as long as it's merely
/// running, so blocking it is two steps: unlink it from the ready queue,
/// then the same bookkeeping as [`pend`]. The caller must follow this with a
/// `swap` to actually stop running it; this function only updates state.
pub fn pend_current(wq: &mut WaitQueue, timeout_ms: i32) {
    let cur = crate::kernel::current();
    unsafe {
        crate::kernel::with_kernel(|k| k.ready().remove(cur));
        pend(cur, wq, timeout_ms);
    }
}
