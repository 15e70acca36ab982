//! Scheduler core
//!
//! The single piece of global state: which thread is current, and the
//! ready queue it and every other runnable thread compete for. Everything
//! here runs with interrupts already locked by the caller; the
//! `spin::Mutex` wrapper exists for safe interior mutability, not for
//! cross-core contention.

use crate::collaborators::platform;
use crate::ready_queue::ReadyQueue;
use crate::tcb::TCB;
use spin::Mutex;

/// The scheduler's global state.
pub struct Kernel {
    ready: ReadyQueue,
    current: *mut TCB,
}

unsafe impl Send for Kernel {}

impl Kernel {
    fn new(first: *mut TCB) -> Self {
        Self {
            ready: ReadyQueue::new(),
            current: first,
        }
    }

    #[inline]
    pub fn current(&self) -> *mut TCB {
        self.current
    }

    #[inline]
    pub fn ready(&mut self) -> &mut ReadyQueue {
        &mut self.ready
    }

    /// Highest-priority ready thread, without committing to running it.
    ///
    /// # Panics
    /// If the ready queue is empty.
    pub fn peek_next_ready(&self) -> *mut TCB {
        self.ready.peek_next()
    }

    /// Whether the highest-priority ready thread outranks `current`.
    ///
    /// `current` itself is always the head of its own slot (it never left
    /// the ready queue), so when nothing higher-priority has appeared,
    /// `peek_next_ready()` returns `current` and this compares false. A
    /// cooperative thread's negative `prio` already sorts ahead of every
    /// preemptible one, so it is only displaced by another thread becoming
    /// ready at an even higher (more negative) priority — the same rule
    /// this strict comparison already encodes for preemptible threads.
    pub fn must_switch(&self) -> bool {
        let next = self.peek_next_ready();
        unsafe { (*next).prio < (*self.current).prio }
    }

    /// Install the head of the ready queue as current.
    ///
    /// A ready thread stays linked in the ready queue the entire time it's
    /// runnable, including while it's the one running (§3 Data Model: every
    /// TCB with no PENDING/DEAD/SUSPENDED flag appears in exactly one ready
    /// slot) — so this is a peek, not a pop. A thread that actually stops
    /// being ready (pends, sleeps) is removed by the caller (`pend_current`,
    /// `sleep`) *before* `must_switch`/`reschedule` ever run; a thread merely
    /// preempted stays exactly where it is, at the head of its own slot,
    /// and simply stops being `current`.
    ///
    /// The kernel-side half of a context switch: the architecture-specific
    /// half (saving/restoring registers) is the
    /// [`crate::collaborators::ContextSwitch`] implementation's job.
    ///
    /// # Safety
    /// Must be called with interrupts locked.
    pub unsafe fn install_next(&mut self) -> *mut TCB {
        let next = self.ready.peek_next();
        self.current = next;
        next
    }
}

static KERNEL: Mutex<Option<Kernel>> = Mutex::new(None);

/// Initialize the scheduler with `first` as the initially running thread.
///
/// `first` is enqueued onto the ready queue at its own priority, same as any
/// other ready thread (it's simply the one that happens to be running). An
/// embedding kernel still needs a fallback idle thread enqueued at the
/// lowest configured priority so the ready queue is never empty once `first`
/// eventually blocks or sleeps.
pub fn init(first: *mut TCB) {
    let mut guard = KERNEL.lock();
    assert!(guard.is_none(), "kernel::init called twice");
    let mut kernel = Kernel::new(first);
    unsafe {
        kernel.ready.add(first);
    }
    *guard = Some(kernel);
}

/// Run `f` against the initialized kernel.
///
/// # Panics
/// If [`init`] has not yet been called.
pub(crate) fn with_kernel<R>(f: impl FnOnce(&mut Kernel) -> R) -> R {
    let mut guard = KERNEL.lock();
    let k = guard
        .as_mut()
        .expect("scheduler not initialized: call kernel::init()");
    f(k)
}

/// The currently running thread.
pub fn current() -> *mut TCB {
    with_kernel(|k| k.current())
}

/// The thread that would run next if a switch happened right now.
pub fn get_next_ready_thread() -> *mut TCB {
    with_kernel(|k| k.peek_next_ready())
}

/// Dequeue the real head of the ready queue and install it as current.
///
/// Called by a [`crate::collaborators::ContextSwitch`] implementation as the
/// kernel-side half of `swap`, after it has saved the previous thread's
/// context.
///
/// # Safety
/// Must be called with interrupts locked.
pub unsafe fn install_next() -> *mut TCB {
    with_kernel(|k| k.install_next())
}

/// Mark `t` runnable and add it to the ready queue, clearing its pending
/// and timing flags.
///
/// This is the one primitive both [`crate::api::wakeup`] and an expiring
/// timeout use to bring a blocked thread back onto the ready queue.
///
/// # Safety
/// `t` must be a valid pointer, not currently linked into the ready queue.
pub unsafe fn ready_thread(t: *mut TCB) {
    use crate::tcb::StateFlags;
    (*t).state_flags.remove(StateFlags::PENDING | StateFlags::TIMING);
    (*t).timeout.wait_q = None;
    (*t).pending_wait_q = None;
    with_kernel(|k| k.ready().add(t));
}

/// Decide whether to switch threads and act on it.
///
/// Not callable from interrupt context. If `current.sched_locked > 0`, or
/// if no ready thread outranks `current`, this just restores interrupts.
/// Otherwise it hands `key` to [`crate::collaborators::ContextSwitch::swap`].
///
/// # Safety
/// Must be called with interrupts locked (i.e. holding `key`), and not from
/// within an ISR.
pub unsafe fn reschedule(key: crate::collaborators::IrqKey) {
    debug_assert!(!platform().in_isr(), "reschedule is not callable from interrupt context");

    let locked = with_kernel(|k| (*k.current()).sched_locked > 0);
    if locked {
        platform().irq_unlock(key);
        return;
    }

    if with_kernel(|k| k.must_switch()) {
        platform().swap(key);
    } else {
        platform().irq_unlock(key);
    }
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    *KERNEL.lock() = None;
}
