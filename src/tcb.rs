//! Thread Control Block
//!
//! The one struct every scheduler queue links: the ready queue, a
//! synchronization object's wait queue, and (conceptually) the platform's
//! timeout service all thread through the TCB's own fields rather than
//! boxing or allocating separate queue nodes.

use crate::config::Priority;
use crate::list::{Linked, ListLink};
use crate::wait_queue::WaitQueue;

bitflags::bitflags! {
    /// Thread state bits, independent of (and narrower than) [`ThreadState`].
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct StateFlags: u8 {
        /// Blocked on a wait queue (a synchronization object, or sleeping).
        const PENDING   = 0b0001;
        /// Has a live timeout registered with the platform's timeout service.
        const TIMING    = 0b0010;
        /// Terminated; never scheduled again.
        const DEAD      = 0b0100;
        /// Administratively held off the ready queue.
        const SUSPENDED = 0b1000;
    }
}

/// A thread's pending timeout bookkeeping.
///
/// `wait_q` records which wait queue (if any) this thread is linked into
/// while its timeout is live, so [`crate::api::wakeup`] can distinguish "the
/// timeout already fired and removed us" from "still pending" without
/// consulting the platform.
pub struct Timeout {
    pub wait_q: Option<*mut WaitQueue>,
}

impl Timeout {
    const fn none() -> Self {
        Self { wait_q: None }
    }
}

/// The externally observable state of a thread, derived from its flags and
/// whether it is the thread currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Running,
    Ready,
    Pending,
    Sleeping,
    Suspended,
    Dead,
}

/// Thread Control Block.
///
/// Callers own and preallocate every TCB; this crate never allocates one.
/// `prio`, `link`, and `state_flags` are public because the scheduler's own
/// modules (ready queue, wait queue, kernel) all need direct field access
/// under the interrupt lock — there is no executor-facing API surface here,
/// only the crate-internal one assembled in [`crate::api`].
pub struct TCB {
    pub prio: Priority,
    pub link: ListLink,
    pub state_flags: StateFlags,
    pub sched_locked: u32,
    pub timeout: Timeout,
    /// The wait queue this thread is linked into while `PENDING`, whether
    /// or not it was pended with a timeout. Distinct from `timeout.wait_q`,
    /// which is only meaningful for *timed* waits.
    pub pending_wait_q: Option<*mut WaitQueue>,
}

impl TCB {
    /// A freshly constructed, unlinked TCB at the given priority.
    pub const fn new(prio: Priority) -> Self {
        Self {
            prio,
            link: ListLink::new(),
            state_flags: StateFlags::empty(),
            sched_locked: 0,
            timeout: Timeout::none(),
            pending_wait_q: None,
        }
    }

    /// Whether this thread is still linked into the timeout service's
    /// bookkeeping for a wait queue (as opposed to a bare [`crate::api::sleep`]
    /// with no wait queue).
    #[inline]
    pub fn is_pending_on_wait_queue(&self) -> bool {
        self.timeout.wait_q.is_some()
    }

    /// Derive the externally observable state.
    pub fn thread_state(&self, is_current: bool) -> ThreadState {
        if self.state_flags.contains(StateFlags::DEAD) {
            return ThreadState::Dead;
        }
        if self.state_flags.contains(StateFlags::SUSPENDED) {
            return ThreadState::Suspended;
        }
        if self.state_flags.contains(StateFlags::PENDING) {
            return ThreadState::Pending;
        }
        if self.state_flags.contains(StateFlags::TIMING) {
            return ThreadState::Sleeping;
        }
        if is_current {
            ThreadState::Running
        } else {
            ThreadState::Ready
        }
    }
}

impl Linked for TCB {
    fn link(&self) -> &ListLink {
        &self.link
    }
}
