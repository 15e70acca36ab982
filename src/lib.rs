//! KaaL scheduler core
//!
//! The thread scheduler of a small real-time kernel: the ready queue and
//! its priority bitmap, wait-queue pend/unpend with optional timeouts, the
//! next-thread decision routine, and the public scheduling primitives
//! (`yield_now`, `sleep`, `wakeup`, `priority_set`, `sched_lock`/
//! `sched_unlock`).
//!
//! # Architecture
//!
//! - `bitmap`: fixed-width priority bitset, O(1) `highest()`.
//! - `list`: intrusive doubly-linked list shared by ready and wait queues.
//! - `tcb`: Thread Control Block — the one type every queue links.
//! - `ready_queue`: per-priority ready lists plus the bitmap.
//! - `wait_queue`: priority-ordered pend queue used by synchronization
//!   objects (out of scope here).
//! - `collaborators`: the traits this crate *consumes* — interrupt lock,
//!   context switch, timeout service — implemented by an embedding kernel.
//! - `kernel`: the scheduler singleton and its decision routine.
//! - `api`: the public scheduling primitives.
//!
//! This crate never allocates: every TCB is owned and preallocated by its
//! creator, and queue nodes are intrusive fields inside the TCB.
//!
//! # Safety & concurrency
//!
//! All scheduler state is protected by the single interrupt lock supplied
//! through [`collaborators::Platform`]; this crate is uniprocessor-only and
//! performs no internal locking beyond what that lock already guarantees.

#![cfg_attr(not(test), no_std)]

pub mod api;
pub mod bitmap;
pub mod collaborators;
pub mod components;
pub mod config;
pub mod debug;
pub mod kernel;
pub mod list;
pub mod tcb;
pub mod ready_queue;
pub mod time;
pub mod timeout;
pub mod wait_queue;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{
    current, pend, pend_current, priority_get, priority_set, sched_lock, sched_unlock, sleep,
    wakeup, yield_now,
};
pub use collaborators::{ContextSwitch, IrqController, IrqKey, Platform};
pub use config::{Priority, FOREVER};
pub use tcb::{StateFlags, ThreadState, TCB};
pub use timeout::TimeoutService;
