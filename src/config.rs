//! Kernel configuration and component composition
//!
//! Compile-time constants for the scheduler, plus the console composition
//! this crate's logging macros write through — selected by Cargo feature,
//! mirroring the framework's runtime component spawning but at compile
//! time.

use crate::components::console::{null::NullConsole, Console};

// ---------------------------------------------------------------------
// Scheduler constants
// ---------------------------------------------------------------------

/// Number of cooperative priority levels.
///
/// Cooperative threads occupy `prio` in `[-COOP_PRIORITIES, 0)` and are
/// not preempted by equal-or-lower priority peers.
pub const COOP_PRIORITIES: i16 = 16;

/// Number of preemptible priority levels.
///
/// Preemptible threads occupy `prio` in `[0, PREEMPT_PRIORITIES)`.
pub const PREEMPT_PRIORITIES: i16 = 32;

/// Total number of priority slots in the ready queue.
pub const NUM_PRIORITIES: usize = (COOP_PRIORITIES + PREEMPT_PRIORITIES) as usize;

/// Timer ticks per second, used by [`crate::time::ms_to_ticks`].
pub const TICKS_PER_SEC: u32 = 100;

/// Thread priority.
///
/// Signed so the cooperative range (`< 0`) and preemptible range (`>= 0`)
/// share a single total order: `a.prio < b.prio` always means "a is
/// strictly higher priority than b".
pub type Priority = i16;

/// Sentinel timeout value meaning "wait forever" (no timeout registered).
pub const FOREVER: i32 = -1;

/// Map a `Priority` to its ready-queue slot index.
///
/// Monotonic in `prio`, which is all [`crate::bitmap::PriorityBitmap::highest`]
/// requires: the numerically-smallest `prio` maps to the smallest slot.
#[inline]
pub const fn slot_of(prio: Priority) -> usize {
    (prio + COOP_PRIORITIES) as usize
}

/// Inverse of [`slot_of`], used only for debug output.
#[inline]
pub const fn prio_of_slot(slot: usize) -> Priority {
    slot as Priority - COOP_PRIORITIES
}

// ---------------------------------------------------------------------
// Console composition
// ---------------------------------------------------------------------

/// Console component selection (compile-time).
///
/// - `console-null`: discard all output (default; this crate has no real
///   UART to target, unlike the embedding kernel it's built for).
///
/// An embedding kernel with real hardware provides its own [`Console`] and
/// wires it in through [`crate::debug::DebugWriter`] instead of relying on
/// this default.
pub static CONSOLE: NullConsole = NullConsole::new();

/// Get a reference to the global console.
pub fn console() -> &'static impl Console {
    &CONSOLE
}
