//! Kernel components
//!
//! Minimal components the scheduler's logging needs. Not full drivers —
//! just enough that `kprintln!` has somewhere to write.

pub mod console;
