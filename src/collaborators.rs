//! Platform collaborators
//!
//! The interfaces an embedding kernel implements and hands to this crate at
//! boot: locking interrupts, switching context, and driving timeouts. This
//! crate only ever calls through these traits — it never touches an
//! interrupt controller or a register file directly.

use spin::Mutex;

/// A linear capability representing "interrupts are locked".
///
/// Produced by [`IrqController::irq_lock`] and consumed exactly once, either
/// by [`IrqController::irq_unlock`] or by [`ContextSwitch::swap`]. Dropping
/// one unconsumed is a bug: it means some code path returned without either
/// restoring interrupts or handing control to the next thread.
pub struct IrqKey {
    state: usize,
    consumed: bool,
}

impl IrqKey {
    /// Wrap the interrupt-controller-specific saved state into a key.
    ///
    /// Only an [`IrqController`] implementation should call this — it's the
    /// one side that knows what `state` means.
    pub fn new(state: usize) -> Self {
        Self {
            state,
            consumed: false,
        }
    }

    /// Unwrap the saved state, marking the key consumed.
    pub fn consume(mut self) -> usize {
        self.consumed = true;
        self.state
    }
}

impl Drop for IrqKey {
    fn drop(&mut self) {
        debug_assert!(
            self.consumed,
            "IrqKey dropped without being consumed by irq_unlock or swap"
        );
    }
}

/// Locks and unlocks the platform's interrupt controller.
pub trait IrqController: Sync {
    /// Disable interrupts, returning a key capturing the prior state.
    fn irq_lock(&self) -> IrqKey;

    /// Restore interrupts to the state captured in `key`.
    fn irq_unlock(&self, key: IrqKey);

    /// Whether the calling context is currently inside an interrupt handler.
    fn in_isr(&self) -> bool;
}

/// Performs the actual CPU context switch.
pub trait ContextSwitch: Sync {
    /// Save the calling thread's context, pick and install whichever thread
    /// now heads the ready queue (via [`crate::kernel::install_next`]), and
    /// resume it. Consumes `key`; on uniprocessor hardware this only
    /// returns once this thread is scheduled again.
    fn swap(&self, key: IrqKey);
}

/// Bundles the traits this crate needs from an embedding kernel.
pub trait Platform: IrqController + ContextSwitch + crate::timeout::TimeoutService + Sync {}

impl<T> Platform for T where T: IrqController + ContextSwitch + crate::timeout::TimeoutService + Sync {}

static PLATFORM: Mutex<Option<&'static dyn Platform>> = Mutex::new(None);

/// Register the platform implementation. Call once, at boot, before any
/// scheduling API is used.
///
/// # Panics
/// If called more than once (same single-initialization contract as
/// [`crate::kernel::init`]).
pub fn init_platform(platform: &'static dyn Platform) {
    let mut guard = PLATFORM.lock();
    assert!(guard.is_none(), "collaborators::init_platform called twice");
    *guard = Some(platform);
}

/// The registered platform.
///
/// # Panics
/// If [`init_platform`] has not yet been called.
pub(crate) fn platform() -> &'static dyn Platform {
    let guard = PLATFORM.lock();
    (*guard).expect("platform not initialized: call collaborators::init_platform() during boot")
}

/// Clear the registered platform so the next test can register its own.
#[cfg(test)]
pub(crate) fn reset_platform_for_test() {
    *PLATFORM.lock() = None;
}
