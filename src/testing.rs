//! In-memory [`Platform`](crate::collaborators::Platform) for tests.
//!
//! `MockPlatform` has no real interrupt controller and no real stack
//! switch: `swap` simply asks the scheduler core for the new head of the
//! ready queue and installs it, then returns — which is all a host-thread
//! test needs to drive every public API function and observe the resulting
//! run order. Gated behind the `testing` Cargo feature (mirrors the
//! teacher's own feature of the same name) and always available under
//! `cfg(test)`.

use crate::collaborators::{ContextSwitch, IrqController, IrqKey};
use crate::kernel;
use crate::tcb::TCB;
use crate::timeout::{AbortRace, TickTimeoutQueue, TimeoutService};
use crate::wait_queue::WaitQueue;
use spin::Mutex;

const RUN_LOG_CAPACITY: usize = 64;

struct RunLogInner {
    entries: [*mut TCB; RUN_LOG_CAPACITY],
    len: usize,
}

unsafe impl Send for RunLogInner {}

/// Records, in order, every thread [`MockPlatform::swap`] installed as
/// current. Fixed capacity like the rest of this crate's collections: a
/// scenario that overflows it is a test-authoring bug, not something to
/// handle gracefully.
pub struct RunLog {
    inner: Mutex<RunLogInner>,
}

impl RunLog {
    const fn new() -> Self {
        Self {
            inner: Mutex::new(RunLogInner {
                entries: [core::ptr::null_mut(); RUN_LOG_CAPACITY],
                len: 0,
            }),
        }
    }

    fn push(&self, t: *mut TCB) {
        let mut inner = self.inner.lock();
        let len = inner.len;
        assert!(len < RUN_LOG_CAPACITY, "RunLog overflow: raise RUN_LOG_CAPACITY");
        inner.entries[len] = t;
        inner.len = len + 1;
    }

    /// How many switches have been recorded.
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `i`th thread installed as current, oldest first.
    pub fn get(&self, i: usize) -> *mut TCB {
        let inner = self.inner.lock();
        assert!(i < inner.len, "RunLog index out of range");
        inner.entries[i]
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A `Platform` with no real hardware: interrupt locking is a plain nesting
/// counter, `in_isr` is toggled explicitly by the test, timeouts run on a
/// [`TickTimeoutQueue`] the test advances by hand, and `swap` installs the
/// next thread immediately instead of actually switching stacks.
pub struct MockPlatform {
    irq_depth: Mutex<u32>,
    in_isr: Mutex<bool>,
    timeouts: TickTimeoutQueue,
    run_log: RunLog,
}

impl MockPlatform {
    pub const fn new() -> Self {
        Self {
            irq_depth: Mutex::new(0),
            in_isr: Mutex::new(false),
            timeouts: TickTimeoutQueue::new(),
            run_log: RunLog::new(),
        }
    }

    /// Mark the calling context as "inside an interrupt handler" until
    /// [`Self::exit_isr`], for scenarios that ready a thread from a tick
    /// handler rather than from thread context.
    pub fn enter_isr(&self) {
        *self.in_isr.lock() = true;
    }

    pub fn exit_isr(&self) {
        *self.in_isr.lock() = false;
    }

    /// Advance the mock timer by one tick, readying any thread whose
    /// timeout has expired.
    pub fn tick(&self) {
        self.timeouts.tick();
    }

    pub fn run_log(&self) -> &RunLog {
        &self.run_log
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqController for MockPlatform {
    fn irq_lock(&self) -> IrqKey {
        let mut depth = self.irq_depth.lock();
        let prior = *depth;
        *depth += 1;
        IrqKey::new(prior as usize)
    }

    fn irq_unlock(&self, key: IrqKey) {
        *self.irq_depth.lock() = key.consume() as u32;
    }

    fn in_isr(&self) -> bool {
        *self.in_isr.lock()
    }
}

impl ContextSwitch for MockPlatform {
    fn swap(&self, key: IrqKey) {
        *self.irq_depth.lock() = key.consume() as u32;
        let next = unsafe { kernel::install_next() };
        self.run_log.push(next);
    }
}

impl TimeoutService for MockPlatform {
    fn timeout_add(&self, thread: *mut TCB, wait_q: Option<*mut WaitQueue>, ticks: u32) {
        self.timeouts.timeout_add(thread, wait_q, ticks);
    }

    fn timeout_abort(&self, thread: *mut TCB) -> Result<(), AbortRace> {
        self.timeouts.timeout_abort(thread)
    }
}

#[cfg(test)]
mod scenarios {
    //! End-to-end scenarios from spec §8, each driving the public API
    //! through a [`MockPlatform`] and checking the resulting run order and
    //! queue invariants. Every test owns its own leaked `MockPlatform` and
    //! resets the global kernel/platform singletons first; `SERIAL` forces
    //! them to run one at a time since both singletons are process-wide.
    use super::*;
    use crate::api;
    use crate::collaborators;
    use crate::config::FOREVER;
    use crate::tcb::StateFlags;
    use crate::wait_queue::{pend, WaitQueue};
    use std::sync::Mutex as StdMutex;

    static SERIAL: StdMutex<()> = StdMutex::new(());

    /// Reset the process-wide kernel/platform singletons and hand back a
    /// fresh, leaked `'static` platform for the caller to register.
    ///
    /// No idle thread is needed: `kernel::init` enqueues `first` onto the
    /// ready queue itself, and a thread that never blocks or sleeps never
    /// leaves it, so the ready queue is never observably empty in these
    /// scenarios.
    fn setup() -> &'static MockPlatform {
        kernel::reset_for_test();
        collaborators::reset_platform_for_test();
        let platform: &'static MockPlatform = Box::leak(Box::new(MockPlatform::new()));
        collaborators::init_platform(platform);
        platform
    }

    #[test]
    fn s1_strict_priority_preemption() {
        let _guard = SERIAL.lock().unwrap();
        let platform = setup();
        let mut a = TCB::new(5);
        let mut b = TCB::new(3);

        kernel::init(&mut a as *mut TCB);
        assert_eq!(kernel::current(), &mut a as *mut TCB);

        // B becomes ready from "ISR context"; the tick handler only readies
        // it and must not itself reschedule.
        platform.enter_isr();
        unsafe {
            kernel::ready_thread(&mut b as *mut TCB);
        }
        platform.exit_isr();

        // ISR-exit path (external to this crate): lock interrupts and
        // reschedule now that we're back in thread context.
        let key = platform.irq_lock();
        unsafe {
            kernel::reschedule(key);
        }

        assert_eq!(kernel::current(), &mut b as *mut TCB);
        assert_eq!(platform.run_log().len(), 1);
        assert_eq!(platform.run_log().get(0), &mut b as *mut TCB);
        // A is still queued, at the head of its own priority slot.
        unsafe {
            kernel::with_kernel(|k| assert_eq!(k.ready().peek_next(), &mut a as *mut TCB));
        }
    }

    #[test]
    fn s2_fifo_within_priority_rotates_on_yield() {
        let _guard = SERIAL.lock().unwrap();
        let platform = setup();
        let mut a = TCB::new(4);
        let mut b = TCB::new(4);
        let mut c = TCB::new(4);

        kernel::init(&mut a as *mut TCB);
        unsafe {
            kernel::with_kernel(|k| {
                k.ready().add(&mut b as *mut TCB);
                k.ready().add(&mut c as *mut TCB);
            });
        }

        let order: [*mut TCB; 3] = [&mut b, &mut c, &mut a];
        for (i, &expected) in order.iter().enumerate() {
            api::yield_now();
            assert_eq!(kernel::current(), expected, "yield #{i}");
        }
        // One more full lap: B, C, A again.
        for &expected in order.iter() {
            api::yield_now();
            assert_eq!(kernel::current(), expected);
        }
        assert_eq!(platform.run_log().len(), 6);
    }

    #[test]
    fn s3_cooperative_thread_resists_preemption_until_it_blocks() {
        let _guard = SERIAL.lock().unwrap();
        let platform = setup();
        let mut coop = TCB::new(-1);
        let mut preempt = TCB::new(3);
        let mut c = TCB::new(2);

        kernel::init(&mut coop as *mut TCB);
        unsafe {
            kernel::with_kernel(|k| k.ready().add(&mut preempt as *mut TCB));
        }

        // C is sleeping; wake it from thread context (not ISR).
        let ticks = crate::time::ms_to_ticks(50, crate::config::TICKS_PER_SEC);
        platform.timeout_add(&mut c as *mut TCB, None, ticks);
        api::wakeup(&mut c as *mut TCB);

        // Coop is never preemptible: it remains current and head of its own
        // slot, so wakeup's reschedule found nothing to switch to.
        assert_eq!(kernel::current(), &mut coop as *mut TCB);
        assert!(platform.run_log().is_empty());

        // A bare yield wouldn't hand off to a lower-priority thread (coop
        // is alone at prio -1, so rotating in place changes nothing) — coop
        // has to actually give up the CPU by blocking, matching the
        // "voluntarily yields/pends" wording: only pend (or sleep) removes
        // it from the ready queue entirely.
        let mut wq = WaitQueue::new();
        let key = platform.irq_lock();
        api::pend_current(&mut wq, FOREVER);
        platform.swap(key);

        // Now the highest-priority *preemptible* ready thread runs: C's
        // prio 2 outranks preempt's prio 3 (lower number wins).
        assert_eq!(kernel::current(), &mut c as *mut TCB);
        assert_eq!(platform.run_log().len(), 1);
    }

    #[test]
    fn s4_wait_queue_orders_by_priority_then_fifo() {
        let _guard = SERIAL.lock().unwrap();
        let _platform = setup();
        let mut idle = TCB::new(20);
        kernel::init(&mut idle as *mut TCB);

        let mut wq = WaitQueue::new();
        let mut t1 = TCB::new(6);
        let mut t2 = TCB::new(4);
        let mut t3 = TCB::new(4);
        let mut t4 = TCB::new(2);

        unsafe {
            pend(&mut t1 as *mut TCB, &mut wq, FOREVER);
            pend(&mut t2 as *mut TCB, &mut wq, FOREVER);
            pend(&mut t3 as *mut TCB, &mut wq, FOREVER);
            pend(&mut t4 as *mut TCB, &mut wq, FOREVER);
        }

        let order = [&mut t4, &mut t2, &mut t3, &mut t1];
        for expected in order {
            let head = wq.peek_head();
            assert_eq!(head, expected as *mut TCB);
            unsafe {
                wq.remove(head);
            }
        }
        assert!(wq.is_empty());
        for t in [&mut t1, &mut t2, &mut t3, &mut t4] {
            assert!(t.state_flags.contains(StateFlags::PENDING));
        }
    }

    #[test]
    fn s5_wakeup_races_timer_and_wins_without_double_ready() {
        let _guard = SERIAL.lock().unwrap();
        let platform = setup();
        let mut idle = TCB::new(20);
        let mut t = TCB::new(5);

        kernel::init(&mut idle as *mut TCB);

        // T sleeps for 10 ticks; at tick 9, another thread calls wakeup.
        platform.timeout_add(&mut t as *mut TCB, None, 10);
        t.state_flags.insert(StateFlags::TIMING);

        for _ in 0..9 {
            platform.tick();
        }
        api::wakeup(&mut t as *mut TCB);
        assert!(!t.state_flags.contains(StateFlags::TIMING));

        // The timer firing on tick 10 must be a no-op: the abort already
        // removed T's entry, so tick() has nothing left to ready.
        platform.tick();
        // No panic, no double-add: readying an already-ready thread would
        // trip the intrusive list's "already linked" debug assertion.
    }

    #[test]
    fn s6_sched_lock_defers_preemption_to_unlock() {
        let _guard = SERIAL.lock().unwrap();
        let platform = setup();
        let mut c = TCB::new(5);
        let mut h = TCB::new(1);

        kernel::init(&mut c as *mut TCB);
        api::sched_lock();

        // H becomes ready while C holds the scheduler lock.
        unsafe {
            kernel::ready_thread(&mut h as *mut TCB);
        }
        assert_eq!(kernel::current(), &mut c as *mut TCB);
        assert!(platform.run_log().is_empty());

        // Unlocking reaches zero and switches immediately.
        api::sched_unlock();
        assert_eq!(kernel::current(), &mut h as *mut TCB);
        assert_eq!(platform.run_log().len(), 1);
    }

    #[test]
    fn timed_wait_queue_entry_is_unlinked_from_its_queue_before_tick_readies_it() {
        let _guard = SERIAL.lock().unwrap();
        let platform = setup();
        let mut idle = TCB::new(20);
        kernel::init(&mut idle as *mut TCB);

        let mut wq = WaitQueue::new();
        let mut other = TCB::new(3);
        let mut t = TCB::new(3);
        unsafe {
            pend(&mut other as *mut TCB, &mut wq, FOREVER);
            pend(&mut t as *mut TCB, &mut wq, 10);
        }
        assert_eq!(wq.peek_head(), &mut other as *mut TCB);

        for _ in 0..10 {
            platform.tick();
        }

        // The timeout readied `t` without corrupting `other`'s place on the
        // queue, and `t` itself came off `wq` rather than staying linked
        // there while also being linked into the ready queue.
        assert!(!t.state_flags.contains(StateFlags::PENDING | StateFlags::TIMING));
        assert!(t.link.is_linked());
        unsafe {
            assert_eq!(wq.peek_head(), &mut other as *mut TCB);
            wq.remove(&mut other as *mut TCB);
        }
        assert!(wq.is_empty());
        unsafe {
            kernel::with_kernel(|k| assert_eq!(k.ready().peek_next(), &mut t as *mut TCB));
        }
    }

    #[test]
    fn priority_set_on_sleeping_thread_does_not_touch_ready_queue() {
        let _guard = SERIAL.lock().unwrap();
        let platform = setup();
        let mut a = TCB::new(4);
        let mut b = TCB::new(4);
        let mut sleeper = TCB::new(6);

        kernel::init(&mut a as *mut TCB);
        unsafe {
            kernel::with_kernel(|k| k.ready().add(&mut b as *mut TCB));
        }

        // Put `sleeper` to sleep: it leaves the ready queue entirely and is
        // linked nowhere while its timeout is outstanding.
        platform.timeout_add(&mut sleeper as *mut TCB, None, 50);
        sleeper.state_flags.insert(StateFlags::TIMING);
        assert!(!sleeper.link.is_linked());

        // Changing its priority must not reach into any ready-queue slot —
        // there previously was no `link.is_linked()` check, so this would
        // corrupt priority 4's slot (shared by `a` and `b`) instead.
        api::priority_set(&mut sleeper as *mut TCB, 4);
        assert_eq!(sleeper.prio, 4);
        assert!(!sleeper.link.is_linked());

        // `a` and `b` are still intact at priority 4.
        unsafe {
            kernel::with_kernel(|k| assert_eq!(k.ready().peek_next(), &mut a as *mut TCB));
            kernel::with_kernel(|k| k.ready().remove(&mut a as *mut TCB));
            kernel::with_kernel(|k| assert_eq!(k.ready().peek_next(), &mut b as *mut TCB));
        }
    }

    #[test]
    fn priority_set_reorders_ready_queue_slot() {
        let _guard = SERIAL.lock().unwrap();
        let _platform = setup();
        let mut low = TCB::new(20);
        let mut mid = TCB::new(10);
        let mut high = TCB::new(1);

        kernel::init(&mut low as *mut TCB);
        unsafe {
            kernel::with_kernel(|k| {
                k.ready().add(&mut mid as *mut TCB);
                k.ready().add(&mut high as *mut TCB);
            });
        }

        // Raise `low`'s priority above everything else; it must move into
        // its new slot, not stay wedged in the old one.
        api::priority_set(&mut low as *mut TCB, 0);
        unsafe {
            kernel::with_kernel(|k| assert_eq!(k.ready().peek_next(), &mut low as *mut TCB));
        }
    }

    #[test]
    fn priority_set_reorders_wait_queue() {
        let _guard = SERIAL.lock().unwrap();
        let _platform = setup();
        let mut idle = TCB::new(20);
        kernel::init(&mut idle as *mut TCB);

        let mut wq = WaitQueue::new();
        let mut a = TCB::new(5);
        let mut b = TCB::new(3);
        unsafe {
            pend(&mut a as *mut TCB, &mut wq, FOREVER);
            pend(&mut b as *mut TCB, &mut wq, FOREVER);
        }
        assert_eq!(wq.peek_head(), &mut b as *mut TCB);

        // Promote `a` above `b`; it must now head the wait queue.
        api::priority_set(&mut a as *mut TCB, 1);
        assert_eq!(wq.peek_head(), &mut a as *mut TCB);
    }
}
