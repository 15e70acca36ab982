//! Ready queue
//!
//! Per-priority FIFO lists plus the bitmap that makes picking the
//! highest-priority non-empty one O(1).

use crate::bitmap::PriorityBitmap;
use crate::config::{slot_of, NUM_PRIORITIES};
use crate::list::IntrusiveList;
use crate::tcb::TCB;

/// The set of runnable-and-waiting-to-run threads, bucketed by priority.
pub struct ReadyQueue {
    slots: [IntrusiveList<TCB>; NUM_PRIORITIES],
    bitmap: PriorityBitmap,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| IntrusiveList::new()),
            bitmap: PriorityBitmap::new(),
        }
    }

    /// Add `t` to the tail of its priority's list.
    ///
    /// # Safety
    /// `t` must be a valid pointer, not already linked into any queue.
    pub unsafe fn add(&mut self, t: *mut TCB) {
        let slot = slot_of((*t).prio);
        self.slots[slot].append(t);
        self.bitmap.set(slot);
    }

    /// Remove `t` from its priority's list.
    ///
    /// # Safety
    /// `t` must currently be linked into this ready queue.
    pub unsafe fn remove(&mut self, t: *mut TCB) {
        let slot = slot_of((*t).prio);
        self.slots[slot].remove(t);
        if self.slots[slot].is_empty() {
            self.bitmap.clear(slot);
        }
    }

    /// The thread that would run next, without removing it.
    ///
    /// # Panics
    /// If the ready queue is empty (callers guarantee an always-ready idle
    /// thread occupies the lowest-priority slot).
    pub fn peek_next(&self) -> *mut TCB {
        let slot = self.bitmap.highest();
        let head = self.slots[slot].peek_head();
        debug_assert!(!head.is_null());
        head
    }

}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcb(prio: crate::config::Priority) -> TCB {
        TCB::new(prio)
    }

    #[test]
    fn picks_highest_priority_first() {
        let mut rq = ReadyQueue::new();
        let mut low = tcb(5);
        let mut high = tcb(-3);
        unsafe {
            rq.add(&mut low);
            rq.add(&mut high);
            assert_eq!(rq.peek_next(), &mut high as *mut TCB);
        }
    }

    #[test]
    fn fifo_within_same_priority() {
        let mut rq = ReadyQueue::new();
        let mut a = tcb(2);
        let mut b = tcb(2);
        unsafe {
            rq.add(&mut a);
            rq.add(&mut b);
            assert_eq!(rq.peek_next(), &mut a as *mut TCB);
            rq.remove(&mut a);
            assert_eq!(rq.peek_next(), &mut b as *mut TCB);
        }
    }

    #[test]
    fn removing_last_of_a_priority_clears_its_bit() {
        let mut rq = ReadyQueue::new();
        let mut only = tcb(0);
        let mut other = tcb(10);
        unsafe {
            rq.add(&mut only);
            rq.add(&mut other);
            rq.remove(&mut only);
            assert_eq!(rq.peek_next(), &mut other as *mut TCB);
        }
    }
}
