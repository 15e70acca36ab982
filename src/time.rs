//! Millisecond-to-tick conversion

/// Convert a millisecond duration to a tick count, rounding up.
///
/// Ceiling division (`ceil(ms * ticks_per_sec / 1000)`) so a caller asking
/// to sleep for any nonzero duration always waits at least one tick, never
/// zero. The multiply happens in `i64` so a full 32-bit millisecond value
/// times a reasonable tick rate can't overflow `u32` before the divide.
pub fn ms_to_ticks(ms: i32, ticks_per_sec: u32) -> u32 {
    debug_assert!(ms >= 0, "ms_to_ticks expects a non-negative duration");
    let numerator = ms as i64 * ticks_per_sec as i64;
    ((numerator + 999) / 1000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_whole_ticks() {
        // 100 ticks/sec => 10ms per tick.
        assert_eq!(ms_to_ticks(0, 100), 0);
        assert_eq!(ms_to_ticks(1, 100), 1);
        assert_eq!(ms_to_ticks(10, 100), 1);
        assert_eq!(ms_to_ticks(11, 100), 2);
        assert_eq!(ms_to_ticks(1000, 100), 100);
    }

    #[test]
    fn monotonic_in_duration() {
        let mut prev = 0;
        for ms in 0..5000 {
            let ticks = ms_to_ticks(ms, 100);
            assert!(ticks >= prev);
            prev = ticks;
        }
    }

    #[test]
    fn large_duration_does_not_overflow() {
        let ticks = ms_to_ticks(i32::MAX, 1000);
        assert!(ticks > 0);
    }
}
