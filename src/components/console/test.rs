//! Buffering console component, used only by this crate's own tests.
//!
//! Captures output into a fixed-size buffer instead of a UART so a test can
//! assert on what the logging macros actually wrote, without pulling in
//! `std`'s `io` or an allocator.

use super::Console;
use spin::Mutex;

const CAPACITY: usize = 1024;

struct Inner {
    buf: [u8; CAPACITY],
    len: usize,
}

unsafe impl Send for Inner {}

/// Discards bytes once `CAPACITY` is reached rather than panicking — a test
/// that overflows it should shrink its expected output, not crash the run.
pub struct TestConsole {
    inner: Mutex<Inner>,
}

impl TestConsole {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                buf: [0; CAPACITY],
                len: 0,
            }),
        }
    }

    /// Everything written so far, as UTF-8 (the console only ever receives
    /// valid `&str` input through [`Console::puts`]).
    pub fn contents<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let inner = self.inner.lock();
        let s = core::str::from_utf8(&inner.buf[..inner.len]).unwrap_or("<invalid utf8>");
        f(s)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.len = 0;
    }
}

impl Default for TestConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TestConsole {
    fn putc(&self, c: u8) {
        let mut inner = self.inner.lock();
        if inner.len < CAPACITY {
            let len = inner.len;
            inner.buf[len] = c;
            inner.len += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_written_bytes() {
        let console = TestConsole::new();
        console.puts("hello\n");
        console.contents(|s| assert_eq!(s, "hello\r\n"));
    }

    #[test]
    fn clear_empties_the_buffer() {
        let console = TestConsole::new();
        console.puts("x");
        console.clear();
        console.contents(|s| assert_eq!(s, ""));
    }
}
