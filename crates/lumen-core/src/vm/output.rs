//! Output capture for VM execution
//!
//! The VM prints results to any `io::Write` sink. [`OutputCapture`] is an
//! in-memory sink whose clones share one buffer, so a caller can hand one
//! clone to the VM and read what was printed through another.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

/// Shared in-memory output buffer
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl OutputCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.borrow()).into_owned()
    }

    /// Captured output split into lines
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Discard everything captured so far
    pub fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }
}

impl io::Write for OutputCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn clones_share_the_buffer() {
        let capture = OutputCapture::new();
        let mut writer = capture.clone();
        writeln!(writer, "first").unwrap();
        writeln!(writer, "second").unwrap();

        assert_eq!(capture.contents(), "first\nsecond\n");
        assert_eq!(capture.lines(), vec!["first", "second"]);

        capture.clear();
        assert!(capture.contents().is_empty());
    }
}
