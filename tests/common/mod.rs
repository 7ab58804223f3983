use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::Lox;

/// A `Write` sink that can be read back after the session that owns a clone
/// of it is done.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session wired to in-memory stdout/stderr.
pub fn session() -> (Lox, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let lox = Lox::with_streams(Box::new(out.clone()), Box::new(err.clone()));

    (lox, out, err)
}

/// Run `source` in a fresh session: (stdout, stderr, exit code).
pub fn run(source: &str) -> (String, String, i32) {
    let (mut lox, out, err) = session();
    lox.run(source);

    (out.contents(), err.contents(), lox.exit_code())
}
