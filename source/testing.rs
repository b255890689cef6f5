// Shared test-only scaffolding: an in-memory Socket so the connection,
// folder, and parser machinery can be exercised against the literal wire
// transcripts from spec §8 without a live Dovecot (the way the teacher's own
// #[cfg(test)] mod tests in source/imap.rs feeds byte slices straight to the
// peg grammar, extended one level up to drive a full Socket).

use crate::socket::Socket;
use std::{cell, collections::VecDeque, io, rc};

#[derive(Clone)]
pub struct Mock {
  to_server: rc::Rc<cell::RefCell<Vec<u8>>>,
  from_server: rc::Rc<cell::RefCell<VecDeque<u8>>>,
}

impl Mock {
  pub fn new() -> Self {
    Self {
      to_server: rc::Rc::new(cell::RefCell::new(Vec::new())),
      from_server: rc::Rc::new(cell::RefCell::new(VecDeque::new())),
    }
  }

  pub fn with_server_bytes(bytes: &[u8]) -> Self {
    let mock = Self::new();
    mock.push_server_bytes(bytes);
    mock
  }

  pub fn push_server_bytes(&self, bytes: &[u8]) {
    self.from_server.borrow_mut().extend(bytes.iter().copied());
  }

  pub fn sent(&self) -> Vec<u8> {
    self.to_server.borrow().clone()
  }

  pub fn take_sent(&self) -> Vec<u8> {
    std::mem::take(&mut self.to_server.borrow_mut())
  }
}

impl Socket for Mock {
  fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
    self.to_server.borrow_mut().extend_from_slice(bytes);
    Ok(())
  }

  fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    let mut queue = self.from_server.borrow_mut();
    let n = std::cmp::min(buf.len(), queue.len());
    for slot in buf.iter_mut().take(n) {
      *slot = queue.pop_front().unwrap();
    }
    if n == 0 {
      return Err(io::Error::new(
        io::ErrorKind::WouldBlock,
        "no more data queued",
      ));
    }
    Ok(n)
  }

  fn is_secured(&self) -> bool {
    false
  }
}
