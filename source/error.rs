// Error taxonomy for the IMAP engine.
//
// Mirrors the hand-rolled style the rest of the stack uses for its own error
// types (no thiserror): a plain enum with manual Display/std::error::Error
// impls. Call sites that need to distinguish a recoverable command failure
// from a poisoned connection downcast anyhow::Error into this type, the same
// way the sync engine used to downcast its database error out of anyhow.

use std::{error, fmt, io};

#[derive(Debug)]
pub enum Error {
  /// Grammar mismatch while parsing a response. Carries the last line read
  /// and the cursor offset into it, so a caller can log context.
  ProtocolParse { line: Vec<u8>, cursor: usize },
  /// A tagged NO/BAD, or a response that closed without a tagged done.
  Command {
    verb: String,
    error_log: String,
    reason: String,
  },
  /// Operation requires a different folder/connection state.
  IllegalState(String),
  FolderNotFound(String),
  MessageNotFound(u64),
  InvalidFolderName(String),
  FolderAlreadyOpen(String),
  AlreadyConnected,
  NotConnected,
  /// Capability absent, or requested mode unavailable.
  OperationNotSupported(String),
  OperationTimedOut,
  InvalidArgument(String),
  Io(io::Error),
}

impl fmt::Display for Error {
  fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::ProtocolParse { line, cursor } => write!(
        formatter,
        "protocol parse error at byte {cursor} of {:?}",
        String::from_utf8_lossy(line)
      ),
      Error::Command {
        verb,
        error_log,
        reason,
      } => write!(formatter, "{verb} failed: {reason} ({error_log})"),
      Error::IllegalState(message) => write!(formatter, "illegal state: {message}"),
      Error::FolderNotFound(path) => write!(formatter, "folder not found: {path}"),
      Error::MessageNotFound(number) => write!(formatter, "message not found: {number}"),
      Error::InvalidFolderName(name) => write!(formatter, "invalid folder name: {name}"),
      Error::FolderAlreadyOpen(path) => write!(formatter, "folder already open: {path}"),
      Error::AlreadyConnected => write!(formatter, "already connected"),
      Error::NotConnected => write!(formatter, "not connected"),
      Error::OperationNotSupported(what) => write!(formatter, "operation not supported: {what}"),
      Error::OperationTimedOut => write!(formatter, "operation timed out"),
      Error::InvalidArgument(message) => write!(formatter, "invalid argument: {message}"),
      Error::Io(error) => write!(formatter, "{error}"),
    }
  }
}

impl error::Error for Error {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      Error::Io(error) => Some(error),
      _ => None,
    }
  }
}

impl From<io::Error> for Error {
  fn from(error: io::Error) -> Self {
    Error::Io(error)
  }
}

impl Error {
  /// Whether this error should poison the owning Connection (vs. being
  /// recoverable for the caller while folder/connection invariants hold).
  pub fn poisons_connection(&self) -> bool {
    matches!(
      self,
      Error::ProtocolParse { .. } | Error::Io(_) | Error::OperationTimedOut
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;

  #[test]
  fn command_error_display() {
    let error = Error::Command {
      verb: "SELECT".to_string(),
      error_log: "a001 NO [TRYCREATE] no such mailbox".to_string(),
      reason: "no such mailbox".to_string(),
    };
    assert_eq!(
      "SELECT failed: no such mailbox (a001 NO [TRYCREATE] no such mailbox)",
      error.to_string()
    );
  }

  #[test]
  fn poisoning() {
    assert!(Error::OperationTimedOut.poisons_connection());
    assert!(!Error::NotConnected.poisons_connection());
    assert!(!Error::Command {
      verb: "NOOP".to_string(),
      error_log: String::new(),
      reason: String::new()
    }
    .poisons_connection());
  }
}
