// Command builder (spec §4.4): verb + typed arguments -> a sequence of wire
// segments. Plain segments are built the way the teacher assembles commands
// in source/sync/mod.rs and source/sync/push.rs (literal byte-slice
// concatenation, e.g. `b"select SELECT {", len, b"+}\r\n", mailbox, ...`);
// the part that generalizes beyond the teacher is that we don't know ahead
// of time whether the server supports LITERAL+/LITERAL- (RFC 7888), so a
// literal argument is represented as its own segment and Connection decides,
// from the negotiated capability set, whether to append the non-synchronizing
// "{n+}" form inline or to emit a synchronizing "{n}" and block for "+ ".
//
// Mailbox names and other potentially-unsafe arguments are quoted with
// IMAPUtils::quoteString's rule (original_source/src/net/imap/IMAPUtils.cpp):
// quote only when needed, backslash-escape '"' and '\' inside the quotes.
// Anything that can't be safely represented as a quoted string (a CR, LF, or
// byte >= 0x80) falls back to a literal instead, which that routine never
// needed because mailbox names are always modified UTF-7 (pure ASCII).

use crate::utf7;

#[derive(Debug)]
pub enum Part {
  Text(Vec<u8>),
  Literal(Vec<u8>),
}

pub struct Command {
  pub tag: String,
  pub verb: String,
  pub parts: Vec<Part>,
  /// Mirrors `parts` except secrets (e.g. a SASL PLAIN payload) are replaced
  /// by a placeholder, for logging.
  pub trace: Vec<u8>,
}

fn needs_quoting(bytes: &[u8]) -> bool {
  bytes.is_empty()
    || bytes.iter().any(|&c| {
      matches!(c, b'(' | b')' | b'{' | b' ' | b'%' | b'*' | b'"' | b'\\') || c <= 0x1f || c >= 0x7f
    })
}

fn needs_literal(bytes: &[u8]) -> bool {
  bytes.iter().any(|&c| c == b'\r' || c == b'\n' || c >= 0x80)
}

/// Quotes `bytes` the way IMAPUtils::quoteString does, or reports that the
/// text can't be safely quoted and must travel as a literal instead.
pub fn quote(bytes: &[u8]) -> Result<Vec<u8>, ()> {
  if needs_literal(bytes) {
    return Err(());
  }
  if !needs_quoting(bytes) {
    return Ok(bytes.to_vec());
  }
  let mut quoted = Vec::with_capacity(bytes.len() + 2);
  quoted.push(b'"');
  for &c in bytes {
    if c == b'\\' || c == b'"' {
      quoted.push(b'\\');
    }
    quoted.push(c);
  }
  quoted.push(b'"');
  Ok(quoted)
}

impl Command {
  pub fn new(tag: impl Into<String>, verb: impl Into<String>) -> Self {
    let tag = tag.into();
    let verb = verb.into();
    let header = format!("{tag} {verb}").into_bytes();
    Self {
      trace: header.clone(),
      parts: vec![Part::Text(header)],
      tag,
      verb,
    }
  }

  fn push_text(&mut self, bytes: &[u8]) -> &mut Self {
    match self.parts.last_mut() {
      Some(Part::Text(text)) => text.extend_from_slice(bytes),
      _ => self.parts.push(Part::Text(bytes.to_vec())),
    }
    self.trace.extend_from_slice(bytes);
    self
  }

  pub fn sp(&mut self) -> &mut Self {
    self.push_text(b" ")
  }

  pub fn raw(&mut self, atom: &[u8]) -> &mut Self {
    self.push_text(atom)
  }

  /// A quoted/literal argument whose bytes are safe to log verbatim.
  pub fn string(&mut self, bytes: &[u8]) -> &mut Self {
    match quote(bytes) {
      Ok(quoted) => self.push_text(&quoted),
      Err(()) => self.literal(bytes),
    }
  }

  pub fn mailbox(&mut self, name: &str, separator: Option<u8>) -> &mut Self {
    let encoded = utf7::encode(name, separator);
    self.string(encoded.as_bytes())
  }

  pub fn literal(&mut self, bytes: &[u8]) -> &mut Self {
    self.parts.push(Part::Literal(bytes.to_vec()));
    self
      .trace
      .extend_from_slice(format!("{{{} octets}}", bytes.len()).as_bytes());
    self
  }

  /// Like `literal`, but the trace buffer gets a redaction placeholder
  /// instead of the payload (used for SASL PLAIN secrets).
  pub fn redacted_literal(&mut self, bytes: &[u8]) -> &mut Self {
    self.parts.push(Part::Literal(bytes.to_vec()));
    self.trace.extend_from_slice(b"<redacted>");
    self
  }

  pub fn sequence_set(&mut self, rendered: &str) -> &mut Self {
    self.push_text(rendered.as_bytes())
  }

  pub fn finish(mut self) -> Self {
    self.push_text(b"\r\n");
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;

  #[test]
  fn plain_atoms_are_not_quoted() {
    assert_eq!(Ok(b"INBOX".to_vec()), quote(b"INBOX"));
  }

  #[test]
  fn space_forces_quoting() {
    assert_eq!(Ok(b"\"my box\"".to_vec()), quote(b"my box"));
  }

  #[test]
  fn backslash_and_quote_are_escaped() {
    assert_eq!(Ok(b"\"a\\\\b\\\"c\"".to_vec()), quote(b"a\\b\"c"));
  }

  #[test]
  fn empty_string_is_quoted() {
    assert_eq!(Ok(b"\"\"".to_vec()), quote(b""));
  }

  #[test]
  fn control_bytes_fall_back_to_literal() {
    assert_eq!(Err(()), quote(b"a\nb"));
  }

  #[test]
  fn command_renders_tag_and_verb() {
    let mut command = Command::new("a001", "SELECT");
    command.sp().mailbox("INBOX", None);
    let command = command.finish();
    let Part::Text(text) = &command.parts[0] else {
      panic!("expected a text segment")
    };
    assert_eq!(b"a001 SELECT INBOX\r\n".to_vec(), *text);
  }

  #[test]
  fn literal_argument_becomes_its_own_segment() {
    let mut command = Command::new("a001", "APPEND");
    command.sp().mailbox("INBOX", None).sp().literal(b"Subject: hi\r\n\r\nbody");
    let command = command.finish();
    assert!(matches!(command.parts[1], Part::Literal(_)));
  }

  #[test]
  fn redacted_literal_hides_the_payload_in_trace() {
    let mut command = Command::new("a001", "AUTHENTICATE");
    command.sp().raw(b"PLAIN").sp().redacted_literal(b"\0user\0pass");
    assert!(!String::from_utf8_lossy(&command.trace).contains("pass"));
  }
}
