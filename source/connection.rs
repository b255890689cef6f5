// Connection state machine (spec §4): owns the transport, the tag
// generator, the negotiated capability set, and the hierarchy separator; it
// exposes send/readResponse primitives that Folder and Store build on.
//
// The line reader replaces the teacher's Stream::chunk() (a UUID-tagged NOOP
// sentinel worked around PEG's inability to report "matching but not yet
// complete", see source/imap.rs) with a reader that exploits the fact IMAP
// literals announce their own length up front: `{n}` at the end of a line
// means exactly n more octets follow before the line's real CRLF terminator.
// Sending a NOOP mid-command would corrupt tag/response pairing for a
// general-purpose caller, which the teacher's narrow sync tool never risked.

use crate::{
  auth::{Authenticator, Mechanism},
  command::{Command, Part},
  error::Error,
  parser,
  socket::Socket,
  tag,
  timeout::{Decision, TimeoutPolicy},
};
use anyhow::Context as _;
use std::{collections, io, rc::Rc, str, time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  NotAuthenticated,
  Authenticated,
  Selected,
  Logout,
}

/// Which way bytes crossed the wire, for `Store`'s `Context::tracer` (spec
/// §3's replacement for the teacher's hardcoded `log::debug!("> ...")` /
/// `log::debug!("< ...")` lines in `imap::Stream::inner_input`/`inner_parse`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Sent,
  Received,
}

/// Lets a caller redirect large literal payloads (e.g. a BODY[] fetch)
/// around the in-memory response buffer instead of copying them in.
pub trait LiteralSink {
  /// Called once per literal with its announced length; returning `false`
  /// leaves the literal to be buffered normally.
  fn accept(&mut self, announced_len: usize) -> bool;
  fn write(&mut self, chunk: &[u8]);
}

#[derive(Debug, PartialEq)]
pub enum Untagged<'a> {
  Capability(Vec<&'a [u8]>),
  Enabled(Vec<&'a [u8]>),
  List {
    flags: Vec<&'a [u8]>,
    separator: Option<u8>,
    mailbox: parser::Mailbox<'a>,
  },
  Lsub {
    flags: Vec<&'a [u8]>,
    separator: Option<u8>,
    mailbox: parser::Mailbox<'a>,
  },
  Status {
    mailbox: parser::Mailbox<'a>,
    items: Vec<(parser::StatusAtt, u64)>,
  },
  Flags(Vec<&'a [u8]>),
  Count(u64, parser::CountKind),
  Search(Vec<u64>, Option<u64>),
  Fetch(u64, Vec<parser::FetchAtt<'a>>),
  Ok(Option<parser::RespCode>, &'a [u8]),
  No(Option<parser::RespCode>, &'a [u8]),
  Bad(Option<parser::RespCode>, &'a [u8]),
  Bye(Option<parser::RespCode>, &'a [u8]),
}

fn parse_untagged(line: &[u8]) -> Option<Untagged<'_>> {
  if let Ok(cs) = parser::parser::capability_response(line) {
    return Some(Untagged::Capability(cs));
  }
  if let Ok(cs) = parser::parser::enabled_capabilities(line) {
    return Some(Untagged::Enabled(cs));
  }
  if let Ok((flags, separator, mailbox)) = parser::parser::list_response(line) {
    return Some(Untagged::List { flags, separator, mailbox });
  }
  if let Ok((flags, separator, mailbox)) = parser::parser::lsub_response(line) {
    return Some(Untagged::Lsub { flags, separator, mailbox });
  }
  if let Ok((mailbox, items)) = parser::parser::status_response(line) {
    return Some(Untagged::Status { mailbox, items });
  }
  if let Ok(flags) = parser::parser::flags_response(line) {
    return Some(Untagged::Flags(flags));
  }
  if let Ok((n, kind)) = parser::parser::count_response(line) {
    return Some(Untagged::Count(n, kind));
  }
  if let Ok((numbers, modseq)) = parser::parser::search_response(line) {
    return Some(Untagged::Search(numbers, modseq));
  }
  if let Ok((n, atts)) = parser::parser::fetch_response(line) {
    return Some(Untagged::Fetch(n, atts));
  }
  if let Ok((code, text)) = parser::parser::ok(line) {
    return Some(Untagged::Ok(code, text));
  }
  if let Ok((code, text)) = parser::parser::no(line) {
    return Some(Untagged::No(code, text));
  }
  if let Ok((code, text)) = parser::parser::bad(line) {
    return Some(Untagged::Bad(code, text));
  }
  if let Ok((code, text)) = parser::parser::bye(line) {
    return Some(Untagged::Bye(code, text));
  }
  None
}

/// Returns the literal length and non-synchronizing flag a line ends with,
/// if any: "... {1234}" or "... {1234+}".
fn trailing_literal_len(line_before_crlf: &[u8]) -> Option<usize> {
  if !line_before_crlf.ends_with(b"}") {
    return None;
  }
  let open = line_before_crlf.iter().rposition(|&b| b == b'{')?;
  let mut inner = &line_before_crlf[open + 1..line_before_crlf.len() - 1];
  if inner.ends_with(b"+") {
    inner = &inner[..inner.len() - 1];
  }
  if inner.is_empty() || !inner.iter().all(u8::is_ascii_digit) {
    return None;
  }
  str::from_utf8(inner).ok()?.parse().ok()
}

fn supports_non_sync_literal(capabilities: &collections::HashSet<String>, len: usize) -> bool {
  capabilities.contains("LITERAL+") || (capabilities.contains("LITERAL-") && len <= 4096)
}

pub struct Connection {
  socket: Box<dyn Socket>,
  buffer: Vec<u8>,
  tags: tag::Generator,
  pub state: State,
  pub capabilities: collections::HashSet<String>,
  pub hierarchy_separator: Option<u8>,
  timeout_policy: Box<dyn TimeoutPolicy>,
  started: Option<time::Instant>,
  max_line_bytes: Option<usize>,
  tracer: Option<Rc<dyn Fn(Direction, &[u8])>>,
  /// Set once a `ProtocolParse`/`Io`/`OperationTimedOut` error desyncs the
  /// stream (spec §7 "protocol errors poison the Connection"). Every
  /// subsequent `execute`/`execute_with_sink` call raises `IllegalState`
  /// instead of sending anything, rather than reading a stream whose
  /// position no longer lines up with what the server thinks it sent.
  poisoned: bool,
}

impl Connection {
  pub fn new(socket: Box<dyn Socket>, timeout_policy: Box<dyn TimeoutPolicy>) -> Self {
    Self {
      socket,
      buffer: Vec::new(),
      tags: tag::Generator::default(),
      state: State::NotAuthenticated,
      capabilities: collections::HashSet::new(),
      hierarchy_separator: None,
      timeout_policy,
      started: None,
      max_line_bytes: None,
      tracer: None,
      poisoned: false,
    }
  }

  /// Rejects a response line once it grows past `limit` bytes without a
  /// terminating CRLF, so a server that never sends one can't grow the
  /// buffer without bound (spec §3's `Context.line_limit`).
  pub fn set_max_line_bytes(&mut self, limit: usize) -> &mut Self {
    self.max_line_bytes = Some(limit);
    self
  }

  /// Installs the wire tracer `Store` threads in from `Context` (spec §3).
  pub fn set_tracer(&mut self, tracer: Rc<dyn Fn(Direction, &[u8])>) -> &mut Self {
    self.tracer = Some(tracer);
    self
  }

  fn trace(&self, direction: Direction, bytes: &[u8]) {
    if let Some(tracer) = &self.tracer {
      tracer(direction, bytes);
    }
  }

  // https://www.rfc-editor.org/rfc/rfc3501#section-7.1.5
  // The untagged form of the OK response is also used as one of three
  // possible greetings at connection startup.
  pub fn greet(&mut self) -> anyhow::Result<()> {
    let line = self.read_response_line(None)?;
    match parser::parser::greeting(line.as_slice()) {
      Ok(parser::Greeting::Ok(code, _text)) => {
        self.apply_capability_code(code.as_ref());
        self.state = State::NotAuthenticated;
        Ok(())
      }
      Ok(parser::Greeting::Preauth(code, _text)) => {
        self.apply_capability_code(code.as_ref());
        self.state = State::Authenticated;
        Ok(())
      }
      Ok(parser::Greeting::Bye(_, text)) => Err(Error::Command {
        verb: "greeting".to_string(),
        error_log: String::from_utf8_lossy(&text).into_owned(),
        reason: "server refused connection".to_string(),
      }
      .into()),
      Err(error) => Err(Error::ProtocolParse { line: summarize(&line), cursor: error.location.offset }.into()),
    }
  }

  fn apply_capability_code(&mut self, code: Option<&parser::RespCode>) {
    if let Some(parser::RespCode::Capability(names)) = code {
      self.capabilities = names.iter().map(|n| String::from_utf8_lossy(n).to_uppercase()).collect();
    }
  }

  /// Sends `command`, invoking `on_untagged` once per untagged response
  /// line, and returns the tagged completion.
  pub fn execute(&mut self, command: Command, on_untagged: impl FnMut(Untagged<'_>)) -> anyhow::Result<TaggedOutcome> {
    self.execute_with_sink(command, on_untagged, None)
  }

  /// Like `execute`, but literal payloads are offered to `sink` as they
  /// arrive instead of being buffered into the response tree (spec §4.5's
  /// literal handler callback, used by `Folder::extract` to stream a large
  /// `BODY[section]` straight to a caller-supplied writer). Taking the sink
  /// as a plain borrow (rather than storing it on `self`) sidesteps the
  /// `'static` bound a stored `Box<dyn LiteralSink>` field would impose on
  /// every caller, most of which don't need one.
  pub fn execute_with_sink(
    &mut self,
    command: Command,
    on_untagged: impl FnMut(Untagged<'_>),
    sink: Option<&mut dyn LiteralSink>,
  ) -> anyhow::Result<TaggedOutcome> {
    anyhow::ensure!(
      !self.poisoned,
      Error::IllegalState("connection poisoned by a prior protocol/IO error".to_string())
    );
    let result = self.send(&command).and_then(|()| self.read_until_tagged(&command.tag, &command.verb, on_untagged, sink));
    self.poison_on_error(result)
  }

  /// Marks the connection poisoned when `result` carries an `Error` that
  /// `poisons_connection` (spec §7).
  fn poison_on_error<T>(&mut self, result: anyhow::Result<T>) -> anyhow::Result<T> {
    if let Err(error) = &result {
      if error.downcast_ref::<Error>().is_some_and(Error::poisons_connection) {
        self.poisoned = true;
      }
    }
    result
  }

  /// Reads untagged responses (handed to `on_untagged`) until `tag`'s
  /// completion arrives, used both by `execute_with_sink` after a normal
  /// command send and by `login`'s non-SASL-IR path, which sends the
  /// continuation response itself rather than folding it into a `Command`.
  fn read_until_tagged(
    &mut self,
    tag: &str,
    verb: &str,
    on_untagged: impl FnMut(Untagged<'_>),
    sink: Option<&mut dyn LiteralSink>,
  ) -> anyhow::Result<TaggedOutcome> {
    let result = self.read_until_tagged_inner(tag, verb, on_untagged, sink);
    self.poison_on_error(result)
  }

  fn read_until_tagged_inner(
    &mut self,
    tag: &str,
    verb: &str,
    mut on_untagged: impl FnMut(Untagged<'_>),
    mut sink: Option<&mut dyn LiteralSink>,
  ) -> anyhow::Result<TaggedOutcome> {
    loop {
      let line = self.read_response_line(sink.as_deref_mut())?;
      let (tag_end, tag_bytes) = split_tag(&line);
      if tag_bytes == b"*" {
        let rest = &line[tag_end..];
        match parse_untagged(rest) {
          Some(untagged) => on_untagged(untagged),
          None => log::warn!("unrecognized untagged response: {}", summarize(&line)),
        }
        continue;
      }
      if tag_bytes == tag.as_bytes() {
        let rest = &line[tag_end..];
        return match parser::parser::tagged_status(rest) {
          Ok(parser::TaggedStatus::Ok(code, text)) => {
            self.apply_capability_code(code.as_ref());
            Ok(TaggedOutcome::Ok(code, text))
          }
          Ok(parser::TaggedStatus::No(code, text)) => Err(Error::Command {
            verb: verb.to_string(),
            error_log: String::from_utf8_lossy(&text).into_owned(),
            reason: "NO".to_string(),
          }
          .into()),
          Ok(parser::TaggedStatus::Bad(code, text)) => Err(Error::Command {
            verb: verb.to_string(),
            error_log: String::from_utf8_lossy(&text).into_owned(),
            reason: "BAD".to_string(),
          }
          .into()),
          Err(error) => Err(Error::ProtocolParse { line: summarize(&line), cursor: error.location.offset }.into()),
        };
      }
      anyhow::bail!("unexpected tag {:?}, expected {:?}", String::from_utf8_lossy(tag_bytes), tag);
    }
  }

  pub fn new_command(&mut self, verb: impl Into<String>) -> Command {
    Command::new(self.tags.next(), verb)
  }

  /// The transport's preferred chunk size, for callers streaming a literal
  /// in (e.g. `Folder::add_message`) without reproducing the
  /// pointer-sizeof buffer bug `original_source`'s APPEND path carries.
  pub fn block_size(&self) -> usize {
    self.socket.block_size()
  }

  /// Authenticates over `AUTHENTICATE`. When the server advertises SASL-IR
  /// (RFC 4959), the response is folded into the command line itself as a
  /// literal, saving a round trip; otherwise this falls back to the plain
  /// RFC 3501 exchange (bare `AUTHENTICATE PLAIN`, then the base64 response
  /// on its own line after the server's continuation prompt), since a bare
  /// `{n}` literal marker in that slot isn't something a non-SASL-IR server
  /// is obliged to understand.
  pub fn login(&mut self, authenticator: &dyn Authenticator) -> anyhow::Result<()> {
    match authenticator.mechanism() {
      Mechanism::Plain => {
        let payload = crate::auth::plain(authenticator.user(), authenticator.password());
        let sasl_ir = self.capabilities.contains("SASL-IR");
        self.capabilities.clear();
        if sasl_ir {
          let mut command = self.new_command("AUTHENTICATE");
          command.sp().raw(b"PLAIN").sp().redacted_literal(payload.as_bytes());
          self.execute(command.finish(), |_| {})?;
        } else {
          let mut command = self.new_command("AUTHENTICATE");
          command.sp().raw(b"PLAIN");
          let command = command.finish();
          let (tag, verb) = (command.tag.clone(), command.verb.clone());
          self.send(&command)?;
          self.await_continuation()?;
          log::debug!("> <redacted SASL response>");
          self.socket.send(format!("{payload}\r\n").as_bytes()).map_err(Error::Io)?;
          self.read_until_tagged(&tag, &verb, |_| {}, None)?;
        }
      }
    }
    self.state = State::Authenticated;
    if self.capabilities.is_empty() {
      self.capability()?;
    }
    Ok(())
  }

  pub fn logout(&mut self) -> anyhow::Result<()> {
    let command = self.new_command("LOGOUT").finish();
    let result = self.execute(command, |_| {});
    self.state = State::Logout;
    result.map(|_| ())
  }

  /// Sends `CAPABILITY` and replaces the negotiated capability set with
  /// whatever the server reports (spec §4.6).
  pub fn capability(&mut self) -> anyhow::Result<()> {
    let command = self.new_command("CAPABILITY").finish();
    let mut capabilities = collections::HashSet::new();
    self.execute(command, |untagged| {
      if let Untagged::Capability(names) = untagged {
        capabilities = names.iter().map(|n| String::from_utf8_lossy(n).to_uppercase()).collect();
      }
    })?;
    self.capabilities = capabilities;
    Ok(())
  }

  /// Negotiates `STARTTLS` and upgrades the transport in place. The
  /// capability set is invalidated and re-read, per spec §4.6 (a server may
  /// only advertise authentication mechanisms once the channel is secure).
  pub fn starttls(&mut self, server_name: &str) -> anyhow::Result<()> {
    anyhow::ensure!(
      self.capabilities.contains("STARTTLS"),
      Error::OperationNotSupported("STARTTLS".to_string())
    );
    let command = self.new_command("STARTTLS").finish();
    self.execute(command, |_| {})?;
    let old = std::mem::replace(&mut self.socket, Box::new(crate::socket::Null));
    self.socket = old.upgrade_to_tls(server_name)?;
    self.capabilities.clear();
    self.capability()?;
    Ok(())
  }

  fn send(&mut self, command: &Command) -> anyhow::Result<()> {
    log::debug!("> {}", summarize(&command.trace));
    self.trace(Direction::Sent, &command.trace);
    let mut accumulator = Vec::new();
    for part in &command.parts {
      match part {
        Part::Text(text) => accumulator.extend_from_slice(text),
        Part::Literal(bytes) => {
          let non_sync = supports_non_sync_literal(&self.capabilities, bytes.len());
          accumulator.extend_from_slice(format!("{{{}{}}}\r\n", bytes.len(), if non_sync { "+" } else { "" }).as_bytes());
          if non_sync {
            accumulator.extend_from_slice(bytes);
          } else {
            self.socket.send(&accumulator).map_err(Error::Io)?;
            accumulator.clear();
            self.await_continuation()?;
            self.socket.send(bytes).map_err(Error::Io)?;
          }
        }
      }
    }
    self.socket.send(&accumulator).map_err(Error::Io)?;
    Ok(())
  }

  fn await_continuation(&mut self) -> anyhow::Result<()> {
    let line = self.read_response_line(None)?;
    parser::parser::continuation(&line).map_err(|error| {
      anyhow::anyhow!(Error::ProtocolParse { line: summarize(&line), cursor: error.location.offset })
    })?;
    Ok(())
  }

  fn fill_more(&mut self) -> anyhow::Result<()> {
    let result = self.fill_more_inner();
    self.poison_on_error(result)
  }

  fn fill_more_inner(&mut self) -> anyhow::Result<()> {
    let mut started = *self.started.get_or_insert_with(time::Instant::now);
    let mut chunk = vec![0u8; self.socket.block_size()];
    loop {
      match self.socket.receive(&mut chunk) {
        Ok(0) => anyhow::bail!(Error::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"))),
        Ok(n) => {
          self.buffer.extend_from_slice(&chunk[..n]);
          self.started = None;
          return Ok(());
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock || error.kind() == io::ErrorKind::TimedOut => {
          match self.timeout_policy.poll(started.elapsed()) {
            Decision::Continue => continue,
            Decision::Extend(_) => {
              // Grants a fresh waiting budget from this instant rather than
              // letting `waited` keep accumulating from the original start,
              // so the policy's next `poll` measures only the extension.
              started = time::Instant::now();
              self.started = Some(started);
              continue;
            }
            Decision::Abort => {
              self.started = None;
              return Err(Error::OperationTimedOut.into());
            }
          }
        }
        Err(error) => return Err(Error::Io(error).into()),
      }
    }
  }

  fn find_crlf_from(&mut self, from: usize) -> anyhow::Result<usize> {
    loop {
      if from < self.buffer.len() {
        if let Some(rel) = memchr::memchr(b'\r', &self.buffer[from..]) {
          let pos = from + rel;
          if pos + 1 < self.buffer.len() {
            if self.buffer[pos + 1] == b'\n' {
              return Ok(pos);
            }
          } else {
            self.fill_more()?;
            continue;
          }
        }
      }
      if let Some(limit) = self.max_line_bytes {
        anyhow::ensure!(
          self.buffer.len() - from <= limit,
          Error::ProtocolParse { line: summarize(&self.buffer[from..]), cursor: limit }
        );
      }
      self.fill_more()?;
    }
  }

  fn ensure_buffered(&mut self, len: usize) -> anyhow::Result<()> {
    while self.buffer.len() < len {
      self.fill_more()?;
    }
    Ok(())
  }

  /// Reads one full response line, transparently absorbing any literal
  /// payloads it announces. When a literal sink is installed and accepts a
  /// literal, the literal's bytes are streamed to the sink and replaced in
  /// the returned line by an empty quoted string, so the grammar still sees
  /// a syntactically valid nstring in its place.
  fn read_response_line(&mut self, mut sink: Option<&mut dyn LiteralSink>) -> anyhow::Result<Vec<u8>> {
    let mut scan_from = 0;
    loop {
      let crlf = self.find_crlf_from(scan_from)?;
      let before = &self.buffer[scan_from..crlf];
      let Some(len) = trailing_literal_len(before) else {
        let end = crlf + 2;
        let line = self.buffer[..end].to_vec();
        self.buffer.drain(..end);
        self.trace(Direction::Received, &line);
        return Ok(line);
      };
      let literal_start = crlf + 2;
      self.ensure_buffered(literal_start + len)?;
      if let Some(sink) = sink.as_deref_mut().filter(|sink| sink.accept(len)) {
        sink.write(&self.buffer[literal_start..literal_start + len]);
        let mut replaced = self.buffer[..literal_start].to_vec();
        replaced.extend_from_slice(b"\"\"");
        replaced.extend_from_slice(&self.buffer[literal_start + len..]);
        scan_from = replaced.len() - (self.buffer.len() - (literal_start + len));
        self.buffer = replaced;
      } else {
        scan_from = literal_start + len;
      }
    }
  }
}

#[derive(Debug)]
pub enum TaggedOutcome {
  Ok(Option<parser::RespCode>, Vec<u8>),
}

fn split_tag(line: &[u8]) -> (usize, &[u8]) {
  match memchr::memchr(b' ', line) {
    Some(pos) => (pos + 1, &line[..pos]),
    None => (line.len(), line),
  }
}

fn escape(bytes: &[u8]) -> String {
  bytes.iter().flat_map(|&b| std::ascii::escape_default(b)).map(char::from).collect()
}

fn summarize(bytes: &[u8]) -> String {
  let stop = bytes.windows(2).position(|w| w == b"\r\n").map_or(bytes.len(), |p| p + 2);
  escape(&bytes[..stop.min(bytes.len())])
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;
  use crate::{testing::Mock, timeout::NoTimeout};

  fn connection(server_bytes: &[u8]) -> Connection {
    Connection::new(Box::new(Mock::with_server_bytes(server_bytes)), Box::new(NoTimeout))
  }

  #[test]
  fn greet_reads_ok_greeting_and_capability_code() {
    let mut connection = connection(b"* OK [CAPABILITY IMAP4rev1 LITERAL+] ready\r\n");
    connection.greet().unwrap();
    assert_eq!(State::NotAuthenticated, connection.state);
    assert!(connection.capabilities.contains("LITERAL+"));
  }

  #[test]
  fn preauth_greeting_skips_straight_to_authenticated() {
    let mut connection = connection(b"* PREAUTH already logged in\r\n");
    connection.greet().unwrap();
    assert_eq!(State::Authenticated, connection.state);
  }

  #[test]
  fn execute_collects_untagged_list_then_tagged_ok() {
    let mut connection = connection(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\na001 OK LIST completed\r\n");
    let mut tags = tag::Generator::default();
    let command = Command::new(tags.next(), "LIST").finish();
    let mut seen = Vec::new();
    connection.execute(command, |untagged| seen.push(format!("{untagged:?}"))).unwrap();
    assert_eq!(1, seen.len());
    assert!(seen[0].contains("List"));
  }

  #[test]
  fn execute_surfaces_no_as_command_error() {
    let mut connection = connection(b"a001 NO [TRYCREATE] no such mailbox\r\n");
    let mut tags = tag::Generator::default();
    let command = Command::new(tags.next(), "SELECT").finish();
    let error = connection.execute(command, |_| {}).unwrap_err();
    assert!(format!("{error}").contains("no such mailbox") || format!("{error:?}").contains("no such mailbox"));
  }

  #[test]
  fn literal_in_fetch_response_is_read_in_full_before_the_line_ends() {
    let mut connection = connection(b"* 1 FETCH (BODY[TEXT] {5}\r\nhello)\r\na001 OK FETCH completed\r\n");
    let mut tags = tag::Generator::default();
    let command = Command::new(tags.next(), "FETCH").finish();
    let mut fetched = None;
    connection
      .execute(command, |untagged| {
        if let Untagged::Fetch(number, atts) = untagged {
          fetched = Some((number, atts));
        }
      })
      .unwrap();
    let (number, atts) = fetched.unwrap();
    assert_eq!(1, number);
    assert!(matches!(&atts[0], parser::FetchAtt::BodySection { data: Some(bytes), .. } if &**bytes == b"hello"));
  }

  #[test]
  fn max_line_bytes_rejects_a_line_that_never_terminates() {
    let mut connection = connection(&[b'x'; 64]);
    connection.set_max_line_bytes(16);
    let error = connection.greet().unwrap_err();
    assert!(error.downcast_ref::<Error>().is_some_and(|error| matches!(error, Error::ProtocolParse { .. })));
  }

  #[test]
  fn tracer_observes_sent_and_received_bytes() {
    let mut connection = connection(b"a001 OK NOOP completed\r\n");
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let recorder = seen.clone();
    connection.set_tracer(std::rc::Rc::new(move |direction, bytes| {
      recorder.borrow_mut().push((direction, bytes.to_vec()));
    }));
    let mut tags = tag::Generator::default();
    let command = Command::new(tags.next(), "NOOP").finish();
    connection.execute(command, |_| {}).unwrap();
    let seen = seen.borrow();
    assert!(seen.iter().any(|(direction, _)| *direction == Direction::Sent));
    assert!(seen.iter().any(|(direction, bytes)| *direction == Direction::Received && bytes.ends_with(b"\r\n")));
  }
}
