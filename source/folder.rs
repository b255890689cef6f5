// Folder state machine (spec §4.7-§4.10): translates high-level operations
// (getMessages, fetch, store flags, copy, append, expunge, close) into
// command sequences over a dedicated Connection, applying the status-update
// pass (spec §4.10) to every response it reads.
//
// Grounded on original_source/src/net/imap/IMAPFolder.cpp: fetchMessages's
// msg_att fold, setFlags's STORE-then-echo-wins rule, and
// processStatusUpdate's resp-text-code/EXISTS/EXPUNGE scanning are all
// carried over. IMAPFolder.cpp holds a raw back-pointer to its owning
// IMAPStore's single shared connection; this crate gives every opened
// Folder a wholly-owned Connection instead (REDESIGN FLAGS, spec §9), and
// shares only the mailbox path cell with the Store that minted it, so a
// rename is visible here without a callback into Folder.

use crate::{
  command::Command,
  connection::{Connection, LiteralSink, TaggedOutcome, Untagged},
  error::Error,
  events::{self, Listeners},
  message::{FetchAttributes, Flag, Message},
  parser,
  set::{self, MessageSet, Range, RangeKind},
};
use chrono::{DateTime, FixedOffset};
use std::{cell::RefCell, io, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
  ReadOnly,
  ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  OpenRo,
  OpenRw,
  Closed,
}

/// spec §3 FolderAttributes.type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
  ContainsMessages,
  ContainsFolders,
}

/// `setMessageFlags` mode (spec §4.7): add, remove, or replace the flag set
/// wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagMode {
  Add,
  Remove,
  Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialUse {
  None,
  All,
  Archive,
  Drafts,
  Flagged,
  Junk,
  Sent,
  Trash,
  Important,
}

pub(crate) fn special_use_token(special_use: SpecialUse) -> Option<&'static str> {
  match special_use {
    SpecialUse::None => None,
    SpecialUse::All => Some("\\All"),
    SpecialUse::Archive => Some("\\Archive"),
    SpecialUse::Drafts => Some("\\Drafts"),
    SpecialUse::Flagged => Some("\\Flagged"),
    SpecialUse::Junk => Some("\\Junk"),
    SpecialUse::Sent => Some("\\Sent"),
    SpecialUse::Trash => Some("\\Trash"),
    SpecialUse::Important => Some("\\Important"),
  }
}

/// spec §3 FolderAttributes, derived from a LIST/LSUB mailbox-flag-list by
/// `from_mailbox_flags`'s policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
  pub folder_type: Type,
  pub has_children: bool,
  pub no_open: bool,
  pub special_use: SpecialUse,
}

impl Attributes {
  /// `children_capability`: whether the server advertises the CHILDREN
  /// extension. Absent it, the lack of `\HasChildren` proves nothing, so
  /// `has_children` defaults true (spec §9 Open Questions: the newer of
  /// two policies the original source carries across versions).
  pub fn from_mailbox_flags(mailbox_flags: &[&[u8]], children_capability: bool) -> Self {
    let has = |name: &[u8]| mailbox_flags.iter().any(|f| f.eq_ignore_ascii_case(name));
    let mut attributes = Self {
      folder_type: Type::ContainsMessages,
      has_children: !children_capability,
      no_open: false,
      special_use: SpecialUse::None,
    };
    if has(b"\\Noselect") {
      attributes.folder_type = Type::ContainsFolders;
      attributes.no_open = true;
    }
    if has(b"\\Noinferiors") || has(b"\\HasNoChildren") {
      attributes.has_children = false;
    }
    if has(b"\\HasChildren") {
      attributes.has_children = true;
    }
    attributes.special_use = if has(b"\\All") {
      SpecialUse::All
    } else if has(b"\\Archive") {
      SpecialUse::Archive
    } else if has(b"\\Drafts") {
      SpecialUse::Drafts
    } else if has(b"\\Flagged") {
      SpecialUse::Flagged
    } else if has(b"\\Junk") {
      SpecialUse::Junk
    } else if has(b"\\Sent") {
      SpecialUse::Sent
    } else if has(b"\\Trash") {
      SpecialUse::Trash
    } else if has(b"\\Important") {
      SpecialUse::Important
    } else {
      SpecialUse::None
    };
    attributes
  }
}

/// spec §3 FolderStatus. `highest_mod_seq == 0` means unknown or NOMODSEQ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
  pub message_count: u64,
  pub recent: u64,
  pub unseen: u64,
  pub uid_validity: u64,
  pub uid_next: u64,
  pub highest_mod_seq: u64,
}

impl Status {
  /// Folds one resp-text-code in, enforcing the monotonicity invariant from
  /// spec §8: `uid_validity` is fixed by whichever response sets it first;
  /// `uid_next`/`highest_mod_seq` never decrease, except NOMODSEQ resetting
  /// `highest_mod_seq` to 0.
  fn apply_code(&mut self, code: &parser::RespCode) {
    match code {
      parser::RespCode::UidValidity(value) => {
        if self.uid_validity == 0 {
          self.uid_validity = *value;
        }
      }
      parser::RespCode::UidNext(value) => self.uid_next = self.uid_next.max(*value),
      parser::RespCode::Unseen(value) => self.unseen = *value,
      parser::RespCode::HighestModSeq(value) => self.highest_mod_seq = self.highest_mod_seq.max(*value),
      parser::RespCode::NoModSeq => self.highest_mod_seq = 0,
      _ => (),
    }
  }

  fn apply_count(&mut self, count: u64, kind: parser::CountKind) {
    match kind {
      parser::CountKind::Exists => self.message_count = count,
      parser::CountKind::Recent => self.recent = count,
      parser::CountKind::Expunge => (), // renumbers messages, handled by apply_expunge
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct CreateAttributes {
  pub special_use: Option<SpecialUse>,
  /// Append the hierarchy separator to the name, so the server provisions
  /// the mailbox as a container for sub-folders (spec §4.7).
  pub contains_folders: bool,
}

/// Wraps a caller's `io::Write` to satisfy `LiteralSink`, for
/// `Folder::extract` (spec §4.9).
struct WriteSink<'a> {
  writer: &'a mut dyn io::Write,
}

impl LiteralSink for WriteSink<'_> {
  fn accept(&mut self, _announced_len: usize) -> bool {
    true
  }

  fn write(&mut self, chunk: &[u8]) {
    if let Err(error) = self.writer.write_all(chunk) {
      log::warn!("dropping extracted literal bytes: {error}");
    }
  }
}

/// The fields `apply_untagged` needs, split out of `Folder` so a command's
/// response can be applied from inside a closure `Connection::execute`
/// holds, without that closure needing `&mut Folder` as a whole while
/// `Folder::connection` is itself mutably borrowed for the call (see
/// `execute_with_sink_tracked`).
struct FolderState<'a> {
  status: &'a mut Status,
  defined_flags: &'a mut Vec<String>,
  permanent_flags: &'a mut Vec<String>,
  messages: &'a mut Vec<Message>,
  touched_numbers: &'a mut Vec<u64>,
  expunge_count: &'a mut u64,
  listeners: &'a Listeners,
}

fn apply_code_generic(state: &mut FolderState<'_>, code: Option<&parser::RespCode>) {
  match code {
    Some(parser::RespCode::PermanentFlags(flags)) => {
      *state.permanent_flags = flags.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect();
    }
    Some(other) => state.status.apply_code(other),
    None => {}
  }
}

/// spec §4.7 `EXPUNGE n`: every local message with `number > n` has its
/// number decremented by exactly one; the message at `n` is marked
/// expunged. Applied eagerly as each untagged EXPUNGE arrives, so a run of
/// several within one response renumbers correctly (spec §8 scenario 5).
fn apply_expunge(state: &mut FolderState<'_>, number: u64) {
  for message in state.messages.iter_mut() {
    if message.number == number {
      message.expunged = true;
    } else if message.number > number {
      message.number -= 1;
    }
  }
  state.status.message_count = state.status.message_count.saturating_sub(1);
  *state.expunge_count += 1;
  events::notify_count(state.listeners, events::MessageCount::Removed { numbers: vec![number] });
}

fn apply_fetch(state: &mut FolderState<'_>, number: u64, attributes: Vec<parser::FetchAtt<'_>>) {
  if !state.messages.iter().any(|m| m.number == number) {
    state.messages.push(Message::new(number));
  }
  let message = state.messages.iter_mut().find(|m| m.number == number).expect("just inserted above");
  let flags_before = message.attributes.flags.clone();
  for attribute in attributes {
    message.attributes.apply(attribute);
  }
  if message.attributes.flags != flags_before {
    events::notify_changed(
      state.listeners,
      events::MessageChangedEvent { kind: events::MessageChangeKind::Flags, numbers: vec![number] },
    );
  }
  if !state.touched_numbers.contains(&number) {
    state.touched_numbers.push(number);
  }
}

fn apply_untagged(state: &mut FolderState<'_>, untagged: Untagged<'_>) {
  match untagged {
    Untagged::Flags(flags) => {
      *state.defined_flags = flags.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect();
    }
    Untagged::Count(n, parser::CountKind::Exists) => state.status.message_count = n,
    Untagged::Count(n, parser::CountKind::Recent) => state.status.recent = n,
    Untagged::Count(n, parser::CountKind::Expunge) => apply_expunge(state, n),
    Untagged::Search(numbers, _mod_seq) => *state.touched_numbers = numbers,
    Untagged::Fetch(n, attributes) => apply_fetch(state, n, attributes),
    Untagged::Ok(code, _) | Untagged::No(code, _) | Untagged::Bad(code, _) | Untagged::Bye(code, _) => {
      apply_code_generic(state, code.as_ref());
    }
    Untagged::Capability(_) | Untagged::Enabled(_) | Untagged::List { .. } | Untagged::Lsub { .. } | Untagged::Status { .. } => {
      log::debug!("unsolicited response ignored by this folder: {untagged:?}");
    }
  }
}

/// A selected mailbox (spec §4.7). Owns a dedicated `Connection`; every
/// operation here issues exactly one command and folds whatever unsolicited
/// data comes back into `status`/`messages` before returning.
pub struct Folder {
  connection: Connection,
  path: Rc<RefCell<String>>,
  separator: Option<u8>,
  state: State,
  pub status: Status,
  defined_flags: Vec<String>,
  permanent_flags: Vec<String>,
  condstore_enabled: bool,
  messages: Vec<Message>,
  listeners: Listeners,
  expunge_count: u64,
  touched_numbers: Vec<u64>,
}

impl Folder {
  /// Opens `path` over `connection` (already dialed and logged in),
  /// sending `SELECT` or `EXAMINE` per `mode`, augmented with
  /// `(CONDSTORE)` when the capability allows. `path` is the `Rc` the
  /// owning Store minted via `get_folder`, so a rename cascades here too.
  pub(crate) fn open(
    mut connection: Connection,
    path: Rc<RefCell<String>>,
    separator: Option<u8>,
    mode: OpenMode,
    fail_if_mode_unavailable: bool,
    listeners: Listeners,
  ) -> anyhow::Result<Self> {
    let condstore = connection.capabilities.contains("CONDSTORE");
    let verb = match mode {
      OpenMode::ReadWrite => "SELECT",
      OpenMode::ReadOnly => "EXAMINE",
    };
    let name = path.borrow().clone();
    let mut command = connection.new_command(verb);
    command.sp().mailbox(&name, separator);
    if condstore {
      command.sp().raw(b"(CONDSTORE)");
    }

    let mut folder = Self {
      connection,
      path,
      separator,
      state: State::OpenRo,
      status: Status::default(),
      defined_flags: Vec::new(),
      permanent_flags: Vec::new(),
      condstore_enabled: condstore,
      messages: Vec::new(),
      listeners,
      expunge_count: 0,
      touched_numbers: Vec::new(),
    };

    let outcome = folder.execute_tracked(command.finish()).map_err(|error| {
      match error.downcast_ref::<Error>() {
        Some(Error::Command { reason, .. }) if reason == "NO" => Error::FolderNotFound(name.clone()).into(),
        _ => error,
      }
    })?;
    let TaggedOutcome::Ok(code, _) = outcome;
    let achieved_ro = matches!(code, Some(parser::RespCode::ReadOnly));
    folder.state = match mode {
      OpenMode::ReadWrite if achieved_ro => {
        if fail_if_mode_unavailable {
          anyhow::bail!(Error::OperationNotSupported("READ-WRITE".to_string()));
        }
        State::OpenRo
      }
      OpenMode::ReadWrite => State::OpenRw,
      OpenMode::ReadOnly => State::OpenRo,
    };
    Ok(folder)
  }

  pub fn path(&self) -> String {
    self.path.borrow().clone()
  }

  pub fn is_read_write(&self) -> bool {
    self.state == State::OpenRw
  }

  pub fn defined_flags(&self) -> &[String] {
    &self.defined_flags
  }

  pub fn permanent_flags(&self) -> &[String] {
    &self.permanent_flags
  }

  pub fn message(&self, number: u64) -> Option<&Message> {
    self.messages.iter().find(|m| m.number == number)
  }

  pub fn messages(&self) -> &[Message] {
    &self.messages
  }

  fn ensure_message(&mut self, number: u64) {
    if !self.messages.iter().any(|m| m.number == number) {
      self.messages.push(Message::new(number));
    }
  }

  fn begin_tracking(&mut self) -> (u64, Listeners) {
    self.touched_numbers.clear();
    self.expunge_count = 0;
    (self.status.message_count, Rc::clone(&self.listeners))
  }

  /// The "ADDED" count-event synthesis rule (spec §4.10 item 5): a command
  /// may provoke one or more EXISTS/EXPUNGE pairs whose net effect is new
  /// messages the caller never saw individually reported.
  fn finish_tracking(&mut self, pre_count: u64, listeners: &Listeners) {
    let floor = pre_count.saturating_sub(self.expunge_count);
    if self.status.message_count > floor {
      let first = floor + 1;
      let count = self.status.message_count - floor;
      events::notify_count(listeners, events::MessageCount::Added { first, count });
    }
  }

  fn execute_tracked(&mut self, command: Command) -> anyhow::Result<TaggedOutcome> {
    self.execute_with_sink_tracked(command, None)
  }

  fn execute_with_sink_tracked(&mut self, command: Command, sink: Option<&mut dyn LiteralSink>) -> anyhow::Result<TaggedOutcome> {
    let (pre_count, listeners) = self.begin_tracking();
    let outcome = {
      let Self { connection, status, defined_flags, permanent_flags, messages, touched_numbers, expunge_count, .. } = self;
      let mut state =
        FolderState { status, defined_flags, permanent_flags, messages, touched_numbers, expunge_count, listeners: &listeners };
      let outcome = connection.execute_with_sink(command, |untagged| apply_untagged(&mut state, untagged), sink)?;
      if let TaggedOutcome::Ok(code, _) = &outcome {
        apply_code_generic(&mut state, code.as_ref());
      }
      outcome
    };
    self.finish_tracking(pre_count, &listeners);
    Ok(outcome)
  }

  /// spec §4.7 getMessages: for a number-set, resolves to local message
  /// numbers directly; for a UID-set, issues `UID FETCH set UID` and
  /// returns the sequence numbers the server reported for it.
  pub fn get_messages(&mut self, set: &MessageSet) -> anyhow::Result<Vec<u64>> {
    if set.is_number_set() {
      let numbers = set.to_numbers().map_err(|error| Error::InvalidArgument(error.to_string()))?;
      for &number in &numbers {
        self.ensure_message(number);
      }
      return Ok(numbers);
    }
    anyhow::ensure!(set.is_uid_set(), Error::InvalidArgument("empty message set".to_string()));
    let mut command = self.connection.new_command("UID");
    command.sp().raw(b"FETCH").sp().sequence_set(&set.to_sequence()).sp().raw(b"UID");
    self.execute_tracked(command.finish())?;
    Ok(self.touched_numbers.clone())
  }

  /// spec §4.7/§4.8 fetchMessages: sends a single FETCH combining the
  /// requested attributes, applies responses to matching `Message`s, and
  /// notifies `progress` once per matched FETCH reply. `MODSEQ` is appended
  /// to a UID fetch only when CONDSTORE is negotiated (spec §4.8).
  pub fn fetch_messages(&mut self, numbers: &[u64], attributes: &FetchAttributes, mut progress: impl FnMut(u64)) -> anyhow::Result<()> {
    if numbers.is_empty() {
      return Ok(());
    }
    let set = set::collapse(numbers, None);
    let mut items = attributes.items();
    if self.condstore_enabled && attributes.uid && !items.iter().any(|item| item == "MODSEQ") {
      items.push("MODSEQ".to_string());
    }
    if items.is_empty() {
      return Ok(());
    }
    let mut command = self.connection.new_command("FETCH");
    command.sp().sequence_set(&set.to_sequence()).sp();
    if items.len() == 1 {
      command.raw(items[0].as_bytes());
    } else {
      command.raw(b"(");
      for (index, item) in items.iter().enumerate() {
        if index > 0 {
          command.sp();
        }
        command.raw(item.as_bytes());
      }
      command.raw(b")");
    }
    self.execute_tracked(command.finish())?;
    for number in self.touched_numbers.clone() {
      progress(number);
    }
    Ok(())
  }

  /// spec §4.7 setMessageFlags. Local flags are updated only by the
  /// server's echoed FETCH (`apply_fetch`, folded in generically), never by
  /// applying `mode` directly — the server's canonicalization wins.
  pub fn set_message_flags(&mut self, set: &MessageSet, flags: &[Flag], mode: FlagMode) -> anyhow::Result<()> {
    let prefix: &[u8] = match mode {
      FlagMode::Add => b"+FLAGS",
      FlagMode::Remove => b"-FLAGS",
      FlagMode::Replace => b"FLAGS",
    };
    let mut command = self.connection.new_command(if set.is_uid_set() { "UID" } else { "STORE" });
    if set.is_uid_set() {
      command.sp().raw(b"STORE");
    }
    command.sp().sequence_set(&set.to_sequence()).sp().raw(prefix).sp().raw(b"(");
    for (index, flag) in flags.iter().enumerate() {
      if index > 0 {
        command.sp();
      }
      command.raw(flag.to_wire().as_bytes());
    }
    command.raw(b")");
    self.execute_tracked(command.finish())?;
    Ok(())
  }

  /// spec §4.7 addMessage: reads exactly `size` bytes from `source` in
  /// `Connection::block_size()`-sized chunks (the Open Question
  /// resolution choosing the transport's preferred chunk size over
  /// `original_source`'s pointer-sizeof bug), then returns the UID
  /// `MessageSet` from an `APPENDUID` resp-code, when the server reports
  /// one.
  pub fn add_message(
    &mut self,
    source: &mut dyn io::Read,
    size: u64,
    flags: &[Flag],
    date: Option<&DateTime<FixedOffset>>,
  ) -> anyhow::Result<Option<MessageSet>> {
    let name = self.path.borrow().clone();
    let mut command = self.connection.new_command("APPEND");
    command.sp().mailbox(&name, self.separator);
    if !flags.is_empty() {
      command.sp().raw(b"(");
      for (index, flag) in flags.iter().enumerate() {
        if index > 0 {
          command.sp();
        }
        command.raw(flag.to_wire().as_bytes());
      }
      command.raw(b")");
    }
    if let Some(date) = date {
      command.sp().raw(crate::datetime::format(date).as_bytes());
    }

    let chunk_size = self.connection.block_size().max(1);
    let mut payload = Vec::with_capacity(size.try_into().unwrap_or(0));
    let mut remaining = size;
    let mut chunk = vec![0u8; chunk_size];
    while remaining > 0 {
      let wanted = usize::try_from(remaining.min(chunk_size as u64)).unwrap_or(chunk_size);
      source.read_exact(&mut chunk[..wanted])?;
      payload.extend_from_slice(&chunk[..wanted]);
      remaining -= wanted as u64;
    }
    command.sp().literal(&payload);

    let outcome = self.execute_tracked(command.finish())?;
    let TaggedOutcome::Ok(code, _) = outcome;
    Ok(match code {
      Some(parser::RespCode::AppendUid(_uid_validity, uid)) => Some(MessageSet::by_uid(uid, None)),
      _ => None,
    })
  }

  /// spec §4.7 copyMessages: returns the `UIDVALIDITY` and source/
  /// destination UID sets from a `COPYUID` resp-code, when present.
  pub fn copy_messages(&mut self, set: &MessageSet, destination: &str) -> anyhow::Result<Option<(u64, MessageSet, MessageSet)>> {
    let mut command = self.connection.new_command(if set.is_uid_set() { "UID" } else { "COPY" });
    if set.is_uid_set() {
      command.sp().raw(b"COPY");
    }
    command.sp().sequence_set(&set.to_sequence()).sp().mailbox(destination, self.separator);
    let outcome = self.execute_tracked(command.finish())?;
    let TaggedOutcome::Ok(code, _) = outcome;
    Ok(match code {
      Some(parser::RespCode::CopyUid(uid_validity, source_uids, dest_uids)) => {
        Some((uid_validity, seq_ranges_to_set(source_uids), seq_ranges_to_set(dest_uids)))
      }
      _ => None,
    })
  }

  /// spec §4.7 expunge: every untagged `EXPUNGE n` this provokes is folded
  /// into `messages`/`status` by `apply_expunge` as it arrives.
  pub fn expunge(&mut self) -> anyhow::Result<()> {
    let command = self.connection.new_command("EXPUNGE").finish();
    self.execute_tracked(command)?;
    Ok(())
  }

  pub fn noop(&mut self) -> anyhow::Result<()> {
    let command = self.connection.new_command("NOOP").finish();
    self.execute_tracked(command)?;
    Ok(())
  }

  /// spec §4.7 getMessageNumbersStartingOnUID: `UID SEARCH UID uid:*`, per
  /// the Open Question resolution (the `:*` form, not a bare `uid:uid`
  /// repeated per candidate).
  pub fn get_message_numbers_starting_on_uid(&mut self, uid: u64) -> anyhow::Result<Vec<u64>> {
    let mut command = self.connection.new_command("UID");
    command.sp().raw(b"SEARCH").sp().raw(b"UID").sp().raw(format!("{uid}:*").as_bytes());
    self.execute_tracked(command.finish())?;
    Ok(self.touched_numbers.clone())
  }

  /// Extract operation (spec §4.9): `BODY[section]` or
  /// `BODY.PEEK[section]`, optionally `<start.length>`, streamed straight
  /// to `sink` through the literal-handler hook instead of being buffered.
  pub fn extract(
    &mut self,
    number: u64,
    section: &str,
    peek: bool,
    range: Option<(u64, u64)>,
    sink: &mut dyn io::Write,
  ) -> anyhow::Result<()> {
    anyhow::ensure!(self.message(number).is_some(), Error::MessageNotFound(number));
    let item: &[u8] = if peek { b"BODY.PEEK" } else { b"BODY" };
    let mut command = self.connection.new_command("FETCH");
    command.sp().raw(number.to_string().as_bytes()).sp().raw(item).raw(b"[").raw(section.as_bytes()).raw(b"]");
    if let Some((start, length)) = range {
      command.raw(format!("<{start}.{length}>").as_bytes());
    }
    let mut writer = WriteSink { writer: sink };
    self.execute_with_sink_tracked(command.finish(), Some(&mut writer))?;
    Ok(())
  }

  /// spec §4.7 close: `CLOSE` expunges deleted messages when read-write and
  /// requested; otherwise the dedicated connection's `LOGOUT` already drops
  /// all selected state.
  pub fn close(mut self, expunge: bool) -> anyhow::Result<()> {
    if expunge && self.state == State::OpenRw {
      let command = self.connection.new_command("CLOSE").finish();
      self.execute_tracked(command)?;
    }
    self.connection.logout()?;
    self.state = State::Closed;
    Ok(())
  }
}

fn seq_ranges_to_set(ranges: Vec<parser::SeqRange>) -> MessageSet {
  let mut set = MessageSet::empty();
  for range in ranges {
    let rendered = match range.last {
      parser::SeqEnd::Number(last) => Range::bounded(range.first, last),
      parser::SeqEnd::Wildcard => Range::open(range.first),
    };
    let _ = set.add_range(rendered, RangeKind::Uid);
  }
  set
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;
  use crate::{testing::Mock, timeout::NoTimeout};

  fn open_folder(server_bytes: &[u8]) -> Folder {
    let mut connection = Connection::new(Box::new(Mock::with_server_bytes(server_bytes)), Box::new(NoTimeout));
    connection.state = crate::connection::State::Authenticated;
    Folder::open(
      connection,
      Rc::new(RefCell::new("INBOX".to_string())),
      Some(b'/'),
      OpenMode::ReadWrite,
      false,
      Rc::new(RefCell::new(Vec::new())),
    )
    .unwrap()
  }

  #[test]
  fn select_applies_status_and_read_write_mode() {
    let folder = open_folder(
      b"* 172 EXISTS\r\n\
        * 1 RECENT\r\n\
        * OK [UIDVALIDITY 3857529045] UIDs valid\r\n\
        * OK [UIDNEXT 4392] Predicted\r\n\
        * FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
        a001 OK [READ-WRITE] SELECT completed\r\n",
    );
    assert!(folder.is_read_write());
    assert_eq!(172, folder.status.message_count);
    assert_eq!(1, folder.status.recent);
    assert_eq!(3857529045, folder.status.uid_validity);
    assert_eq!(4392, folder.status.uid_next);
  }

  #[test]
  fn fetch_applies_flags_and_size_to_matching_messages() {
    let mut folder = open_folder(
      b"a001 OK [READ-WRITE] SELECT completed\r\n\
        * 2 FETCH (FLAGS (\\Seen) RFC822.SIZE 1024)\r\n\
        * 3 FETCH (FLAGS () RFC822.SIZE 2048)\r\n\
        * 4 FETCH (FLAGS (\\Answered \\Seen) RFC822.SIZE 512)\r\n\
        a002 OK FETCH completed\r\n",
    );
    let attributes = FetchAttributes { flags: true, size: true, ..Default::default() };
    folder.fetch_messages(&[2, 3, 4], &attributes, |_| {}).unwrap();
    assert_eq!(vec!["\\Seen".to_string()], folder.message(2).unwrap().attributes.flags);
    assert_eq!(Some(1024), folder.message(2).unwrap().attributes.size);
    assert_eq!(Some(512), folder.message(4).unwrap().attributes.size);
  }

  #[test]
  fn expunge_renumbers_remaining_messages() {
    let mut folder = open_folder(b"a001 OK [READ-WRITE] SELECT completed\r\n* 3 EXPUNGE\r\n* 3 EXPUNGE\r\na002 OK EXPUNGE completed\r\n");
    for number in 1..=5 {
      folder.ensure_message(number);
    }
    folder.status.message_count = 5;
    folder.expunge().unwrap();
    let mut numbers: Vec<u64> = folder.messages().iter().filter(|m| !m.expunged).map(|m| m.number).collect();
    numbers.sort_unstable();
    assert_eq!(vec![1, 2, 3], numbers);
    assert_eq!(2, folder.messages().iter().filter(|m| m.expunged).count());
  }

  #[test]
  fn append_returns_uid_from_appenduid_code() {
    let mut folder = open_folder(b"a001 OK [READ-WRITE] SELECT completed\r\na002 OK [APPENDUID 3857529045 42] APPEND completed\r\n");
    let mut source = io::Cursor::new(b"Subject: hi\r\n\r\nbody".to_vec());
    let set = folder.add_message(&mut source, 20, &[Flag::Draft], None).unwrap().unwrap();
    assert!(set.is_uid_set());
    assert_eq!("42", set.to_sequence());
  }

  #[test]
  fn open_reports_folder_not_found_when_select_is_rejected() {
    let mut connection = Connection::new(
      Box::new(Mock::with_server_bytes(b"a001 NO [NONEXISTENT] no such mailbox\r\n")),
      Box::new(NoTimeout),
    );
    connection.state = crate::connection::State::Authenticated;
    let error = Folder::open(
      connection,
      Rc::new(RefCell::new("Missing".to_string())),
      Some(b'/'),
      OpenMode::ReadWrite,
      false,
      Rc::new(RefCell::new(Vec::new())),
    )
    .unwrap_err();
    assert!(matches!(error.downcast_ref::<Error>(), Some(Error::FolderNotFound(path)) if path == "Missing"));
  }

  #[test]
  fn extract_rejects_a_message_number_never_seen_locally() {
    let mut folder = open_folder(b"a001 OK [READ-WRITE] SELECT completed\r\n");
    let mut sink = Vec::new();
    let error = folder.extract(99, "TEXT", true, None, &mut sink).unwrap_err();
    assert!(matches!(error.downcast_ref::<Error>(), Some(Error::MessageNotFound(99))));
  }
}
