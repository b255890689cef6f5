// Store (spec §4.6 "Connection", §5 Concurrency & Resource Model, §9 Data
// Model back-references): the entry point a caller dials, authenticates, and
// then mints Folder handles from.
//
// original_source doesn't split "the connection used for unselected work"
// from "a folder's own connection" into two named types the way this crate
// does (vmime::net::imap::IMAPStore owns the one and only IMAPConnection,
// and IMAPFolder just borrows it); spec §5 explicitly calls for a dedicated
// connection per opened Folder so selected-state commands never block the
// store's LIST/STATUS/CREATE traffic, so this module is new relative to the
// teacher, grounded instead on IMAPStore.cpp's getFolder()/rename cascade
// (IMAPStore::notifyFolderRenamed sweeps its weak folder registry) and on
// the teacher's own `TCP`/`TLS`/`sync::Open` split in the now-superseded
// source/lib.rs for how to dial either transport from one call site.
//
// Folder doesn't back-reference Store (see folder.rs's header comment): each
// opened Folder owns a fully independent, already-authenticated Connection,
// so there is nothing for a Store disconnect to invalidate on an already-open
// handle. The spec's "on store disconnect each folder is notified and drops
// its back reference" is therefore a no-op here, by construction rather than
// by bookkeeping; recorded in DESIGN.md.

use crate::{
  auth::Authenticator,
  connection::{Connection, Direction, Untagged},
  error::Error,
  events::{self, Listeners},
  folder,
  parser,
  socket::{self, Socket},
  timeout::{NoTimeout, TimeoutPolicy},
  utf7,
};
use std::{
  cell::RefCell,
  rc::{Rc, Weak},
  time,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
  /// Plaintext; no TLS at any point.
  Plain,
  /// TLS from the first byte (the "implicit TLS" port, e.g. 993).
  Tls,
  /// Plaintext dial followed by `STARTTLS` once the greeting is read.
  StartTls,
}

/// Bundles the per-connection defaults spec §3 assigns to `Store`
/// construction (default line limits, tracer sink, timeout policy),
/// replacing the "global `options` singleton" REDESIGN FLAG (spec §9):
/// every `Connection` the Store dials, including one per opened Folder,
/// is built from the same `Context` rather than reading process-global
/// state.
pub struct Context {
  /// Caps a response line (including any trailing literal) at this many
  /// bytes before `Error::ProtocolParse` is raised; `None` is unbounded.
  pub max_line_bytes: Option<usize>,
  /// Observes every line sent/received on every `Connection` the Store
  /// dials, mirroring the teacher's `log::debug!("> ...")`/`log::debug!("<
  /// ...")` tracer lines in `imap::Stream` (now superseded).
  pub tracer: Option<Rc<dyn Fn(Direction, &[u8])>>,
  /// Produces a fresh `TimeoutPolicy` for each dialed `Connection` (a
  /// factory rather than a shared instance, since each Connection owns its
  /// policy exclusively).
  pub timeout_policy: Rc<dyn Fn() -> Box<dyn TimeoutPolicy>>,
  /// Passed through to `TcpStream::connect_timeout`/`connect_timeout`-style
  /// dialing; distinct from `timeout_policy`, which governs in-flight reads.
  pub dial_timeout: Option<time::Duration>,
}

impl Default for Context {
  fn default() -> Self {
    Self {
      max_line_bytes: Some(1024 * 1024),
      tracer: None,
      timeout_policy: Rc::new(|| Box::new(NoTimeout)),
      dial_timeout: None,
    }
  }
}

/// One LIST/LSUB reply, decoded to a caller-facing mailbox path and its
/// derived `folder::Attributes` (spec §3 FolderAttributes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderListing {
  pub path: String,
  pub attributes: folder::Attributes,
}

fn dial(address: &str, port: u16, security: Security, context: &Context) -> anyhow::Result<Connection> {
  let socket: Box<dyn Socket> = match security {
    Security::Tls => Box::new(socket::Tls::connect(address, port, context.dial_timeout)?),
    Security::Plain | Security::StartTls => Box::new(socket::Tcp::connect(address, port, context.dial_timeout)?),
  };
  let mut connection = Connection::new(socket, (context.timeout_policy)());
  if let Some(limit) = context.max_line_bytes {
    connection.set_max_line_bytes(limit);
  }
  if let Some(tracer) = &context.tracer {
    connection.set_tracer(tracer.clone());
  }
  connection.greet()?;
  if security == Security::StartTls {
    connection.starttls(address)?;
  }
  Ok(connection)
}

fn is_protected(path: &str) -> bool {
  path.is_empty() || path.eq_ignore_ascii_case("INBOX")
}

/// Entry point (spec §4.6/§5): owns one "default" connection for unselected
/// work (LIST, STATUS, CREATE, DELETE, RENAME) and mints a dedicated,
/// independently authenticated `Connection` for every `Folder` it opens.
pub struct Store {
  address: String,
  port: u16,
  security: Security,
  authenticator: Box<dyn Authenticator>,
  context: Context,
  connection: Connection,
  hierarchy_separator: Option<u8>,
  listeners: Listeners,
  /// Weak so a dropped `Folder` handle naturally falls out of the rename
  /// cascade instead of needing an explicit unregister call.
  folder_paths: Vec<Weak<RefCell<String>>>,
}

impl Store {
  pub fn connect(
    address: impl Into<String>,
    port: u16,
    security: Security,
    authenticator: Box<dyn Authenticator>,
    context: Context,
  ) -> anyhow::Result<Self> {
    let address = address.into();
    let mut connection = dial(&address, port, security, &context)?;
    connection.login(authenticator.as_ref())?;
    let mut store = Self {
      address,
      port,
      security,
      authenticator,
      context,
      connection,
      hierarchy_separator: None,
      listeners: Rc::new(RefCell::new(Vec::new())),
      folder_paths: Vec::new(),
    };
    store.discover_hierarchy_separator()?;
    Ok(store)
  }

  /// `LIST "" ""` per spec §4.6: the empty-pattern form returns no mailbox
  /// names, only the hierarchy separator.
  fn discover_hierarchy_separator(&mut self) -> anyhow::Result<()> {
    let mut command = self.connection.new_command("LIST");
    command.sp().string(b"").sp().string(b"");
    let mut separator = None;
    self.connection.execute(command.finish(), |untagged| {
      if let Untagged::List { separator: sep, .. } = untagged {
        separator = sep;
      }
    })?;
    self.hierarchy_separator = separator;
    self.connection.hierarchy_separator = separator;
    Ok(())
  }

  pub fn hierarchy_separator(&self) -> Option<u8> {
    self.hierarchy_separator
  }

  pub fn add_listener(&mut self, listener: Box<dyn events::Listener>) {
    self.listeners.borrow_mut().push(listener);
  }

  pub fn list(&mut self, reference: &str, pattern: &str) -> anyhow::Result<Vec<FolderListing>> {
    self.list_or_lsub("LIST", reference, pattern)
  }

  pub fn lsub(&mut self, reference: &str, pattern: &str) -> anyhow::Result<Vec<FolderListing>> {
    self.list_or_lsub("LSUB", reference, pattern)
  }

  fn list_or_lsub(&mut self, verb: &str, reference: &str, pattern: &str) -> anyhow::Result<Vec<FolderListing>> {
    let children_capability = self.connection.capabilities.contains("CHILDREN");
    let mut command = self.connection.new_command(verb);
    command.sp().mailbox(reference, self.hierarchy_separator).sp().string(pattern.as_bytes());
    let mut listings = Vec::new();
    self.connection.execute(command.finish(), |untagged| {
      let (flags, mailbox) = match untagged {
        Untagged::List { flags, mailbox, .. } if verb == "LIST" => (flags, mailbox),
        Untagged::Lsub { flags, mailbox, .. } if verb == "LSUB" => (flags, mailbox),
        _ => return,
      };
      let bytes = mailbox.to_bytes();
      match utf7::decode(&bytes) {
        Some(path) => listings.push(FolderListing {
          path,
          attributes: folder::Attributes::from_mailbox_flags(&flags, children_capability),
        }),
        None => log::warn!("mailbox name isn't proper modified UTF-7: {bytes:?}"),
      }
    })?;
    Ok(listings)
  }

  pub fn status(&mut self, path: &str) -> anyhow::Result<folder::Status> {
    let mut command = self.connection.new_command("STATUS");
    command
      .sp()
      .mailbox(path, self.hierarchy_separator)
      .sp()
      .raw(b"(MESSAGES RECENT UNSEEN UIDNEXT UIDVALIDITY HIGHESTMODSEQ)");
    let mut status = folder::Status::default();
    self.connection.execute(command.finish(), |untagged| {
      if let Untagged::Status { items, .. } = untagged {
        for (attribute, value) in items {
          match attribute {
            parser::StatusAtt::Messages => status.message_count = value,
            parser::StatusAtt::Recent => status.recent = value,
            parser::StatusAtt::Unseen => status.unseen = value,
            parser::StatusAtt::UidNext => status.uid_next = value,
            parser::StatusAtt::UidValidity => status.uid_validity = value,
            parser::StatusAtt::HighestModSeq => status.highest_mod_seq = value,
          }
        }
      }
    })?;
    Ok(status)
  }

  /// `create(attribs)` (spec §4.7): appends the hierarchy separator when
  /// the new mailbox is meant to contain sub-folders, and `USE (...)` when
  /// a special-use hint is requested (requires CREATE-SPECIAL-USE).
  pub fn create(&mut self, path: &str, attributes: folder::CreateAttributes) -> anyhow::Result<()> {
    let mut name = path.to_string();
    if attributes.contains_folders {
      if let Some(separator) = self.hierarchy_separator {
        name.push(separator as char);
      }
    }
    let mut command = self.connection.new_command("CREATE");
    command.sp().mailbox(&name, self.hierarchy_separator);
    if let Some(special_use) = attributes.special_use.filter(|su| !matches!(su, folder::SpecialUse::None)) {
      anyhow::ensure!(
        self.connection.capabilities.contains("CREATE-SPECIAL-USE"),
        Error::OperationNotSupported("CREATE-SPECIAL-USE".to_string())
      );
      if let Some(token) = folder::special_use_token(special_use) {
        command.sp().raw(format!("(USE ({token}))").as_bytes());
      }
    }
    self.connection.execute(command.finish(), |_| {})?;
    events::notify_folder(&self.listeners, events::FolderEvent::Created { mailbox: path.to_string() });
    Ok(())
  }

  /// `destroy` (spec §4.7): INBOX and the root path may not be deleted.
  pub fn delete(&mut self, path: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!is_protected(path), Error::InvalidFolderName(path.to_string()));
    let mut command = self.connection.new_command("DELETE");
    command.sp().mailbox(path, self.hierarchy_separator);
    self.connection.execute(command.finish(), |_| {})?;
    events::notify_folder(&self.listeners, events::FolderEvent::Deleted { mailbox: path.to_string() });
    Ok(())
  }

  /// `rename(newPath)` (spec §4.7): cascades the path prefix of every
  /// other currently open Folder handle rooted under `path`, emitting one
  /// rename event per affected handle in addition to the top-level one.
  pub fn rename(&mut self, path: &str, new_path: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!is_protected(path), Error::InvalidFolderName(path.to_string()));
    let mut command = self.connection.new_command("RENAME");
    command.sp().mailbox(path, self.hierarchy_separator).sp().mailbox(new_path, self.hierarchy_separator);
    self.connection.execute(command.finish(), |_| {})?;

    self.folder_paths.retain(|weak| weak.strong_count() > 0);
    let separator = self.hierarchy_separator.unwrap_or(b'/') as char;
    let child_prefix = format!("{path}{separator}");
    for weak in self.folder_paths.clone() {
      let Some(cell) = weak.upgrade() else { continue };
      let current = cell.borrow().clone();
      if let Some(rest) = current.strip_prefix(&child_prefix) {
        let updated = format!("{new_path}{separator}{rest}");
        *cell.borrow_mut() = updated.clone();
        events::notify_folder(&self.listeners, events::FolderEvent::Renamed { from: current, to: updated });
      } else if current == path {
        *cell.borrow_mut() = new_path.to_string();
      }
    }
    events::notify_folder(
      &self.listeners,
      events::FolderEvent::Renamed { from: path.to_string(), to: new_path.to_string() },
    );
    Ok(())
  }

  pub fn noop(&mut self) -> anyhow::Result<()> {
    let command = self.connection.new_command("NOOP").finish();
    self.connection.execute(command, |_| {})?;
    Ok(())
  }

  /// Dials and authenticates a fresh `Connection`, independent of the
  /// store's default one, for `get_folder` to hand to `Folder::open` (spec
  /// §4.7/§5: a folder's own connection so selected-state traffic never
  /// blocks the store's).
  fn dial_authenticated(&self) -> anyhow::Result<Connection> {
    let mut connection = dial(&self.address, self.port, self.security, &self.context)?;
    connection.login(self.authenticator.as_ref())?;
    connection.hierarchy_separator = self.hierarchy_separator;
    Ok(connection)
  }

  /// `getFolder` (spec §5): mints a `Folder` handle for `path` over a fresh
  /// connection, registering its path cell so a later `rename` cascades.
  /// Rejects a second handle onto a path this `Store` already has open,
  /// mirroring `IMAPStore.cpp`'s single-handle-per-mailbox invariant.
  pub fn get_folder(&mut self, path: &str, mode: folder::OpenMode, fail_if_mode_unavailable: bool) -> anyhow::Result<folder::Folder> {
    self.folder_paths.retain(|weak| weak.strong_count() > 0);
    anyhow::ensure!(
      !self.folder_paths.iter().filter_map(|weak| weak.upgrade()).any(|cell| *cell.borrow() == path),
      Error::FolderAlreadyOpen(path.to_string())
    );
    let connection = self.dial_authenticated()?;
    let cell = Rc::new(RefCell::new(path.to_string()));
    self.folder_paths.push(Rc::downgrade(&cell));
    folder::Folder::open(connection, cell, self.hierarchy_separator, mode, fail_if_mode_unavailable, self.listeners.clone())
  }

  /// `LOGOUT` on the default connection (spec §4.6 disconnection
  /// protocol). Already-open Folder handles are unaffected: each owns its
  /// own Connection (see this module's header comment).
  pub fn disconnect(mut self) -> anyhow::Result<()> {
    self.connection.logout()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;
  use crate::testing::Mock;
  use std::rc::Rc;

  // The greeting and the AUTHENTICATE tagged OK both advertise SASL-IR, so
  // `Connection::login` takes the single-round-trip fast path and every
  // test fixture only has to account for LIST "" "" (tag a002) plus
  // whatever the test itself issues (tag a003+).
  const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1 SASL-IR LITERAL+ CONDSTORE CHILDREN CREATE-SPECIAL-USE] ready\r\n";
  const LOGIN_OK: &[u8] =
    b"a001 OK [CAPABILITY IMAP4rev1 SASL-IR LITERAL+ CONDSTORE CHILDREN CREATE-SPECIAL-USE] AUTHENTICATE completed\r\n";

  fn store_over(after_login: &[u8]) -> (Store, Mock) {
    let mock = Mock::with_server_bytes(GREETING);
    mock.push_server_bytes(LOGIN_OK);
    mock.push_server_bytes(after_login);
    let mut connection = Connection::new(Box::new(mock.clone()), Box::new(NoTimeout));
    connection.greet().unwrap();
    connection.login(&crate::auth::StaticCredentials::new("user", "pass")).unwrap();
    let mut store = Store {
      address: "mail.example.com".to_string(),
      port: 143,
      security: Security::Plain,
      authenticator: Box::new(crate::auth::StaticCredentials::new("user", "pass")),
      context: Context::default(),
      connection,
      hierarchy_separator: None,
      listeners: Rc::new(RefCell::new(Vec::new())),
      folder_paths: Vec::new(),
    };
    store.discover_hierarchy_separator().unwrap();
    (store, mock)
  }

  #[test]
  fn discover_hierarchy_separator_reads_list_empty_empty_response() {
    let (store, mock) = store_over(b"* LIST (\\Noselect) \"/\" \"\"\r\na002 OK LIST completed\r\n");
    assert_eq!(Some(b'/'), store.hierarchy_separator());
    assert!(mock.sent().windows(4).any(|w| w == b"LIST"));
  }

  #[test]
  fn list_decodes_mailbox_names_and_derives_attributes() {
    let (mut store, _mock) = store_over(
      b"* LIST () \"/\" \"\"\r\n\
        a002 OK LIST completed\r\n\
        * LIST (\\HasNoChildren) \"/\" INBOX\r\n\
        * LIST (\\Noselect \\HasChildren) \"/\" Archive\r\n\
        a003 OK LIST completed\r\n",
    );
    let listings = store.list("", "*").unwrap();
    assert_eq!(2, listings.len());
    assert_eq!("INBOX", listings[0].path);
    assert!(!listings[0].attributes.has_children);
    assert_eq!("Archive", listings[1].path);
    assert!(listings[1].attributes.no_open);
    assert!(listings[1].attributes.has_children);
  }

  #[test]
  fn status_folds_items_into_a_snapshot() {
    let (mut store, _mock) = store_over(
      b"* LIST () \"/\" \"\"\r\n\
        a002 OK LIST completed\r\n\
        * STATUS INBOX (MESSAGES 12 UNSEEN 3 UIDNEXT 99 UIDVALIDITY 1)\r\n\
        a003 OK STATUS completed\r\n",
    );
    let status = store.status("INBOX").unwrap();
    assert_eq!(12, status.message_count);
    assert_eq!(3, status.unseen);
    assert_eq!(99, status.uid_next);
    assert_eq!(1, status.uid_validity);
  }

  #[test]
  fn delete_rejects_inbox_and_root() {
    let (mut store, _mock) = store_over(b"* LIST () \"/\" \"\"\r\na002 OK LIST completed\r\n");
    assert!(store.delete("INBOX").is_err());
    assert!(store.delete("").is_err());
  }

  #[test]
  fn rename_cascades_to_open_child_folder_handles() {
    let (mut store, _mock) = store_over(
      b"* LIST () \"/\" \"\"\r\n\
        a002 OK LIST completed\r\n\
        a003 OK RENAME completed\r\n",
    );
    store.hierarchy_separator = Some(b'/');
    let child = Rc::new(RefCell::new("Work/2024".to_string()));
    store.folder_paths.push(Rc::downgrade(&child));
    store.rename("Work", "Archive/Work").unwrap();
    assert_eq!("Archive/Work/2024", *child.borrow());
  }

  #[test]
  fn get_folder_rejects_a_path_already_open() {
    let (mut store, _mock) = store_over(b"* LIST () \"/\" \"\"\r\na002 OK LIST completed\r\n");
    let already_open = Rc::new(RefCell::new("INBOX".to_string()));
    store.folder_paths.push(Rc::downgrade(&already_open));
    let error = store.get_folder("INBOX", folder::OpenMode::ReadOnly, false).unwrap_err();
    assert!(matches!(error.downcast_ref::<Error>(), Some(Error::FolderAlreadyOpen(path)) if path == "INBOX"));
  }
}
