// Message handle and FETCH data model (spec §3 Message, §4.8 FETCH).
//
// processFetchResponse in original_source/src/net/imap/IMAPFolder.cpp (and
// IMAPMessage.cpp) folds an arbitrary-order FETCH attribute list into the
// message's stored state one attribute at a time; `Attributes::apply` below
// is the same fold, generalized to the full attribute set this crate parses
// (FLAGS, UID, RFC822.SIZE, ENVELOPE, BODYSTRUCTURE, INTERNALDATE, MODSEQ,
// BODY[section]).

use crate::{parser, structure};
use std::collections;

/// System and well-known keyword flags (spec §3 Data Model's Flag bitset:
/// SEEN, RECENT, DELETED, REPLIED, MARKED, DRAFT, PASSED). `Answered` and
/// `Flagged` carry the wire names (RFC 3501 \Answered/\Flagged) for the
/// flags the spec calls REPLIED/MARKED. `message.hpp` in original_source
/// declares FLAG_PASSED but IMAPUtils::messageFlagList and its flag-parsing
/// switch never map it to any wire token; this crate treats it as the
/// non-standard keyword "Passed" (a bare atom, per flag-keyword = atom),
/// since the backslash-prefixed form is reserved for system/extension flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
  Seen,
  Answered,
  Flagged,
  Deleted,
  Draft,
  Recent,
  Passed,
}

impl Flag {
  pub fn to_wire(self) -> &'static str {
    match self {
      Flag::Seen => "\\Seen",
      Flag::Answered => "\\Answered",
      Flag::Flagged => "\\Flagged",
      Flag::Deleted => "\\Deleted",
      Flag::Draft => "\\Draft",
      Flag::Recent => "\\Recent",
      Flag::Passed => "Passed",
    }
  }

  pub fn from_wire(raw: &[u8]) -> Option<Self> {
    match raw.to_ascii_uppercase().as_slice() {
      b"\\SEEN" => Some(Flag::Seen),
      b"\\ANSWERED" => Some(Flag::Answered),
      b"\\FLAGGED" => Some(Flag::Flagged),
      b"\\DELETED" => Some(Flag::Deleted),
      b"\\DRAFT" => Some(Flag::Draft),
      b"\\RECENT" => Some(Flag::Recent),
      b"PASSED" => Some(Flag::Passed),
      _ => None,
    }
  }
}

fn lossy(bytes: Vec<u8>) -> String {
  String::from_utf8_lossy(&bytes).into_owned()
}

fn lossy_opt(bytes: Option<Vec<u8>>) -> Option<String> {
  bytes.map(lossy)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
  pub name: Option<String>,
  pub adl: Option<String>,
  pub mailbox: Option<String>,
  pub host: Option<String>,
}

impl Address {
  fn from_parsed(parsed: parser::Address) -> Self {
    Self {
      name: lossy_opt(parsed.name),
      adl: lossy_opt(parsed.adl),
      mailbox: lossy_opt(parsed.mailbox),
      host: lossy_opt(parsed.host),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
  pub date: Option<String>,
  pub subject: Option<String>,
  pub from: Vec<Address>,
  pub sender: Vec<Address>,
  pub reply_to: Vec<Address>,
  pub to: Vec<Address>,
  pub cc: Vec<Address>,
  pub bcc: Vec<Address>,
  pub in_reply_to: Option<String>,
  pub message_id: Option<String>,
}

impl Envelope {
  pub(crate) fn from_parsed(parsed: parser::Envelope) -> Self {
    Self {
      date: lossy_opt(parsed.date),
      subject: lossy_opt(parsed.subject),
      from: parsed.from.into_iter().map(Address::from_parsed).collect(),
      sender: parsed.sender.into_iter().map(Address::from_parsed).collect(),
      reply_to: parsed.reply_to.into_iter().map(Address::from_parsed).collect(),
      to: parsed.to.into_iter().map(Address::from_parsed).collect(),
      cc: parsed.cc.into_iter().map(Address::from_parsed).collect(),
      bcc: parsed.bcc.into_iter().map(Address::from_parsed).collect(),
      in_reply_to: lossy_opt(parsed.in_reply_to),
      message_id: lossy_opt(parsed.message_id),
    }
  }
}

/// What a fetch should retrieve; mirrors IMAPUtils::buildFetchRequest's
/// `folder::FETCH_*` bitset as named booleans. `content_info`/`importance`
/// reproduce the original's derived header-field subsets (it fetches
/// Content-Type to classify attachments, and Importance/X-Priority for its
/// message-priority API) by folding them into a single `BODY[HEADER.FIELDS
/// (...)]` item alongside any caller-supplied header names.
#[derive(Debug, Clone, Default)]
pub struct FetchAttributes {
  pub flags: bool,
  pub uid: bool,
  pub size: bool,
  pub envelope: bool,
  pub structure: bool,
  pub internal_date: bool,
  pub full_header: bool,
  pub content_info: bool,
  pub importance: bool,
  pub header_fields: Vec<String>,
}

impl FetchAttributes {
  /// Everything except `MODSEQ`: that item is appended by
  /// `Folder::fetch_messages` itself, gated on CONDSTORE being negotiated
  /// and enabled on the folder, since requesting it unconditionally would
  /// be a BAD command against a server/folder that never negotiated it.
  pub fn all() -> Self {
    Self {
      flags: true,
      uid: true,
      size: true,
      envelope: true,
      structure: true,
      internal_date: true,
      full_header: false,
      content_info: false,
      importance: false,
      header_fields: Vec::new(),
    }
  }

  /// The FETCH item list, in the order original_source builds them. Header
  /// fields wanted alongside the envelope (content-type/importance/custom
  /// names) are folded into one `BODY[HEADER.FIELDS (...)]` item; requesting
  /// `full_header` instead pulls RFC822.HEADER and suppresses both.
  pub(crate) fn items(&self) -> Vec<String> {
    let mut items = Vec::new();
    if self.size {
      items.push("RFC822.SIZE".to_string());
    }
    if self.flags {
      items.push("FLAGS".to_string());
    }
    if self.structure {
      items.push("BODYSTRUCTURE".to_string());
    }
    if self.uid {
      items.push("UID".to_string());
    }
    if self.internal_date {
      items.push("INTERNALDATE".to_string());
    }
    if self.full_header {
      items.push("RFC822.HEADER".to_string());
      return items;
    }
    if self.envelope {
      items.push("ENVELOPE".to_string());
    }
    let mut fields = Vec::new();
    if self.content_info {
      fields.push("CONTENT_TYPE".to_string());
    }
    if self.importance {
      fields.push("IMPORTANCE".to_string());
      fields.push("X-PRIORITY".to_string());
    }
    fields.extend(self.header_fields.iter().cloned());
    if !fields.is_empty() {
      items.push(format!("BODY[HEADER.FIELDS ({})]", fields.join(" ")));
    }
    items
  }
}

#[derive(Debug, Clone, Default)]
pub struct Attributes {
  pub flags: Vec<String>,
  pub uid: Option<u64>,
  pub size: Option<u64>,
  pub envelope: Option<Envelope>,
  pub structure: Option<structure::Structure>,
  pub internal_date: Option<String>,
  pub mod_seq: Option<u64>,
  pub sections: collections::HashMap<String, Vec<u8>>,
}

impl Attributes {
  pub(crate) fn apply(&mut self, attribute: parser::FetchAtt<'_>) {
    match attribute {
      parser::FetchAtt::Flags(flags) => {
        self.flags = flags.into_iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect();
      }
      parser::FetchAtt::Uid(uid) => self.uid = Some(uid),
      parser::FetchAtt::Rfc822Size(size) => self.size = Some(size),
      parser::FetchAtt::ModSeq(modseq) => self.mod_seq = Some(modseq),
      parser::FetchAtt::InternalDate(date) => self.internal_date = lossy_opt(date),
      parser::FetchAtt::Envelope(envelope) => self.envelope = Some(Envelope::from_parsed(envelope)),
      parser::FetchAtt::BodyStructure(body) => self.structure = Some(structure::Structure::from_parsed(body)),
      parser::FetchAtt::Rfc822Header(data) | parser::FetchAtt::Rfc822Text(data) | parser::FetchAtt::Rfc822(data) => {
        if let Some(data) = data {
          self.sections.insert(String::new(), data);
        }
      }
      parser::FetchAtt::BodySection { section, data, .. } => {
        if let Some(data) = data {
          self.sections.insert(section_key(section.as_ref()), data.into_owned());
        }
      }
    }
  }
}

fn section_key(section: Option<&parser::SectionSpec>) -> String {
  match section {
    None => String::new(),
    Some(parser::SectionSpec::Msgtext(parser::SectionMsgtextOwned::Header)) => "HEADER".to_string(),
    Some(parser::SectionSpec::Msgtext(parser::SectionMsgtextOwned::Text)) => "TEXT".to_string(),
    Some(parser::SectionSpec::Msgtext(parser::SectionMsgtextOwned::HeaderFields(_))) => "HEADER.FIELDS".to_string(),
    Some(parser::SectionSpec::Msgtext(parser::SectionMsgtextOwned::HeaderFieldsNot(_))) => "HEADER.FIELDS.NOT".to_string(),
    Some(parser::SectionSpec::Part(parts, text)) => {
      let path = parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
      match text {
        None => path,
        Some(parser::SectionText::Mime) => format!("{path}.MIME"),
        Some(parser::SectionText::Msgtext(parser::SectionMsgtextOwned::Header)) => format!("{path}.HEADER"),
        Some(parser::SectionText::Msgtext(parser::SectionMsgtextOwned::Text)) => format!("{path}.TEXT"),
        Some(parser::SectionText::Msgtext(_)) => format!("{path}.HEADER.FIELDS"),
      }
    }
  }
}

/// A message handle within an open folder, addressed by its sequence number
/// until renumbered by an EXPUNGE (spec §4.9) or replaced wholesale on a
/// fresh fetch.
pub struct Message {
  pub number: u64,
  pub attributes: Attributes,
  pub expunged: bool,
}

impl Message {
  pub fn new(number: u64) -> Self {
    Self {
      number,
      attributes: Attributes::default(),
      expunged: false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;

  #[test]
  fn fetch_attributes_items_follow_original_fetch_request_ordering() {
    let attributes = FetchAttributes { size: true, flags: true, uid: true, ..Default::default() };
    assert_eq!(vec!["RFC822.SIZE", "FLAGS", "UID"], attributes.items());
  }

  #[test]
  fn full_header_suppresses_envelope_item() {
    let attributes = FetchAttributes { envelope: true, full_header: true, ..Default::default() };
    assert_eq!(vec!["RFC822.HEADER"], attributes.items());
  }

  #[test]
  fn applying_flags_then_uid_accumulates_both() {
    let mut attributes = Attributes::default();
    attributes.apply(parser::FetchAtt::Flags(vec![b"\\Seen"]));
    attributes.apply(parser::FetchAtt::Uid(42));
    assert_eq!(vec!["\\Seen".to_string()], attributes.flags);
    assert_eq!(Some(42), attributes.uid);
  }

  #[test]
  fn section_key_renders_dotted_part_with_mime_suffix() {
    let section = parser::SectionSpec::Part(vec![1, 2], Some(parser::SectionText::Mime));
    assert_eq!("1.2.MIME", section_key(Some(&section)));
  }

  #[test]
  fn section_key_for_whole_message_is_empty() {
    assert_eq!("", section_key(None));
  }
}
