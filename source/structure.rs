// MIME structure tree (spec §3, Structure): a 1-part node carries media
// type/subtype/size/fields and, for a nested message/rfc822 part, its own
// envelope and body; an mpart node carries its subtype and ordered children.
// Section paths are 1-based and dotted when addressing a caller ("1.2"), and
// 0-based internally (`Part::children()` indexing) the way
// original_source/src/net/imap/IMAPMessage.cpp's part lookup works.

use crate::parser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
  pub params: Vec<(String, String)>,
  pub id: Option<String>,
  pub description: Option<String>,
  pub encoding: String,
  pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  Single {
    media_type: String,
    subtype: String,
    fields: Fields,
    lines: Option<u64>,
    nested: Option<Box<Message>>,
  },
  Multi {
    subtype: String,
    children: Vec<Structure>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub envelope: crate::message::Envelope,
  pub body: Structure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
  pub node: Node,
}

fn lossy(bytes: Vec<u8>) -> String {
  String::from_utf8_lossy(&bytes).into_owned()
}

fn lossy_opt(bytes: Option<Vec<u8>>) -> Option<String> {
  bytes.map(lossy)
}

impl Structure {
  pub(crate) fn from_parsed(parsed: parser::BodyStructure) -> Self {
    let node = match parsed {
      parser::BodyStructure::Single(single) => {
        let fields = Fields {
          params: single
            .fields
            .params
            .into_iter()
            .map(|(k, v)| (lossy(k), lossy(v)))
            .collect(),
          id: lossy_opt(single.fields.id),
          description: lossy_opt(single.fields.description),
          encoding: lossy(single.fields.encoding),
          size: single.fields.size,
        };
        let (lines, nested) = match single.extra {
          parser::SinglePartExtra::None => (None, None),
          parser::SinglePartExtra::Text { lines } => (Some(lines), None),
          parser::SinglePartExtra::Message { envelope, body, lines } => (
            Some(lines),
            Some(Box::new(Message {
              envelope: crate::message::Envelope::from_parsed(envelope),
              body: Structure::from_parsed(*body),
            })),
          ),
        };
        Node::Single {
          media_type: lossy(single.media_type),
          subtype: lossy(single.subtype),
          fields,
          lines,
          nested,
        }
      }
      parser::BodyStructure::Multi(multi) => Node::Multi {
        subtype: lossy(multi.subtype),
        children: multi.children.into_iter().map(Structure::from_parsed).collect(),
      },
    };
    Self { node }
  }

  /// Resolves a dotted, 1-based section path (as used on the wire, e.g.
  /// "1.2") to the addressed node, descending through mpart children and
  /// into a nested message's own body for a 1-part.
  pub fn part(&self, path: &[u64]) -> Option<&Structure> {
    let Some((&first, rest)) = path.split_first() else {
      return Some(self);
    };
    match &self.node {
      Node::Multi { children, .. } => {
        let index = usize::try_from(first).ok()?.checked_sub(1)?;
        children.get(index)?.part(rest)
      }
      Node::Single { nested: Some(message), .. } if first == 1 => message.body.part(rest),
      Node::Single { .. } => None,
    }
  }

  pub fn is_multipart(&self) -> bool {
    matches!(self.node, Node::Multi { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;

  fn leaf(media_type: &str, subtype: &str, size: u64) -> Structure {
    Structure {
      node: Node::Single {
        media_type: media_type.to_string(),
        subtype: subtype.to_string(),
        fields: Fields {
          params: Vec::new(),
          id: None,
          description: None,
          encoding: "7BIT".to_string(),
          size,
        },
        lines: None,
        nested: None,
      },
    }
  }

  #[test]
  fn navigates_dotted_section_paths_into_multipart_children() {
    let tree = Structure {
      node: Node::Multi {
        subtype: "MIXED".to_string(),
        children: vec![leaf("TEXT", "PLAIN", 100), leaf("IMAGE", "PNG", 5000)],
      },
    };
    let part = tree.part(&[2]).unwrap();
    assert_eq!(
      Node::Single {
        media_type: "IMAGE".to_string(),
        subtype: "PNG".to_string(),
        fields: Fields { params: Vec::new(), id: None, description: None, encoding: "7BIT".to_string(), size: 5000 },
        lines: None,
        nested: None,
      },
      part.node
    );
  }

  #[test]
  fn out_of_range_section_path_is_none() {
    let tree = Structure {
      node: Node::Multi { subtype: "MIXED".to_string(), children: vec![leaf("TEXT", "PLAIN", 1)] },
    };
    assert!(tree.part(&[5]).is_none());
  }

  #[test]
  fn empty_path_resolves_to_self() {
    let tree = leaf("TEXT", "PLAIN", 1);
    assert_eq!(Some(&tree), tree.part(&[]));
  }
}
