// Message sets: an ordered, homogeneous collection of number- or
// UID-ranges, enumerable either to the canonical IMAP sequence-set wire
// literal or (for number-ranges only) to an explicit list of numbers.
//
// Grounded on original_source/src/net/imap/IMAPUtils.cpp::listToSet for the
// "collapse consecutive numbers into a range" behavior, generalized to also
// support caller-supplied ranges (not just single numbers) and UID sets.

use std::fmt;

/// Inclusive bound. `Last::Wildcard` renders as `*` (the highest number or
/// UID the server knows about).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Last {
  Number(u64),
  Wildcard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
  pub first: u64,
  pub last: Last,
}

impl Range {
  pub fn single(number: u64) -> Self {
    Self {
      first: number,
      last: Last::Number(number),
    }
  }

  pub fn bounded(first: u64, last: u64) -> Self {
    Self {
      first,
      last: Last::Number(last),
    }
  }

  pub fn open(first: u64) -> Self {
    Self {
      first,
      last: Last::Wildcard,
    }
  }

  fn write_sequence(&self, out: &mut String) {
    match self.last {
      Last::Number(last) if last == self.first => out.push_str(&self.first.to_string()),
      Last::Number(last) => {
        out.push_str(&self.first.to_string());
        out.push(':');
        out.push_str(&last.to_string());
      }
      Last::Wildcard => {
        out.push_str(&self.first.to_string());
        out.push_str(":*");
      }
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
  Number,
  Uid,
}

/// A homogeneous set of ranges: either all number-ranges or all UID-ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageSet {
  kind: Kind,
  ranges: Vec<Range>,
}

impl MessageSet {
  pub fn empty() -> Self {
    Self {
      kind: Kind::Number,
      ranges: Vec::new(),
    }
  }

  pub fn by_number(first: u64, last: Option<u64>) -> Self {
    Self {
      kind: Kind::Number,
      ranges: vec![match last {
        Some(last) => Range::bounded(first, last),
        None => Range::single(first),
      }],
    }
  }

  pub fn by_uid(first: u64, last: Option<u64>) -> Self {
    Self {
      kind: Kind::Uid,
      ranges: vec![match last {
        Some(last) => Range::bounded(first, last),
        None => Range::single(first),
      }],
    }
  }

  pub fn is_number_set(&self) -> bool {
    self.kind == Kind::Number
  }

  pub fn is_uid_set(&self) -> bool {
    self.kind == Kind::Uid
  }

  pub fn is_empty(&self) -> bool {
    self.ranges.is_empty()
  }

  /// Adds a range, requiring homogeneity with any ranges already present.
  /// The first call on an `empty()` set fixes the set's kind.
  pub fn add_range(&mut self, range: Range, kind: RangeKind) -> Result<(), HeterogeneousSet> {
    let kind = match kind {
      RangeKind::Number => Kind::Number,
      RangeKind::Uid => Kind::Uid,
    };
    if !self.ranges.is_empty() && self.kind != kind {
      return Err(HeterogeneousSet);
    }
    self.kind = kind;
    self.ranges.push(range);
    Ok(())
  }

  /// The canonical IMAP sequence-set literal, e.g. "1:5,7,15:*". Ranges are
  /// comma-joined in insertion order; no sorting or coalescing is required
  /// by the wire grammar.
  pub fn to_sequence(&self) -> String {
    let mut out = String::new();
    for (index, range) in self.ranges.iter().enumerate() {
      if index > 0 {
        out.push(',');
      }
      range.write_sequence(&mut out);
    }
    out
  }

  /// Expands number-ranges inclusively into an explicit, order-preserving
  /// list. Undefined (returns an error) for UID-ranges, and for a range
  /// whose last bound is the wildcard (its extent isn't known locally).
  pub fn to_numbers(&self) -> Result<Vec<u64>, NotANumberSet> {
    if self.kind != Kind::Number {
      return Err(NotANumberSet);
    }
    let mut numbers = Vec::new();
    for range in &self.ranges {
      let last = match range.last {
        Last::Number(last) => last,
        Last::Wildcard => return Err(NotANumberSet),
      };
      let (first, last) = if range.first <= last {
        (range.first, last)
      } else {
        (last, range.first)
      };
      numbers.extend(first..=last);
    }
    Ok(numbers)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeKind {
  Number,
  Uid,
}

#[derive(Debug)]
pub struct HeterogeneousSet;

impl fmt::Display for HeterogeneousSet {
  fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(formatter, "a message set must be homogeneous")
  }
}

impl std::error::Error for HeterogeneousSet {}

#[derive(Debug)]
pub struct NotANumberSet;

impl fmt::Display for NotANumberSet {
  fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      formatter,
      "can only expand a bounded number-range set to an explicit list"
    )
  }
}

impl std::error::Error for NotANumberSet {}

/// Collapses a sorted or unsorted list of message numbers into the minimal
/// number of ranges, in the style of IMAPUtils::listToSet. `max`, when
/// `Some`, is rendered as the wildcard when a run reaches it.
pub fn collapse(numbers: &[u64], max: Option<u64>) -> MessageSet {
  let mut sorted = numbers.to_vec();
  sorted.sort_unstable();
  sorted.dedup();

  let mut set = MessageSet {
    kind: Kind::Number,
    ranges: Vec::new(),
  };
  let mut iterator = sorted.into_iter().peekable();
  while let Some(first) = iterator.next() {
    let mut last = first;
    while iterator.peek() == Some(&(last + 1)) {
      last = iterator.next().unwrap();
    }
    let range = if last == first {
      Range::single(first)
    } else if Some(last) == max {
      Range::open(first)
    } else {
      Range::bounded(first, last)
    };
    set.ranges.push(range);
  }
  set
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;

  #[test]
  fn sequence_rendering() {
    let mut set = MessageSet::empty();
    set.add_range(Range::bounded(1, 5), RangeKind::Number).unwrap();
    set.add_range(Range::single(7), RangeKind::Number).unwrap();
    set.add_range(Range::open(15), RangeKind::Number).unwrap();
    assert_eq!("1:5,7,15:*", set.to_sequence());
  }

  #[test]
  fn rejects_heterogeneous_sets() {
    let mut set = MessageSet::by_number(1, Some(5));
    let result = set.add_range(Range::single(7), RangeKind::Uid);
    assert!(result.is_err());
  }

  #[test]
  fn number_expansion_is_inclusive_and_ordered() {
    let set = MessageSet::by_number(2, Some(4));
    assert_eq!(vec![2, 3, 4], set.to_numbers().unwrap());
  }

  #[test]
  fn uid_sets_cannot_expand_to_numbers() {
    let set = MessageSet::by_uid(1, Some(5));
    assert!(set.to_numbers().is_err());
  }

  #[test]
  fn collapses_consecutive_runs() {
    let set = collapse(&[1, 2, 3, 5, 8, 9], None);
    assert_eq!("1:3,5,8:9", set.to_sequence());
  }

  #[test]
  fn collapse_uses_wildcard_at_max() {
    let set = collapse(&[8, 9, 10], Some(10));
    assert_eq!("8:*", set.to_sequence());
  }

  #[test]
  fn roundtrip_sequence_literal() {
    // Invariant from spec §8: parse(format(s)) == s for sequence output.
    let cases: Vec<MessageSet> = vec![
      MessageSet::by_number(1, Some(5)),
      MessageSet::by_uid(42, None),
      collapse(&[1, 2, 3, 7, 15], None),
    ];
    for set in cases {
      let literal = set.to_sequence();
      let parsed = crate::parser::parser::sequence_set(literal.as_bytes()).unwrap();
      let reformatted: Vec<String> = parsed
        .iter()
        .map(|range| match range.last {
          crate::parser::SeqEnd::Number(n) if n == range.first => range.first.to_string(),
          crate::parser::SeqEnd::Number(n) => format!("{}:{}", range.first, n),
          crate::parser::SeqEnd::Wildcard => format!("{}:*", range.first),
        })
        .collect();
      assert_eq!(literal, reformatted.join(","));
    }
  }
}
