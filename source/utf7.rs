// https://www.rfc-editor.org/rfc/rfc3501#section-5.1.3
// Modified UTF-7 [...] represents characters outside printable 7-bit
// US-ASCII as modified BASE64 encoded UTF-16 [...] The "&" character is used
// to shift to modified BASE64 and "-" to shift back to US-ASCII. [...] "," is
// used instead of "/" in modified BASE64.
//
// Decode is the teacher's utf7_to_utf8 (source/imap.rs), kept essentially
// verbatim. Encode is new, grounded on
// original_source/src/net/imap/IMAPUtils.cpp::toModifiedUTF7, reimplemented
// atop base64's IMAP_MUTF7 alphabet and encoding_rs::UTF_16BE rather than
// porting the hand-rolled bit-shifting loop.

use base64::Engine as _;

fn engine() -> base64::engine::GeneralPurpose {
  base64::engine::GeneralPurpose::new(
    &base64::alphabet::IMAP_MUTF7,
    base64::engine::general_purpose::NO_PAD,
  )
}

/// Encodes a single path component. `separator`, when it appears in `input`,
/// is forced into a Base64 run so the wire form never contains a literal
/// hierarchy separator inside a component.
pub fn encode(input: &str, separator: Option<u8>) -> String {
  let mut out = String::with_capacity(input.len());
  let mut run: Vec<u16> = Vec::new();

  let flush = |run: &mut Vec<u16>, out: &mut String| {
    if run.is_empty() {
      return;
    }
    let mut bytes = Vec::with_capacity(run.len() * 2);
    for unit in run.drain(..) {
      bytes.extend_from_slice(&unit.to_be_bytes());
    }
    out.push('&');
    out.push_str(&engine().encode(&bytes));
    out.push('-');
  };

  for char in input.chars() {
    let is_separator = separator.map_or(false, |separator| {
      char.is_ascii() && char as u32 == separator as u32
    });
    let printable = (0x20..=0x7e).contains(&(char as u32)) && char != '&' && !is_separator;
    if printable {
      flush(&mut run, &mut out);
      out.push(char);
    } else if char == '&' && !is_separator {
      flush(&mut run, &mut out);
      out.push_str("&-");
    } else {
      let mut buffer = [0u16; 2];
      for unit in char.encode_utf16(&mut buffer) {
        run.push(*unit);
      }
    }
  }
  flush(&mut run, &mut out);
  out
}

/// Decodes a full modified-UTF-7 mailbox component back to UTF-8. Returns
/// `None` on malformed input (e.g. a shift with no matching "-").
pub fn decode(input: &[u8]) -> Option<String> {
  let engine = engine();
  let mut buffer = Vec::new();
  let mut output = String::new();
  let mut i = 0;
  while i < input.len() {
    match input[i] {
      b'&' => {
        let start = i;
        loop {
          i += 1;
          if i == input.len() {
            return None;
          }
          if input[i] == b'-' {
            break;
          }
        }
        if start + 1 == i {
          // "&-" decodes to "&".
          output.push('&');
        } else {
          buffer.clear();
          buffer
            .try_reserve(base64::decoded_len_estimate(i - (start + 1)))
            .ok()?;
          engine.decode_vec(&input[start + 1..i], &mut buffer).ok()?;

          let mut decoder = encoding_rs::UTF_16BE.new_decoder_without_bom_handling();
          output
            .try_reserve(decoder.max_utf8_buffer_length_without_replacement(buffer.len())?)
            .ok()?;
          let (result, _) =
            decoder.decode_to_string_without_replacement(&buffer, &mut output, true);
          match result {
            encoding_rs::DecoderResult::InputEmpty => (),
            _ => return None,
          }
        }
      }
      c @ 0x20..=0x25 | c @ 0x27..=0x7e => output.push(c as char),
      _ => return None,
    }
    i += 1;
  }
  Some(output)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;

  #[test]
  fn decode_examples() {
    assert_eq!("", decode(b"").unwrap());
    assert_eq!("&", decode(b"&-").unwrap());
    assert_eq!(
      "~peter/mail/台北/日本語",
      decode(b"~peter/mail/&U,BTFw-/&ZeVnLIqe-").unwrap()
    );
    assert_eq!(None, decode(b"&Jjo!"));
    assert_eq!("☺!", decode(b"&Jjo-!").unwrap());
  }

  #[test]
  fn encode_examples() {
    assert_eq!("Hi Mum &Jjo-!", encode("Hi Mum ☺!", Some(b'/')));
    assert_eq!("&ZeVnLIqe-", encode("日本語", Some(b'/')));
    assert_eq!("&-", encode("&", Some(b'/')));
  }

  #[test]
  fn roundtrip_ascii_and_unicode() {
    for s in ["", "INBOX", "Drafts & Sent", "日本語/台北", "&weird&"] {
      let encoded = encode(s, Some(b'/'));
      assert_eq!(s, decode(encoded.as_bytes()).unwrap());
    }
  }

  #[test]
  fn separator_forced_into_base64_run() {
    // A literal '/' inside a component must not survive encoding, or the
    // wire form would be ambiguous with the hierarchy separator.
    let encoded = encode("a/b", Some(b'/'));
    assert!(!encoded.contains('/'));
    assert_eq!("a/b", decode(encoded.as_bytes()).unwrap());
  }
}
