// IMAP date-time formatting for APPEND's optional INTERNALDATE argument.
//
// https://www.rfc-editor.org/rfc/rfc3501#section-9
// date-time = DQUOTE date-day-fixed "-" date-month "-" date-year SPACE time
//             SPACE zone DQUOTE
// zone      = ("+" / "-") 4DIGIT
//
// Grounded on original_source/src/net/imap/IMAPUtils.cpp::dateTime, which
// formats day/month/year/time/zone by hand; reimplemented on top of chrono
// (a dependency the teacher doesn't carry, pulled in from
// LeakIX-protonmail-client which already uses chrono for this exact
// purpose) instead of hand-rolled integer formatting.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

const MONTHS: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Renders `"DD-Mon-YYYY HH:MM:SS ±hhmm"`, quoted, day space-padded to two
/// characters, zone as the local-to-UTC offset (east-positive).
pub fn format(date: &DateTime<FixedOffset>) -> String {
  let offset_minutes = date.offset().local_minus_utc() / 60;
  let sign = if offset_minutes < 0 { '-' } else { '+' };
  let offset_minutes = offset_minutes.abs();

  format!(
    "\"{:>2}-{}-{:04} {:02}:{:02}:{:02} {}{:02}{:02}\"",
    date.day(),
    MONTHS[date.month0() as usize],
    date.year(),
    date.hour(),
    date.minute(),
    date.second(),
    sign,
    offset_minutes / 60,
    offset_minutes % 60,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;
  use chrono::TimeZone;

  #[test]
  fn formats_positive_offset() {
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let date = offset.with_ymd_and_hms(2023, 3, 1, 13, 5, 9).unwrap();
    assert_eq!("\" 1-Mar-2023 13:05:09 +0200\"", format(&date));
  }

  #[test]
  fn formats_negative_offset() {
    let offset = FixedOffset::west_opt(5 * 3600).unwrap();
    let date = offset.with_ymd_and_hms(2023, 12, 25, 0, 0, 0).unwrap();
    assert_eq!("\"25-Dec-2023 00:00:00 -0500\"", format(&date));
  }
}
