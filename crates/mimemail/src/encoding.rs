//! Quoted-Printable body encoding (RFC 2045 section 6.7).
//!
//! Only the encoding direction is provided: message bodies are encoded once,
//! when their [`Part`](crate::Part) is constructed.

use crate::config::LineEnding;
use std::fmt::Write as _;

/// Maximum line length for Quoted-Printable encoding.
pub const MAX_LINE_LENGTH: usize = 76;

/// Smallest usable line length: a 3-byte escape followed by the `=` soft break.
const MIN_LINE_LENGTH: usize = 4;

/// Encodes data using Quoted-Printable encoding with 76-column lines and
/// `\n` line endings.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    encode_quoted_printable_with(data, MAX_LINE_LENGTH, LineEnding::Lf)
}

/// Encodes data using Quoted-Printable encoding.
///
/// Input lines may end in `\r\n` or `\n`; each is encoded on its own and
/// terminated with `line_ending`. Lines that would reach `max_line_length`
/// are wrapped with a soft break (`=` at end of line). Escape sequences are
/// never split. Trailing line terminators are removed from the result.
#[must_use]
pub fn encode_quoted_printable_with(
    data: &[u8],
    max_line_length: usize,
    line_ending: LineEnding,
) -> String {
    let max_line_length = max_line_length.max(MIN_LINE_LENGTH);
    let eol = line_ending.as_str();
    let mut output = String::with_capacity(data.len() + data.len() / 4);

    for line in split_lines(data) {
        let mut current = String::with_capacity(max_line_length);

        for (i, &byte) in line.iter().enumerate() {
            let escape = needs_escape(byte, i + 1 == line.len());
            let width = if escape { 3 } else { 1 };

            // The terminator is not counted
            if !current.is_empty() && current.len() + width >= max_line_length {
                output.push_str(&current);
                output.push('=');
                output.push_str(eol);
                current.clear();
            }

            if escape {
                let _ = write!(current, "={byte:02X}");
            } else {
                current.push(char::from(byte));
            }
        }

        output.push_str(&current);
        output.push_str(eol);
    }

    let len = output.trim_end_matches(eol).len();
    output.truncate(len);
    output
}

/// Returns true if `byte` must be written as an `=XX` escape.
const fn needs_escape(byte: u8, at_line_end: bool) -> bool {
    match byte {
        // Trailing whitespace would be stripped in transit
        b' ' => at_line_end,
        b'\t' => false,
        b'=' => true,
        _ => byte < 32 || byte > 126,
    }
}

/// Splits on `\n`, dropping the `\r` of a `\r\n` pair.
fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut segments = data.split(|&b| b == b'\n').peekable();
    std::iter::from_fn(move || {
        let segment = segments.next()?;
        if segments.peek().is_some() {
            Some(segment.strip_suffix(b"\r").unwrap_or(segment))
        } else {
            Some(segment)
        }
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Minimal decoder used to check the encoder against itself.
    fn decode_quoted_printable(text: &str) -> Vec<u8> {
        let mut result = Vec::new();
        let bytes = text.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == b'=' {
                if bytes[i + 1..].starts_with(b"\r\n") {
                    i += 3;
                } else if bytes[i + 1..].starts_with(b"\n") {
                    i += 2;
                } else {
                    let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                    result.push(u8::from_str_radix(hex, 16).unwrap());
                    i += 3;
                }
            } else {
                result.push(bytes[i]);
                i += 1;
            }
        }

        result
    }

    #[test]
    fn test_quoted_printable_plain_text() {
        assert_eq!(encode_quoted_printable(b"Hello, World!"), "Hello, World!");
    }

    #[test]
    fn test_quoted_printable_escapes_equals() {
        assert_eq!(encode_quoted_printable(b"A=B"), "A=3DB");
    }

    #[test]
    fn test_quoted_printable_non_ascii() {
        let encoded = encode_quoted_printable("Héllo".as_bytes());
        assert_eq!(encoded, "H=C3=A9llo");
        assert_eq!(encode_quoted_printable(&[0x00, 0x7F, 0xFF]), "=00=7F=FF");
    }

    #[test]
    fn test_quoted_printable_trailing_space() {
        assert_eq!(encode_quoted_printable(b"end "), "end=20");
        assert_eq!(encode_quoted_printable(b"a b"), "a b");
        assert_eq!(encode_quoted_printable(b"one \ntwo"), "one=20\ntwo");
    }

    #[test]
    fn test_quoted_printable_tab_passes_through() {
        assert_eq!(encode_quoted_printable(b"a\tb\t"), "a\tb\t");
    }

    #[test]
    fn test_quoted_printable_line_endings() {
        assert_eq!(encode_quoted_printable(b"a\r\nb\nc"), "a\nb\nc");
        assert_eq!(
            encode_quoted_printable_with(b"a\nb", MAX_LINE_LENGTH, LineEnding::CrLf),
            "a\r\nb"
        );
        // A lone carriage return is data
        assert_eq!(encode_quoted_printable(b"a\rb"), "a=0Db");
    }

    #[test]
    fn test_quoted_printable_trims_final_terminators() {
        assert_eq!(encode_quoted_printable(b"line\n\n"), "line");
        assert_eq!(encode_quoted_printable(b""), "");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let input = "x".repeat(80);
        let encoded = encode_quoted_printable(input.as_bytes());
        let lines: Vec<&str> = encoded.split('\n').collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("{}=", "x".repeat(75)));
        assert_eq!(lines[1], "x".repeat(5));
    }

    #[test]
    fn test_quoted_printable_does_not_split_escape() {
        let input = format!("{}=", "x".repeat(73));
        let encoded = encode_quoted_printable(input.as_bytes());

        assert_eq!(encoded, format!("{}=\n=3D", "x".repeat(73)));
    }

    #[test]
    fn test_quoted_printable_small_line_length() {
        let encoded = encode_quoted_printable_with(b"====", 1, LineEnding::Lf);
        for line in encoded.split('\n') {
            assert!(line.len() <= MIN_LINE_LENGTH, "line too long: {line:?}");
        }
        assert_eq!(decode_quoted_printable(&encoded), b"====");
    }

    proptest! {
        #[test]
        fn prop_lines_within_limit(
            data in prop::collection::vec(any::<u8>(), 0..400),
            max in 4usize..120,
        ) {
            let encoded = encode_quoted_printable_with(&data, max, LineEnding::Lf);
            for line in encoded.split('\n') {
                prop_assert!(line.len() <= max, "{} > {}: {:?}", line.len(), max, line);
            }
        }

        #[test]
        fn prop_printable_round_trip(lines in prop::collection::vec("[ -~\t]{0,150}", 1..6)) {
            let text = lines.join("\n");
            prop_assume!(!text.ends_with('\n'));

            let encoded = encode_quoted_printable(text.as_bytes());
            prop_assert_eq!(decode_quoted_printable(&encoded), text.into_bytes());
        }

        #[test]
        fn prop_output_is_ascii(data in prop::collection::vec(any::<u8>(), 0..200)) {
            let encoded = encode_quoted_printable(&data);
            prop_assert!(encoded.bytes().all(|b| b == b'\n' || b == b'\t' || (32..=126).contains(&b)));
        }
    }
}
