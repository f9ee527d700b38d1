//! Deterministic JSON emission
//!
//! One compact, ASCII-only JSON writer backs the canonical state
//! form, the snapshot form, and cluster hashing. Field order comes
//! from the serialized type (struct declaration order, map key
//! order); this module only guarantees byte-level stability: no
//! whitespace, non-ASCII characters escaped as `\uXXXX`, no trailing
//! newline.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// Compact formatter that escapes every non-ASCII character.
///
/// serde_json's default escapes (quotes, backslash, control
/// characters) are kept; this only adds `\uXXXX` (lowercase hex,
/// surrogate pairs above the BMP) for characters outside ASCII, so
/// the output bytes are pure ASCII.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiCompactFormatter;

impl Formatter for AsciiCompactFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            if start < i {
                writer.write_all(fragment[start..i].as_bytes())?;
            }
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + ch.len_utf8();
        }
        if start < fragment.len() {
            writer.write_all(fragment[start..].as_bytes())?;
        }
        Ok(())
    }
}

/// Serialize a value to compact ASCII-only JSON bytes.
pub fn to_ascii_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiCompactFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

/// Serialize a value to a compact ASCII-only JSON string.
pub fn to_ascii_json_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = to_ascii_json_bytes(value)?;
    // The formatter emits pure ASCII, which is valid UTF-8.
    Ok(String::from_utf8(bytes).expect("ASCII JSON output is valid UTF-8"))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_no_whitespace() {
        let value = json!({"b": [1, 2], "a": "x"});
        let text = to_ascii_json_string(&value).expect("serialize");
        // serde_json maps are sorted, output is compact
        assert_eq!(text, r#"{"a":"x","b":[1,2]}"#);
    }

    #[test]
    fn test_non_ascii_escaped() {
        let value = json!({"name": "Zo\u{00eb}"});
        let text = to_ascii_json_string(&value).expect("serialize");
        assert_eq!(text, "{\"name\":\"Zo\\u00eb\"}");
        assert!(text.is_ascii());
    }

    #[test]
    fn test_astral_chars_use_surrogate_pairs() {
        // U+1F701 encodes as a UTF-16 surrogate pair.
        let value = json!("\u{1F701}");
        let text = to_ascii_json_string(&value).expect("serialize");
        assert_eq!(text, "\"\\ud83d\\udf01\"");
    }

    #[test]
    fn test_standard_escapes_preserved() {
        let value = json!("line\nbreak \"quoted\"");
        let text = to_ascii_json_string(&value).expect("serialize");
        assert_eq!(text, r#""line\nbreak \"quoted\"""#);
    }

    #[test]
    fn test_no_trailing_newline() {
        let text = to_ascii_json_string(&json!(1)).expect("serialize");
        assert_eq!(text, "1");
    }
}
