//! Canonical JSON encoding used as the hash preimage for block transactions.
//!
//! Every object is emitted with its keys in lexicographic order, items are
//! separated by `", "` and keys from values by `": "`. Output is pure ASCII:
//! anything outside the printable range is written as a lowercase `\uXXXX`
//! escape (UTF-16 surrogate pairs above U+FFFF). Floats use the shortest
//! round-trip digits, keep a trailing `.0` when integral, and switch to a
//! signed two-digit exponent outside `1e-4 <= |x| < 1e16`. Integers keep
//! every digit, however large.
//!
//! Hashes persisted by earlier deployments were computed over exactly this
//! byte sequence, so none of these rules may change.

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Encode `value` canonically.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let value = sort_keys(serde_json::to_value(value)?);

    let mut out = Vec::with_capacity(256);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
    value.serialize(&mut serializer)?;

    String::from_utf8(out).map_err(serde_json::Error::custom)
}

/// Rebuild every object with its entries inserted in key order, so the
/// result does not depend on how `serde_json::Map` is backed.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    // Quotes, backslashes and C0 controls never reach this method; serde_json
    // routes them through `write_char_escape`, whose output already matches.
    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (offset, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..offset].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = offset + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    // Numbers arrive as the digits they were parsed from or created with.
    // Anything with a fraction or exponent is a float and is re-rendered from
    // its exactly rounded value; the rest is an integer of any size.
    fn write_number_str<W: ?Sized + Write>(&mut self, writer: &mut W, value: &str) -> io::Result<()> {
        if value.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
            let parsed: f64 = value
                .parse()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            return writer.write_all(format_float(parsed).as_bytes());
        }
        if value.trim_start_matches('-') == "0" {
            return writer.write_all(b"0");
        }
        writer.write_all(value.as_bytes())
    }

    fn write_f64<W: ?Sized + Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(format_float(value).as_bytes())
    }

    fn write_f32<W: ?Sized + Write>(&mut self, writer: &mut W, value: f32) -> io::Result<()> {
        writer.write_all(format_float(f64::from(value)).as_bytes())
    }
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let mut text = value.to_string();
        if !text.contains('.') {
            text.push_str(".0");
        }
        return text;
    }

    let text = format!("{:e}", value);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.abs())
}
