//! Stringifying trim and canonical JSON rendering of request parameters.
//!
//! The exchange recomputes the payload from the submitted form fields, so the
//! rendering here has to match its reference signer byte for byte:
//!
//! - scalars render the way a Python `str()` call would (`True`, `None`,
//!   shortest round-trip floats with `1e+16` / `1e-05` exponents);
//! - nested JSON uses `", "` / `": "` separators and ASCII-only escapes;
//! - the final document has sorted keys, no spaces and only double quotes.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;
use std::num::FpCategory;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::Result;
use crate::error::Error;
use crate::signing::params::{Number, ParamValue, ParameterSet};

/// Replaces every value in `params` with its string form, in place.
///
/// Nested objects are serialized in insertion order; arrays become a JSON
/// array of strings. Already-flat string mappings are left unchanged.
pub fn trim(params: &mut ParameterSet) -> Result<()> {
    for value in params.values_mut() {
        if let ParamValue::String(_) = value {
            continue;
        }
        let flat = stringify(value)?;
        *value = ParamValue::String(flat);
    }
    Ok(())
}

/// String form of a single value as it appears in the trimmed mapping.
pub fn stringify(value: &ParamValue) -> Result<String> {
    match value {
        ParamValue::Object(nested) => {
            let mut nested = nested.clone();
            trim(&mut nested)?;
            dumps(&nested)
        }
        ParamValue::Array(items) => {
            let items = items
                .iter()
                .map(|item| match item {
                    ParamValue::Object(_) => stringify(item),
                    other => Ok(python_str(other)),
                })
                .collect::<Result<Vec<_>>>()?;
            dumps(&items)
        }
        scalar => Ok(python_str(scalar)),
    }
}

/// Produces the signed payload: trimmed, key-sorted, space-free JSON.
pub fn canonicalize(params: &ParameterSet) -> Result<String> {
    let mut flat = params.clone();
    trim(&mut flat)?;

    let sorted: BTreeMap<&str, &ParamValue> = flat.iter().collect();
    let json = dumps(&sorted)?;

    Ok(json.replace(' ', "").replace('\'', "\""))
}

/// Serializes `value` with Python `json.dumps` defaults.
fn dumps<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PythonJsonFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| Error::with_source(crate::error::Kind::Encoding, e))
}

/// `json.dumps` layout: spaced separators and `\uXXXX` for anything outside
/// printable ASCII.
struct PythonJsonFormatter;

impl Formatter for PythonJsonFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0_u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                let mut utf8 = [0_u8; 4];
                writer.write_all(ch.encode_utf8(&mut utf8).as_bytes())?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// `str()` of a value: scalars directly, containers via [`python_repr`].
fn python_str(value: &ParamValue) -> String {
    match value {
        ParamValue::String(s) => s.clone(),
        other => python_repr(other),
    }
}

/// `repr()` of a value. Only reached for scalars and for containers nested
/// directly inside an array.
fn python_repr(value: &ParamValue) -> String {
    match value {
        ParamValue::Null => "None".to_owned(),
        ParamValue::Bool(true) => "True".to_owned(),
        ParamValue::Bool(false) => "False".to_owned(),
        ParamValue::Number(n) => number_string(*n),
        ParamValue::String(s) => quote_python_string(s),
        ParamValue::Array(items) => {
            let items: Vec<String> = items.iter().map(python_repr).collect();
            format!("[{}]", items.join(", "))
        }
        ParamValue::Object(params) => {
            let entries: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}: {}", quote_python_string(k), python_repr(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

fn quote_python_string(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_python_printable(c) => {
                let code = u32::from(c);
                let _ = if code <= 0xff {
                    write!(out, "\\x{code:02x}")
                } else if code <= 0xffff {
                    write!(out, "\\u{code:04x}")
                } else {
                    write!(out, "\\U{code:08x}")
                };
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Whether `repr` leaves `c` unescaped: everything except control, format,
/// private-use and noncharacter code points and separators other than the
/// ASCII space.
fn is_python_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() {
        return false;
    }
    let code = u32::from(c);
    let noncharacter = (0xfdd0..=0xfdef).contains(&code) || code & 0xfffe == 0xfffe;
    !noncharacter
        && !matches!(
            code,
            // separators
            0xa0 | 0x1680
                | 0x2000..=0x200a
                | 0x2028
                | 0x2029
                | 0x202f
                | 0x205f
                | 0x3000
                // format
                | 0xad
                | 0x600..=0x605
                | 0x61c
                | 0x6dd
                | 0x70f
                | 0x890..=0x891
                | 0x8e2
                | 0x180e
                | 0x200b..=0x200f
                | 0x202a..=0x202e
                | 0x2060..=0x2064
                | 0x2066..=0x206f
                | 0xfeff
                | 0xfff9..=0xfffb
                | 0x110bd
                | 0x110cd
                | 0x13430..=0x1343f
                | 0x1bca0..=0x1bca3
                | 0x1d173..=0x1d17a
                | 0xe0001
                | 0xe0020..=0xe007f
                // private use
                | 0xe000..=0xf8ff
                | 0xf0000..=0xffffd
                | 0x100000..=0x10fffd
        )
}

fn number_string(number: Number) -> String {
    match number {
        Number::Int(n) => n.to_string(),
        Number::UInt(n) => n.to_string(),
        Number::Float(f) => python_float_repr(f),
        Number::Decimal(d) => d.to_string(),
    }
}

/// Shortest round-trip rendering of `value` using Python's `repr` layout:
/// fixed notation for decimal exponents in `-4..16`, always with a fractional
/// part, and scientific notation with a signed two-digit exponent otherwise.
pub fn python_float_repr(value: f64) -> String {
    match value.classify() {
        FpCategory::Nan => return "nan".to_owned(),
        FpCategory::Infinite if value.is_sign_negative() => return "-inf".to_owned(),
        FpCategory::Infinite => return "inf".to_owned(),
        FpCategory::Zero if value.is_sign_negative() => return "-0.0".to_owned(),
        FpCategory::Zero => return "0.0".to_owned(),
        FpCategory::Normal | FpCategory::Subnormal => {}
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. `-3.25e-1`.
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let sign = if value.is_sign_negative() { "-" } else { "" };

    if (-4..16).contains(&exponent) {
        let (int_part, frac_part) = if exponent >= 0 {
            let point = exponent.unsigned_abs() as usize + 1;
            if digits.len() <= point {
                (format!("{digits:0<point$}"), "0".to_owned())
            } else {
                let (int_part, frac_part) = digits.split_at(point);
                (int_part.to_owned(), frac_part.to_owned())
            }
        } else {
            let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
            ("0".to_owned(), format!("{zeros}{digits}"))
        };
        format!("{sign}{int_part}.{frac_part}")
    } else {
        let (lead, rest) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        let exp_abs = exponent.unsigned_abs();
        if rest.is_empty() {
            format!("{sign}{lead}e{exp_sign}{exp_abs:02}")
        } else {
            format!("{sign}{lead}.{rest}e{exp_sign}{exp_abs:02}")
        }
    }
}
