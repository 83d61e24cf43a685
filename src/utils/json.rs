// Start of file: /src/utils/json.rs

/*
    * JSON rendering of problem documents.
    *
    * serde_json already writes compact or pretty output; the encode flags on
    * top of that (slash and unicode escaping, zero fractions) are applied by
    * wrapping its formatter.
*/

use std::fmt;
use std::io;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::{Serializer, Value};
use thiserror::Error;

use crate::models::data::Substitutions;
use crate::models::problem::ProblemDocument;

/// Bit set of JSON encode options.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JsonFlags(u32);

impl JsonFlags {
    pub const NONE: JsonFlags = JsonFlags(0);
    pub const PRETTY_PRINT: JsonFlags = JsonFlags(1);
    pub const UNESCAPED_SLASHES: JsonFlags = JsonFlags(1 << 1);
    pub const UNESCAPED_UNICODE: JsonFlags = JsonFlags(1 << 2);
    pub const PRESERVE_ZERO_FRACTION: JsonFlags = JsonFlags(1 << 3);
    pub const PARTIAL_OUTPUT_ON_ERROR: JsonFlags = JsonFlags(1 << 4);

    /// Flags used when none are configured.
    pub const DEFAULT: JsonFlags = JsonFlags(
        Self::UNESCAPED_SLASHES.0
            | Self::UNESCAPED_UNICODE.0
            | Self::PRESERVE_ZERO_FRACTION.0
            | Self::PARTIAL_OUTPUT_ON_ERROR.0,
    );

    const NAMED: [(&'static str, JsonFlags); 5] = [
        ("PRETTY_PRINT", Self::PRETTY_PRINT),
        ("UNESCAPED_SLASHES", Self::UNESCAPED_SLASHES),
        ("UNESCAPED_UNICODE", Self::UNESCAPED_UNICODE),
        ("PRESERVE_ZERO_FRACTION", Self::PRESERVE_ZERO_FRACTION),
        ("PARTIAL_OUTPUT_ON_ERROR", Self::PARTIAL_OUTPUT_ON_ERROR),
    ];

    /// Default flags, pretty-printed in debug mode.
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            Self::DEFAULT | Self::PRETTY_PRINT
        } else {
            Self::DEFAULT
        }
    }

    pub const fn contains(self, other: JsonFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn without(self, other: JsonFlags) -> Self {
        JsonFlags(self.0 & !other.0)
    }
}

impl BitOr for JsonFlags {
    type Output = JsonFlags;

    fn bitor(self, rhs: JsonFlags) -> JsonFlags {
        JsonFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for JsonFlags {
    fn bitor_assign(&mut self, rhs: JsonFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for JsonFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        write!(f, "JsonFlags({})", names.join(" | "))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown JSON flag `{0}`")]
pub struct UnknownJsonFlag(pub String);

impl FromStr for JsonFlags {
    type Err = UnknownJsonFlag;

    /// Parses flag names separated by `|` or `,`. Names are case-insensitive
    /// and may carry a `JSON_` prefix; a bare number is read as raw bits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(bits) = s.trim().parse::<u32>() {
            return Ok(JsonFlags(bits));
        }

        let mut flags: JsonFlags = JsonFlags::NONE;
        for name in s.split(['|', ',']).map(str::trim).filter(|name| !name.is_empty()) {
            let upper: String = name.to_ascii_uppercase();
            let bare: &str = upper.strip_prefix("JSON_").unwrap_or(&upper);
            let flag: JsonFlags = Self::NAMED
                .iter()
                .find(|(known, _)| *known == bare)
                .map(|(_, flag)| *flag)
                .ok_or_else(|| UnknownJsonFlag(name.to_owned()))?;
            flags |= flag;
        }
        Ok(flags)
    }
}

#[derive(Debug, Error)]
pub enum JsonEncodeError {
    #[error("payload needed {invalid_utf8} UTF-8 and {non_finite} number substitutions and partial output is disabled")]
    Lossy { invalid_utf8: usize, non_finite: usize },
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Formatter applying the escaping flags on top of an inner layout formatter.
struct FlagFormatter<F> {
    inner: F,
    flags: JsonFlags,
}

impl<F: Formatter> FlagFormatter<F> {
    fn write_escaped_char<W>(&self, writer: &mut W, ch: char) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units: [u16; 2] = [0; 2];
        for unit in ch.encode_utf16(&mut units) {
            write!(writer, "\\u{:04x}", unit)?;
        }
        Ok(())
    }
}

impl<F: Formatter> Formatter for FlagFormatter<F> {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut buffer: Vec<u8> = Vec::new();
        self.inner.write_f64(&mut buffer, value)?;
        if !self.flags.contains(JsonFlags::PRESERVE_ZERO_FRACTION) && buffer.ends_with(b".0") {
            buffer.truncate(buffer.len() - 2);
        }
        writer.write_all(&buffer)
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let escape_slashes: bool = !self.flags.contains(JsonFlags::UNESCAPED_SLASHES);
        let escape_unicode: bool = !self.flags.contains(JsonFlags::UNESCAPED_UNICODE);
        if !escape_slashes && !escape_unicode {
            return writer.write_all(fragment.as_bytes());
        }

        let mut start: usize = 0;
        for (index, ch) in fragment.char_indices() {
            let needs_escape: bool = (escape_slashes && ch == '/') || (escape_unicode && !ch.is_ascii());
            if !needs_escape {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..index])?;
            if ch == '/' {
                writer.write_all(b"\\/")?;
            } else {
                self.write_escaped_char(writer, ch)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }

    // * Layout is delegated to the inner formatter

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.inner.end_object_value(writer)
    }
}

fn write_with<F: Formatter>(value: &Value, inner: F, flags: JsonFlags) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer: Vec<u8> = Vec::with_capacity(256);
    let mut serializer: Serializer<&mut Vec<u8>, FlagFormatter<F>> =
        Serializer::with_formatter(&mut buffer, FlagFormatter { inner, flags });
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Encodes a JSON value with the given flags.
pub fn encode_value(value: &Value, flags: JsonFlags) -> Result<Vec<u8>, serde_json::Error> {
    if flags.contains(JsonFlags::PRETTY_PRINT) {
        write_with(value, PrettyFormatter::with_indent(b"    "), flags)
    } else {
        write_with(value, CompactFormatter, flags)
    }
}

/// Encodes a problem document, refusing lossy documents unless partial
/// output is allowed.
pub fn encode(document: &ProblemDocument, flags: JsonFlags) -> Result<Vec<u8>, JsonEncodeError> {
    let substitutions: Substitutions = document.substitutions();
    if !flags.contains(JsonFlags::PARTIAL_OUTPUT_ON_ERROR) && !substitutions.is_lossless() {
        return Err(JsonEncodeError::Lossy {
            invalid_utf8: substitutions.invalid_utf8,
            non_finite: substitutions.non_finite,
        });
    }

    Ok(encode_value(&Value::Object(document.fields().clone()), flags)?)
}

/// Encodes a problem document and never fails: a document that cannot be
/// encoded degrades to its canonical fields, then to `{}`.
pub fn render(document: &ProblemDocument, flags: JsonFlags) -> Vec<u8> {
    encode(document, flags)
        .or_else(|_| encode_value(&Value::Object(document.canonical_fields()), flags))
        .unwrap_or_else(|_| b"{}".to_vec())
}

// End of file: /src/utils/json.rs
