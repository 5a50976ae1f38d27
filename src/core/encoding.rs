//! Character encoding detection and conversion.
//!
//! The engine parses UTF-8 internally. Input bytes are normalized up front:
//! a byte order mark wins, then the caller's declared encoding hint, then
//! UTF-8 is assumed. UTF-16 in either byte order is converted.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    /// Detect the encoding from a BOM or the byte pattern of a leading `<`.
    pub fn detect(input: &[u8]) -> Option<Self> {
        if input.len() < 2 {
            return None;
        }
        match (input[0], input[1]) {
            (0xFF, 0xFE) => Some(Encoding::Utf16Le),
            (0xFE, 0xFF) => Some(Encoding::Utf16Be),
            (0xEF, 0xBB) if input.get(2) == Some(&0xBF) => Some(Encoding::Utf8),
            (0x00, b'<') => Some(Encoding::Utf16Be),
            (b'<', 0x00) => Some(Encoding::Utf16Le),
            _ => None,
        }
    }

    /// Map a caller-supplied encoding label. Unknown labels are treated as
    /// UTF-8-compatible and left to byte-level validation downstream.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "UTF-16LE" | "UTF16LE" => Encoding::Utf16Le,
            "UTF-16BE" | "UTF16BE" | "UTF-16" | "UTF16" => Encoding::Utf16Be,
            _ => Encoding::Utf8,
        }
    }
}

/// Normalize input bytes to UTF-8, honoring a BOM first and the caller's
/// hint second. Strips any BOM.
pub fn decode(input: Vec<u8>, hint: Option<&str>) -> Result<Vec<u8>> {
    let encoding = Encoding::detect(&input)
        .or_else(|| hint.map(Encoding::from_label))
        .unwrap_or(Encoding::Utf8);

    match encoding {
        Encoding::Utf8 => {
            if input.starts_with(&[0xEF, 0xBB, 0xBF]) {
                Ok(input[3..].to_vec())
            } else {
                Ok(input)
            }
        }
        Encoding::Utf16Le => decode_utf16(&input, &[0xFF, 0xFE], u16::from_le_bytes),
        Encoding::Utf16Be => decode_utf16(&input, &[0xFE, 0xFF], u16::from_be_bytes),
    }
}

fn decode_utf16(input: &[u8], bom: &[u8], combine: fn([u8; 2]) -> u16) -> Result<Vec<u8>> {
    let body = if input.starts_with(bom) {
        &input[2..]
    } else {
        input
    };
    if body.len() % 2 != 0 {
        return Err(Error::malformed("UTF-16 input has an odd byte count", 0));
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| combine([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .map(String::into_bytes)
        .map_err(|_| Error::malformed("invalid UTF-16 code unit sequence", 0))
}
