use std::borrow::Cow;
use thiserror::Error;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("not valid UTF-8 (invalid byte at offset {0})")]
    InvalidUtf8(usize),

    #[error("not valid UTF-16 text")]
    InvalidUtf16,
}

/// Decode text to a UTF-8 string without a byte-order mark.
///
/// Accepts UTF-8 with or without a BOM, and UTF-16 in either byte order
/// when it starts with the matching BOM. Valid BOM-less UTF-8 is borrowed
/// as-is, so `text.as_bytes() == bytes` tells the caller nothing changed.
pub fn normalize(bytes: &[u8]) -> Result<Cow<'_, str>, EncodingError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return std::str::from_utf8(rest)
            .map(Cow::Borrowed)
            .map_err(|e| EncodingError::InvalidUtf8(e.valid_up_to() + UTF8_BOM.len()));
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes).map(Cow::Owned);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes).map(Cow::Owned);
    }

    std::str::from_utf8(bytes)
        .map(Cow::Borrowed)
        .map_err(|e| EncodingError::InvalidUtf8(e.valid_up_to()))
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, EncodingError> {
    if bytes.len() % 2 != 0 {
        return Err(EncodingError::InvalidUtf16);
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| EncodingError::InvalidUtf16)
}
