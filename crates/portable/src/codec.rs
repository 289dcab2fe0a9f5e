//! HTML ⇄ portable text payload.
//!
//! Decoding tries the compressed format first. A compressed match only
//! counts when re-compressing the recovered text reproduces the payload and
//! that text holds no control characters besides tab and line breaks. Short
//! plain Base64 strings can decompress canonically to control-character
//! noise; those fall through to the plain path.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;

/// Lenient like `atob`: padding optional, stray trailing bits ignored.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    #[default]
    Standard,
    Compressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    RawBase64,
    CompressedBase64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub html: String,
    pub format: PayloadFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    EmptyPayload,
    #[error("payload is neither compressed nor plain Base64 text")]
    InvalidPayload,
}

pub fn encode(html: &str, mode: EncodeMode) -> String {
    match mode {
        EncodeMode::Standard => STANDARD.encode(html.as_bytes()),
        EncodeMode::Compressed => lz_str::compress_to_base64(html),
    }
}

pub fn decode(payload: &str) -> Result<String, DecodeError> {
    decode_detailed(payload).map(|decoded| decoded.html)
}

pub fn decode_detailed(payload: &str) -> Result<Decoded, DecodeError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    if let Some(html) = decode_compressed(trimmed) {
        log::debug!("payload decoded as compressed Base64");
        return Ok(Decoded {
            html,
            format: PayloadFormat::CompressedBase64,
        });
    }

    if let Some(html) = decode_raw(trimmed) {
        log::debug!("payload decoded as plain Base64");
        return Ok(Decoded {
            html,
            format: PayloadFormat::RawBase64,
        });
    }

    Err(DecodeError::InvalidPayload)
}

fn decode_compressed(payload: &str) -> Option<String> {
    let units = lz_str::decompress_from_base64(payload)?;
    let html = String::from_utf16(&units).ok()?;
    if html.is_empty() || html.chars().any(is_stray_control) {
        return None;
    }
    (lz_str::compress_to_base64(html.as_str()) == payload).then_some(html)
}

fn is_stray_control(c: char) -> bool {
    c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r')
}

fn decode_raw(payload: &str) -> Option<String> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = FORGIVING.decode(compact).ok()?;
    String::from_utf8(bytes).ok()
}
