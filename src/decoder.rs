// Input text decoding, selected once from the `-enc` flag.

use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecoderError {
    #[error("Unknown encoding {0}")]
    UnknownEncoding(String),
}

/// How raw file bytes become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDecoder {
    /// Bytes are UTF-8; invalid sequences become U+FFFD.
    #[default]
    Identity,
    /// Bytes are in a named legacy encoding such as GBK or Shift_JIS.
    Named(&'static Encoding),
}

impl TextDecoder {
    /// Resolve an encoding label (WHATWG names and aliases, case-insensitive).
    pub fn for_label(label: &str) -> Result<Self, DecoderError> {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case("utf-8") || trimmed.eq_ignore_ascii_case("utf8") {
            return Ok(TextDecoder::Identity);
        }
        match Encoding::for_label(trimmed.as_bytes()) {
            Some(enc) if enc == UTF_8 => Ok(TextDecoder::Identity),
            Some(enc) => Ok(TextDecoder::Named(enc)),
            None => Err(DecoderError::UnknownEncoding(label.to_string())),
        }
    }

    /// Like `for_label`, but an unknown label warns and falls back to UTF-8.
    pub fn for_label_or_identity(label: &str) -> Self {
        match Self::for_label(label) {
            Ok(decoder) => decoder,
            Err(e) => {
                warn!("{}, supposing UTF-8", e);
                println!("{}, supposing UTF-8", e);
                TextDecoder::Identity
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextDecoder::Identity => UTF_8.name(),
            TextDecoder::Named(enc) => enc.name(),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextDecoder::Identity => String::from_utf8_lossy(bytes).into_owned(),
            TextDecoder::Named(enc) => {
                let (text, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    warn!(encoding = enc.name(), "input contained malformed sequences");
                }
                text.into_owned()
            }
        }
    }
}
