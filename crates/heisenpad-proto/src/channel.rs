//! Channel identifiers.
//!
//! A channel is held in its percent-encoded form, which is what appears in
//! transport addresses, in shared links, and in the cipher salt. Encoding
//! matches JavaScript's `encodeURIComponent` so that identifiers agree with
//! browser clients byte for byte.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Channel joined when none is specified.
pub const DEFAULT_CHANNEL: &str = "lobby";

/// Bytes left unescaped by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encoded channel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(String);

impl Channel {
    /// Channel from a human-entered name.
    ///
    /// Surrounding whitespace is trimmed and an empty name selects
    /// [`DEFAULT_CHANNEL`].
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        let name = if name.is_empty() { DEFAULT_CHANNEL } else { name };
        Self(utf8_percent_encode(name, COMPONENT).to_string())
    }

    /// Channel from an identifier that is already percent-encoded.
    ///
    /// The identifier is normalized by decoding and re-encoding it, so
    /// `a%20b` and `a b` name the same channel.
    pub fn from_encoded(encoded: &str) -> Self {
        Self::new(&percent_decode_str(encoded).decode_utf8_lossy())
    }

    /// Percent-encoded form used in addresses and key derivation.
    pub fn as_encoded(&self) -> &str {
        &self.0
    }

    /// Decoded, human-readable name.
    pub fn display_name(&self) -> String {
        percent_decode_str(&self.0).decode_utf8_lossy().into_owned()
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self(DEFAULT_CHANNEL.to_string())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
