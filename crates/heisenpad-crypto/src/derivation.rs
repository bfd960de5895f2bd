//! Key derivation using HKDF

use hkdf::Hkdf;
use sha2::Sha256;

/// Fixed application constant appended to the channel to form the salt.
///
/// Not a secret. Every client of the network must use the same value.
pub const APP_SALT: &str = "OZte5GiFetRlkKAt0UkS";

/// Label used for message key derivation
const CIPHER_KEY_LABEL: &[u8] = b"heisenpad cipher v1";

/// Salt for a channel: the encoded channel identifier followed by
/// [`APP_SALT`].
pub fn channel_salt(channel: &str) -> Vec<u8> {
    let mut salt = Vec::with_capacity(channel.len() + APP_SALT.len());
    salt.extend_from_slice(channel.as_bytes());
    salt.extend_from_slice(APP_SALT.as_bytes());
    salt
}

/// Derive the 32-byte message key for `(passphrase, channel)`.
///
/// Deterministic: every participant holding the passphrase derives the same
/// key for the same channel.
pub fn derive_key(passphrase: &str, channel: &str) -> [u8; 32] {
    let salt = channel_salt(channel);
    let hkdf = Hkdf::<Sha256>::new(Some(&salt), passphrase.as_bytes());

    let mut key = [0u8; 32];
    let Ok(()) = hkdf.expand(CIPHER_KEY_LABEL, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    key
}
