//! Message encryption using `ChaCha20`
//!
//! Ciphertext is the lowercase hex encoding of `nonce ‖ body`, so it travels
//! as an ordinary JSON string in the message `content` field.

use std::fmt;

use chacha20::{
    ChaCha20, Key, Nonce,
    cipher::{KeyIvInit, StreamCipher},
};
use zeroize::Zeroize;

use crate::derivation::derive_key;

/// Size of the per-message nonce (12 bytes)
pub const NONCE_SIZE: usize = 12;

/// Encrypt/decrypt pair for one `(passphrase, channel)`.
///
/// Recreated whenever the passphrase or channel changes. Holds no message
/// history. Key material is zeroized on drop.
pub struct CipherContext {
    key: [u8; 32],
}

impl CipherContext {
    /// Derive a context. `None` when `passphrase` is empty: encryption is
    /// opt-in.
    pub fn derive(passphrase: &str, channel: &str) -> Option<Self> {
        if passphrase.is_empty() {
            return None;
        }

        Some(Self { key: derive_key(passphrase, channel) })
    }

    /// Encrypt `plaintext` under this context.
    ///
    /// Caller MUST provide fresh random bytes for `nonce` in production.
    /// Reusing a nonce under the same key exposes the XOR of both plaintexts.
    pub fn encrypt(&self, plaintext: &str, nonce: [u8; NONCE_SIZE]) -> String {
        let mut body = plaintext.as_bytes().to_vec();
        self.apply_keystream(&nonce, &mut body);

        let mut sealed = Vec::with_capacity(NONCE_SIZE + body.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&body);
        hex::encode(sealed)
    }

    /// Decrypt `ciphertext` under this context.
    ///
    /// Never fails. A wrong key produces garbled text (invalid UTF-8 is
    /// replaced lossily). Input that is not hex, or too short to hold a
    /// nonce, decrypts to the empty string.
    pub fn decrypt(&self, ciphertext: &str) -> String {
        let Ok(sealed) = hex::decode(ciphertext) else {
            return String::new();
        };
        if sealed.len() < NONCE_SIZE {
            return String::new();
        }

        let (nonce, body) = sealed.split_at(NONCE_SIZE);
        let mut body = body.to_vec();
        self.apply_keystream(nonce, &mut body);

        String::from_utf8_lossy(&body).into_owned()
    }

    fn apply_keystream(&self, nonce: &[u8], buffer: &mut [u8]) {
        let mut cipher = ChaCha20::new(Key::from_slice(&self.key), Nonce::from_slice(nonce));
        cipher.apply_keystream(buffer);
    }
}

impl fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherContext").field("key", &"<redacted>").finish()
    }
}

impl Drop for CipherContext {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: [u8; NONCE_SIZE] = [7u8; NONCE_SIZE];

    fn lobby(passphrase: &str) -> CipherContext {
        CipherContext::derive(passphrase, "lobby").unwrap()
    }

    #[test]
    fn empty_passphrase_disables_encryption() {
        assert!(CipherContext::derive("", "lobby").is_none());
    }

    #[test]
    fn secret_msg_scenario() {
        let ciphertext = lobby("pw").encrypt("secret msg", NONCE);

        assert!(!ciphertext.is_empty());
        assert_ne!(ciphertext, "secret msg");
        assert_eq!(lobby("pw").decrypt(&ciphertext), "secret msg");
        assert_ne!(lobby("wrong").decrypt(&ciphertext), "secret msg");
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let ctx = lobby("pw");
        let ciphertext = ctx.encrypt("", NONCE);
        assert_eq!(ciphertext.len(), NONCE_SIZE * 2);
        assert_eq!(ctx.decrypt(&ciphertext), "");
    }

    #[test]
    fn multiline_plaintext_round_trips() {
        let ctx = lobby("pw");
        let text = "first line\nsecond line\n\ttabbed";
        assert_eq!(ctx.decrypt(&ctx.encrypt(text, NONCE)), text);
    }

    #[test]
    fn ciphertext_is_lowercase_hex() {
        let ciphertext = lobby("pw").encrypt("hello", NONCE);
        assert!(ciphertext.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        assert!(ciphertext.starts_with("070707070707070707070707"));
    }

    #[test]
    fn nonce_changes_ciphertext() {
        let ctx = lobby("pw");
        assert_ne!(ctx.encrypt("hello", [1u8; NONCE_SIZE]), ctx.encrypt("hello", [2u8; NONCE_SIZE]));
    }

    #[test]
    fn malformed_ciphertext_decrypts_to_empty() {
        let ctx = lobby("pw");
        assert_eq!(ctx.decrypt("not hex at all"), "");
        assert_eq!(ctx.decrypt("abcd"), "");
        assert_eq!(ctx.decrypt(""), "");
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", lobby("pw"));
        assert!(rendered.contains("redacted"));
    }
}
