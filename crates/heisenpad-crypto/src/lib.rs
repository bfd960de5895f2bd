//! Heisenpad message cipher
//!
//! Derives an encrypt/decrypt pair from a shared passphrase, scoped to a
//! single channel. Pure functions with deterministic outputs: callers
//! provide the random nonce bytes.
//!
//! # Key Derivation
//!
//! ```text
//! channel ‖ APP_SALT ──────────┐
//!                              ▼ salt
//! passphrase ──────────► HKDF-SHA256 ──► 32-byte key
//!                                            │
//!                                            ▼
//!                     ChaCha20(key, nonce) ⊕ plaintext ──► hex(nonce ‖ body)
//! ```
//!
//! The salt is public. It exists so that one passphrase used in two channels
//! yields two unrelated keys, without any server-side secret.
//!
//! # Security
//!
//! This cipher is symmetric and UNAUTHENTICATED. There is no integrity tag:
//! decrypting with the wrong passphrase does not fail, it yields garbled
//! text. Callers cannot distinguish "wrong key" from "garbled content" and
//! must not try to. Anyone holding the passphrase can forge messages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cipher;
mod derivation;

pub use cipher::{CipherContext, NONCE_SIZE};
pub use derivation::{APP_SALT, channel_salt, derive_key};
