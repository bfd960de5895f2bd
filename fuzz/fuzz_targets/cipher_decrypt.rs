//! Fuzz target for CipherContext::decrypt
//!
//! Decryption is total: malformed hex, short input and wrong keys all
//! produce some string, never a panic.

#![no_main]

use heisenpad_crypto::CipherContext;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, &str)| {
    let (passphrase, ciphertext) = input;
    if let Some(cipher) = CipherContext::derive(passphrase, "lobby") {
        let _ = cipher.decrypt(ciphertext);
    }
});
