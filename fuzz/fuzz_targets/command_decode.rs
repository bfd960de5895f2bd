//! Fuzz target for Command::from_frame
//!
//! Arbitrary text must never panic the decoder. Anything it accepts must
//! survive a re-encode unchanged.

#![no_main]

use heisenpad_proto::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|frame: &str| {
    if let Ok(command) = Command::from_frame(frame) {
        let reencoded = command.to_frame();
        assert_eq!(Command::from_frame(&reencoded).as_ref(), Ok(&command));
    }
});
