#![no_main]

use libfuzzer_sys::fuzz_target;
use xclog_message::Message;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic, and anything that decodes must re-encode identically
    if let Ok(msg) = Message::decode(data) {
        assert_eq!(msg.encode(), data);
    }
});
