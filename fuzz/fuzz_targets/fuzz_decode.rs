#![no_main]
use buildwell::serial::encode;
use buildwell::{decode, decode_str};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decode -> encode -> decode should never panic, and a successful
    // decode must survive the round trip unchanged
    if let Ok(catalog) = decode(data) {
        let output = encode(&catalog).expect("decoded catalog failed to encode");
        let again = decode_str(&output).expect("encoded catalog failed to decode");
        assert_eq!(again.products(), catalog.products());
    }
});
