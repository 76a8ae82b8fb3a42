#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    // Status parsing should never panic, and accepted values must
    // round-trip through their canonical code and name.
    if let Some(status) = genomos::Status::parse(&input) {
        assert_eq!(genomos::Status::parse(&status.code().to_string()), Some(status));
        assert_eq!(genomos::Status::parse(status.name()), Some(status));
    }
});
