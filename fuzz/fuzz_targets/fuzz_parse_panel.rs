#![no_main]

use libfuzzer_sys::fuzz_target;

use genomos::panel::LocusPanel;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let declarations: Vec<&str> = input.lines().collect();

    // Panel parsing should never panic; accepted panels must expose a
    // finite reference Tm for every state.
    if let Ok(panel) = LocusPanel::from_declarations(&declarations) {
        for locus in panel.loci() {
            for (_, tm) in locus.states() {
                assert!(tm.is_finite());
            }
        }
    }
});
