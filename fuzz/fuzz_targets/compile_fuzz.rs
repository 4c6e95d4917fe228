#![no_main]
use dfc::pattern::PatternSet;
use libfuzzer_sys::fuzz_target;

// Compiling an arbitrary pattern set must never panic — only return
// `Err(BuildError)` for inputs that violate a documented capacity.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let mut set = PatternSet::new();
    let mut i = 0usize;
    let mut eid = 0u32;
    while i + 2 <= data.len() {
        let case_insensitive = data[i] & 1 != 0;
        let len = 1 + (data[i] as usize >> 1) % 64;
        i += 1;
        let end = (i + len).min(data.len());
        if i >= end {
            break;
        }
        let _ = set.add_pattern(&data[i..end], case_insensitive, eid);
        eid = eid.wrapping_add(1);
        i = end;
    }

    let _ = set.compile();
});
