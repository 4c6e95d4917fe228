#![no_main]
use dfc::error::MAX_PATTERN_LENGTH;
use dfc::pattern::PatternSet;
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

// Scanning arbitrary input against a fixed, once-built index must never
// panic regardless of input content or length.
static INDEX: OnceLock<dfc::scan::CompiledIndex> = OnceLock::new();

fn index() -> &'static dfc::scan::CompiledIndex {
    INDEX.get_or_init(|| {
        let mut set = PatternSet::new();
        set.add_pattern(b"attack", false, 0).unwrap();
        set.add_pattern(b"crash", true, 1).unwrap();
        set.add_pattern(b"a", false, 2).unwrap();
        set.add_pattern(b"tail-anchored-pattern", true, 3).unwrap();
        set.compile().unwrap()
    })
}

fuzz_target!(|data: &[u8]| {
    let length = data.len();
    let mut padded = data.to_vec();
    padded.extend(std::iter::repeat(0u8).take(MAX_PATTERN_LENGTH));
    let mut count = 0usize;
    index().scan(&padded, length, |_| count += 1);
});
