//! The six end-to-end scenario rows from the pattern-matching design's
//! worked examples, run through the public API.

use dfc::error::MAX_PATTERN_LENGTH;
use dfc::pattern::PatternSet;
use dfc::scan::CompiledIndex;

fn compile(adds: &[(u32, &[u8], bool)]) -> CompiledIndex {
    let mut set = PatternSet::new();
    for &(eid, bytes, ci) in adds {
        set.add_pattern(bytes, ci, eid).unwrap();
    }
    set.compile().unwrap()
}

fn scan_count(index: &CompiledIndex, input: &[u8]) -> usize {
    let mut padded = input.to_vec();
    padded.extend(std::iter::repeat(0u8).take(MAX_PATTERN_LENGTH));
    let mut count = 0usize;
    index.scan(&padded, input.len(), |_| count += 1);
    count
}

#[test]
fn scenario_mixed_patterns_case_sensitive_and_insensitive() {
    let index = compile(&[
        (0, b"attack", false),
        (1, b"crash", true),
        (2, b"Piolink", true),
        (3, b"ATTACK", true),
    ]);
    let input = b"This input includes an attack pattern. It might CRASH your machine.";
    assert_eq!(scan_count(&index, input), 3);
}

#[test]
fn scenario_repeated_single_byte_pattern() {
    let index = compile(&[(0, b"a", false)]);
    assert_eq!(scan_count(&index, b"banana"), 3);
}

#[test]
fn scenario_overlapping_large_patterns() {
    let index = compile(&[(0, b"abcd", false), (1, b"bcde", false)]);
    assert_eq!(scan_count(&index, b"abcde"), 2);
}

#[test]
fn scenario_case_insensitive_overlap() {
    let index = compile(&[(0, b"AA", true)]);
    assert_eq!(scan_count(&index, b"aAaA"), 3);
}

#[test]
fn scenario_whole_input_is_one_pattern() {
    let index = compile(&[(0, b"the quick brown fox", false)]);
    assert_eq!(scan_count(&index, b"the quick brown fox"), 1);
}

#[test]
fn scenario_empty_input_has_no_matches() {
    let index = compile(&[(0, b"x", false)]);
    assert_eq!(scan_count(&index, b""), 0);
}
