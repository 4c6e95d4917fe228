//! Boundary cases from the pattern-matching design's edge-case list, run
//! through the public API (complementing the inline unit tests in
//! `src/scan.rs`).

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
fn pattern_at_offset_zero_of_input() {
    let index = compile(&[(0, b"abc", false)]);
    assert_eq!(scan_count(&index, b"abcxyz"), 1);
}

#[test]
fn pattern_at_last_possible_offset() {
    let index = compile(&[(0, b"xyz", false)]);
    assert_eq!(scan_count(&index, b"abcxyz"), 1);
}

#[test]
fn one_byte_pattern_matches_every_occurrence() {
    let index = compile(&[(0, b"z", false)]);
    assert_eq!(scan_count(&index, b"zzzzz"), 5);
}

#[test]
fn max_length_pattern_matches_exactly() {
    let pat = vec![b'q'; MAX_PATTERN_LENGTH];
    let index = compile(&[(0, &pat, false)]);
    let mut input = vec![b'z'; 10];
    input.extend_from_slice(&pat);
    input.extend(vec![b'z'; 10]);
    assert_eq!(scan_count(&index, &input), 1);
}

#[test]
fn two_patterns_sharing_a_prefix_and_a_tail() {
    let index = compile(&[(0, b"ab-match-tail", false), (1, b"ab-other-tail", false)]);
    assert_eq!(
        scan_count(&index, b"ab-match-tail and ab-other-tail"),
        2
    );
}

#[test]
fn input_shorter_than_every_pattern_yields_no_matches() {
    let index = compile(&[(0, b"abcdefgh", false)]);
    assert_eq!(scan_count(&index, b"abc"), 0);
}

#[test]
fn mixed_case_match_against_a_case_insensitive_pattern() {
    let index = compile(&[(0, b"Piolink", true)]);
    assert_eq!(scan_count(&index, b"check PIOLINK here"), 1);
    assert_eq!(scan_count(&index, b"check piolink here"), 1);
    assert_eq!(scan_count(&index, b"check PioLink here"), 1);
}

#[test]
fn dedup_collapses_equal_patterns_across_scans() {
    let mut set = PatternSet::new();
    set.add_pattern(b"dup", false, 10).unwrap();
    set.add_pattern(b"dup", false, 20).unwrap();
    let index = set.compile().unwrap();
    assert_eq!(index.pattern_count(), 1);
    assert_eq!(scan_count(&index, b"dup dup dup"), 3);
}
