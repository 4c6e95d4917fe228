//! Pattern intake and dedup: `PatternSet` is the mutable builder; it
//! collapses equal `(bytes, case_flag)` pairs and assigns dense internal
//! identifiers on [`PatternSet::finalize`].
//!
//! The chained hash map used here exists purely to make dedup during
//! intake cheap; it is discarded once `finalize` runs and never appears in
//! the compiled index (see spec §4.1).

use std::collections::HashMap;

use crate::error::{BuildError, MAX_EIDS_PER_PATTERN, MAX_PATTERN_LENGTH};

/// Initial capacity hint for the intake dedup map (spec's `INIT_HASH_SIZE`).
pub const INIT_HASH_SIZE: usize = 65536;

/// Dense internal pattern identifier, assigned `0..P` by [`PatternSet::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl Pid {
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// One distinct pattern after dedup, in fixed form.
#[derive(Debug, Clone)]
pub struct InternalPattern {
    length: u8,
    case_insensitive: bool,
    original_bytes: [u8; MAX_PATTERN_LENGTH],
    upper_bytes: [u8; MAX_PATTERN_LENGTH],
    external_ids: Vec<u32>,
}

impl InternalPattern {
    #[inline]
    pub fn length(&self) -> usize {
        self.length as usize
    }

    #[inline]
    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// The pattern's bytes exactly as supplied (used for case-sensitive
    /// comparison).
    #[inline]
    pub fn original_bytes(&self) -> &[u8] {
        &self.original_bytes[..self.length()]
    }

    /// The pattern's bytes ASCII-uppercased (used for case-insensitive
    /// comparison; equal to `original_bytes()` when the pattern is
    /// case-sensitive, since normalization stores the literal bytes in
    /// both fields in that case).
    #[inline]
    pub fn upper_bytes(&self) -> &[u8] {
        &self.upper_bytes[..self.length()]
    }

    #[inline]
    pub fn external_ids(&self) -> &[u32] {
        &self.external_ids
    }
}

/// Mutable builder patterns are added to before [`compile`](PatternSet::compile).
#[derive(Default)]
pub struct PatternSet {
    patterns: Vec<InternalPattern>,
    /// normalized key (case_insensitive, normalized_bytes) -> index into `patterns`.
    index: HashMap<(bool, Vec<u8>), usize>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
            index: HashMap::with_capacity(INIT_HASH_SIZE.min(1024)),
        }
    }

    /// Add one pattern. `1 <= bytes.len() <= MAX_PATTERN_LENGTH`.
    ///
    /// Two additions collide iff their normalized key
    /// `(case_insensitive, if case_insensitive { upper(bytes) } else { bytes })`
    /// is equal; on collision `external_id` is appended to the existing
    /// pattern's EID list.
    pub fn add_pattern(
        &mut self,
        bytes: &[u8],
        case_insensitive: bool,
        external_id: u32,
    ) -> Result<(), BuildError> {
        if bytes.is_empty() {
            return Err(BuildError::PatternEmpty);
        }
        if bytes.len() > MAX_PATTERN_LENGTH {
            return Err(BuildError::PatternTooLong {
                length: bytes.len(),
                max: MAX_PATTERN_LENGTH,
            });
        }

        let normalized: Vec<u8> = if case_insensitive {
            bytes.iter().map(|&b| crate::ascii::to_upper(b)).collect()
        } else {
            bytes.to_vec()
        };
        let key = (case_insensitive, normalized);

        if let Some(&idx) = self.index.get(&key) {
            let pat = &mut self.patterns[idx];
            if pat.external_ids.len() >= MAX_EIDS_PER_PATTERN {
                return Err(BuildError::TooManyEqualPatterns {
                    count: pat.external_ids.len() + 1,
                    max: MAX_EIDS_PER_PATTERN,
                });
            }
            pat.external_ids.push(external_id);
            return Ok(());
        }

        let mut original_bytes = [0u8; MAX_PATTERN_LENGTH];
        let mut upper_bytes = [0u8; MAX_PATTERN_LENGTH];
        original_bytes[..bytes.len()].copy_from_slice(bytes);
        if case_insensitive {
            crate::ascii::upper_into(bytes, &mut upper_bytes[..bytes.len()]);
        } else {
            upper_bytes[..bytes.len()].copy_from_slice(bytes);
        }

        let idx = self.patterns.len();
        self.patterns.push(InternalPattern {
            length: bytes.len() as u8,
            case_insensitive,
            original_bytes,
            upper_bytes,
            external_ids: vec![external_id],
        });
        self.index.insert(key, idx);
        Ok(())
    }

    /// Number of distinct patterns added so far.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Consume the set, assigning dense `Pid`s `0..P` in insertion order.
    ///
    /// Returns the fixed-form patterns plus the number of distinct patterns
    /// that collapsed more than one external id (the dedup "equal groups"
    /// count from spec §4.1).
    pub fn finalize(self) -> (Vec<InternalPattern>, usize) {
        let equal_groups = self
            .patterns
            .iter()
            .filter(|p| p.external_ids.len() > 1)
            .count();
        (self.patterns, equal_groups)
    }

    /// Compile this set into a read-only, shareable [`crate::scan::CompiledIndex`].
    ///
    /// Consumes `self`: a set can only be compiled once.
    pub fn compile(self) -> Result<crate::scan::CompiledIndex, BuildError> {
        crate::compile::compile(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_pattern() {
        let mut set = PatternSet::new();
        assert_eq!(
            set.add_pattern(b"", false, 0),
            Err(BuildError::PatternEmpty)
        );
    }

    #[test]
    fn rejects_too_long_pattern() {
        let mut set = PatternSet::new();
        let bytes = vec![b'a'; MAX_PATTERN_LENGTH + 1];
        assert_eq!(
            set.add_pattern(&bytes, false, 0),
            Err(BuildError::PatternTooLong {
                length: MAX_PATTERN_LENGTH + 1,
                max: MAX_PATTERN_LENGTH
            })
        );
    }

    #[test]
    fn accepts_max_length_pattern() {
        let mut set = PatternSet::new();
        let bytes = vec![b'a'; MAX_PATTERN_LENGTH];
        assert!(set.add_pattern(&bytes, false, 0).is_ok());
    }

    #[test]
    fn dedup_collapses_equal_case_sensitive_patterns() {
        let mut set = PatternSet::new();
        set.add_pattern(b"attack", false, 0).unwrap();
        set.add_pattern(b"attack", false, 7).unwrap();
        let (patterns, equal_groups) = set.finalize();
        assert_eq!(patterns.len(), 1);
        assert_eq!(equal_groups, 1);
        assert_eq!(patterns[0].external_ids(), &[0, 7]);
    }

    #[test]
    fn dedup_is_keyed_on_case_flag_too() {
        let mut set = PatternSet::new();
        set.add_pattern(b"abc", false, 0).unwrap();
        set.add_pattern(b"abc", true, 1).unwrap();
        let (patterns, _) = set.finalize();
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn dedup_is_keyed_on_upper_bytes_for_case_insensitive() {
        let mut set = PatternSet::new();
        set.add_pattern(b"ABC", true, 0).unwrap();
        set.add_pattern(b"abc", true, 1).unwrap();
        set.add_pattern(b"AbC", true, 2).unwrap();
        let (patterns, equal_groups) = set.finalize();
        assert_eq!(patterns.len(), 1);
        assert_eq!(equal_groups, 1);
        assert_eq!(patterns[0].external_ids(), &[0, 1, 2]);
    }

    #[test]
    fn too_many_equal_patterns_is_fatal() {
        let mut set = PatternSet::new();
        for eid in 0..MAX_EIDS_PER_PATTERN as u32 {
            set.add_pattern(b"x", false, eid).unwrap();
        }
        let err = set.add_pattern(b"x", false, 9999).unwrap_err();
        assert_eq!(
            err,
            BuildError::TooManyEqualPatterns {
                count: MAX_EIDS_PER_PATTERN + 1,
                max: MAX_EIDS_PER_PATTERN
            }
        );
    }

    #[test]
    fn original_and_upper_bytes_for_case_sensitive_pattern_are_identical() {
        let mut set = PatternSet::new();
        set.add_pattern(b"MiXed", false, 0).unwrap();
        let (patterns, _) = set.finalize();
        assert_eq!(patterns[0].original_bytes(), b"MiXed");
        assert_eq!(patterns[0].upper_bytes(), b"MiXed");
    }

    #[test]
    fn upper_bytes_for_case_insensitive_pattern_is_uppercased() {
        let mut set = PatternSet::new();
        set.add_pattern(b"MiXed", true, 0).unwrap();
        let (patterns, _) = set.finalize();
        assert_eq!(patterns[0].original_bytes(), b"MiXed");
        assert_eq!(patterns[0].upper_bytes(), b"MIXED");
    }
}
