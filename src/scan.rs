//! The scan/verify loop: `CompiledIndex::scan`.
//!
//! Single-threaded, allocation-free after the index is built (spec §5).
//! For every input position `i` the scanner probes `DFs`/`DFl` with the
//! 2-byte window `(input[i+1], input[i])`; a small hit verifies against
//! `CTs`, a large hit confirmed by `DFlh` on the 4-byte window
//! `input[i..i+4]` verifies against `CTl`.

use crate::ascii::to_upper;
use crate::error::MAX_PATTERN_LENGTH;
use crate::filter::Filters;
use crate::hash::{ctl_bucket, dflh_bit, tail_key};
use crate::pattern::InternalPattern;
use crate::table::{LargeCompactTable, SmallCompactTable};

/// A confirmed match, handed to the caller's callback.
///
/// Carries the matched pattern's bytes (as originally supplied) and its
/// full external-id list. Per DESIGN.md's resolved Open Question, one
/// callback invocation covers every external id deduped onto this pattern
/// (the callback does not fan out per-EID).
pub struct MatchedPattern<'a> {
    pub bytes: &'a [u8],
    pub length: usize,
    pub external_ids: &'a [u32],
}

/// The immutable, read-only index produced by [`crate::pattern::PatternSet::compile`].
///
/// `Send + Sync`: every field is an owned `Vec`/array with no interior
/// mutability, so any number of scanners may share one index concurrently
/// without synchronization (spec §5).
pub struct CompiledIndex {
    pub(crate) patterns: Vec<InternalPattern>,
    pub(crate) filters: Filters,
    pub(crate) cts: SmallCompactTable,
    pub(crate) ctl: LargeCompactTable,
}

/// A byte-comparable snapshot of the compact tables' flattened arrays, for
/// compile-determinism testing (spec.md §8 property 5): two `compile()`
/// calls over identical additions, in the same order, must produce
/// identical bucket contents in the same order.
#[derive(Debug, PartialEq, Eq)]
pub struct TableDigest {
    pub small_buckets: Vec<(u32, u32)>,
    pub small_pids: Vec<u32>,
    pub large_buckets: Vec<(u32, u32)>,
    pub large_entries: Vec<(u32, u32, u32)>,
    pub large_pids: Vec<u32>,
}

impl CompiledIndex {
    /// Number of distinct patterns in this index.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Byte contents of the four direct filters (`DF0`, `DFs`, `DFl`,
    /// `DFlh`), in that order. Exposed for compile-determinism testing
    /// (spec.md §8 property 5).
    pub fn filter_bytes(&self) -> [&[u8]; 4] {
        [
            self.filters.df0.as_bytes(),
            self.filters.dfs.as_bytes(),
            self.filters.dfl.as_bytes(),
            self.filters.dflh.as_bytes(),
        ]
    }

    /// A digest of every compact-table bucket's contents, in flattening
    /// order, for compile-determinism testing (spec.md §8 property 5).
    pub fn table_digest(&self) -> TableDigest {
        TableDigest {
            small_buckets: self.cts.raw_buckets().to_vec(),
            small_pids: self.cts.raw_pids().iter().map(|p| p.0).collect(),
            large_buckets: self.ctl.raw_buckets().to_vec(),
            large_entries: self
                .ctl
                .raw_entries()
                .iter()
                .map(|e| (e.tail_key, e.pid_offset(), e.pid_count()))
                .collect(),
            large_pids: self.ctl.raw_pids().iter().map(|p| p.0).collect(),
        }
    }

    /// Scan the first `length` bytes of `input` for matches, invoking
    /// `on_match` once per confirmed occurrence. Returns the total number
    /// of matches.
    ///
    /// `input` must be at least `length + MAX_PATTERN_LENGTH` bytes long —
    /// the bytes past `length` are never reported as match content but are
    /// read by the hot loop's unconditional 2/4-byte window loads, so the
    /// caller must keep them allocated and readable (zero-filled is fine).
    /// This elides a bounds check on every position of the scan loop. A
    /// debug assertion enforces the contract; the release hot path trusts
    /// it and never re-checks.
    pub fn scan(&self, input: &[u8], length: usize, mut on_match: impl FnMut(&MatchedPattern)) -> usize {
        debug_assert!(
            input.len() >= length,
            "scan: input buffer shorter than the logical length passed in"
        );
        debug_assert!(
            input.len() >= length + MAX_PATTERN_LENGTH || length == 0,
            "scan: caller should supply MAX_PATTERN_LENGTH bytes of read-ahead padding past `length`"
        );
        self.scan_range(input, 0, length, &mut on_match)
    }

    /// Scan only `input[range_start..range_end)`: identical to [`scan`] with
    /// `range_end` standing in for the logical length (both the probe loop
    /// bound and the verify-time "don't match past here" bound).
    ///
    /// [`scan`]: CompiledIndex::scan
    pub(crate) fn scan_range(
        &self,
        input: &[u8],
        range_start: usize,
        range_end: usize,
        on_match: &mut dyn FnMut(&MatchedPattern),
    ) -> usize {
        self.scan_range_overlapped(input, range_start, range_end, range_end, on_match)
    }

    /// Probe positions `input[loop_start..loop_end)`, but allow verification
    /// to read and match up to `verify_end` (used by
    /// [`crate::scan::scan_parallel`] so a partition's probe positions stay
    /// disjoint from its neighbors' while its verify reads may still look
    /// past its own nominal end into the next partition's real bytes).
    pub(crate) fn scan_range_overlapped(
        &self,
        input: &[u8],
        loop_start: usize,
        loop_end: usize,
        verify_end: usize,
        on_match: &mut dyn FnMut(&MatchedPattern),
    ) -> usize {
        let mut count = 0usize;
        let mut i = loop_start;
        while i < loop_end {
            let b0 = input[i];
            let b1 = if i + 1 < input.len() { input[i + 1] } else { 0 };
            let w2 = ((b1 as u32) << 8) | b0 as u32;

            if self.filters.dfs.test(w2) {
                count += self.verify_small(input, i, verify_end, on_match);
            }

            if i + 3 < verify_end && self.filters.dfl.test(w2) {
                let tail = [input[i], input[i + 1], input[i + 2], input[i + 3]];
                let k = tail_key(tail);
                if self.filters.dflh.test(dflh_bit(k)) {
                    count += self.verify_large(input, i, verify_end, k, on_match);
                }
            }

            i += 1;
        }
        count
    }

    /// `length` is the logical content length — matches may never extend
    /// past it, even though `input` itself may be longer (padding).
    #[inline]
    fn verify_small(
        &self,
        input: &[u8],
        i: usize,
        length: usize,
        on_match: &mut dyn FnMut(&MatchedPattern),
    ) -> usize {
        let mut count = 0;
        let bucket = input[i];
        for &pid in self.cts.bucket(bucket) {
            let pat = &self.patterns[pid.as_usize()];
            let len = pat.length();
            if len > length - i {
                continue;
            }
            let candidate = &input[i..i + len];
            if bytes_match(candidate, pat) {
                on_match(&MatchedPattern {
                    bytes: pat.original_bytes(),
                    length: len,
                    external_ids: pat.external_ids(),
                });
                count += 1;
            }
        }
        count
    }

    #[inline]
    fn verify_large(
        &self,
        input: &[u8],
        i: usize,
        length: usize,
        k: u32,
        on_match: &mut dyn FnMut(&MatchedPattern),
    ) -> usize {
        let mut count = 0;
        let bucket = ctl_bucket(k);
        for entry in self.ctl.bucket_entries(bucket) {
            if entry.tail_key != k {
                continue;
            }
            for &pid in self.ctl.entry_pids(entry) {
                let pat = &self.patterns[pid.as_usize()];
                let len = pat.length();
                // Tail-anchored: input[i..i+4] == pattern tail, so the
                // pattern starts at i - (len - 4).
                let start = match i.checked_sub(len - 4) {
                    Some(s) => s,
                    None => continue,
                };
                if start + len > length {
                    continue;
                }
                let candidate = &input[start..start + len];
                if bytes_match(candidate, pat) {
                    on_match(&MatchedPattern {
                        bytes: pat.original_bytes(),
                        length: len,
                        external_ids: pat.external_ids(),
                    });
                    count += 1;
                }
            }
        }
        count
    }
}

/// Partition `input[..length]` across `num_partitions` worker threads,
/// scanning each partition independently and summing match counts.
///
/// Per spec §5, a partition's probe positions never extend past its
/// nominal end — partitions stay disjoint, so no match is double-counted —
/// but verification is allowed to read up to `MAX_PATTERN_LENGTH - 1` bytes
/// past that end, so a pattern whose probe position falls in one partition
/// but whose bytes extend into the next is still found. `input` itself
/// must carry `MAX_PATTERN_LENGTH` bytes of read-ahead padding past
/// `length`, same as [`CompiledIndex::scan`]. This only reports matches
/// whose callback-visible count is summed; callers needing the matches
/// themselves should scan with a `Sync` collector via the per-partition
/// closures directly (this free function exists for the common
/// count-only case demonstrated by the `cli` feature).
#[cfg(feature = "parallel")]
pub fn scan_parallel(index: &CompiledIndex, input: &[u8], length: usize, num_partitions: usize) -> usize {
    use rayon::prelude::*;

    debug_assert!(num_partitions > 0, "scan_parallel: need at least one partition");
    if length == 0 || num_partitions <= 1 {
        let mut count = 0usize;
        index.scan(input, length, |_| count += 1);
        return count;
    }

    let chunk = length.div_ceil(num_partitions);
    let mut starts = Vec::with_capacity(num_partitions);
    let mut i = 0;
    while i < length {
        starts.push(i);
        i += chunk;
    }

    starts
        .into_par_iter()
        .map(|start| {
            let loop_end = (start + chunk).min(length);
            let mut count = 0usize;
            index.scan_range_overlapped(input, start, loop_end, length, &mut |_| count += 1);
            count
        })
        .sum()
}

#[inline(always)]
fn bytes_match(candidate: &[u8], pat: &InternalPattern) -> bool {
    if pat.case_insensitive() {
        let upper = pat.upper_bytes();
        candidate
            .iter()
            .zip(upper)
            .all(|(&c, &u)| to_upper(c) == u)
    } else {
        candidate == pat.original_bytes()
    }
}
