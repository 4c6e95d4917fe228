//! Compact-table packing: CTs (small) and CTl (large).
//!
//! Both start as per-bucket adjacency lists built while walking the
//! pattern set, then get flattened into the three contiguous arrays spec
//! §4.3 describes (`buckets` / `entries` / `pids`). Flattening walks
//! buckets in index order and preserves each bucket's insertion order, so
//! two compiles over the same additions in the same order produce
//! identical flattened arrays (spec §8 property 5).

use crate::error::BuildError;
use crate::hash::{ctl_bucket, tail_key};
use crate::pattern::{InternalPattern, Pid};

/// Small-table bucket count, keyed directly by `input[i]`.
pub const CTS_BUCKETS: usize = 256;
/// Fixed per-bucket PID capacity for the small table.
pub const CTS_BUCKET_CAPACITY: usize = 4096;

/// Large-table bucket count (`2^17`, per spec §3).
pub const CTL_BUCKETS: usize = 1 << 17;
/// Fixed per-bucket distinct-tail-key (entry) capacity for the large table.
pub const CTL_BUCKET_ENTRY_CAPACITY: usize = 64;
/// Fixed per-entry PID capacity for the large table.
pub const CTL_ENTRY_PID_CAPACITY: usize = 256;

/// Case variants of a byte, as in [`crate::filter`].
#[inline]
fn case_variants(b: u8, case_insensitive: bool) -> [Option<u8>; 2] {
    if !case_insensitive {
        return [Some(b), None];
    }
    if b.is_ascii_uppercase() {
        [Some(b), Some(b + 32)]
    } else if b.is_ascii_lowercase() {
        [Some(b), Some(b - 32)]
    } else {
        [Some(b), None]
    }
}

// ---------------------------------------------------------------------------
// Small compact table
// ---------------------------------------------------------------------------

/// Flattened small compact table: `buckets[256]` of `(offset, count)` into
/// a shared `pids` vector.
pub struct SmallCompactTable {
    buckets: [(u32, u32); CTS_BUCKETS],
    pids: Vec<Pid>,
}

impl SmallCompactTable {
    /// PIDs registered under bucket `key` (`input[i]` at scan time).
    #[inline(always)]
    pub fn bucket(&self, key: u8) -> &[Pid] {
        let (offset, count) = self.buckets[key as usize];
        &self.pids[offset as usize..offset as usize + count as usize]
    }

    /// The flattened `(offset, count)` array in bucket order, for
    /// compile-determinism digests.
    pub fn raw_buckets(&self) -> &[(u32, u32)] {
        &self.buckets
    }

    /// The shared pid vector backing every bucket, in flattening order.
    pub fn raw_pids(&self) -> &[Pid] {
        &self.pids
    }
}

fn build_small(patterns: &[InternalPattern]) -> Result<SmallCompactTable, BuildError> {
    let mut staging: Vec<Vec<Pid>> = vec![Vec::new(); CTS_BUCKETS];

    for (idx, pat) in patterns.iter().enumerate() {
        if pat.length() > 3 {
            continue;
        }
        let pid = Pid(idx as u32);
        let key_byte = pat.upper_bytes()[0];
        for kb in case_variants(key_byte, pat.case_insensitive())
            .into_iter()
            .flatten()
        {
            let bucket = &mut staging[kb as usize];
            if bucket.len() >= CTS_BUCKET_CAPACITY {
                return Err(BuildError::CompactTableOverflowSmall {
                    bucket: kb as usize,
                    capacity: CTS_BUCKET_CAPACITY,
                });
            }
            bucket.push(pid);
        }
    }

    let mut buckets = [(0u32, 0u32); CTS_BUCKETS];
    let mut pids = Vec::new();
    for (i, bucket) in staging.into_iter().enumerate() {
        let offset = pids.len() as u32;
        let count = bucket.len() as u32;
        buckets[i] = (offset, count);
        pids.extend(bucket);
    }

    Ok(SmallCompactTable { buckets, pids })
}

// ---------------------------------------------------------------------------
// Large compact table
// ---------------------------------------------------------------------------

/// One literal tail-key entry, with its own PID sub-list.
#[derive(Clone, Copy)]
pub struct LargeEntry {
    pub tail_key: u32,
    pid_offset: u32,
    pid_count: u32,
}

impl LargeEntry {
    /// Offset into the large table's shared pid vector, for
    /// compile-determinism digests.
    #[inline(always)]
    pub fn pid_offset(&self) -> u32 {
        self.pid_offset
    }

    /// Count of pids this entry owns, for compile-determinism digests.
    #[inline(always)]
    pub fn pid_count(&self) -> u32 {
        self.pid_count
    }
}

/// Flattened large compact table: `buckets[2^17]` of `(entry_offset,
/// entry_count)` into a shared `entries` vector, each entry pointing into
/// a shared `pids` vector.
pub struct LargeCompactTable {
    buckets: Vec<(u32, u32)>,
    entries: Vec<LargeEntry>,
    pids: Vec<Pid>,
}

impl LargeCompactTable {
    /// Entries registered in bucket `b` (`fold(tail_key) & 0x1FFFF` at scan time).
    #[inline(always)]
    pub fn bucket_entries(&self, b: usize) -> &[LargeEntry] {
        let (offset, count) = self.buckets[b];
        &self.entries[offset as usize..offset as usize + count as usize]
    }

    #[inline(always)]
    pub fn entry_pids(&self, entry: &LargeEntry) -> &[Pid] {
        &self.pids[entry.pid_offset as usize..entry.pid_offset as usize + entry.pid_count as usize]
    }

    /// The flattened `(entry_offset, entry_count)` array in bucket order,
    /// for compile-determinism digests.
    pub fn raw_buckets(&self) -> &[(u32, u32)] {
        &self.buckets
    }

    /// The flattened entry vector in bucket-then-insertion order, for
    /// compile-determinism digests.
    pub fn raw_entries(&self) -> &[LargeEntry] {
        &self.entries
    }

    /// The shared pid vector backing every entry, in flattening order.
    pub fn raw_pids(&self) -> &[Pid] {
        &self.pids
    }
}

struct StagingEntry {
    tail_key: u32,
    pids: Vec<Pid>,
}

fn build_large(patterns: &[InternalPattern]) -> Result<LargeCompactTable, BuildError> {
    let mut staging: Vec<Vec<StagingEntry>> = (0..CTL_BUCKETS).map(|_| Vec::new()).collect();

    for (idx, pat) in patterns.iter().enumerate() {
        if pat.length() < 4 {
            continue;
        }
        let pid = Pid(idx as u32);
        let u = pat.upper_bytes();
        let tail = &u[u.len() - 4..];
        let ci = pat.case_insensitive();

        for v0 in case_variants(tail[0], ci).into_iter().flatten() {
            for v1 in case_variants(tail[1], ci).into_iter().flatten() {
                for v2 in case_variants(tail[2], ci).into_iter().flatten() {
                    for v3 in case_variants(tail[3], ci).into_iter().flatten() {
                        let k = tail_key([v0, v1, v2, v3]);
                        let bucket = ctl_bucket(k);
                        let slot = &mut staging[bucket];
                        if let Some(existing) = slot.iter_mut().find(|e| e.tail_key == k) {
                            if existing.pids.len() >= CTL_ENTRY_PID_CAPACITY {
                                return Err(BuildError::CompactTableOverflowLarge {
                                    bucket,
                                    capacity: CTL_ENTRY_PID_CAPACITY,
                                });
                            }
                            existing.pids.push(pid);
                        } else {
                            if slot.len() >= CTL_BUCKET_ENTRY_CAPACITY {
                                return Err(BuildError::CompactTableOverflowLarge {
                                    bucket,
                                    capacity: CTL_BUCKET_ENTRY_CAPACITY,
                                });
                            }
                            slot.push(StagingEntry {
                                tail_key: k,
                                pids: vec![pid],
                            });
                        }
                    }
                }
            }
        }
    }

    let mut buckets = Vec::with_capacity(CTL_BUCKETS);
    let mut entries = Vec::new();
    let mut pids = Vec::new();
    for slot in staging {
        let entry_offset = entries.len() as u32;
        let entry_count = slot.len() as u32;
        for staged in slot {
            let pid_offset = pids.len() as u32;
            let pid_count = staged.pids.len() as u32;
            pids.extend(staged.pids);
            entries.push(LargeEntry {
                tail_key: staged.tail_key,
                pid_offset,
                pid_count,
            });
        }
        buckets.push((entry_offset, entry_count));
    }

    Ok(LargeCompactTable {
        buckets,
        entries,
        pids,
    })
}

/// Build both compact tables from the finalized pattern list.
pub fn build(
    patterns: &[InternalPattern],
) -> Result<(SmallCompactTable, LargeCompactTable), BuildError> {
    let small = build_small(patterns)?;
    let large = build_large(patterns)?;
    Ok((small, large))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternSet;

    fn compile_tables(
        adds: &[(&[u8], bool)],
    ) -> (
        Vec<InternalPattern>,
        SmallCompactTable,
        LargeCompactTable,
    ) {
        let mut set = PatternSet::new();
        for (i, (bytes, ci)) in adds.iter().enumerate() {
            set.add_pattern(bytes, *ci, i as u32).unwrap();
        }
        let (patterns, _) = set.finalize();
        let (small, large) = build(&patterns).unwrap();
        (patterns, small, large)
    }

    #[test]
    fn small_bucket_contains_expected_pid() {
        let (_patterns, small, _large) = compile_tables(&[(b"ab", false)]);
        let bucket = small.bucket(b'a');
        assert_eq!(bucket, &[Pid(0)]);
        assert!(small.bucket(b'z').is_empty());
    }

    #[test]
    fn small_bucket_case_insensitive_registers_both_cases() {
        let (_patterns, small, _large) = compile_tables(&[(b"ab", true)]);
        assert_eq!(small.bucket(b'A'), &[Pid(0)]);
        assert_eq!(small.bucket(b'a'), &[Pid(0)]);
    }

    #[test]
    fn large_table_finds_entry_by_tail_key() {
        let (_patterns, _small, large) = compile_tables(&[(b"attack", false)]);
        let tail = b"tack";
        let k = tail_key([tail[0], tail[1], tail[2], tail[3]]);
        let bucket = ctl_bucket(k);
        let entries = large.bucket_entries(bucket);
        let entry = entries.iter().find(|e| e.tail_key == k).unwrap();
        assert_eq!(large.entry_pids(entry), &[Pid(0)]);
    }

    #[test]
    fn two_patterns_sharing_a_tail_share_one_entry() {
        // Both end in "tack", both length >= 4.
        let (_patterns, _small, large) = compile_tables(&[(b"attack", false), (b"ztack", false)]);
        let tail = b"tack";
        let k = tail_key([tail[0], tail[1], tail[2], tail[3]]);
        let bucket = ctl_bucket(k);
        let entries = large.bucket_entries(bucket);
        let entry = entries.iter().find(|e| e.tail_key == k).unwrap();
        let pids = large.entry_pids(entry);
        assert_eq!(pids.len(), 2);
        assert!(pids.contains(&Pid(0)));
        assert!(pids.contains(&Pid(1)));
    }

    #[test]
    fn small_bucket_overflow_is_fatal() {
        let mut set = PatternSet::new();
        for i in 0..(CTS_BUCKET_CAPACITY as u32 + 1) {
            // distinct 3-byte patterns all starting with 'a' (two varying
            // trailing bytes give far more than CTS_BUCKET_CAPACITY distinct
            // combinations, so no pattern collapses via dedup).
            let bytes = [b'a', (i % 256) as u8, ((i / 256) % 256) as u8];
            set.add_pattern(&bytes, false, i).unwrap();
        }
        let (patterns, _) = set.finalize();
        let err = build_small(&patterns).unwrap_err();
        assert!(matches!(
            err,
            BuildError::CompactTableOverflowSmall { bucket, capacity }
                if bucket == b'a' as usize && capacity == CTS_BUCKET_CAPACITY
        ));
    }
}
