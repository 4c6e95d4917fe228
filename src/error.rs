//! Build-time error kinds.
//!
//! Scan has no recoverable errors (see [`crate::scan`]); only `compile()`
//! can fail, and it always fails with one of these.

/// Hard per-pattern length ceiling.
pub const MAX_PATTERN_LENGTH: usize = 64;

/// Hard cap on external ids collapsing into a single internal pattern.
pub const MAX_EIDS_PER_PATTERN: usize = 220;

/// Errors reported by [`crate::pattern::PatternSet::add_pattern`] and
/// [`crate::pattern::PatternSet::compile`].
///
/// These are surfaced to the caller verbatim; the core never logs an error
/// itself (see spec §7 policy) — only informational `debug!`/`trace!`
/// build-phase diagnostics are emitted, and only on the success path.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum BuildError {
    /// `length > MAX_PATTERN_LENGTH`.
    #[error("pattern too long: {length} bytes (max {max})")]
    PatternTooLong { length: usize, max: usize },

    /// `length == 0`.
    #[error("pattern is empty")]
    PatternEmpty,

    /// More than `MAX_EIDS_PER_PATTERN` external ids collapsed onto one
    /// normalized (bytes, case-flag) pair.
    #[error("too many equal patterns: {count} external ids collapse to one pattern (max {max})")]
    TooManyEqualPatterns { count: usize, max: usize },

    /// A small compact-table bucket exceeded its fixed capacity during
    /// packing. Fatal: the pattern set is pathological for this engine's
    /// fixed capacities and must be reduced or split by the caller.
    #[error("compact table overflow (small): bucket {bucket} exceeds capacity {capacity}")]
    CompactTableOverflowSmall { bucket: usize, capacity: usize },

    /// A large compact-table bucket (entries or per-entry pids) exceeded
    /// its fixed capacity during packing. Same remedy as above.
    #[error("compact table overflow (large): bucket {bucket} exceeds capacity {capacity}")]
    CompactTableOverflowLarge { bucket: usize, capacity: usize },

    /// Total distinct-pattern count exceeds the PID vector's addressable
    /// range (`u32::MAX` dense identifiers).
    #[error("pid overflow: {count} exceeds addressable range {max}")]
    PidOverflow { count: usize, max: usize },
}
