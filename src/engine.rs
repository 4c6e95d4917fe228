//! Thin facade over `pattern` + `filter` + `table` + `compile` + `scan`.
//!
//! Mirrors the crate's abstract external API in one place, the way
//! `oxidelta::engine` ties `hash` and `vcdiff` together behind `encode`/
//! `decode` without exposing either submodule's internals.

use crate::error::BuildError;
use crate::pattern::PatternSet;
use crate::scan::{CompiledIndex, MatchedPattern};

/// Start building a new pattern set.
pub fn new_pattern_set() -> PatternSet {
    PatternSet::new()
}

/// Compile a pattern set into a scannable index.
///
/// Equivalent to `set.compile()`; provided as a free function so callers
/// can use the crate purely through `dfc::engine` without naming
/// `PatternSet` directly.
pub fn compile(set: PatternSet) -> Result<CompiledIndex, BuildError> {
    set.compile()
}

/// Scan `input[..length]` against `index`, invoking `on_match` once per
/// confirmed occurrence. Returns the total match count.
pub fn scan(
    index: &CompiledIndex,
    input: &[u8],
    length: usize,
    on_match: impl FnMut(&MatchedPattern),
) -> usize {
    index.scan(input, length, on_match)
}

#[cfg(feature = "parallel")]
pub use crate::scan::scan_parallel;
