//! The build-phase orchestration: `PatternSet → CompiledIndex`.
//!
//! Single-threaded, allocates freely (spec §5). Ties `pattern::finalize`,
//! `filter::build`, and `table::build` together and enforces the PID
//! addressable-range ceiling before handing back an immutable index.

use log::debug;

use crate::error::BuildError;
use crate::filter;
use crate::pattern::PatternSet;
use crate::scan::CompiledIndex;
use crate::table;

/// PIDs are dense `u32`s; this is the addressable range spec §7's
/// `PidOverflow` protects.
const MAX_PID_COUNT: usize = u32::MAX as usize;

/// Compile a finalized pattern set into a read-only, shareable index.
///
/// Consumes `set`: a `PatternSet` can only be compiled once (mirroring
/// spec §3's "`compile()` consumes it once").
pub fn compile(set: PatternSet) -> Result<CompiledIndex, BuildError> {
    let (patterns, equal_groups) = set.finalize();

    if patterns.len() > MAX_PID_COUNT {
        return Err(BuildError::PidOverflow {
            count: patterns.len(),
            max: MAX_PID_COUNT,
        });
    }

    debug!(
        "dfc: compiling {} distinct patterns ({} deduped groups)",
        patterns.len(),
        equal_groups
    );

    let filters = filter::build(&patterns);
    let (cts, ctl) = table::build(&patterns)?;

    debug!(
        "dfc: compiled filters ({} small-path, {} large-path patterns)",
        patterns.iter().filter(|p| p.length() <= 3).count(),
        patterns.iter().filter(|p| p.length() >= 4).count(),
    );

    Ok(CompiledIndex {
        patterns,
        filters,
        cts,
        ctl,
    })
}
