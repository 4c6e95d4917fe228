//! dfc: a Direct Filter + Compact Table multi-pattern exact matcher.
//!
//! The crate provides:
//! - A pure-Rust build phase (`pattern`, `filter`, `table`, `compile`)
//!   turning a set of byte patterns into an immutable, `Send + Sync`
//!   [`scan::CompiledIndex`].
//! - A zero-allocation scan phase (`scan`) reporting every exact
//!   occurrence of every pattern in an input buffer.
//! - A thin facade (`engine`) tying the build and scan phases together
//!   behind a small set of free functions.
//! - An optional CLI (`cli` feature).
//!
//! # Quick Start
//!
//! ```
//! use dfc::pattern::PatternSet;
//!
//! let mut set = PatternSet::new();
//! set.add_pattern(b"needle", false, 1).unwrap();
//! let index = set.compile().unwrap();
//!
//! let mut input = b"a needle in a haystack".to_vec();
//! input.extend(std::iter::repeat(0u8).take(dfc::error::MAX_PATTERN_LENGTH));
//! let length = input.len() - dfc::error::MAX_PATTERN_LENGTH;
//!
//! let mut hits = 0;
//! index.scan(&input, length, |_| hits += 1);
//! assert_eq!(hits, 1);
//! ```

pub mod ascii;
pub mod compile;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hash;
pub mod pattern;
pub mod scan;
pub mod table;

#[cfg(feature = "cli")]
pub mod cli;
