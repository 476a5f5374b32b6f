#![forbid(unsafe_code)]

//! Interleaving-minimizing linearization of partially ordered chains.
//!
//! A port of quantumsim's `tp.partial_greedy_toposort`, together with the lane grouping
//! its `Circuit.order()` wraps around it.
//!
//! Design goals:
//! - deterministic output for identical input (documented tie-breaks, no observable
//!   hash-iteration order)
//! - parity with the upstream greedy strategy: fewest new target streams per round
//! - no input validation beyond the construction itself; chains are trusted to be
//!   mutually consistent

pub mod lanes;
pub mod merge;
mod trace;

pub use lanes::{LaneEntry, order_lanes};
pub use merge::{Spine, SpineStep, merge, merge_spines, predecessor_maps, spines};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
