//! Lane-grouped scheduling front end.
//!
//! Ported from the gate-ordering step in quantumsim's `Circuit.order()`: entries are
//! sorted by time, grouped into one chain per lane, and merged so that target lanes
//! keep their streams as contiguous as the cross-lane constraints allow.

use serde::Serialize;
use std::cmp::Ordering;

use crate::merge::merge;

/// One schedulable entry: a timestamp plus the lanes it occupies.
///
/// An entry on several lanes is order-constrained by each of them (a two-qubit gate in
/// the upstream circuit model).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneEntry {
    pub time: f64,
    pub lanes: Vec<usize>,
}

impl LaneEntry {
    pub fn new(time: f64, lanes: Vec<usize>) -> Self {
        LaneEntry { time, lanes }
    }
}

/// Orders `entries` into one execution sequence, returned as indices into `entries`.
///
/// Entries are stable-sorted by time first, so entries with equal times keep their
/// insertion order; a NaN time sorts after every numbered one, and NaN entries keep
/// insertion order among themselves. Each occupied lane then contributes the chain of
/// entries sitting on it, and the chains are merged with `target_lanes` as the target
/// streams. An entry listing no lanes joins no chain and is omitted from the returned
/// sequence. Lanes no entry occupies yield empty chains and are dropped by the merge;
/// target lanes beyond the highest occupied one are silently inert.
pub fn order_lanes(entries: &[LaneEntry], target_lanes: &[usize]) -> Vec<usize> {
    let mut by_time: Vec<usize> = (0..entries.len()).collect();
    by_time.sort_by(|&a, &b| time_order(entries[a].time, entries[b].time));

    let lane_count = entries
        .iter()
        .flat_map(|entry| entry.lanes.iter().copied())
        .max()
        .map_or(0, |max_lane| max_lane + 1);

    let mut chains: Vec<Vec<usize>> = vec![Vec::new(); lane_count];
    for (pos, &entry_idx) in by_time.iter().enumerate() {
        for &lane in &entries[entry_idx].lanes {
            // A lane listed twice on one entry would forge a self-predecessor.
            if chains[lane].last() == Some(&pos) {
                continue;
            }
            chains[lane].push(pos);
        }
    }

    merge(&chains, target_lanes)
        .into_iter()
        .map(|pos| by_time[pos])
        .collect()
}

// `sort_by` needs a consistent total order and IEEE comparison refuses NaN: NaN
// times go after every numbered one, insertion order among themselves.
fn time_order(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(order) => order,
        None => a.is_nan().cmp(&b.is_nan()),
    }
}
