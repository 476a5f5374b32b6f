//! Greedy partial-order merge.
//!
//! Ported from quantumsim's `tp.partial_greedy_toposort`. Each input chain is a strict
//! local total order over a subset of shared items; the merge linearizes all of them
//! into one duplicate-free sequence, preferring selections that pull as few new
//! "target" chains into the schedule per round as possible so that target streams stay
//! contiguous.

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

use crate::trace::TraceSink;

/// One step of a [`Spine`]: an item plus the chain whose predecessor link produced it.
///
/// `origin` is `None` only for the seed step, the owning chain's last item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpineStep<T> {
    pub origin: Option<usize>,
    pub item: T,
}

/// Backward ancestor trail grown from one chain's last item.
///
/// Steps accumulate tail-first, so reversing them yields an earliest-ancestor-first
/// sequence. The same item can legitimately appear in several spines (and, with
/// diamond-shaped sharing, more than once within one spine); pruning and emission
/// dedupe in [`merge_spines`] resolve the redundancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spine<T> {
    /// Index of the chain this spine grew from, as passed by the caller.
    pub chain: usize,
    /// The trail in backward order, chain tail first.
    pub steps: Vec<SpineStep<T>>,
    /// Target chains whose predecessor links fired during the walk.
    pub used_targets: BTreeSet<usize>,
}

impl<T> fmt::Display for Spine<T>
where
    T: Serialize,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        for step in &self.steps {
            let json = serde_json::to_string(&step.item).map_err(|_| fmt::Error)?;
            parts.push(json);
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Merges `chains` into one duplicate-free ordering consistent with every chain.
///
/// `targets` lists the chains whose items should stay as contiguous as the order
/// constraints allow. Indices that match no chain are silently ignored, and empty
/// chains are dropped without disturbing the indices of the rest.
///
/// Chains must be mutually consistent. If one chain orders `a` before `b` and another
/// orders `b` before `a`, no schedule satisfies both and the backward walk in
/// [`spines`] revisits the pair forever; no validation guards against this.
pub fn merge<T>(chains: &[Vec<T>], targets: &[usize]) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    merge_spines(spines(chains, targets))
}

/// Builds one predecessor map per non-empty chain, pairing it with the chain's index
/// in `chains`.
///
/// Empty chains are dropped here. Keeping the survivors keyed by their original index
/// means target membership never shifts when a chain disappears.
pub fn predecessor_maps<T>(chains: &[Vec<T>]) -> Vec<(usize, HashMap<T, T>)>
where
    T: Clone + Eq + Hash,
{
    chains
        .iter()
        .enumerate()
        .filter(|(_, chain)| !chain.is_empty())
        .map(|(n, chain)| {
            let mut prev: HashMap<T, T> = HashMap::default();
            for pair in chain.windows(2) {
                prev.insert(pair[1].clone(), pair[0].clone());
            }
            (n, prev)
        })
        .collect()
}

/// Grows one [`Spine`] per surviving chain.
///
/// The walk starts at the chain's last item and repeatedly steps to predecessors,
/// crossing into every chain whose predecessor map knows the popped item. Maps are
/// scanned in ascending chain order, so the explicit stack visits higher-indexed
/// chains first; together with the selection tie-break in [`merge_spines`] this keeps
/// the whole pipeline deterministic.
///
/// `targets` flags the chains to track in [`Spine::used_targets`]; indices matching no
/// chain are ignored.
pub fn spines<T>(chains: &[Vec<T>], targets: &[usize]) -> Vec<Spine<T>>
where
    T: Clone + Eq + Hash,
{
    let target_set: HashSet<usize> = targets.iter().copied().collect();
    let prev_maps = predecessor_maps(chains);

    let mut out: Vec<Spine<T>> = Vec::with_capacity(prev_maps.len());
    for (n, _) in &prev_maps {
        let Some(seed) = chains[*n].last() else {
            continue;
        };

        let mut steps: Vec<SpineStep<T>> = Vec::new();
        let mut used_targets: BTreeSet<usize> = BTreeSet::new();
        let mut stack: Vec<(Option<usize>, T)> = vec![(None, seed.clone())];

        while let Some((origin, item)) = stack.pop() {
            for (n2, prev) in &prev_maps {
                let Some(p) = prev.get(&item) else {
                    continue;
                };
                if target_set.contains(n2) {
                    used_targets.insert(*n2);
                }
                stack.push((Some(*n2), p.clone()));
            }
            steps.push(SpineStep { origin, item });
        }

        out.push(Spine {
            chain: *n,
            steps,
            used_targets,
        });
    }
    out
}

/// Merge loop over prebuilt spines: select, commit, linearize, prune, emit.
///
/// Each round selects the spine minimizing `|used_targets ∪ all_used|`, i.e. the one
/// that would pull the fewest not-yet-committed target chains into the schedule. Ties
/// go to the earliest spine in list order; [`spines`] builds the list in ascending
/// chain order, so that is the lowest chain index, matching the upstream `min()` over
/// a list built in chain order.
///
/// When `PORPOISE_TRACE_MERGE_OUT` names a path, a JSON record of every round is
/// written there on completion.
pub fn merge_spines<T>(spines: Vec<Spine<T>>) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let sink = TraceSink::from_env(spines.len());
    merge_spines_traced(spines, sink)
}

pub(crate) fn merge_spines_traced<T>(mut spines: Vec<Spine<T>>, mut sink: TraceSink) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let mut result: Vec<T> = Vec::new();
    let mut emitted: HashSet<T> = HashSet::default();
    let mut all_used: HashSet<usize> = HashSet::default();

    let mut round = 0usize;
    while !spines.is_empty() {
        let mut best = 0usize;
        let mut best_cost = usize::MAX;
        for (i, spine) in spines.iter().enumerate() {
            let fresh = spine
                .used_targets
                .iter()
                .filter(|n| !all_used.contains(*n))
                .count();
            // |used_targets ∪ all_used|; the |all_used| term is constant within a round.
            let cost = all_used.len() + fresh;
            if cost < best_cost {
                best_cost = cost;
                best = i;
            }
        }

        let spine = spines.remove(best);
        let fresh_targets: Vec<usize> = if sink.enabled() {
            spine
                .used_targets
                .iter()
                .filter(|n| !all_used.contains(*n))
                .copied()
                .collect()
        } else {
            Vec::new()
        };
        all_used.extend(spine.used_targets.iter().copied());

        // Earliest ancestor first.
        let chosen: Vec<T> = spine.steps.iter().rev().map(|s| s.item.clone()).collect();
        let chosen_set: HashSet<&T> = chosen.iter().collect();

        let mut pruned = 0usize;
        for other in &mut spines {
            let before = other.steps.len();
            other.steps.retain(|s| !chosen_set.contains(&s.item));
            pruned += before - other.steps.len();
        }

        let mut appended = 0usize;
        for item in chosen {
            if emitted.insert(item.clone()) {
                result.push(item);
                appended += 1;
            }
        }

        sink.round(round, spine.chain, best_cost, fresh_targets, appended, pruned);
        round += 1;
    }

    sink.write();
    result
}
