//! Trace payloads for debugging merge scheduling decisions.
//!
//! These records are emitted only when tracing is enabled (see
//! `PORPOISE_TRACE_MERGE_OUT`).

use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct RoundTrace {
    round: usize,
    chain: usize,
    cost: usize,
    fresh_targets: Vec<usize>,
    emitted: usize,
    pruned: usize,
}

#[derive(Serialize)]
struct MergeTrace {
    spines: usize,
    rounds: Vec<RoundTrace>,
}

/// Collects one record per greedy round and writes them as pretty JSON when the merge
/// completes. Disabled (the default) it costs one env lookup.
pub(crate) struct TraceSink {
    out: Option<PathBuf>,
    spines: usize,
    rounds: Vec<RoundTrace>,
}

impl TraceSink {
    pub(crate) fn from_env(spines: usize) -> Self {
        TraceSink {
            out: std::env::var_os("PORPOISE_TRACE_MERGE_OUT").map(PathBuf::from),
            spines,
            rounds: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_path(path: PathBuf, spines: usize) -> Self {
        TraceSink {
            out: Some(path),
            spines,
            rounds: Vec::new(),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.out.is_some()
    }

    pub(crate) fn round(
        &mut self,
        round: usize,
        chain: usize,
        cost: usize,
        fresh_targets: Vec<usize>,
        emitted: usize,
        pruned: usize,
    ) {
        if self.out.is_none() {
            return;
        }
        self.rounds.push(RoundTrace {
            round,
            chain,
            cost,
            fresh_targets,
            emitted,
            pruned,
        });
    }

    pub(crate) fn write(self) {
        let Some(path) = self.out else {
            return;
        };
        let trace = MergeTrace {
            spines: self.spines,
            rounds: self.rounds,
        };
        if let Ok(json) = serde_json::to_string_pretty(&trace) {
            let _ = std::fs::write(path, json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{merge_spines_traced, spines};
    use serde_json::json;

    #[test]
    fn sink_without_a_destination_records_no_rounds() {
        let mut sink = TraceSink {
            out: None,
            spines: 2,
            rounds: Vec::new(),
        };
        assert!(!sink.enabled());
        sink.round(0, 1, 1, vec![1], 2, 0);
        assert!(sink.rounds.is_empty());
    }

    #[test]
    fn trace_dump_records_spine_count_and_the_chain_committed_each_round() {
        let chains = vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["x".to_string(), "y".to_string(), "z".to_string()],
            vec!["a".to_string(), "x".to_string()],
        ];
        let built = spines(&chains, &[0, 1]);
        let path = std::env::temp_dir().join(format!(
            "porpoise-merge-trace-{}.json",
            std::process::id()
        ));
        let sink = TraceSink::from_path(path.clone(), built.len());

        let sequence = merge_spines_traced(built, sink);
        assert_eq!(sequence, ["a", "x", "b", "c", "y", "z"]);

        let payload = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let trace: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(trace["spines"], 3);
        let rounds = trace["rounds"].as_array().unwrap();
        assert_eq!(rounds.len(), 3);
        let committed: Vec<u64> = rounds.iter().map(|r| r["chain"].as_u64().unwrap()).collect();
        assert_eq!(committed, [2, 0, 1]);

        // The untargeted chain-2 spine goes first; pruning its two shared items
        // shortens both remaining spines.
        assert_eq!(
            trace["rounds"][0],
            json!({
                "round": 0,
                "chain": 2,
                "cost": 0,
                "fresh_targets": [],
                "emitted": 2,
                "pruned": 3
            })
        );
        assert_eq!(trace["rounds"][1]["fresh_targets"], json!([0]));
        assert_eq!(trace["rounds"][2]["fresh_targets"], json!([1]));
    }
}
