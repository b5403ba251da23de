//! Example algorithm variants
//!
//! Each variant only implements the two node hooks. They double as
//! reference implementations for algorithm designers and as workloads for
//! the scenarios.
//!
//! - [`Averaging`]: pairwise averaging of a numeric `value`
//! - [`MaxFlood`]: flood the largest node id seen as `leader`
//! - [`Echo`]: publish once, record what arrives

mod averaging;
mod echo;
mod max_flood;

pub use averaging::Averaging;
pub use echo::{Echo, LAST_SENDER_KEY, RECEIVED_KEY};
pub use max_flood::MaxFlood;

use clap::ValueEnum;
use meshlab_core::{Algorithm, NodeError, NodeId, NodeState};
use serde::{Deserialize, Serialize};

/// State key holding a node's numeric value
pub const VALUE_KEY: &str = "value";
/// State key holding the leader a node currently believes in
pub const LEADER_KEY: &str = "leader";

/// Which algorithm every node of a simulation runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    #[default]
    Averaging,
    MaxFlood,
    Echo,
}

impl AlgorithmKind {
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::Averaging => "averaging",
            AlgorithmKind::MaxFlood => "max-flood",
            AlgorithmKind::Echo => "echo",
        }
    }

    /// Create a fresh algorithm instance for one node
    pub fn build(&self) -> Box<dyn Algorithm> {
        match self {
            AlgorithmKind::Averaging => Box::new(Averaging),
            AlgorithmKind::MaxFlood => Box::new(MaxFlood),
            AlgorithmKind::Echo => Box::new(Echo::default()),
        }
    }

    /// Initial state of node `id`
    ///
    /// `initial_value` seeds the `value` key; it defaults to the node id.
    pub fn initial_state(&self, id: NodeId, initial_value: Option<f64>) -> NodeState {
        let mut state = NodeState::new();
        let value = initial_value.unwrap_or(f64::from(id.as_u32()));
        state.insert(VALUE_KEY.to_string(), value.to_string());
        if *self == AlgorithmKind::MaxFlood {
            state.insert(LEADER_KEY.to_string(), id.to_string());
        }
        state
    }
}

/// Parse a numeric field, reporting the offending value on failure
pub(crate) fn parse_number(key: &str, raw: &str) -> Result<f64, NodeError> {
    raw.parse::<f64>()
        .map_err(|_| NodeError::algorithm(format!("{} is not a number: {}", key, raw)))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = AlgorithmKind::Averaging.initial_state(NodeId(3), None);
        assert_eq!(state.get(VALUE_KEY).unwrap(), "3");
        assert!(!state.contains_key(LEADER_KEY));

        let state = AlgorithmKind::MaxFlood.initial_state(NodeId(3), Some(0.5));
        assert_eq!(state.get(VALUE_KEY).unwrap(), "0.5");
        assert_eq!(state.get(LEADER_KEY).unwrap(), "3");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("value", "2.5").unwrap(), 2.5);
        assert!(matches!(
            parse_number("value", "abc"),
            Err(NodeError::Algorithm(_))
        ));
    }
}
