//! Simulation configuration
//!
//! A [`SimConfig`] describes one run: how many nodes, how they are wired,
//! which algorithm they run, and the node iteration bound. It can be built
//! in code or loaded from a JSON file; every field has a default.
//!
//! ```json
//! {
//!   "nodes": 6,
//!   "topology": "ring",
//!   "algorithm": "averaging",
//!   "iteration_max": 20,
//!   "initial_values": { "1": 10.0, "2": 0.0 }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use meshlab_core::{IterationPolicy, JsonCodec, MessageCodec, NodeConfig, NodeId, PostcardCodec};
use serde::{Deserialize, Serialize};

use crate::algorithms::AlgorithmKind;
use crate::error::{SimError, SimResult};
use crate::topology::TopologyKind;

/// Encoding used by the mailbox service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CodecKind {
    #[default]
    Postcard,
    Json,
}

impl CodecKind {
    pub fn build(&self) -> Arc<dyn MessageCodec> {
        match self {
            CodecKind::Postcard => Arc::new(PostcardCodec),
            CodecKind::Json => Arc::new(JsonCodec),
        }
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of nodes, numbered `1..=nodes`
    pub nodes: u32,
    /// Shape of the generated topology
    pub topology: TopologyKind,
    /// Edge probability for the random topology
    pub connection_probability: f64,
    /// Algorithm every node runs
    pub algorithm: AlgorithmKind,
    /// Node loop bound
    pub iteration_max: u64,
    /// Who advances the node iteration counter
    pub iteration_policy: IterationPolicy,
    /// Mailbox encoding
    pub codec: CodecKind,
    /// Initial `value` per node; nodes not listed start with their id
    pub initial_values: BTreeMap<NodeId, f64>,
    /// Wall-clock limit for the whole run; `None` waits forever
    pub timeout_secs: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nodes: 6,
            topology: TopologyKind::Ring,
            connection_probability: 0.4,
            algorithm: AlgorithmKind::Averaging,
            iteration_max: 20,
            iteration_policy: IterationPolicy::PerMessage,
            codec: CodecKind::Postcard,
            initial_values: BTreeMap::new(),
            timeout_secs: Some(30),
        }
    }
}

impl SimConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the bootstrap cannot run
    pub fn validate(&self) -> SimResult<()> {
        if self.nodes < 2 {
            return Err(SimError::InvalidConfig(format!(
                "need at least 2 nodes, got {}",
                self.nodes
            )));
        }
        if self.iteration_max == 0 {
            return Err(SimError::InvalidConfig(
                "iteration_max must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.connection_probability) {
            return Err(SimError::InvalidConfig(format!(
                "connection_probability must be within [0, 1], got {}",
                self.connection_probability
            )));
        }
        if let Some(id) = self
            .initial_values
            .keys()
            .find(|id| id.as_u32() == 0 || id.as_u32() > self.nodes)
        {
            return Err(SimError::InvalidConfig(format!(
                "initial value given for node {} outside 1..={}",
                id, self.nodes
            )));
        }
        Ok(())
    }

    /// Per-node configuration derived from this run configuration
    pub fn node_config(&self) -> NodeConfig {
        NodeConfig::default()
            .with_iteration_max(self.iteration_max)
            .with_iteration_policy(self.iteration_policy)
    }

    pub fn with_nodes(mut self, nodes: u32) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_topology(mut self, topology: TopologyKind) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_algorithm(mut self, algorithm: AlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_iteration_max(mut self, iteration_max: u64) -> Self {
        self.iteration_max = iteration_max;
        self
    }

    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_initial_value(mut self, id: NodeId, value: f64) -> Self {
        self.initial_values.insert(id, value);
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SimConfig::default().with_nodes(1).validate().is_err());
        assert!(SimConfig::default().with_iteration_max(0).validate().is_err());
        assert!(
            SimConfig::default()
                .with_initial_value(NodeId(99), 1.0)
                .validate()
                .is_err()
        );

        let config = SimConfig {
            connection_probability: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_file_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"nodes": 4, "topology": "star", "algorithm": "max-flood",
                "iteration_policy": "per-message", "initial_values": {{"2": 7.5}}}}"#
        )
        .unwrap();

        let config = SimConfig::from_file(file.path()).unwrap();
        assert_eq!(config.nodes, 4);
        assert_eq!(config.topology, TopologyKind::Star);
        assert_eq!(config.algorithm, AlgorithmKind::MaxFlood);
        assert_eq!(config.initial_values.get(&NodeId(2)), Some(&7.5));
        assert_eq!(config.iteration_max, SimConfig::default().iteration_max);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"nodes": 1}}"#).unwrap();
        assert!(matches!(
            SimConfig::from_file(file.path()),
            Err(SimError::InvalidConfig(_))
        ));

        assert!(matches!(
            SimConfig::from_file("/definitely/not/here.json"),
            Err(SimError::Io(_))
        ));
    }

    #[test]
    fn test_node_config() {
        let config = SimConfig::default().with_iteration_max(7);
        assert_eq!(config.node_config().iteration_max, 7);
        assert_eq!(config.node_config().iteration_policy, IterationPolicy::PerMessage);
    }
}
