//! Simulation runner
//!
//! Bootstraps a network of node tasks from a [`SimConfig`]:
//! - Builds the topology and a shared mailbox with one queue per node
//! - Spawns every node on its own tokio task
//! - Delivers a `Start` message to each node
//! - Waits for all completions, optionally under a wall-clock timeout

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use meshlab_core::{
    Algorithm, ChannelMailbox, Completion, Mailbox, MailboxStats, Message, Node, NodeId, NodeReport,
};
use meshlab_logging::{bootstrap_span, simulation_span};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::topology::{Topology, TopologyBuilder};

/// A configured, not yet started simulation
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    topology: Topology,
    mailbox: Arc<ChannelMailbox>,
}

/// Result of a finished simulation
#[derive(Debug, Clone)]
pub struct SimReport {
    /// One report per node, ordered by node id
    pub reports: Vec<NodeReport>,
    /// Node ids in the order their completions arrived
    pub completion_order: Vec<NodeId>,
    /// Messages still queued per node after every node terminated
    pub pending: BTreeMap<NodeId, usize>,
    pub mailbox: MailboxStats,
    pub elapsed: Duration,
}

impl Simulation {
    /// Build the topology and mailbox described by `config`
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let topology = TopologyBuilder::new(config.nodes)
            .build(config.topology, config.connection_probability);
        Self::with_topology(config, topology)
    }

    /// Use an explicit topology instead of generating one
    ///
    /// `config.nodes` and `config.topology` are ignored.
    pub fn with_topology(config: SimConfig, topology: Topology) -> SimResult<Self> {
        topology.validate()?;
        let mailbox = Arc::new(ChannelMailbox::with_codec(config.codec.build()));
        for id in topology.node_ids() {
            mailbox.register(id);
        }

        Ok(Self {
            config,
            topology,
            mailbox,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn mailbox(&self) -> &Arc<ChannelMailbox> {
        &self.mailbox
    }

    /// Run every node to termination
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Timeout`] if the nodes have not all terminated
    /// within `timeout_secs`; the remaining node tasks are aborted.
    pub async fn run(self) -> SimResult<SimReport> {
        let span = simulation_span(
            self.config.algorithm.name(),
            self.topology.node_count(),
            self.topology.edge_count(),
        );
        self.execute().instrument(span).await
    }

    async fn execute(self) -> SimResult<SimReport> {
        let started = Instant::now();
        let ids = self.topology.node_ids();
        let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

        info!(
            algorithm = self.config.algorithm.name(),
            nodes = ids.len(),
            iteration_max = self.config.iteration_max,
            "starting simulation"
        );

        let handles: Vec<JoinHandle<NodeReport>> = ids
            .iter()
            .map(|&id| {
                let mut node = bootstrap_span(id).in_scope(|| self.build_node(id, tx.clone()));
                tokio::spawn(async move { node.run().await }.in_current_span())
            })
            .collect();
        // Only node tasks hold senders from here on
        drop(tx);

        let start = Message::start();
        for &id in &ids {
            if let Err(e) = self.mailbox.deliver(id, &start) {
                abort_all(&handles);
                return Err(e.into());
            }
        }
        debug!("start delivered to all nodes");

        let node_count = ids.len();
        let collect = async move {
            let mut order = Vec::with_capacity(node_count);
            while let Some(completion) = rx.recv().await {
                if completion.outcome.is_completed() {
                    debug!(node_id = %completion.id, remaining = node_count - order.len() - 1, "node completed");
                } else {
                    warn!(node_id = %completion.id, outcome = ?completion.outcome, "node halted");
                }
                order.push(completion.id);
            }
            order
        };

        let completion_order = match self.config.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), collect).await {
                Ok(order) => order,
                Err(_) => {
                    warn!(timeout_secs = secs, "simulation timed out, aborting nodes");
                    abort_all(&handles);
                    return Err(SimError::Timeout(secs));
                }
            },
            None => collect.await,
        };

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            reports.push(handle.await?);
        }
        reports.sort_by_key(|report| report.id);

        let mut pending = BTreeMap::new();
        for &id in &ids {
            pending.insert(id, self.mailbox.pending(id)?);
        }

        let report = SimReport {
            reports,
            completion_order,
            pending,
            mailbox: self.mailbox.stats(),
            elapsed: started.elapsed(),
        };
        info!(
            completed = report.completed_count(),
            halted = report.halted().len(),
            delivered = report.mailbox.delivered,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "simulation finished"
        );
        Ok(report)
    }

    fn build_node(
        &self,
        id: NodeId,
        completion: mpsc::UnboundedSender<Completion>,
    ) -> Node<Box<dyn Algorithm>> {
        let neighbors = self.topology.neighbors(id).to_vec();
        let state = self
            .config
            .algorithm
            .initial_state(id, self.config.initial_values.get(&id).copied());
        debug!(neighbors = ?neighbors, "bootstrapping node");

        let mailbox: Arc<dyn Mailbox> = self.mailbox.clone();
        Node::new(id, neighbors, state, mailbox, self.config.algorithm.build())
            .with_config(self.config.node_config())
            .with_completion(completion)
    }
}

fn abort_all(handles: &[JoinHandle<NodeReport>]) {
    for handle in handles {
        handle.abort();
    }
}

impl SimReport {
    pub fn report(&self, id: NodeId) -> Option<&NodeReport> {
        self.reports.iter().find(|report| report.id == id)
    }

    pub fn completed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.outcome.is_completed())
            .count()
    }

    pub fn all_completed(&self) -> bool {
        self.completed_count() == self.reports.len()
    }

    /// Nodes that stopped on a failure
    pub fn halted(&self) -> Vec<&NodeReport> {
        self.reports
            .iter()
            .filter(|report| !report.outcome.is_completed())
            .collect()
    }

    /// Final value of `key` per node, for nodes that have one
    pub fn values(&self, key: &str) -> BTreeMap<NodeId, String> {
        self.reports
            .iter()
            .filter_map(|report| report.final_state.get(key).map(|v| (report.id, v.clone())))
            .collect()
    }

    /// Final value of `key` per node, parsed as numbers
    pub fn numeric_values(&self, key: &str) -> BTreeMap<NodeId, f64> {
        self.values(key)
            .into_iter()
            .filter_map(|(id, raw)| raw.parse().ok().map(|v| (id, v)))
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}/{} nodes completed in {:.1?} | delivered: {} | retrieved: {} | left queued: {}",
            self.completed_count(),
            self.reports.len(),
            self.elapsed,
            self.mailbox.delivered,
            self.mailbox.retrieved,
            self.pending.values().sum::<usize>(),
        );
        for report in &self.reports {
            let state = report
                .final_state
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "\n  node {}: {:?} after {} messages [{}]",
                report.id, report.outcome, report.messages_processed, state
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use meshlab_core::NodeOutcome;

    use super::*;
    use crate::algorithms::{AlgorithmKind, VALUE_KEY};
    use crate::config::CodecKind;
    use crate::topology::{TopologyKind, from_edges};

    #[tokio::test]
    async fn test_line_of_two_completes() {
        let config = SimConfig::default()
            .with_nodes(2)
            .with_topology(TopologyKind::Line)
            .with_iteration_max(3);

        let report = Simulation::new(config).unwrap().run().await.unwrap();

        assert!(report.all_completed());
        assert_eq!(report.completion_order.len(), 2);
        for node in &report.reports {
            assert_eq!(node.messages_processed, 3);
            assert_eq!(node.iteration, 4);
        }
        // Start plus three broadcasts per node
        assert_eq!(report.mailbox.delivered, 2 + 2 * 3);
        assert_eq!(report.mailbox.retrieved, 6);
        assert_eq!(report.pending.values().sum::<usize>(), 2);
    }

    #[tokio::test]
    async fn test_explicit_topology_with_json_codec() {
        let config = SimConfig::default()
            .with_algorithm(AlgorithmKind::Echo)
            .with_codec(CodecKind::Json)
            .with_iteration_max(2);
        let topology = from_edges(&[(1, 2), (2, 3), (3, 1)]);

        let report = Simulation::with_topology(config, topology)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert!(report.all_completed());
        assert_eq!(report.reports.len(), 3);
        assert_eq!(report.values(VALUE_KEY).len(), 3);
    }

    #[tokio::test]
    async fn test_stall_times_out() {
        // Echo never republishes, so a bound above 1 + degree cannot be reached
        let config = SimConfig::default()
            .with_algorithm(AlgorithmKind::Echo)
            .with_iteration_max(10)
            .with_timeout_secs(Some(1));

        let result = Simulation::new(config).unwrap().run().await;
        assert!(matches!(result, Err(SimError::Timeout(1))));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimConfig::default().with_nodes(0);
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_summary_lists_nodes() {
        let mut final_state = meshlab_core::NodeState::new();
        final_state.insert("value".to_string(), "1.5".to_string());
        let report = SimReport {
            reports: vec![NodeReport {
                id: NodeId(1),
                iteration: 3,
                messages_processed: 2,
                outcome: NodeOutcome::Completed,
                final_state,
            }],
            completion_order: vec![NodeId(1)],
            pending: BTreeMap::new(),
            mailbox: MailboxStats::default(),
            elapsed: Duration::from_millis(5),
        };

        let summary = report.summary();
        assert!(summary.starts_with("1/1 nodes completed"));
        assert!(summary.contains("node 1: Completed after 2 messages [value=1.5]"));
        assert_eq!(report.numeric_values("value").get(&NodeId(1)), Some(&1.5));
    }
}
