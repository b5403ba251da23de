//! Pre-defined simulation scenarios for Meshlab
//!
//! Each scenario prints its topology and a summary, and returns the report
//! so callers (and tests) can inspect final node state.

use meshlab_core::NodeId;
use tracing::info;

use crate::algorithms::{AlgorithmKind, LEADER_KEY, VALUE_KEY};
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::runner::{SimReport, Simulation};
use crate::topology::TopologyKind;

/// Names accepted by [`run_scenario`]
pub const SCENARIOS: &[&str] = &["averaging", "election", "echo"];

/// Run a scenario by name; `None` if the name is unknown
pub async fn run_scenario(name: &str) -> Option<SimResult<SimReport>> {
    match name {
        "averaging" => Some(run_averaging_scenario().await),
        "election" => Some(run_election_scenario().await),
        "echo" => Some(run_echo_scenario().await),
        _ => None,
    }
}

/// Averaging on a ring of 6 nodes
///
/// Node 1 starts far above the others; every value drifts into the initial
/// range and the spread between nodes shrinks.
pub async fn run_averaging_scenario() -> SimResult<SimReport> {
    info!("=== Running Averaging Scenario ===");

    let config = SimConfig::default()
        .with_nodes(6)
        .with_topology(TopologyKind::Ring)
        .with_algorithm(AlgorithmKind::Averaging)
        .with_iteration_max(20)
        .with_initial_value(NodeId(1), 100.0);

    let sim = Simulation::new(config)?;
    println!("{}", sim.topology().visualize());

    let initial = spread(sim.topology().node_ids().into_iter().map(|id| {
        sim.config()
            .initial_values
            .get(&id)
            .copied()
            .unwrap_or(f64::from(id.as_u32()))
    }));

    let report = sim.run().await?;
    let last = spread(report.numeric_values(VALUE_KEY).into_values());

    println!("\n=== Averaging Results ===");
    println!("{}", report.summary());
    println!("  Initial spread: {:.3}, final spread: {:.3}", initial, last);

    Ok(report)
}

/// Leader election by max-id flooding on a full mesh of 5 nodes
pub async fn run_election_scenario() -> SimResult<SimReport> {
    info!("=== Running Election Scenario ===");

    let config = SimConfig::default()
        .with_nodes(5)
        .with_topology(TopologyKind::Full)
        .with_algorithm(AlgorithmKind::MaxFlood)
        .with_iteration_max(40);

    let sim = Simulation::new(config)?;
    println!("{}", sim.topology().visualize());

    let report = sim.run().await?;

    println!("\n=== Election Results ===");
    println!("{}", report.summary());
    for (id, leader) in report.values(LEADER_KEY) {
        println!("  node {} elected {}", id, leader);
    }

    Ok(report)
}

/// Publish-once echo on a ring of 4 nodes
///
/// Every node has two neighbors, so a bound of 3 (start + one update per
/// neighbor) is reached exactly.
pub async fn run_echo_scenario() -> SimResult<SimReport> {
    info!("=== Running Echo Scenario ===");

    let config = SimConfig::default()
        .with_nodes(4)
        .with_topology(TopologyKind::Ring)
        .with_algorithm(AlgorithmKind::Echo)
        .with_iteration_max(3);

    let sim = Simulation::new(config)?;
    println!("{}", sim.topology().visualize());

    let report = sim.run().await?;

    println!("\n=== Echo Results ===");
    println!("{}", report.summary());

    Ok(report)
}

/// Difference between the largest and smallest value
pub fn spread(values: impl IntoIterator<Item = f64>) -> f64 {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max { 0.0 } else { max - min }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::RECEIVED_KEY;

    #[test]
    fn test_spread() {
        assert_eq!(spread([3.0, 1.0, 2.5]), 2.0);
        assert_eq!(spread(Vec::<f64>::new()), 0.0);
    }

    #[tokio::test]
    async fn test_echo_scenario() {
        let report = run_echo_scenario().await.unwrap();

        assert!(report.all_completed());
        for node in &report.reports {
            assert_eq!(node.final_state.get(RECEIVED_KEY).map(String::as_str), Some("2"));
        }
        assert_eq!(report.pending.values().sum::<usize>(), 0);
    }

    #[tokio::test]
    async fn test_unknown_scenario() {
        assert!(run_scenario("partition").await.is_none());
    }
}
