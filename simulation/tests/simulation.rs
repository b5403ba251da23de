//! End-to-end runs of the bootstrap with the example algorithms

use std::io::Write;

use meshlab_core::{IterationPolicy, NodeId, NodeOutcome};
use meshlab_simulation::algorithms::{LEADER_KEY, RECEIVED_KEY, VALUE_KEY};
use meshlab_simulation::scenarios::{run_averaging_scenario, run_election_scenario, spread};
use meshlab_simulation::*;

#[tokio::test]
async fn test_max_flood_full_mesh_agrees_on_largest_id() {
    let config = SimConfig::default()
        .with_nodes(4)
        .with_topology(TopologyKind::Full)
        .with_algorithm(AlgorithmKind::MaxFlood)
        .with_iteration_max(40);

    let report = Simulation::new(config).unwrap().run().await.unwrap();

    assert!(report.all_completed());
    for (_, leader) in report.values(LEADER_KEY) {
        assert_eq!(leader, "4");
    }
}

#[tokio::test]
async fn test_averaging_stays_within_initial_range() {
    let config = SimConfig::default()
        .with_nodes(5)
        .with_topology(TopologyKind::Line)
        .with_iteration_max(15);

    let report = Simulation::new(config).unwrap().run().await.unwrap();

    assert!(report.all_completed());
    let values = report.numeric_values(VALUE_KEY);
    assert_eq!(values.len(), 5);
    for value in values.values() {
        assert!(*value > 1.0 && *value < 5.0, "value {} escaped (1, 5)", value);
    }
    assert!(spread(values.into_values()) < 4.0);
}

#[tokio::test]
async fn test_every_node_processes_exactly_its_bound() {
    let config = SimConfig::default()
        .with_nodes(6)
        .with_topology(TopologyKind::Ring)
        .with_iteration_max(10)
        .with_codec(CodecKind::Json);

    let report = Simulation::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.reports.len(), 6);
    assert_eq!(report.completion_order.len(), 6);
    for node in &report.reports {
        assert_eq!(node.outcome, NodeOutcome::Completed);
        assert_eq!(node.messages_processed, 10);
        assert_eq!(node.iteration, 11);
    }
    // One start per node, then two sends per processed message
    assert_eq!(report.mailbox.delivered, 6 + 6 * 10 * 2);
    assert_eq!(report.mailbox.retrieved, 60);
}

#[tokio::test]
async fn test_echo_on_star_with_explicit_topology() {
    // Leaves have one neighbor; the hub has three
    let topology = from_edges(&[(1, 2), (1, 3), (1, 4)]);
    let config = SimConfig::default()
        .with_algorithm(AlgorithmKind::Echo)
        .with_iteration_max(2);

    let report = Simulation::with_topology(config, topology)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.all_completed());
    for leaf in [2, 3, 4] {
        let node = report.report(NodeId(leaf)).unwrap();
        assert_eq!(node.final_state.get(RECEIVED_KEY).map(String::as_str), Some("1"));
    }
    // The hub stopped after one update; two stay queued
    assert_eq!(report.pending.get(&NodeId(1)), Some(&2));
}

#[tokio::test]
async fn test_manual_policy_without_advancing_times_out() {
    let mut config = SimConfig::default()
        .with_algorithm(AlgorithmKind::Echo)
        .with_timeout_secs(Some(1));
    config.iteration_policy = IterationPolicy::Manual;

    let result = Simulation::new(config).unwrap().run().await;
    assert!(matches!(result, Err(SimError::Timeout(1))));
}

#[tokio::test]
async fn test_run_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "nodes": 3,
            "topology": "full",
            "algorithm": "averaging",
            "iteration_max": 5,
            "codec": "json",
            "initial_values": {{"1": 30.0, "2": 0.0, "3": 0.0}}
        }}"#
    )
    .unwrap();

    let config = SimConfig::from_file(file.path()).unwrap();
    let report = Simulation::new(config).unwrap().run().await.unwrap();

    assert!(report.all_completed());
    for value in report.numeric_values(VALUE_KEY).values() {
        assert!(*value > 0.0 && *value < 30.0);
    }
}

#[tokio::test]
async fn test_scenarios_complete() {
    let report = run_election_scenario().await.unwrap();
    assert!(report.all_completed());
    assert!(report.values(LEADER_KEY).values().all(|leader| leader == "5"));

    let report = run_averaging_scenario().await.unwrap();
    assert!(report.all_completed());
    assert!(spread(report.numeric_values(VALUE_KEY).into_values()) < 98.0);
}
