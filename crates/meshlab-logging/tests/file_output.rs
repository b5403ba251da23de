//! JSONL file output through the global subscriber
//!
//! Lives in its own test binary: a global subscriber can only be set once
//! per process.

use meshlab_core::NodeId;
use meshlab_logging::{FileConfig, LogConfig, MeshlabSubscriberBuilder, fields};

#[test]
fn test_jsonl_lines_reach_the_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = LogConfig::recording(dir.path());
    config.file = Some(FileConfig::single_file(dir.path(), "sim"));

    let guard = MeshlabSubscriberBuilder::new()
        .with_config(config)
        .try_init()
        .unwrap();
    assert!(guard.is_some());

    {
        let span = meshlab_logging::bootstrap_span(NodeId(7));
        let _entered = span.enter();
        tracing::warn!(iteration = 3, "node bootstrapped");
    }

    // A second global init must fail instead of panicking.
    assert!(MeshlabSubscriberBuilder::new().try_init().is_err());

    // Dropping the guard flushes the non-blocking writer.
    drop(guard);

    let contents = std::fs::read_to_string(dir.path().join("sim.log")).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("node bootstrapped"))
        .expect("log line written");

    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(value["iteration"], 3);
    assert_eq!(value["span"][fields::NODE_ID], "7");
}
