//! Standard span and field names
//!
//! Node tasks log inside a `node` span carrying `node_id`; the simulation
//! runner wraps a whole run in a `simulation` span. Keeping the names here
//! lets log consumers filter JSONL output on stable keys.

use meshlab_core::NodeId;
use tracing::{Span, info_span};

/// Standard field names for structured logging
pub mod fields {
    pub const NODE_ID: &str = "node_id";
}

/// Standard span names
pub mod names {
    pub const SIMULATION: &str = "simulation";
    pub const BOOTSTRAP: &str = "bootstrap";
}

/// Span wrapping a complete simulation run
pub fn simulation_span(algorithm: &str, nodes: usize, edges: usize) -> Span {
    info_span!("simulation", algorithm = algorithm, nodes = nodes, edges = edges)
}

/// Span wrapping the bootstrap of a single node
pub fn bootstrap_span(id: NodeId) -> Span {
    info_span!("bootstrap", node_id = %id)
}
