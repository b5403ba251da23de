//! # Meshlab Simulation
//!
//! Bootstraps networks of [`meshlab_core::Node`] actors and runs them to
//! completion.
//!
//! ## Overview
//!
//! A run is described by a [`SimConfig`]: node count, topology shape,
//! algorithm, iteration bound and codec. [`Simulation`] turns it into one
//! tokio task per node sharing a single mailbox service, kicks every node
//! with a `Start` message, and waits for all of them to report.
//!
//! ## Architecture
//!
//! - **Topology** (`topology.rs`): Network construction (ring, full, line, star, random)
//! - **Config** (`config.rs`): Run configuration, loadable from JSON
//! - **Algorithms** (`algorithms/`): Example algorithm variants
//! - **Runner** (`runner.rs`): Node bootstrap and completion collection
//! - **Scenarios** (`scenarios.rs`): Pre-built runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use meshlab_simulation::*;
//!
//! let config = SimConfig::default()
//!     .with_nodes(5)
//!     .with_topology(TopologyKind::Full)
//!     .with_algorithm(AlgorithmKind::MaxFlood)
//!     .with_iteration_max(40);
//!
//! let report = Simulation::new(config)?.run().await?;
//! println!("{}", report.summary());
//! ```

pub mod algorithms;
pub mod config;
pub mod error;
pub mod runner;
pub mod scenarios;
pub mod topology;

pub use algorithms::AlgorithmKind;
pub use config::{CodecKind, SimConfig};
pub use error::{SimError, SimResult};
pub use runner::{SimReport, Simulation};
pub use topology::{Topology, TopologyBuilder, TopologyKind, from_edges};
