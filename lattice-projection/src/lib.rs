//! Lattice Projection - Structural Department Views
//!
//! Read-only derivations over kernel state: deterministic clustering
//! of the active-role subgraph, department projection with boundary
//! metrics, and a topology-fingerprint-gated caching service.
//!
//! Nothing in this crate writes back to kernel state, and no semantic
//! signal ever influences clustering - labelling is strictly post-hoc.

mod cluster;
mod department;
mod metrics;
mod service;
mod topology;

pub use cluster::*;
pub use department::*;
pub use metrics::*;
pub use service::*;
pub use topology::*;
