//! Department projection types
//!
//! `Cluster` is purely structural - the output of graph-based
//! partitioning, with no semantic fields. `Department` is the
//! enriched view after (optional, out-of-band) labelling. All density
//! values are int64 fixed-point (real * SCALE).

use lattice_core::ScaleStage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pure structural cluster.
///
/// `id` is the first 16 hex chars of the SHA-256 over the sorted
/// role-id list, so identical memberships always share an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    /// Sorted role ids.
    pub role_ids: Vec<String>,
    /// Intra-cluster edge density, fixed-point scaled.
    pub internal_density: i64,
    /// Directed edges crossing the cluster boundary.
    pub external_edge_count: usize,
}

/// A cluster enriched into a department view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// `dept_<n>` in the clusters' sorted order.
    pub id: String,
    pub role_ids: Vec<String>,
    /// Fixed-point scaled.
    pub internal_density: i64,
    pub external_dependencies: usize,
    pub scale_stage: ScaleStage,
    /// "Unclassified" when no classifier is attached.
    pub semantic_label: String,
    /// Fixed-point agreement ratio, 0 without a classifier.
    pub label_confidence: i64,
}

/// Complete department projection of one state version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentView {
    /// Event-history length of the projected state.
    pub version: usize,
    pub departments: Vec<Department>,
    pub clusters: Vec<Cluster>,
    pub role_to_department: BTreeMap<String, String>,
    pub role_to_cluster: BTreeMap<String, String>,
    /// Sorted unique `(dept_from, dept_to)` pairs with distinct ends.
    pub inter_department_edges: Vec<(String, String)>,
    /// Fixed-point scaled boundary pressure per department id.
    pub boundary_heat: BTreeMap<String, i64>,
    /// Canonical SHA-256 of the cluster output, empty for the empty view.
    pub cluster_hash: String,
}
