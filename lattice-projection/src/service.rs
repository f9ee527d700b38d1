//! Projection service
//!
//! Stateful, caching front-end over the clustering engine. The
//! topology fingerprint decides whether clusters are recomputed;
//! assembled views are additionally cached per event version. The
//! service never modifies kernel state.

use crate::cluster::{canonical_cluster_hash, cluster_roles};
use crate::department::{Cluster, Department, DepartmentView};
use crate::metrics::{compute_boundary_heat, compute_inter_department_edges};
use crate::topology::{compute_fingerprint, should_recompute, RecomputeThresholds, TopologyFingerprint};
use lattice_core::{OrgState, ProjectionError};
use std::collections::BTreeMap;
use tracing::debug;

/// Builds and caches `DepartmentView` projections.
#[derive(Debug, Default)]
pub struct ProjectionService {
    thresholds: RecomputeThresholds,
    prev_fingerprint: Option<TopologyFingerprint>,
    cached_clusters: Option<Vec<Cluster>>,
    cached_cluster_hash: String,
    views: BTreeMap<usize, DepartmentView>,
}

impl ProjectionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: RecomputeThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    /// Build (or fetch from cache) the department view of a state.
    ///
    /// Refuses to emit a view where any active role is unassigned or
    /// any department is empty.
    pub fn build(&mut self, state: &OrgState) -> Result<DepartmentView, ProjectionError> {
        let version = state.event_history.len();
        if let Some(view) = self.views.get(&version) {
            debug!(version, "projection view cache hit");
            return Ok(view.clone());
        }

        let fingerprint = compute_fingerprint(state)?;
        let (clusters, cluster_hash) = if should_recompute(
            self.prev_fingerprint.as_ref(),
            &fingerprint,
            &self.thresholds,
        ) {
            debug!(version, ?fingerprint, "recomputing clusters");
            let clusters = cluster_roles(state)?;
            let cluster_hash = canonical_cluster_hash(&clusters);
            self.cached_clusters = Some(clusters.clone());
            self.cached_cluster_hash = cluster_hash.clone();
            self.prev_fingerprint = Some(fingerprint);
            (clusters, cluster_hash)
        } else {
            debug!(version, "topology unchanged, reusing clusters");
            match &self.cached_clusters {
                Some(clusters) => (clusters.clone(), self.cached_cluster_hash.clone()),
                None => {
                    let clusters = cluster_roles(state)?;
                    let cluster_hash = canonical_cluster_hash(&clusters);
                    (clusters, cluster_hash)
                }
            }
        };

        let view = build_view(state, clusters, cluster_hash, version)?;
        self.views.insert(version, view.clone());
        Ok(view)
    }
}

/// Assemble a department view from a cluster partition.
fn build_view(
    state: &OrgState,
    clusters: Vec<Cluster>,
    cluster_hash: String,
    version: usize,
) -> Result<DepartmentView, ProjectionError> {
    if state.roles.is_empty() {
        return Ok(DepartmentView {
            version,
            departments: Vec::new(),
            clusters: Vec::new(),
            role_to_department: BTreeMap::new(),
            role_to_cluster: BTreeMap::new(),
            inter_department_edges: Vec::new(),
            boundary_heat: BTreeMap::new(),
            cluster_hash: String::new(),
        });
    }

    let mut departments: Vec<Department> = Vec::with_capacity(clusters.len());
    let mut role_to_department: BTreeMap<String, String> = BTreeMap::new();
    let mut role_to_cluster: BTreeMap<String, String> = BTreeMap::new();

    for (idx, cluster) in clusters.iter().enumerate() {
        let dept_id = format!("dept_{idx}");
        // clusters cover active roles only, so the anchor role exists
        let scale_stage = state
            .roles
            .get(&cluster.role_ids[0])
            .map(|r| r.scale_stage)
            .unwrap_or(state.scale_stage);

        departments.push(Department {
            id: dept_id.clone(),
            role_ids: cluster.role_ids.clone(),
            internal_density: cluster.internal_density,
            external_dependencies: cluster.external_edge_count,
            scale_stage,
            semantic_label: "Unclassified".to_string(),
            label_confidence: 0,
        });

        for rid in &cluster.role_ids {
            role_to_department.insert(rid.clone(), dept_id.clone());
            role_to_cluster.insert(rid.clone(), cluster.id.clone());
        }
    }

    let inter_department_edges =
        compute_inter_department_edges(&role_to_department, &state.dependencies);
    let boundary_heat =
        compute_boundary_heat(&departments, &role_to_department, &state.dependencies)?;

    let view = DepartmentView {
        version,
        departments,
        clusters,
        role_to_department,
        role_to_cluster,
        inter_department_edges,
        boundary_heat,
        cluster_hash,
    };

    validate_view(&view, state)?;
    Ok(view)
}

/// Integrity checks on an assembled view.
fn validate_view(view: &DepartmentView, state: &OrgState) -> Result<(), ProjectionError> {
    let unassigned: Vec<String> = state
        .roles
        .values()
        .filter(|r| r.active && !view.role_to_department.contains_key(&r.id))
        .map(|r| r.id.clone())
        .collect();
    if !unassigned.is_empty() {
        return Err(ProjectionError::UnassignedRoles { unassigned });
    }

    for dept in &view.departments {
        if dept.role_ids.is_empty() {
            return Err(ProjectionError::EmptyDepartment {
                department_id: dept.id.clone(),
            });
        }
    }

    for (from, to) in &view.inter_department_edges {
        let known = |id: &str| view.departments.iter().any(|d| d.id == id);
        if !known(from) || !known(to) {
            return Err(ProjectionError::InvalidInterDepartmentEdge {
                from: from.clone(),
                to: to.clone(),
            });
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::{DependencyEdge, DependencyType, Role, ScaleStage};
    use serde_json::json;

    fn role(id: &str, active: bool) -> Role {
        Role {
            id: id.to_string(),
            name: id.to_string(),
            purpose: String::new(),
            responsibilities: vec!["work".to_string()],
            required_inputs: vec![],
            produced_outputs: vec![],
            scale_stage: ScaleStage::Growth,
            active,
        }
    }

    fn edge(from: &str, to: &str) -> DependencyEdge {
        DependencyEdge {
            from_role_id: from.to_string(),
            to_role_id: to.to_string(),
            dependency_type: DependencyType::Operational,
            critical: false,
        }
    }

    fn sample_state() -> OrgState {
        let mut state = OrgState::default();
        for id in ["a", "b", "c"] {
            state.roles.insert(id.to_string(), role(id, true));
        }
        state.dependencies = vec![edge("a", "b")];
        state
    }

    #[test]
    fn test_empty_state_view() {
        let mut service = ProjectionService::new();
        let view = service.build(&OrgState::default()).expect("build");
        assert!(view.departments.is_empty());
        assert_eq!(view.cluster_hash, "");
    }

    #[test]
    fn test_departments_cover_active_roles() {
        let mut service = ProjectionService::new();
        let view = service.build(&sample_state()).expect("build");
        assert_eq!(view.role_to_department.len(), 3);
        assert!(view.departments.iter().all(|d| !d.role_ids.is_empty()));
        // department ids follow the clusters' sorted order
        assert_eq!(view.departments[0].id, "dept_0");
        assert_eq!(view.departments[0].semantic_label, "Unclassified");
        assert_eq!(view.departments[0].scale_stage, ScaleStage::Growth);
    }

    #[test]
    fn test_view_cached_per_version() {
        let mut service = ProjectionService::new();
        let state = sample_state();
        let first = service.build(&state).expect("first");
        let second = service.build(&state).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn test_constraint_only_change_reuses_clusters() {
        let mut service = ProjectionService::new();
        let mut state = sample_state();
        let first = service.build(&state).expect("first");

        // a constraint change advances the version but not the topology
        state.constraint_vector.capital += 10_000;
        state.event_history.push(json!({"event_type": "apply_constraint_change"}));
        let second = service.build(&state).expect("second");

        assert_eq!(first.cluster_hash, second.cluster_hash);
        assert_eq!(first.clusters, second.clusters);
        assert_eq!(second.version, 1);
    }

    #[test]
    fn test_topology_change_recomputes() {
        let mut service = ProjectionService::new();
        let mut state = sample_state();
        let first = service.build(&state).expect("first");

        state.roles.insert("d".to_string(), role("d", true));
        state.event_history.push(json!({"event_type": "add_role"}));
        let second = service.build(&state).expect("second");

        assert_ne!(first.cluster_hash, second.cluster_hash);
        assert_eq!(second.role_to_department.len(), 4);
    }

    #[test]
    fn test_inactive_roles_not_assigned() {
        let mut service = ProjectionService::new();
        let mut state = sample_state();
        if let Some(r) = state.roles.get_mut("c") {
            r.active = false;
        }
        let view = service.build(&state).expect("build");
        assert!(!view.role_to_department.contains_key("c"));
        assert_eq!(view.role_to_department.len(), 2);
    }
}
