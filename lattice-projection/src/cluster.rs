//! Clustering engine
//!
//! Deterministic structural partitioning of the active-role subgraph:
//! connected components by BFS, then density-guided recursive
//! bipartition with greedy vertex-moving refinement. No randomness,
//! no semantic signals, no access to anything but the state.
//!
//! Every iteration that can reach the output walks a sorted
//! projection of its input; ties break lexicographically.

use crate::department::Cluster;
use lattice_core::{checked_mul, ArithmeticError, DependencyEdge, OrgState, SCALE};
use lattice_kernel::to_ascii_json_bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Recursion cap for bipartitioning a single component.
const MAX_BIPARTITION_DEPTH: usize = 10;

/// Minimum component density before attempting a split. Below this
/// the component is already sparse and splitting gains nothing.
const MIN_DENSITY_FOR_SPLIT: i64 = SCALE / 10;

type EdgeSet<'a> = BTreeSet<(&'a str, &'a str)>;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Partition the active roles of a state into structural clusters.
///
/// The output covers every active role exactly once; edges touching
/// inactive roles are ignored. Output order is by role-id tuple.
pub fn cluster_roles(state: &OrgState) -> Result<Vec<Cluster>, ArithmeticError> {
    if state.roles.is_empty() {
        return Ok(Vec::new());
    }
    let active: Vec<&str> = state.active_role_ids();
    if active.is_empty() {
        return Ok(Vec::new());
    }
    let active_set: BTreeSet<&str> = active.iter().copied().collect();

    let adj = build_undirected_adjacency(&state.dependencies, &active_set);
    let edge_set = build_edge_set(&state.dependencies, &active_set);

    let mut clusters: Vec<Cluster> = Vec::new();
    for component in find_connected_components(&active, &adj) {
        if component.len() == 1 {
            clusters.push(make_cluster(&component, &edge_set)?);
            continue;
        }
        let density = internal_density(&component, &edge_set)?;
        if density < MIN_DENSITY_FOR_SPLIT {
            clusters.push(make_cluster(&component, &edge_set)?);
        } else {
            bipartition_recursive(&component, &edge_set, 0, &mut clusters)?;
        }
    }

    clusters.sort_by(|a, b| a.role_ids.cmp(&b.role_ids));
    Ok(clusters)
}

#[derive(Serialize)]
struct CanonicalCluster<'a> {
    id: &'a str,
    role_ids: &'a [String],
    internal_density: i64,
    external_edge_count: usize,
}

/// SHA-256 over a canonical rendering of the cluster list. Identical
/// cluster output always produces an identical hash.
pub fn canonical_cluster_hash(clusters: &[Cluster]) -> String {
    let mut ordered: Vec<&Cluster> = clusters.iter().collect();
    ordered.sort_by(|a, b| a.role_ids.cmp(&b.role_ids));
    let canonical: Vec<CanonicalCluster<'_>> = ordered
        .into_iter()
        .map(|c| CanonicalCluster {
            id: &c.id,
            role_ids: &c.role_ids,
            internal_density: c.internal_density,
            external_edge_count: c.external_edge_count,
        })
        .collect();
    let bytes = to_ascii_json_bytes(&canonical).expect("cluster list serialization is infallible");
    hex::encode(Sha256::digest(bytes))
}

// ============================================================================
// CLUSTER CONSTRUCTION
// ============================================================================

/// First 16 hex chars of the SHA-256 over the sorted role-id list.
fn make_cluster_id(role_ids: &[String]) -> String {
    let bytes = to_ascii_json_bytes(&role_ids).expect("role id list serialization is infallible");
    hex::encode(Sha256::digest(bytes))[..16].to_string()
}

fn make_cluster(members: &[&str], edge_set: &EdgeSet<'_>) -> Result<Cluster, ArithmeticError> {
    let mut role_ids: Vec<String> = members.iter().map(|s| s.to_string()).collect();
    role_ids.sort_unstable();
    let density = internal_density(members, edge_set)?;
    let member_set: BTreeSet<&str> = members.iter().copied().collect();
    let external = edge_set
        .iter()
        .filter(|(a, b)| member_set.contains(a) != member_set.contains(b))
        .count();
    Ok(Cluster {
        id: make_cluster_id(&role_ids),
        role_ids,
        internal_density: density,
        external_edge_count: external,
    })
}

// ============================================================================
// GRAPH PRIMITIVES
// ============================================================================

fn build_undirected_adjacency<'a>(
    dependencies: &'a [DependencyEdge],
    active: &BTreeSet<&'a str>,
) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
    let mut adj: BTreeMap<&str, BTreeSet<&str>> =
        active.iter().map(|&rid| (rid, BTreeSet::new())).collect();
    for edge in dependencies {
        let (from, to) = (edge.from_role_id.as_str(), edge.to_role_id.as_str());
        if active.contains(from) && active.contains(to) {
            adj.entry(from).or_default().insert(to);
            adj.entry(to).or_default().insert(from);
        }
    }
    adj
}

/// Directed edge set for O(log n) membership checks. Duplicate edges
/// collapse here; density is about connectivity, not multiplicity.
fn build_edge_set<'a>(
    dependencies: &'a [DependencyEdge],
    active: &BTreeSet<&'a str>,
) -> EdgeSet<'a> {
    dependencies
        .iter()
        .filter(|e| {
            active.contains(e.from_role_id.as_str()) && active.contains(e.to_role_id.as_str())
        })
        .map(|e| (e.from_role_id.as_str(), e.to_role_id.as_str()))
        .collect()
}

/// BFS component discovery; deterministic because the seed list and
/// every neighbour set iterate in sorted order.
fn find_connected_components<'a>(
    role_ids: &[&'a str],
    adj: &BTreeMap<&'a str, BTreeSet<&'a str>>,
) -> Vec<Vec<&'a str>> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut components: Vec<Vec<&str>> = Vec::new();

    for &rid in role_ids {
        if visited.contains(rid) {
            continue;
        }
        let mut component: Vec<&str> = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([rid]);
        visited.insert(rid);
        while let Some(node) = queue.pop_front() {
            component.push(node);
            if let Some(neighbours) = adj.get(node) {
                for &nbr in neighbours {
                    if visited.insert(nbr) {
                        queue.push_back(nbr);
                    }
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }

    components
}

// ============================================================================
// BIPARTITION
// ============================================================================

/// `edges_inside * SCALE / (n * (n - 1))`, 0 for fewer than 2 members.
fn internal_density(group: &[&str], edge_set: &EdgeSet<'_>) -> Result<i64, ArithmeticError> {
    let n = group.len() as i64;
    if n < 2 {
        return Ok(0);
    }
    let members: BTreeSet<&str> = group.iter().copied().collect();
    let internal = edge_set
        .iter()
        .filter(|(a, b)| members.contains(a) && members.contains(b))
        .count() as i64;
    Ok(checked_mul(internal, SCALE)? / (n * (n - 1)))
}

/// Score of a partition: density(A) + density(B). Favours splits
/// where both halves are internally dense; range 0..2*SCALE.
fn partition_quality(
    part_a: &[&str],
    part_b: &[&str],
    edge_set: &EdgeSet<'_>,
) -> Result<i64, ArithmeticError> {
    Ok(internal_density(part_a, edge_set)? + internal_density(part_b, edge_set)?)
}

/// Recursive bipartition of one connected component.
///
/// Seed split at the lexicographic midpoint, refine greedily, and
/// accept only when the split score strictly beats keeping the
/// component whole (2 * its density). Accepted halves recurse.
fn bipartition_recursive<'a>(
    component: &[&'a str],
    edge_set: &EdgeSet<'a>,
    depth: usize,
    out: &mut Vec<Cluster>,
) -> Result<(), ArithmeticError> {
    if component.len() <= 1 || depth >= MAX_BIPARTITION_DEPTH {
        out.push(make_cluster(component, edge_set)?);
        return Ok(());
    }

    let single_density = internal_density(component, edge_set)?;
    let single_baseline = checked_mul(single_density, 2)?;

    let mid = component.len() / 2;
    let part_a: Vec<&str> = component[..mid].to_vec();
    let part_b: Vec<&str> = component[mid..].to_vec();
    let (part_a, part_b) = greedy_refine(part_a, part_b, edge_set)?;

    if part_a.is_empty() || part_b.is_empty() {
        out.push(make_cluster(component, edge_set)?);
        return Ok(());
    }

    let split_quality = partition_quality(&part_a, &part_b, edge_set)?;
    if split_quality <= single_baseline {
        out.push(make_cluster(component, edge_set)?);
        return Ok(());
    }

    bipartition_recursive(&part_a, edge_set, depth + 1, out)?;
    bipartition_recursive(&part_b, edge_set, depth + 1, out)
}

/// Greedy vertex-moving refinement: in sorted order, try moving one
/// vertex to the other side; accept the first move that strictly
/// improves the score and restart the pass. Stops when no improving
/// move exists.
fn greedy_refine<'a>(
    mut part_a: Vec<&'a str>,
    mut part_b: Vec<&'a str>,
    edge_set: &EdgeSet<'a>,
) -> Result<(Vec<&'a str>, Vec<&'a str>), ArithmeticError> {
    let mut improved = true;
    while improved {
        improved = false;
        let current_score = partition_quality(&part_a, &part_b, edge_set)?;

        let mut candidates_a = part_a.clone();
        candidates_a.sort_unstable();
        for rid in candidates_a {
            if part_a.len() <= 1 {
                break;
            }
            let new_a: Vec<&str> = part_a.iter().copied().filter(|&r| r != rid).collect();
            let mut new_b = part_b.clone();
            new_b.push(rid);
            new_b.sort_unstable();
            if partition_quality(&new_a, &new_b, edge_set)? > current_score {
                part_a = new_a;
                part_b = new_b;
                improved = true;
                break;
            }
        }
        if improved {
            continue;
        }

        let mut candidates_b = part_b.clone();
        candidates_b.sort_unstable();
        for rid in candidates_b {
            if part_b.len() <= 1 {
                break;
            }
            let new_b: Vec<&str> = part_b.iter().copied().filter(|&r| r != rid).collect();
            let mut new_a = part_a.clone();
            new_a.push(rid);
            new_a.sort_unstable();
            if partition_quality(&new_a, &new_b, edge_set)? > current_score {
                part_a = new_a;
                part_b = new_b;
                improved = true;
                break;
            }
        }
    }

    part_a.sort_unstable();
    part_b.sort_unstable();
    Ok((part_a, part_b))
}

// ============================================================================
// TESTS
// ============================================================================
