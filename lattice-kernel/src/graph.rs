//! Graph utilities
//!
//! Pure functions over `(roles, dependencies)`. All density values
//! are int64 fixed-point (real * SCALE). Every iteration that feeds
//! deterministic output walks a sorted projection of the input.

use lattice_core::{ArithmeticError, DependencyEdge, OrgState, checked_mul, SCALE};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// ADJACENCY
// ============================================================================

/// Forward adjacency map: from_role -> [to_roles].
///
/// Insertion order of a role's out-edges is preserved.
pub fn build_adjacency_map(dependencies: &[DependencyEdge]) -> BTreeMap<&str, Vec<&str>> {
    let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for edge in dependencies {
        adj.entry(edge.from_role_id.as_str())
            .or_default()
            .push(edge.to_role_id.as_str());
    }
    adj
}

// ============================================================================
// STRUCTURAL DENSITY
// ============================================================================

/// Global structural density: `edges * SCALE / (n * (n - 1))` for a
/// directed graph with n >= 2 roles, otherwise 0.
pub fn compute_structural_density(state: &OrgState) -> Result<i64, ArithmeticError> {
    let n = state.roles.len() as i64;
    if n < 2 {
        return Ok(0);
    }
    let max_edges = n * (n - 1);
    Ok(checked_mul(state.dependencies.len() as i64, SCALE)? / max_edges)
}

/// Local structural density of a single role: the fraction of edges
/// incident on it, scaled by SCALE. 0 when the graph has no edges.
pub fn compute_role_structural_density(
    role_id: &str,
    state: &OrgState,
) -> Result<i64, ArithmeticError> {
    let total = state.dependencies.len() as i64;
    if total == 0 {
        return Ok(0);
    }
    let incident = state
        .dependencies
        .iter()
        .filter(|d| d.from_role_id == role_id || d.to_role_id == role_id)
        .count() as i64;
    Ok(checked_mul(incident, SCALE)? / total)
}

// ============================================================================
// ISOLATION + DEGREES
// ============================================================================

/// Role ids with zero incoming AND zero outgoing edges, sorted.
pub fn find_isolated_roles(state: &OrgState) -> Vec<&str> {
    let mut connected: BTreeSet<&str> = BTreeSet::new();
    for edge in &state.dependencies {
        connected.insert(edge.from_role_id.as_str());
        connected.insert(edge.to_role_id.as_str());
    }
    state
        .roles
        .keys()
        .map(String::as_str)
        .filter(|rid| !connected.contains(rid))
        .collect()
}

/// Number of edges pointing at a role.
pub fn count_incoming(role_id: &str, dependencies: &[DependencyEdge]) -> usize {
    dependencies.iter().filter(|d| d.to_role_id == role_id).count()
}

/// Number of edges leaving a role.
pub fn count_outgoing(role_id: &str, dependencies: &[DependencyEdge]) -> usize {
    dependencies.iter().filter(|d| d.from_role_id == role_id).count()
}

// ============================================================================
// CRITICAL-CYCLE DETECTION
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Detect cycles composed entirely of `critical = true` edges.
///
/// Iterative three-colour DFS with an explicit stack, visiting role
/// ids in sorted order at every branching point. Each returned cycle
/// is a witness list of role ids; the presence of any witness fails
/// invariant 6.
pub fn detect_critical_cycles(state: &OrgState) -> Vec<Vec<String>> {
    let mut critical_adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for edge in &state.dependencies {
        if edge.critical {
            critical_adj
                .entry(edge.from_role_id.as_str())
                .or_default()
                .push(edge.to_role_id.as_str());
        }
    }
    for neighbours in critical_adj.values_mut() {
        neighbours.sort_unstable();
    }

    let mut colour: BTreeMap<&str, Colour> = state
        .roles
        .keys()
        .map(|rid| (rid.as_str(), Colour::White))
        .collect();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    let role_ids: Vec<&str> = state.roles.keys().map(String::as_str).collect();
    for &start in &role_ids {
        if colour.get(start) != Some(&Colour::White) {
            continue;
        }
        colour.insert(start, Colour::Grey);
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];

        while let Some(&(node, idx)) = stack.last() {
            let next = critical_adj.get(node).and_then(|ns| ns.get(idx)).copied();
            if let Some(nbr) = next {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                match colour.get(nbr).copied().unwrap_or(Colour::White) {
                    Colour::Grey => {
                        // Back edge into the active path: cycle witness.
                        let mut cycle = vec![nbr.to_string()];
                        for &(sn, _) in stack.iter().rev() {
                            cycle.push(sn.to_string());
                            if sn == nbr {
                                break;
                            }
                        }
                        cycles.push(cycle);
                    }
                    Colour::White => {
                        colour.insert(nbr, Colour::Grey);
                        stack.push((nbr, 0));
                    }
                    Colour::Black => {}
                }
            } else {
                colour.insert(node, Colour::Black);
                stack.pop();
            }
        }
    }

    cycles
}

// ============================================================================
// TESTS
// ============================================================================
