//! Boundary metrics
//!
//! Pure functions collapsing role-level edges into department-level
//! measurements. All heat values are int64 fixed-point in 0..SCALE.

use crate::department::Department;
use lattice_core::{checked_mul, ArithmeticError, DependencyEdge, SCALE};
use std::collections::{BTreeMap, BTreeSet};

/// Per-department boundary heat:
/// `(edges crossing the boundary) * SCALE / (edges touching the
/// department)`, 0 when the department touches no edges.
///
/// 0 means a closed cluster; SCALE means fully externally dependent.
pub fn compute_boundary_heat(
    departments: &[Department],
    role_to_dept: &BTreeMap<String, String>,
    dependencies: &[DependencyEdge],
) -> Result<BTreeMap<String, i64>, ArithmeticError> {
    let mut external: BTreeMap<&str, i64> = BTreeMap::new();
    let mut total: BTreeMap<&str, i64> = BTreeMap::new();
    for d in departments {
        external.insert(&d.id, 0);
        total.insert(&d.id, 0);
    }

    for edge in dependencies {
        let (Some(dept_from), Some(dept_to)) = (
            role_to_dept.get(&edge.from_role_id),
            role_to_dept.get(&edge.to_role_id),
        ) else {
            continue;
        };
        if dept_from == dept_to {
            // an internal edge is incident on its department once
            *total.entry(dept_from).or_insert(0) += 1;
        } else {
            *total.entry(dept_from).or_insert(0) += 1;
            *total.entry(dept_to).or_insert(0) += 1;
            *external.entry(dept_from).or_insert(0) += 1;
            *external.entry(dept_to).or_insert(0) += 1;
        }
    }

    let mut heat: BTreeMap<String, i64> = BTreeMap::new();
    for d in departments {
        let touching = total.get(d.id.as_str()).copied().unwrap_or(0);
        let value = if touching == 0 {
            0
        } else {
            checked_mul(external.get(d.id.as_str()).copied().unwrap_or(0), SCALE)? / touching
        };
        heat.insert(d.id.clone(), value);
    }
    Ok(heat)
}

/// Collapse role-level edges into the sorted, de-duplicated set of
/// ordered `(dept_from, dept_to)` pairs with distinct endpoints.
pub fn compute_inter_department_edges(
    role_to_dept: &BTreeMap<String, String>,
    dependencies: &[DependencyEdge],
) -> Vec<(String, String)> {
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    for edge in dependencies {
        let (Some(dept_from), Some(dept_to)) = (
            role_to_dept.get(&edge.from_role_id),
            role_to_dept.get(&edge.to_role_id),
        ) else {
            continue;
        };
        if dept_from != dept_to {
            seen.insert((dept_from.clone(), dept_to.clone()));
        }
    }
    seen.into_iter().collect()
}

// ============================================================================
// TESTS
// ============================================================================
