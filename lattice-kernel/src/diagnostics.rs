//! Diagnostics
//!
//! A pure, idempotent health summary derived from state. Nothing here
//! writes back; the warning list is advisory text for operators, not
//! part of any hash.

use crate::graph::{compute_structural_density, find_isolated_roles};
use lattice_core::{ArithmeticError, DependencyType, OrgState, SCALE};
use serde::Serialize;

/// Density above which the organization is flagged as fragile.
const HIGH_DENSITY_WARNING: i64 = 7 * SCALE / 10;

/// Structural debt above which accumulation is flagged.
const DEBT_WARNING: i64 = 5;

/// Health summary of one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub role_count: usize,
    pub active_role_count: usize,
    /// Fixed-point scaled (real * SCALE).
    pub structural_density: i64,
    pub structural_debt: i64,
    pub isolated_roles: Vec<String>,
    pub governance_edges: usize,
    pub warnings: Vec<String>,
}

/// Compute the diagnostic summary for a state.
pub fn compute_diagnostics(state: &OrgState) -> Result<Diagnostics, ArithmeticError> {
    let density = compute_structural_density(state)?;
    let isolated: Vec<String> = find_isolated_roles(state)
        .into_iter()
        .map(str::to_string)
        .collect();
    let governance_edges = state
        .dependencies
        .iter()
        .filter(|d| d.dependency_type == DependencyType::Governance)
        .count();

    let mut warnings: Vec<String> = Vec::new();
    if density > HIGH_DENSITY_WARNING {
        warnings.push(format!(
            "high structural density ({density}): fragile interdependence"
        ));
    }
    if state.structural_debt > DEBT_WARNING {
        warnings.push(format!(
            "structural debt={}: organization accumulating suppressed adaptation",
            state.structural_debt
        ));
    }
    if !isolated.is_empty() {
        warnings.push(format!(
            "{} isolated role(s): {}",
            isolated.len(),
            isolated.join(", ")
        ));
    }
    let inactive: Vec<&str> = state
        .roles
        .values()
        .filter(|r| !r.active)
        .map(|r| r.id.as_str())
        .collect();
    if !inactive.is_empty() {
        warnings.push(format!(
            "{} inactive role(s): {}",
            inactive.len(),
            inactive.join(", ")
        ));
    }

    Ok(Diagnostics {
        role_count: state.roles.len(),
        active_role_count: state.active_role_count(),
        structural_density: density,
        structural_debt: state.structural_debt,
        isolated_roles: isolated,
        governance_edges,
        warnings,
    })
}

// ============================================================================
// TESTS
// ============================================================================
