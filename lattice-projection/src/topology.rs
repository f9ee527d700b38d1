//! Topology fingerprint
//!
//! A three-field summary of graph shape used to gate cluster
//! recomputation. Pure constraint-vector changes leave the
//! fingerprint untouched and therefore never trigger a recompute.

use lattice_core::{ArithmeticError, OrgState, SCALE};
use lattice_kernel::compute_structural_density;
use serde::{Deserialize, Serialize};

/// Snapshot of topology-relevant metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyFingerprint {
    pub role_count: i64,
    pub dependency_count: i64,
    /// Fixed-point (real * SCALE).
    pub density: i64,
}

/// Deltas that trigger cluster recomputation. Any single breach is
/// enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeThresholds {
    pub role_count_delta: i64,
    pub dependency_count_delta: i64,
    pub density_delta: i64,
}

impl Default for RecomputeThresholds {
    fn default() -> Self {
        Self {
            role_count_delta: 1,
            dependency_count_delta: 1,
            density_delta: SCALE / 20,
        }
    }
}

/// Extract the fingerprint of a state.
pub fn compute_fingerprint(state: &OrgState) -> Result<TopologyFingerprint, ArithmeticError> {
    Ok(TopologyFingerprint {
        role_count: state.roles.len() as i64,
        dependency_count: state.dependencies.len() as i64,
        density: compute_structural_density(state)?,
    })
}

/// Whether clustering must be recomputed: true with no previous
/// fingerprint, or when any component delta meets its threshold.
pub fn should_recompute(
    prev: Option<&TopologyFingerprint>,
    curr: &TopologyFingerprint,
    thresholds: &RecomputeThresholds,
) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    (curr.role_count - prev.role_count).abs() >= thresholds.role_count_delta
        || (curr.dependency_count - prev.dependency_count).abs()
            >= thresholds.dependency_count_delta
        || (curr.density - prev.density).abs() >= thresholds.density_delta
}

// ============================================================================
// TESTS
// ============================================================================
