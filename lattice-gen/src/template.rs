//! Blueprint and spec types
//!
//! An `IndustryTemplate` is the realistic shape of an organization -
//! departments, role titles, natural dependency patterns. The data
//! tables themselves live outside this crate; only the types and the
//! compiler contract are defined here. All density values are int64
//! fixed-point in `[0, SCALE]`.

use lattice_core::DependencyType;
use serde::{Deserialize, Serialize};

/// One role in a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBlueprint {
    pub id: String,
    pub name: String,
    pub purpose: String,
    pub responsibilities: Vec<String>,
    pub produced_outputs: Vec<String>,
    pub required_inputs: Vec<String>,
}

/// A department with its roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeptBlueprint {
    pub name: String,
    pub roles: Vec<RoleBlueprint>,
}

/// A natural dependency between two blueprint roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyBlueprint {
    pub from_role: String,
    pub to_role: String,
    pub dep_type: DependencyType,
    pub critical: bool,
}

/// Complete blueprint for one industry x stage combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryTemplate {
    pub industry: String,
    pub stage: String,
    pub departments: Vec<DeptBlueprint>,
    pub dependencies: Vec<DependencyBlueprint>,
}

/// Capacity profile the compiler steers the constraint vector toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapacityProfile {
    Low,
    #[default]
    Balanced,
    High,
}

/// Numeric generation parameters.
///
/// `role_count`, `domain_count`, `inter_density_target`, `drift_mode`
/// and `differentiation_pressure` are reserved: parsed and carried
/// for round-tripping, but the compiler derives every count from the
/// template and emits nothing for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub role_count: usize,
    pub domain_count: usize,
    /// Fixed-point (0..SCALE).
    pub intra_density_target: i64,
    /// Fixed-point (0..SCALE). Reserved.
    pub inter_density_target: i64,
    pub capacity_profile: CapacityProfile,
    pub fragility_mode: bool,
    /// Reserved.
    pub drift_mode: bool,
    pub shock_magnitude: i64,
    /// Reserved.
    pub differentiation_pressure: i64,
}

impl Default for TemplateSpec {
    fn default() -> Self {
        Self {
            role_count: 0,
            domain_count: 0,
            intra_density_target: 0,
            inter_density_target: 0,
            capacity_profile: CapacityProfile::Balanced,
            fragility_mode: false,
            drift_mode: false,
            shock_magnitude: 0,
            differentiation_pressure: 0,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
