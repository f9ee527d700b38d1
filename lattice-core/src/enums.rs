//! Enum types for Lattice entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Lifecycle stage of a role or of the organization as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStage {
    #[default]
    Seed,
    Growth,
    Structured,
    Mature,
}

impl ScaleStage {
    /// Stable string form used in wire payloads and canonical output.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScaleStage::Seed => "seed",
            ScaleStage::Growth => "growth",
            ScaleStage::Structured => "structured",
            ScaleStage::Mature => "mature",
        }
    }
}

impl fmt::Display for ScaleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seed" => Ok(ScaleStage::Seed),
            "growth" => Ok(ScaleStage::Growth),
            "structured" => Ok(ScaleStage::Structured),
            "mature" => Ok(ScaleStage::Mature),
            other => Err(format!("unknown scale_stage: {other:?}")),
        }
    }
}

/// Kind of a dependency edge between two roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    #[default]
    Operational,
    Informational,
    Governance,
}

impl DependencyType {
    /// Stable string form. Canonical dependency ordering sorts on this,
    /// not on the enum discriminant.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Operational => "operational",
            DependencyType::Informational => "informational",
            DependencyType::Governance => "governance",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operational" => Ok(DependencyType::Operational),
            "informational" => Ok(DependencyType::Informational),
            "governance" => Ok(DependencyType::Governance),
            other => Err(format!("unknown dependency_type: {other:?}")),
        }
    }
}

/// Rule code for one of the seven organizational invariants.
///
/// The battery runs in a fixed order because later checks assume
/// earlier ones passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantRule {
    RoleIdFormat,
    DependencyRefs,
    OrphanedOutput,
    DuplicateRoleIds,
    NoActiveRoles,
    EmptyResponsibilities,
    CriticalCycle,
}

impl InvariantRule {
    /// Stable snake_case rule code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvariantRule::RoleIdFormat => "role_id_format",
            InvariantRule::DependencyRefs => "dependency_refs",
            InvariantRule::OrphanedOutput => "orphaned_output",
            InvariantRule::DuplicateRoleIds => "duplicate_role_ids",
            InvariantRule::NoActiveRoles => "no_active_roles",
            InvariantRule::EmptyResponsibilities => "empty_responsibilities",
            InvariantRule::CriticalCycle => "critical_cycle",
        }
    }
}

impl fmt::Display for InvariantRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================
