//! Core entity structures
//!
//! The complete organizational state and the records it is built
//! from. All numeric values are int64 fixed-point (real * SCALE);
//! see the `fixed` module.

use crate::{checked_add, ArithmeticError, DependencyType, ScaleStage, SCALE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single organizational role - the causal unit of structure.
///
/// A role is exclusively owned by its containing state; removing it
/// also removes every edge touching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub purpose: String,
    /// Sorted lexicographically.
    pub responsibilities: Vec<String>,
    /// Sorted lexicographically.
    pub required_inputs: Vec<String>,
    /// Sorted lexicographically.
    pub produced_outputs: Vec<String>,
    pub scale_stage: ScaleStage,
    pub active: bool,
}

/// Directed dependency between two roles.
///
/// Duplicate edges are permitted; self-loops are rejected at
/// insertion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from_role_id: String,
    pub to_role_id: String,
    pub dependency_type: DependencyType,
    pub critical: bool,
}

/// Resource constraints - int64 fixed-point (real * SCALE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintVector {
    pub capital: i64,
    pub talent: i64,
    pub time: i64,
    pub political_cost: i64,
}

impl Default for ConstraintVector {
    fn default() -> Self {
        Self {
            capital: 5 * SCALE,
            talent: 5 * SCALE,
            time: 5 * SCALE,
            political_cost: 5 * SCALE,
        }
    }
}

impl ConstraintVector {
    /// Aggregate organizational capacity index - integer mean of the
    /// four fields, checked addition throughout.
    pub fn capacity_index(&self) -> Result<i64, ArithmeticError> {
        let total = checked_add(
            checked_add(self.capital, self.talent)?,
            checked_add(self.time, self.political_cost)?,
        )?;
        Ok(total / 4)
    }
}

/// Domain thresholds, injected by the mandatory first event and then
/// immutable for the stream's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConstants {
    pub differentiation_threshold: i64,
    pub differentiation_min_capacity: i64,
    pub compression_max_combined_responsibilities: i64,
    pub shock_deactivation_threshold: i64,
    pub shock_debt_base_multiplier: i64,
    pub suppressed_differentiation_debt_increment: i64,
}

impl Default for DomainConstants {
    fn default() -> Self {
        Self {
            differentiation_threshold: 3,
            differentiation_min_capacity: 6 * SCALE,
            compression_max_combined_responsibilities: 5,
            shock_deactivation_threshold: 8,
            shock_debt_base_multiplier: 1,
            suppressed_differentiation_debt_increment: 1,
        }
    }
}

/// Complete organizational state snapshot.
///
/// Roles are keyed by id in a `BTreeMap` so every iteration over them
/// is lexicographic - a hard requirement for deterministic output.
/// `event_history` exists for diagnostics only and is excluded from
/// the canonical hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OrgState {
    pub roles: BTreeMap<String, Role>,
    pub dependencies: Vec<DependencyEdge>,
    pub constraint_vector: ConstraintVector,
    pub constants: DomainConstants,
    pub scale_stage: ScaleStage,
    pub structural_debt: i64,
    pub event_history: Vec<serde_json::Value>,
}

impl OrgState {
    /// Ids of currently active roles, in lexicographic order.
    pub fn active_role_ids(&self) -> Vec<&str> {
        self.roles
            .values()
            .filter(|r| r.active)
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Number of active roles.
    pub fn active_role_count(&self) -> usize {
        self.roles.values().filter(|r| r.active).count()
    }
}

/// Structured, immutable outcome of a state transition.
///
/// Every transition produces one of these. This is a domain concept,
/// not a debugging aid: equality of results across implementations is
/// a correctness property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionResult {
    pub event_type: crate::EventType,
    pub success: bool,
    pub differentiation_executed: bool,
    pub suppressed_differentiation: bool,
    pub differentiation_skipped: bool,
    pub compression_executed: bool,
    pub deactivated: bool,
    pub reason: String,
    pub primary_debt: i64,
    pub secondary_debt: i64,
    /// Fixed-point scaled local density of the shock target.
    pub target_density: i64,
    pub shock_target: String,
    pub magnitude: i64,
}

impl TransitionResult {
    /// A successful result with every rule-specific field cleared.
    pub fn success(event_type: crate::EventType) -> Self {
        Self {
            event_type,
            success: true,
            differentiation_executed: false,
            suppressed_differentiation: false,
            differentiation_skipped: false,
            compression_executed: false,
            deactivated: false,
            reason: String::new(),
            primary_debt: 0,
            secondary_debt: 0,
            target_density: 0,
            shock_target: String::new(),
            magnitude: 0,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
