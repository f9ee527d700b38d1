//! Initial state construction

use lattice_core::{ConstraintVector, DomainConstants, OrgState, ScaleStage, SCALE};

/// Parameters for a fresh organizational state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateParams {
    pub scale_stage: ScaleStage,
    pub capital: i64,
    pub talent: i64,
    pub time: i64,
    pub political_cost: i64,
    /// Pre-gate constants. The mandatory first event replaces them.
    pub constants: DomainConstants,
}

impl Default for StateParams {
    fn default() -> Self {
        Self {
            scale_stage: ScaleStage::Seed,
            capital: 5 * SCALE,
            talent: 5 * SCALE,
            time: 5 * SCALE,
            political_cost: 5 * SCALE,
            constants: DomainConstants::default(),
        }
    }
}

/// Create a fresh, empty state with the given constraint defaults.
pub fn initial_state(params: &StateParams) -> OrgState {
    OrgState {
        roles: Default::default(),
        dependencies: Vec::new(),
        constraint_vector: ConstraintVector {
            capital: params.capital,
            talent: params.talent,
            time: params.time,
            political_cost: params.political_cost,
        },
        constants: params.constants.clone(),
        scale_stage: params.scale_stage,
        structural_debt: 0,
        event_history: Vec::new(),
    }
}
