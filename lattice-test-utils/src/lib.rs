//! Lattice Test Utils
//!
//! Shared builders and fixtures for kernel, projection, and generator
//! tests. Nothing in this crate is part of the deterministic core.

use lattice_core::{
    AddDependencyPayload, AddRolePayload, CompressRolesPayload, ConstraintDeltaPayload,
    DependencyType, DifferentiateRolePayload, Event, EventKind, InitializeConstantsPayload,
    InjectShockPayload, RemoveRolePayload, SubRoleSpec,
};
use lattice_gen::{DependencyBlueprint, DeptBlueprint, IndustryTemplate, RoleBlueprint};
use proptest::prelude::*;

// ============================================================================
// EVENT STREAM BUILDER
// ============================================================================

/// Builds replay-valid event streams with automatic sequence numbers,
/// `t<seq>` timestamps, and `logical_time == sequence`.
#[derive(Debug, Default)]
pub struct EventSeq {
    seq: u64,
}

impl EventSeq {
    pub fn new() -> Self {
        Self { seq: 0 }
    }

    /// Wrap a kind into the next envelope in the stream.
    pub fn event(&mut self, kind: EventKind) -> Event {
        self.seq += 1;
        Event {
            kind,
            timestamp: format!("t{}", self.seq),
            sequence: self.seq,
            logical_time: self.seq as i64,
            event_uuid: None,
        }
    }

    /// `initialize_constants` with no overrides.
    pub fn init_constants(&mut self) -> Event {
        self.init_constants_with(InitializeConstantsPayload::default())
    }

    pub fn init_constants_with(&mut self, payload: InitializeConstantsPayload) -> Event {
        self.event(EventKind::InitializeConstants(payload))
    }

    /// `add_role` with derived name/purpose and no inputs or outputs.
    pub fn add_role(&mut self, id: &str, responsibilities: &[&str]) -> Event {
        self.add_role_io(id, responsibilities, &[], &[])
    }

    /// `add_role` with explicit required inputs and produced outputs.
    pub fn add_role_io(
        &mut self,
        id: &str,
        responsibilities: &[&str],
        required_inputs: &[&str],
        produced_outputs: &[&str],
    ) -> Event {
        self.event(EventKind::AddRole(AddRolePayload {
            id: id.to_string(),
            name: format!("Role {id}"),
            purpose: format!("Purpose of {id}"),
            responsibilities: strings(responsibilities),
            required_inputs: strings(required_inputs),
            produced_outputs: strings(produced_outputs),
            scale_stage: None,
        }))
    }

    pub fn remove_role(&mut self, role_id: &str) -> Event {
        self.event(EventKind::RemoveRole(RemoveRolePayload {
            role_id: role_id.to_string(),
        }))
    }

    /// Plain operational, non-critical dependency.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Event {
        self.add_dependency_typed(from, to, DependencyType::Operational, false)
    }

    pub fn add_dependency_typed(
        &mut self,
        from: &str,
        to: &str,
        dependency_type: DependencyType,
        critical: bool,
    ) -> Event {
        self.event(EventKind::AddDependency(AddDependencyPayload {
            from_role_id: from.to_string(),
            to_role_id: to.to_string(),
            dependency_type,
            critical,
        }))
    }

    pub fn differentiate(&mut self, role_id: &str, new_roles: Vec<SubRoleSpec>) -> Event {
        self.event(EventKind::DifferentiateRole(DifferentiateRolePayload {
            role_id: role_id.to_string(),
            new_roles,
        }))
    }

    pub fn compress(&mut self, source: &str, target: &str) -> Event {
        self.event(EventKind::CompressRoles(CompressRolesPayload {
            source_role_id: source.to_string(),
            target_role_id: target.to_string(),
            compressed_name: None,
            compressed_purpose: None,
        }))
    }

    /// Apply one delta to all four constraint fields.
    pub fn constraint_shift(&mut self, delta: i64) -> Event {
        self.event(EventKind::ApplyConstraintChange(ConstraintDeltaPayload {
            capital_delta: delta,
            talent_delta: delta,
            time_delta: delta,
            political_cost_delta: delta,
        }))
    }

    pub fn inject_shock(&mut self, target: &str, magnitude: i64) -> Event {
        self.event(EventKind::InjectShock(InjectShockPayload {
            target_role_id: target.to_string(),
            magnitude,
        }))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Sub-role descriptor with the common defaults.
pub fn sub_role(id: &str, responsibilities: &[&str]) -> SubRoleSpec {
    SubRoleSpec {
        id: id.to_string(),
        name: format!("Role {id}"),
        purpose: None,
        responsibilities: strings(responsibilities),
        required_inputs: None,
        produced_outputs: vec![],
    }
}

// ============================================================================
// BLUEPRINT FIXTURES
// ============================================================================

/// Small two-department blueprint used across generator and
/// projection tests. Shaped like a seed-stage software company.
pub fn sample_template() -> IndustryTemplate {
    IndustryTemplate {
        industry: "tech_services".to_string(),
        stage: "seed".to_string(),
        departments: vec![
            DeptBlueprint {
                name: "Delivery".to_string(),
                roles: vec![
                    RoleBlueprint {
                        id: "tech_lead".to_string(),
                        name: "Tech Lead".to_string(),
                        purpose: "Technical direction".to_string(),
                        responsibilities: strings(&["architecture", "code_review"]),
                        produced_outputs: strings(&["design_docs"]),
                        required_inputs: strings(&["client_brief"]),
                    },
                    RoleBlueprint {
                        id: "dev_1".to_string(),
                        name: "Developer".to_string(),
                        purpose: "Feature delivery".to_string(),
                        responsibilities: strings(&["implementation", "testing"]),
                        produced_outputs: strings(&["shipped_features"]),
                        required_inputs: strings(&["design_docs"]),
                    },
                    RoleBlueprint {
                        id: "dev_2".to_string(),
                        name: "Developer II".to_string(),
                        purpose: "Feature delivery".to_string(),
                        responsibilities: strings(&["implementation", "deployment"]),
                        produced_outputs: strings(&["release_builds"]),
                        required_inputs: strings(&["design_docs"]),
                    },
                ],
            },
            DeptBlueprint {
                name: "Client".to_string(),
                roles: vec![
                    RoleBlueprint {
                        id: "account_mgr".to_string(),
                        name: "Account Manager".to_string(),
                        purpose: "Client relationship".to_string(),
                        responsibilities: strings(&["client_comms", "scoping"]),
                        produced_outputs: strings(&["client_brief"]),
                        required_inputs: strings(&["shipped_features"]),
                    },
                    RoleBlueprint {
                        id: "pm".to_string(),
                        name: "Project Manager".to_string(),
                        purpose: "Delivery coordination".to_string(),
                        responsibilities: strings(&["planning", "reporting"]),
                        produced_outputs: strings(&["status_reports"]),
                        required_inputs: strings(&["release_builds"]),
                    },
                ],
            },
        ],
        dependencies: vec![
            DependencyBlueprint {
                from_role: "tech_lead".to_string(),
                to_role: "dev_1".to_string(),
                dep_type: DependencyType::Operational,
                critical: true,
            },
            DependencyBlueprint {
                from_role: "tech_lead".to_string(),
                to_role: "dev_2".to_string(),
                dep_type: DependencyType::Operational,
                critical: false,
            },
            DependencyBlueprint {
                from_role: "account_mgr".to_string(),
                to_role: "tech_lead".to_string(),
                dep_type: DependencyType::Governance,
                critical: false,
            },
            DependencyBlueprint {
                from_role: "pm".to_string(),
                to_role: "account_mgr".to_string(),
                dep_type: DependencyType::Informational,
                critical: false,
            },
        ],
    }
}

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

/// Strategy producing a small positive shock magnitude.
pub fn arb_magnitude() -> impl Strategy<Value = i64> {
    1_i64..=12
}
