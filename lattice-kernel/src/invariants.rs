//! Invariant validation
//!
//! Hard-fail checks run as an ordered battery after every transition.
//! The order is fixed because later checks assume earlier ones passed
//! (dependency_refs assumes role ids are well-formed, and so on). The
//! first failure wins; the candidate state is discarded by the engine.

use crate::graph::detect_critical_cycles;
use lattice_core::{is_valid_role_id, InvariantRule, InvariantViolation, OrgState};
use std::collections::BTreeSet;

/// Run all seven invariant checks against a state.
pub fn validate_invariants(state: &OrgState) -> Result<(), InvariantViolation> {
    check_role_id_format(state)?;
    check_dependency_refs(state)?;
    check_orphaned_outputs(state)?;
    check_duplicate_role_ids(state)?;
    check_at_least_one_active_role(state)?;
    check_no_empty_responsibilities(state)?;
    check_no_critical_cycles(state)?;
    Ok(())
}

fn violation(rule: InvariantRule, detail: String) -> InvariantViolation {
    InvariantViolation { rule, detail }
}

/// INV role_id_format: every role id matches `[A-Za-z0-9_-]+`.
fn check_role_id_format(state: &OrgState) -> Result<(), InvariantViolation> {
    for rid in state.roles.keys() {
        if !is_valid_role_id(rid) {
            return Err(violation(
                InvariantRule::RoleIdFormat,
                format!("role ID {rid:?} contains invalid characters, must match [A-Za-z0-9_-]+"),
            ));
        }
    }
    Ok(())
}

/// INV dependency_refs: every edge endpoint exists.
fn check_dependency_refs(state: &OrgState) -> Result<(), InvariantViolation> {
    for dep in &state.dependencies {
        if !state.roles.contains_key(&dep.from_role_id) {
            return Err(violation(
                InvariantRule::DependencyRefs,
                format!(
                    "dependency from_role_id={:?} does not exist in roles",
                    dep.from_role_id
                ),
            ));
        }
        if !state.roles.contains_key(&dep.to_role_id) {
            return Err(violation(
                InvariantRule::DependencyRefs,
                format!(
                    "dependency to_role_id={:?} does not exist in roles",
                    dep.to_role_id
                ),
            ));
        }
    }
    Ok(())
}

/// INV orphaned_output: every produced output is consumed as a
/// required input by some role.
fn check_orphaned_outputs(state: &OrgState) -> Result<(), InvariantViolation> {
    let all_inputs: BTreeSet<&str> = state
        .roles
        .values()
        .flat_map(|r| r.required_inputs.iter().map(String::as_str))
        .collect();

    for role in state.roles.values() {
        for output in &role.produced_outputs {
            if !all_inputs.contains(output.as_str()) {
                return Err(violation(
                    InvariantRule::OrphanedOutput,
                    format!(
                        "role {:?} produces output {output:?} that no role consumes as required_input",
                        role.id
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// INV duplicate_role_ids: the role map key must equal the role's id.
///
/// The map structure already forbids duplicate keys, so the reachable
/// failure is a key/id mismatch introduced by a corrupt snapshot.
fn check_duplicate_role_ids(state: &OrgState) -> Result<(), InvariantViolation> {
    for (key, role) in &state.roles {
        if key != &role.id {
            return Err(violation(
                InvariantRule::DuplicateRoleIds,
                format!("role key {key:?} does not match role id {:?}", role.id),
            ));
        }
    }
    Ok(())
}

/// INV no_active_roles: a non-empty role set has at least one active
/// role.
fn check_at_least_one_active_role(state: &OrgState) -> Result<(), InvariantViolation> {
    if state.roles.is_empty() {
        return Ok(());
    }
    if state.roles.values().any(|r| r.active) {
        Ok(())
    } else {
        Err(violation(
            InvariantRule::NoActiveRoles,
            "no active roles remain in the organization".to_string(),
        ))
    }
}

/// INV empty_responsibilities: every role has at least one
/// responsibility.
fn check_no_empty_responsibilities(state: &OrgState) -> Result<(), InvariantViolation> {
    for role in state.roles.values() {
        if role.responsibilities.is_empty() {
            return Err(violation(
                InvariantRule::EmptyResponsibilities,
                format!("role {:?} has zero responsibilities", role.id),
            ));
        }
    }
    Ok(())
}

/// INV critical_cycle: no cycle composed entirely of critical edges.
fn check_no_critical_cycles(state: &OrgState) -> Result<(), InvariantViolation> {
    let cycles = detect_critical_cycles(state);
    if let Some(first) = cycles.first() {
        return Err(violation(
            InvariantRule::CriticalCycle,
            format!("critical dependency cycle detected: {}", first.join(" -> ")),
        ));
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::{DependencyEdge, DependencyType, Role, ScaleStage};

    fn role(id: &str, responsibilities: &[&str]) -> Role {
        Role {
            id: id.to_string(),
            name: id.to_string(),
            purpose: String::new(),
            responsibilities: responsibilities.iter().map(|s| s.to_string()).collect(),
            required_inputs: vec![],
            produced_outputs: vec![],
            scale_stage: ScaleStage::Seed,
            active: true,
        }
    }

    fn base_state() -> OrgState {
        let mut state = OrgState::default();
        state.roles.insert("a".to_string(), role("a", &["r1"]));
        state.roles.insert("b".to_string(), role("b", &["r2"]));
        state
    }

    #[test]
    fn test_clean_state_passes() {
        assert!(validate_invariants(&base_state()).is_ok());
        assert!(validate_invariants(&OrgState::default()).is_ok());
    }

    #[test]
    fn test_dangling_dependency() {
        let mut state = base_state();
        state.dependencies.push(DependencyEdge {
            from_role_id: "a".to_string(),
            to_role_id: "ghost".to_string(),
            dependency_type: DependencyType::Operational,
            critical: false,
        });
        let err = validate_invariants(&state).unwrap_err();
        assert_eq!(err.rule, InvariantRule::DependencyRefs);
    }

    #[test]
    fn test_orphaned_output() {
        let mut state = base_state();
        if let Some(r) = state.roles.get_mut("a") {
            r.produced_outputs = vec!["orphan_output".to_string()];
        }
        let err = validate_invariants(&state).unwrap_err();
        assert_eq!(err.rule, InvariantRule::OrphanedOutput);
        assert!(err.detail.contains("orphan_output"));
    }

    #[test]
    fn test_self_consumed_output_passes() {
        let mut state = base_state();
        if let Some(r) = state.roles.get_mut("a") {
            r.produced_outputs = vec!["report".to_string()];
            r.required_inputs = vec!["report".to_string()];
        }
        assert!(validate_invariants(&state).is_ok());
    }

    #[test]
    fn test_no_active_roles() {
        let mut state = base_state();
        for r in state.roles.values_mut() {
            r.active = false;
        }
        let err = validate_invariants(&state).unwrap_err();
        assert_eq!(err.rule, InvariantRule::NoActiveRoles);
    }

    #[test]
    fn test_empty_responsibilities() {
        let mut state = base_state();
        if let Some(r) = state.roles.get_mut("b") {
            r.responsibilities.clear();
        }
        let err = validate_invariants(&state).unwrap_err();
        assert_eq!(err.rule, InvariantRule::EmptyResponsibilities);
    }

    #[test]
    fn test_bad_role_id_format() {
        let mut state = base_state();
        state.roles.insert("bad id".to_string(), role("bad id", &["r"]));
        let err = validate_invariants(&state).unwrap_err();
        assert_eq!(err.rule, InvariantRule::RoleIdFormat);
    }

    #[test]
    fn test_key_id_mismatch() {
        let mut state = base_state();
        state.roles.insert("alias".to_string(), role("a", &["r"]));
        let err = validate_invariants(&state).unwrap_err();
        assert_eq!(err.rule, InvariantRule::DuplicateRoleIds);
    }

    #[test]
    fn test_critical_cycle() {
        let mut state = base_state();
        state.dependencies.push(DependencyEdge {
            from_role_id: "a".to_string(),
            to_role_id: "b".to_string(),
            dependency_type: DependencyType::Operational,
            critical: true,
        });
        state.dependencies.push(DependencyEdge {
            from_role_id: "b".to_string(),
            to_role_id: "a".to_string(),
            dependency_type: DependencyType::Operational,
            critical: true,
        });
        let err = validate_invariants(&state).unwrap_err();
        assert_eq!(err.rule, InvariantRule::CriticalCycle);
        assert!(err.detail.contains(" -> "));
    }
}
