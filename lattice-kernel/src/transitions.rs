//! Transition rules
//!
//! All state-mutation logic lives here: one pure handler per event
//! kind, dispatched exhaustively. Handlers work on a clone of the
//! incoming state, so a failed transition never leaves partial
//! mutation behind. All math is checked integer arithmetic; constants
//! are read from the state being transitioned, never from globals.

use crate::graph::compute_role_structural_density;
use lattice_core::{
    checked_add, checked_mul, validate_role_id, AddDependencyPayload, AddRolePayload,
    CompressRolesPayload, ConstraintDeltaPayload, DependencyEdge, DifferentiateRolePayload,
    DomainConstants, Event, EventKind, EventType, InitializeConstantsPayload, InjectShockPayload,
    OrgState, RemoveRolePayload, Role, TransitionError, TransitionResult,
};
use std::collections::BTreeSet;

/// Apply `event` to `state`, returning `(new_state, result)`.
///
/// The input state is never mutated. The applied event's wire map is
/// appended to the new state's `event_history`.
pub fn apply_transition(state: &OrgState, event: &Event) -> Result<(OrgState, TransitionResult), TransitionError> {
    let mut new_state = state.clone();

    let result = match &event.kind {
        EventKind::InitializeConstants(p) => apply_initialize_constants(&mut new_state, p),
        EventKind::AddRole(p) => apply_add_role(&mut new_state, p)?,
        EventKind::RemoveRole(p) => apply_remove_role(&mut new_state, p)?,
        EventKind::DifferentiateRole(p) => apply_differentiate_role(&mut new_state, p)?,
        EventKind::CompressRoles(p) => apply_compress_roles(&mut new_state, p)?,
        EventKind::ApplyConstraintChange(p) => apply_constraint_change(&mut new_state, p)?,
        EventKind::InjectShock(p) => apply_inject_shock(&mut new_state, p, state)?,
        EventKind::AddDependency(p) => apply_add_dependency(&mut new_state, p)?,
    };

    new_state.event_history.push(event.to_value());
    Ok((new_state, result))
}

// ---------------------------------------------------------------------------
// Individual transition handlers
// ---------------------------------------------------------------------------

fn apply_initialize_constants(
    state: &mut OrgState,
    p: &InitializeConstantsPayload,
) -> TransitionResult {
    let current = &state.constants;
    state.constants = DomainConstants {
        differentiation_threshold: p
            .differentiation_threshold
            .unwrap_or(current.differentiation_threshold),
        differentiation_min_capacity: p
            .differentiation_min_capacity
            .unwrap_or(current.differentiation_min_capacity),
        compression_max_combined_responsibilities: p
            .compression_max_combined_responsibilities
            .unwrap_or(current.compression_max_combined_responsibilities),
        shock_deactivation_threshold: p
            .shock_deactivation_threshold
            .unwrap_or(current.shock_deactivation_threshold),
        shock_debt_base_multiplier: p
            .shock_debt_base_multiplier
            .unwrap_or(current.shock_debt_base_multiplier),
        suppressed_differentiation_debt_increment: p
            .suppressed_differentiation_debt_increment
            .unwrap_or(current.suppressed_differentiation_debt_increment),
    };
    TransitionResult::success(EventType::InitializeConstants)
}

fn apply_add_role(state: &mut OrgState, p: &AddRolePayload) -> Result<TransitionResult, TransitionError> {
    validate_role_id(&p.id)?;
    if state.roles.contains_key(&p.id) {
        return Err(TransitionError::RoleCollision {
            role_id: p.id.clone(),
        });
    }

    let role = Role {
        id: p.id.clone(),
        name: p.name.clone(),
        purpose: p.purpose.clone(),
        responsibilities: sorted(&p.responsibilities),
        required_inputs: sorted(&p.required_inputs),
        produced_outputs: sorted(&p.produced_outputs),
        scale_stage: p.scale_stage.unwrap_or(state.scale_stage),
        active: true,
    };
    state.roles.insert(role.id.clone(), role);
    Ok(TransitionResult::success(EventType::AddRole))
}

fn apply_remove_role(
    state: &mut OrgState,
    p: &RemoveRolePayload,
) -> Result<TransitionResult, TransitionError> {
    if state.roles.remove(&p.role_id).is_none() {
        return Err(TransitionError::MissingRole {
            role_id: p.role_id.clone(),
        });
    }
    state
        .dependencies
        .retain(|d| d.from_role_id != p.role_id && d.to_role_id != p.role_id);
    Ok(TransitionResult::success(EventType::RemoveRole))
}

/// Differentiation rule, integer math throughout:
///   - responsibilities > threshold AND capacity >= min -> execute
///   - responsibilities > threshold AND capacity < min -> suppress + debt
///   - otherwise -> skip, no structural change
fn apply_differentiate_role(
    state: &mut OrgState,
    p: &DifferentiateRolePayload,
) -> Result<TransitionResult, TransitionError> {
    let role = state
        .roles
        .get(&p.role_id)
        .cloned()
        .ok_or_else(|| TransitionError::MissingRole {
            role_id: p.role_id.clone(),
        })?;

    let c = state.constants.clone();

    if (role.responsibilities.len() as i64) <= c.differentiation_threshold {
        let mut result = TransitionResult::success(EventType::DifferentiateRole);
        result.differentiation_skipped = true;
        result.reason = format!(
            "responsibilities={} <= differentiation_threshold={}",
            role.responsibilities.len(),
            c.differentiation_threshold
        );
        return Ok(result);
    }

    let capacity = state.constraint_vector.capacity_index()?;
    if capacity < c.differentiation_min_capacity {
        state.structural_debt = checked_add(
            state.structural_debt,
            c.suppressed_differentiation_debt_increment,
        )?;
        let mut result = TransitionResult::success(EventType::DifferentiateRole);
        result.suppressed_differentiation = true;
        result.reason = format!(
            "capacity={capacity} < differentiation_min_capacity={}",
            c.differentiation_min_capacity
        );
        return Ok(result);
    }

    if p.new_roles.is_empty() {
        return Err(TransitionError::EmptyDifferentiation {
            role_id: p.role_id.clone(),
        });
    }

    state.roles.remove(&p.role_id);
    for spec in &p.new_roles {
        validate_role_id(&spec.id)?;
        let sub = Role {
            id: spec.id.clone(),
            name: spec.name.clone(),
            purpose: spec.purpose.clone().unwrap_or_else(|| role.purpose.clone()),
            responsibilities: sorted(&spec.responsibilities),
            required_inputs: sorted(
                spec.required_inputs
                    .as_deref()
                    .unwrap_or(&role.required_inputs),
            ),
            produced_outputs: sorted(&spec.produced_outputs),
            scale_stage: role.scale_stage,
            active: true,
        };
        state.roles.insert(sub.id.clone(), sub);
    }

    let mut result = TransitionResult::success(EventType::DifferentiateRole);
    result.differentiation_executed = true;
    Ok(result)
}

fn apply_compress_roles(
    state: &mut OrgState,
    p: &CompressRolesPayload,
) -> Result<TransitionResult, TransitionError> {
    let src = state
        .roles
        .get(&p.source_role_id)
        .cloned()
        .ok_or_else(|| TransitionError::MissingRole {
            role_id: p.source_role_id.clone(),
        })?;
    if !state.roles.contains_key(&p.target_role_id) {
        return Err(TransitionError::MissingRole {
            role_id: p.target_role_id.clone(),
        });
    }

    let max = state.constants.compression_max_combined_responsibilities;

    let tgt = state
        .roles
        .get_mut(&p.target_role_id)
        .ok_or_else(|| TransitionError::MissingRole {
            role_id: p.target_role_id.clone(),
        })?;

    // Deduplicated, sorted union of both responsibility sets.
    let combined = sorted_union(&tgt.responsibilities, &src.responsibilities);
    if combined.len() as i64 > max {
        return Err(TransitionError::CompressionOverflow {
            combined: combined.len(),
            max,
        });
    }

    if let Some(name) = &p.compressed_name {
        tgt.name = name.clone();
    }
    if let Some(purpose) = &p.compressed_purpose {
        tgt.purpose = purpose.clone();
    }
    tgt.responsibilities = combined;
    tgt.required_inputs = sorted_union(&tgt.required_inputs, &src.required_inputs);
    tgt.produced_outputs = sorted_union(&tgt.produced_outputs, &src.produced_outputs);

    state.roles.remove(&p.source_role_id);

    // Rewrite every edge incident on the source; drop self-loops the
    // rewrite produces.
    for dep in &mut state.dependencies {
        if dep.from_role_id == p.source_role_id {
            dep.from_role_id = p.target_role_id.clone();
        }
        if dep.to_role_id == p.source_role_id {
            dep.to_role_id = p.target_role_id.clone();
        }
    }
    state.dependencies.retain(|d| d.from_role_id != d.to_role_id);

    let mut result = TransitionResult::success(EventType::CompressRoles);
    result.compression_executed = true;
    Ok(result)
}

fn apply_constraint_change(
    state: &mut OrgState,
    p: &ConstraintDeltaPayload,
) -> Result<TransitionResult, TransitionError> {
    let cv = &mut state.constraint_vector;
    cv.capital = checked_add(cv.capital, p.capital_delta)?;
    cv.talent = checked_add(cv.talent, p.talent_delta)?;
    cv.time = checked_add(cv.time, p.time_delta)?;
    cv.political_cost = checked_add(cv.political_cost, p.political_cost_delta)?;

    for (field, value) in [
        ("capital", cv.capital),
        ("talent", cv.talent),
        ("time", cv.time),
        ("political_cost", cv.political_cost),
    ] {
        if value < 0 {
            return Err(TransitionError::NegativeConstraint { field, value });
        }
    }

    Ok(TransitionResult::success(EventType::ApplyConstraintChange))
}

/// Shock propagation. All densities are computed against the state
/// *before* the shock, so primary and secondary debts do not feed
/// back into each other.
fn apply_inject_shock(
    state: &mut OrgState,
    p: &InjectShockPayload,
    pre_shock: &OrgState,
) -> Result<TransitionResult, TransitionError> {
    if !state.roles.contains_key(&p.target_role_id) {
        return Err(TransitionError::MissingRole {
            role_id: p.target_role_id.clone(),
        });
    }

    let c = &state.constants;
    let target_density = compute_role_structural_density(&p.target_role_id, pre_shock)?;

    let primary_debt = checked_mul(
        p.magnitude,
        checked_add(c.shock_debt_base_multiplier, target_density)?,
    )?
    .max(1);
    state.structural_debt = checked_add(state.structural_debt, primary_debt)?;

    let deactivated = p.magnitude > state.constants.shock_deactivation_threshold;
    if deactivated {
        if let Some(target) = state.roles.get_mut(&p.target_role_id) {
            target.active = false;
        }
    }

    // Undirected neighbours of the target in the pre-shock state,
    // visited in sorted id order.
    let mut connected: BTreeSet<&str> = BTreeSet::new();
    for dep in &pre_shock.dependencies {
        if dep.from_role_id == p.target_role_id {
            connected.insert(dep.to_role_id.as_str());
        } else if dep.to_role_id == p.target_role_id {
            connected.insert(dep.from_role_id.as_str());
        }
    }

    let mut secondary_debt = 0_i64;
    for cid in connected {
        if state.roles.contains_key(cid) {
            let d = compute_role_structural_density(cid, pre_shock)?;
            let inc = checked_mul(p.magnitude, d)?.max(1);
            secondary_debt = checked_add(secondary_debt, inc)?;
        }
    }
    state.structural_debt = checked_add(state.structural_debt, secondary_debt)?;

    let mut result = TransitionResult::success(EventType::InjectShock);
    result.deactivated = deactivated;
    result.shock_target = p.target_role_id.clone();
    result.magnitude = p.magnitude;
    result.primary_debt = primary_debt;
    result.secondary_debt = secondary_debt;
    result.target_density = target_density;
    Ok(result)
}

fn apply_add_dependency(
    state: &mut OrgState,
    p: &AddDependencyPayload,
) -> Result<TransitionResult, TransitionError> {
    if !state.roles.contains_key(&p.from_role_id) {
        return Err(TransitionError::MissingRole {
            role_id: p.from_role_id.clone(),
        });
    }
    if !state.roles.contains_key(&p.to_role_id) {
        return Err(TransitionError::MissingRole {
            role_id: p.to_role_id.clone(),
        });
    }
    if p.from_role_id == p.to_role_id {
        return Err(TransitionError::SelfLoop {
            role_id: p.from_role_id.clone(),
        });
    }

    state.dependencies.push(DependencyEdge {
        from_role_id: p.from_role_id.clone(),
        to_role_id: p.to_role_id.clone(),
        dependency_type: p.dependency_type,
        critical: p.critical,
    });

    Ok(TransitionResult::success(EventType::AddDependency))
}

// ---------------------------------------------------------------------------
// Small helpers
// ---------------------------------------------------------------------------

fn sorted(items: &[String]) -> Vec<String> {
    let mut out = items.to_vec();
    out.sort_unstable();
    out
}

fn sorted_union(a: &[String], b: &[String]) -> Vec<String> {
    let set: BTreeSet<&String> = a.iter().chain(b.iter()).collect();
    set.into_iter().cloned().collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{initial_state, StateParams};
    use lattice_core::SCALE;

    fn event(sequence: u64, kind: EventKind) -> Event {
        Event {
            kind,
            timestamp: format!("t{sequence}"),
            sequence,
            logical_time: sequence as i64,
            event_uuid: None,
        }
    }

    fn add_role_payload(id: &str, responsibilities: &[&str]) -> AddRolePayload {
        AddRolePayload {
            id: id.to_string(),
            name: format!("Role {id}"),
            purpose: "purpose".to_string(),
            responsibilities: responsibilities.iter().map(|s| s.to_string()).collect(),
            required_inputs: vec![],
            produced_outputs: vec![],
            scale_stage: None,
        }
    }

    fn state_with_roles(ids: &[&str]) -> OrgState {
        let mut state = initial_state(&StateParams::default());
        for id in ids {
            let (next, _) = apply_transition(
                &state,
                &event(0, EventKind::AddRole(add_role_payload(id, &["resp"]))),
            )
            .expect("add role");
            state = next;
        }
        state
    }

    #[test]
    fn test_add_role_sorts_collections() {
        let state = initial_state(&StateParams::default());
        let mut payload = add_role_payload("ops", &["z_task", "a_task"]);
        payload.required_inputs = vec!["z_in".to_string(), "a_in".to_string()];
        let (next, result) = apply_transition(&state, &event(1, EventKind::AddRole(payload))).expect("apply");
        assert!(result.success);
        let role = &next.roles["ops"];
        assert_eq!(role.responsibilities, vec!["a_task", "z_task"]);
        assert_eq!(role.required_inputs, vec!["a_in", "z_in"]);
        assert!(role.active);
        // original state untouched
        assert!(state.roles.is_empty());
    }

    #[test]
    fn test_add_role_collision() {
        let state = state_with_roles(&["ops"]);
        let err = apply_transition(
            &state,
            &event(0, EventKind::AddRole(add_role_payload("ops", &["r"]))),
        )
        .unwrap_err();
        assert_eq!(err.code(), "role_collision");
    }

    #[test]
    fn test_add_role_invalid_id() {
        let state = initial_state(&StateParams::default());
        let err = apply_transition(
            &state,
            &event(0, EventKind::AddRole(add_role_payload("bad id", &["r"]))),
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid_payload");
    }

    #[test]
    fn test_remove_role_drops_incident_edges() {
        let mut state = state_with_roles(&["a", "b", "c"]);
        for (from, to) in [("a", "b"), ("b", "c"), ("c", "a")] {
            let (next, _) = apply_transition(
                &state,
                &event(
                    0,
                    EventKind::AddDependency(AddDependencyPayload {
                        from_role_id: from.to_string(),
                        to_role_id: to.to_string(),
                        dependency_type: Default::default(),
                        critical: false,
                    }),
                ),
            )
            .expect("add dep");
            state = next;
        }
        let (next, _) = apply_transition(
            &state,
            &event(
                0,
                EventKind::RemoveRole(RemoveRolePayload {
                    role_id: "a".to_string(),
                }),
            ),
        )
        .expect("remove");
        assert!(!next.roles.contains_key("a"));
        assert_eq!(next.dependencies.len(), 1);
        assert_eq!(next.dependencies[0].from_role_id, "b");
    }

    #[test]
    fn test_remove_missing_role() {
        let state = state_with_roles(&["a"]);
        let err = apply_transition(
            &state,
            &event(
                0,
                EventKind::RemoveRole(RemoveRolePayload {
                    role_id: "ghost".to_string(),
                }),
            ),
        )
        .unwrap_err();
        assert_eq!(err.code(), "missing_role");
    }

    #[test]
    fn test_differentiation_skipped_below_threshold() {
        let state = state_with_roles(&["a"]);
        let (next, result) = apply_transition(
            &state,
            &event(
                0,
                EventKind::DifferentiateRole(DifferentiateRolePayload {
                    role_id: "a".to_string(),
                    new_roles: vec![],
                }),
            ),
        )
        .expect("apply");
        assert!(result.differentiation_skipped);
        assert!(result.reason.contains("differentiation_threshold"));
        assert!(next.roles.contains_key("a"));
        assert_eq!(next.structural_debt, 0);
    }

    #[test]
    fn test_differentiation_suppressed_low_capacity() {
        let params = StateParams {
            capital: 2 * SCALE,
            talent: 2 * SCALE,
            time: 2 * SCALE,
            political_cost: 2 * SCALE,
            ..StateParams::default()
        };
        let mut state = initial_state(&params);
        let (next, _) = apply_transition(
            &state,
            &event(
                0,
                EventKind::AddRole(add_role_payload("big", &["r1", "r2", "r3", "r4"])),
            ),
        )
        .expect("add");
        state = next;

        let (next, result) = apply_transition(
            &state,
            &event(
                0,
                EventKind::DifferentiateRole(DifferentiateRolePayload {
                    role_id: "big".to_string(),
                    new_roles: vec![],
                }),
            ),
        )
        .expect("apply");
        assert!(result.suppressed_differentiation);
        assert!(result.reason.contains("differentiation_min_capacity"));
        assert_eq!(next.structural_debt, 1);
        assert_eq!(next.roles["big"], state.roles["big"]);
    }

    #[test]
    fn test_differentiation_executed() {
        let params = StateParams {
            capital: 8 * SCALE,
            talent: 8 * SCALE,
            time: 8 * SCALE,
            political_cost: 8 * SCALE,
            ..StateParams::default()
        };
        let mut state = initial_state(&params);
        let mut payload = add_role_payload("big", &["r1", "r2", "r3", "r4"]);
        payload.required_inputs = vec!["shared_input".to_string()];
        let (next, _) = apply_transition(&state, &event(0, EventKind::AddRole(payload))).expect("add");
        state = next;

        let (next, result) = apply_transition(
            &state,
            &event(
                0,
                EventKind::DifferentiateRole(DifferentiateRolePayload {
                    role_id: "big".to_string(),
                    new_roles: vec![
                        lattice_core::SubRoleSpec {
                            id: "sub_a".to_string(),
                            name: "Sub A".to_string(),
                            purpose: None,
                            responsibilities: vec!["r1".to_string(), "r2".to_string()],
                            required_inputs: None,
                            produced_outputs: vec![],
                        },
                        lattice_core::SubRoleSpec {
                            id: "sub_b".to_string(),
                            name: "Sub B".to_string(),
                            purpose: Some("own purpose".to_string()),
                            responsibilities: vec!["r3".to_string(), "r4".to_string()],
                            required_inputs: Some(vec!["own_input".to_string()]),
                            produced_outputs: vec![],
                        },
                    ],
                }),
            ),
        )
        .expect("apply");
        assert!(result.differentiation_executed);
        assert!(!next.roles.contains_key("big"));
        // sub_a inherits purpose and inputs from the parent
        assert_eq!(next.roles["sub_a"].purpose, "purpose");
        assert_eq!(next.roles["sub_a"].required_inputs, vec!["shared_input"]);
        // sub_b overrides both
        assert_eq!(next.roles["sub_b"].purpose, "own purpose");
        assert_eq!(next.roles["sub_b"].required_inputs, vec!["own_input"]);
    }

    #[test]
    fn test_differentiation_requires_new_roles() {
        let params = StateParams {
            capital: 8 * SCALE,
            talent: 8 * SCALE,
            time: 8 * SCALE,
            political_cost: 8 * SCALE,
            ..StateParams::default()
        };
        let state = initial_state(&params);
        let (state, _) = apply_transition(
            &state,
            &event(
                0,
                EventKind::AddRole(add_role_payload("big", &["r1", "r2", "r3", "r4"])),
            ),
        )
        .expect("add");
        let err = apply_transition(
            &state,
            &event(
                0,
                EventKind::DifferentiateRole(DifferentiateRolePayload {
                    role_id: "big".to_string(),
                    new_roles: vec![],
                }),
            ),
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid_payload");
    }

    #[test]
    fn test_compression_merges_and_rewrites_edges() {
        let mut state = state_with_roles(&["src", "tgt", "other"]);
        for (from, to) in [("other", "src"), ("src", "tgt")] {
            let (next, _) = apply_transition(
                &state,
                &event(
                    0,
                    EventKind::AddDependency(AddDependencyPayload {
                        from_role_id: from.to_string(),
                        to_role_id: to.to_string(),
                        dependency_type: Default::default(),
                        critical: false,
                    }),
                ),
            )
            .expect("dep");
            state = next;
        }

        let (next, result) = apply_transition(
            &state,
            &event(
                0,
                EventKind::CompressRoles(CompressRolesPayload {
                    source_role_id: "src".to_string(),
                    target_role_id: "tgt".to_string(),
                    compressed_name: Some("Merged".to_string()),
                    compressed_purpose: None,
                }),
            ),
        )
        .expect("compress");
        assert!(result.compression_executed);
        assert!(!next.roles.contains_key("src"));
        assert_eq!(next.roles["tgt"].name, "Merged");
        // other->src rewritten to other->tgt; src->tgt became a
        // self-loop and was dropped
        assert_eq!(next.dependencies.len(), 1);
        assert_eq!(next.dependencies[0].from_role_id, "other");
        assert_eq!(next.dependencies[0].to_role_id, "tgt");
    }

    #[test]
    fn test_compression_overflow() {
        let mut state = initial_state(&StateParams::default());
        for (id, resps) in [
            ("src", vec!["a", "b", "c"]),
            ("tgt", vec!["d", "e", "f"]),
        ] {
            let (next, _) = apply_transition(
                &state,
                &event(0, EventKind::AddRole(add_role_payload(id, &resps))),
            )
            .expect("add");
            state = next;
        }
        let err = apply_transition(
            &state,
            &event(
                0,
                EventKind::CompressRoles(CompressRolesPayload {
                    source_role_id: "src".to_string(),
                    target_role_id: "tgt".to_string(),
                    compressed_name: None,
                    compressed_purpose: None,
                }),
            ),
        )
        .unwrap_err();
        assert_eq!(err.code(), "compression_overflow");
    }

    #[test]
    fn test_constraint_change_and_negative_guard() {
        let state = initial_state(&StateParams::default());
        let (next, _) = apply_transition(
            &state,
            &event(
                0,
                EventKind::ApplyConstraintChange(ConstraintDeltaPayload {
                    capital_delta: -SCALE,
                    ..Default::default()
                }),
            ),
        )
        .expect("apply");
        assert_eq!(next.constraint_vector.capital, 4 * SCALE);

        let err = apply_transition(
            &next,
            &event(
                0,
                EventKind::ApplyConstraintChange(ConstraintDeltaPayload {
                    talent_delta: -6 * SCALE,
                    ..Default::default()
                }),
            ),
        )
        .unwrap_err();
        assert_eq!(err.code(), "negative_constraint");
    }

    #[test]
    fn test_constraint_change_overflow() {
        let state = initial_state(&StateParams::default());
        let err = apply_transition(
            &state,
            &event(
                0,
                EventKind::ApplyConstraintChange(ConstraintDeltaPayload {
                    time_delta: i64::MAX,
                    ..Default::default()
                }),
            ),
        )
        .unwrap_err();
        assert_eq!(err.code(), "integer_overflow");
    }

    #[test]
    fn test_shock_deactivation_and_debt() {
        let mut state = state_with_roles(&["r1", "r2"]);
        let (next, _) = apply_transition(
            &state,
            &event(
                0,
                EventKind::AddDependency(AddDependencyPayload {
                    from_role_id: "r1".to_string(),
                    to_role_id: "r2".to_string(),
                    dependency_type: Default::default(),
                    critical: false,
                }),
            ),
        )
        .expect("dep");
        state = next;

        let (next, result) = apply_transition(
            &state,
            &event(
                0,
                EventKind::InjectShock(InjectShockPayload {
                    target_role_id: "r1".to_string(),
                    magnitude: 10,
                }),
            ),
        )
        .expect("shock");
        // r1 touches the only edge: density == SCALE
        assert_eq!(result.target_density, SCALE);
        assert_eq!(result.primary_debt, 10 * (1 + SCALE));
        // one neighbour (r2), also density SCALE
        assert_eq!(result.secondary_debt, 10 * SCALE);
        assert!(result.deactivated);
        assert!(!next.roles["r1"].active);
        assert!(next.structural_debt > state.structural_debt);
    }

    #[test]
    fn test_shock_below_threshold_keeps_role_active() {
        let state = state_with_roles(&["solo"]);
        let (next, result) = apply_transition(
            &state,
            &event(
                0,
                EventKind::InjectShock(InjectShockPayload {
                    target_role_id: "solo".to_string(),
                    magnitude: 3,
                }),
            ),
        )
        .expect("shock");
        assert!(!result.deactivated);
        assert!(next.roles["solo"].active);
        // no edges: density 0, primary = max(3 * (1 + 0), 1)
        assert_eq!(result.primary_debt, 3);
        assert_eq!(result.secondary_debt, 0);
    }

    #[test]
    fn test_self_loop_rejected() {
        let state = state_with_roles(&["a"]);
        let err = apply_transition(
            &state,
            &event(
                0,
                EventKind::AddDependency(AddDependencyPayload {
                    from_role_id: "a".to_string(),
                    to_role_id: "a".to_string(),
                    dependency_type: Default::default(),
                    critical: false,
                }),
            ),
        )
        .unwrap_err();
        assert_eq!(err.code(), "self_loop");
    }

    #[test]
    fn test_duplicate_edges_permitted() {
        let state = state_with_roles(&["a", "b"]);
        let dep = EventKind::AddDependency(AddDependencyPayload {
            from_role_id: "a".to_string(),
            to_role_id: "b".to_string(),
            dependency_type: Default::default(),
            critical: false,
        });
        let (state, _) = apply_transition(&state, &event(0, dep.clone())).expect("first");
        let (state, _) = apply_transition(&state, &event(0, dep)).expect("second");
        assert_eq!(state.dependencies.len(), 2);
    }

    #[test]
    fn test_history_records_wire_map() {
        let state = initial_state(&StateParams::default());
        let (next, _) = apply_transition(
            &state,
            &event(1, EventKind::AddRole(add_role_payload("ops", &["r"]))),
        )
        .expect("apply");
        assert_eq!(next.event_history.len(), 1);
        assert_eq!(next.event_history[0]["event_type"], "add_role");
        assert_eq!(next.event_history[0]["sequence"], 1);
    }
}
