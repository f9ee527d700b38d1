//! Event stream compiler
//!
//! Turns `(IndustryTemplate, TemplateSpec, seed)` into a replay-valid
//! event stream plus the intended department grouping. Emission order
//! is fixed: constants, capacity, roles, template edges, density
//! fill, fragility pass, shock. Sequence numbers run 1..N in emission
//! order; the only randomness is the seeded PRNG.

use crate::rng::DeterministicRng;
use crate::template::{CapacityProfile, IndustryTemplate, TemplateSpec};
use lattice_core::{
    AddDependencyPayload, AddRolePayload, ConstraintDeltaPayload, DependencyType, Event,
    EventKind, GeneratorError, InitializeConstantsPayload, InjectShockPayload, SCALE,
};
use lattice_kernel::OrgEngine;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// The intended grouping of generated roles, by template department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentMap {
    pub departments: Vec<DepartmentMapEntry>,
}

/// One department's name with the role ids that were emitted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentMapEntry {
    pub name: String,
    pub role_ids: Vec<String>,
}

/// Ordered event emission with automatic sequence numbers and
/// PRNG-minted event uuids.
struct Emitter<'r> {
    events: Vec<Event>,
    seq: u64,
    rng: &'r mut DeterministicRng,
}

impl<'r> Emitter<'r> {
    fn new(rng: &'r mut DeterministicRng) -> Self {
        Self {
            events: Vec::new(),
            seq: 0,
            rng,
        }
    }

    fn emit(&mut self, kind: EventKind) {
        self.seq += 1;
        self.events.push(Event {
            kind,
            timestamp: format!("t{}", self.seq),
            sequence: self.seq,
            logical_time: self.seq as i64,
            event_uuid: Some(self.rng.uuid().to_string()),
        });
    }
}

/// Compile a blueprint into a deterministic event stream.
///
/// The returned stream has already survived a throwaway engine
/// replay; a failure there surfaces as `GeneratorError`.
pub fn compile(
    template: &IndustryTemplate,
    spec: &TemplateSpec,
    seed: u64,
) -> Result<(Vec<Event>, DepartmentMap), GeneratorError> {
    let mut rng = DeterministicRng::new(seed);
    let mut emitter = Emitter::new(&mut rng);

    // Step 1: constants. Always first, always defaults.
    emitter.emit(EventKind::InitializeConstants(
        InitializeConstantsPayload::default(),
    ));

    // Step 2: capacity profile.
    emit_capacity_event(spec, &mut emitter);

    // Step 3: roles, in template order.
    let role_ids = emit_template_roles(template, &mut emitter);

    // Step 4: template-declared dependencies.
    let mut added_edges: BTreeSet<(String, String)> = BTreeSet::new();
    let mut critical_edges: BTreeSet<(String, String)> = BTreeSet::new();
    emit_template_dependencies(template, &role_ids, &mut added_edges, &mut critical_edges, &mut emitter);

    // Step 5: random intra-department edges up to the density target.
    emit_density_fill(template, spec, &role_ids, &mut added_edges, &mut emitter);

    // Step 6: fragility pass (hub concentration).
    if spec.fragility_mode && role_ids.len() >= 2 {
        emit_fragility_edges(&role_ids, &mut added_edges, &mut critical_edges, &mut emitter);
    }

    // Step 7: shock on the first emitted role.
    if spec.shock_magnitude > 0 {
        if let Some(first) = role_ids.first() {
            emitter.emit(EventKind::InjectShock(InjectShockPayload {
                target_role_id: first.clone(),
                magnitude: spec.shock_magnitude,
            }));
        }
    }

    let events = emitter.events;
    let emitted: BTreeSet<&str> = role_ids.iter().map(String::as_str).collect();
    let department_map = DepartmentMap {
        departments: template
            .departments
            .iter()
            .map(|dept| DepartmentMapEntry {
                name: dept.name.clone(),
                role_ids: dept
                    .roles
                    .iter()
                    .filter(|r| emitted.contains(r.id.as_str()))
                    .map(|r| r.id.clone())
                    .collect(),
            })
            .collect(),
    };

    debug!(
        events = events.len(),
        roles = role_ids.len(),
        seed,
        "compiled event stream, verifying by replay"
    );

    // Replay validation on a throwaway engine. A generated stream
    // that cannot replay is a generator defect, never a caller error.
    let mut engine = OrgEngine::new();
    engine.replay(&events)?;

    Ok((events, department_map))
}

// ---------------------------------------------------------------------------
// Step 2: capacity
// ---------------------------------------------------------------------------

/// At most one constraint event: `balanced` keeps the starting
/// capacity, `low` subtracts SCALE from every field, `high` adds
/// 2*SCALE to every field.
fn emit_capacity_event(spec: &TemplateSpec, emitter: &mut Emitter<'_>) {
    let delta = match spec.capacity_profile {
        CapacityProfile::Balanced => return,
        CapacityProfile::Low => -SCALE,
        CapacityProfile::High => 2 * SCALE,
    };
    emitter.emit(EventKind::ApplyConstraintChange(ConstraintDeltaPayload {
        capital_delta: delta,
        talent_delta: delta,
        time_delta: delta,
        political_cost_delta: delta,
    }));
}

// ---------------------------------------------------------------------------
// Step 3: roles
// ---------------------------------------------------------------------------

/// Emit every blueprint role in template order. Each role's required
/// inputs are extended with its own produced outputs, so no output is
/// ever orphaned regardless of which consumers the template declares.
fn emit_template_roles(template: &IndustryTemplate, emitter: &mut Emitter<'_>) -> Vec<String> {
    let mut role_ids: Vec<String> = Vec::new();

    for dept in &template.departments {
        for bp in &dept.roles {
            let produced = if bp.produced_outputs.is_empty() {
                vec![format!("output_{}", bp.id)]
            } else {
                bp.produced_outputs.clone()
            };
            let mut required = bp.required_inputs.clone();
            for p in &produced {
                if !required.contains(p) {
                    required.push(p.clone());
                }
            }

            emitter.emit(EventKind::AddRole(AddRolePayload {
                id: bp.id.clone(),
                name: bp.name.clone(),
                purpose: bp.purpose.clone(),
                responsibilities: bp.responsibilities.clone(),
                required_inputs: required,
                produced_outputs: produced,
                scale_stage: None,
            }));
            role_ids.push(bp.id.clone());
        }
    }

    role_ids
}

// ---------------------------------------------------------------------------
// Step 4: template dependencies
// ---------------------------------------------------------------------------

fn emit_template_dependencies(
    template: &IndustryTemplate,
    role_ids: &[String],
    added_edges: &mut BTreeSet<(String, String)>,
    critical_edges: &mut BTreeSet<(String, String)>,
    emitter: &mut Emitter<'_>,
) {
    let valid: BTreeSet<&str> = role_ids.iter().map(String::as_str).collect();

    for bp in &template.dependencies {
        if !valid.contains(bp.from_role.as_str()) || !valid.contains(bp.to_role.as_str()) {
            continue;
        }
        let pair = (bp.from_role.clone(), bp.to_role.clone());
        if !added_edges.insert(pair.clone()) {
            continue;
        }
        if bp.critical {
            critical_edges.insert(pair);
        }
        emitter.emit(EventKind::AddDependency(AddDependencyPayload {
            from_role_id: bp.from_role.clone(),
            to_role_id: bp.to_role.clone(),
            dependency_type: bp.dep_type,
            critical: bp.critical,
        }));
    }
}

// ---------------------------------------------------------------------------
// Step 5: density fill
// ---------------------------------------------------------------------------

/// Top up each department with random internal edges until the
/// intra-density target is met or candidates run out. Candidate
/// enumeration is in template order; only the shuffle is random.
fn emit_density_fill(
    template: &IndustryTemplate,
    spec: &TemplateSpec,
    role_ids: &[String],
    added_edges: &mut BTreeSet<(String, String)>,
    emitter: &mut Emitter<'_>,
) {
    let valid: BTreeSet<&str> = role_ids.iter().map(String::as_str).collect();

    for dept in &template.departments {
        let dept_roles: Vec<&str> = dept
            .roles
            .iter()
            .map(|r| r.id.as_str())
            .filter(|id| valid.contains(id))
            .collect();
        let k = dept_roles.len() as i64;
        if k < 2 {
            continue;
        }

        // k is template-sized: these products stay far inside i64.
        let max_intra = k * (k - 1);
        let target_intra = spec.intra_density_target * max_intra / SCALE;
        let existing = added_edges
            .iter()
            .filter(|(a, b)| dept_roles.contains(&a.as_str()) && dept_roles.contains(&b.as_str()))
            .count() as i64;
        let needed = (target_intra - existing).max(0);
        if needed == 0 {
            continue;
        }

        let mut candidates: Vec<(&str, &str)> = Vec::new();
        for &a in &dept_roles {
            for &b in &dept_roles {
                if a != b && !added_edges.contains(&(a.to_string(), b.to_string())) {
                    candidates.push((a, b));
                }
            }
        }
        emitter.rng.shuffle(&mut candidates);

        for (from, to) in candidates.into_iter().take(needed as usize) {
            added_edges.insert((from.to_string(), to.to_string()));
            emitter.emit(EventKind::AddDependency(AddDependencyPayload {
                from_role_id: from.to_string(),
                to_role_id: to.to_string(),
                dependency_type: DependencyType::Operational,
                critical: false,
            }));
        }
    }
}

// ---------------------------------------------------------------------------
// Step 6: fragility
// ---------------------------------------------------------------------------

/// Concentrate the graph on the first emitted role: an edge from the
/// hub to every other role, critical unless a critical path already
/// runs back to the hub (which would close a critical cycle).
fn emit_fragility_edges(
    role_ids: &[String],
    added_edges: &mut BTreeSet<(String, String)>,
    critical_edges: &mut BTreeSet<(String, String)>,
    emitter: &mut Emitter<'_>,
) {
    let hub = &role_ids[0];

    for target in &role_ids[1..] {
        let pair = (hub.clone(), target.clone());
        if added_edges.contains(&pair) {
            continue;
        }
        added_edges.insert(pair.clone());

        let critical = !has_critical_path(target, hub, critical_edges);
        if critical {
            critical_edges.insert(pair);
        }
        emitter.emit(EventKind::AddDependency(AddDependencyPayload {
            from_role_id: hub.clone(),
            to_role_id: target.clone(),
            dependency_type: DependencyType::Operational,
            critical,
        }));
    }
}

/// BFS over the critical-edge subgraph built so far.
fn has_critical_path(source: &str, target: &str, critical_edges: &BTreeSet<(String, String)>) -> bool {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        if node == target {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        for (from, to) in critical_edges {
            if from == node && !visited.contains(to.as_str()) {
                queue.push_back(to);
            }
        }
    }
    false
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_template() -> IndustryTemplate {
        IndustryTemplate {
            industry: "test".to_string(),
            stage: "seed".to_string(),
            departments: vec![crate::DeptBlueprint {
                name: "Core".to_string(),
                roles: vec![
                    crate::RoleBlueprint {
                        id: "lead".to_string(),
                        name: "Lead".to_string(),
                        purpose: "Direction".to_string(),
                        responsibilities: vec!["steering".to_string()],
                        produced_outputs: vec![],
                        required_inputs: vec![],
                    },
                    crate::RoleBlueprint {
                        id: "hand".to_string(),
                        name: "Hand".to_string(),
                        purpose: "Execution".to_string(),
                        responsibilities: vec!["doing".to_string()],
                        produced_outputs: vec!["work_product".to_string()],
                        required_inputs: vec![],
                    },
                ],
            }],
            dependencies: vec![crate::DependencyBlueprint {
                from_role: "lead".to_string(),
                to_role: "hand".to_string(),
                dep_type: DependencyType::Operational,
                critical: true,
            }],
        }
    }

    #[test]
    fn test_constants_event_is_first() {
        let (events, _) = compile(&tiny_template(), &TemplateSpec::default(), 42).expect("compile");
        assert_eq!(events[0].sequence, 1);
        assert!(matches!(events[0].kind, EventKind::InitializeConstants(_)));
    }

    #[test]
    fn test_sequences_are_contiguous() {
        let (events, _) = compile(&tiny_template(), &TemplateSpec::default(), 42).expect("compile");
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.sequence, i as u64 + 1);
            assert_eq!(event.timestamp, format!("t{}", i + 1));
        }
    }

    #[test]
    fn test_missing_outputs_are_synthesized() {
        let (events, _) = compile(&tiny_template(), &TemplateSpec::default(), 42).expect("compile");
        let lead = events
            .iter()
            .find_map(|e| match &e.kind {
                EventKind::AddRole(p) if p.id == "lead" => Some(p.clone()),
                _ => None,
            })
            .expect("lead role emitted");
        // blueprint had no outputs: one is synthesized and self-consumed
        assert_eq!(lead.produced_outputs, vec!["output_lead"]);
        assert!(lead.required_inputs.contains(&"output_lead".to_string()));
    }

    #[test]
    fn test_department_map_covers_emitted_roles() {
        let (_, map) = compile(&tiny_template(), &TemplateSpec::default(), 42).expect("compile");
        assert_eq!(map.departments.len(), 1);
        assert_eq!(map.departments[0].name, "Core");
        assert_eq!(map.departments[0].role_ids, vec!["lead", "hand"]);
    }

    #[test]
    fn test_balanced_profile_emits_no_capacity_event() {
        let (events, _) = compile(&tiny_template(), &TemplateSpec::default(), 42).expect("compile");
        assert!(!events
            .iter()
            .any(|e| matches!(e.kind, EventKind::ApplyConstraintChange(_))));
    }

    #[test]
    fn test_duplicate_template_edges_skipped() {
        let mut template = tiny_template();
        template.dependencies.push(template.dependencies[0].clone());
        let (events, _) = compile(&template, &TemplateSpec::default(), 42).expect("compile");
        let edge_count = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::AddDependency(_)))
            .count();
        assert_eq!(edge_count, 1);
    }
}
