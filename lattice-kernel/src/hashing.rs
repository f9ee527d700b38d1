//! Canonical serialization + SHA-256 hashing
//!
//! A total function from state to bytes with fixed field order,
//! sorted collections, and no floating point. The lowercase hex
//! SHA-256 of those bytes is the content address of the state: two
//! states are equivalent iff their hashes match, across platforms
//! and across implementations.
//!
//! `event_history` is not part of the canonical form.

use crate::canonical_json::to_ascii_json_bytes;
use lattice_core::OrgState;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Version tag baked into every canonical serialization.
pub const KERNEL_VERSION: i64 = 1;

// Field order in these structs IS the canonical field order.

#[derive(Serialize)]
struct CanonicalRole<'a> {
    id: &'a str,
    name: &'a str,
    purpose: &'a str,
    responsibilities: Vec<&'a str>,
    required_inputs: Vec<&'a str>,
    produced_outputs: Vec<&'a str>,
    scale_stage: &'a str,
    active: bool,
}

#[derive(Serialize)]
struct CanonicalDependency<'a> {
    from_role_id: &'a str,
    to_role_id: &'a str,
    dependency_type: &'a str,
    critical: bool,
}

#[derive(Serialize)]
struct CanonicalConstraints {
    capital: i64,
    talent: i64,
    time: i64,
    political_cost: i64,
}

#[derive(Serialize)]
struct CanonicalState<'a> {
    kernel_version: i64,
    roles: Vec<CanonicalRole<'a>>,
    dependencies: Vec<CanonicalDependency<'a>>,
    constraint_vector: CanonicalConstraints,
    structural_debt: i64,
    scale_stage: &'a str,
}

fn sorted_refs(items: &[String]) -> Vec<&str> {
    let mut refs: Vec<&str> = items.iter().map(String::as_str).collect();
    refs.sort_unstable();
    refs
}

/// Canonical serialization of a state to ASCII JSON bytes.
///
/// No whitespace, no floats, no trailing newline; roles sorted by id,
/// dependencies sorted by (from, to, type) with duplicates preserved.
pub fn canonical_serialize(state: &OrgState) -> Vec<u8> {
    let roles: Vec<CanonicalRole<'_>> = state
        .roles
        .values()
        .map(|r| CanonicalRole {
            id: &r.id,
            name: &r.name,
            purpose: &r.purpose,
            responsibilities: sorted_refs(&r.responsibilities),
            required_inputs: sorted_refs(&r.required_inputs),
            produced_outputs: sorted_refs(&r.produced_outputs),
            scale_stage: r.scale_stage.as_str(),
            active: r.active,
        })
        .collect();

    let mut dependencies: Vec<CanonicalDependency<'_>> = state
        .dependencies
        .iter()
        .map(|d| CanonicalDependency {
            from_role_id: &d.from_role_id,
            to_role_id: &d.to_role_id,
            dependency_type: d.dependency_type.as_str(),
            critical: d.critical,
        })
        .collect();
    // Stable sort keeps duplicate edges in their original order.
    dependencies.sort_by(|a, b| {
        (a.from_role_id, a.to_role_id, a.dependency_type)
            .cmp(&(b.from_role_id, b.to_role_id, b.dependency_type))
    });

    let canonical = CanonicalState {
        kernel_version: KERNEL_VERSION,
        roles,
        dependencies,
        constraint_vector: CanonicalConstraints {
            capital: state.constraint_vector.capital,
            talent: state.constraint_vector.talent,
            time: state.constraint_vector.time,
            political_cost: state.constraint_vector.political_cost,
        },
        structural_debt: state.structural_debt,
        scale_stage: state.scale_stage.as_str(),
    };

    to_ascii_json_bytes(&canonical).expect("canonical serialization is infallible")
}

/// SHA-256 of the canonical serialization. Lowercase hex, 64 chars.
pub fn canonical_hash(state: &OrgState) -> String {
    hex::encode(Sha256::digest(canonical_serialize(state)))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::{DependencyEdge, DependencyType, Role, ScaleStage};

    fn role(id: &str) -> Role {
        Role {
            id: id.to_string(),
            name: format!("Role {id}"),
            purpose: "purpose".to_string(),
            responsibilities: vec!["b_resp".to_string(), "a_resp".to_string()],
            required_inputs: vec![],
            produced_outputs: vec![],
            scale_stage: ScaleStage::Seed,
            active: true,
        }
    }

    fn sample_state() -> OrgState {
        let mut state = OrgState::default();
        state.roles.insert("beta".to_string(), role("beta"));
        state.roles.insert("alpha".to_string(), role("alpha"));
        state.dependencies.push(DependencyEdge {
            from_role_id: "beta".to_string(),
            to_role_id: "alpha".to_string(),
            dependency_type: DependencyType::Operational,
            critical: false,
        });
        state.dependencies.push(DependencyEdge {
            from_role_id: "alpha".to_string(),
            to_role_id: "beta".to_string(),
            dependency_type: DependencyType::Governance,
            critical: true,
        });
        state
    }

    #[test]
    fn test_field_order_and_sorting() {
        let bytes = canonical_serialize(&sample_state());
        let text = String::from_utf8(bytes).expect("ascii");
        assert!(text.starts_with("{\"kernel_version\":1,\"roles\":[{\"id\":\"alpha\""));
        // responsibilities are re-sorted in the canonical form
        assert!(text.contains("\"responsibilities\":[\"a_resp\",\"b_resp\"]"));
        // dependency sorted by (from, to, type): alpha edge first
        let alpha_dep = text.find("\"from_role_id\":\"alpha\"").expect("alpha dep");
        let beta_dep = text.find("\"from_role_id\":\"beta\"").expect("beta dep");
        assert!(alpha_dep < beta_dep);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_hash_is_stable_and_lowercase() {
        let state = sample_state();
        let h1 = canonical_hash(&state);
        let h2 = canonical_hash(&state);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_event_history_excluded() {
        let mut a = sample_state();
        let mut b = sample_state();
        b.event_history.push(serde_json::json!({"event_type": "add_role"}));
        assert_eq!(canonical_hash(&a), canonical_hash(&b));
        // but a real state difference changes the hash
        a.structural_debt = 7;
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn test_no_float_markers() {
        let bytes = canonical_serialize(&sample_state());
        let text = String::from_utf8(bytes).expect("ascii");
        assert!(!text.contains('.'));
        assert!(!text.contains("e+") && !text.contains("e-") && !text.contains('E'));
    }

    #[test]
    fn test_duplicate_edges_preserved() {
        let mut state = sample_state();
        state.dependencies.push(state.dependencies[0].clone());
        let text = String::from_utf8(canonical_serialize(&state)).expect("ascii");
        assert_eq!(text.matches("\"from_role_id\":\"beta\"").count(), 2);
    }
}
