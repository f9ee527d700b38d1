//! Snapshot encoder / decoder
//!
//! Canonical JSON serialization of the *full* state, event history
//! included, with all object keys sorted. Snapshots exist for
//! comparison and inspection only; canonical state is always rebuilt
//! by replay.
//!
//! Decoding is strict: exact field whitelists, a recursive float ban,
//! int64 bounds on every integer, no defaults, no coercion, no silent
//! repair. Every error carries the path of the offending node.

use crate::canonical_json::to_ascii_json_string;
use crate::invariants::validate_invariants;
use lattice_core::{
    ConstraintVector, DependencyEdge, DependencyType, DomainConstants, OrgState, Role, ScaleStage,
    SnapshotError,
};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

// ── Field whitelists (exact sets, no extras, no omissions) ──

const SNAPSHOT_FIELDS: [&str; 7] = [
    "constants",
    "constraint_vector",
    "dependencies",
    "event_history",
    "roles",
    "scale_stage",
    "structural_debt",
];

const ROLE_FIELDS: [&str; 8] = [
    "active",
    "id",
    "name",
    "produced_outputs",
    "purpose",
    "required_inputs",
    "responsibilities",
    "scale_stage",
];

const DEP_FIELDS: [&str; 4] = ["critical", "dependency_type", "from_role_id", "to_role_id"];

const CONSTRAINT_FIELDS: [&str; 4] = ["capital", "political_cost", "talent", "time"];

const CONSTANTS_FIELDS: [&str; 6] = [
    "compression_max_combined_responsibilities",
    "differentiation_min_capacity",
    "differentiation_threshold",
    "shock_deactivation_threshold",
    "shock_debt_base_multiplier",
    "suppressed_differentiation_debt_increment",
];

// ============================================================================
// ENCODER
// ============================================================================

/// Serialize a state into its snapshot form.
///
/// Byte-identical output for identical states: compact, ASCII-only,
/// every object's keys sorted. No mutation, no validation.
pub fn encode_snapshot(state: &OrgState) -> String {
    let mut roles = Map::new();
    for (rid, r) in &state.roles {
        roles.insert(
            rid.clone(),
            json!({
                "active": r.active,
                "id": r.id,
                "name": r.name,
                "produced_outputs": sorted(&r.produced_outputs),
                "purpose": r.purpose,
                "required_inputs": sorted(&r.required_inputs),
                "responsibilities": sorted(&r.responsibilities),
                "scale_stage": r.scale_stage.as_str(),
            }),
        );
    }

    let mut deps: Vec<&DependencyEdge> = state.dependencies.iter().collect();
    deps.sort_by_key(|d| {
        (
            d.from_role_id.as_str(),
            d.to_role_id.as_str(),
            d.dependency_type.as_str(),
            d.critical,
        )
    });
    let deps: Vec<Value> = deps
        .into_iter()
        .map(|d| {
            json!({
                "critical": d.critical,
                "dependency_type": d.dependency_type.as_str(),
                "from_role_id": d.from_role_id,
                "to_role_id": d.to_role_id,
            })
        })
        .collect();

    let snapshot = json!({
        "constants": {
            "compression_max_combined_responsibilities":
                state.constants.compression_max_combined_responsibilities,
            "differentiation_min_capacity": state.constants.differentiation_min_capacity,
            "differentiation_threshold": state.constants.differentiation_threshold,
            "shock_deactivation_threshold": state.constants.shock_deactivation_threshold,
            "shock_debt_base_multiplier": state.constants.shock_debt_base_multiplier,
            "suppressed_differentiation_debt_increment":
                state.constants.suppressed_differentiation_debt_increment,
        },
        "constraint_vector": {
            "capital": state.constraint_vector.capital,
            "political_cost": state.constraint_vector.political_cost,
            "talent": state.constraint_vector.talent,
            "time": state.constraint_vector.time,
        },
        "dependencies": deps,
        "event_history": state.event_history,
        "roles": Value::Object(roles),
        "scale_stage": state.scale_stage.as_str(),
        "structural_debt": state.structural_debt,
    });

    to_ascii_json_string(&snapshot).expect("snapshot serialization is infallible")
}

fn sorted(items: &[String]) -> Vec<String> {
    let mut out = items.to_vec();
    out.sort_unstable();
    out
}

// ============================================================================
// DECODER
// ============================================================================

/// Strict deserialization of snapshot JSON into a state.
///
/// Fails on missing fields, unknown fields, role-key/role-id
/// mismatches, floats anywhere in the tree, and integers outside the
/// signed 64-bit range. Never injects defaults.
pub fn decode_snapshot(text: &str) -> Result<OrgState, SnapshotError> {
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| SnapshotError::decode("$", format!("invalid JSON: {e}")))?;

    assert_no_floats(&raw, "$")?;

    let obj = require_object(&raw, "$")?;
    check_fields(obj, &SNAPSHOT_FIELDS, "$")?;

    // -- Roles --
    let raw_roles = require_object(&obj["roles"], "$.roles")?;
    let mut roles: BTreeMap<String, Role> = BTreeMap::new();
    let mut seen_ids: BTreeSet<&str> = BTreeSet::new();
    for (key, rdata) in raw_roles {
        let path = format!("$.roles.{key}");
        let robj = require_object(rdata, &path)?;
        check_fields(robj, &ROLE_FIELDS, &path)?;

        let role_id = require_str(robj, "id", &path)?;
        if role_id != key.as_str() {
            return Err(SnapshotError::decode(
                &path,
                format!("role key {key:?} does not match role.id {role_id:?}"),
            ));
        }
        if !seen_ids.insert(role_id) {
            return Err(SnapshotError::decode(
                &path,
                format!("duplicate role ID {role_id:?}"),
            ));
        }

        roles.insert(
            key.clone(),
            Role {
                id: role_id.to_string(),
                name: require_str(robj, "name", &path)?.to_string(),
                purpose: require_str(robj, "purpose", &path)?.to_string(),
                responsibilities: require_string_list(robj, "responsibilities", &path)?,
                required_inputs: require_string_list(robj, "required_inputs", &path)?,
                produced_outputs: require_string_list(robj, "produced_outputs", &path)?,
                scale_stage: require_stage(robj, "scale_stage", &path)?,
                active: require_bool(robj, "active", &path)?,
            },
        );
    }

    // -- Dependencies --
    let raw_deps = obj["dependencies"]
        .as_array()
        .ok_or_else(|| SnapshotError::decode("$.dependencies", "must be a JSON array"))?;
    let mut dependencies: Vec<DependencyEdge> = Vec::with_capacity(raw_deps.len());
    for (i, ddata) in raw_deps.iter().enumerate() {
        let path = format!("$.dependencies[{i}]");
        let dobj = require_object(ddata, &path)?;
        check_fields(dobj, &DEP_FIELDS, &path)?;
        let dep_type = require_str(dobj, "dependency_type", &path)?;
        dependencies.push(DependencyEdge {
            from_role_id: require_str(dobj, "from_role_id", &path)?.to_string(),
            to_role_id: require_str(dobj, "to_role_id", &path)?.to_string(),
            dependency_type: DependencyType::from_str(dep_type)
                .map_err(|e| SnapshotError::decode(&path, e))?,
            critical: require_bool(dobj, "critical", &path)?,
        });
    }

    // -- ConstraintVector --
    let cv_obj = require_object(&obj["constraint_vector"], "$.constraint_vector")?;
    check_fields(cv_obj, &CONSTRAINT_FIELDS, "$.constraint_vector")?;
    let constraint_vector = ConstraintVector {
        capital: require_i64(cv_obj, "capital", "$.constraint_vector")?,
        talent: require_i64(cv_obj, "talent", "$.constraint_vector")?,
        time: require_i64(cv_obj, "time", "$.constraint_vector")?,
        political_cost: require_i64(cv_obj, "political_cost", "$.constraint_vector")?,
    };

    // -- DomainConstants --
    let const_obj = require_object(&obj["constants"], "$.constants")?;
    check_fields(const_obj, &CONSTANTS_FIELDS, "$.constants")?;
    let constants = DomainConstants {
        differentiation_threshold: require_i64(
            const_obj,
            "differentiation_threshold",
            "$.constants",
        )?,
        differentiation_min_capacity: require_i64(
            const_obj,
            "differentiation_min_capacity",
            "$.constants",
        )?,
        compression_max_combined_responsibilities: require_i64(
            const_obj,
            "compression_max_combined_responsibilities",
            "$.constants",
        )?,
        shock_deactivation_threshold: require_i64(
            const_obj,
            "shock_deactivation_threshold",
            "$.constants",
        )?,
        shock_debt_base_multiplier: require_i64(
            const_obj,
            "shock_debt_base_multiplier",
            "$.constants",
        )?,
        suppressed_differentiation_debt_increment: require_i64(
            const_obj,
            "suppressed_differentiation_debt_increment",
            "$.constants",
        )?,
    };

    // -- Scalars --
    let scale_stage_str = obj["scale_stage"]
        .as_str()
        .ok_or_else(|| SnapshotError::decode("$.scale_stage", "must be a string"))?;
    let scale_stage =
        ScaleStage::from_str(scale_stage_str).map_err(|e| SnapshotError::decode("$.scale_stage", e))?;

    let structural_debt = require_i64(obj, "structural_debt", "$")?;

    let event_history = obj["event_history"]
        .as_array()
        .ok_or_else(|| SnapshotError::decode("$.event_history", "must be a JSON array"))?
        .clone();

    Ok(OrgState {
        roles,
        dependencies,
        constraint_vector,
        constants,
        scale_stage,
        structural_debt,
        event_history,
    })
}

// ============================================================================
// RESTORE (decode + validate)
// ============================================================================

/// Decode a snapshot and immediately run the full invariant battery.
///
/// The underlying invariant rule name is preserved in the error.
pub fn restore_snapshot(text: &str) -> Result<OrgState, SnapshotError> {
    let state = decode_snapshot(text)?;
    validate_invariants(&state)?;
    Ok(state)
}

// ============================================================================
// FILE I/O
// ============================================================================

/// Write exactly the in-memory snapshot bytes to a file, UTF-8.
pub fn export_snapshot(state: &OrgState, path: &Path) -> Result<(), SnapshotError> {
    std::fs::write(path, encode_snapshot(state)).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a snapshot file and restore it (decode + invariants).
pub fn import_snapshot(path: &Path) -> Result<OrgState, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    restore_snapshot(&text)
}

// ============================================================================
// INTEGRITY HASH
// ============================================================================

/// SHA-256 of the snapshot encoding, lowercase hex.
///
/// Distinct from the canonical state hash: the snapshot form includes
/// event history.
pub fn snapshot_hash(state: &OrgState) -> String {
    hex::encode(Sha256::digest(encode_snapshot(state).as_bytes()))
}

// ============================================================================
// VALIDATION HELPERS
// ============================================================================

// The require_* helpers index into the map directly; callers must run
// check_fields on the object first so every expected key is present.

fn check_fields(obj: &Map<String, Value>, expected: &[&str], context: &str) -> Result<(), SnapshotError> {
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|f| !obj.contains_key(*f))
        .collect();
    if !missing.is_empty() {
        return Err(SnapshotError::decode(
            context,
            format!("missing fields: {missing:?}"),
        ));
    }
    let mut unknown: Vec<&str> = obj
        .keys()
        .map(String::as_str)
        .filter(|k| !expected.contains(k))
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        return Err(SnapshotError::decode(
            context,
            format!("unknown fields: {unknown:?}"),
        ));
    }
    Ok(())
}

fn require_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SnapshotError> {
    value
        .as_object()
        .ok_or_else(|| SnapshotError::decode(path, "must be a JSON object"))
}

fn require_str<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a str, SnapshotError> {
    obj[key]
        .as_str()
        .ok_or_else(|| SnapshotError::decode(format!("{path}.{key}"), "must be a string"))
}

fn require_bool(obj: &Map<String, Value>, key: &str, path: &str) -> Result<bool, SnapshotError> {
    obj[key]
        .as_bool()
        .ok_or_else(|| SnapshotError::decode(format!("{path}.{key}"), "must be a boolean"))
}

fn require_i64(obj: &Map<String, Value>, key: &str, path: &str) -> Result<i64, SnapshotError> {
    let value = &obj[key];
    if !value.is_number() {
        return Err(SnapshotError::decode(
            format!("{path}.{key}"),
            "must be an integer",
        ));
    }
    // Floats were rejected up front, so a non-i64 number here is an
    // integer outside the signed 64-bit range.
    value.as_i64().ok_or_else(|| {
        SnapshotError::decode(format!("{path}.{key}"), format!("value out of int64 range: {value}"))
    })
}

fn require_string_list(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Vec<String>, SnapshotError> {
    let arr = obj[key]
        .as_array()
        .ok_or_else(|| SnapshotError::decode(format!("{path}.{key}"), "must be a JSON array"))?;
    arr.iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                SnapshotError::decode(format!("{path}.{key}[{i}]"), "must be a string")
            })
        })
        .collect()
}

fn require_stage(obj: &Map<String, Value>, key: &str, path: &str) -> Result<ScaleStage, SnapshotError> {
    let raw = require_str(obj, key, path)?;
    ScaleStage::from_str(raw).map_err(|e| SnapshotError::decode(format!("{path}.{key}"), e))
}

/// Recursively reject every float literal in the parsed tree.
fn assert_no_floats(value: &Value, path: &str) -> Result<(), SnapshotError> {
    match value {
        Value::Number(n) if n.is_f64() => Err(SnapshotError::decode(
            path,
            format!("float detected: {n}, floats are prohibited"),
        )),
        Value::Object(map) => {
            for (k, v) in map {
                assert_no_floats(v, &format!("{path}.{k}"))?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                assert_no_floats(v, &format!("{path}[{i}]"))?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
