//! Event types for the organization kernel
//!
//! Events are pure data: they carry intent and payload only, and
//! contain zero transition logic. The eight kinds form a closed
//! algebraic sum so the transition dispatcher can match exhaustively.
//!
//! # Wire form
//!
//! The canonical wire form of an event is a map with `event_type`,
//! `timestamp` (opaque string), `sequence`, `logical_time`,
//! `payload`, and an optional `event_uuid`. Unknown type tags are
//! rejected on decode.

use crate::{DependencyType, EventDecodeError, ScaleStage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// EVENT TYPE TAG
// ============================================================================

/// Discriminant of the eight event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    InitializeConstants,
    AddRole,
    RemoveRole,
    DifferentiateRole,
    CompressRoles,
    ApplyConstraintChange,
    InjectShock,
    AddDependency,
}

impl EventType {
    /// Stable string tag used on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::InitializeConstants => "initialize_constants",
            EventType::AddRole => "add_role",
            EventType::RemoveRole => "remove_role",
            EventType::DifferentiateRole => "differentiate_role",
            EventType::CompressRoles => "compress_roles",
            EventType::ApplyConstraintChange => "apply_constraint_change",
            EventType::InjectShock => "inject_shock",
            EventType::AddDependency => "add_dependency",
        }
    }

    /// All known wire tags, used to distinguish `unknown_event_type`
    /// from `invalid_payload` during decode.
    pub const ALL: [EventType; 8] = [
        EventType::InitializeConstants,
        EventType::AddRole,
        EventType::RemoveRole,
        EventType::DifferentiateRole,
        EventType::CompressRoles,
        EventType::ApplyConstraintChange,
        EventType::InjectShock,
        EventType::AddDependency,
    ];
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// Payload of `initialize_constants`. Every field is optional; an
/// omitted field keeps the current value of that constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InitializeConstantsPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differentiation_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differentiation_min_capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_max_combined_responsibilities: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shock_deactivation_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shock_debt_base_multiplier: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppressed_differentiation_debt_increment: Option<i64>,
}

/// Payload of `add_role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRolePayload {
    pub id: String,
    pub name: String,
    pub purpose: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub required_inputs: Vec<String>,
    #[serde(default)]
    pub produced_outputs: Vec<String>,
    /// Defaults to the state's current lifecycle stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_stage: Option<ScaleStage>,
}

/// Payload of `remove_role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRolePayload {
    pub role_id: String,
}

/// Descriptor of one sub-role created by a differentiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRoleSpec {
    pub id: String,
    pub name: String,
    /// Defaults to the differentiated role's purpose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    /// Defaults to the differentiated role's required inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_inputs: Option<Vec<String>>,
    #[serde(default)]
    pub produced_outputs: Vec<String>,
}

/// Payload of `differentiate_role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferentiateRolePayload {
    pub role_id: String,
    #[serde(default)]
    pub new_roles: Vec<SubRoleSpec>,
}

/// Payload of `compress_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressRolesPayload {
    pub source_role_id: String,
    pub target_role_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_purpose: Option<String>,
}

/// Payload of `apply_constraint_change`. Omitted deltas default to 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConstraintDeltaPayload {
    #[serde(default)]
    pub capital_delta: i64,
    #[serde(default)]
    pub talent_delta: i64,
    #[serde(default)]
    pub time_delta: i64,
    #[serde(default)]
    pub political_cost_delta: i64,
}

/// Payload of `inject_shock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectShockPayload {
    pub target_role_id: String,
    pub magnitude: i64,
}

/// Payload of `add_dependency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDependencyPayload {
    pub from_role_id: String,
    pub to_role_id: String,
    #[serde(default)]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub critical: bool,
}

// ============================================================================
// EVENT SUM + ENVELOPE
// ============================================================================

/// The eight event kinds with their payloads. Adjacently tagged so
/// the wire form carries `event_type` + `payload` side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "payload", rename_all = "snake_case")]
pub enum EventKind {
    InitializeConstants(InitializeConstantsPayload),
    AddRole(AddRolePayload),
    RemoveRole(RemoveRolePayload),
    DifferentiateRole(DifferentiateRolePayload),
    CompressRoles(CompressRolesPayload),
    ApplyConstraintChange(ConstraintDeltaPayload),
    InjectShock(InjectShockPayload),
    AddDependency(AddDependencyPayload),
}

impl EventKind {
    /// Type tag of this kind.
    pub const fn event_type(&self) -> EventType {
        match self {
            EventKind::InitializeConstants(_) => EventType::InitializeConstants,
            EventKind::AddRole(_) => EventType::AddRole,
            EventKind::RemoveRole(_) => EventType::RemoveRole,
            EventKind::DifferentiateRole(_) => EventType::DifferentiateRole,
            EventKind::CompressRoles(_) => EventType::CompressRoles,
            EventKind::ApplyConstraintChange(_) => EventType::ApplyConstraintChange,
            EventKind::InjectShock(_) => EventType::InjectShock,
            EventKind::AddDependency(_) => EventType::AddDependency,
        }
    }
}

/// One event in an ordered stream.
///
/// `timestamp` is opaque to the engine. `sequence` is the monotonic
/// position gate: the engine only accepts `last + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub kind: EventKind,
    pub timestamp: String,
    pub sequence: u64,
    #[serde(default)]
    pub logical_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_uuid: Option<String>,
}

impl Event {
    /// Type tag of this event.
    pub const fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Canonical wire map of this event, as recorded into
    /// `event_history`. Serialization of this type cannot fail.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("event wire map serialization is infallible")
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode an event from an already-parsed JSON value.
///
/// The type tag is checked against the closed set first so that an
/// unknown tag surfaces as `unknown_event_type` rather than a generic
/// payload error.
pub fn decode_event_value(value: &Value) -> Result<Event, EventDecodeError> {
    let obj = value.as_object().ok_or_else(|| EventDecodeError::InvalidPayload {
        detail: "event must be a JSON object".to_string(),
    })?;
    let tag = obj
        .get("event_type")
        .and_then(Value::as_str)
        .ok_or_else(|| EventDecodeError::InvalidPayload {
            detail: "missing or non-string event_type".to_string(),
        })?;
    if !EventType::ALL.iter().any(|t| t.as_str() == tag) {
        return Err(EventDecodeError::UnknownEventType {
            event_type: tag.to_string(),
        });
    }
    serde_json::from_value(value.clone()).map_err(|e| EventDecodeError::InvalidPayload {
        detail: e.to_string(),
    })
}

/// Decode an event from JSON text.
pub fn decode_event(json: &str) -> Result<Event, EventDecodeError> {
    let value: Value = serde_json::from_str(json).map_err(|e| EventDecodeError::InvalidPayload {
        detail: format!("invalid JSON: {e}"),
    })?;
    decode_event_value(&value)
}

// ============================================================================
// TESTS
// ============================================================================
