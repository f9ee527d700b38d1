//! Error types for Lattice operations
//!
//! Every error that crosses the kernel boundary exposes a stable
//! `code()` string; the codes are part of the external contract and
//! must never be remapped by embedding services.

use crate::InvariantRule;
use std::path::PathBuf;
use thiserror::Error;

/// Checked-arithmetic errors. Overflow is treated as state corruption
/// and aborts the enclosing transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("integer overflow: {lhs} {op} {rhs}")]
    Overflow {
        op: &'static str,
        lhs: i64,
        rhs: i64,
    },
}

impl ArithmeticError {
    /// Stable error code.
    pub const fn code(&self) -> &'static str {
        "integer_overflow"
    }
}

/// Errors raised by individual transition handlers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("role ID collision: {role_id:?} already exists")]
    RoleCollision { role_id: String },

    #[error("role {role_id:?} does not exist")]
    MissingRole { role_id: String },

    #[error("self-loop not allowed: {role_id:?}")]
    SelfLoop { role_id: String },

    #[error(
        "compression would produce {combined} responsibilities, \
         exceeding compression_max_combined_responsibilities={max}"
    )]
    CompressionOverflow { combined: usize, max: i64 },

    #[error("negative constraint: {field} would become {value}")]
    NegativeConstraint { field: &'static str, value: i64 },

    #[error("invalid role ID {role_id:?}: must match [A-Za-z0-9_-]+")]
    InvalidRoleId { role_id: String },

    #[error("differentiate_role requires a non-empty new_roles list for {role_id:?}")]
    EmptyDifferentiation { role_id: String },

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl TransitionError {
    /// Stable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            TransitionError::RoleCollision { .. } => "role_collision",
            TransitionError::MissingRole { .. } => "missing_role",
            TransitionError::SelfLoop { .. } => "self_loop",
            TransitionError::CompressionOverflow { .. } => "compression_overflow",
            TransitionError::NegativeConstraint { .. } => "negative_constraint",
            TransitionError::InvalidRoleId { .. } => "invalid_payload",
            TransitionError::EmptyDifferentiation { .. } => "invalid_payload",
            TransitionError::Arithmetic(_) => "integer_overflow",
        }
    }
}

/// Violation of one of the seven organizational invariants.
///
/// The candidate state that produced the violation is discarded; the
/// engine's committed state is untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[invariant:{rule}] {detail}")]
pub struct InvariantViolation {
    pub rule: InvariantRule,
    pub detail: String,
}

impl InvariantViolation {
    /// Stable error code, `invariant:<rule>`.
    pub fn code(&self) -> String {
        format!("invariant:{}", self.rule.as_str())
    }
}

/// Errors surfaced by the engine's event gate and commit path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("sequence violation: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("first event must be initialize_constants, got {got:?}")]
    ConstantsNotInitialized { got: String },

    #[error("initialize_constants can only be the first event")]
    ConstantsAlreadyInitialized,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl EngineError {
    /// Stable error code.
    pub fn code(&self) -> String {
        match self {
            EngineError::SequenceViolation { .. } => "sequence_violation".to_string(),
            EngineError::ConstantsNotInitialized { .. } => "constants_not_initialized".to_string(),
            EngineError::ConstantsAlreadyInitialized => {
                "constants_already_initialized".to_string()
            }
            EngineError::Transition(e) => e.code().to_string(),
            EngineError::Invariant(v) => v.code(),
        }
    }
}

/// Errors raised while decoding an event from its wire form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventDecodeError {
    #[error("unknown event_type: {event_type:?}")]
    UnknownEventType { event_type: String },

    #[error("invalid event payload: {detail}")]
    InvalidPayload { detail: String },
}

impl EventDecodeError {
    /// Stable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            EventDecodeError::UnknownEventType { .. } => "unknown_event_type",
            EventDecodeError::InvalidPayload { .. } => "invalid_payload",
        }
    }
}

/// Errors raised by the snapshot codec.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot decode failed at {path}: {detail}")]
    Decode { path: String, detail: String },

    #[error("invariant violation during snapshot restore: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SnapshotError {
    /// Stable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            SnapshotError::Decode { .. } | SnapshotError::Io { .. } => "snapshot:decode",
            SnapshotError::Invariant(_) => "snapshot:invariant",
        }
    }

    /// Decode failure at a path-like location inside the JSON tree.
    pub fn decode(path: impl Into<String>, detail: impl Into<String>) -> Self {
        SnapshotError::Decode {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Errors raised by the deterministic generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("generated stream failed replay: {0}")]
    Replay(#[from] EngineError),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl GeneratorError {
    /// Stable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            GeneratorError::Replay(_) => "generator:invariant",
            GeneratorError::Arithmetic(_) => "integer_overflow",
        }
    }
}

/// Errors raised while assembling a department projection view.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("active roles {unassigned:?} are not assigned to any department")]
    UnassignedRoles { unassigned: Vec<String> },

    #[error("empty department: {department_id}")]
    EmptyDepartment { department_id: String },

    #[error("inter-department edge ({from}, {to}) references an unknown department id")]
    InvalidInterDepartmentEdge { from: String, to: String },

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

// ============================================================================
// TESTS
// ============================================================================
