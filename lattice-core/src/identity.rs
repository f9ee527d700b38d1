//! Role identifier validation
//!
//! Role ids are plain strings, but the kernel only accepts the ASCII
//! alphabet `[A-Za-z0-9_-]+`. Validation runs at the entry of every
//! operation that introduces a new id; invariant checking re-verifies
//! the whole state after each transition.

use crate::TransitionError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern every role id must match. ASCII-only by construction.
pub static ROLE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("role id pattern is a valid regex"));

/// Check whether a string is a well-formed role id.
pub fn is_valid_role_id(role_id: &str) -> bool {
    ROLE_ID_PATTERN.is_match(role_id)
}

/// Validate a role id at an operation boundary. Hard fail.
pub fn validate_role_id(role_id: &str) -> Result<(), TransitionError> {
    if is_valid_role_id(role_id) {
        Ok(())
    } else {
        Err(TransitionError::InvalidRoleId {
            role_id: role_id.to_string(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
