//! Fixed-point arithmetic
//!
//! All monetary, capacity, and density figures in the kernel are
//! signed 64-bit integers in units of 1/SCALE. Floats never appear in
//! state, transition rules, hashes, or wire payloads.

use crate::ArithmeticError;

/// The fixed-point unit. `SCALE` represents the real number 1.0.
pub const SCALE: i64 = 10_000;

/// Addition with overflow check. Overflow is a terminal error that
/// aborts the enclosing transition.
pub fn checked_add(a: i64, b: i64) -> Result<i64, ArithmeticError> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow {
        op: "+",
        lhs: a,
        rhs: b,
    })
}

/// Multiplication with overflow check.
pub fn checked_mul(a: i64, b: i64) -> Result<i64, ArithmeticError> {
    a.checked_mul(b).ok_or(ArithmeticError::Overflow {
        op: "*",
        lhs: a,
        rhs: b,
    })
}

// ============================================================================
// TESTS
// ============================================================================
