//! Verification harness
//!
//! Compile, replay, and summarize a generated stream in one call.
//! Useful for smoke-testing blueprint/spec combinations and for
//! asserting the determinism contract end to end.

use crate::compiler::compile;
use crate::template::{IndustryTemplate, TemplateSpec};
use lattice_core::GeneratorError;
use lattice_kernel::{canonical_hash, Diagnostics, OrgEngine};
use serde::Serialize;
use tracing::debug;

/// Outcome of one compile-and-replay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub final_state_hash: String,
    pub diagnostics: Diagnostics,
    pub role_count: usize,
    pub structural_debt: i64,
}

/// Compile a blueprint, replay the stream, and report on the final
/// state.
pub fn verify_template(
    template: &IndustryTemplate,
    spec: &TemplateSpec,
    seed: u64,
) -> Result<VerifyReport, GeneratorError> {
    let (events, _) = compile(template, spec, seed)?;

    let mut engine = OrgEngine::new();
    engine.replay(&events)?;

    let state = engine.state();
    let report = VerifyReport {
        final_state_hash: canonical_hash(state),
        diagnostics: engine.diagnostics()?,
        role_count: state.roles.len(),
        structural_debt: state.structural_debt,
    };
    debug!(hash = %report.final_state_hash, roles = report.role_count, "verified generated stream");
    Ok(report)
}
