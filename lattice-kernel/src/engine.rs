//! Ordered, gated replay engine
//!
//! Wraps the pure transition layer with sequence enforcement, the
//! constants-first gate, invariant validation, and atomic commit.
//! Mutation is never observable unless the transition and every
//! invariant succeed.

use crate::diagnostics::{compute_diagnostics, Diagnostics};
use crate::invariants::validate_invariants;
use crate::state::{initial_state, StateParams};
use crate::transitions;
use lattice_core::{ArithmeticError, EngineError, Event, EventType, OrgState, TransitionResult};

/// Stateful engine owning one organizational state.
///
/// Constraints enforced on every event:
///   - sequence numbers strictly increase from 1, no gaps, no
///     duplicates
///   - the first committed event must be `initialize_constants`, and
///     no later event may be
///
/// Two engines never share state; replay is a pure function of the
/// event stream and the construction parameters.
#[derive(Debug, Clone)]
pub struct OrgEngine {
    params: StateParams,
    state: OrgState,
    last_sequence: u64,
    constants_initialized: bool,
}

impl Default for OrgEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OrgEngine {
    /// Engine with default starting constraints.
    pub fn new() -> Self {
        Self::with_params(StateParams::default())
    }

    /// Engine with configurable starting constraint values.
    pub fn with_params(params: StateParams) -> Self {
        let state = initial_state(&params);
        Self {
            params,
            state,
            last_sequence: 0,
            constants_initialized: false,
        }
    }

    /// The committed state.
    pub fn state(&self) -> &OrgState {
        &self.state
    }

    /// Sequence number of the last committed event, 0 before any.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Reset to a fresh initial state built from the engine's
    /// construction parameters.
    pub fn reset(&mut self) -> &OrgState {
        self.state = initial_state(&self.params);
        self.last_sequence = 0;
        self.constants_initialized = false;
        &self.state
    }

    /// Apply a single event.
    ///
    /// Validation order: sequence gate, constants-first gate,
    /// transition, seven-invariant battery, commit. On any failure
    /// the committed state and sequence counter are untouched.
    pub fn apply_event(&mut self, event: &Event) -> Result<TransitionResult, EngineError> {
        let expected = self.last_sequence + 1;
        if event.sequence != expected {
            return Err(EngineError::SequenceViolation {
                expected,
                got: event.sequence,
            });
        }

        let is_init = event.event_type() == EventType::InitializeConstants;
        if !self.constants_initialized {
            if !is_init {
                return Err(EngineError::ConstantsNotInitialized {
                    got: event.event_type().as_str().to_string(),
                });
            }
        } else if is_init {
            return Err(EngineError::ConstantsAlreadyInitialized);
        }

        let (new_state, result) = transitions::apply_transition(&self.state, event)?;
        validate_invariants(&new_state)?;

        // Commit. The constants flag also only advances here, so a
        // failed first event leaves the gate open for a retry.
        self.state = new_state;
        self.last_sequence = event.sequence;
        if is_init {
            self.constants_initialized = true;
        }
        Ok(result)
    }

    /// Apply an ordered batch of events against the current state.
    /// The first failure aborts; prior commits are kept.
    pub fn apply_all(&mut self, events: &[Event]) -> Result<&OrgState, EngineError> {
        for event in events {
            self.apply_event(event)?;
        }
        Ok(&self.state)
    }

    /// Event-sourced reconstruction: reset to a fresh initial state,
    /// then apply every event in order. The first failure aborts the
    /// replay; there is no skip-and-continue mode.
    pub fn replay(&mut self, events: &[Event]) -> Result<&OrgState, EngineError> {
        self.reset();
        for event in events {
            self.apply_event(event)?;
        }
        Ok(&self.state)
    }

    /// Diagnostic summary of the committed state.
    pub fn diagnostics(&self) -> Result<Diagnostics, ArithmeticError> {
        compute_diagnostics(&self.state)
    }
}

// ============================================================================
// TESTS
// ============================================================================
