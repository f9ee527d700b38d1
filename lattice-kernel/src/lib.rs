//! Lattice Kernel - Deterministic Transition Engine
//!
//! The event-sourced core: ordered replay with sequence and
//! constants-first enforcement, pure-integer transition rules, seven
//! invariants validated after every transition, a canonical
//! serializer/hasher, a strict snapshot codec, and pure diagnostics.
//!
//! Two engines replaying the same stream produce byte-identical
//! canonical serializations; the SHA-256 of those bytes is the
//! cross-implementation identity of a state.

mod canonical_json;
mod diagnostics;
mod engine;
mod graph;
mod hashing;
mod invariants;
mod snapshot;
mod state;
mod transitions;

pub use canonical_json::*;
pub use diagnostics::*;
pub use engine::*;
pub use graph::*;
pub use hashing::*;
pub use invariants::*;
pub use snapshot::*;
pub use state::*;
pub use transitions::*;
