//! Lattice Gen - Deterministic Stream Generator
//!
//! Compiles an industry blueprint plus a numeric spec into a
//! replay-valid event stream. All randomness flows through one seeded
//! PRNG; identical `(template, spec, seed)` inputs always produce a
//! byte-identical stream and therefore an identical canonical state
//! hash. The compiler replays its own output before returning it.

mod compiler;
mod rng;
mod template;
mod verify;

pub use compiler::*;
pub use rng::*;
pub use template::*;
pub use verify::*;
