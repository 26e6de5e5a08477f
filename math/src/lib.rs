#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic math primitives shared by every lockstep participant.
//!
//! Everything in this crate must produce bit-identical results on every
//! platform and compilation target. Arithmetic is expressed over
//! [`Fixed`] values with explicit 32-bit wrapping semantics, trigonometry is
//! served from a precomputed table, and random numbers come from a legacy
//! integer formula that relies on two's-complement overflow.

mod gate;

pub mod fixed;
pub mod rng;
pub mod trig;
pub mod vector;

pub use fixed::{DomainError, Fixed};
pub use rng::DeterministicRng;
pub use trig::TrigTable;
pub use vector::Vector2;
