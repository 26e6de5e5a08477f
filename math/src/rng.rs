//! Bit-exact pseudo-random integers reproducing a legacy overflow formula.
//!
//! [`random`] is a pure function of `(min, max, seed, frame)`. Its constants
//! and the order of every multiply and add are load-bearing: each step wraps
//! at the 32-bit boundary, and reordering the terms changes the intermediate
//! overflow and therefore the output. Do not simplify the arithmetic.

use crate::gate::TableGate;

/// Inputs below this bound are served by the square-root lookup table.
pub const SQRT_TABLE_SIZE: usize = 65_536;

const BASE: i32 = 1000;
const SEED_RANGE_FACTOR: i32 = 133_333_333;
const SEED_FACTOR: i32 = 13_131_313;
const FRAME_SEED_FACTOR: i32 = 13_131_313;
const FRAME_FACTOR: i32 = 1_313_131_313;

static SQRT_TABLE: TableGate<SqrtTable> = TableGate::new(SqrtTable::build);

/// Draws a deterministic integer in `[min, max)`.
///
/// A degenerate range (`min >= max`) yields `min` unchanged.
#[must_use]
pub fn random(min: i32, max: i32, seed: i32, frame: i32) -> i32 {
    if min >= max {
        return min;
    }

    let range = max.wrapping_sub(min);

    let mut accumulator = BASE;
    accumulator =
        accumulator.wrapping_add(seed.wrapping_mul(SEED_RANGE_FACTOR).wrapping_mul(range));
    accumulator = accumulator.wrapping_add(seed.wrapping_mul(SEED_FACTOR));
    accumulator =
        accumulator.wrapping_add(seed.wrapping_mul(frame.wrapping_mul(FRAME_SEED_FACTOR)));
    accumulator = accumulator.wrapping_add(frame.wrapping_mul(FRAME_FACTOR));
    accumulator = accumulator.wrapping_add(frame.wrapping_rem(10));

    // Sign-preserving remainder is folded by negation, never by adding `range`.
    let mut result = accumulator.wrapping_rem(range);
    if result < 0 {
        result = result.wrapping_neg();
    }

    result.wrapping_add(min)
}

/// Seed-bound view over [`random`] for callers that draw once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeterministicRng {
    seed: i32,
}

impl DeterministicRng {
    /// Binds the generator to the provided seed.
    #[must_use]
    pub const fn new(seed: i32) -> Self {
        Self { seed }
    }

    /// Seed supplied at construction.
    #[must_use]
    pub const fn seed(&self) -> i32 {
        self.seed
    }

    /// Draws a value in `[min, max)` for the provided frame.
    #[must_use]
    pub fn range(&self, min: i32, max: i32, frame: i32) -> i32 {
        random(min, max, self.seed, frame)
    }
}

#[derive(Debug)]
struct SqrtTable {
    roots: Vec<u16>,
}

impl SqrtTable {
    fn build() -> Self {
        let roots = (0..SQRT_TABLE_SIZE)
            .map(|value| (value as f64).sqrt().round() as u16)
            .collect();
        Self { roots }
    }
}

/// Builds the process-wide square-root table if it has not been built yet.
pub fn initialize() {
    let _ = SQRT_TABLE.ensure_ready();
}

/// Discards the square-root table so the next access rebuilds it.
///
/// Intended for tests.
pub fn reset() {
    SQRT_TABLE.reset();
}

/// Number of times the square-root table has been filled since process start.
#[must_use]
pub fn sqrt_fill_count() -> usize {
    SQRT_TABLE.fill_count()
}

/// Integer square root rounded to nearest.
///
/// Values below [`SQRT_TABLE_SIZE`] are looked up; larger values fall back to
/// a rounded real square root. Negative inputs yield zero.
#[must_use]
pub fn sqrt_int(value: i32) -> i32 {
    if value < 0 {
        return 0;
    }

    let table = SQRT_TABLE.ensure_ready();
    match table.roots.get(value as usize) {
        Some(root) => i32::from(*root),
        None => f64::from(value).sqrt().round() as i32,
    }
}

/// Restricts `value` to `[lo, hi]`.
#[must_use]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Linear interpolation between `a` and `b`.
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
