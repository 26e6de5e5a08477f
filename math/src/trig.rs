//! Lookup-table trigonometry over fixed-point degrees.
//!
//! Angles are [`Fixed`] values measured in degrees, so a full turn spans
//! `360 * Fixed::ONE`. The sine table is built once per process behind an
//! explicit gate: [`initialize`] and [`ensure_ready`] are idempotent, and
//! [`reset`] discards the table so tests can observe a fresh fill.

use std::sync::Arc;

use crate::{fixed::Fixed, gate::TableGate};

/// Number of entries in the sine table.
pub const TABLE_SIZE: usize = 4096;

const TABLE_MASK: i32 = TABLE_SIZE as i32 - 1;

// A full turn is 360 * 65536 raw units spread over 4096 entries.
const RAW_UNITS_PER_INDEX: i32 = 360 * 65_536 / TABLE_SIZE as i32;

// A quarter turn is exactly a quarter of the table.
const QUARTER_TURN_INDEX: usize = TABLE_SIZE / 4;

static TABLE: TableGate<TrigTable> = TableGate::new(TrigTable::build);

/// Precomputed sine table covering one full turn.
#[derive(Debug)]
pub struct TrigTable {
    sines: [Fixed; TABLE_SIZE],
}

impl TrigTable {
    fn build() -> Self {
        let mut sines = [Fixed::ZERO; TABLE_SIZE];
        for (index, slot) in sines.iter_mut().enumerate() {
            let radians = (index as f64 / TABLE_SIZE as f64) * std::f64::consts::TAU;
            *slot = Fixed::from_float(radians.sin());
        }
        Self { sines }
    }

    /// Sine of an angle expressed in fixed-point degrees.
    #[must_use]
    pub fn sin(&self, degrees: Fixed) -> Fixed {
        self.sines[angle_to_index(degrees)]
    }

    /// Cosine of an angle expressed in fixed-point degrees.
    ///
    /// Shares the sine table through a quarter-turn phase shift. The shift
    /// is applied to the table index, so angles near [`Fixed::MAX`] do not
    /// wrap around before being looked up.
    #[must_use]
    pub fn cos(&self, degrees: Fixed) -> Fixed {
        let index = (angle_to_index(degrees) + QUARTER_TURN_INDEX) & (TABLE_SIZE - 1);
        self.sines[index]
    }

    /// Raw table entries in index order.
    #[must_use]
    pub fn entries(&self) -> &[Fixed] {
        &self.sines
    }
}

/// Builds the process-wide sine table if it has not been built yet.
pub fn initialize() {
    let _ = ensure_ready();
}

/// Returns the process-wide sine table, building it on first use.
#[must_use]
pub fn ensure_ready() -> Arc<TrigTable> {
    TABLE.ensure_ready()
}

/// Discards the process-wide table so the next access rebuilds it.
///
/// Intended for tests; handles obtained earlier stay valid.
pub fn reset() {
    TABLE.reset();
}

/// Number of times the table has been filled since process start.
#[must_use]
pub fn fill_count() -> usize {
    TABLE.fill_count()
}

/// Sine of an angle expressed in fixed-point degrees.
#[must_use]
pub fn sin(degrees: Fixed) -> Fixed {
    ensure_ready().sin(degrees)
}

/// Cosine of an angle expressed in fixed-point degrees.
#[must_use]
pub fn cos(degrees: Fixed) -> Fixed {
    ensure_ready().cos(degrees)
}

/// Angle of the vector `(x, y)` in fixed-point degrees.
///
/// Both operands and the intermediate result are forced through `f32` so
/// hosts with differing native float precision agree bit for bit.
#[must_use]
pub fn atan2(y: Fixed, x: Fixed) -> Fixed {
    let y = f64::from(y.to_float() as f32);
    let x = f64::from(x.to_float() as f32);
    let radians = f64::from(y.atan2(x) as f32);
    Fixed::from_float(radians.to_degrees())
}

// floor(degrees * 4096 / 360) computed exactly in integers, then wrapped
// into the table with a mask so negative angles land correctly.
fn angle_to_index(degrees: Fixed) -> usize {
    (degrees.raw().div_euclid(RAW_UNITS_PER_INDEX) & TABLE_MASK) as usize
}
