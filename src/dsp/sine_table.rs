//! Precomputed sine lookup table shared by every voice.

use std::f32::consts::TAU;

use once_cell::sync::Lazy;

/// Number of table entries; one full sine cycle.
pub const TABLE_SIZE: usize = 4096;

static SHARED: Lazy<SineTable> = Lazy::new(SineTable::new);

/// A 4096-point sine table with linear interpolation.
///
/// Immutable once built, so concurrent reads from any number of voices
/// need no synchronization. Built once per process via [`SineTable::shared`]
/// and passed by reference into the render path.
pub struct SineTable {
    /// One extra entry so interpolation never wraps an index.
    table: [f32; TABLE_SIZE + 1],
}

impl SineTable {
    fn new() -> Self {
        let mut table = [0.0_f32; TABLE_SIZE + 1];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = (i as f32 / TABLE_SIZE as f32 * TAU).sin();
        }
        SineTable { table }
    }

    /// The process-wide shared instance, built on first use.
    pub fn shared() -> &'static SineTable {
        &SHARED
    }

    /// Look up `sin(phase)` for a phase in radians.
    ///
    /// The phase is wrapped into [0, 2π) via floor-based modulo, so any
    /// finite input yields a finite result.
    pub fn lookup(&self, phase: f32) -> f32 {
        let mut normalized = phase / TAU;
        normalized -= normalized.floor();

        let position = normalized * TABLE_SIZE as f32;
        let index = position as usize;
        let frac = position - index as f32;

        self.table[index] + frac * (self.table[index + 1] - self.table[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn zero_phase_is_zero() {
        assert_eq!(SineTable::shared().lookup(0.0), 0.0);
    }

    #[test]
    fn quarter_cycle_is_one() {
        let s = SineTable::shared().lookup(FRAC_PI_2);
        assert!(
            (s - 1.0).abs() < 1e-3,
            "lookup(π/2) should be ~1 within table resolution, got {s}"
        );
    }

    #[test]
    fn matches_sin_over_a_cycle() {
        let table = SineTable::shared();
        for i in 0..10_000 {
            let phase = i as f32 / 10_000.0 * TAU;
            let diff = (table.lookup(phase) - phase.sin()).abs();
            assert!(diff < 1e-3, "table diverges from sin at phase {phase}: {diff}");
        }
    }

    #[test]
    fn continuous_across_wrap() {
        let table = SineTable::shared();
        let before = table.lookup(TAU - 1e-4);
        let after = table.lookup(TAU + 1e-4);
        assert!(
            (before - after).abs() < 1e-3,
            "discontinuity across 2π wrap: {before} vs {after}"
        );
    }

    #[test]
    fn wraps_out_of_range_phases() {
        let table = SineTable::shared();
        assert!((table.lookup(-FRAC_PI_2) + 1.0).abs() < 1e-3);
        assert!((table.lookup(5.0 * TAU + PI) - PI.sin()).abs() < 1e-3);
        assert!(table.lookup(1.0e9).is_finite());
        assert!(table.lookup(-1.0e9).is_finite());
    }
}
