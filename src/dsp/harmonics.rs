//! Harmonic series generation for the saw/square oscillator blend.

/// Maximum number of harmonics a voice can render.
pub const MAX_HARMONICS: usize = 256;

/// Amplitude and phase for every harmonic of a note, plus the count of
/// harmonics that fall below Nyquist.
///
/// Recomputed from scratch whenever pitch or a shaping parameter changes —
/// never patched incrementally.
#[derive(Debug, Clone)]
pub struct HarmonicData {
    pub amplitudes: [f32; MAX_HARMONICS],
    pub phases: [f32; MAX_HARMONICS],
    /// Highest harmonic number with a frequency below Nyquist.
    pub active_count: usize,
}

impl Default for HarmonicData {
    fn default() -> Self {
        HarmonicData {
            amplitudes: [0.0; MAX_HARMONICS],
            phases: [0.0; MAX_HARMONICS],
            active_count: 0,
        }
    }
}

/// Compute the harmonic series for a sawtooth/square blend.
///
/// Sawtooth contributes every harmonic at `1/n`; square contributes only
/// odd harmonics at `1/n`. `ratio` cross-fades linearly between them
/// (0 = square, 1 = saw). Each harmonic's phase offset is the
/// contribution-weighted blend of the two oscillator phase offsets,
/// scaled by the harmonic number so rotation compounds with order.
///
/// Iteration stops at the first harmonic whose frequency reaches
/// `sample_rate / 2`; that truncation is the anti-aliasing guarantee.
pub fn compute(
    ratio: f32,
    saw_phase: f32,
    sqr_phase: f32,
    fundamental_hz: f32,
    sample_rate: f32,
) -> HarmonicData {
    let mut data = HarmonicData::default();
    let nyquist = sample_rate * 0.5;

    for n in 1..=MAX_HARMONICS {
        if fundamental_hz * n as f32 >= nyquist {
            break;
        }

        let saw_amp = 1.0 / n as f32;
        let sqr_amp = if n % 2 == 1 { 1.0 / n as f32 } else { 0.0 };
        let amplitude = ratio * saw_amp + (1.0 - ratio) * sqr_amp;

        let phase = if ratio >= 1.0 {
            saw_phase
        } else if ratio <= 0.0 {
            // Square's even harmonics are silent; their phase is moot
            if n % 2 == 1 { sqr_phase } else { 0.0 }
        } else {
            let saw_contrib = ratio * saw_amp;
            let sqr_contrib = (1.0 - ratio) * sqr_amp;
            let total = saw_contrib + sqr_contrib;
            if total > 0.0 {
                (saw_contrib * saw_phase + sqr_contrib * sqr_phase) / total
            } else {
                0.0
            }
        };

        data.amplitudes[n - 1] = amplitude;
        data.phases[n - 1] = phase * n as f32;
        data.active_count = n;
    }

    data
}
