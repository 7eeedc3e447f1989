//! In-place spectral shaping of harmonic data.
//!
//! All filtering happens in the harmonic domain: a logistic low-pass over
//! harmonic number, a resonant boost near the cutoff, per-harmonic phase
//! rotation, and a harmonic stretch that remaps partial frequencies.

use crate::dsp::harmonics::{HarmonicData, MAX_HARMONICS};

/// Width of the logistic roll-off transition, in harmonics.
const ROLLOFF_SMOOTHNESS: f32 = 2.0;
/// Width of the resonance bell around the cutoff, in harmonics.
const BOOST_BELL_WIDTH: f32 = 3.0;

/// A 256-band magnitude profile, normalized so its peak is 1.0, applied
/// as a multiplicative filter over the harmonic series.
#[derive(Debug, Clone)]
pub struct SpectralEnvelope {
    bands: [f32; MAX_HARMONICS],
}

impl Default for SpectralEnvelope {
    /// The identity envelope: every band passes at unity gain.
    fn default() -> Self {
        SpectralEnvelope {
            bands: [1.0; MAX_HARMONICS],
        }
    }
}

impl SpectralEnvelope {
    pub fn new(bands: [f32; MAX_HARMONICS]) -> Self {
        SpectralEnvelope { bands }
    }

    pub fn band(&self, index: usize) -> f32 {
        self.bands[index]
    }

    pub fn bands(&self) -> &[f32; MAX_HARMONICS] {
        &self.bands
    }

    /// Rescale so the loudest band sits at exactly 1.0.
    /// An all-zero envelope is left untouched.
    pub fn normalize(&mut self) {
        let peak = self.bands.iter().fold(0.0_f32, |m, &b| m.max(b));
        if peak > 0.0 {
            for band in self.bands.iter_mut() {
                *band /= peak;
            }
        }
    }
}

/// Apply cutoff, boost, phase rotation and stretch to `data` in place.
///
/// Stretch remaps harmonic `n` to an effective frequency of
/// `fundamental · n^stretch`. The remap is monotonic in `n`, so once one
/// stretched harmonic reaches Nyquist the whole remaining tail is zeroed
/// and dropped from `active_count`.
///
/// Not idempotent: reapplying to already-filtered data double-applies the
/// gains. Callers always start from a fresh harmonic series.
pub fn apply(
    data: &mut HarmonicData,
    cutoff: f32,
    boost_db: f32,
    phase_rotation: f32,
    stretch: f32,
    fundamental_hz: f32,
    sample_rate: f32,
) {
    let nyquist = sample_rate * 0.5;
    let boost_linear = 10.0_f32.powf(boost_db / 20.0);
    let mut new_active = 0;

    for n in 1..=data.active_count {
        let idx = n - 1;

        let stretched_freq = fundamental_hz * (n as f32).powf(stretch);
        if stretched_freq >= nyquist {
            for amp in data.amplitudes[idx..data.active_count].iter_mut() {
                *amp = 0.0;
            }
            break;
        }

        let x = (n as f32 - cutoff) / ROLLOFF_SMOOTHNESS;
        let rolloff_gain = 1.0 / (1.0 + x.exp());

        let dist = n as f32 - cutoff;
        let bell_gain = 1.0
            + (boost_linear - 1.0)
                * (-0.5 * dist * dist / (BOOST_BELL_WIDTH * BOOST_BELL_WIDTH)).exp();

        data.amplitudes[idx] *= rolloff_gain * bell_gain;
        data.phases[idx] += phase_rotation * n as f32;

        new_active = n;
    }

    data.active_count = new_active;
}

/// Cross-fade each harmonic toward `amplitude · envelope[n]`.
///
/// `mix` = 0 bypasses entirely; `mix` = 1 applies the envelope in full.
pub fn apply_waveform_filter(data: &mut HarmonicData, envelope: &SpectralEnvelope, mix: f32) {
    if mix <= 0.0 {
        return;
    }

    for idx in 0..data.active_count {
        let filtered = data.amplitudes[idx] * envelope.band(idx);
        data.amplitudes[idx] = data.amplitudes[idx] * (1.0 - mix) + filtered * mix;
    }
}
