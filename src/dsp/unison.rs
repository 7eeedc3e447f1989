//! Unison detuning and stereo spread.
//!
//! Detuning happens directly in the voice's harmonic synthesis: each
//! sub-voice carries a frequency ratio applied to every harmonic's phase
//! increment, so phase continuity is exact and no delay-line
//! interpolation is involved.

use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

/// Maximum number of unison sub-voices per note.
pub const MAX_UNISON_VOICES: usize = 8;

/// Precomputed mixing parameters for one unison sub-voice.
#[derive(Debug, Clone, Copy)]
pub struct UnisonVoice {
    /// Frequency multiplier, `2^(cents / 1200)`.
    pub freq_ratio: f32,
    /// Constant-power left gain, `cos(pan · π/2)`.
    pub gain_left: f32,
    /// Constant-power right gain, `sin(pan · π/2)`.
    pub gain_right: f32,
}

impl Default for UnisonVoice {
    /// A single centered sub-voice at the note's own pitch.
    fn default() -> Self {
        UnisonVoice {
            freq_ratio: 1.0,
            gain_left: FRAC_1_SQRT_2,
            gain_right: FRAC_1_SQRT_2,
        }
    }
}

/// Fill `voices` with the detune/pan layout for a unison stack.
///
/// Cents offsets spread linearly from `−detune_cents` to `+detune_cents`
/// across the sub-voices; pan positions spread around center by
/// `stereo_width`. A single sub-voice sits exactly at center with no
/// detune. Returns the clamped sub-voice count.
pub fn compute_voices(
    count: usize,
    detune_cents: f32,
    stereo_width: f32,
    voices: &mut [UnisonVoice; MAX_UNISON_VOICES],
) -> usize {
    let count = count.clamp(1, MAX_UNISON_VOICES);

    for (u, voice) in voices.iter_mut().enumerate().take(count) {
        let spread = if count == 1 {
            0.5
        } else {
            u as f32 / (count - 1) as f32
        };

        let cents = detune_cents * (2.0 * spread - 1.0);
        let pan = (0.5 + stereo_width * (spread - 0.5)).clamp(0.0, 1.0);

        *voice = UnisonVoice {
            freq_ratio: 2.0_f32.powf(cents / 1200.0),
            gain_left: (pan * FRAC_PI_2).cos(),
            gain_right: (pan * FRAC_PI_2).sin(),
        };
    }

    count
}

/// Equal-power scale for summing `count` sub-voices: `1/√count`.
pub fn mix_scale(count: usize) -> f32 {
    1.0 / (count.max(1) as f32).sqrt()
}
