//! Shared synthesis parameters — the block-rate snapshot read by all voices.
//!
//! The control layer fills one of these per audio block and hands it to the
//! engine at block entry. Inside a block the snapshot is immutable, so the
//! render path is free of aliasing hazards. Every field is independently
//! range-clamped, which makes a one-block-stale snapshot harmless.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::dsp::spectral_filter::SpectralEnvelope;
use crate::dsp::unison::MAX_UNISON_VOICES;

/// Convert a 0–360° control value to radians for the core.
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * (PI / 180.0)
}

/// All voice-shaping parameters, in core units (radians, Hz, dB, seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    /// Oscillator blend: 0 = square, 1 = saw.
    pub osc_ratio: f32,
    /// Sawtooth phase offset in radians.
    pub saw_phase: f32,
    /// Square phase offset in radians.
    pub sqr_phase: f32,

    /// Spectral cutoff as a harmonic number [1, 256].
    pub filter_cutoff: f32,
    /// Resonance boost at the cutoff in dB [0, 24].
    pub filter_boost: f32,
    /// Per-harmonic phase rotation in radians.
    pub filter_phase: f32,
    /// Harmonic stretch factor [0.5, 2.0]; 1.0 = untouched.
    pub filter_stretch: f32,

    /// Whether the imported spectral envelope is applied.
    pub wave_filter_enabled: bool,
    /// Dry/wet mix for the imported envelope [0, 1].
    pub wave_filter_mix: f32,
    /// The imported 256-band envelope. Published by value from the
    /// analyzer; not part of the serialized preset.
    #[serde(skip)]
    pub wave_filter_envelope: SpectralEnvelope,

    /// Unison sub-voices per note [1, 8].
    pub unison_count: usize,
    /// Unison detune spread in cents [0, 100].
    pub unison_detune: f32,
    /// Stereo width of the unison stack [0, 1].
    pub stereo_width: f32,

    /// Attack time in seconds [0.001, 10].
    pub env_attack: f32,
    /// Decay time in seconds [0.001, 10].
    pub env_decay: f32,
    /// Sustain level [0, 1].
    pub env_sustain: f32,
    /// Release time in seconds [0.001, 10].
    pub env_release: f32,

    /// Master output gain in dB [−60, 6].
    pub master_gain: f32,
}

impl Default for SynthParams {
    fn default() -> Self {
        SynthParams {
            osc_ratio: 0.5,
            saw_phase: 0.0,
            sqr_phase: 0.0,
            filter_cutoff: 128.0,
            filter_boost: 0.0,
            filter_phase: 0.0,
            filter_stretch: 1.0,
            wave_filter_enabled: false,
            wave_filter_mix: 0.0,
            wave_filter_envelope: SpectralEnvelope::default(),
            unison_count: 1,
            unison_detune: 10.0,
            stereo_width: 0.5,
            env_attack: 0.01,
            env_decay: 0.1,
            env_sustain: 0.8,
            env_release: 0.3,
            master_gain: 0.0,
        }
    }
}

impl SynthParams {
    /// Force every field back into its documented range.
    ///
    /// The control layer clamps upstream; this is the core's last line of
    /// defense so the render path can assume well-formed values.
    pub fn clamp(&mut self) {
        self.osc_ratio = self.osc_ratio.clamp(0.0, 1.0);
        self.filter_cutoff = self.filter_cutoff.clamp(1.0, 256.0);
        self.filter_boost = self.filter_boost.clamp(0.0, 24.0);
        self.filter_stretch = self.filter_stretch.clamp(0.5, 2.0);
        self.wave_filter_mix = self.wave_filter_mix.clamp(0.0, 1.0);
        self.unison_count = self.unison_count.clamp(1, MAX_UNISON_VOICES);
        self.unison_detune = self.unison_detune.clamp(0.0, 100.0);
        self.stereo_width = self.stereo_width.clamp(0.0, 1.0);
        self.env_attack = self.env_attack.clamp(0.001, 10.0);
        self.env_decay = self.env_decay.clamp(0.001, 10.0);
        self.env_sustain = self.env_sustain.clamp(0.0, 1.0);
        self.env_release = self.env_release.clamp(0.001, 10.0);
        self.master_gain = self.master_gain.clamp(-60.0, 6.0);
    }

    /// Parse a snapshot from JSON (host/preset boundary).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the snapshot to JSON (host/preset boundary).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
