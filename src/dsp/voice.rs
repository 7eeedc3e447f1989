//! A single polyphonic additive voice.
//!
//! Each voice owns its phase state and rebuilds its harmonic data from the
//! shared parameter snapshot once per block. The per-sample loop is
//! allocation-free: every buffer is fixed-size and lives with the voice.

use std::f32::consts::TAU;

use crate::dsp::envelope::Envelope;
use crate::dsp::harmonics::{self, HarmonicData, MAX_HARMONICS};
use crate::dsp::sine_table::SineTable;
use crate::dsp::spectral_filter;
use crate::dsp::unison::{self, MAX_UNISON_VOICES, UnisonVoice};
use crate::params::SynthParams;

/// Fixed headroom bounding the overshoot of a many-harmonic sum.
const HEADROOM: f32 = 0.25;

/// One polyphonic note: Idle → Active → (Releasing) → Idle.
pub struct Voice {
    note: u8,
    frequency: f32,
    velocity: f32,
    sample_rate: f32,
    active: bool,
    releasing: bool,
    /// Activation order, used for oldest-note stealing.
    age: u64,

    envelope: Envelope,
    harmonics: HarmonicData,
    unison: [UnisonVoice; MAX_UNISON_VOICES],
    unison_count: usize,
    /// Per-harmonic phase increment for the current block, at unison ratio 1.
    increments: [f32; MAX_HARMONICS],
    /// Running phase per (sub-voice, harmonic), wrapped into [0, 2π).
    phases: Box<[[f32; MAX_HARMONICS]; MAX_UNISON_VOICES]>,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Voice {
            note: 0,
            frequency: 440.0,
            velocity: 0.0,
            sample_rate,
            active: false,
            releasing: false,
            age: 0,
            envelope: Envelope::new(sample_rate),
            harmonics: HarmonicData::default(),
            unison: [UnisonVoice::default(); MAX_UNISON_VOICES],
            unison_count: 1,
            increments: [0.0; MAX_HARMONICS],
            phases: Box::new([[0.0; MAX_HARMONICS]; MAX_UNISON_VOICES]),
        }
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.envelope.set_sample_rate(sample_rate);
    }

    /// Start a note: reset all phase state, trigger the envelope, and
    /// compute fresh harmonic data.
    pub fn start_note(&mut self, note: u8, frequency: f32, velocity: f32, params: &SynthParams, age: u64) {
        self.note = note;
        self.frequency = frequency;
        self.velocity = velocity;
        self.age = age;
        self.active = true;
        self.releasing = false;

        for subvoice in self.phases.iter_mut() {
            subvoice.fill(0.0);
        }

        self.envelope.set_params(
            params.env_attack,
            params.env_decay,
            params.env_sustain,
            params.env_release,
        );
        self.envelope.gate_on();

        self.rebuild(params);
    }

    /// Stop the note, either with a release tail or immediately.
    pub fn stop_note(&mut self, tail_off: bool) {
        if tail_off {
            self.releasing = true;
            self.envelope.gate_off();
        } else {
            self.envelope.reset();
            self.active = false;
            self.releasing = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_releasing(&self) -> bool {
        self.releasing
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    /// Current harmonic data, for visualization.
    pub fn harmonics(&self) -> &HarmonicData {
        &self.harmonics
    }

    /// Recompute harmonic data and per-harmonic increments from scratch.
    ///
    /// Runs unconditionally every block: shaping parameters are block-rate,
    /// and the recompute is cheap next to the per-sample loop.
    fn rebuild(&mut self, params: &SynthParams) {
        self.harmonics = harmonics::compute(
            params.osc_ratio,
            params.saw_phase,
            params.sqr_phase,
            self.frequency,
            self.sample_rate,
        );

        spectral_filter::apply(
            &mut self.harmonics,
            params.filter_cutoff,
            params.filter_boost,
            params.filter_phase,
            params.filter_stretch,
            self.frequency,
            self.sample_rate,
        );

        if params.wave_filter_enabled && params.wave_filter_mix > 0.0 {
            spectral_filter::apply_waveform_filter(
                &mut self.harmonics,
                &params.wave_filter_envelope,
                params.wave_filter_mix,
            );
        }

        // Block-rate parameters keep the per-sample phase increment
        // constant within a block.
        let scale = TAU * self.frequency / self.sample_rate;
        for n in 1..=self.harmonics.active_count {
            self.increments[n - 1] = scale * (n as f32).powf(params.filter_stretch);
        }
    }

    /// Render this voice additively into a stereo block.
    ///
    /// When the envelope reaches silence the voice frees itself and the
    /// remaining samples of the block are left untouched.
    pub fn render(
        &mut self,
        params: &SynthParams,
        table: &SineTable,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        if !self.active {
            return;
        }

        self.rebuild(params);
        self.envelope.set_params(
            params.env_attack,
            params.env_decay,
            params.env_sustain,
            params.env_release,
        );
        self.unison_count = unison::compute_voices(
            params.unison_count,
            params.unison_detune,
            params.stereo_width,
            &mut self.unison,
        );

        let mix_scale = unison::mix_scale(self.unison_count);
        let active = self.harmonics.active_count;

        for (left_out, right_out) in left.iter_mut().zip(right.iter_mut()) {
            let env = self.envelope.next_sample();
            if self.envelope.is_finished() {
                self.active = false;
                self.releasing = false;
                break;
            }

            let mut sample_left = 0.0;
            let mut sample_right = 0.0;

            for u in 0..self.unison_count {
                let subvoice = self.unison[u];
                let phases = &mut self.phases[u];
                let mut sum = 0.0;

                for n in 0..active {
                    let amplitude = self.harmonics.amplitudes[n];
                    if amplitude <= 0.0 {
                        continue;
                    }

                    sum += amplitude * table.lookup(phases[n] + self.harmonics.phases[n]);

                    let mut phase = phases[n] + self.increments[n] * subvoice.freq_ratio;
                    if phase >= TAU {
                        phase -= TAU;
                    }
                    phases[n] = phase;
                }

                let sub_sample = sum * mix_scale;
                sample_left += sub_sample * subvoice.gain_left;
                sample_right += sub_sample * subvoice.gain_right;
            }

            let gain = env * self.velocity * HEADROOM;
            *left_out += sample_left * gain;
            *right_out += sample_right * gain;
        }
    }
}
