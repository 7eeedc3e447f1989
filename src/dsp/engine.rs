//! Synthesis engine — fixed voice pool, note dispatch, block rendering.

use crate::dsp::harmonics::{self, HarmonicData};
use crate::dsp::sine_table::SineTable;
use crate::dsp::spectral_filter;
use crate::dsp::voice::Voice;
use crate::error::EngineError;
use crate::params::SynthParams;

/// Size of the voice pool.
pub const MAX_POLYPHONY: usize = 8;

/// Reference pitch for the idle preview spectrum.
const PREVIEW_FREQUENCY: f32 = 440.0;

/// Convert a MIDI note number to frequency (A4 = 440 Hz).
pub fn note_to_frequency(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Convert decibels to linear gain.
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// The additive synthesis engine.
///
/// Owns a fixed pool of eight voices sharing one parameter snapshot and
/// one sine table. The entire render path runs on a single audio thread
/// with no locks and no allocation; all voice state is pre-allocated at
/// construction.
pub struct SynthEngine {
    voices: Vec<Voice>,
    params: SynthParams,
    sine_table: &'static SineTable,
    sample_rate: f32,
    /// Monotonic note counter, used for oldest-note stealing.
    note_counter: u64,
}

impl SynthEngine {
    pub fn new(sample_rate: f32) -> Self {
        SynthEngine {
            voices: (0..MAX_POLYPHONY).map(|_| Voice::new(sample_rate)).collect(),
            params: SynthParams::default(),
            sine_table: SineTable::shared(),
            sample_rate,
            note_counter: 0,
        }
    }

    /// Validate the host configuration and prepare every voice.
    ///
    /// Misconfiguration is caught here, never during rendering.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> Result<(), EngineError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        if block_size == 0 {
            return Err(EngineError::InvalidBlockSize(block_size));
        }

        self.sample_rate = sample_rate;
        for voice in self.voices.iter_mut() {
            voice.prepare(sample_rate);
        }
        log::debug!("engine prepared: {sample_rate} Hz, {block_size}-sample blocks");
        Ok(())
    }

    /// Copy the control layer's snapshot in at block entry.
    ///
    /// Clamping here is the core's last defense against out-of-range
    /// values; a torn snapshot costs at most one block of parameter lag.
    pub fn set_params(&mut self, snapshot: &SynthParams) {
        self.params = snapshot.clone();
        self.params.clamp();
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    /// Start a note on a free voice, stealing the oldest if none is free.
    pub fn note_on(&mut self, note: u8, velocity: f32) {
        let velocity = velocity.clamp(0.0, 1.0);
        self.note_counter += 1;

        let index = match self.voices.iter().position(|v| !v.is_active()) {
            Some(free) => free,
            None => self.oldest_voice(),
        };

        self.voices[index].start_note(
            note,
            note_to_frequency(note),
            velocity,
            &self.params,
            self.note_counter,
        );
    }

    /// Stop every voice playing `note`, with or without a release tail.
    pub fn note_off(&mut self, note: u8, tail_off: bool) {
        for voice in self.voices.iter_mut() {
            if voice.is_active() && voice.note() == note {
                voice.stop_note(tail_off);
            }
        }
    }

    /// Render one block: sum all active voices, then apply master gain.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);

        for voice in self.voices.iter_mut() {
            voice.render(&self.params, self.sine_table, left, right);
        }

        let gain = db_to_gain(self.params.master_gain);
        for sample in left.iter_mut() {
            *sample *= gain;
        }
        for sample in right.iter_mut() {
            *sample *= gain;
        }
    }

    /// Harmonic data of the first active voice, for visualization.
    pub fn active_harmonics(&self) -> Option<&HarmonicData> {
        self.voices
            .iter()
            .find(|v| v.is_active())
            .map(|v| v.harmonics())
    }

    /// Harmonic data for the current parameters at the 440 Hz reference
    /// pitch, bypassing voices and envelope — the visualization fallback
    /// when no notes are held.
    pub fn preview_harmonics(&self) -> HarmonicData {
        let mut data = harmonics::compute(
            self.params.osc_ratio,
            self.params.saw_phase,
            self.params.sqr_phase,
            PREVIEW_FREQUENCY,
            self.sample_rate,
        );

        spectral_filter::apply(
            &mut data,
            self.params.filter_cutoff,
            self.params.filter_boost,
            self.params.filter_phase,
            self.params.filter_stretch,
            PREVIEW_FREQUENCY,
            self.sample_rate,
        );

        if self.params.wave_filter_enabled && self.params.wave_filter_mix > 0.0 {
            spectral_filter::apply_waveform_filter(
                &mut data,
                &self.params.wave_filter_envelope,
                self.params.wave_filter_mix,
            );
        }

        data
    }

    /// Index of the longest-held active voice.
    fn oldest_voice(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age())
            .map(|(index, _)| index)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: usize = 512;

    fn process_blocks(engine: &mut SynthEngine, blocks: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; BLOCK * blocks];
        let mut right = vec![0.0; BLOCK * blocks];
        for b in 0..blocks {
            let range = b * BLOCK..(b + 1) * BLOCK;
            engine.process(&mut left[range.clone()], &mut right[range]);
        }
        (left, right)
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0_f32, |m, &s| m.max(s.abs()))
    }

    #[test]
    fn note_to_frequency_reference_points() {
        assert!((note_to_frequency(69) - 440.0).abs() < 0.001);
        assert!((note_to_frequency(57) - 220.0).abs() < 0.001);
        assert!((note_to_frequency(60) - 261.626).abs() < 0.01);
    }

    #[test]
    fn db_to_gain_reference_points() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(-6.0) - 0.501).abs() < 0.001);
        assert!((db_to_gain(6.0) - 1.995).abs() < 0.001);
    }

    #[test]
    fn prepare_rejects_bad_configuration() {
        let mut engine = SynthEngine::new(44100.0);
        assert!(matches!(
            engine.prepare(0.0, 512),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            engine.prepare(f32::NAN, 512),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            engine.prepare(44100.0, 0),
            Err(EngineError::InvalidBlockSize(0))
        ));
        assert!(engine.prepare(48000.0, 256).is_ok());
    }

    #[test]
    fn note_lifecycle_produces_sound_then_silence() {
        let mut engine = SynthEngine::new(44100.0);
        engine.prepare(44100.0, BLOCK).expect("prepare");

        let mut params = SynthParams::default();
        params.env_release = 0.005;
        engine.set_params(&params);

        let (silent, _) = process_blocks(&mut engine, 1);
        assert_eq!(peak(&silent), 0.0, "no notes, no sound");

        engine.note_on(69, 1.0);
        let (sounding, _) = process_blocks(&mut engine, 2);
        assert!(peak(&sounding) > 0.01, "held note should sound");

        engine.note_off(69, true);
        process_blocks(&mut engine, 2); // release tail (~220 samples) dies out
        let (after, _) = process_blocks(&mut engine, 1);
        assert_eq!(peak(&after), 0.0, "released note should fall silent");
        assert!(engine.active_harmonics().is_none());
    }

    #[test]
    fn hard_note_off_cuts_immediately() {
        let mut engine = SynthEngine::new(44100.0);
        engine.note_on(60, 1.0);
        process_blocks(&mut engine, 1);

        engine.note_off(60, false);
        let (after, _) = process_blocks(&mut engine, 1);
        assert_eq!(peak(&after), 0.0);
    }

    #[test]
    fn master_gain_scales_output() {
        let mut quiet_engine = SynthEngine::new(44100.0);
        let mut loud_engine = SynthEngine::new(44100.0);

        let mut params = SynthParams::default();
        params.master_gain = -20.0;
        quiet_engine.set_params(&params);
        params.master_gain = 0.0;
        loud_engine.set_params(&params);

        quiet_engine.note_on(69, 1.0);
        loud_engine.note_on(69, 1.0);

        let (quiet, _) = process_blocks(&mut quiet_engine, 2);
        let (loud, _) = process_blocks(&mut loud_engine, 2);

        let ratio = peak(&quiet) / peak(&loud);
        assert!(
            (ratio - 0.1).abs() < 0.01,
            "−20 dB should scale output by 0.1, got {ratio}"
        );
    }

    #[test]
    fn full_pool_steals_oldest_voice() {
        let mut engine = SynthEngine::new(44100.0);

        for note in 0..MAX_POLYPHONY as u8 {
            engine.note_on(48 + note, 1.0);
        }
        // Pool is full; the next note evicts the first one
        engine.note_on(96, 1.0);

        let playing: Vec<u8> = engine
            .voices
            .iter()
            .filter(|v| v.is_active())
            .map(|v| v.note())
            .collect();
        assert_eq!(playing.len(), MAX_POLYPHONY);
        assert!(!playing.contains(&48), "oldest note should have been stolen");
        assert!(playing.contains(&96), "new note should be playing");
    }

    #[test]
    fn active_harmonics_tracks_first_voice() {
        let mut engine = SynthEngine::new(44100.0);
        assert!(engine.active_harmonics().is_none());

        engine.note_on(69, 1.0);
        let data = engine.active_harmonics().expect("active voice data");
        assert_eq!(data.active_count, 50);
    }

    #[test]
    fn preview_matches_reference_scenario() {
        // 440 Hz, ratio = 1, cutoff = 256, boost = 0, stretch = 1 at 44.1 kHz
        let mut engine = SynthEngine::new(44100.0);
        let mut params = SynthParams::default();
        params.osc_ratio = 1.0;
        params.filter_cutoff = 256.0;
        params.filter_boost = 0.0;
        params.filter_stretch = 1.0;
        params.unison_count = 1;
        engine.set_params(&params);

        let data = engine.preview_harmonics();
        assert_eq!(data.active_count, 50);
        assert!((data.amplitudes[0] - 1.0).abs() < 1e-4);
        assert!((data.amplitudes[1] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn unclamped_snapshot_is_sanitized() {
        let mut engine = SynthEngine::new(44100.0);
        let mut params = SynthParams::default();
        params.unison_count = 1000;
        params.filter_cutoff = -5.0;
        engine.set_params(&params);

        assert_eq!(
            engine.params().unison_count,
            crate::dsp::unison::MAX_UNISON_VOICES
        );
        assert_eq!(engine.params().filter_cutoff, 1.0);
    }
}
