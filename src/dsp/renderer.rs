//! Offline renderer — plays a single note through the engine and encodes
//! the result as a WAV byte buffer.
//!
//! Drives the same block-based render path the real-time host uses, so it
//! doubles as an end-to-end exercise of the engine.

use crate::dsp::engine::SynthEngine;
use crate::error::EngineError;
use crate::params::SynthParams;

const BLOCK_SIZE: usize = 512;
/// Tail rendered after note-off stops early once a block is this quiet.
const SILENCE_THRESHOLD: f32 = 1.0e-5;

/// Render `note` held for `seconds`, plus its release tail, to stereo
/// 16-bit PCM WAV bytes.
pub fn render_note_wav(
    params: &SynthParams,
    note: u8,
    velocity: f32,
    seconds: f32,
    sample_rate: u32,
) -> Result<Vec<u8>, EngineError> {
    let (left, right) = render_note(params, note, velocity, seconds, sample_rate)?;

    let mut pcm = Vec::with_capacity(left.len() * 2);
    for (l, r) in left.iter().zip(&right) {
        pcm.push(to_i16(*l));
        pcm.push(to_i16(*r));
    }

    Ok(encode_wav(&pcm, sample_rate, 2))
}

/// Render a single note to stereo f32 buffers: hold for `seconds`, then
/// tail off until the output falls silent (bounded by the release time).
pub fn render_note(
    params: &SynthParams,
    note: u8,
    velocity: f32,
    seconds: f32,
    sample_rate: u32,
) -> Result<(Vec<f32>, Vec<f32>), EngineError> {
    let mut engine = SynthEngine::new(sample_rate as f32);
    engine.prepare(sample_rate as f32, BLOCK_SIZE)?;
    engine.set_params(params);

    let held_blocks = ((seconds * sample_rate as f32) as usize).div_ceil(BLOCK_SIZE);
    let mut left = Vec::with_capacity((held_blocks + 1) * BLOCK_SIZE);
    let mut right = Vec::with_capacity((held_blocks + 1) * BLOCK_SIZE);

    let mut block_left = [0.0_f32; BLOCK_SIZE];
    let mut block_right = [0.0_f32; BLOCK_SIZE];

    engine.note_on(note, velocity);
    for _ in 0..held_blocks {
        engine.process(&mut block_left, &mut block_right);
        left.extend_from_slice(&block_left);
        right.extend_from_slice(&block_right);
    }

    engine.note_off(note, true);

    // Release tail, capped a little past the configured release time
    let max_tail_blocks =
        (((engine.params().env_release + 0.1) * sample_rate as f32) as usize).div_ceil(BLOCK_SIZE);
    for _ in 0..max_tail_blocks {
        engine.process(&mut block_left, &mut block_right);
        left.extend_from_slice(&block_left);
        right.extend_from_slice(&block_right);

        let block_peak = block_left
            .iter()
            .chain(block_right.iter())
            .fold(0.0_f32, |m, &s| m.max(s.abs()));
        if block_peak < SILENCE_THRESHOLD {
            break;
        }
    }

    Ok((left, right))
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32767.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    const BITS_PER_SAMPLE: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16_u32.to_le_bytes());
    buf.extend_from_slice(&1_u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_is_valid() {
        let params = SynthParams::default();
        let wav = render_note_wav(&params, 69, 1.0, 0.1, 44100).expect("render");

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 44100);

        let channels = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(channels, 2);

        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(wav.len(), 44 + data_size as usize);
    }

    #[test]
    fn rendered_note_is_audible() {
        let params = SynthParams::default();
        let wav = render_note_wav(&params, 69, 1.0, 0.2, 22050).expect("render");

        let mut has_signal = false;
        for bytes in wav[44..].chunks_exact(2) {
            let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
            if sample.unsigned_abs() > 100 {
                has_signal = true;
                break;
            }
        }
        assert!(has_signal, "rendered WAV should contain audible signal");
    }

    #[test]
    fn tail_decays_to_silence() {
        let mut params = SynthParams::default();
        params.env_release = 0.05;

        let (left, right) = render_note(&params, 60, 1.0, 0.1, 44100).expect("render");
        let tail_len = 256.min(left.len());
        let tail_peak = left[left.len() - tail_len..]
            .iter()
            .chain(&right[right.len() - tail_len..])
            .fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(
            tail_peak < 1.0e-3,
            "end of the rendered tail should be near-silent, peak = {tail_peak}"
        );
    }

    #[test]
    fn bad_sample_rate_is_rejected() {
        let params = SynthParams::default();
        assert!(render_note_wav(&params, 69, 1.0, 0.1, 0).is_err());
    }

    #[test]
    fn held_length_matches_request() {
        let params = SynthParams::default();
        let (left, _) = render_note(&params, 69, 1.0, 0.5, 44100).expect("render");
        let held_samples = (0.5 * 44100.0) as usize;
        assert!(
            left.len() >= held_samples,
            "output must cover the held duration"
        );
    }
}
