//! Waveform spectral analyzer — extracts a harmonic envelope from audio.
//!
//! Analysis is strictly an offline job: decoding and FFT work run on user
//! action, never on the audio thread. The resulting envelope is published
//! by value into the next parameter snapshot, so the render thread never
//! reads analyzer memory.

use std::f32::consts::TAU;
use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};

use crate::dsp::harmonics::MAX_HARMONICS;
use crate::dsp::spectral_filter::SpectralEnvelope;
use crate::error::AnalyzerError;

/// Fixed analysis window: the first 4096 samples of the imported audio.
pub const FFT_SIZE: usize = 4096;
const HALF_SIZE: usize = FFT_SIZE / 2;
const BINS_PER_BAND: usize = HALF_SIZE / MAX_HARMONICS;

/// Extracts a normalized 256-band spectral envelope from imported audio.
pub struct WaveformAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    envelope: SpectralEnvelope,
    /// Raw normalized bin magnitudes, kept for visualization.
    magnitudes: Box<[f32; HALF_SIZE]>,
    loaded: bool,
    file_name: Option<String>,
}

impl WaveformAnalyzer {
    pub fn new() -> Self {
        WaveformAnalyzer {
            fft: RealFftPlanner::<f32>::new().plan_fft_forward(FFT_SIZE),
            envelope: SpectralEnvelope::default(),
            magnitudes: Box::new([0.0; HALF_SIZE]),
            loaded: false,
            file_name: None,
        }
    }

    /// Analyze a mono sample buffer.
    ///
    /// Takes up to the first 4096 samples, applies a Hann window, runs a
    /// forward real FFT, and reduces the first 2048 bin magnitudes to a
    /// 256-band envelope normalized to a peak of 1.0. On failure the
    /// previously extracted envelope is left untouched.
    pub fn analyze(&mut self, samples: &[f32]) -> Result<(), AnalyzerError> {
        if samples.is_empty() {
            return Err(AnalyzerError::EmptyAudio);
        }

        let len = samples.len().min(FFT_SIZE);
        let mut input = vec![0.0_f32; FFT_SIZE];

        // Hann window over the analyzed span; the rest stays zero-padded
        let denom = len.saturating_sub(1).max(1) as f32;
        for (i, value) in input.iter_mut().take(len).enumerate() {
            let window = 0.5 * (1.0 - (TAU * i as f32 / denom).cos());
            *value = samples[i] * window;
        }

        let mut spectrum = self.fft.make_output_vec();
        let mut scratch = self.fft.make_scratch_vec();
        self.fft
            .process_with_scratch(&mut input, &mut spectrum, &mut scratch)
            .map_err(|e| AnalyzerError::Fft(e.to_string()))?;

        let mut peak = 0.0_f32;
        for (magnitude, bin) in self.magnitudes.iter_mut().zip(spectrum.iter()) {
            *magnitude = bin.norm();
            peak = peak.max(*magnitude);
        }
        if peak > 0.0 {
            for magnitude in self.magnitudes.iter_mut() {
                *magnitude /= peak;
            }
        }

        // Contiguous bin averaging: 2048 bins down to 256 bands
        let mut bands = [0.0_f32; MAX_HARMONICS];
        for (band, chunk) in bands.iter_mut().zip(self.magnitudes.chunks(BINS_PER_BAND)) {
            *band = chunk.iter().sum::<f32>() / chunk.len() as f32;
        }

        let mut envelope = SpectralEnvelope::new(bands);
        envelope.normalize();
        self.envelope = envelope;
        self.loaded = true;
        Ok(())
    }

    /// The most recently extracted envelope (identity until a load succeeds).
    pub fn envelope(&self) -> &SpectralEnvelope {
        &self.envelope
    }

    /// Raw normalized FFT magnitudes of the last analysis (2048 bins).
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes[..]
    }

    /// True once any analysis has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Name of the last successfully imported file, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

impl Default for WaveformAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "import")]
mod import {
    use std::path::Path;

    use super::{FFT_SIZE, WaveformAnalyzer};
    use crate::error::AnalyzerError;

    impl WaveformAnalyzer {
        /// Decode an audio file and analyze its first 4096 samples.
        ///
        /// Supports WAV and MP3; only channel 0 is read. Any failure
        /// leaves the previously loaded envelope intact.
        pub fn load_file(&mut self, path: &Path) -> Result<(), AnalyzerError> {
            let samples = decode_first_channel(path)?;
            self.analyze(&samples)?;
            self.file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            log::info!(
                "analyzed {} ({} samples)",
                self.file_name.as_deref().unwrap_or("<unnamed>"),
                samples.len()
            );
            Ok(())
        }
    }

    /// Decode up to the first 4096 samples of channel 0.
    fn decode_first_channel(path: &Path) -> Result<Vec<f32>, AnalyzerError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "wav" => decode_wav(path),
            "mp3" => decode_mp3(path),
            other => Err(AnalyzerError::UnsupportedFormat(other.to_string())),
        }
    }

    fn decode_wav(path: &Path) -> Result<Vec<f32>, AnalyzerError> {
        let mut reader =
            hound::WavReader::open(path).map_err(|e| AnalyzerError::Decode(e.to_string()))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .step_by(channels)
                .take(FFT_SIZE)
                .collect::<Result<_, _>>()
                .map_err(|e| AnalyzerError::Decode(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .step_by(channels)
                    .take(FFT_SIZE)
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| AnalyzerError::Decode(e.to_string()))?
            }
        };

        if samples.is_empty() {
            return Err(AnalyzerError::EmptyAudio);
        }
        Ok(samples)
    }

    fn decode_mp3(path: &Path) -> Result<Vec<f32>, AnalyzerError> {
        let file = std::fs::File::open(path)?;
        let mut decoder = minimp3::Decoder::new(file);
        let mut samples = Vec::with_capacity(FFT_SIZE);

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    let channels = frame.channels.max(1);
                    for chunk in frame.data.chunks(channels) {
                        samples.push(chunk[0] as f32 / 32768.0);
                        if samples.len() >= FFT_SIZE {
                            return Ok(samples);
                        }
                    }
                }
                Err(minimp3::Error::Eof) => break,
                Err(e) => return Err(AnalyzerError::Decode(e.to_string())),
            }
        }

        if samples.is_empty() {
            return Err(AnalyzerError::EmptyAudio);
        }
        Ok(samples)
    }
}
