pub mod dsp;
pub mod error;
pub mod params;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::dsp::analyzer::WaveformAnalyzer;
use crate::dsp::engine::SynthEngine;
use crate::dsp::harmonics::HarmonicData;
use crate::params::SynthParams;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the spectra-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Serde-friendly mirror of [`HarmonicData`] for the visualization and
/// WASM boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarmonicSnapshot {
    pub amplitudes: Vec<f32>,
    pub phases: Vec<f32>,
    pub active_count: usize,
}

impl From<&HarmonicData> for HarmonicSnapshot {
    fn from(data: &HarmonicData) -> Self {
        HarmonicSnapshot {
            amplitudes: data.amplitudes[..data.active_count].to_vec(),
            phases: data.phases[..data.active_count].to_vec(),
            active_count: data.active_count,
        }
    }
}

/// WASM-exposed: compute the preview spectrum (440 Hz reference pitch)
/// for a parameter snapshot.
#[wasm_bindgen]
pub fn preview_spectrum(params: JsValue, sample_rate: f32) -> Result<JsValue, JsValue> {
    let params: SynthParams =
        serde_wasm_bindgen::from_value(params).map_err(|e| JsValue::from_str(&format!("{e}")))?;

    let mut engine = SynthEngine::new(sample_rate);
    engine.set_params(&params);
    let snapshot = HarmonicSnapshot::from(&engine.preview_harmonics());

    serde_wasm_bindgen::to_value(&snapshot).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render a single note to a WAV byte array.
#[wasm_bindgen]
pub fn render_note_wav(
    params: JsValue,
    note: u8,
    velocity: f32,
    seconds: f32,
    sample_rate: u32,
) -> Result<Vec<u8>, JsValue> {
    let params: SynthParams =
        serde_wasm_bindgen::from_value(params).map_err(|e| JsValue::from_str(&format!("{e}")))?;

    dsp::renderer::render_note_wav(&params, note, velocity, seconds, sample_rate)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: extract a 256-band spectral envelope from raw samples
/// decoded on the JavaScript side.
#[wasm_bindgen]
pub fn analyze_samples(samples: &[f32]) -> Result<Vec<f32>, JsValue> {
    let mut analyzer = WaveformAnalyzer::new();
    analyzer
        .analyze(samples)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(analyzer.envelope().bands().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn harmonic_snapshot_truncates_to_active_count() {
        let data = dsp::harmonics::compute(1.0, 0.0, 0.0, 440.0, 44100.0);
        let snapshot = HarmonicSnapshot::from(&data);
        assert_eq!(snapshot.active_count, 50);
        assert_eq!(snapshot.amplitudes.len(), 50);
        assert_eq!(snapshot.phases.len(), 50);
        assert!((snapshot.amplitudes[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let data = dsp::harmonics::compute(0.5, 0.0, 0.0, 440.0, 44100.0);
        let snapshot = HarmonicSnapshot::from(&data);
        let json = serde_json::to_string(&snapshot).expect("serialize");
        assert!(json.contains("\"active_count\":50"));
    }
}
