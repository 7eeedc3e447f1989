//! DSP core — additive synthesis in pure Rust.
//!
//! The full render path (engine → voices → harmonic/spectral computation)
//! runs once per fixed-size block on a single audio thread. The same code
//! powers native hosts and the WebAudio build (via AudioWorklet + WASM).

pub mod analyzer;
pub mod engine;
pub mod envelope;
pub mod harmonics;
pub mod renderer;
pub mod sine_table;
pub mod spectral_filter;
pub mod unison;
pub mod voice;
