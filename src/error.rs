use std::fmt;
use std::io;

/// Errors produced by the waveform analyzer when importing audio.
///
/// All of these are recovered locally: a failed import leaves any
/// previously extracted spectral envelope untouched.
#[derive(Debug)]
pub enum AnalyzerError {
    /// The file could not be opened or read.
    Io(io::Error),
    /// The file extension is not one of the supported formats.
    UnsupportedFormat(String),
    /// The decoder rejected the file contents.
    Decode(String),
    /// The audio decoded successfully but contained no samples.
    EmptyAudio,
    /// The FFT rejected its input buffers.
    Fft(String),
}

impl fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerError::Io(e) => write!(f, "I/O error: {e}"),
            AnalyzerError::UnsupportedFormat(ext) => {
                write!(f, "Unsupported audio format '{ext}'")
            }
            AnalyzerError::Decode(msg) => write!(f, "Failed to decode audio: {msg}"),
            AnalyzerError::EmptyAudio => write!(f, "Audio contains no samples"),
            AnalyzerError::Fft(msg) => write!(f, "Spectral analysis failed: {msg}"),
        }
    }
}

impl std::error::Error for AnalyzerError {}

impl From<io::Error> for AnalyzerError {
    fn from(e: io::Error) -> Self {
        AnalyzerError::Io(e)
    }
}

/// Configuration errors caught at preparation time.
///
/// The render path itself never fails — a misconfigured sample rate or
/// block size must be rejected before any audio is produced.
#[derive(Debug)]
pub enum EngineError {
    InvalidSampleRate(f32),
    InvalidBlockSize(usize),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidSampleRate(sr) => write!(f, "Invalid sample rate: {sr}"),
            EngineError::InvalidBlockSize(size) => write!(f, "Invalid block size: {size}"),
        }
    }
}

impl std::error::Error for EngineError {}
