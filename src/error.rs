use std::fmt;

use thiserror::Error;

/// Which block of a `.tapf` file a bad value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Impulse,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Header => write!(f, "header"),
            Section::Impulse => write!(f, "impulse"),
        }
    }
}

/// Which side of a conversion a sample rate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    /// The rate the impulse was captured at (read from the file).
    Source,
    /// The playback rate requested by the caller.
    Target,
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateKind::Source => write!(f, "source"),
            RateKind::Target => write!(f, "target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Truncated header: need {needed} bytes, got {actual}")]
    TruncatedHeader { needed: usize, actual: usize },

    #[error("Truncated impulse: header declares {declared} samples, buffer holds {available}")]
    TruncatedImpulse { declared: i64, available: usize },

    #[error("Invalid {kind} sample rate: {rate}")]
    InvalidSampleRate { kind: RateKind, rate: f64 },

    #[error("Corrupt float data in {section} at index {index}")]
    CorruptFloatData { section: Section, index: usize },

    #[error("Schema mismatch: layout names {props} fields, header holds {fields}")]
    SchemaMismatch { props: usize, fields: usize },

    #[error("Invalid profile layout: {0}")]
    InvalidLayout(String),

    #[error("Impulse response has no samples")]
    EmptyImpulse,
}

#[cfg(feature = "wav")]
#[derive(Debug, Error)]
pub enum WavError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    #[error("WAV file has 0 channels")]
    NoChannels,

    #[error("Unsupported WAV sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("WAV file has no samples")]
    Empty,

    #[error("Corrupt float sample at frame {0}")]
    CorruptFloatData(usize),
}

#[cfg(feature = "catalog")]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid profile URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No cache directory available on this platform")]
    NoCacheDir,

    #[error("Decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
