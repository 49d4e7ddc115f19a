//! Cabinet impulse responses from WAV files.
//!
//! The cabinet stage convolves with a speaker IR recorded at one of three
//! microphone positions. IRs arrive as WAV bytes and are reduced to the
//! same mono [`ImpulseResponse`] the profile decoder produces.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};

use crate::dsp::ImpulseResponse;
use crate::error::{RateKind, WavError};
use crate::tapf::check_sample_rate;

/// Microphone placement in front of the speaker cone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MicPosition {
    #[default]
    Center,
    Cone,
    Edge,
}

impl MicPosition {
    pub const ALL: [MicPosition; 3] = [MicPosition::Center, MicPosition::Cone, MicPosition::Edge];

    /// IR file stem recorded at this position.
    pub fn ir_name(self) -> &'static str {
        match self {
            MicPosition::Center => "1on-preshigh",
            MicPosition::Cone => "1on-pres8",
            MicPosition::Edge => "1on-pres5",
        }
    }

    pub fn ir_file_name(self) -> String {
        format!("{}.wav", self.ir_name())
    }

    /// Next position in the center → cone → edge cycle.
    pub fn next(self) -> Self {
        match self {
            MicPosition::Center => MicPosition::Cone,
            MicPosition::Cone => MicPosition::Edge,
            MicPosition::Edge => MicPosition::Center,
        }
    }
}

/// Decode WAV bytes into a mono impulse response.
///
/// Supports 16-bit, 24-bit, 32-bit integer and 32-bit float formats.
/// Multi-channel audio is downmixed to mono by averaging all channels.
pub fn read_wav_impulse(bytes: &[u8]) -> Result<ImpulseResponse, WavError> {
    let reader = WavReader::new(Cursor::new(bytes))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(WavError::NoChannels);
    }
    let sample_rate = check_sample_rate(spec.sample_rate as f64, RateKind::Source)
        .map_err(|_| WavError::InvalidSampleRate(spec.sample_rate))?;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let scale = match spec.bits_per_sample {
                16 => 1.0 / 32768.0,
                24 => 1.0 / 8388608.0,
                32 => 1.0 / 2147483648.0,
                bits => return Err(WavError::UnsupportedBitDepth(bits)),
            };
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<f32>, _>>()?
        }
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<Vec<f32>, _>>()?,
    };

    let frames = interleaved.len() / channels;
    if frames == 0 {
        return Err(WavError::Empty);
    }

    let inv_ch = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frames);
    for (frame, chunk) in interleaved.chunks_exact(channels).enumerate() {
        let sum: f32 = chunk.iter().sum();
        let sample = sum * inv_ch;
        if !sample.is_finite() {
            return Err(WavError::CorruptFloatData(frame));
        }
        mono.push(sample);
    }

    Ok(ImpulseResponse {
        source_sample_rate: sample_rate,
        channels: spec.channels as i32,
        samples: mono,
    })
}
