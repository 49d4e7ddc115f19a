//! `.tapf` profile decoder.
//!
//! # File Structure
//!
//! ```text
//! Offset                       Size            Type        Description
//! ─────────────────────────────────────────────────────────────────────────
//! 0                            profile_size    [f32 LE]    Header; slot 0 reserved
//! profile_size                 impulse_size    [i32 LE]    [0] rate, [1] channels, [2] count
//! profile_size + impulse_size  count * 4       [f32 LE]    Mono impulse samples
//! ```
//!
//! Header slots map to parameter names through a [`ProfileLayout`].
//! Decoding is a pure function of its inputs: no I/O, no shared state.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::dsp::{ImpulseResponse, ResampleMethod, ResampledImpulse};
use crate::error::{DecodeError, RateKind, Section};
use crate::profile::{AmplifierProfile, FIELD_SIZE, ProfileLayout};

/// Lowest sample rate accepted for capture or playback.
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Highest sample rate accepted for capture or playback.
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Validate a sample rate given as a host number (JS numbers are f64).
pub fn check_sample_rate(rate: f64, kind: RateKind) -> Result<u32, DecodeError> {
    let in_range = rate >= MIN_SAMPLE_RATE as f64 && rate <= MAX_SAMPLE_RATE as f64;
    if !rate.is_finite() || rate.fract() != 0.0 || !in_range {
        return Err(DecodeError::InvalidSampleRate { kind, rate });
    }
    Ok(rate as u32)
}

fn read_f32s(bytes: &[u8]) -> impl Iterator<Item = f32> + '_ {
    bytes
        .chunks_exact(FIELD_SIZE)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
}

fn read_i32s(bytes: &[u8]) -> impl Iterator<Item = i32> + '_ {
    bytes
        .chunks_exact(FIELD_SIZE)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
}

/// Decodes `.tapf` buffers with a fixed layout and resampling method.
#[derive(Debug, Clone, Default)]
pub struct ProfileDecoder {
    layout: ProfileLayout,
    method: ResampleMethod,
}

impl ProfileDecoder {
    pub fn new(layout: ProfileLayout) -> Self {
        ProfileDecoder {
            layout,
            method: ResampleMethod::default(),
        }
    }

    pub fn with_method(mut self, method: ResampleMethod) -> Self {
        self.method = method;
        self
    }

    pub fn layout(&self) -> &ProfileLayout {
        &self.layout
    }

    pub fn method(&self) -> ResampleMethod {
        self.method
    }

    /// Decode `buffer` and resample its impulse to `target_sample_rate`.
    pub fn decode(
        &self,
        buffer: &[u8],
        source: &str,
        target_sample_rate: u32,
    ) -> Result<(AmplifierProfile, ResampledImpulse), DecodeError> {
        let target = check_sample_rate(target_sample_rate as f64, RateKind::Target)?;
        let (profile, impulse) = self.decode_raw(buffer, source)?;
        let resampled = impulse.resample(target, self.method);

        debug!(
            "decoded profile '{source}': {} params, {} samples @ {} Hz -> {} samples @ {} Hz",
            profile.len(),
            impulse.len(),
            impulse.source_sample_rate,
            resampled.len(),
            resampled.sample_rate,
        );
        Ok((profile, resampled))
    }

    /// Decode `buffer` without resampling the impulse.
    pub fn decode_raw(
        &self,
        buffer: &[u8],
        source: &str,
    ) -> Result<(AmplifierProfile, ImpulseResponse), DecodeError> {
        let layout = &self.layout;
        layout.validate()?;

        let preamble = layout.preamble_size();
        if buffer.len() < preamble {
            return Err(DecodeError::TruncatedHeader {
                needed: preamble,
                actual: buffer.len(),
            });
        }
        let (header, rest) = buffer.split_at(layout.profile_size);
        let (impulse_header, body) = rest.split_at(layout.impulse_size);

        // Header: positional f32 fields
        let fields: Vec<f32> = read_f32s(header).collect();
        let mut params = BTreeMap::new();
        for (index, name) in layout.mapped_props() {
            let value = fields[index];
            if !value.is_finite() {
                return Err(DecodeError::CorruptFloatData {
                    section: Section::Header,
                    index,
                });
            }
            params.insert(name.to_string(), value);
        }
        let profile = AmplifierProfile::new(source, params);

        // Impulse header: [rate, channels, count, ...]
        let words: Vec<i32> = read_i32s(impulse_header).collect();
        let (rate, channels, count) = (words[0], words[1], words[2]);
        let source_sample_rate = check_sample_rate(rate as f64, RateKind::Source)?;

        let available = body.len() / FIELD_SIZE;
        if count < 0 || count as usize > available {
            return Err(DecodeError::TruncatedImpulse {
                declared: count as i64,
                available,
            });
        }
        if count == 0 {
            return Err(DecodeError::EmptyImpulse);
        }

        let used = count as usize * FIELD_SIZE;
        if body.len() > used {
            warn!(
                "profile '{source}' has {} trailing bytes after the impulse",
                body.len() - used
            );
        }

        let mut samples = Vec::with_capacity(count as usize);
        for (index, sample) in read_f32s(&body[..used]).enumerate() {
            if !sample.is_finite() {
                return Err(DecodeError::CorruptFloatData {
                    section: Section::Impulse,
                    index,
                });
            }
            samples.push(sample);
        }

        let impulse = ImpulseResponse {
            source_sample_rate,
            channels,
            samples,
        };
        Ok((profile, impulse))
    }
}

/// Decode a `.tapf` buffer with the built-in tube-amp layout.
pub fn decode(
    buffer: &[u8],
    source: &str,
    target_sample_rate: u32,
) -> Result<(AmplifierProfile, ResampledImpulse), DecodeError> {
    ProfileDecoder::default().decode(buffer, source, target_sample_rate)
}

/// Write a `.tapf` buffer. `header` holds one value per layout slot,
/// reserved slots included.
pub fn encode(
    layout: &ProfileLayout,
    header: &[f32],
    impulse: &ImpulseResponse,
) -> Result<Vec<u8>, DecodeError> {
    layout.validate()?;
    if header.len() != layout.header_fields() {
        return Err(DecodeError::SchemaMismatch {
            props: layout.header_fields(),
            fields: header.len(),
        });
    }

    let sample_bytes = impulse.samples.len() * FIELD_SIZE;
    let mut buf = Vec::with_capacity(layout.preamble_size() + sample_bytes);

    for &value in header {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    let words = layout.impulse_size / FIELD_SIZE;
    let info = [
        impulse.source_sample_rate as i32,
        impulse.channels,
        impulse.samples.len() as i32,
    ];
    for i in 0..words {
        buf.extend_from_slice(&info.get(i).copied().unwrap_or(0).to_le_bytes());
    }

    for &sample in &impulse.samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    Ok(buf)
}
