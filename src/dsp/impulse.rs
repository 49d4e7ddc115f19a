//! Impulse-response buffers.

use std::sync::Arc;

use serde::Serialize;

use super::resampler::{ResampleMethod, resample};

/// A mono impulse response at the rate it was captured at.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    pub source_sample_rate: u32,
    /// Reserved impulse-header word; channel count in most files.
    pub channels: i32,
    pub samples: Vec<f32>,
}

impl ImpulseResponse {
    pub fn new(samples: Vec<f32>, source_sample_rate: u32) -> Self {
        ImpulseResponse {
            source_sample_rate,
            channels: 1,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds at the capture rate.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.source_sample_rate as f64
    }

    /// Convert to `target_sample_rate`. Equal rates copy the samples unchanged.
    pub fn resample(&self, target_sample_rate: u32, method: ResampleMethod) -> ResampledImpulse {
        let samples = resample(&self.samples, self.source_sample_rate, target_sample_rate, method);
        ResampledImpulse {
            sample_rate: target_sample_rate,
            samples: samples.into(),
        }
    }
}

/// An impulse response at the playback rate, ready for a convolver.
///
/// Immutable once built; clones share the sample buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResampledImpulse {
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl ResampledImpulse {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_tags_target_rate() {
        let ir = ImpulseResponse::new(vec![1.0, 0.5, 0.25, 0.125], 24000);
        let out = ir.resample(48000, ResampleMethod::Linear);
        assert_eq!(out.sample_rate, 48000);
        assert_eq!(out.len(), 8);
        assert!((out.duration_secs() - ir.duration_secs()).abs() < 1e-9);
    }

    #[test]
    fn clones_share_samples() {
        let ir = ImpulseResponse::new(vec![0.0, 0.5, -0.5, 0.0], 48000);
        let a = ir.resample(48000, ResampleMethod::Sinc);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.samples, &b.samples));
        assert_eq!(b.samples(), &[0.0, 0.5, -0.5, 0.0]);
    }
}
