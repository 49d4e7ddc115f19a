//! Offline sample-rate conversion for impulse responses.
//!
//! Both methods are deterministic and work on a whole buffer at once.
//! Equal rates are a bit-exact copy.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Zero crossings of the sinc kernel on each side of the centre tap.
const ZERO_CROSSINGS: usize = 16;

/// Kaiser window shape; ~80 dB stopband.
const KAISER_BETA: f64 = 8.0;

/// How impulse responses are converted between sample rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Two-point linear interpolation. No anti-aliasing when downsampling.
    Linear,
    /// Kaiser-windowed sinc, band-limited to the lower of the two Nyquist rates.
    #[default]
    Sinc,
}

/// Number of samples `input_len` samples become at the new rate.
///
/// Rounds up, so upsampling never drops the tail.
pub fn output_len(input_len: usize, src_rate: u32, dst_rate: u32) -> usize {
    if src_rate == dst_rate {
        return input_len;
    }
    let num = input_len as u64 * dst_rate as u64 + src_rate as u64 - 1;
    (num / src_rate as u64) as usize
}

/// Convert `input` from `src_rate` to `dst_rate`. Both rates must be non-zero.
pub fn resample(input: &[f32], src_rate: u32, dst_rate: u32, method: ResampleMethod) -> Vec<f32> {
    debug_assert!(src_rate > 0 && dst_rate > 0, "sample rates must be non-zero");
    if src_rate == dst_rate || input.is_empty() {
        return input.to_vec();
    }

    match method {
        ResampleMethod::Linear => resample_linear(input, src_rate, dst_rate),
        ResampleMethod::Sinc => SincKernel::new(src_rate, dst_rate).resample(input, dst_rate),
    }
}

/// Input position (in source samples) of output sample `index`.
#[inline]
fn source_position(index: usize, src_rate: u32, dst_rate: u32) -> f64 {
    (index as u64 * src_rate as u64) as f64 / dst_rate as f64
}

/// Read a sample with linear interpolation at a fractional position.
/// Past the last sample the signal holds its final value, then falls silent.
fn read_interpolated(data: &[f32], position: f64) -> f64 {
    if data.is_empty() || position < 0.0 {
        return 0.0;
    }

    let idx = position as usize;
    if idx >= data.len() - 1 {
        return if idx < data.len() { data[idx] as f64 } else { 0.0 };
    }

    let frac = position - idx as f64;
    data[idx] as f64 * (1.0 - frac) + data[idx + 1] as f64 * frac
}

fn resample_linear(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    (0..output_len(input.len(), src_rate, dst_rate))
        .map(|i| read_interpolated(input, source_position(i, src_rate, dst_rate)) as f32)
        .collect()
}

/// Windowed-sinc interpolation kernel for one rate pair.
struct SincKernel {
    src_rate: u32,
    /// Normalised cutoff, `min(1, dst/src)`.
    cutoff: f64,
    /// Kernel half-width in source samples.
    half_width: f64,
    i0_beta: f64,
}

impl SincKernel {
    fn new(src_rate: u32, dst_rate: u32) -> Self {
        let cutoff = (dst_rate as f64 / src_rate as f64).min(1.0);
        SincKernel {
            src_rate,
            cutoff,
            half_width: ZERO_CROSSINGS as f64 / cutoff,
            i0_beta: bessel_i0(KAISER_BETA),
        }
    }

    #[inline]
    fn weight(&self, offset: f64) -> f64 {
        let x = offset / self.half_width;
        if x.abs() >= 1.0 {
            return 0.0;
        }
        let arg = PI * self.cutoff * offset;
        let sinc = if arg.abs() < 1e-12 { 1.0 } else { arg.sin() / arg };
        let window = bessel_i0(KAISER_BETA * (1.0 - x * x).sqrt()) / self.i0_beta;
        self.cutoff * sinc * window
    }

    fn resample(&self, input: &[f32], dst_rate: u32) -> Vec<f32> {
        let n = input.len() as i64;
        (0..output_len(input.len(), self.src_rate, dst_rate))
            .map(|i| {
                let t = source_position(i, self.src_rate, dst_rate);
                let first = (t - self.half_width).ceil() as i64;
                let last = (t + self.half_width).floor() as i64;

                // Normalise over the whole kernel so DC passes at unity gain,
                // while taps outside the buffer read as silence.
                let mut acc = 0.0f64;
                let mut norm = 0.0f64;
                for j in first..=last {
                    let w = self.weight(t - j as f64);
                    norm += w;
                    if (0..n).contains(&j) {
                        acc += input[j as usize] as f64 * w;
                    }
                }
                if norm.abs() > f64::EPSILON { (acc / norm) as f32 } else { 0.0 }
            })
            .collect()
    }
}

/// Modified zeroth-order Bessel function of the first kind (I0).
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let x2 = x * x * 0.25;
    for k in 1..50 {
        term *= x2 / (k * k) as f64;
        sum += term;
        if term < 1e-12 * sum {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI as PI32;

    fn sine(freq: f32, rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI32 * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn output_len_rounds_up() {
        assert_eq!(output_len(4, 48000, 48000), 4);
        assert_eq!(output_len(4, 48000, 96000), 8);
        assert_eq!(output_len(480, 48000, 24000), 240);
        assert_eq!(output_len(441, 44100, 48000), 480);
        // 3 * 44100 / 48000 = 2.75625 → 3
        assert_eq!(output_len(3, 48000, 44100), 3);
        assert_eq!(output_len(0, 44100, 48000), 0);
    }

    #[test]
    fn same_rate_is_bit_exact() {
        let input = vec![0.0, 0.5, -0.5, 0.0, 0.123_456_7];
        for method in [ResampleMethod::Linear, ResampleMethod::Sinc] {
            let out = resample(&input, 48000, 48000, method);
            assert_eq!(out, input);
        }
    }

    #[test]
    fn linear_upsample_interpolates_midpoints() {
        let out = resample(&[0.0, 1.0, 0.0], 24000, 48000, ResampleMethod::Linear);
        assert_eq!(out.len(), 6);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        assert!((out[3] - 0.5).abs() < 1e-6);
        assert_eq!(out[4], 0.0);
    }

    #[test]
    fn upsample_doubles_length() {
        let input = sine(1000.0, 24000, 240);
        for method in [ResampleMethod::Linear, ResampleMethod::Sinc] {
            let out = resample(&input, 24000, 48000, method);
            assert_eq!(out.len(), 480, "{method:?}");
        }
    }

    #[test]
    fn dc_level_is_preserved() {
        let input = vec![0.25f32; 2000];
        for (src, dst) in [(44100, 48000), (48000, 44100), (96000, 48000)] {
            for method in [ResampleMethod::Linear, ResampleMethod::Sinc] {
                let out = resample(&input, src, dst, method);
                // Ignore the edges, where sinc taps run off the buffer.
                let mid = &out[out.len() / 4..out.len() * 3 / 4];
                for &s in mid {
                    assert!((s - 0.25).abs() < 1e-3, "{method:?} {src}->{dst}: {s}");
                }
            }
        }
    }

    #[test]
    fn sinc_keeps_passband_tone() {
        let input = sine(1000.0, 48000, 4800);
        let out = resample(&input, 48000, 44100, ResampleMethod::Sinc);
        let mid = &out[400..out.len() - 400];
        let ratio = rms(mid) / rms(&input[400..input.len() - 400]);
        assert!(ratio > 0.95 && ratio < 1.05, "passband ratio {ratio}");
    }

    #[test]
    fn sinc_downsample_rejects_alias() {
        // 12 kHz is above the 8 kHz Nyquist of the 16 kHz output.
        let input = sine(12000.0, 48000, 4800);
        let out = resample(&input, 48000, 16000, ResampleMethod::Sinc);
        assert_eq!(out.len(), 1600);
        let mid = &out[200..out.len() - 200];
        assert!(rms(mid) < 0.01, "alias leaked: rms {}", rms(mid));
    }

    #[test]
    fn resampling_is_deterministic() {
        let input = sine(440.0, 44100, 1000);
        let a = resample(&input, 44100, 48000, ResampleMethod::Sinc);
        let b = resample(&input, 44100, 48000, ResampleMethod::Sinc);
        assert_eq!(a, b);
    }

    #[test]
    fn method_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ResampleMethod::Sinc).unwrap(), "\"sinc\"");
        let m: ResampleMethod = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(m, ResampleMethod::Linear);
    }
}
