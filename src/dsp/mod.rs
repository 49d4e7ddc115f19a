//! DSP helpers for impulse responses.
//!
//! Everything here runs offline on whole buffers, off the realtime path.
//! The host's convolver consumes the result.

pub mod impulse;
pub mod resampler;

pub use impulse::{ImpulseResponse, ResampledImpulse};
pub use resampler::ResampleMethod;
