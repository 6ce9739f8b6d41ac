pub mod tracer;

pub use tracer::{TracerEngine, TracerError, TracerOptions};

/// Scalar type of trace samples and of every feature value.
pub type Real = f64;

/// Position of a sample within a trace.
pub type SampleIndex = usize;

/// Sampling rate of a trace, in Hz.
pub type SampleRate = f64;
