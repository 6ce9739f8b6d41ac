//! This module provides tools for segmenting a raw trace into
//! events, each of which represents one translocation through the pore.
//!
//! A raw trace takes the form of a slice of scalar values. Typical usage
//! of this module may look like:
//! ```rust
//! use trace_to_features::event_detection::{
//!     EventFilter,
//!     threshold_detector::{ThresholdDetector, ThresholdTrigger, UpperThreshold},
//! };
//!
//! let trace = [0.0, 0.0, 5.0, 6.0, 5.0, 0.0];
//! let events: Vec<_> = trace
//!     .iter()
//!     .copied()
//!     .enumerate()                                    // pairs each sample with its index
//!     .events(ThresholdDetector::<UpperThreshold>::new(&ThresholdTrigger {
//!         threshold: 3.0,                             // samples above 3.0 are in-event
//!         min_duration: 1,
//!     }))
//!     .collect();
//! assert_eq!(events.len(), 1);
//! ```

pub mod datatype;
pub mod detectors;
pub mod iterators;

pub use datatype::{Event, Level, RunningMean, TracePoint};
pub use detectors::{Detector, level_detector, threshold_detector};
pub use iterators::EventFilter;
