pub mod level_detector;
pub mod threshold_detector;

use nanopore_common::{Real, SampleIndex};

pub trait Detector {
    type EventPointType;

    /// Feeds one sample to the detector, returning an event if one has just completed.
    fn signal(&mut self, time: SampleIndex, value: Real) -> Option<Self::EventPointType>;

    /// Called once the trace is exhausted, returning any event still open.
    fn finish(&mut self) -> Option<Self::EventPointType>;
}
