use nanopore_common::{Real, SampleIndex};
use std::{fmt::Display, ops::Range};

/// An abstraction of the types that are processed by the detectors.
/// To implement TracePoint a type must contain a sample index and a value.
pub trait TracePoint: Clone {
    /// Returns the index of the sample within the trace.
    fn get_time(&self) -> SampleIndex;

    /// Returns the value of the sample.
    fn get_value(&self) -> Real;
}

/// The most basic TracePoint type, as produced by `trace.iter().copied().enumerate()`.
impl TracePoint for (SampleIndex, Real) {
    fn get_time(&self) -> SampleIndex {
        self.0
    }

    fn get_value(&self) -> Real {
        self.1
    }
}

/// A contiguous, half-open range of samples `[start, end)` detected as one translocation.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub start: SampleIndex,
    pub end: SampleIndex,
}

impl Event {
    /// Number of samples covered by the event. Always positive for detected events.
    pub fn dwell(&self) -> usize {
        self.end - self.start
    }

    pub fn range(&self) -> Range<SampleIndex> {
        self.start..self.end
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{0},{1}", self.start, self.end))
    }
}

/// A plateau within an event: consecutive samples within tolerance of the running mean.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub start: SampleIndex,
    pub end: SampleIndex,
    pub mean: Real,
}

/// Arithmetic mean of a stream of values.
/// Updated incrementally on halved operands, so values anywhere in the range
/// of [Real] cannot overflow it.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct RunningMean {
    mean: Real,
    count: usize,
}

impl RunningMean {
    pub fn push(&mut self, value: Real) {
        self.count += 1;
        self.mean += (value / 2.0 - self.mean / 2.0) / self.count as Real * 2.0;
    }

    /// Zero if no values have been pushed.
    pub fn mean(&self) -> Real {
        self.mean
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl FromIterator<Real> for RunningMean {
    fn from_iter<T: IntoIterator<Item = Real>>(iter: T) -> Self {
        let mut mean = Self::default();
        iter.into_iter().for_each(|value| mean.push(value));
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn event_dwell_and_range() {
        let event = Event { start: 2, end: 5 };
        assert_eq!(event.dwell(), 3);
        assert_eq!(event.range(), 2..5);
        assert_eq!(event.to_string(), "2,5");
    }

    #[test]
    fn running_mean_of_small_values() {
        let mean: RunningMean = [5.0, 6.0, 5.0].into_iter().collect();
        assert_eq!(mean.count(), 3);
        assert_approx_eq!(mean.mean(), 16.0 / 3.0);
        assert_eq!(RunningMean::default().mean(), 0.0);
    }

    #[test]
    fn running_mean_near_the_largest_float() {
        let mean: RunningMean = [Real::MAX, Real::MAX].into_iter().collect();
        assert_eq!(mean.mean(), Real::MAX);

        let mean: RunningMean = [1e308, 1e308, -1e308].into_iter().collect();
        assert!(mean.mean().is_finite());
        assert_approx_eq!(mean.mean() / 1e307, 10.0 / 3.0);
    }
}
