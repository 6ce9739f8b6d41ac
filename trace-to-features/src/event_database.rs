use crate::{
    error::{FeatureError, FeatureResult, InputContext},
    event_detection::Event,
    trace::Trace,
};
use itertools::Itertools;
use nanopore_common::{Real, SampleIndex};

/// A trace that arrives already segmented: the events, and the number of
/// levels fitted to each, are supplied alongside the samples rather than detected.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDatabase {
    trace: Trace,
    events: Vec<Event>,
    level_counts: Vec<usize>,
}

impl EventDatabase {
    /// Fails unless every event is non-empty, lies within the trace, starts
    /// after the previous one ends, and has at least one level.
    pub fn new(trace: Trace, events: Vec<Event>, level_counts: Vec<usize>) -> FeatureResult<Self> {
        let invalid = |reason: String| FeatureError::invalid(InputContext::EventDatabase, reason);

        if events.len() != level_counts.len() {
            return Err(invalid(format!(
                "{} events but {} level counts",
                events.len(),
                level_counts.len()
            )));
        }
        for (index, event) in events.iter().enumerate() {
            if event.start >= event.end {
                return Err(invalid(format!("event {index} has no samples")));
            }
            if event.end > trace.len() {
                return Err(invalid(format!(
                    "event {index} ({event}) ends beyond the {} samples of the trace",
                    trace.len()
                )));
            }
        }
        if let Some((index, _)) = events
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (previous, next))| next.start < previous.end)
        {
            return Err(invalid(format!(
                "event {} starts before event {index} ends",
                index + 1
            )));
        }
        if let Some(index) = level_counts.iter().position(|&count| count == 0) {
            return Err(invalid(format!("event {index} has no levels")));
        }

        Ok(Self {
            trace,
            events,
            level_counts,
        })
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn level_counts(&self) -> &[usize] {
        &self.level_counts
    }

    /// Each event paired with its level count, in trace order.
    pub fn iter(&self) -> impl Iterator<Item = (&Event, usize)> + '_ {
        self.events.iter().zip(self.level_counts.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Converts a coordinate or count stored as a floating point number.
pub(crate) fn to_index(value: Real, what: &str) -> FeatureResult<SampleIndex> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= SampleIndex::MAX as Real {
        Ok(value as SampleIndex)
    } else {
        Err(FeatureError::invalid(
            InputContext::EventDatabase,
            format!("{what} {value} is not a non-negative whole number"),
        ))
    }
}
