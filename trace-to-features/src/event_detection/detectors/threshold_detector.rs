use super::{Detector, Real, SampleIndex};
use crate::event_detection::Event;
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct ThresholdTrigger {
    pub threshold: Real,
    /// Runs shorter than this many samples are discarded.
    pub min_duration: usize,
}

impl Default for ThresholdTrigger {
    fn default() -> Self {
        Self {
            threshold: Real::default(),
            min_duration: 1,
        }
    }
}

pub trait ThresholdClass: Default + Clone {
    fn test(value: Real, threshold: Real) -> bool;
}

/// Samples strictly above the threshold are in-event.
#[derive(Default, Clone)]
pub struct UpperThreshold {}
impl ThresholdClass for UpperThreshold {
    fn test(value: Real, threshold: Real) -> bool {
        value > threshold
    }
}

/// Samples strictly below the threshold are in-event, as for current blockades.
#[derive(Default, Clone)]
pub struct LowerThreshold {}
impl ThresholdClass for LowerThreshold {
    fn test(value: Real, threshold: Real) -> bool {
        value < threshold
    }
}

/// Emits one [Event] per maximal run of in-event samples.
/// A run still open when the trace ends is closed at the end of the trace.
#[derive(Default, Clone)]
pub struct ThresholdDetector<Class: ThresholdClass> {
    // Start of the current run, if the detector is inside one
    start: Option<SampleIndex>,
    // One past the index of the most recent sample
    next: SampleIndex,
    trigger: ThresholdTrigger,
    phantom: PhantomData<Class>,
}

impl<Class: ThresholdClass> ThresholdDetector<Class> {
    pub fn new(trigger: &ThresholdTrigger) -> Self {
        Self {
            trigger: trigger.clone(),
            ..Default::default()
        }
    }

    fn close(&mut self, end: SampleIndex) -> Option<Event> {
        let start = self.start.take()?;
        (end - start >= self.trigger.min_duration.max(1)).then_some(Event { start, end })
    }
}

impl<Class: ThresholdClass> Detector for ThresholdDetector<Class> {
    type EventPointType = Event;

    fn signal(&mut self, time: SampleIndex, value: Real) -> Option<Event> {
        self.next = time + 1;
        if Class::test(value, self.trigger.threshold) {
            self.start.get_or_insert(time);
            None
        } else {
            self.close(time)
        }
    }

    fn finish(&mut self) -> Option<Event> {
        self.close(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_detection::EventFilter;

    fn detect<Class: ThresholdClass>(data: &[Real], threshold: Real, min_duration: usize) -> Vec<Event> {
        let detector = ThresholdDetector::<Class>::new(&ThresholdTrigger {
            threshold,
            min_duration,
        });
        data.iter().copied().enumerate().events(detector).collect()
    }

    #[test]
    fn zero_data() {
        let data: [Real; 0] = [];
        assert!(detect::<UpperThreshold>(&data, 2.0, 1).is_empty());
    }

    #[test]
    fn test_positive_threshold() {
        let data = [0.0, 0.0, 5.0, 6.0, 5.0, 0.0, 0.0, 7.0, 8.0, 7.0, 0.0];
        assert_eq!(
            detect::<UpperThreshold>(&data, 3.0, 1),
            vec![Event { start: 2, end: 5 }, Event { start: 7, end: 10 }]
        );
    }

    #[test]
    fn test_negative_threshold() {
        let data = [4.0, 3.0, 2.0, 5.0, 2.0, 1.0, 5.0, 7.0, 2.0, 4.0];
        assert_eq!(
            detect::<LowerThreshold>(&data, 2.5, 1),
            vec![
                Event { start: 2, end: 3 },
                Event { start: 4, end: 6 },
                Event { start: 8, end: 9 }
            ]
        );
    }

    #[test]
    fn value_equal_to_threshold_is_baseline() {
        let data = [3.0, 3.0, 4.0, 3.0];
        assert_eq!(
            detect::<UpperThreshold>(&data, 3.0, 1),
            vec![Event { start: 2, end: 3 }]
        );
    }

    #[test]
    fn trailing_run_is_closed_at_end_of_trace() {
        let data = [0.0, 0.0, 5.0, 6.0];
        assert_eq!(
            detect::<UpperThreshold>(&data, 3.0, 1),
            vec![Event { start: 2, end: 4 }]
        );
    }

    #[test]
    fn whole_trace_in_event() {
        let data = [5.0, 6.0, 7.0];
        assert_eq!(
            detect::<UpperThreshold>(&data, 3.0, 1),
            vec![Event { start: 0, end: 3 }]
        );
    }

    #[test]
    fn test_min_duration() {
        // Runs of length 1, 3 and 2 (trailing)
        let data = [5.0, 0.0, 5.0, 5.0, 5.0, 0.0, 5.0, 5.0];
        assert_eq!(
            detect::<UpperThreshold>(&data, 3.0, 2),
            vec![Event { start: 2, end: 5 }, Event { start: 6, end: 8 }]
        );
        assert_eq!(
            detect::<UpperThreshold>(&data, 3.0, 3),
            vec![Event { start: 2, end: 5 }]
        );
    }

    #[test]
    fn zero_min_duration_counts_every_run() {
        let data = [5.0, 0.0, 5.0];
        assert_eq!(detect::<UpperThreshold>(&data, 3.0, 0).len(), 2);
    }
}
