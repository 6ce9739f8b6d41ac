use super::{Detector, Real, SampleIndex};
use crate::event_detection::{Level, RunningMean};

#[derive(Default, Clone)]
struct OpenLevel {
    start: SampleIndex,
    mean: RunningMean,
}

/// Groups consecutive samples into plateaus.
/// The representative value of a level is the running mean of its samples;
/// a sample further than `tolerance` from it opens a new level.
#[derive(Default, Clone)]
pub struct LevelDetector {
    tolerance: Real,
    level: Option<OpenLevel>,
    next: SampleIndex,
}

impl LevelDetector {
    pub fn new(tolerance: Real) -> Self {
        Self {
            tolerance,
            ..Default::default()
        }
    }

    fn close(&mut self, end: SampleIndex) -> Option<Level> {
        self.level.take().map(|level| Level {
            start: level.start,
            end,
            mean: level.mean.mean(),
        })
    }
}

impl Detector for LevelDetector {
    type EventPointType = Level;

    fn signal(&mut self, time: SampleIndex, value: Real) -> Option<Level> {
        self.next = time + 1;
        if let Some(level) = &mut self.level {
            if (value - level.mean.mean()).abs() <= self.tolerance {
                level.mean.push(value);
                return None;
            }
        }
        let finished = self.close(time);
        self.level = Some(OpenLevel {
            start: time,
            mean: [value].into_iter().collect(),
        });
        finished
    }

    fn finish(&mut self) -> Option<Level> {
        self.close(self.next)
    }
}
