use crate::{
    error::{FeatureError, FeatureResult, InputContext},
    event_detection::threshold_detector::ThresholdTrigger,
};
use clap::{Args, ValueEnum};
use nanopore_common::{Real, SampleRate};
use std::path::PathBuf;

/// Which side of the threshold counts as in-event.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Polarity {
    /// Samples above the threshold are in-event.
    #[default]
    Upper,
    /// Samples below the threshold are in-event (current blockades).
    Lower,
}

#[derive(Debug, Clone, Args)]
pub struct DetectionParameters {
    /// Value separating baseline samples from in-event samples.
    /// Needed unless the input is an event database.
    #[clap(long, allow_negative_numbers = true)]
    pub threshold: Option<Real>,

    /// Largest deviation from the running level mean that stays on the same level.
    #[clap(long, default_value = "0")]
    pub level_tolerance: Real,

    #[clap(long, value_enum, default_value_t = Polarity::Upper)]
    pub polarity: Polarity,

    /// Events shorter than this many samples are discarded.
    #[clap(long, default_value = "1")]
    pub min_dwell: usize,

    /// If set, dwell times are reported in seconds rather than samples.
    #[clap(long)]
    pub sample_rate: Option<SampleRate>,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            threshold: None,
            level_tolerance: Real::default(),
            polarity: Polarity::default(),
            min_dwell: 1,
            sample_rate: None,
        }
    }
}

impl DetectionParameters {
    pub fn validate(&self) -> FeatureResult<()> {
        let fail = |reason: &str| -> FeatureResult<()> {
            Err(FeatureError::invalid(
                InputContext::DetectionParameters,
                reason,
            ))
        };
        if self.threshold.is_some_and(|threshold| !threshold.is_finite()) {
            return fail("threshold must be a finite number");
        }
        if !self.level_tolerance.is_finite() || self.level_tolerance < 0.0 {
            return fail("level tolerance must be a non-negative number");
        }
        if self.min_dwell == 0 {
            return fail("minimum dwell must be at least one sample");
        }
        if let Some(sample_rate) = self.sample_rate {
            if !sample_rate.is_finite() || sample_rate <= 0.0 {
                return fail("sample rate must be a positive number");
            }
        }
        Ok(())
    }

    pub(crate) fn trigger(&self) -> FeatureResult<ThresholdTrigger> {
        let threshold = self.threshold.ok_or_else(|| {
            FeatureError::invalid(
                InputContext::DetectionParameters,
                "a threshold is needed to detect events",
            )
        })?;
        Ok(ThresholdTrigger {
            threshold,
            min_duration: self.min_dwell,
        })
    }
}

/// How the events of an input file are found.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputLayout {
    /// A raw trace, segmented with the threshold detector.
    #[default]
    Trace,
    /// A trace with its events already segmented: `Coordinates`, `Events`,
    /// `Fits`, `EventFits` and `Levels` columns in CSV files, or the
    /// `EventDatabase` struct with `ConcatenatedEvents` and `ConcatenatedFits`
    /// in MAT-files.
    EventDatabase,
}

/// Names of the arrays (matrix files) or columns (CSV files) holding the trace.
/// The names are fixed for event databases.
#[derive(Debug, Clone, Args)]
pub struct InputParameters {
    #[clap(long, value_enum, default_value_t = InputLayout::Trace)]
    pub layout: InputLayout,

    #[clap(long, default_value = "trace")]
    pub trace_name: String,

    /// Idealised fit of the trace, used for event means when present.
    #[clap(long)]
    pub fit_name: Option<String>,
}

impl Default for InputParameters {
    fn default() -> Self {
        Self {
            layout: InputLayout::default(),
            trace_name: "trace".to_owned(),
            fit_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRange {
    pub min: Real,
    pub max: Real,
}

impl Default for TargetRange {
    fn default() -> Self {
        Self { min: 0.0, max: 255.0 }
    }
}

impl TargetRange {
    pub fn midpoint(&self) -> Real {
        (self.min + self.max) / 2.0
    }

    /// The bounds must be finite and ordered, and their difference must be finite too.
    pub fn validate(&self) -> FeatureResult<()> {
        if !(self.max - self.min).is_finite() || self.min >= self.max {
            return Err(FeatureError::invalid(
                InputContext::TargetRange,
                format!("expected finite bounds with min < max, got [{}, {}]", self.min, self.max),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct NormalisationParameters {
    #[clap(long, default_value = "0", allow_negative_numbers = true)]
    pub target_min: Real,

    #[clap(long, default_value = "255", allow_negative_numbers = true)]
    pub target_max: Real,

    /// Write raw feature values instead of normalised ones.
    #[clap(long)]
    pub raw: bool,
}

impl Default for NormalisationParameters {
    fn default() -> Self {
        let range = TargetRange::default();
        Self {
            target_min: range.min,
            target_max: range.max,
            raw: false,
        }
    }
}

impl NormalisationParameters {
    /// The range to normalise into, or `None` if raw values were requested.
    pub fn target_range(&self) -> Option<TargetRange> {
        (!self.raw).then_some(TargetRange {
            min: self.target_min,
            max: self.target_max,
        })
    }
}

/// Everything needed to turn one input file into one feature table file.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub detection: DetectionParameters,
    pub input: InputParameters,
    pub normalisation: NormalisationParameters,
}
