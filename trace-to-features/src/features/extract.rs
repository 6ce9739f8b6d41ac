use super::{FeatureRow, FeatureTable};
use crate::{
    error::{FeatureError, FeatureResult, InputContext},
    event_database::EventDatabase,
    event_detection::{
        Event, EventFilter, RunningMean,
        level_detector::LevelDetector,
        threshold_detector::{
            LowerThreshold, ThresholdClass, ThresholdDetector, ThresholdTrigger, UpperThreshold,
        },
    },
    parameters::{DetectionParameters, Polarity},
    trace::Trace,
};
use itertools::Itertools;
use nanopore_common::{Real, SampleRate};
use tracing::debug;

/// Segments `trace` into events and summarises each one as a [FeatureRow].
///
/// Rows appear in the order the events occur along the trace. A trace with
/// no in-event samples yields an empty table. An event still open at the end
/// of the trace is closed there, so its dwell time counts only the samples recorded.
pub fn extract(trace: &Trace, parameters: &DetectionParameters) -> FeatureResult<FeatureTable> {
    parameters.validate()?;
    if trace.is_empty() {
        return Err(FeatureError::invalid(InputContext::Trace, "no samples"));
    }

    let trigger = parameters.trigger()?;
    let events = match parameters.polarity {
        Polarity::Upper => detect::<UpperThreshold>(trace.samples(), &trigger),
        Polarity::Lower => detect::<LowerThreshold>(trace.samples(), &trigger),
    };
    debug!(
        "Detected {} events in {} samples",
        events.len(),
        trace.len()
    );

    events
        .iter()
        .map(|event| {
            let fitted = fitted_samples(trace, event)?;
            let level_count = fitted
                .iter()
                .copied()
                .enumerate()
                .events(LevelDetector::new(parameters.level_tolerance))
                .count();
            event_features(trace, event, level_count, parameters.sample_rate)
        })
        .collect()
}

/// Summarises the events of an already segmented trace, taking each level
/// count as supplied. Only the sample rate of `parameters` applies.
pub fn summarise(
    database: &EventDatabase,
    parameters: &DetectionParameters,
) -> FeatureResult<FeatureTable> {
    parameters.validate()?;
    debug!(
        "Summarising {} supplied events in {} samples",
        database.len(),
        database.trace().len()
    );
    database
        .iter()
        .map(|(event, level_count)| {
            event_features(database.trace(), event, level_count, parameters.sample_rate)
        })
        .collect()
}

fn detect<Class: ThresholdClass>(samples: &[Real], trigger: &ThresholdTrigger) -> Vec<Event> {
    samples
        .iter()
        .copied()
        .enumerate()
        .events(ThresholdDetector::<Class>::new(trigger))
        .collect()
}

fn out_of_range(event: &Event) -> FeatureError {
    FeatureError::invalid(
        InputContext::Trace,
        format!("event {event} lies outside the trace"),
    )
}

/// The samples of `event` taken from the fit when the trace carries one, otherwise the raw samples.
fn fitted_samples<'a>(trace: &'a Trace, event: &Event) -> FeatureResult<&'a [Real]> {
    trace
        .fit()
        .unwrap_or(trace.samples())
        .get(event.range())
        .ok_or_else(|| out_of_range(event))
}

/// Mean comes from the fit when the trace carries one; height is always
/// taken from the raw samples.
fn event_features(
    trace: &Trace,
    event: &Event,
    level_count: usize,
    sample_rate: Option<SampleRate>,
) -> FeatureResult<FeatureRow> {
    let raw = trace
        .samples()
        .get(event.range())
        .ok_or_else(|| out_of_range(event))?;
    let fitted = fitted_samples(trace, event)?;

    let (min, max) = raw
        .iter()
        .copied()
        .minmax_by(Real::total_cmp)
        .into_option()
        .ok_or_else(|| out_of_range(event))?;
    let height = max - min;
    if !height.is_finite() {
        return Err(FeatureError::invalid(
            InputContext::Trace,
            format!("height of event {event} is beyond the range of a float ({max} - {min})"),
        ));
    }

    let dwell = event.dwell() as Real;
    Ok(FeatureRow {
        coordinate: event.start as Real,
        dwell_time: sample_rate.map_or(dwell, |sample_rate| dwell / sample_rate),
        mean: fitted.iter().copied().collect::<RunningMean>().mean(),
        height,
        level_count: level_count as Real,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Column;
    use assert_approx_eq::assert_approx_eq;

    fn parameters(threshold: Real) -> DetectionParameters {
        DetectionParameters {
            threshold: Some(threshold),
            level_tolerance: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn two_events() {
        let trace = Trace::new(vec![0., 0., 5., 6., 5., 0., 0., 7., 8., 7., 0.]).unwrap();
        let table = extract(&trace, &parameters(3.0)).unwrap();
        assert_eq!(table.len(), 2);

        let first = table.rows().first().unwrap();
        assert_eq!(first.coordinate, 2.0);
        assert_eq!(first.dwell_time, 3.0);
        assert_approx_eq!(first.mean, 5.333333, 1e-5);
        assert_eq!(first.height, 1.0);
        assert_eq!(first.level_count, 1.0);

        let second = table.rows().last().unwrap();
        assert_eq!(second.coordinate, 7.0);
        assert_eq!(second.dwell_time, 3.0);
        assert_approx_eq!(second.mean, 7.333333, 1e-5);
        assert_eq!(second.height, 1.0);
        assert_eq!(second.level_count, 1.0);
    }

    #[test]
    fn trace_below_threshold_gives_empty_table() {
        let trace = Trace::new(vec![0.0; 16]).unwrap();
        let table = extract(&trace, &parameters(3.0)).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn empty_trace_is_invalid() {
        let result = extract(&Trace::default(), &parameters(3.0));
        assert!(matches!(result, Err(FeatureError::InvalidInput { .. })));
    }

    #[test]
    fn trailing_event_closed_at_end_of_trace() {
        let trace = Trace::new(vec![0., 0., 0., 5., 9., 9.]).unwrap();
        let table = extract(&trace, &parameters(3.0)).unwrap();
        assert_eq!(table.len(), 1);
        let row = table.rows().first().unwrap();
        assert_eq!(row.coordinate, 3.0);
        assert_eq!(row.dwell_time, 3.0);
        assert_eq!(row.height, 4.0);
        assert_eq!(row.level_count, 2.0);
    }

    #[test]
    fn events_are_ordered_and_disjoint() {
        let samples: Vec<Real> = (0..2000)
            .map(|i| {
                let i = i as Real;
                10.0 * (i / 37.0).sin() + 3.0 * (i / 5.0).cos()
            })
            .collect();
        let trace = Trace::new(samples).unwrap();
        let table = extract(&trace, &parameters(4.0)).unwrap();
        assert!(!table.is_empty());
        for row in table.rows() {
            assert!(row.dwell_time > 0.0);
            assert!(row.level_count >= 1.0);
            assert!(row.height >= 0.0);
        }
        for (a, b) in table.rows().iter().tuple_windows() {
            assert!(a.coordinate + a.dwell_time < b.coordinate);
        }
    }

    #[test]
    fn lower_polarity_detects_blockades() {
        let trace = Trace::new(vec![100., 100., 40., 42., 100., 30., 100.]).unwrap();
        let parameters = DetectionParameters {
            threshold: Some(60.0),
            polarity: Polarity::Lower,
            ..Default::default()
        };
        let table = extract(&trace, &parameters).unwrap();
        assert_eq!(table.column(Column::Coordinate), vec![2.0, 5.0]);
        assert_eq!(table.column(Column::DwellTime), vec![2.0, 1.0]);
        assert_eq!(table.column(Column::Mean), vec![41.0, 30.0]);
    }

    #[test]
    fn sample_rate_converts_dwell_to_seconds() {
        let trace = Trace::new(vec![0., 5., 5., 5., 5., 0.]).unwrap();
        let parameters = DetectionParameters {
            threshold: Some(3.0),
            sample_rate: Some(1000.0),
            ..Default::default()
        };
        let table = extract(&trace, &parameters).unwrap();
        assert_approx_eq!(table.rows().first().unwrap().dwell_time, 0.004);
    }

    #[test]
    fn mean_and_levels_taken_from_fit() {
        let trace = Trace::new(vec![0., 5., 7., 6., 9., 0.])
            .unwrap()
            .with_fit(vec![0., 6., 6., 6., 9., 0.])
            .unwrap();
        let table = extract(&trace, &parameters(3.0)).unwrap();
        let row = table.rows().first().unwrap();
        assert_approx_eq!(row.mean, 6.75);
        assert_eq!(row.height, 4.0);
        assert_eq!(row.level_count, 2.0);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let trace = Trace::new(vec![1.0]).unwrap();
        let parameters = DetectionParameters {
            threshold: Some(Real::NAN),
            ..Default::default()
        };
        assert!(extract(&trace, &parameters).is_err());
        assert!(extract(&trace, &DetectionParameters::default()).is_err());
    }

    #[test]
    fn means_near_the_largest_float_stay_finite() {
        let trace = Trace::new(vec![-Real::MAX, 1e308, -Real::MAX, -1e308, -Real::MAX]).unwrap();
        let table = extract(&trace, &parameters(-1.75e308)).unwrap();
        assert_eq!(table.column(Column::Mean), vec![1e308, -1e308]);

        let trace = Trace::new(vec![0., 1e308, 1e308, 1e308, 0.]).unwrap();
        let table = extract(&trace, &parameters(1.0)).unwrap();
        assert_eq!(table.column(Column::Mean), vec![1e308]);
    }

    #[test]
    fn height_beyond_float_range_is_invalid() {
        let trace = Trace::new(vec![-Real::MAX, 1.7e308, -1.7e308, -Real::MAX]).unwrap();
        let result = extract(&trace, &parameters(-1.75e308));
        assert!(matches!(
            result,
            Err(FeatureError::InvalidInput {
                context: InputContext::Trace,
                ..
            })
        ));
    }

    #[test]
    fn supplied_events_keep_their_level_counts() {
        let trace = Trace::new(vec![5., 6., 5., 9., 7., 8., 8.])
            .unwrap()
            .with_fit(vec![5.5, 5.5, 5.5, 8., 8., 8., 8.])
            .unwrap();
        let events = vec![Event { start: 0, end: 3 }, Event { start: 3, end: 7 }];
        let database = EventDatabase::new(trace, events, vec![1, 3]).unwrap();

        let table = summarise(&database, &DetectionParameters::default()).unwrap();
        assert_eq!(table.column(Column::Coordinate), vec![0.0, 3.0]);
        assert_eq!(table.column(Column::DwellTime), vec![3.0, 4.0]);
        assert_eq!(table.column(Column::Mean), vec![5.5, 8.0]);
        assert_eq!(table.column(Column::Height), vec![1.0, 2.0]);
        assert_eq!(table.column(Column::LevelCount), vec![1.0, 3.0]);
    }

    #[test]
    fn supplied_events_use_sample_rate() {
        let trace = Trace::new(vec![0., 5., 5., 0.]).unwrap();
        let database = EventDatabase::new(trace, vec![Event { start: 1, end: 3 }], vec![1]).unwrap();
        let parameters = DetectionParameters {
            sample_rate: Some(100.0),
            ..Default::default()
        };
        let table = summarise(&database, &parameters).unwrap();
        assert_approx_eq!(table.rows().first().unwrap().dwell_time, 0.02);
    }
}
