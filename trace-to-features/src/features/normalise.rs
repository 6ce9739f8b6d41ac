use super::{Column, FeatureTable};
use crate::{
    error::{FeatureError, FeatureResult, InputContext},
    parameters::TargetRange,
};
use itertools::{Itertools, MinMaxResult};
use nanopore_common::Real;
use strum::IntoEnumIterator;

/// Min-max scaling of one column into the target range.
/// ```text
/// scaled = (value - min) / (max - min) * (target.max - target.min) + target.min
/// ```
/// A constant column (`min == max`) maps every value to the midpoint of the target range.
/// Columns whose spread exceeds the range of [Real] are scaled on halved values.
#[derive(Debug, Clone, Copy)]
struct ColumnScaler {
    min: Real,
    max: Real,
    target: TargetRange,
}

impl ColumnScaler {
    fn fit(values: impl Iterator<Item = Real>, target: TargetRange) -> Option<Self> {
        let (min, max) = match values.minmax_by(Real::total_cmp) {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(value) => (value, value),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        Some(Self { min, max, target })
    }

    fn scale(&self, value: Real) -> Real {
        if self.max == self.min {
            return self.target.midpoint();
        }
        let spread = self.max - self.min;
        let fraction = if spread.is_finite() {
            (value - self.min) / spread
        } else {
            (value / 2.0 - self.min / 2.0) / (self.max / 2.0 - self.min / 2.0)
        };
        let scaled = fraction * (self.target.max - self.target.min) + self.target.min;
        // Rounding can overshoot the bounds by an ulp
        scaled.clamp(self.target.min, self.target.max)
    }
}

/// Rescales every column of `table` independently into `target`.
///
/// Fails with [FeatureError::EmptyTable] when the table has no rows, and with
/// [FeatureError::InvalidInput] when `target` is not a finite, non-empty range
/// or the table holds a value that is not finite.
pub fn normalise(table: &FeatureTable, target: &TargetRange) -> FeatureResult<FeatureTable> {
    target.validate()?;
    if table.is_empty() {
        return Err(FeatureError::EmptyTable);
    }
    let non_finite = table.rows().iter().enumerate().find_map(|(index, row)| {
        row.values()
            .find(|value| !value.is_finite())
            .map(|value| (index, value))
    });
    if let Some((index, value)) = non_finite {
        return Err(FeatureError::invalid(
            InputContext::FeatureTable,
            format!("row {index} holds {value}, which cannot be scaled"),
        ));
    }

    let mut rows = table.rows().to_vec();
    for column in Column::iter() {
        let Some(scaler) = ColumnScaler::fit(rows.iter().map(|row| row.get(column)), *target)
        else {
            continue;
        };
        for row in rows.iter_mut() {
            let value = row.get_mut(column);
            *value = scaler.scale(*value);
        }
    }
    Ok(FeatureTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureRow;
    use assert_approx_eq::assert_approx_eq;

    fn row(coordinate: Real, dwell_time: Real, mean: Real, height: Real) -> FeatureRow {
        FeatureRow {
            coordinate,
            dwell_time,
            mean,
            height,
            level_count: 1.0,
        }
    }

    fn sample_table() -> FeatureTable {
        FeatureTable::new(vec![
            row(2.0, 3.0, 5.333, 1.0),
            row(7.0, 3.0, 7.333, 1.0),
            row(40.0, 12.0, -2.5, 6.0),
            row(95.0, 1.0, 0.125, 0.5),
        ])
    }

    #[test]
    fn values_within_target_range() {
        let target = TargetRange::default();
        let table = normalise(&sample_table(), &target).unwrap();
        for column in Column::iter() {
            for value in table.column(column) {
                assert!((target.min..=target.max).contains(&value), "{column}: {value}");
            }
        }
    }

    #[test]
    fn extremes_map_to_bounds() {
        let target = TargetRange {
            min: -1.0,
            max: 1.0,
        };
        let table = normalise(&sample_table(), &target).unwrap();
        assert_eq!(table.column(Column::Coordinate).first(), Some(&-1.0));
        assert_eq!(table.column(Column::Coordinate).last(), Some(&1.0));
        assert_eq!(table.column(Column::Mean).get(2), Some(&-1.0));
        assert_eq!(table.column(Column::Mean).get(1), Some(&1.0));
    }

    #[test]
    fn scaling_preserves_order() {
        let source = sample_table();
        let table = normalise(&source, &TargetRange::default()).unwrap();
        for column in Column::iter() {
            let before = source.column(column);
            let after = table.column(column);
            for (i, j) in (0..before.len()).tuple_combinations() {
                if before[i] < before[j] {
                    assert!(after[i] <= after[j]);
                }
                if before[i] == before[j] {
                    assert_eq!(after[i], after[j]);
                }
            }
        }
    }

    #[test]
    fn linear_within_column() {
        let table = normalise(&sample_table(), &TargetRange::default()).unwrap();
        // coordinate: 2..95, so 40 sits at (38 / 93) of the range
        assert_approx_eq!(table.column(Column::Coordinate)[2], 38.0 / 93.0 * 255.0);
    }

    #[test]
    fn constant_column_maps_to_midpoint() {
        let table = normalise(&sample_table(), &TargetRange::default()).unwrap();
        for value in table.column(Column::LevelCount) {
            assert_eq!(value, 127.5);
            assert!(!value.is_nan());
        }
    }

    #[test]
    fn single_row_maps_to_midpoint() {
        let table = FeatureTable::new(vec![row(2.0, 3.0, 5.0, 1.0)]);
        let table = normalise(&table, &TargetRange { min: 0.0, max: 10.0 }).unwrap();
        assert!(table.rows().iter().flat_map(FeatureRow::values).all(|v| v == 5.0));
    }

    #[test]
    fn empty_table_is_an_error() {
        let result = normalise(&FeatureTable::default(), &TargetRange::default());
        assert!(matches!(result, Err(FeatureError::EmptyTable)));
    }

    #[test]
    fn spread_beyond_float_range_stays_in_target() {
        let table = FeatureTable::new(vec![
            row(0.0, 1.0, 1e308, 0.0),
            row(1.0, 1.0, -1e308, 0.0),
            row(2.0, 1.0, 0.0, 0.0),
        ]);
        let target = TargetRange::default();
        let table = normalise(&table, &target).unwrap();
        assert_eq!(table.column(Column::Mean), vec![255.0, 0.0, 127.5]);
        assert!(
            table
                .rows()
                .iter()
                .flat_map(FeatureRow::values)
                .all(|value| (target.min..=target.max).contains(&value))
        );
    }

    #[test]
    fn non_finite_value_is_an_error() {
        let table = FeatureTable::new(vec![
            row(0.0, 1.0, Real::INFINITY, 0.0),
            row(1.0, 1.0, 0.0, 0.0),
        ]);
        let result = normalise(&table, &TargetRange::default());
        assert!(matches!(result, Err(FeatureError::InvalidInput { .. })));
    }

    #[test]
    fn invalid_target_range_is_an_error() {
        let result = normalise(&sample_table(), &TargetRange { min: 5.0, max: 0.0 });
        assert!(matches!(result, Err(FeatureError::InvalidInput { .. })));
    }
}
