//! Per-event feature rows, and the tables built from them.
mod extract;
mod normalise;

pub use extract::{extract, summarise};
pub use normalise::normalise;

use crate::error::{FeatureError, FeatureResult, InputContext};
use nanopore_common::Real;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// The columns of a feature table, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Column {
    Coordinate,
    DwellTime,
    Mean,
    Height,
    LevelCount,
}

impl Column {
    pub fn names() -> Vec<String> {
        Column::iter().map(|column| column.to_string()).collect()
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub coordinate: Real,
    pub dwell_time: Real,
    pub mean: Real,
    pub height: Real,
    pub level_count: Real,
}

impl FeatureRow {
    pub fn get(&self, column: Column) -> Real {
        match column {
            Column::Coordinate => self.coordinate,
            Column::DwellTime => self.dwell_time,
            Column::Mean => self.mean,
            Column::Height => self.height,
            Column::LevelCount => self.level_count,
        }
    }

    pub fn get_mut(&mut self, column: Column) -> &mut Real {
        match column {
            Column::Coordinate => &mut self.coordinate,
            Column::DwellTime => &mut self.dwell_time,
            Column::Mean => &mut self.mean,
            Column::Height => &mut self.height,
            Column::LevelCount => &mut self.level_count,
        }
    }

    /// Values in [Column] order.
    pub fn values(&self) -> impl Iterator<Item = Real> + '_ {
        Column::iter().map(|column| self.get(column))
    }
}

/// One row per detected event, in the order the events occur along the trace.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    /// Builds a table from whole columns, as read from a matrix file.
    /// Every column must have the same length.
    pub fn from_columns(columns: &[(Column, Vec<Real>)]) -> FeatureResult<Self> {
        let len = columns.first().map(|(_, values)| values.len()).unwrap_or_default();
        if let Some((column, values)) = columns.iter().find(|(_, values)| values.len() != len) {
            return Err(FeatureError::invalid(
                InputContext::FeatureTable,
                format!("column {column} has {} rows, expected {len}", values.len()),
            ));
        }
        let mut rows = vec![FeatureRow::default(); len];
        for (column, values) in columns {
            for (row, value) in rows.iter_mut().zip(values) {
                *row.get_mut(*column) = *value;
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn column(&self, column: Column) -> Vec<Real> {
        self.rows.iter().map(|row| row.get(column)).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<FeatureRow> for FeatureTable {
    fn from_iter<T: IntoIterator<Item = FeatureRow>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn column_names_in_output_order() {
        assert_eq!(
            Column::names(),
            vec!["coordinate", "dwell_time", "mean", "height", "level_count"]
        );
        assert_eq!(Column::from_str("dwell_time").ok(), Some(Column::DwellTime));
    }

    #[test]
    fn columns_round_trip_through_rows() {
        let table = FeatureTable::new(vec![
            FeatureRow {
                coordinate: 2.0,
                dwell_time: 3.0,
                mean: 5.5,
                height: 1.0,
                level_count: 1.0,
            },
            FeatureRow {
                coordinate: 7.0,
                dwell_time: 4.0,
                mean: 7.5,
                height: 2.0,
                level_count: 2.0,
            },
        ]);
        let columns: Vec<_> = Column::iter()
            .map(|column| (column, table.column(column)))
            .collect();
        assert_eq!(FeatureTable::from_columns(&columns).unwrap(), table);
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let columns = vec![
            (Column::Coordinate, vec![1.0, 2.0]),
            (Column::Mean, vec![1.0]),
        ];
        assert!(FeatureTable::from_columns(&columns).is_err());
    }
}
