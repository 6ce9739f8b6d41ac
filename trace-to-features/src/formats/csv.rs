use crate::{
    error::{FeatureError, FeatureResult, InputContext},
    event_database::{EventDatabase, to_index},
    event_detection::Event,
    features::{Column, FeatureTable},
    parameters::InputParameters,
    trace::Trace,
};
use itertools::Itertools;
use nanopore_common::Real;
use std::{
    fs::{self, File},
    io::{BufWriter, Error, Write},
    iter,
    path::Path,
    str::FromStr,
};
use strum::IntoEnumIterator;

/// Column names of an event database exported as CSV.
/// `Events`, `Fits` and `EventFits` hold one value per sample, `Coordinates`
/// and `Levels` one value per event, left blank below the last event.
mod database_names {
    pub(super) const COORDINATES: &str = "Coordinates";
    pub(super) const EVENTS: &str = "Events";
    pub(super) const FITS: &str = "Fits";
    pub(super) const EVENT_FITS: &str = "EventFits";
    pub(super) const LEVELS: &str = "Levels";
}

/// The cells of a delimited text file, split into an optional header and numbered rows.
struct Delimited<'a> {
    header: Option<Vec<&'a str>>,
    rows: Vec<(usize, Vec<&'a str>)>,
}

impl<'a> Delimited<'a> {
    /// The first non-blank line is a header unless every cell in it is numeric.
    fn parse(text: &'a str) -> Self {
        let mut rows = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| (index + 1, split_line(line)));

        let first = rows.next();
        let mut rows: Vec<_> = rows.collect();
        let header = match first {
            Some((line, cells)) if cells.iter().all(|cell| Real::from_str(cell).is_ok()) => {
                rows.insert(0, (line, cells));
                None
            }
            Some((_, cells)) => Some(cells),
            None => None,
        };
        Self { header, rows }
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.header
            .as_ref()?
            .iter()
            .position(|cell| *cell == name)
    }

    fn named_index(&self, name: &str, context: InputContext) -> FeatureResult<usize> {
        self.column_index(name)
            .ok_or_else(|| FeatureError::invalid(context, format!("no column named '{name}'")))
    }

    fn column(&self, index: usize, context: InputContext) -> FeatureResult<Vec<Real>> {
        self.rows
            .iter()
            .map(|(line, cells)| {
                let cell = cells.get(index).ok_or_else(|| {
                    FeatureError::invalid(context, format!("line {line} has no column {}", index + 1))
                })?;
                parse_cell(*line, cell, context)
            })
            .collect()
    }

    /// The values at the top of a column, down to its first blank or missing cell.
    /// Nothing may follow the blank.
    fn leading_column(&self, index: usize, context: InputContext) -> FeatureResult<Vec<Real>> {
        let mut values = Vec::new();
        let mut blank_line = None;
        for (line, cells) in &self.rows {
            let cell = cells.get(index).copied().unwrap_or_default();
            match (cell.is_empty(), blank_line) {
                (true, _) => {
                    blank_line.get_or_insert(*line);
                }
                (false, None) => values.push(parse_cell(*line, cell, context)?),
                (false, Some(blank)) => {
                    return Err(FeatureError::invalid(
                        context,
                        format!("line {line}: '{cell}' follows the blank cell on line {blank}"),
                    ));
                }
            }
        }
        Ok(values)
    }
}

fn parse_cell(line: usize, cell: &str, context: InputContext) -> FeatureResult<Real> {
    Real::from_str(cell).map_err(|_| {
        FeatureError::invalid(context, format!("line {line}: '{cell}' is not a number"))
    })
}

fn split_line(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"'))
        .collect()
}

fn read_text(path: &Path) -> FeatureResult<String> {
    fs::read_to_string(path).map_err(|error| FeatureError::from_io_read(path, error))
}

/// Reads the trace column named in `input`. A headerless file supplies its
/// first column as the trace.
pub(super) fn read_trace(path: &Path, input: &InputParameters) -> FeatureResult<Trace> {
    let text = read_text(path)?;
    let table = Delimited::parse(&text);

    let trace_index = match &table.header {
        None => 0,
        Some(header) => table.column_index(&input.trace_name).ok_or_else(|| {
            FeatureError::invalid(
                InputContext::Trace,
                format!(
                    "first line '{}' is neither numeric nor a header naming column '{}'",
                    header.join(","),
                    input.trace_name
                ),
            )
        })?,
    };
    let trace = Trace::new(table.column(trace_index, InputContext::Trace)?)?;

    match &input.fit_name {
        Some(fit_name) => {
            let fit_index = table.named_index(fit_name, InputContext::Fit)?;
            trace.with_fit(table.column(fit_index, InputContext::Fit)?)
        }
        None => Ok(trace),
    }
}

/// Reads a segmented trace. Events are laid end to end, as in a concatenated
/// recording: each event runs from its coordinate to the next event's
/// coordinate, and the last one to the end of the `EventFits` column.
pub(super) fn read_event_database(path: &Path) -> FeatureResult<EventDatabase> {
    use database_names::*;
    let context = InputContext::EventDatabase;

    let text = read_text(path)?;
    let table = Delimited::parse(&text);
    let column = |name: &str, context: InputContext| {
        table.leading_column(table.named_index(name, context)?, context)
    };

    let trace = Trace::new(column(EVENTS, InputContext::Trace)?)?
        .with_fit(column(FITS, InputContext::Fit)?)?;
    let starts = column(COORDINATES, context)?
        .into_iter()
        .map(|start| to_index(start, "coordinate"))
        .collect::<FeatureResult<Vec<_>>>()?;
    let level_counts = column(LEVELS, context)?
        .into_iter()
        .map(|count| to_index(count, "level count"))
        .collect::<FeatureResult<Vec<_>>>()?;
    let fitted_len = column(EVENT_FITS, context)?.len();

    let ends = starts.iter().skip(1).copied().chain(iter::once(fitted_len));
    let events = starts
        .iter()
        .copied()
        .zip(ends)
        .map(|(start, end)| Event { start, end })
        .collect();
    EventDatabase::new(trace, events, level_counts)
}

pub(super) fn read_table(path: &Path) -> FeatureResult<FeatureTable> {
    let text = read_text(path)?;
    let table = Delimited::parse(&text);
    if table.header.is_none() && !table.rows.is_empty() {
        return Err(FeatureError::invalid(
            InputContext::FeatureTable,
            "missing header row",
        ));
    }

    let columns = Column::iter()
        .map(|column| {
            let index = table.named_index(&column.to_string(), InputContext::FeatureTable)?;
            Ok((column, table.column(index, InputContext::FeatureTable)?))
        })
        .collect::<FeatureResult<Vec<_>>>()?;
    FeatureTable::from_columns(&columns)
}

pub(super) fn write_table(path: &Path, table: &FeatureTable) -> FeatureResult<()> {
    write_rows(path, table).map_err(|error| FeatureError::UnwritableFile {
        path: path.to_owned(),
        error,
    })
}

fn write_rows(path: &Path, table: &FeatureTable) -> Result<(), Error> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "{}", Column::names().join(","))?;
    for row in table.rows() {
        writeln!(file, "{}", row.values().join(","))?;
    }
    file.flush()
}
