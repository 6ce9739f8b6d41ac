//! Readers and writers for the two supported file formats.
//!
//! Delimited text (`.csv`) and the HDF5 matrix container (`.mat`, `.h5`, `.hdf5`).
//! MATLAB v7.3 `.mat` files are HDF5 files with a MAT-file header in front,
//! so both extensions share one adapter.
mod csv;
mod matrix;

use crate::{
    error::{FeatureError, FeatureResult},
    event_database::EventDatabase,
    features::FeatureTable,
    parameters::InputParameters,
    trace::Trace,
};
use clap::ValueEnum;
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, strum::Display)]
pub enum FileFormat {
    #[strum(to_string = "csv")]
    Csv,
    #[strum(to_string = "mat")]
    Mat,
}

impl FileFormat {
    /// Chooses the format from the extension of `path`, ignoring case.
    pub fn from_path(path: &Path) -> FeatureResult<Self> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("mat" | "h5" | "hdf5") => Ok(Self::Mat),
            _ => Err(FeatureError::UnsupportedFormat(path.to_owned())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Mat => "mat",
        }
    }
}

fn check_exists(path: &Path) -> FeatureResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(FeatureError::FileNotFound(path.to_owned()))
    }
}

/// Reads the trace (and fit, if named in `input`) from `path`.
pub fn read_trace(path: &Path, input: &InputParameters) -> FeatureResult<Trace> {
    let format = FileFormat::from_path(path)?;
    check_exists(path)?;
    debug!("Reading {format} trace from {}", path.display());
    match format {
        FileFormat::Csv => csv::read_trace(path, input),
        FileFormat::Mat => matrix::read_trace(path, input),
    }
    .map_err(|error| error.with_path(path))
}

/// Reads an already segmented trace from `path`.
pub fn read_event_database(path: &Path) -> FeatureResult<EventDatabase> {
    let format = FileFormat::from_path(path)?;
    check_exists(path)?;
    debug!("Reading {format} event database from {}", path.display());
    match format {
        FileFormat::Csv => csv::read_event_database(path),
        FileFormat::Mat => matrix::read_event_database(path),
    }
    .map_err(|error| error.with_path(path))
}

/// Reads a feature table previously written by [write_table].
pub fn read_table(path: &Path) -> FeatureResult<FeatureTable> {
    let format = FileFormat::from_path(path)?;
    check_exists(path)?;
    match format {
        FileFormat::Csv => csv::read_table(path),
        FileFormat::Mat => matrix::read_table(path),
    }
    .map_err(|error| error.with_path(path))
}

/// Writes `table` to `path`, in the format given by its extension.
///
/// The table is first written to a hidden sibling file which is renamed over
/// `path` once complete, so a failure never leaves a partial output behind.
pub fn write_table(path: &Path, table: &FeatureTable) -> FeatureResult<()> {
    let format = FileFormat::from_path(path)?;
    let partial = partial_path(path);
    debug!("Writing {} rows to {}", table.len(), partial.display());

    let result = match format {
        FileFormat::Csv => csv::write_table(&partial, table),
        FileFormat::Mat => matrix::write_table(&partial, table),
    }
    .and_then(|()| {
        fs::rename(&partial, path).map_err(|error| FeatureError::UnwritableFile {
            path: path.to_owned(),
            error,
        })
    });
    if result.is_err() {
        // The partial file may not exist if creation itself failed
        let _ = fs::remove_file(&partial);
    }
    result
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".partial");
    path.with_file_name(name)
}
