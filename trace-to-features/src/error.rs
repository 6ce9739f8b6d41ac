use glob::PatternError;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type FeatureResult<T> = Result<T, FeatureError>;

/// Names the stage in which an [FeatureError::InvalidInput] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum InputContext {
    #[strum(to_string = "trace")]
    Trace,
    #[strum(to_string = "fit")]
    Fit,
    #[strum(to_string = "feature table")]
    FeatureTable,
    #[strum(to_string = "target range")]
    TargetRange,
    #[strum(to_string = "detection parameters")]
    DetectionParameters,
    #[strum(to_string = "event database")]
    EventDatabase,
}

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Invalid {context}{}: {reason}", at_path(.path.as_deref()))]
    InvalidInput {
        context: InputContext,
        reason: String,
        path: Option<PathBuf>,
    },
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Cannot read {path}: {error}")]
    UnreadableFile {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("Cannot write {path}: {error}")]
    UnwritableFile {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("Unsupported format for {0}, expected one of .csv, .mat, .h5, .hdf5")]
    UnsupportedFormat(PathBuf),
    #[error("Cannot read {0}: only MATLAB v7.3 (HDF5) MAT-files are supported, re-save it with save(..., '-v7.3')")]
    UnsupportedMatVersion(PathBuf),
    #[error("Inputs {first} and {second} would both be written to {output}")]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Cannot normalise a feature table with no rows")]
    EmptyTable,
    #[error("HDF5 Error: {error} at {path}")]
    Hdf5 { path: PathBuf, error: hdf5::Error },
    #[error("Glob Pattern Error: {0}")]
    GlobPattern(#[from] PatternError),
    #[error("Glob Error: {0}")]
    Glob(#[from] glob::GlobError),
}

fn at_path(path: Option<&Path>) -> String {
    path.map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}

impl FeatureError {
    pub(crate) fn invalid(context: InputContext, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            context,
            reason: reason.into(),
            path: None,
        }
    }

    /// Attaches `path` to errors raised before the failing file was known.
    pub(crate) fn with_path(self, file: &Path) -> Self {
        match self {
            Self::InvalidInput {
                context,
                reason,
                path: None,
            } => Self::InvalidInput {
                context,
                reason,
                path: Some(file.to_owned()),
            },
            other => other,
        }
    }

    pub(crate) fn from_io_read(path: &Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path.to_owned())
        } else {
            Self::UnreadableFile {
                path: path.to_owned(),
                error,
            }
        }
    }
}

/// Tags hdf5 errors with the file they were raised for.
pub(crate) trait ConvertResult<T> {
    fn err_file(self, path: &Path) -> FeatureResult<T>;
}

impl<T> ConvertResult<T> for Result<T, hdf5::Error> {
    fn err_file(self, path: &Path) -> FeatureResult<T> {
        self.map_err(|error| FeatureError::Hdf5 {
            path: path.to_owned(),
            error,
        })
    }
}
