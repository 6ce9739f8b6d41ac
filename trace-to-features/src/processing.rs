use crate::{
    error::{FeatureError, FeatureResult},
    features::{self, FeatureTable},
    formats::{self, FileFormat},
    parameters::{
        DetectionParameters, ExtractConfig, InputLayout, InputParameters, NormalisationParameters,
    },
};
use rayon::prelude::*;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Summary of one processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub samples: usize,
    pub events: usize,
    pub normalised: bool,
}

/// Loads the trace named by `config`, extracts its features, normalises
/// them unless raw output was requested, and writes the result.
///
/// A raw trace is segmented with the threshold detector; an event database
/// supplies its own events and level counts.
///
/// A trace with no events is written as a header-only table without
/// normalisation, as there is nothing to scale.
#[instrument(skip_all, fields(input = %config.input_path.display()))]
pub fn process_file(config: &ExtractConfig) -> FeatureResult<ProcessReport> {
    // Checked before reading so bad options fail fast
    FileFormat::from_path(&config.output_path)?;
    config.detection.validate()?;
    if config.input.layout == InputLayout::Trace {
        config.detection.trigger()?;
    }
    let target_range = config.normalisation.target_range();
    if let Some(target) = &target_range {
        target.validate()?;
    }

    let (samples, table) = match config.input.layout {
        InputLayout::Trace => {
            let trace = formats::read_trace(&config.input_path, &config.input)?;
            (trace.len(), features::extract(&trace, &config.detection))
        }
        InputLayout::EventDatabase => {
            let database = formats::read_event_database(&config.input_path)?;
            (
                database.trace().len(),
                features::summarise(&database, &config.detection),
            )
        }
    };
    let table = table.map_err(|error| error.with_path(&config.input_path))?;

    let (table, normalised) = match target_range {
        Some(_) if table.is_empty() => {
            warn!("No events detected, writing an empty table without normalisation");
            (table, false)
        }
        Some(target) => (features::normalise(&table, &target)?, true),
        None => (table, false),
    };

    formats::write_table(&config.output_path, &table)?;
    info!(
        "Wrote {} events from {samples} samples to {}",
        table.len(),
        config.output_path.display()
    );

    Ok(ProcessReport {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        samples,
        events: table.len(),
        normalised,
    })
}

/// Output path for `input` within `output_dir`: the input's file stem with the extension of `format`.
pub fn batch_output_path(input: &Path, output_dir: &Path, format: FileFormat) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_owned();
    name.push(".");
    name.push(format.extension());
    output_dir.join(name)
}

/// Expands `pattern` into the list of files to process, in sorted order.
pub fn glob_inputs(pattern: &str) -> FeatureResult<Vec<PathBuf>> {
    let mut paths = glob::glob(pattern)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

/// Fails if two inputs would be written to the same output file.
fn check_distinct_outputs(configs: &[ExtractConfig]) -> FeatureResult<()> {
    let mut outputs = HashMap::<&Path, &Path>::with_capacity(configs.len());
    for config in configs {
        if let Some(first) = outputs.insert(&config.output_path, &config.input_path) {
            return Err(FeatureError::OutputCollision {
                output: config.output_path.clone(),
                first: first.to_owned(),
                second: config.input_path.clone(),
            });
        }
    }
    Ok(())
}

/// Processes each input independently and in parallel.
///
/// One result is returned per input, in input order; a failing file does not
/// prevent the others from being processed. Nothing is processed if two
/// inputs share a file stem, as their outputs would overwrite each other.
pub fn process_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    format: FileFormat,
    detection: &DetectionParameters,
    input: &InputParameters,
    normalisation: &NormalisationParameters,
) -> FeatureResult<Vec<FeatureResult<ProcessReport>>> {
    let configs = inputs
        .iter()
        .map(|input_path| ExtractConfig {
            input_path: input_path.clone(),
            output_path: batch_output_path(input_path, output_dir, format),
            detection: detection.clone(),
            input: input.clone(),
            normalisation: normalisation.clone(),
        })
        .collect::<Vec<_>>();
    check_distinct_outputs(&configs)?;

    Ok(configs.par_iter().map(process_file).collect())
}

/// Re-writes a feature table in the format given by the extension of `output`.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn convert_table(input: &Path, output: &Path) -> FeatureResult<FeatureTable> {
    FileFormat::from_path(output)?;
    let table = formats::read_table(input)?;
    formats::write_table(output, &table)?;
    info!("Converted {} rows to {}", table.len(), output.display());
    Ok(table)
}

/// Fails with the first error in `results`, logging every failure.
pub fn first_failure(results: Vec<FeatureResult<ProcessReport>>) -> FeatureResult<Vec<ProcessReport>> {
    let mut reports = Vec::with_capacity(results.len());
    let mut failure: Option<FeatureError> = None;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(error) => {
                warn!("{error}");
                failure.get_or_insert(error);
            }
        }
    }
    match failure {
        Some(error) => Err(error),
        None => Ok(reports),
    }
}
