use crate::{
    error::{ConvertResult, FeatureError, FeatureResult, InputContext},
    event_database::{EventDatabase, to_index},
    event_detection::Event,
    features::{Column, FeatureTable},
    parameters::InputParameters,
    trace::Trace,
};
use hdf5::{File, Group, ObjectReference1, ReferencedObject, types::FixedAscii};
use nanopore_common::Real;
use ndarray::Array2;
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Read, Write},
    iter,
    path::Path,
};
use strum::IntoEnumIterator;

/// HDF5 leaves this many bytes free at the start of the file for the MAT-file header.
const USERBLOCK_SIZE: u64 = 512;
const MAT_HEADER_LEN: usize = 128;
const MAT_TEXT_LEN: usize = 116;

const MATLAB_CLASS: &str = "MATLAB_class";
const MATLAB_EMPTY: &str = "MATLAB_empty";

/// Array and struct names of an event database saved from MATLAB.
mod database_names {
    pub(super) const EVENTS: &str = "ConcatenatedEvents";
    pub(super) const FITS: &str = "ConcatenatedFits";
    pub(super) const STRUCT: &str = "EventDatabase";
    pub(super) const START_COORDINATES: &str = "ConcatenatedStartCoordinates";
    pub(super) const LEVEL_FITS: &str = "AllLevelFits";
    pub(super) const LEVEL_COUNTS: &str = "NumberOfLevels";
}

/// The header MATLAB expects at the start of a v7.3 MAT-file: descriptive
/// text padded with spaces, an unused subsystem offset, the version and the
/// endian indicator.
fn mat_header() -> Vec<u8> {
    let text = format!(
        "MATLAB 7.3 MAT-file, Platform: {}-{}, Created by: {} {} HDF5 schema 1.00 .",
        env::consts::OS,
        env::consts::ARCH,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );
    let mut header: Vec<u8> = text
        .bytes()
        .chain(iter::repeat(b' '))
        .take(MAT_TEXT_LEN)
        .collect();
    header.extend_from_slice(&[0; 8]);
    header.extend_from_slice(&0x0200u16.to_le_bytes());
    header.extend_from_slice(b"IM");
    header
}

/// Older MAT-files share the `.mat` extension but are not HDF5 files.
fn check_mat_version(path: &Path) -> FeatureResult<()> {
    let mut header = Vec::with_capacity(MAT_HEADER_LEN);
    fs::File::open(path)
        .and_then(|file| file.take(MAT_HEADER_LEN as u64).read_to_end(&mut header))
        .map_err(|error| FeatureError::from_io_read(path, error))?;
    if header.starts_with(b"MATLAB") && !header.starts_with(b"MATLAB 7.3") {
        return Err(FeatureError::UnsupportedMatVersion(path.to_owned()));
    }
    Ok(())
}

fn open(path: &Path) -> FeatureResult<File> {
    check_mat_version(path)?;
    File::open(path).err_file(path)
}

/// Reads the named array from `group` as a flat vector.
/// MATLAB stores vectors as `1xN` or `Nx1` matrices, so rank two is accepted
/// as long as at most one dimension is longer than one.
fn read_vector(
    group: &Group,
    name: &str,
    context: InputContext,
    path: &Path,
) -> FeatureResult<Vec<Real>> {
    if !group.link_exists(name) {
        return Err(FeatureError::invalid(context, format!("no array named '{name}'")));
    }
    let array = group
        .dataset(name)
        .and_then(|dataset| dataset.read_dyn::<Real>())
        .err_file(path)?;

    let long_dimensions = array.shape().iter().filter(|&&len| len > 1).count();
    if array.ndim() > 2 || long_dimensions > 1 {
        return Err(FeatureError::invalid(
            context,
            format!("array '{name}' has shape {:?}, expected a vector", array.shape()),
        ));
    }
    Ok(array.iter().copied().collect())
}

/// Number of elements in each array of a MATLAB cell array.
/// A cell array is a dataset of references to the arrays it holds; empty
/// arrays are marked with an attribute rather than stored with zero size.
fn read_cell_lengths(file: &File, group: &Group, name: &str, path: &Path) -> FeatureResult<Vec<usize>> {
    let context = InputContext::EventDatabase;
    if !group.link_exists(name) {
        return Err(FeatureError::invalid(context, format!("no cell array named '{name}'")));
    }
    let references = group
        .dataset(name)
        .and_then(|dataset| dataset.read_raw::<ObjectReference1>())
        .err_file(path)?;

    references
        .iter()
        .map(|reference| match file.dereference(reference).err_file(path)? {
            ReferencedObject::Dataset(dataset) => {
                let is_empty = dataset
                    .attr_names()
                    .err_file(path)?
                    .iter()
                    .any(|attribute| attribute == MATLAB_EMPTY);
                Ok(if is_empty { 0 } else { dataset.size() })
            }
            _ => Err(FeatureError::invalid(
                context,
                format!("cell array '{name}' holds something other than arrays"),
            )),
        })
        .collect()
}

pub(super) fn read_trace(path: &Path, input: &InputParameters) -> FeatureResult<Trace> {
    let file = open(path)?;
    let trace = Trace::new(read_vector(&file, &input.trace_name, InputContext::Trace, path)?)?;
    match &input.fit_name {
        Some(fit_name) => trace.with_fit(read_vector(&file, fit_name, InputContext::Fit, path)?),
        None => Ok(trace),
    }
}

/// Reads a segmented trace: the concatenated events and fits at the top level,
/// and the start coordinate, level fit and level count of each event in the
/// `EventDatabase` struct. An event lasts as long as its level fit.
pub(super) fn read_event_database(path: &Path) -> FeatureResult<EventDatabase> {
    use database_names::*;
    let context = InputContext::EventDatabase;

    let file = open(path)?;
    let trace = Trace::new(read_vector(&file, EVENTS, InputContext::Trace, path)?)?
        .with_fit(read_vector(&file, FITS, InputContext::Fit, path)?)?;

    if !file.link_exists(STRUCT) {
        return Err(FeatureError::invalid(context, format!("no struct named '{STRUCT}'")));
    }
    let database = file.group(STRUCT).err_file(path)?;
    let starts = read_vector(&database, START_COORDINATES, context, path)?
        .into_iter()
        .map(|start| to_index(start, "start coordinate"))
        .collect::<FeatureResult<Vec<_>>>()?;
    let level_counts = read_vector(&database, LEVEL_COUNTS, context, path)?
        .into_iter()
        .map(|count| to_index(count, "level count"))
        .collect::<FeatureResult<Vec<_>>>()?;
    let dwells = read_cell_lengths(&file, &database, LEVEL_FITS, path)?;

    if dwells.len() != starts.len() {
        return Err(FeatureError::invalid(
            context,
            format!("{} start coordinates but {} level fits", starts.len(), dwells.len()),
        ));
    }
    let events = starts
        .into_iter()
        .zip(dwells)
        .map(|(start, dwell)| Event {
            start,
            end: start.saturating_add(dwell),
        })
        .collect();
    EventDatabase::new(trace, events, level_counts)
}

pub(super) fn read_table(path: &Path) -> FeatureResult<FeatureTable> {
    let file = open(path)?;
    let columns = Column::iter()
        .map(|column| {
            let values = read_vector(&file, &column.to_string(), InputContext::FeatureTable, path)?;
            Ok((column, values))
        })
        .collect::<FeatureResult<Vec<_>>>()?;
    FeatureTable::from_columns(&columns)
}

/// Writes one `double` array per column, named after the column, as a v7.3
/// MAT-file. Each column is stored as a `1xN` dataset, which MATLAB loads as
/// an `Nx1` column vector.
pub(super) fn write_table(path: &Path, table: &FeatureTable) -> FeatureResult<()> {
    let file = File::with_options()
        .with_fcpl(|fcpl| fcpl.userblock(USERBLOCK_SIZE))
        .create(path)
        .err_file(path)?;
    let class = FixedAscii::<6>::from_ascii("double")
        .map_err(|error| hdf5::Error::from(error.to_string()))
        .err_file(path)?;

    for column in Column::iter() {
        let values = table.column(column);
        let values = Array2::from_shape_vec((1, values.len()), values)
            .map_err(hdf5::Error::from)
            .err_file(path)?;
        let dataset = file
            .new_dataset_builder()
            .with_data(&values)
            .create(column.to_string().as_str())
            .err_file(path)?;
        dataset
            .new_attr::<FixedAscii<6>>()
            .shape(())
            .create(MATLAB_CLASS)
            .and_then(|attribute| attribute.write_scalar(&class))
            .err_file(path)?;
    }
    file.close().err_file(path)?;

    OpenOptions::new()
        .write(true)
        .open(path)
        .and_then(|mut file| file.write_all(&mat_header()))
        .map_err(|error| FeatureError::UnwritableFile {
            path: path.to_owned(),
            error,
        })
}
