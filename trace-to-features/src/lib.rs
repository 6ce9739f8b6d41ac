//! Extracts per-event features from nanopore translocation traces.
//!
//! A trace is segmented into events with a threshold detector, or arrives
//! already segmented as an [EventDatabase]. Each event is summarised by its
//! coordinate, dwell time, mean, height and level count, and the resulting
//! [FeatureTable] can be min-max normalised and written as CSV or as an HDF5
//! matrix container (the layout of MATLAB v7.3 `.mat` files).
pub mod error;
pub mod event_database;
pub mod event_detection;
pub mod features;
pub mod formats;
pub mod parameters;
pub mod processing;
pub mod trace;

pub use error::{FeatureError, FeatureResult};
pub use event_database::EventDatabase;
pub use features::{Column, FeatureRow, FeatureTable, extract, normalise, summarise};
pub use parameters::{
    DetectionParameters, ExtractConfig, InputLayout, InputParameters, NormalisationParameters,
    Polarity, TargetRange,
};
pub use trace::Trace;
