use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum PlaneMapError {
    #[error("PlaneMap failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("PlaneMap failed to parse an integer: {0}")]
    ParsingError(#[from] std::num::ParseIntError),
    #[error("PlaneMap was given a file with the incorrect format; most likely the number of columns is incorrect")]
    BadFileFormat,
    #[error("PlaneMap contains a duplicate entry for plane id {0}")]
    DuplicateID(u32),
}

#[derive(Debug, Error)]
pub enum HistogramError {
    #[error("Histogram was given an invalid bin count of zero")]
    InvalidBinCount,
    #[error("Histogram was given an invalid range [{0}, {1})")]
    InvalidRange(f64, f64),
}

#[derive(Debug, Error)]
pub enum EventFileError {
    #[error("Could not open EventFile because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("EventFile does not contain the expected group or dataset {0}")]
    MissingData(String),
    #[error("EventFile event {0} has {1} plane ids but {2} sample rows")]
    MismatchedLengths(u64, usize, usize),
    #[error("EventFile failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("EventFile failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("ReportWriter failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("ReportWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ReportWriter failed to convert to yaml: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum HvScanError {
    #[error("HvScan was not given any high-voltage levels in the configuration")]
    NoScanPoints,
    #[error("HvScan failed due to EventFile error: {0}")]
    EventFileError(#[from] EventFileError),
    #[error("HvScan failed due to Histogram error: {0}")]
    HistogramError(#[from] HistogramError),
    #[error("HvScan failed due to PlaneMap error: {0}")]
    MapError(#[from] PlaneMapError),
    #[error("HvScan failed due to Report error: {0}")]
    ReportError(#[from] ReportError),
    #[error("HvScan failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("HvScan failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to PlaneMap error: {0}")]
    MapError(#[from] PlaneMapError),
    #[error("Processor failed due to Histogram error: {0}")]
    HistogramError(#[from] HistogramError),
    #[error("Processor failed due to EventFile error: {0}")]
    EventFileError(#[from] EventFileError),
    #[error("Processor failed due to Report error: {0}")]
    ReportError(#[from] ReportError),
    #[error("Processor failed due to HvScan error: {0}")]
    ScanError(#[from] HvScanError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
