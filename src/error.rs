//! Error types in linfa-reasons
//!

use thiserror::Error;

use ndarray::ShapeError;

use crate::hdbscan::{HdbscanError, HdbscanParamsError};
use crate::k_means::{KMeansError, KMeansParamsError};
use crate::pipeline::PipelineParamsError;
use crate::vectorize::VectorizerParamsError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// There are no explanation rows, so no column schema can be formed
    #[error("no explanation rows to vectorize")]
    EmptyInput,
    /// The reason slots for the task type do not fit into the row layout
    #[error("reason columns starting at offset {offset} run past the {n_columns} available columns")]
    Schema { offset: usize, n_columns: usize },
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("malformed cell at row {row}, column `{column}`")]
    MalformedCell { row: usize, column: String },
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row count mismatch: expected {expected}, found {found}")]
    RowMismatch { expected: usize, found: usize },
    #[error("row {row} of the feature matrix holds a non-finite value")]
    NonFinite { row: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("explanations unavailable: {0}")]
    ExplanationUnavailable(String),
    #[error("rendering failed: {0}")]
    Render(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<KMeansParamsError> for Error {
    fn from(err: KMeansParamsError) -> Self {
        Error::InvalidParameter(err.to_string())
    }
}

impl From<KMeansError> for Error {
    fn from(err: KMeansError) -> Self {
        match err {
            KMeansError::InvalidParams(err) => err.into(),
            KMeansError::TooFewObservations { .. } => Error::InvalidParameter(err.to_string()),
            KMeansError::EmptyFeatures => Error::EmptyInput,
        }
    }
}

impl From<HdbscanParamsError> for Error {
    fn from(err: HdbscanParamsError) -> Self {
        Error::InvalidParameter(err.to_string())
    }
}

impl From<HdbscanError> for Error {
    fn from(err: HdbscanError) -> Self {
        match err {
            HdbscanError::InvalidParams(err) => err.into(),
            HdbscanError::EmptyDataset => Error::EmptyInput,
            HdbscanError::NonFiniteCoordinate(row) => Error::NonFinite { row },
        }
    }
}

impl From<VectorizerParamsError> for Error {
    fn from(err: VectorizerParamsError) -> Self {
        Error::InvalidParameter(err.to_string())
    }
}

impl From<PipelineParamsError> for Error {
    fn from(err: PipelineParamsError) -> Self {
        Error::InvalidParameter(err.to_string())
    }
}
