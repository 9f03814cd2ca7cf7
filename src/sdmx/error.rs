use thiserror::Error;

/// Ways an SDMX-JSON payload can fail to match the shape the extractor needs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    #[error("region dimension `{id}` not found (available: {})", .available.join(", "))]
    RegionDimensionNotFound { id: String, available: Vec<String> },

    #[error("series key positions {positions:?} are not a permutation of 0..{count}")]
    InvalidKeyPositions { positions: Vec<usize>, count: usize },

    #[error("payload has no data set")]
    MissingDataSet,

    #[error("no series for composite key `{key}`")]
    MissingSeries { key: String },

    #[error("series `{key}` has no observation at time index 0")]
    MissingObservation { key: String },

    #[error("series `{key}` has a non-numeric observation: {value}")]
    InvalidObservation { key: String, value: String },
}
