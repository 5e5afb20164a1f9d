use thiserror::Error;

/// Result alias for `shopclust`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by loading, encoding, distance and clustering primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Required columns are absent from the loaded table.
    #[error("invalid schema: missing columns {missing:?}")]
    InvalidSchema {
        /// Names of the absent columns.
        missing: Vec<String>,
    },

    /// Matrix dimension mismatch (usize).
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch (string description).
    #[error("shape mismatch: expected {expected}, actual {actual}")]
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Invalid number of clusters requested.
    #[error("invalid cluster count: cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// A column was referenced that the table does not have.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A column exists but has the wrong kind for the operation.
    #[error("column '{column}' is not {expected}")]
    ColumnType {
        /// Column name.
        column: String,
        /// Expected kind ("numeric" or "categorical").
        expected: &'static str,
    },

    /// A numeric cell could not be parsed.
    #[error("row {row}, column '{column}': cannot parse {value:?} as a number")]
    Parse {
        /// 1-based data row (header excluded).
        row: usize,
        /// Column name.
        column: String,
        /// Raw cell text.
        value: String,
    },

    /// CSV reader/writer failure.
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
