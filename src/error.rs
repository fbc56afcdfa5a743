use crate::model::{Field, MappingError};
use thiserror::Error;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The result type returned by the reconciliation core.
pub type ReconResult<T> = std::result::Result<T, ReconError>;

/// Errors raised by the reconciliation core. None of these are fatal: the host is expected to
/// show the message and let the user retry with corrected input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// A column needed as a join or key column is absent from an input table.
    #[error("The {table} table has no '{column}' column, which is required to join it")]
    Schema { table: String, column: String },

    /// One or more manual entry indices do not exist.
    #[error("No manual entry at index {}", join_indices(.indices))]
    NotFound { indices: Vec<usize> },

    /// The transaction data lacks the material code column.
    #[error("The transaction data has no '{column}' column; material code is the join key")]
    MissingColumn { column: String },

    /// A manual entry was submitted without a material code.
    #[error("A manual entry needs a material code")]
    EmptyMaterialCode,

    /// A cell could not be read as the type its column requires.
    #[error("Row {row}: '{value}' is not a valid {column}")]
    InvalidValue {
        row: usize,
        column: Field,
        value: String,
    },

    /// A sum or product left the range of its type.
    #[error("The {what} is too large to compute")]
    Overflow { what: String },

    #[error("Invalid header row: {0}")]
    Mapping(#[from] MappingError),
}

impl ReconError {
    pub(crate) fn overflow(what: &str) -> Self {
        Self::Overflow {
            what: what.to_string(),
        }
    }
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|ix| ix.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
