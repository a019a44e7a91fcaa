use thiserror::Error;

/// Why a single feed record could not be turned into an entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("field {field} has malformed date {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("field {field} has unparseable value {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("interval {start_field}..{end_field} ends before it starts")]
    InvertedInterval {
        start_field: &'static str,
        end_field: &'static str,
    },
}

/// A [`NormalizeError`] tagged with the identifier of the offending record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {record_id}: {source}")]
pub struct RecordError {
    pub record_id: String,
    #[source]
    pub source: NormalizeError,
}
