use super::event::SourceKind;
use thiserror::Error;

/// Raw input could not be decoded into the shape its source kind expects.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid {kind} record: {source}")]
    InvalidJson {
        kind: SourceKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid {kind} record: expected a JSON object")]
    NotAnObject { kind: SourceKind },
    #[error("Invalid {kind} record: payload is not UTF-8")]
    InvalidUtf8 { kind: SourceKind },
}

impl ParseError {
    pub fn kind(&self) -> SourceKind {
        match self {
            ParseError::InvalidJson { kind, .. }
            | ParseError::NotAnObject { kind }
            | ParseError::InvalidUtf8 { kind } => *kind,
        }
    }
}

/// A constructed event failed the structural checks run before delivery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
