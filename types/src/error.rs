use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unrecognized {kind}: {value}")]
    Unrecognized { kind: &'static str, value: String },

    #[error("{kind} out of range: {value}")]
    OutOfRange { kind: &'static str, value: i64 },
}

impl ParseError {
    pub(crate) fn unrecognized(kind: &'static str, value: &str) -> Self {
        ParseError::Unrecognized {
            kind,
            value: value.to_string(),
        }
    }
}
