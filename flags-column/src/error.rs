use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown flag `{flag}` for column `{column}`")]
    UnknownFlag {
        column: String,
        flag: String,
    },
    #[error("Unknown flag column `{0}`")]
    UnknownColumn(String),
    #[error("No flag columns declared for type `{0}`")]
    UnknownType(String),
    #[error("Unrecognized accessor `{0}`")]
    UnrecognizedAccessor(String),
    #[error("Flag `{flag}` declared twice for column `{column}`")]
    DuplicateFlag {
        column: String,
        flag: String,
    },
    #[error("Bit position {position} of flag `{flag}` does not fit column `{column}`")]
    BitPositionOutOfRange {
        column: String,
        flag: String,
        position: u32,
    },
    #[error("Setter `{0}` called without a value")]
    MissingValue(String),
    #[error("Getter `{0}` does not take a value")]
    UnexpectedValue(String),
    #[error("Invalid schema: {0}")]
    Schema(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    #[inline]
    pub(crate) fn unknown_flag<C, F>(column: C, flag: F) -> Self
    where
        C: Into<String>,
        F: Into<String>,
    {
        Error::UnknownFlag {
            column: column.into(),
            flag: flag.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
