use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};
use serde_derive::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, Serialize, PartialEq, Error, From)]
pub enum EnvironReason {
    #[error("reserved key {0} cannot be frozen")]
    #[from(skip)]
    ReservedKey(String),
    #[error("value of {0} is not valid unicode")]
    #[from(skip)]
    NotUnicode(String),
    #[error("invalid environ entry: {0}")]
    #[from(skip)]
    InvalidEntry(String),
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for EnvironReason {
    fn error_code(&self) -> i32 {
        match self {
            EnvironReason::ReservedKey(_) => 501,
            EnvironReason::NotUnicode(_) => 502,
            EnvironReason::InvalidEntry(_) => 503,
            EnvironReason::Uvs(r) => r.error_code(),
        }
    }
}

pub type EnvironResult<T> = Result<T, StructError<EnvironReason>>;
pub type EnvironError = StructError<EnvironReason>;
