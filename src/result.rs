use thiserror::Error;

use crate::document::StoreError;

pub const NOT_FOUND_ERROR: &str = "NOT_FOUND_ERROR";
pub const DB_ERROR: &str = "DB_ERROR";
pub const DECODE_ERROR: &str = "DECODE_ERROR";
pub const NOT_IMPLEMENTED_ERROR: &str = "NOT_IMPLEMENTED_YET";
pub const OPTIMISTIC_LOCK_ERROR: &str = "OPTIMISTIC_LOCK";

/// Errors returned by [`crate::KvStore`] operations.
///
/// `NotFound` and `OptimisticLock` are expected outcomes a caller can handle.
/// `Storage` and `Decode` mean something is wrong with the store or its data.
#[derive(Error, Debug)]
pub enum KvError {
    #[error("no record exists for the key")]
    NotFound,
    #[error("storage failure")]
    Storage(#[source] StoreError),
    #[error("record could not be decoded")]
    Decode(#[source] StoreError),
    #[error("optimistic lock conflict")]
    OptimisticLock(#[source] StoreError),
    #[error("operation not implemented")]
    NotImplemented,
}

impl KvError {
    /// Stable code for this kind of error.
    pub fn code(&self) -> &'static str {
        match self {
            KvError::NotFound => NOT_FOUND_ERROR,
            KvError::Storage(_) => DB_ERROR,
            KvError::Decode(_) => DECODE_ERROR,
            KvError::OptimisticLock(_) => OPTIMISTIC_LOCK_ERROR,
            KvError::NotImplemented => NOT_IMPLEMENTED_ERROR,
        }
    }

    /// The underlying store error, if there was one.
    pub fn reason(&self) -> Option<&StoreError> {
        match self {
            KvError::Storage(e) | KvError::Decode(e) | KvError::OptimisticLock(e) => Some(e),
            KvError::NotFound | KvError::NotImplemented => None,
        }
    }
}

impl From<StoreError> for KvError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => KvError::NotFound,
            StoreError::DuplicateKey => KvError::OptimisticLock(err),
            StoreError::Decode(_) => KvError::Decode(err),
            _ => KvError::Storage(err),
        }
    }
}

pub type KvResult<T> = Result<T, KvError>;
