//! The document store boundary.
//!
//! [`crate::KvStore`] talks to storage only through the four primitives of
//! [`DocumentStore`]. Identity and payload cross this boundary as encoded bytes,
//! so a backend never needs to know the key or value types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored document: identity, version counter and opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Vec<u8>,
    pub version: i64,
    pub value: Vec<u8>,
}

/// Selects at most one document by identity, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub id: Vec<u8>,
    pub version: Option<i64>,
}

impl Filter {
    /// Match a document by identity only.
    pub fn by_id(id: Vec<u8>) -> Self {
        Self { id, version: None }
    }

    /// Match a document by identity and exact version.
    pub fn by_version(id: Vec<u8>, version: i64) -> Self {
        Self {
            id,
            version: Some(version),
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.id == document.id && self.version.map_or(true, |v| v == document.version)
    }
}

/// Replacement for the mutable fields of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub version: i64,
    pub value: Vec<u8>,
}

impl Update {
    /// Document produced when an upsert finds nothing to update.
    pub fn into_document(self, filter: &Filter) -> Document {
        Document {
            id: filter.id.clone(),
            version: self.version,
            value: self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An existing document matched the filter and was replaced.
    Matched,
    /// Nothing matched and a new document was inserted.
    Upserted,
    /// Nothing matched and upsert was not requested.
    NoMatch,
}

/// Raw errors reported by a [`DocumentStore`].
///
/// These never reach callers of [`crate::KvStore`]; they are classified into
/// [`crate::KvError`] first.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("a document with this identity already exists")]
    DuplicateKey,
    #[error("no document matched the filter")]
    NotFound,
    #[error("encoding error")]
    Encode(#[source] bincode::Error),
    #[error("decoding error")]
    Decode(#[source] bincode::Error),
    #[error("sled error")]
    Sled(#[from] sled::Error),
    #[error("version counter overflowed")]
    VersionOverflow,
    #[error("store call was cancelled or timed out")]
    Cancelled,
    #[error("store error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The primitive operations a keyed store is built from.
///
/// Implementations must enforce identity as a uniqueness constraint:
/// `insert_one` on an existing identity fails with [`StoreError::DuplicateKey`],
/// and so does an upserting `update_one` whose filter matched nothing while a
/// document with the same identity exists.
pub trait DocumentStore: Send + Sync {
    /// Find the document matching `filter`, if any.
    fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Insert a new document.
    fn insert_one(&self, document: Document) -> StoreResult<()>;

    /// Replace the document matching `filter` with `update`.
    ///
    /// If nothing matched and `upsert` is set, a document is built from the
    /// filter's identity and the update's fields and inserted instead.
    fn update_one(&self, filter: &Filter, update: Update, upsert: bool)
        -> StoreResult<UpdateOutcome>;

    /// Delete the document matching `filter`. Returns how many were deleted.
    fn delete_one(&self, filter: &Filter) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(version: i64) -> Document {
        Document {
            id: vec![1, 2, 3],
            version,
            value: vec![9],
        }
    }

    #[test]
    fn filter_matching() {
        assert!(Filter::by_id(vec![1, 2, 3]).matches(&document(4)));
        assert!(Filter::by_version(vec![1, 2, 3], 4).matches(&document(4)));
        assert!(!Filter::by_version(vec![1, 2, 3], 3).matches(&document(4)));
        assert!(!Filter::by_id(vec![1, 2]).matches(&document(4)));
    }

    #[test]
    fn upsert_document_takes_identity_from_filter() {
        let filter = Filter::by_version(vec![5], 2);
        let update = Update {
            version: 3,
            value: vec![42],
        };

        assert_eq!(
            update.into_document(&filter),
            Document {
                id: vec![5],
                version: 3,
                value: vec![42],
            }
        );
    }
}
