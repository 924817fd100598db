use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::document::{Document, StoreResult};
use crate::encoding::{decode, encode};

/// Version given to a record when it is first created.
pub const INITIAL_VERSION: i64 = 1;

/// A single keyed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<K, V> {
    /// Identity of the record, never changes once created.
    pub id: K,
    /// Bumped by one on every successful update.
    pub version: i64,
    pub value: V,
}

impl<K, V> Record<K, V> {
    /// A record as it is first written.
    pub fn new(id: K, value: V) -> Self {
        Self {
            id,
            version: INITIAL_VERSION,
            value,
        }
    }
}

impl<K: Serialize, V: Serialize> Record<K, V> {
    pub(crate) fn to_document(&self) -> StoreResult<Document> {
        Ok(Document {
            id: encode(&self.id)?,
            version: self.version,
            value: encode(&self.value)?,
        })
    }
}

impl<K: DeserializeOwned, V: DeserializeOwned> Record<K, V> {
    pub(crate) fn from_document(document: &Document) -> StoreResult<Self> {
        Ok(Self {
            id: decode(&document.id)?,
            version: document.version,
            value: decode(&document.value)?,
        })
    }
}
