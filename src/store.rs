use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::KvConfig;
use crate::document::{DocumentStore, Filter, StoreError, Update};
use crate::encoding::encode;
use crate::record::{Record, INITIAL_VERSION};
use crate::result::{KvError, KvResult};

pub trait KeyType: Serialize + DeserializeOwned + Clone + Debug + Send + Sync {}
impl<T: Serialize + DeserializeOwned + Clone + Debug + Send + Sync> KeyType for T {}

pub trait ValueType: Serialize + DeserializeOwned + Clone + Debug + Send + Sync {}
impl<T: Serialize + DeserializeOwned + Clone + Debug + Send + Sync> ValueType for T {}

/// Keyed access to versioned records with optimistic concurrency.
///
/// Cloning is cheap and every clone talks to the same underlying store, so one
/// [`KvStore`] can be shared by any number of threads. No lock is held in
/// process: concurrent writers are serialized by the version check in the
/// store's conditional update.
///
/// # Type Parameters
///
/// * `K` - The key type.
/// * `V` - The value type.
/// * `S` - The [`DocumentStore`] records are kept in.
pub struct KvStore<K: KeyType, V: ValueType, S: DocumentStore>(
    pub(crate) Arc<KvStoreInner<K, V, S>>,
);

impl<K: KeyType, V: ValueType, S: DocumentStore> Clone for KvStore<K, V, S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<K: KeyType, V: ValueType, S: DocumentStore> Deref for KvStore<K, V, S> {
    type Target = Arc<KvStoreInner<K, V, S>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K: KeyType, V: ValueType, S: DocumentStore> KvStore<K, V, S> {
    /// Create a keyed store over any [`DocumentStore`].
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the collection, used in logs.
    /// * `store` - The backing document store.
    /// * `config` - Retry configuration.
    pub fn new(name: &str, store: S, config: KvConfig) -> Self {
        Self(Arc::new(KvStoreInner {
            name: name.to_owned(),
            store,
            config,
            _types: PhantomData,
        }))
    }
}

pub struct KvStoreInner<K, V, S> {
    name: String,
    store: S,
    config: KvConfig,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K: KeyType, V: ValueType, S: DocumentStore> KvStoreInner<K, V, S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &KvConfig {
        &self.config
    }

    /// Get the value stored for a key.
    ///
    /// # Errors
    ///
    /// [`KvError::NotFound`] if no record exists for `key`, [`KvError::Decode`]
    /// if the stored value is not a `V`.
    pub fn get(&self, key: &K) -> KvResult<V> {
        Ok(self.get_record(key)?.value)
    }

    /// Get the full record stored for a key, including its version.
    pub fn get_record(&self, key: &K) -> KvResult<Record<K, V>> {
        self.find(Filter::by_id(encode(key)?))
    }

    /// Store `value` under `key`, creating or fully replacing the record.
    ///
    /// # Returns
    ///
    /// The version of the record after the write.
    pub fn put(&self, key: K, value: V) -> KvResult<i64> {
        self.put_f(key, move |_| value.clone())
    }

    /// Store the result of `update` under `key`.
    ///
    /// `update` receives `None` when the record is being created and the
    /// current value otherwise. It may be called more than once, so it must not
    /// have side effects.
    ///
    /// The record is first inserted as a new record at version 1. If one
    /// already exists, the current record is read and a conditional update is
    /// issued against the version that was read, retrying up to
    /// [`KvConfig::max_retries`] times when another writer gets there first.
    ///
    /// # Returns
    ///
    /// The version of the record after the write.
    ///
    /// # Errors
    ///
    /// [`KvError::OptimisticLock`] if every attempt lost a race. Any other
    /// error aborts immediately without retrying.
    pub fn put_f<F>(&self, key: K, update: F) -> KvResult<i64>
    where
        F: Fn(Option<V>) -> V,
    {
        let document = Record::new(key, update(None)).to_document()?;
        let id = document.id.clone();

        match self.store.insert_one(document) {
            Ok(()) => {
                debug!(collection = %self.name, "inserted new record");
                return Ok(INITIAL_VERSION);
            }
            Err(StoreError::DuplicateKey) => {}
            Err(e) => return Err(e.into()),
        }

        let mut conflict = StoreError::DuplicateKey;

        for attempt in 1..=self.config.max_retries {
            let current = self.find(Filter::by_id(id.clone()))?;
            let version = current
                .version
                .checked_add(1)
                .ok_or(KvError::Storage(StoreError::VersionOverflow))?;
            let change = Update {
                version,
                value: encode(&update(Some(current.value)))?,
            };

            let filter = Filter::by_version(id.clone(), current.version);
            match self.store.update_one(&filter, change, true).map_err(KvError::from) {
                Ok(_) => return Ok(version),
                Err(KvError::OptimisticLock(e)) => {
                    debug!(
                        collection = %self.name,
                        attempt,
                        version = current.version,
                        "lost update race, retrying"
                    );
                    conflict = e;
                }
                Err(e) => {
                    debug!(collection = %self.name, attempt, error = %e, "update aborted");
                    return Err(e);
                }
            }
        }

        warn!(
            collection = %self.name,
            retries = self.config.max_retries,
            "optimistic lock retries exhausted"
        );
        Err(KvError::OptimisticLock(conflict))
    }

    /// Remove the record for a key.
    ///
    /// Removing a key that does not exist succeeds. There is no version check,
    /// so a conditional update racing with this call may upsert the record back.
    pub fn remove(&self, key: &K) -> KvResult<()> {
        self.store.delete_one(&Filter::by_id(encode(key)?))?;
        Ok(())
    }

    fn find(&self, filter: Filter) -> KvResult<Record<K, V>> {
        let document = self.store.find_one(&filter)?.ok_or(KvError::NotFound)?;
        Ok(Record::from_document(&document)?)
    }
}
