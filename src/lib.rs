use sled::Config;

pub mod collection;
pub use collection::SledCollection;

pub mod config;
pub use config::KvConfig;

pub mod document;
pub use document::{Document, DocumentStore, Filter, StoreError, Update, UpdateOutcome};

pub mod record;
pub use record::{Record, INITIAL_VERSION};

pub mod result;
pub use result::{KvError, KvResult};

pub mod store;
pub use store::{KeyType, KvStore, ValueType};

mod encoding;

/// A versioned key-value database based on sled.
pub struct KvBase {
    engine: sled::Db,
}

impl KvBase {
    /// Create a new instance of `KvBase`.
    ///
    /// # Arguments
    ///
    /// * `path` - An optional path to the database file. If `None`, an in-memory database is created.
    /// * `temporary` - If `true`, the database file will be deleted on close.
    pub fn new(path: Option<&str>, temporary: bool) -> KvResult<Self> {
        let config = if let Some(path) = path {
            Config::new().path(path).temporary(temporary)
        } else {
            Config::new().temporary(temporary)
        };

        Ok(Self {
            engine: config.open().map_err(StoreError::from)?,
        })
    }

    /// Open a keyed store over the named collection with the default [`KvConfig`].
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the collection.
    pub fn open_collection<K: KeyType, V: ValueType>(
        &self,
        name: &str,
    ) -> KvResult<KvStore<K, V, SledCollection>> {
        self.open_collection_with(name, KvConfig::default())
    }

    /// Open a keyed store over the named collection.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the collection.
    /// * `config` - Retry configuration for conditional updates.
    pub fn open_collection_with<K: KeyType, V: ValueType>(
        &self,
        name: &str,
        config: KvConfig,
    ) -> KvResult<KvStore<K, V, SledCollection>> {
        let collection = SledCollection::new(&self.engine, name)?;
        Ok(KvStore::new(name, collection, config))
    }

    /// Flush all pending writes to disk.
    ///
    /// # Returns
    ///
    /// The number of bytes flushed.
    pub fn flush(&self) -> KvResult<usize> {
        Ok(self.engine.flush().map_err(StoreError::from)?)
    }
}
