use sled::{Db, IVec, Tree};

use crate::document::{
    Document, DocumentStore, Filter, StoreError, StoreResult, Update, UpdateOutcome,
};
use crate::encoding::{decode, encode};

/// A [`DocumentStore`] backed by a single sled tree.
///
/// Documents are stored under their encoded identity, so identity uniqueness
/// comes from the tree itself. Every write goes through compare-and-swap
/// against the bytes that were read, which makes each primitive atomic.
#[derive(Clone)]
pub struct SledCollection {
    tree: Tree,
}

impl SledCollection {
    /// Opens (or creates) the collection with the given name.
    ///
    /// This method is intended for internal use. Use [`crate::KvBase`]'s
    /// `open_collection()` instead.
    pub(crate) fn new(engine: &Db, name: &str) -> StoreResult<Self> {
        Ok(Self {
            tree: engine.open_tree(name)?,
        })
    }

    /// Current raw bytes for an identity and whether they match `filter`.
    fn lookup(&self, filter: &Filter) -> StoreResult<(Option<IVec>, bool)> {
        let current = self.tree.get(&filter.id)?;
        let matched = match &current {
            Some(bytes) => filter.matches(&decode::<Document>(bytes)?),
            None => false,
        };

        Ok((current, matched))
    }

    fn insert_new(&self, document: &Document) -> StoreResult<()> {
        let encoded = encode(document)?;

        self.tree
            .compare_and_swap(&document.id, None as Option<&[u8]>, Some(encoded))?
            .map_err(|_| StoreError::DuplicateKey)
    }
}

impl DocumentStore for SledCollection {
    fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>> {
        match self.tree.get(&filter.id)? {
            Some(bytes) => {
                let document: Document = decode(&bytes)?;
                Ok(filter.matches(&document).then_some(document))
            }
            None => Ok(None),
        }
    }

    fn insert_one(&self, document: Document) -> StoreResult<()> {
        self.insert_new(&document)
    }

    fn update_one(
        &self,
        filter: &Filter,
        update: Update,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let (current, matched) = self.lookup(filter)?;
        let document = update.into_document(filter);

        if matched {
            let swapped = self
                .tree
                .compare_and_swap(&filter.id, current, Some(encode(&document)?))?;

            // A concurrent writer changed the document after it was read, so it
            // no longer matches. Fall through to the upsert path, which collides.
            if swapped.is_ok() {
                return Ok(UpdateOutcome::Matched);
            }
        }

        if !upsert {
            return Ok(UpdateOutcome::NoMatch);
        }

        self.insert_new(&document)?;
        Ok(UpdateOutcome::Upserted)
    }

    fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        if filter.version.is_none() {
            return Ok(self.tree.remove(&filter.id)?.map_or(0, |_| 1));
        }

        let (current, matched) = self.lookup(filter)?;
        if !matched {
            return Ok(0);
        }

        let removed = self
            .tree
            .compare_and_swap(&filter.id, current, None as Option<&[u8]>)?;
        Ok(if removed.is_ok() { 1 } else { 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> SledCollection {
        let engine = sled::Config::new().temporary(true).open().unwrap();
        SledCollection::new(&engine, "test_collection").unwrap()
    }

    fn document(version: i64, value: u8) -> Document {
        Document {
            id: vec![1],
            version,
            value: vec![value],
        }
    }

    #[test]
    fn insert_and_find() {
        let collection = collection();
        collection.insert_one(document(1, 10)).unwrap();

        assert_eq!(
            collection.find_one(&Filter::by_id(vec![1])).unwrap(),
            Some(document(1, 10))
        );
        assert_eq!(
            collection.find_one(&Filter::by_version(vec![1], 2)).unwrap(),
            None
        );
        assert_eq!(collection.find_one(&Filter::by_id(vec![2])).unwrap(), None);
    }

    #[test]
    fn insert_existing_identity_is_duplicate() {
        let collection = collection();
        collection.insert_one(document(1, 10)).unwrap();

        assert!(matches!(
            collection.insert_one(document(1, 20)),
            Err(StoreError::DuplicateKey)
        ));
        // The original document is untouched.
        assert_eq!(
            collection.find_one(&Filter::by_id(vec![1])).unwrap(),
            Some(document(1, 10))
        );
    }

    #[test]
    fn update_matching_version() {
        let collection = collection();
        collection.insert_one(document(1, 10)).unwrap();

        let outcome = collection
            .update_one(
                &Filter::by_version(vec![1], 1),
                Update {
                    version: 2,
                    value: vec![11],
                },
                true,
            )
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Matched);
        assert_eq!(
            collection.find_one(&Filter::by_id(vec![1])).unwrap(),
            Some(document(2, 11))
        );
    }

    #[test]
    fn stale_version_upsert_collides() {
        let collection = collection();
        collection.insert_one(document(3, 10)).unwrap();
        let update = Update {
            version: 2,
            value: vec![11],
        };

        assert!(matches!(
            collection.update_one(&Filter::by_version(vec![1], 1), update.clone(), true),
            Err(StoreError::DuplicateKey)
        ));
        assert_eq!(
            collection
                .update_one(&Filter::by_version(vec![1], 1), update, false)
                .unwrap(),
            UpdateOutcome::NoMatch
        );
    }

    #[test]
    fn upsert_on_missing_identity_inserts() {
        let collection = collection();

        let outcome = collection
            .update_one(
                &Filter::by_version(vec![1], 4),
                Update {
                    version: 5,
                    value: vec![7],
                },
                true,
            )
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Upserted);
        assert_eq!(
            collection.find_one(&Filter::by_id(vec![1])).unwrap(),
            Some(document(5, 7))
        );
    }

    #[test]
    fn delete() {
        let collection = collection();
        collection.insert_one(document(2, 10)).unwrap();

        assert_eq!(
            collection
                .delete_one(&Filter::by_version(vec![1], 1))
                .unwrap(),
            0
        );
        assert_eq!(
            collection
                .delete_one(&Filter::by_version(vec![1], 2))
                .unwrap(),
            1
        );

        collection.insert_one(document(1, 10)).unwrap();
        assert_eq!(collection.delete_one(&Filter::by_id(vec![1])).unwrap(), 1);
        assert_eq!(collection.delete_one(&Filter::by_id(vec![1])).unwrap(), 0);
    }
}
