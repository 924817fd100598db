use bincode::Options;

use crate::document::{StoreError, StoreResult};

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
}

pub(crate) fn encode<S: ?Sized + serde::Serialize>(item: &S) -> StoreResult<Vec<u8>> {
    options().serialize(item).map_err(StoreError::Encode)
}

pub(crate) fn decode<'a, T: serde::Deserialize<'a>>(bytes: &'a [u8]) -> StoreResult<T> {
    options().deserialize(bytes).map_err(StoreError::Decode)
}
