use std::marker::PhantomData;

use crate::backend::Cursor;
use crate::codec::{decode_from_slice, Encodable};
use crate::error::Result;

/// Decodes each `(key, value)` entry of a backend cursor as `(K, V)`.
///
/// Items come in ascending key order. An entry that fails to decode is
/// yielded as an error and iteration continues with the next entry.
#[derive(Debug)]
pub struct TypedCursor<C, K, V> {
    inner: C,
    started: bool,
    _entry: PhantomData<fn() -> (K, V)>,
}

/// Primary table scan yielding `(primary key, record)`.
pub type PrimaryCursor<C, P, R> = TypedCursor<C, P, R>;

/// Secondary table scan yielding `(index key, primary key)`.
pub type IndexCursor<C, K, P> = TypedCursor<C, K, P>;

impl<C: Cursor, K: Encodable, V: Encodable> TypedCursor<C, K, V> {
    pub(crate) fn new(inner: C) -> Self {
        Self {
            inner,
            started: false,
            _entry: PhantomData,
        }
    }
}

impl<C: Cursor, K: Encodable, V: Encodable> Iterator for TypedCursor<C, K, V> {
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.started {
            self.inner.advance();
        } else {
            self.started = true;
        }
        let (key, value) = self.inner.current()?;
        Some(decode_entry(key, value))
    }
}

fn decode_entry<K: Encodable, V: Encodable>(key: &[u8], value: &[u8]) -> Result<(K, V)> {
    Ok((decode_from_slice(key)?, decode_from_slice(value)?))
}
