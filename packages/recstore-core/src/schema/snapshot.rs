use crate::codec::len_prefix;
use crate::error::{CodecError, Result, StoreError};

const LEN_PREFIX: usize = 4;

/// Caller-owned capture of a record's serialized keys at read time.
///
/// Layout: `[u32 pk_len][pk][u32 sk1_len][sk1]...`, lengths big-endian,
/// secondary keys in declared index order. The buffer is reused across
/// calls; [`clear`](Self::clear) keeps its capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    buf: Vec<u8>,
}

/// Key sections parsed out of a [`KeySnapshot`].
#[derive(Debug, PartialEq, Eq)]
pub struct SnapshotKeys<'a> {
    pub primary: &'a [u8],
    pub secondary: Vec<&'a [u8]>,
}

impl KeySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps raw snapshot bytes, e.g. ones persisted by the caller.
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    /// An empty snapshot stands for "no previous version".
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Appends one key section; `encode` writes the key bytes after the
    /// reserved length slot, which is then backpatched. On failure the
    /// partial section is dropped.
    pub(crate) fn push_encoded(
        &mut self,
        encode: impl FnOnce(&mut Vec<u8>) -> std::result::Result<(), CodecError>,
    ) -> std::result::Result<(), CodecError> {
        let start = self.buf.len();
        self.buf.extend_from_slice(&[0; LEN_PREFIX]);
        let prefix = encode(&mut self.buf)
            .and_then(|()| len_prefix(self.buf.len() - start - LEN_PREFIX));
        match prefix {
            Ok(prefix) => {
                self.buf[start..start + LEN_PREFIX].copy_from_slice(&prefix);
                Ok(())
            }
            Err(err) => {
                self.buf.truncate(start);
                Err(err)
            }
        }
    }

    /// Splits the snapshot into its primary and `expected_secondary` index keys.
    pub fn keys(&self, expected_secondary: usize) -> Result<SnapshotKeys<'_>> {
        let mut rest = self.buf.as_slice();
        let mut sections = Vec::with_capacity(expected_secondary + 1);
        while !rest.is_empty() {
            let (section, tail) = split_section(rest)?;
            sections.push(section);
            rest = tail;
        }
        if sections.len() != expected_secondary + 1 {
            return Err(StoreError::InvalidInput(format!(
                "snapshot holds {} keys, expected {}",
                sections.len(),
                expected_secondary + 1
            )));
        }
        let primary = sections.remove(0);
        Ok(SnapshotKeys {
            primary,
            secondary: sections,
        })
    }
}

fn split_section(buf: &[u8]) -> Result<(&[u8], &[u8])> {
    if buf.len() < LEN_PREFIX {
        return Err(StoreError::InvalidInput(format!(
            "snapshot length prefix truncated: {} bytes left",
            buf.len()
        )));
    }
    let (prefix, body) = buf.split_at(LEN_PREFIX);
    let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    if len > body.len() {
        return Err(StoreError::InvalidInput(format!(
            "snapshot key section truncated: needs {len} bytes, {} left",
            body.len()
        )));
    }
    Ok(body.split_at(len))
}
