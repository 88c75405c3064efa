/// One named table: entries kept sorted by key bytes.
///
/// Lookup, insert and delete locate the key with a binary search; insert
/// and delete shift the tail of the vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemTable {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl MemTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, key: &[u8]) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.as_slice().cmp(key))
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.search(key)
            .ok()
            .map(|index| self.entries[index].1.as_slice())
    }

    /// Overwrites the value of an existing key in place, or inserts it at
    /// its sorted position.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        match self.search(key) {
            Ok(index) => {
                let slot = &mut self.entries[index].1;
                slot.clear();
                slot.extend_from_slice(value);
            }
            Err(index) => self.entries.insert(index, (key.to_vec(), value.to_vec())),
        }
    }

    /// Returns whether the key was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        match self.search(key) {
            Ok(index) => {
                self.entries.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Index of the first entry whose key is `>= key`.
    pub fn lower_bound(&self, key: &[u8]) -> usize {
        self.entries.partition_point(|(k, _)| k.as_slice() < key)
    }

    pub fn entry(&self, index: usize) -> Option<(&[u8], &[u8])> {
        self.entries
            .get(index)
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}
