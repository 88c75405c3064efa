use super::table::MemTable;
use crate::backend::Cursor;

/// Position in a [`MemTable`]; exhausted once the index reaches its length.
#[derive(Debug, Clone)]
pub struct MemoryCursor<'t> {
    table: Option<&'t MemTable>,
    index: usize,
}

impl<'t> MemoryCursor<'t> {
    /// Positions at the first key `>= start`, or the first key overall.
    /// A missing table yields an exhausted cursor.
    pub(crate) fn open(table: Option<&'t MemTable>, start: Option<&[u8]>) -> Self {
        let index = match (table, start) {
            (Some(table), Some(start)) => table.lower_bound(start),
            _ => 0,
        };
        Self { table, index }
    }
}

impl Cursor for MemoryCursor<'_> {
    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.table.and_then(|table| table.entry(self.index))
    }

    fn advance(&mut self) -> bool {
        let len = self.table.map_or(0, MemTable::len);
        if self.index < len {
            self.index += 1;
        }
        self.index < len
    }
}
