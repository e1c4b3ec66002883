//! RecordSet implementation

use crate::codec::{Record, StoredValue};

/// Ordered collection of records with at most one record per key
///
/// Not synchronized: the engine only touches it while holding the
/// readiness gate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    /// Create a new empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from records, letting later records win for repeated keys
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.upsert(record);
        }
        set
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.records.iter().position(|r| r.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Overwrite the value of an existing key in place
    ///
    /// Returns the updated record, or `None` if the key is absent.
    pub fn replace(&mut self, key: &str, value: StoredValue) -> Option<&Record> {
        let idx = self.position(key)?;
        self.records[idx].value = value;
        Some(&self.records[idx])
    }

    /// Append a record without checking for an existing key
    pub fn push(&mut self, record: Record) -> &Record {
        self.records.push(record);
        let last = self.records.len() - 1;
        &self.records[last]
    }

    /// Overwrite in place if the key exists, otherwise append
    pub fn upsert(&mut self, record: Record) {
        match self.position(&record.key) {
            Some(idx) => self.records[idx].value = record.value,
            None => self.records.push(record),
        }
    }

    /// Remove the record for `key`, returning it if present
    pub fn remove(&mut self, key: &str) -> Option<Record> {
        let idx = self.position(key)?;
        Some(self.records.remove(idx))
    }

    /// Move every record of `other` onto the end of this set
    pub fn absorb(&mut self, other: &mut RecordSet) {
        for record in other.records.drain(..) {
            self.upsert(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
