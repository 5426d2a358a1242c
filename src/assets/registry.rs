//! The per-run asset registry.
//!
//! An arena of records in first-appearance order plus an index keyed by
//! content address. Records are only ever added.

use std::collections::HashMap;

use super::address::ContentAddress;
use crate::syntax::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub identifier: String,
    pub filename: String,
    pub address: ContentAddress,
    pub bytes: Vec<u8>,
    /// The literal of the first call site that named the file.
    pub span: Span,
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    records: Vec<AssetRecord>,
    index: HashMap<ContentAddress, usize>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &ContentAddress) -> Option<&AssetRecord> {
        self.index.get(address).map(|&i| &self.records[i])
    }

    /// Adds `record` unless its address is already known, and returns the
    /// record stored under that address.
    pub fn insert(&mut self, record: AssetRecord) -> &AssetRecord {
        let next = self.records.len();
        let index = *self.index.entry(record.address.clone()).or_insert(next);
        if index == next {
            self.records.push(record);
        }
        &self.records[index]
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, bytes: &[u8]) -> AssetRecord {
        AssetRecord {
            identifier: format!("Asset_{filename}"),
            filename: filename.to_string(),
            address: ContentAddress::of(filename),
            bytes: bytes.to_vec(),
            span: Span::default(),
        }
    }

    #[test]
    fn test_first_record_wins() {
        let mut registry = AssetRegistry::new();
        assert!(registry.is_empty());
        registry.insert(record("a", b"first"));
        let kept = registry.insert(record("a", b"second"));
        assert_eq!(kept.bytes, b"first");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insertion_order() {
        let mut registry = AssetRegistry::new();
        for name in ["c", "a", "b", "a"] {
            registry.insert(record(name, b""));
        }
        let names: Vec<_> = registry.records().iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert!(registry.get(&ContentAddress::of("b")).is_some());
        assert!(registry.get(&ContentAddress::of("d")).is_none());
    }
}
