use crate::shared::image::ImageRecord;
use std::collections::HashSet;

/// Ordered sequence of image records, unique by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSet {
    records: Vec<ImageRecord>,
    index: HashSet<String>,
}

impl CollectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a sequence, keeping the first occurrence of each id
    pub fn from_records(records: Vec<ImageRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.push_back(record);
        }
        set
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&ImageRecord> {
        if !self.contains(id) {
            return None;
        }
        self.records.iter().find(|record| record.id == id)
    }

    /// Append unless present; returns whether the record was inserted
    pub fn push_back(&mut self, record: ImageRecord) -> bool {
        if !self.index.insert(record.id.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Prepend unless present; returns whether the record was inserted
    pub fn push_front(&mut self, record: ImageRecord) -> bool {
        if !self.index.insert(record.id.clone()) {
            return false;
        }
        self.records.insert(0, record);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<ImageRecord> {
        if !self.index.remove(id) {
            return None;
        }
        let position = self.records.iter().position(|record| record.id == id)?;
        Some(self.records.remove(position))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.id.as_str())
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }
}
