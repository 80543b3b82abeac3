//! # Servant Data Model
//!
//! The record type produced by the extractor and the ordered dataset that the
//! aggregator builds, the store persists and the query service reads.
//!
//! Records serialize to the flat-file shape consumed by readers: `id` and
//! `name` are always present, `class` and `rarity` only for full records.
//! Deserialization tolerates either shape.

use serde::{Deserialize, Serialize};

/// A single servant as listed by the wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServantRecord {
    /// Identifier assigned by the source, unique within a dataset
    pub id: u32,

    /// Display name
    pub name: String,

    /// Servant class (Saber, Archer, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// Star rating, 0 to 5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<u8>,
}

impl ServantRecord {
    /// Create a minimal record carrying only id and name
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            class: None,
            rarity: None,
        }
    }

    /// Attach a class
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Attach a rarity
    pub fn with_rarity(mut self, rarity: u8) -> Self {
        self.rarity = Some(rarity);
        self
    }
}

/// Ordered sequence of servant records
///
/// Serialized transparently as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<ServantRecord>,
}

impl Dataset {
    /// Wrap records that are already in their final order
    pub fn from_records(records: Vec<ServantRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ServantRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ServantRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServantRecord> {
        self.records.iter()
    }

    /// Linear scan for a record by id
    pub fn get(&self, id: u32) -> Option<&ServantRecord> {
        self.records.iter().find(|record| record.id == id)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a ServantRecord;
    type IntoIter = std::slice::Iter<'a, ServantRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
