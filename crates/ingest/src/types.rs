//! Records produced by the loader.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One tweet after filtering.
///
/// Known columns get typed fields, every other column of the input file is
/// kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetRecord {
    pub id: String,
    pub created_at: String,
    /// Tweet text. Normalized in place by the matrix builder.
    pub text: String,
    /// Original text when the extended `text+quote+reply` column replaced it.
    pub text_not_formated: Option<String>,
    pub label: Option<String>,
    pub event: Option<String>,
    pub image: Option<String>,
    /// `YYYYMMDD` derived from `created_at`.
    pub date: String,
    pub extra: BTreeMap<String, String>,
}

/// Optional columns a presence mask can be computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Label,
    Event,
    Image,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Field::Label => "label",
            Field::Event => "event",
            Field::Image => "image",
        }
    }
}

impl TweetRecord {
    /// Whether the optional `field` holds a value.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Label => self.label.is_some(),
            Field::Event => self.event.is_some(),
            Field::Image => self.image.is_some(),
        }
    }
}

/// Filtered, deduplicated rows sorted by id, plus the header of the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<TweetRecord>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<TweetRecord>) -> Self {
        Self { columns, records }
    }

    /// Column names as they appear in the file header.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TweetRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[TweetRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [TweetRecord] {
        &mut self.records
    }

    /// Tweet texts in row order.
    pub fn texts(&self) -> Vec<String> {
        self.records.iter().map(|r| r.text.clone()).collect()
    }

    /// One entry per row, `true` where `field` is present.
    pub fn mask(&self, field: Field) -> Vec<bool> {
        self.records.iter().map(|r| r.has(field)).collect()
    }

    pub fn into_records(self) -> Vec<TweetRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TweetRecord;
    type IntoIter = std::slice::Iter<'a, TweetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
