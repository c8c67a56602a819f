use crate::source::reader::Dataset;
use std::collections::HashMap;
use std::fmt;

/// Dense integer identifier of a template key. Assigned IDs start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(usize);

impl EventId {
    /// Stands in for keys the vocabulary was not built from.
    pub const UNKNOWN: EventId = EventId(0);

    pub fn get(self) -> usize {
        self.0
    }

    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Injective mapping from template key to [`EventId`], numbered in the
/// order keys are first seen.
///
/// Built once per run over every dataset, then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventVocabulary {
    ids: HashMap<String, EventId>,
    keys: Vec<String>,
}

impl EventVocabulary {
    /// Walk the datasets in order and number each new key.
    pub fn build(datasets: &[Dataset]) -> Self {
        Self::from_keys(
            datasets
                .iter()
                .flat_map(|d| d.records.iter())
                .map(|r| r.template_key.as_str()),
        )
    }

    pub fn from_keys<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vocabulary = Self::default();
        for key in keys {
            vocabulary.insert(key);
        }
        vocabulary
    }

    fn insert(&mut self, key: &str) -> EventId {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        let id = EventId(self.keys.len() + 1);
        self.ids.insert(key.to_string(), id);
        self.keys.push(key.to_string());
        id
    }

    pub fn get(&self, key: &str) -> Option<EventId> {
        self.ids.get(key).copied()
    }

    /// Like [`get`](Self::get) but falls back to [`EventId::UNKNOWN`].
    pub fn resolve(&self, key: &str) -> EventId {
        self.get(key).unwrap_or(EventId::UNKNOWN)
    }

    pub fn key(&self, id: EventId) -> Option<&str> {
        let idx = id.get().checked_sub(1)?;
        self.keys.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entries in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (EventId, &str)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (EventId(idx + 1), key.as_str()))
    }
}
