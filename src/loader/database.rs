//! Card metadata database
//!
//! Loaded asynchronously from JSON, either a plain array of records or the
//! bulk cache layout keyed by `by_arena_id`. Lookups are synchronous so the
//! database can resolve cards while events are applied.

use crate::core::Card;
use crate::game::events::{CardResolver, EventCard};
use crate::loader::card::CardMetadata;
use crate::{MtgError, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;

/// Normalize a card name for lookup
///
/// "Lim-Dûl's Vault" -> "lim-dul's vault"
pub fn normalize_name(name: &str) -> String {
    deunicode::deunicode(name.trim())
        .to_lowercase()
        .replace('\u{2019}', "'")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CardFile {
    Records(Vec<CardMetadata>),
    Cache {
        by_arena_id: HashMap<String, CardMetadata>,
    },
}

impl CardFile {
    fn into_records(self) -> Vec<CardMetadata> {
        match self {
            CardFile::Records(records) => records,
            CardFile::Cache { by_arena_id } => by_arena_id.into_values().collect(),
        }
    }
}

/// Card metadata indexed by definition id and normalized name
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    by_id: FxHashMap<u32, Arc<CardMetadata>>,
    by_name: FxHashMap<String, Arc<CardMetadata>>,
}

impl CardDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = CardMetadata>) -> Self {
        let mut db = CardDatabase::new();
        for record in records {
            db.insert(record);
        }
        db
    }

    /// Add a record; a later record with the same id or name replaces the earlier one
    pub fn insert(&mut self, record: CardMetadata) {
        let record = Arc::new(record);
        if let Some(id) = record.arena_id {
            self.by_id.insert(id, Arc::clone(&record));
        }
        self.by_name
            .insert(normalize_name(&record.name), Arc::clone(&record));
    }

    /// Parse a JSON card file
    pub fn parse(json: &str) -> Result<Self> {
        let file: CardFile = serde_json::from_str(json)?;
        Ok(Self::from_records(file.into_records()))
    }

    /// Load a JSON card file
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(MtgError::IoError)?;
        // Bulk exports run to tens of megabytes
        let db = tokio::task::spawn_blocking(move || Self::parse(&json)).await??;
        Ok(db)
    }

    /// Load several card files in parallel and merge them in the given order
    ///
    /// Returns the merged database and the time taken.
    pub async fn load_many(paths: &[PathBuf]) -> Result<(Self, std::time::Duration)> {
        let start = Instant::now();

        let tasks: Vec<_> = paths
            .iter()
            .map(|path| {
                let path = path.clone();
                tokio::spawn(async move { CardDatabase::load(&path).await })
            })
            .collect();

        let mut merged = CardDatabase::new();
        for (path, task) in paths.iter().zip(tasks) {
            let db = task.await?.map_err(|e| match e {
                MtgError::SerializationError(msg) => {
                    MtgError::SerializationError(format!("{}: {msg}", path.display()))
                }
                other => other,
            })?;
            merged.merge(db);
        }

        Ok((merged, start.elapsed()))
    }

    fn merge(&mut self, other: CardDatabase) {
        self.by_id.extend(other.by_id);
        self.by_name.extend(other.by_name);
    }

    pub fn by_definition(&self, id: u32) -> Option<&CardMetadata> {
        self.by_id.get(&id).map(|r| r.as_ref())
    }

    pub fn by_name(&self, name: &str) -> Option<&CardMetadata> {
        self.by_name.get(&normalize_name(name)).map(|r| r.as_ref())
    }

    /// Metadata for an event card: by definition id first, then by name
    pub fn lookup(&self, info: &EventCard) -> Option<&CardMetadata> {
        info.definition_id
            .and_then(|id| self.by_definition(id))
            .or_else(|| self.by_name(&info.name))
    }

    /// Number of distinct card names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl CardResolver for CardDatabase {
    /// Unknown cards keep only what the event reported, so no restriction
    /// applies to them beyond their name
    fn resolve(&self, info: &EventCard) -> Card {
        let mut card = info.to_card();
        if let Some(meta) = self.lookup(info) {
            meta.fill(&mut card);
        }
        card
    }
}
