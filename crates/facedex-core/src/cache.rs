//! Local cache boundary: three durable string slots, one per collection.

use crate::types::Collections;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("cache lock poisoned")]
    Poisoned,
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// One of the three persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    ImageHistory,
    RecognizedPersons,
    UnrecognizedPersons,
}

impl Slot {
    pub const ALL: [Slot; 3] = [
        Slot::ImageHistory,
        Slot::RecognizedPersons,
        Slot::UnrecognizedPersons,
    ];

    /// Storage key for this slot.
    pub fn key(self) -> &'static str {
        match self {
            Slot::ImageHistory => "imageHistory",
            Slot::RecognizedPersons => "recognizedPersons",
            Slot::UnrecognizedPersons => "unrecognizedPersons",
        }
    }
}

/// Durable key/value storage holding the stringified collections.
pub trait LocalCache: Send + Sync {
    fn read(&self, slot: Slot) -> Result<Option<String>, CacheError>;
    fn write(&self, slot: Slot, value: &str) -> Result<(), CacheError>;
}

/// Read all three slots. A missing, unreadable or malformed slot yields an
/// empty collection; the other slots still load.
pub fn load(cache: &dyn LocalCache) -> Collections {
    Collections {
        history: load_slot(cache, Slot::ImageHistory),
        persons: load_slot(cache, Slot::RecognizedPersons),
        unrecognized: load_slot(cache, Slot::UnrecognizedPersons),
    }
}

fn load_slot<T: DeserializeOwned>(cache: &dyn LocalCache, slot: Slot) -> Vec<T> {
    let raw = match cache.read(slot) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(slot = slot.key(), error = %e, "cache read failed");
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(slot = slot.key(), error = %e, "ignoring malformed cache slot");
        Vec::new()
    })
}

/// Write all three collections.
pub fn store(cache: &dyn LocalCache, collections: &Collections) -> Result<(), CacheError> {
    cache.write(Slot::ImageHistory, &serde_json::to_string(&collections.history)?)?;
    cache.write(Slot::RecognizedPersons, &serde_json::to_string(&collections.persons)?)?;
    cache.write(
        Slot::UnrecognizedPersons,
        &serde_json::to_string(&collections.unrecognized)?,
    )?;
    Ok(())
}

/// Process-local cache. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryCache {
    slots: Mutex<HashMap<Slot, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn read(&self, slot: Slot) -> Result<Option<String>, CacheError> {
        let slots = self.slots.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(slots.get(&slot).cloned())
    }

    fn write(&self, slot: Slot, value: &str) -> Result<(), CacheError> {
        let mut slots = self.slots.lock().map_err(|_| CacheError::Poisoned)?;
        slots.insert(slot, value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Face, Person};

    fn alice() -> Person {
        Person {
            name: "Alice".into(),
            images: vec![Face {
                id: "a1".into(),
                image: "f1".into(),
                confidence: 90.0,
                timestamp: "t".into(),
                face_position: None,
            }],
        }
    }

    #[test]
    fn test_slot_keys() {
        let keys: Vec<_> = Slot::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(keys, ["imageHistory", "recognizedPersons", "unrecognizedPersons"]);
    }

    #[test]
    fn test_store_then_load() {
        let cache = MemoryCache::new();
        let collections = Collections {
            persons: vec![alice()],
            ..Default::default()
        };
        store(&cache, &collections).unwrap();
        assert_eq!(load(&cache), collections);
    }

    #[test]
    fn test_empty_cache_loads_empty() {
        assert!(load(&MemoryCache::new()).is_empty());
    }

    #[test]
    fn test_malformed_slot_falls_back_per_slot() {
        let cache = MemoryCache::new();
        cache.write(Slot::ImageHistory, "{not json").unwrap();
        cache
            .write(Slot::RecognizedPersons, &serde_json::to_string(&vec![alice()]).unwrap())
            .unwrap();
        cache.write(Slot::UnrecognizedPersons, "42").unwrap();

        let loaded = load(&cache);
        assert!(loaded.history.is_empty());
        assert_eq!(loaded.persons, vec![alice()]);
        assert!(loaded.unrecognized.is_empty());
    }
}
