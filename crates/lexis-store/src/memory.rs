use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::entry::{normalize_meaning, normalize_word, Entry};
use crate::traits::WordStore;

/// In-memory, HashMap-based word store.
///
/// Every entry lives behind one `RwLock`: `search` and `len` take the read
/// side, every mutation takes the write side for the whole check-then-modify
/// sequence. The lock is never held across a call into another lock.
pub struct InMemoryWordStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryWordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries(entries: Vec<Entry>) -> Self {
        let store = Self::new();
        store.load(entries);
        store
    }
}

impl Default for InMemoryWordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WordStore for InMemoryWordStore {
    fn search(&self, word: &str) -> Option<Entry> {
        let key = normalize_word(word);
        let map = self.entries.read().expect("lock poisoned");
        map.get(&key).cloned()
    }

    fn add(&self, word: &str, meanings: &[String]) -> bool {
        let key = normalize_word(word);
        if key.is_empty() || meanings.is_empty() {
            return false;
        }
        let meanings: Vec<String> = meanings.iter().map(|m| normalize_meaning(m)).collect();
        if meanings.iter().any(String::is_empty) {
            return false;
        }

        let mut map = self.entries.write().expect("lock poisoned");
        if map.contains_key(&key) {
            return false;
        }
        debug!(word = %key, meanings = meanings.len(), "word added");
        map.insert(key.clone(), Entry::new(key, meanings));
        true
    }

    fn remove(&self, word: &str) -> bool {
        let key = normalize_word(word);
        if key.is_empty() {
            return false;
        }
        let mut map = self.entries.write().expect("lock poisoned");
        map.remove(&key).is_some()
    }

    fn add_meaning(&self, word: &str, meaning: &str) -> bool {
        let key = normalize_word(word);
        if key.is_empty() || meaning.trim().is_empty() {
            return false;
        }
        let mut map = self.entries.write().expect("lock poisoned");
        match map.get_mut(&key) {
            Some(entry) => entry.push_meaning(meaning),
            None => false,
        }
    }

    fn update_meaning(&self, word: &str, old: &str, new: &str) -> bool {
        let key = normalize_word(word);
        let old = old.trim();
        let new = new.trim();
        if key.is_empty() || old.is_empty() || new.is_empty() {
            return false;
        }
        // Nothing to change; existence of the word and of `old` is not checked.
        if old == new {
            return true;
        }
        let mut map = self.entries.write().expect("lock poisoned");
        match map.get_mut(&key) {
            Some(entry) => entry.replace_meaning(old, new),
            None => false,
        }
    }

    fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }

    fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    fn entries(&self) -> Vec<Entry> {
        let map = self.entries.read().expect("lock poisoned");
        let mut entries: Vec<Entry> = map.values().cloned().collect();
        entries.sort_by(|a, b| a.word().cmp(b.word()));
        entries
    }

    fn load(&self, entries: Vec<Entry>) -> usize {
        let mut map = self.entries.write().expect("lock poisoned");
        let mut loaded = 0;
        for entry in entries {
            if entry.word().is_empty() || entry.is_empty() {
                continue;
            }
            map.insert(entry.word().to_string(), entry);
            loaded += 1;
        }
        loaded
    }
}

impl std::fmt::Debug for InMemoryWordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWordStore")
            .field("word_count", &self.len())
            .finish()
    }
}
