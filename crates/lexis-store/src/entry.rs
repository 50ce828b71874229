use serde::{Deserialize, Serialize};

/// Normalize a word for lookup or storage: trim, then lower-case.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Normalize a meaning: trim surrounding whitespace. Case is preserved.
pub fn normalize_meaning(meaning: &str) -> String {
    meaning.trim().to_string()
}

/// A dictionary entry: a normalized word and its ordered meanings.
///
/// The first meaning added is the first listed. Entries handed out by the
/// store are clones, so mutating one never touches shared state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    word: String,
    meanings: Vec<String>,
}

impl Entry {
    /// Create an entry. `word` is normalized; meanings are kept in order.
    pub fn new(word: impl AsRef<str>, meanings: Vec<String>) -> Self {
        Self {
            word: normalize_word(word.as_ref()),
            meanings,
        }
    }

    /// The normalized word.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Meanings in insertion order.
    pub fn meanings(&self) -> &[String] {
        &self.meanings
    }

    /// Consume the entry, returning its meanings.
    pub fn into_meanings(self) -> Vec<String> {
        self.meanings
    }

    /// Number of meanings.
    pub fn len(&self) -> usize {
        self.meanings.len()
    }

    /// True when the entry has no meanings.
    pub fn is_empty(&self) -> bool {
        self.meanings.is_empty()
    }

    /// Exact, case-sensitive match against the trimmed meaning.
    pub fn contains_meaning(&self, meaning: &str) -> bool {
        let meaning = meaning.trim();
        self.meanings.iter().any(|m| m == meaning)
    }

    /// Append a meaning unless it is blank or already present.
    pub(crate) fn push_meaning(&mut self, meaning: &str) -> bool {
        let meaning = normalize_meaning(meaning);
        if meaning.is_empty() || self.contains_meaning(&meaning) {
            return false;
        }
        self.meanings.push(meaning);
        true
    }

    /// Replace `old` with `new`, keeping its position.
    ///
    /// If `new` already sits at a different index, `old` is removed instead so
    /// the list never holds a duplicate. Returns `false` when `old` is absent.
    pub(crate) fn replace_meaning(&mut self, old: &str, new: &str) -> bool {
        let old = old.trim();
        let new = new.trim();
        let Some(index) = self.meanings.iter().position(|m| m == old) else {
            return false;
        };
        match self.meanings.iter().position(|m| m == new) {
            Some(existing) if existing != index => {
                self.meanings.remove(index);
            }
            _ => self.meanings[index] = new.to_string(),
        }
        true
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}:", self.word)?;
        for meaning in &self.meanings {
            writeln!(f, "    {meaning}")?;
        }
        Ok(())
    }
}
