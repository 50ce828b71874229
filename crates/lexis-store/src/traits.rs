use crate::entry::Entry;

/// A shared, concurrency-safe mapping from normalized words to entries.
///
/// All implementations must satisfy these invariants:
/// - A key present in the store maps to exactly one entry whose `word` equals
///   the key.
/// - Entries are returned by value; callers never hold references into the
///   store.
/// - Lookups may run concurrently. Mutations are exclusive, so a reader sees
///   an entry as of some completed write, never a partial one.
/// - Bad input (blank words or meanings) is rejected with `false`, never a
///   panic or an error.
pub trait WordStore: Send + Sync {
    /// Look up a word, ignoring case and surrounding whitespace.
    fn search(&self, word: &str) -> Option<Entry>;

    /// Insert a new word with its meanings.
    ///
    /// Fails if the word is blank, `meanings` is empty or holds a blank
    /// meaning, or the word already exists. Duplicates within `meanings` are
    /// kept as given.
    fn add(&self, word: &str, meanings: &[String]) -> bool;

    /// Delete a word. Returns `false` if it was not present.
    fn remove(&self, word: &str) -> bool;

    /// Append a meaning to an existing word.
    ///
    /// Fails if the word is missing, the meaning is blank, or the trimmed
    /// meaning already exists (exact match).
    fn add_meaning(&self, word: &str, meaning: &str) -> bool;

    /// Replace one meaning of a word with another.
    ///
    /// When `old` and `new` are equal after trimming this returns `true`
    /// without consulting the store at all, even if the word or `old` is
    /// absent. Otherwise fails if the word or `old` is missing. If `new`
    /// already exists elsewhere in the list, `old` is removed rather than
    /// creating a duplicate.
    fn update_meaning(&self, word: &str, old: &str, new: &str) -> bool;

    /// Remove every entry.
    fn clear(&self);

    /// Number of words stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, sorted by word.
    fn entries(&self) -> Vec<Entry>;

    /// Bulk insert under a single exclusive lock. Later entries for the same
    /// word overwrite earlier ones. Returns the number of entries inserted.
    fn load(&self, entries: Vec<Entry>) -> usize;
}
