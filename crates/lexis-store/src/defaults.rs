use crate::entry::Entry;

const DEFAULT_WORDS: &[(&str, [&str; 2])] = &[
    ("hello", ["a greeting", "used when answering the phone"]),
    ("world", ["the earth and all people on it", "a particular region or group"]),
    ("apple", ["a round fruit with red, yellow, or green skin", "the tree bearing this fruit"]),
    ("book", ["a written or printed work", "a collection of sheets bound together"]),
    ("cat", ["a small carnivorous mammal", "a domesticated feline pet"]),
    ("dog", ["a domesticated carnivorous mammal", "a common household pet"]),
    ("house", ["a building for human habitation", "a place where someone lives"]),
    ("car", ["a road vehicle with an engine", "an automobile"]),
    ("sun", ["the star at the center of our solar system", "the light or warmth from this star"]),
    ("moon", ["the natural satellite of the earth", "a celestial body that orbits a planet"]),
];

/// Built-in vocabulary used when no snapshot is configured or it cannot be read.
pub fn default_vocabulary() -> Vec<Entry> {
    DEFAULT_WORDS
        .iter()
        .map(|(word, meanings)| Entry::new(word, meanings.iter().map(|m| m.to_string()).collect()))
        .collect()
}
