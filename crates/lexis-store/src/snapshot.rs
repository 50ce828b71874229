//! Snapshot dump and reload.
//!
//! Two equivalent representations are supported:
//!
//! Text (any extension other than `.json`):
//! ```text
//! # comment
//! hello:
//!     a greeting
//!     used when answering the phone
//!
//! world:
//!     the earth and all people on it
//! ```
//!
//! Only unindented lines starting with `#` are comments. Inside a word or
//! meaning, a backslash, line feed and carriage return are written as `\\`,
//! `\n` and `\r`, and a leading `#` as `\#`, so every stored value reloads
//! unchanged.
//!
//! JSON (`.json`): an object mapping each word to `{"word", "meanings"}`.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::entry::{normalize_meaning, normalize_word, Entry};
use crate::error::{StoreError, StoreResult};
use crate::traits::WordStore;

const WORD_SEPARATOR: char = ':';
const MEANING_INDENT: &str = "    ";
const COMMENT_PREFIX: char = '#';

/// On-disk snapshot representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
    Text,
    Json,
}

impl SnapshotFormat {
    /// `.json` files use [`SnapshotFormat::Json`]; everything else is text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }

    pub fn decode(self, input: &str) -> StoreResult<Vec<Entry>> {
        match self {
            Self::Text => parse_text(input),
            Self::Json => parse_json(input),
        }
    }

    pub fn encode(self, entries: &[Entry]) -> StoreResult<String> {
        match self {
            Self::Text => Ok(render_text(entries)),
            Self::Json => render_json(entries),
        }
    }
}

impl std::fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Load a snapshot file into `store`, overwriting words it already holds.
///
/// Returns the number of entries loaded.
pub fn load_snapshot<S>(store: &S, path: &Path) -> StoreResult<usize>
where
    S: WordStore + ?Sized,
{
    let format = SnapshotFormat::from_path(path);
    let contents = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let entries = format.decode(&contents)?;
    let loaded = store.load(entries);
    info!(path = %path.display(), %format, loaded, "snapshot loaded");
    Ok(loaded)
}

/// Write every entry of `store` to `path`.
///
/// The snapshot is written to a temporary file in the same directory and
/// renamed into place, so a failed save never truncates an existing file.
pub fn save_snapshot<S>(store: &S, path: &Path) -> StoreResult<usize>
where
    S: WordStore + ?Sized,
{
    let format = SnapshotFormat::from_path(path);
    let entries = store.entries();
    let rendered = format.encode(&entries)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(rendered.as_bytes())
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    info!(path = %path.display(), %format, saved = entries.len(), "snapshot saved");
    Ok(entries.len())
}

/// Parse the indented text format.
pub fn parse_text(input: &str) -> StoreResult<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if raw.starts_with(' ') || raw.starts_with('\t') {
            match current.as_mut() {
                Some((_, meanings)) => meanings.push(normalize_meaning(&unescape(trimmed))),
                None => {
                    return Err(StoreError::Parse {
                        line: line_no,
                        reason: "meaning appears before any word".into(),
                    })
                }
            }
            continue;
        }
        if trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }

        let Some(header) = trimmed.strip_suffix(WORD_SEPARATOR) else {
            return Err(StoreError::Parse {
                line: line_no,
                reason: format!("expected `word{WORD_SEPARATOR}` header, found {trimmed:?}"),
            });
        };
        let word = normalize_word(&unescape(header));
        if word.is_empty() {
            return Err(StoreError::Parse {
                line: line_no,
                reason: "empty word".into(),
            });
        }
        flush_text_entry(&mut entries, current.take());
        current = Some((word, Vec::new()));
    }
    flush_text_entry(&mut entries, current);

    debug!(entries = entries.len(), "parsed text snapshot");
    Ok(entries)
}

fn flush_text_entry(entries: &mut Vec<Entry>, pending: Option<(String, Vec<String>)>) {
    if let Some((word, meanings)) = pending {
        if !meanings.is_empty() {
            entries.push(Entry::new(word, meanings));
        }
    }
}

/// Render entries in the indented text format.
pub fn render_text(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        escape_into(&mut out, entry.word());
        out.push(WORD_SEPARATOR);
        out.push('\n');
        for meaning in entry.meanings() {
            out.push_str(MEANING_INDENT);
            escape_into(&mut out, meaning);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn escape_into(out: &mut String, field: &str) {
    for (i, c) in field.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            COMMENT_PREFIX if i == 0 => out.push_str("\\#"),
            c => out.push(c),
        }
    }
}

/// Reverse of [`escape_into`]. Unknown escapes are kept verbatim.
fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(c @ ('\\' | COMMENT_PREFIX)) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parse the JSON document format. Keys are normalized; entries without
/// meanings are dropped.
pub fn parse_json(input: &str) -> StoreResult<Vec<Entry>> {
    let doc: BTreeMap<String, Entry> = serde_json::from_str(input)?;
    Ok(doc
        .into_iter()
        .filter_map(|(word, entry)| {
            let meanings: Vec<String> = entry
                .into_meanings()
                .into_iter()
                .map(|m| normalize_meaning(&m))
                .filter(|m| !m.is_empty())
                .collect();
            let entry = Entry::new(word, meanings);
            (!entry.word().is_empty() && !entry.is_empty()).then_some(entry)
        })
        .collect())
}

/// Render entries as a pretty-printed JSON document keyed by word.
pub fn render_json(entries: &[Entry]) -> StoreResult<String> {
    let doc: BTreeMap<&str, &Entry> = entries.iter().map(|e| (e.word(), e)).collect();
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryWordStore;

    const SAMPLE: &str = "\
# sample dictionary
Hello:
    a greeting
\tused when answering the phone

world:
    the earth: and all people on it
";

    fn meanings(items: &[&str]) -> Vec<String> {
        items.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(SnapshotFormat::from_path(Path::new("dict.json")), SnapshotFormat::Json);
        assert_eq!(SnapshotFormat::from_path(Path::new("dict.JSON")), SnapshotFormat::Json);
        assert_eq!(SnapshotFormat::from_path(Path::new("dict.txt")), SnapshotFormat::Text);
        assert_eq!(SnapshotFormat::from_path(Path::new("dict")), SnapshotFormat::Text);
    }

    #[test]
    fn parse_text_sample() {
        let entries = parse_text(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].word(), "hello");
        assert_eq!(entries[0].meanings(), ["a greeting", "used when answering the phone"]);
        assert_eq!(entries[1].meanings(), ["the earth: and all people on it"]);
    }

    #[test]
    fn parse_text_drops_words_without_meanings() {
        let entries = parse_text("lonely:\n\nother:\n    x\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word(), "other");
    }

    #[test]
    fn parse_text_rejects_orphan_meaning() {
        let err = parse_text("    orphan\n").unwrap_err();
        assert!(matches!(err, StoreError::Parse { line: 1, .. }));
    }

    #[test]
    fn parse_text_rejects_header_without_separator() {
        let err = parse_text("ok:\n    fine\nbroken line\n").unwrap_err();
        assert!(matches!(err, StoreError::Parse { line: 3, .. }));
    }

    #[test]
    fn text_round_trip() {
        let entries = vec![
            Entry::new("apple", meanings(&["a fruit", "a tree"])),
            Entry::new("book", meanings(&["a written work"])),
        ];
        let rendered = render_text(&entries);
        assert!(rendered.starts_with("apple:\n    a fruit\n"));
        assert_eq!(parse_text(&rendered).unwrap(), entries);
    }

    #[test]
    fn text_round_trip_hostile_content() {
        let entries = vec![
            Entry::new("#tag", meanings(&["# heading", "plain"])),
            Entry::new("note", meanings(&["line one\nline two", "cr\rhere", "tab\tinside"])),
            Entry::new("path:", meanings(&["C:\\dir\\n", "ends with colon:", "\\#not a comment"])),
        ];
        let rendered = render_text(&entries);
        assert!(rendered.starts_with("\\#tag:\n    \\# heading\n"));
        assert_eq!(rendered.lines().filter(|l| l.contains("line one")).count(), 1);
        assert_eq!(parse_text(&rendered).unwrap(), entries);
    }

    #[test]
    fn indented_hash_is_a_meaning() {
        let entries = parse_text("# comment\nnote:\n    # heading\n    plain\n").unwrap();
        assert_eq!(entries[0].meanings(), ["# heading", "plain"]);
    }

    #[test]
    fn unknown_escapes_are_kept() {
        let entries = parse_text("dir:\n    C:\\temp\\x\n").unwrap();
        assert_eq!(entries[0].meanings(), ["C:\\temp\\x"]);
    }

    #[test]
    fn json_round_trip() {
        let entries = vec![
            Entry::new("apple", meanings(&["a fruit"])),
            Entry::new("zoo", meanings(&["animals", "animals"])),
        ];
        let rendered = render_json(&entries).unwrap();
        assert_eq!(parse_json(&rendered).unwrap(), entries);
    }

    #[test]
    fn parse_json_normalizes_keys() {
        let input = r#"{" Moon ": {"word": "Moon", "meanings": [" satellite ", "  "]}}"#;
        let entries = parse_json(input).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word(), "moon");
        assert_eq!(entries[0].meanings(), ["satellite"]);
    }

    #[test]
    fn parse_json_invalid() {
        assert!(matches!(parse_json("not json"), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn save_and_load_through_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["dict.txt", "dict.json"] {
            let path = dir.path().join(name);
            let source = InMemoryWordStore::new();
            source.add("cat", &meanings(&["a feline", "a pet"]));
            source.add("dog", &meanings(&["a canine"]));
            assert_eq!(save_snapshot(&source, &path).unwrap(), 2);

            let target = InMemoryWordStore::new();
            assert_eq!(load_snapshot(&target, &path).unwrap(), 2);
            assert_eq!(target.entries(), source.entries());
        }
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryWordStore::new();
        let err = load_snapshot(&store, &dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn saved_multiline_meaning_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.txt");
        let source = InMemoryWordStore::new();
        source.add("#tag", &meanings(&["line one\nline two", "# heading"]));
        save_snapshot(&source, &path).unwrap();

        let target = InMemoryWordStore::new();
        assert_eq!(load_snapshot(&target, &path).unwrap(), 1);
        assert_eq!(target.entries(), source.entries());
    }

    mod round_trip {
        use super::*;
        use proptest::prelude::*;

        fn entries() -> impl Strategy<Value = Vec<Entry>> {
            let field = r"[a-zA-Z0-9#: \t\n\r\\-]{1,16}";
            prop::collection::vec(
                (field, prop::collection::vec(field, 1..4)),
                0..6,
            )
            .prop_map(|raw| {
                let mut by_word = BTreeMap::new();
                for (word, list) in raw {
                    let word = normalize_word(&word);
                    let list: Vec<String> = list
                        .iter()
                        .map(|m| normalize_meaning(m))
                        .filter(|m| !m.is_empty())
                        .collect();
                    if !word.is_empty() && !list.is_empty() {
                        by_word.insert(word, list);
                    }
                }
                by_word
                    .into_iter()
                    .map(|(word, list)| Entry::new(word, list))
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn text_snapshot_round_trips(entries in entries()) {
                prop_assert_eq!(parse_text(&render_text(&entries)).unwrap(), entries);
            }

            #[test]
            fn json_snapshot_round_trips(entries in entries()) {
                let rendered = render_json(&entries).unwrap();
                prop_assert_eq!(parse_json(&rendered).unwrap(), entries);
            }
        }
    }
}
