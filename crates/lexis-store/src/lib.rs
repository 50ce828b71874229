//! In-memory word store for the Lexis dictionary server.
//!
//! Maps a normalized word to an [`Entry`] holding its ordered meanings. The
//! store is shared by every client connection, so all access goes through a
//! single reader-writer lock: lookups run concurrently, mutations are
//! exclusive.
//!
//! # Normalization
//!
//! Words are trimmed and lower-cased before lookup or storage. Meanings are
//! trimmed. Blank inputs are rejected with a `false` result, never an error.
//!
//! # Storage Backends
//!
//! All backends implement the [`WordStore`] trait:
//!
//! - [`InMemoryWordStore`] -- `HashMap` behind a `RwLock`
//!
//! # Snapshots
//!
//! [`snapshot`] dumps and reloads the full store in either the indented text
//! format or a JSON document. Snapshot I/O is the only place the store
//! reports errors.

pub mod defaults;
pub mod entry;
pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use defaults::default_vocabulary;
pub use entry::{normalize_meaning, normalize_word, Entry};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryWordStore;
pub use snapshot::{load_snapshot, save_snapshot, SnapshotFormat};
pub use traits::WordStore;
