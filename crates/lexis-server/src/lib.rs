//! TCP server for the Lexis dictionary.
//!
//! Accepts many concurrent clients, each served by its own task running a
//! read-dispatch-write loop against one shared [`lexis_store::WordStore`].
//! A semaphore bounds how many connections are served at once.

pub mod config;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod server;

pub use config::{ServerConfig, DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT};
pub use error::{ServerError, ServerResult};
pub use handler::{dispatch, ConnectionHandler};
pub use hooks::{NoOpObserver, ServerObserver};
pub use server::{DictionaryServer, ServerState};
