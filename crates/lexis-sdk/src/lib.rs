//! Client for the Lexis dictionary server.
//!
//! [`DictionaryClient`] holds one TCP connection and performs strictly
//! sequential request/response exchanges over it. Retry policy is left to the
//! caller.

pub mod client;
pub mod error;

pub use client::DictionaryClient;
pub use error::{SdkError, SdkResult};

pub use lexis_protocol::{Message, Operation, Request, Status};
