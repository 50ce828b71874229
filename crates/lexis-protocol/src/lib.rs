//! Wire protocol for the Lexis dictionary server.
//!
//! Every request and response is a single [`Message`] encoded as one line of
//! JSON. Field names are tagged rather than positional, so new optional
//! fields can be added without breaking older peers.
//!
//! Incoming messages are converted into a closed [`Request`] enum before
//! dispatch; unknown operations and missing fields surface as
//! [`ProtocolError`] values the server turns into `ERROR` responses.

pub mod codec;
pub mod error;
pub mod message;
pub mod request;

pub use codec::{read_message, write_message, LineCodec, MAX_LINE_LENGTH};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{Message, Operation, Status};
pub use request::Request;
