use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Message, Operation};

/// A validated request, one variant per operation.
///
/// Words are carried exactly as the client sent them; normalization happens
/// in the store. Every string field is guaranteed non-blank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Search {
        word: String,
    },
    Add {
        word: String,
        meanings: Vec<String>,
    },
    Remove {
        word: String,
    },
    AddMeaning {
        word: String,
        meaning: String,
    },
    UpdateMeaning {
        word: String,
        old_meaning: String,
        new_meaning: String,
    },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Search { .. } => Operation::Search,
            Self::Add { .. } => Operation::Add,
            Self::Remove { .. } => Operation::Remove,
            Self::AddMeaning { .. } => Operation::AddMeaning,
            Self::UpdateMeaning { .. } => Operation::UpdateMeaning,
        }
    }

    pub fn word(&self) -> &str {
        match self {
            Self::Search { word }
            | Self::Add { word, .. }
            | Self::Remove { word }
            | Self::AddMeaning { word, .. }
            | Self::UpdateMeaning { word, .. } => word,
        }
    }

    /// Encode as a wire envelope. `AddMeaning` carries its meaning as the
    /// single element of `meanings`.
    pub fn into_message(self) -> Message {
        let op = self.operation();
        match self {
            Self::Search { word } | Self::Remove { word } => Message::request(op).with_word(word),
            Self::Add { word, meanings } => Message::request(op).with_word(word).with_meanings(meanings),
            Self::AddMeaning { word, meaning } => {
                Message::request(op).with_word(word).with_meanings(vec![meaning])
            }
            Self::UpdateMeaning {
                word,
                old_meaning,
                new_meaning,
            } => Message::request(op)
                .with_word(word)
                .with_old_meaning(old_meaning)
                .with_new_meaning(new_meaning),
        }
    }
}

const LINE_BREAKS: &[char] = &['\n', '\r'];
const WORD_LINE_BREAK: &str = "Word cannot contain line breaks";
const MEANING_LINE_BREAK: &str = "Meanings cannot contain line breaks";

fn invalid(reason: &str) -> ProtocolError {
    ProtocolError::InvalidRequest(reason.to_string())
}

/// A present, non-blank, single-line field.
fn required(field: Option<String>, blank: &str, multiline: &str) -> ProtocolResult<String> {
    match field {
        Some(value) if value.trim().is_empty() => Err(invalid(blank)),
        Some(value) if value.contains(LINE_BREAKS) => Err(invalid(multiline)),
        Some(value) => Ok(value),
        None => Err(invalid(blank)),
    }
}

impl TryFrom<Message> for Request {
    type Error = ProtocolError;

    fn try_from(msg: Message) -> ProtocolResult<Self> {
        let op = msg.operation_kind()?;
        let word = required(msg.word, "Word cannot be empty", WORD_LINE_BREAK)?;
        let request = match op {
            Operation::Search => Self::Search { word },
            Operation::Remove => Self::Remove { word },
            Operation::Add => {
                let meanings = msg.meanings.unwrap_or_default();
                if meanings.is_empty() || meanings.iter().any(|m| m.trim().is_empty()) {
                    return Err(invalid("Meanings cannot be empty"));
                }
                if meanings.iter().any(|m| m.contains(LINE_BREAKS)) {
                    return Err(invalid(MEANING_LINE_BREAK));
                }
                Self::Add { word, meanings }
            }
            Operation::AddMeaning => {
                let first = msg.meanings.and_then(|m| m.into_iter().next());
                let meaning = required(first, "New meaning cannot be empty", MEANING_LINE_BREAK)?;
                Self::AddMeaning { word, meaning }
            }
            Operation::UpdateMeaning => {
                let old_meaning = required(
                    msg.old_meaning,
                    "Existing meaning cannot be empty",
                    MEANING_LINE_BREAK,
                )?;
                let new_meaning =
                    required(msg.new_meaning, "New meaning cannot be empty", MEANING_LINE_BREAK)?;
                Self::UpdateMeaning {
                    word,
                    old_meaning,
                    new_meaning,
                }
            }
        };
        Ok(request)
    }
}
