use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Operations a client can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Add,
    Remove,
    AddMeaning,
    UpdateMeaning,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Self::Search,
        Self::Add,
        Self::Remove,
        Self::AddMeaning,
        Self::UpdateMeaning,
    ];

    /// Wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "SEARCH",
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::AddMeaning => "ADD_MEANING",
            Self::UpdateMeaning => "UPDATE_MEANING",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownOperation(s.to_string()))
    }
}

/// Outcome of a request.
///
/// `Error` covers protocol problems only. Expected domain outcomes (missing
/// word, duplicate, missing meaning) have their own codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Error,
    NotFound,
    Duplicate,
    MeaningNotFound,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Error => write!(f, "ERROR"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Duplicate => write!(f, "DUPLICATE"),
            Self::MeaningNotFound => write!(f, "MEANING_NOT_FOUND"),
        }
    }
}

/// Request/response envelope shared by both directions.
///
/// Fields irrelevant to a given operation or status stay `None` and are
/// omitted from the encoding. `operation` is kept as a string so a request
/// naming an operation this server does not know still decodes and can be
/// answered with a descriptive error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meanings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_meaning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_meaning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Message {
    /// An empty request for `operation`.
    pub fn request(operation: Operation) -> Self {
        Self {
            operation: Some(operation.as_str().to_string()),
            ..Self::default()
        }
    }

    /// A response to `operation` with the given status.
    pub fn response(operation: Operation, status: Status) -> Self {
        Self {
            operation: Some(operation.as_str().to_string()),
            status: Some(status),
            ..Self::default()
        }
    }

    /// An `ERROR` response. Carries no operation.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(Status::Error),
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_word(mut self, word: impl Into<String>) -> Self {
        self.word = Some(word.into());
        self
    }

    pub fn with_meanings(mut self, meanings: Vec<String>) -> Self {
        self.meanings = Some(meanings);
        self
    }

    pub fn with_old_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.old_meaning = Some(meaning.into());
        self
    }

    pub fn with_new_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.new_meaning = Some(meaning.into());
        self
    }

    /// Parse the `operation` field.
    pub fn operation_kind(&self) -> Result<Operation, ProtocolError> {
        self.operation
            .as_deref()
            .ok_or(ProtocolError::MissingOperation)?
            .parse()
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(Status::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert_eq!(Operation::AddMeaning.to_string(), "ADD_MEANING");
    }

    #[test]
    fn operation_parse_is_case_sensitive() {
        let err = "search".parse::<Operation>().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOperation(ref op) if op == "search"));
    }

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&Status::MeaningNotFound).unwrap();
        assert_eq!(json, "\"MEANING_NOT_FOUND\"");
        let status: Status = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert_eq!(status, Status::NotFound);
        assert_eq!(Status::Duplicate.to_string(), "DUPLICATE");
    }

    #[test]
    fn unset_fields_are_omitted() {
        let msg = Message::response(Operation::Search, Status::Success)
            .with_word("hello")
            .with_meanings(vec!["a greeting".into()]);
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"operation":"SEARCH","status":"SUCCESS","word":"hello","meanings":["a greeting"]}"#
        );
    }

    #[test]
    fn camel_case_field_names() {
        let msg = Message::request(Operation::UpdateMeaning)
            .with_word("w")
            .with_old_meaning("a")
            .with_new_meaning("b");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""oldMeaning":"a""#));
        assert!(json.contains(r#""newMeaning":"b""#));

        let err = serde_json::to_string(&Message::error("boom")).unwrap();
        assert_eq!(err, r#"{"status":"ERROR","errorMessage":"boom"}"#);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let msg: Message =
            serde_json::from_str(r#"{"operation":"SEARCH","word":"x","priority":3}"#).unwrap();
        assert_eq!(msg.operation_kind().unwrap(), Operation::Search);
    }

    #[test]
    fn missing_operation() {
        let msg = Message::default().with_word("x");
        assert!(matches!(msg.operation_kind(), Err(ProtocolError::MissingOperation)));
    }
}
