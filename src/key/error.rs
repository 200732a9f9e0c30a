//! Decode errors for statement keys

use super::StatementKind;

/// A statement key string that does not follow the key grammar.
///
/// Decoding fails closed: a key is either fully decoded or rejected with one
/// of these variants, never repaired.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Key '{0}' is not of the form Type/operation")]
    MissingHead(String),

    #[error("Invalid component type name '{0}'")]
    InvalidTypeName(String),

    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Expected operation '{expected}', found '{found}'")]
    WrongOperation { expected: StatementKind, found: String },

    #[error("Missing required parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("Unexpected parameter '{0}'")]
    UnexpectedParameter(String),

    #[error("Parameter '{0}' is out of order")]
    ParameterOutOfOrder(String),

    #[error("Parameter '{0}' appears more than once")]
    DuplicateParameter(String),

    #[error("Parameter '{param}' lists '{entry}' more than once")]
    DuplicateEntry { param: String, entry: String },

    #[error("Parameter '{0}' has an empty value")]
    EmptyValue(String),

    #[error("Parameter '{0}' requires a value")]
    MissingValue(String),

    #[error("Flag '{0}' does not take a value")]
    UnexpectedValue(String),

    #[error("Reserved character '{ch}' in token '{token}'")]
    ReservedCharacter { token: String, ch: char },

    #[error("Invalid token '{0}'")]
    InvalidToken(String),

    #[error("Invalid sort direction '{0}' (expected Asc or Desc)")]
    InvalidDirection(String),

    #[error("Malformed order-by entry '{0}'")]
    MalformedOrder(String),

    #[error("Malformed join entry '{0}'")]
    MalformedJoin(String),
}
