//! Lexical layer of the statement key grammar
//!
//! ```text
//! key        := typeName "/" opName ("?" queryString)?
//! queryString:= param ("&" param)*
//! param      := name "=" value | name
//! ```
//!
//! The grammar has no escaping. The delimiters below are reserved and may
//! never appear inside a type name, property name or join token.

use regex::Regex;
use std::sync::LazyLock;
use super::DecodeError;

pub const TYPE_SEPARATOR: char = '/';
pub const QUERY_SEPARATOR: char = '?';
pub const PARAM_SEPARATOR: char = '&';
pub const VALUE_SEPARATOR: char = '=';
pub const LIST_SEPARATOR: char = ',';
pub const FIELD_SEPARATOR: char = ';';
pub const ENTRY_SEPARATOR: char = '#';

/// Every delimiter of the grammar
pub const RESERVED: [char; 7] = [
    TYPE_SEPARATOR,
    QUERY_SEPARATOR,
    PARAM_SEPARATOR,
    VALUE_SEPARATOR,
    LIST_SEPARATOR,
    FIELD_SEPARATOR,
    ENTRY_SEPARATOR,
];

// Constant patterns, checked by the tests below
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid"));
static TYPE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_$][A-Za-z0-9_$]*\.)*[A-Za-z_$][A-Za-z0-9_$]*$").expect("type name pattern is valid")
});

/// First reserved delimiter found in a token, if any
pub fn reserved_in(token: &str) -> Option<char> {
    token.chars().find(|c| RESERVED.contains(c))
}

/// Validate an atomic identifier token (property segment, join table, column)
pub fn check_identifier(token: &str) -> Result<(), DecodeError> {
    if let Some(ch) = reserved_in(token) {
        return Err(DecodeError::ReservedCharacter { token: token.to_string(), ch });
    }
    if !IDENTIFIER.is_match(token) {
        return Err(DecodeError::InvalidToken(token.to_string()));
    }
    Ok(())
}

/// Validate a dotted component type name
pub fn check_type_name(token: &str) -> Result<(), DecodeError> {
    if let Some(ch) = reserved_in(token) {
        return Err(DecodeError::ReservedCharacter { token: token.to_string(), ch });
    }
    if !TYPE_NAME.is_match(token) {
        return Err(DecodeError::InvalidTypeName(token.to_string()));
    }
    Ok(())
}

/// The `Type/operation` head of a key plus its raw query string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHead<'a> {
    pub type_name: &'a str,
    pub operation: &'a str,
    pub query: Option<&'a str>,
}

/// Split a key into head and query without interpreting the parameters.
///
/// Succeeds for any key whose type name and operation name are well formed,
/// whether or not the operation is known.
pub fn split_head(key: &str) -> Result<KeyHead<'_>, DecodeError> {
    let (path, query) = match key.split_once(QUERY_SEPARATOR) {
        Some((path, query)) => (path, Some(query)),
        None => (key, None),
    };

    let (type_name, operation) = path
        .split_once(TYPE_SEPARATOR)
        .ok_or_else(|| DecodeError::MissingHead(key.to_string()))?;

    if type_name.is_empty() || operation.is_empty() {
        return Err(DecodeError::MissingHead(key.to_string()));
    }

    check_type_name(type_name)?;
    check_identifier(operation)?;

    Ok(KeyHead { type_name, operation, query })
}

/// One `name=value` or bare `name` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawParam<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

/// Split a query string into parameters, validating parameter names
pub fn split_query(query: &str) -> Result<Vec<RawParam<'_>>, DecodeError> {
    if query.is_empty() {
        return Err(DecodeError::InvalidToken(String::new()));
    }

    query
        .split(PARAM_SEPARATOR)
        .map(|param| {
            let (name, value) = match param.split_once(VALUE_SEPARATOR) {
                Some((name, value)) => (name, Some(value)),
                None => (param, None),
            };
            check_identifier(name)?;
            Ok(RawParam { name, value })
        })
        .collect()
}

/// Split a non-empty list on `separator`, rejecting empty entries
pub fn split_list(value: &str, separator: char) -> Result<Vec<&str>, DecodeError> {
    let items: Vec<&str> = value.split(separator).collect();
    if items.iter().any(|item| item.is_empty()) {
        return Err(DecodeError::InvalidToken(value.to_string()));
    }
    Ok(items)
}
