//! Statement keys
//!
//! A statement key is the canonical string form of an operation descriptor:
//! `com.example.ITrain/findComponentsBy?properties=code&orderBy=code;Asc`.
//! Callers build keys with [`StatementKey`] and never assemble strings by hand.

pub mod codec;
pub mod error;
pub mod grammar;
pub mod kind;

pub use codec::{decode, matches, Direction, JoinSpec, KeyParams, OrderSpec, StatementKey};
pub use error::DecodeError;
pub use kind::StatementKind;
