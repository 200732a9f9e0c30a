//! Statement key codec
//!
//! Per-kind parameters, in canonical order:
//!
//! | Kind | Parameters |
//! |------|------------|
//! | `findComponentsBy` | `properties`, `orderBy`?, `ignoreCancel`? |
//! | `findComponentsByJoinTable` | `sourceComponent`, `sourceProperties`, `targetProperties`, `join`, `orderBy`?, `ignoreCancel`? |
//! | `update` | `nlsProperties`? (may be empty) |
//! | `deleteComponentsBy` | `properties` |
//! | `findNlsColumn` | `property` |
//! | others | none |
//!
//! Value lists:
//!
//! ```text
//! propsList  := prop ("," prop)*
//! orderList  := (prop ";" dir) ("#" prop ";" dir)*
//! joinList   := (alias ";" cols ";" cols) ("#" alias ";" cols ";" cols)*
//! ```

use super::grammar::{
    split_head, split_list, split_query, RawParam, ENTRY_SEPARATOR, FIELD_SEPARATOR,
    LIST_SEPARATOR, PARAM_SEPARATOR, QUERY_SEPARATOR, TYPE_SEPARATOR, VALUE_SEPARATOR,
};
use super::{DecodeError, StatementKind};
use crate::component::{ComponentType, Identifier, PropertyPath};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const PROPERTY: &str = "property";
pub const PROPERTIES: &str = "properties";
pub const SOURCE_COMPONENT: &str = "sourceComponent";
pub const SOURCE_PROPERTIES: &str = "sourceProperties";
pub const TARGET_PROPERTIES: &str = "targetProperties";
pub const NLS_PROPERTIES: &str = "nlsProperties";
pub const JOIN: &str = "join";
pub const ORDER_BY: &str = "orderBy";
pub const IGNORE_CANCEL: &str = "ignoreCancel";

/// Sort direction of an order-by entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Token used in keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "Asc",
            Direction::Descending => "Desc",
        }
    }

    /// SQL keyword
    pub fn sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = DecodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Asc" => Ok(Direction::Ascending),
            "Desc" => Ok(Direction::Descending),
            _ => Err(DecodeError::InvalidDirection(s.to_string())),
        }
    }
}

/// One `property;direction` order-by entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderSpec {
    pub property: PropertyPath,
    pub direction: Direction,
}

impl OrderSpec {
    pub fn new(property: PropertyPath, direction: Direction) -> Self {
        Self { property, direction }
    }

    pub fn asc(property: PropertyPath) -> Self {
        Self::new(property, Direction::Ascending)
    }

    pub fn desc(property: PropertyPath) -> Self {
        Self::new(property, Direction::Descending)
    }
}

/// One join step: a join table, the columns matched against the previous
/// shape and the columns carried to the next one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinSpec {
    table: Identifier,
    source_columns: Vec<Identifier>,
    target_columns: Vec<Identifier>,
}

impl JoinSpec {
    pub fn new(table: Identifier, source_columns: Vec<Identifier>, target_columns: Vec<Identifier>) -> Result<Self> {
        if source_columns.is_empty() || target_columns.is_empty() {
            return Err(DecodeError::EmptyValue(JOIN.to_string()).into());
        }
        Ok(Self { table, source_columns, target_columns })
    }

    pub fn table(&self) -> &Identifier {
        &self.table
    }

    pub fn source_columns(&self) -> &[Identifier] {
        &self.source_columns
    }

    pub fn target_columns(&self) -> &[Identifier] {
        &self.target_columns
    }
}

/// Kind-specific parameters of a statement key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParams {
    FindEntityById,
    FindComponentsBy {
        properties: Vec<PropertyPath>,
        order_by: Vec<OrderSpec>,
        ignore_cancel: bool,
    },
    FindComponentsByJoinTable {
        source: ComponentType,
        source_properties: Vec<PropertyPath>,
        target_properties: Vec<PropertyPath>,
        joins: Vec<JoinSpec>,
        order_by: Vec<OrderSpec>,
        ignore_cancel: bool,
    },
    Insert,
    Update {
        nls_properties: Option<Vec<Identifier>>,
    },
    Delete,
    DeleteEntityById,
    DeleteComponentsBy {
        properties: Vec<PropertyPath>,
    },
    FindNlsColumn {
        property: Identifier,
    },
}

impl KeyParams {
    pub fn kind(&self) -> StatementKind {
        match self {
            KeyParams::FindEntityById => StatementKind::FindEntityById,
            KeyParams::FindComponentsBy { .. } => StatementKind::FindComponentsBy,
            KeyParams::FindComponentsByJoinTable { .. } => StatementKind::FindComponentsByJoinTable,
            KeyParams::Insert => StatementKind::Insert,
            KeyParams::Update { .. } => StatementKind::Update,
            KeyParams::Delete => StatementKind::Delete,
            KeyParams::DeleteEntityById => StatementKind::DeleteEntityById,
            KeyParams::DeleteComponentsBy { .. } => StatementKind::DeleteComponentsBy,
            KeyParams::FindNlsColumn { .. } => StatementKind::FindNlsColumn,
        }
    }
}

/// Structured operation descriptor: target component plus kind parameters.
///
/// Two equal descriptors always encode to the same string, and decoding the
/// encoded string gives back an equal descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementKey {
    component: ComponentType,
    params: KeyParams,
}

fn require_non_empty<T>(items: &[T], param: &str) -> Result<()> {
    if items.is_empty() {
        return Err(DecodeError::EmptyValue(param.to_string()).into());
    }
    Ok(())
}

/// Each entry of a list parameter names a distinct property
fn reject_repeats<'a, T>(param: &str, items: impl IntoIterator<Item = &'a T>) -> std::result::Result<(), DecodeError>
where
    T: fmt::Display + Eq + std::hash::Hash + 'a,
{
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return Err(DecodeError::DuplicateEntry { param: param.to_string(), entry: item.to_string() });
        }
    }
    Ok(())
}

impl StatementKey {
    pub fn find_entity_by_id(component: ComponentType) -> Self {
        Self { component, params: KeyParams::FindEntityById }
    }

    pub fn find_components_by(
        component: ComponentType,
        properties: Vec<PropertyPath>,
        order_by: Vec<OrderSpec>,
        ignore_cancel: bool,
    ) -> Result<Self> {
        require_non_empty(&properties, PROPERTIES)?;
        reject_repeats(PROPERTIES, &properties)?;
        reject_repeats(ORDER_BY, order_by.iter().map(|order| &order.property))?;
        Ok(Self {
            component,
            params: KeyParams::FindComponentsBy { properties, order_by, ignore_cancel },
        })
    }

    pub fn find_components_by_join_table(
        target: ComponentType,
        source: ComponentType,
        source_properties: Vec<PropertyPath>,
        target_properties: Vec<PropertyPath>,
        joins: Vec<JoinSpec>,
        order_by: Vec<OrderSpec>,
        ignore_cancel: bool,
    ) -> Result<Self> {
        require_non_empty(&source_properties, SOURCE_PROPERTIES)?;
        require_non_empty(&target_properties, TARGET_PROPERTIES)?;
        require_non_empty(&joins, JOIN)?;
        reject_repeats(SOURCE_PROPERTIES, &source_properties)?;
        reject_repeats(TARGET_PROPERTIES, &target_properties)?;
        reject_repeats(ORDER_BY, order_by.iter().map(|order| &order.property))?;
        Ok(Self {
            component: target,
            params: KeyParams::FindComponentsByJoinTable {
                source,
                source_properties,
                target_properties,
                joins,
                order_by,
                ignore_cancel,
            },
        })
    }

    pub fn insert(component: ComponentType) -> Self {
        Self { component, params: KeyParams::Insert }
    }

    pub fn update(component: ComponentType, nls_properties: Option<Vec<Identifier>>) -> Result<Self> {
        if let Some(properties) = &nls_properties {
            reject_repeats(NLS_PROPERTIES, properties)?;
        }
        Ok(Self { component, params: KeyParams::Update { nls_properties } })
    }

    pub fn delete(component: ComponentType) -> Self {
        Self { component, params: KeyParams::Delete }
    }

    pub fn delete_entity_by_id(component: ComponentType) -> Self {
        Self { component, params: KeyParams::DeleteEntityById }
    }

    pub fn delete_components_by(component: ComponentType, properties: Vec<PropertyPath>) -> Result<Self> {
        require_non_empty(&properties, PROPERTIES)?;
        reject_repeats(PROPERTIES, &properties)?;
        Ok(Self { component, params: KeyParams::DeleteComponentsBy { properties } })
    }

    pub fn find_nls_column(component: ComponentType, property: Identifier) -> Self {
        Self { component, params: KeyParams::FindNlsColumn { property } }
    }

    pub fn component(&self) -> &ComponentType {
        &self.component
    }

    pub fn params(&self) -> &KeyParams {
        &self.params
    }

    pub fn kind(&self) -> StatementKind {
        self.params.kind()
    }

    pub fn into_parts(self) -> (ComponentType, KeyParams) {
        (self.component, self.params)
    }

    /// Canonical string form
    pub fn encode(&self) -> String {
        let mut query = QueryWriter::default();

        match &self.params {
            KeyParams::FindEntityById
            | KeyParams::Insert
            | KeyParams::Delete
            | KeyParams::DeleteEntityById => {}
            KeyParams::FindComponentsBy { properties, order_by, ignore_cancel } => {
                query.param(PROPERTIES, join_paths(properties));
                query.orders(order_by);
                query.flag(IGNORE_CANCEL, *ignore_cancel);
            }
            KeyParams::FindComponentsByJoinTable {
                source,
                source_properties,
                target_properties,
                joins,
                order_by,
                ignore_cancel,
            } => {
                query.param(SOURCE_COMPONENT, source.to_string());
                query.param(SOURCE_PROPERTIES, join_paths(source_properties));
                query.param(TARGET_PROPERTIES, join_paths(target_properties));
                query.param(JOIN, join_joins(joins));
                query.orders(order_by);
                query.flag(IGNORE_CANCEL, *ignore_cancel);
            }
            KeyParams::Update { nls_properties } => {
                if let Some(properties) = nls_properties {
                    query.param(NLS_PROPERTIES, join_identifiers(properties));
                }
            }
            KeyParams::DeleteComponentsBy { properties } => {
                query.param(PROPERTIES, join_paths(properties));
            }
            KeyParams::FindNlsColumn { property } => {
                query.param(PROPERTY, property.to_string());
            }
        }

        let mut key = format!("{}{}{}", self.component, TYPE_SEPARATOR, self.kind().as_str());
        if !query.is_empty() {
            key.push(QUERY_SEPARATOR);
            key.push_str(&query.finish());
        }
        key
    }

    /// Decode a key of any known kind
    pub fn parse(key: &str) -> Result<Self> {
        let head = split_head(key)?;
        let kind: StatementKind = head.operation.parse()?;
        Ok(decode(key, kind)?)
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for StatementKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Default)]
struct QueryWriter {
    params: Vec<String>,
}

impl QueryWriter {
    fn param(&mut self, name: &str, value: String) {
        self.params.push(format!("{}{}{}", name, VALUE_SEPARATOR, value));
    }

    fn orders(&mut self, order_by: &[OrderSpec]) {
        if !order_by.is_empty() {
            self.param(ORDER_BY, join_orders(order_by));
        }
    }

    fn flag(&mut self, name: &str, set: bool) {
        if set {
            self.params.push(name.to_string());
        }
    }

    fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn finish(self) -> String {
        join_with(self.params, PARAM_SEPARATOR)
    }
}

fn join_with<I, S>(items: I, separator: char) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(item.as_ref());
    }
    out
}

fn join_paths(paths: &[PropertyPath]) -> String {
    join_with(paths.iter().map(ToString::to_string), LIST_SEPARATOR)
}

fn join_identifiers(identifiers: &[Identifier]) -> String {
    join_with(identifiers.iter().map(Identifier::as_str), LIST_SEPARATOR)
}

fn join_orders(order_by: &[OrderSpec]) -> String {
    join_with(
        order_by
            .iter()
            .map(|o| format!("{}{}{}", o.property, FIELD_SEPARATOR, o.direction.as_str())),
        ENTRY_SEPARATOR,
    )
}

fn join_joins(joins: &[JoinSpec]) -> String {
    join_with(
        joins.iter().map(|j| {
            format!(
                "{}{}{}{}{}",
                j.table,
                FIELD_SEPARATOR,
                join_identifiers(&j.source_columns),
                FIELD_SEPARATOR,
                join_identifiers(&j.target_columns)
            )
        }),
        ENTRY_SEPARATOR,
    )
}

/// Parameter names of a kind, in canonical order
pub fn parameter_names(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::FindComponentsBy => &[PROPERTIES, ORDER_BY, IGNORE_CANCEL],
        StatementKind::FindComponentsByJoinTable => &[
            SOURCE_COMPONENT,
            SOURCE_PROPERTIES,
            TARGET_PROPERTIES,
            JOIN,
            ORDER_BY,
            IGNORE_CANCEL,
        ],
        StatementKind::Update => &[NLS_PROPERTIES],
        StatementKind::DeleteComponentsBy => &[PROPERTIES],
        StatementKind::FindNlsColumn => &[PROPERTY],
        StatementKind::FindEntityById
        | StatementKind::Insert
        | StatementKind::Delete
        | StatementKind::DeleteEntityById => &[],
    }
}

/// Consumes query parameters strictly in canonical order
struct ParamReader<'a> {
    kind: StatementKind,
    params: Vec<RawParam<'a>>,
    next: usize,
    seen: Vec<&'static str>,
}

impl<'a> ParamReader<'a> {
    fn new(kind: StatementKind, params: Vec<RawParam<'a>>) -> Self {
        Self { kind, params, next: 0, seen: Vec::new() }
    }

    fn take(&mut self, name: &'static str) -> Option<RawParam<'a>> {
        let param = *self.params.get(self.next)?;
        if param.name != name {
            return None;
        }
        self.next += 1;
        self.seen.push(name);
        Some(param)
    }

    fn required(&mut self, name: &'static str) -> std::result::Result<&'a str, DecodeError> {
        match self.take(name) {
            Some(param) => param.value.ok_or_else(|| DecodeError::MissingValue(name.to_string())),
            None if self.params[self.next..].iter().any(|p| p.name == name) => {
                Err(DecodeError::ParameterOutOfOrder(name.to_string()))
            }
            None => Err(DecodeError::MissingParameter(name)),
        }
    }

    fn optional(&mut self, name: &'static str) -> std::result::Result<Option<&'a str>, DecodeError> {
        match self.take(name) {
            Some(param) => param
                .value
                .map(Some)
                .ok_or_else(|| DecodeError::MissingValue(name.to_string())),
            None => Ok(None),
        }
    }

    fn flag(&mut self, name: &'static str) -> std::result::Result<bool, DecodeError> {
        match self.take(name) {
            Some(param) if param.value.is_some() => Err(DecodeError::UnexpectedValue(name.to_string())),
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    fn finish(self) -> std::result::Result<(), DecodeError> {
        let Some(param) = self.params.get(self.next) else {
            return Ok(());
        };
        let name = param.name.to_string();
        if self.seen.contains(&param.name) {
            Err(DecodeError::DuplicateParameter(name))
        } else if parameter_names(self.kind).contains(&param.name) {
            Err(DecodeError::ParameterOutOfOrder(name))
        } else {
            Err(DecodeError::UnexpectedParameter(name))
        }
    }
}

fn decode_paths(param: &str, value: &str) -> std::result::Result<Vec<PropertyPath>, DecodeError> {
    if value.is_empty() {
        return Err(DecodeError::EmptyValue(param.to_string()));
    }
    let paths = split_list(value, LIST_SEPARATOR)?
        .into_iter()
        .map(PropertyPath::decode)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    reject_repeats(param, &paths)?;
    Ok(paths)
}

fn decode_identifiers(value: &str) -> std::result::Result<Vec<Identifier>, DecodeError> {
    split_list(value, LIST_SEPARATOR)?
        .into_iter()
        .map(Identifier::parse)
        .collect()
}

fn decode_orders(value: &str) -> std::result::Result<Vec<OrderSpec>, DecodeError> {
    if value.is_empty() {
        return Err(DecodeError::EmptyValue(ORDER_BY.to_string()));
    }
    let orders = split_list(value, ENTRY_SEPARATOR)?
        .into_iter()
        .map(|entry| {
            let fields: Vec<&str> = entry.split(FIELD_SEPARATOR).collect();
            let [property, direction] = fields.as_slice() else {
                return Err(DecodeError::MalformedOrder(entry.to_string()));
            };
            Ok(OrderSpec::new(PropertyPath::decode(property)?, direction.parse()?))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    reject_repeats(ORDER_BY, orders.iter().map(|order| &order.property))?;
    Ok(orders)
}

fn decode_joins(value: &str) -> std::result::Result<Vec<JoinSpec>, DecodeError> {
    if value.is_empty() {
        return Err(DecodeError::EmptyValue(JOIN.to_string()));
    }
    split_list(value, ENTRY_SEPARATOR)?
        .into_iter()
        .map(|entry| {
            let fields: Vec<&str> = entry.split(FIELD_SEPARATOR).collect();
            let [table, source, target] = fields.as_slice() else {
                return Err(DecodeError::MalformedJoin(entry.to_string()));
            };
            if source.is_empty() || target.is_empty() {
                return Err(DecodeError::MalformedJoin(entry.to_string()));
            }
            Ok(JoinSpec {
                table: Identifier::parse(table)?,
                source_columns: decode_identifiers(source)?,
                target_columns: decode_identifiers(target)?,
            })
        })
        .collect()
}

/// Decode a key that must be of the given kind
pub fn decode(key: &str, kind: StatementKind) -> std::result::Result<StatementKey, DecodeError> {
    let head = split_head(key)?;
    if head.operation != kind.as_str() {
        return Err(DecodeError::WrongOperation { expected: kind, found: head.operation.to_string() });
    }

    let component = ComponentType::decode(head.type_name)?;
    let raw = match head.query {
        Some(query) => split_query(query)?,
        None => Vec::new(),
    };
    let mut reader = ParamReader::new(kind, raw);

    let params = match kind {
        StatementKind::FindEntityById => KeyParams::FindEntityById,
        StatementKind::Insert => KeyParams::Insert,
        StatementKind::Delete => KeyParams::Delete,
        StatementKind::DeleteEntityById => KeyParams::DeleteEntityById,
        StatementKind::FindComponentsBy => {
            let properties = decode_paths(PROPERTIES, reader.required(PROPERTIES)?)?;
            let order_by = match reader.optional(ORDER_BY)? {
                Some(value) => decode_orders(value)?,
                None => Vec::new(),
            };
            let ignore_cancel = reader.flag(IGNORE_CANCEL)?;
            KeyParams::FindComponentsBy { properties, order_by, ignore_cancel }
        }
        StatementKind::FindComponentsByJoinTable => {
            let source = ComponentType::decode(reader.required(SOURCE_COMPONENT)?)?;
            let source_properties = decode_paths(SOURCE_PROPERTIES, reader.required(SOURCE_PROPERTIES)?)?;
            let target_properties = decode_paths(TARGET_PROPERTIES, reader.required(TARGET_PROPERTIES)?)?;
            let joins = decode_joins(reader.required(JOIN)?)?;
            let order_by = match reader.optional(ORDER_BY)? {
                Some(value) => decode_orders(value)?,
                None => Vec::new(),
            };
            let ignore_cancel = reader.flag(IGNORE_CANCEL)?;
            KeyParams::FindComponentsByJoinTable {
                source,
                source_properties,
                target_properties,
                joins,
                order_by,
                ignore_cancel,
            }
        }
        StatementKind::Update => {
            let nls_properties = match reader.optional(NLS_PROPERTIES)? {
                Some("") => Some(Vec::new()),
                Some(value) => {
                    let properties = decode_identifiers(value)?;
                    reject_repeats(NLS_PROPERTIES, &properties)?;
                    Some(properties)
                }
                None => None,
            };
            KeyParams::Update { nls_properties }
        }
        StatementKind::DeleteComponentsBy => {
            let properties = decode_paths(PROPERTIES, reader.required(PROPERTIES)?)?;
            KeyParams::DeleteComponentsBy { properties }
        }
        StatementKind::FindNlsColumn => {
            let value = reader.required(PROPERTY)?;
            if value.is_empty() {
                return Err(DecodeError::EmptyValue(PROPERTY.to_string()));
            }
            KeyParams::FindNlsColumn { property: Identifier::parse(value)? }
        }
    };

    reader.finish()?;
    Ok(StatementKey { component, params })
}

/// Check whether a key is a well-formed key of the given kind
pub fn matches(key: &str, kind: StatementKind) -> bool {
    decode(key, kind).is_ok()
}
