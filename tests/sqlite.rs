//! Runs compiled statements against an in-memory SQLite database

mod common;

use common::configuration;
use compsql::keygen::KeyValue;
use compsql::{default_registry, ComponentConfiguration, StatementDefinition, StatementRegistry};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashMap;

struct Harness {
    connection: Connection,
    configuration: ComponentConfiguration,
    registry: StatementRegistry,
}

impl Harness {
    fn new() -> Self {
        let connection = Connection::open_in_memory().unwrap();
        connection.execute_batch(common::DDL).unwrap();
        Self { connection, configuration: configuration(), registry: default_registry() }
    }

    fn compile(&self, key: &str) -> StatementDefinition {
        self.registry.resolve(&self.configuration, key).unwrap()
    }

    /// Values in placeholder order, looked up by bound property
    fn bind(statement: &StatementDefinition, values: &HashMap<&str, Value>) -> Vec<Value> {
        statement
            .parameters
            .iter()
            .map(|p| values.get(p.property.as_str()).cloned().unwrap_or(Value::Null))
            .collect()
    }

    fn execute(&self, key: &str, values: &HashMap<&str, Value>) -> usize {
        let statement = self.compile(key);
        assert!(statement.is_write());
        self.connection
            .execute(&statement.sql, params_from_iter(Self::bind(&statement, values)))
            .unwrap()
    }

    fn query_ids(&self, key: &str, values: &HashMap<&str, Value>) -> Vec<i64> {
        let statement = self.compile(key);
        let mut stmt = self.connection.prepare(&statement.sql).unwrap();
        let rows = stmt
            .query_map(params_from_iter(Self::bind(&statement, values)), |row| row.get::<_, i64>(0))
            .unwrap();
        rows.collect::<Result<Vec<_>, _>>().unwrap()
    }
}

fn values<const N: usize>(pairs: [(&'static str, Value); N]) -> HashMap<&'static str, Value> {
    pairs.into_iter().collect()
}

#[test]
fn test_train_lifecycle() {
    let harness = Harness::new();

    let insert = harness.compile("rail.ITrain/insert");
    let KeyValue::Int(id) = insert.key_generator.as_ref().unwrap().generator.next_key() else {
        panic!("counter produces integers");
    };
    let inserted = harness.execute(
        "rail.ITrain/insert",
        &values([("id", Value::Integer(id)), ("code", Value::Text("IC 1".into())), ("version", Value::Integer(0))]),
    );
    assert_eq!(inserted, 1);

    let update = values([("id", Value::Integer(id)), ("code", Value::Text("IC 2".into())), ("version", Value::Integer(0))]);
    assert_eq!(harness.execute("rail.ITrain/update", &update), 1);
    // stale version no longer matches
    assert_eq!(harness.execute("rail.ITrain/update", &update), 0);

    let found = harness.query_ids("rail.ITrain/findComponentsBy?properties=code", &values([("code", Value::Text("IC 2".into()))]));
    assert_eq!(found, vec![id]);

    assert_eq!(
        harness.execute("rail.ITrain/delete", &values([("id", Value::Integer(id)), ("version", Value::Integer(0))])),
        0
    );
    assert_eq!(
        harness.execute("rail.ITrain/delete", &values([("id", Value::Integer(id)), ("version", Value::Integer(1))])),
        1
    );
    assert!(harness.query_ids("rail.ITrain/findEntityById", &values([("id", Value::Integer(id))])).is_empty());
}

#[test]
fn test_wagons_through_join_table() {
    let harness = Harness::new();
    harness
        .connection
        .execute_batch(
            "INSERT INTO T_TRAIN (ID, CODE, VERSION) VALUES (1, 'IC 1', 0);
             INSERT INTO T_TRAIN_WAGON (TRAIN_ID, WAGON_ID) VALUES (1, 10), (1, 11), (1, 12);",
        )
        .unwrap();
    for (id, position, canceled) in [(10, 3, Value::Integer(0)), (11, 1, Value::Integer(1)), (12, 2, Value::Null)] {
        harness.execute(
            "rail.IWagon/insert",
            &values([
                ("id", Value::Integer(id)),
                ("position", Value::Integer(position)),
                ("label", Value::Text(format!("wagon {}", id))),
                ("canceled", canceled),
            ]),
        );
    }

    let key = "rail.IWagon/findComponentsByJoinTable?sourceComponent=rail.ITrain&sourceProperties=id\
               &targetProperties=id&join=T_TRAIN_WAGON;TRAIN_ID;WAGON_ID&orderBy=position;Asc";
    assert_eq!(harness.query_ids(key, &values([("id", Value::Integer(1))])), vec![11, 12, 10]);

    let key = format!("{}&ignoreCancel", key);
    assert_eq!(harness.query_ids(&key, &values([("id", Value::Integer(1))])), vec![12, 10]);

    assert_eq!(
        harness.execute("rail.IWagon/deleteComponentsBy?properties=canceled", &values([("canceled", Value::Integer(1))])),
        1
    );
}

#[test]
fn test_localized_lookup() {
    let harness = Harness::new();
    harness
        .connection
        .execute("INSERT INTO T_COUNTRY (CODE, NAME) VALUES ('CH', 'Suisse')", [])
        .unwrap();

    let statement = harness.compile("rail.ICountry/findNlsColumn?property=name");
    let name: String = harness
        .connection
        .query_row(&statement.sql, params_from_iter(["CH"]), |row| row.get(0))
        .unwrap();
    assert_eq!(name, "Suisse");

    let updated = harness.execute(
        "rail.ICountry/update?nlsProperties=name",
        &values([("code", Value::Text("CH".into())), ("name", Value::Text("Schweiz".into()))]),
    );
    assert_eq!(updated, 1);
}
