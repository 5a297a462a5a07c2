use rangeslice::Dialect;
use rangeslice::pk::{PrimaryKeyResolver, single_column_keys};
use rangeslice::source::{Column, ColumnType, SourceErrorKind};
use rangeslice::testing::FakeSource;
use rangeslice::{QueryResult, Value};

fn catalog(rows: &[(&str, &str, &str, &str)]) -> QueryResult {
    QueryResult::new(
        ["constraint_name", "constraint_type", "column_name", "data_type"]
            .into_iter()
            .map(|n| Column::new(n, ColumnType::Varchar))
            .collect(),
        rows.iter()
            .map(|(a, b, c, d)| vec![Value::text(*a), Value::text(*b), Value::text(*c), Value::text(*d)])
            .collect(),
    )
}

#[test]
fn composite_keys_are_skipped() {
    let result = catalog(&[
        ("PRIMARY", "PRIMARY KEY", "tenant_id", "int"),
        ("PRIMARY", "PRIMARY KEY", "order_no", "int"),
        ("uk_code", "UNIQUE", "code", "varchar"),
        ("uk_seq", "UNIQUE", "seq", "bigint"),
    ]);
    let keys = single_column_keys(&result);
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|k| !k.primary));

    let source = FakeSource::new().on("information_schema.statistics", result);
    let resolved = PrimaryKeyResolver::new(&source, Dialect::MySql).resolve("shop.orders");
    assert_eq!(resolved.as_deref(), Some("seq"));
    assert!(source.queries()[0].contains("s.table_schema = 'shop'"));
}

#[test]
fn primary_key_wins() {
    let source = FakeSource::new().on(
        "pg_index",
        catalog(&[
            ("orders_code_key", "UNIQUE", "code", "integer"),
            ("orders_pkey", "PRIMARY KEY", "uuid", "uuid"),
        ]),
    );
    let resolved = PrimaryKeyResolver::new(&source, Dialect::PostgreSql).resolve("public.orders");
    assert_eq!(resolved.as_deref(), Some("uuid"));
}

#[test]
fn dialect_without_catalog_resolves_nothing() {
    let source = FakeSource::new();
    assert_eq!(PrimaryKeyResolver::new(&source, Dialect::Sqlite).resolve("t"), None);
    assert!(source.queries().is_empty());
}

#[test]
fn catalog_failure_resolves_nothing() {
    let source = FakeSource::new().fail_on("all_constraints", SourceErrorKind::Permission, "ORA-00942");
    assert_eq!(PrimaryKeyResolver::new(&source, Dialect::Oracle).resolve("HR.EMP"), None);
}
