use anyhow::Result;
use rangeslice::{Dialect, JobConfig, StringSplit};
use std::fs;

#[test]
fn parses_camel_case_json_with_defaults() -> Result<()> {
    let cfg = JobConfig::from_json_str(
        r#"{
            "dialect": "postgres",
            "connections": [
                { "jdbcUrl": "jdbc:postgresql://pg1:5432/shop", "tables": ["public.orders", "public.items"] }
            ],
            "splitPk": " id ",
            "where": "  ",
            "adviceNumber": 6,
            "stringSplit": "sample"
        }"#,
    )?;
    assert_eq!(cfg.dialect, Dialect::PostgreSql);
    assert_eq!(cfg.columns, vec!["*".to_string()]);
    assert_eq!(cfg.split_pk(), Some("id"));
    assert_eq!(cfg.filter(), None);
    assert_eq!(cfg.string_split, StringSplit::Sample);
    assert_eq!(cfg.split_factor, 5);
    assert!(!cfg.auto_split_pk);
    assert_eq!(cfg.desired_split_count(), 3);
    Ok(())
}

#[test]
fn loads_from_file() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("job.json");
    fs::write(
        &path,
        r#"{ "connections": [ { "jdbcUrl": "jdbc:sqlite:/tmp/app.db", "querySql": ["SELECT 1"] } ] }"#,
    )?;
    let cfg = JobConfig::from_json_file(&path)?;
    assert!(!cfg.is_table_mode());
    assert_eq!(cfg.dialect, Dialect::Generic);
    Ok(())
}

#[test]
fn rejects_invalid_jobs() {
    let bad = [
        r#"{ "connections": [] }"#,
        r#"{ "connections": [ { "jdbcUrl": "", "tables": ["t"] } ] }"#,
        r#"{ "connections": [ { "jdbcUrl": "jdbc:x://h/db" } ] }"#,
        r#"{ "connections": [ { "jdbcUrl": "jdbc:x://h/db", "tables": ["t"] } ], "adviceNumber": 0 }"#,
        r#"{ "connections": [ { "jdbcUrl": "jdbc:x://h/db", "tables": ["t"] } ], "splitCount": 0 }"#,
        r#"{ "connections": [ { "jdbcUrl": "jdbc:x://h/db", "tables": ["t"], "querySql": ["SELECT 1"] } ] }"#,
        r#"{ "connections": [ { "jdbcUrl": "jdbc:x://h/db", "tables": ["t"] } ], "dialect": "informix" }"#,
    ];
    for json in bad {
        assert!(JobConfig::from_json_str(json).is_err(), "{json}");
    }
}

#[test]
fn missing_file_names_the_path() {
    let err = JobConfig::from_json_file("/definitely/not/here.json").unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.json"));
}
