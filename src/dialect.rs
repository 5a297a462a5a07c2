//! SQL dialects as data.
//!
//! Each supported database is one row in a static table of [`DialectSpec`]s: how it
//! draws a random sample and how (if at all) its catalog exposes key constraints.
//! Adding a dialect means adding a row, not a branch.

use crate::value::quote_text;
use anyhow::{Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::str::FromStr;
use std::sync::LazyLock;

/// Source database family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "postgres", alias = "pg")]
    PostgreSql,
    Oracle,
    #[serde(alias = "mssql")]
    SqlServer,
    Sybase,
    Sqlite,
    Db2,
    #[default]
    Generic,
}

/// How a dialect orders rows randomly and bounds the sample size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleSyntax {
    /// `SELECT ... ORDER BY <random> LIMIT n`
    Limit { random: &'static str },
    /// `SELECT TOP n ... ORDER BY <random>`
    Top { random: &'static str },
    /// Random-ordered subquery bounded by `ROWNUM <= n`.
    Rownum { random: &'static str },
}

/// Builds the catalog statement listing key constraints of a table. Every row
/// returned must be `(constraint_name, constraint_type, column_name, data_type)`
/// with `constraint_type` either `PRIMARY KEY` or `UNIQUE`, ordered by constraint
/// and then by column position.
pub type CatalogQuery = fn(&TableRef) -> String;

/// One row of the dialect table.
#[derive(Clone, Copy, Debug)]
pub struct DialectSpec {
    pub dialect: Dialect,
    pub name: &'static str,
    pub sample: SampleSyntax,
    pub key_catalog: Option<CatalogQuery>,
}

static GENERIC: DialectSpec = DialectSpec {
    dialect: Dialect::Generic,
    name: "generic",
    sample: SampleSyntax::Limit { random: "rand()" },
    key_catalog: None,
};

static DIALECTS: &[DialectSpec] = &[
    DialectSpec {
        dialect: Dialect::MySql,
        name: "mysql",
        sample: SampleSyntax::Limit { random: "rand()" },
        key_catalog: Some(mysql_key_catalog),
    },
    DialectSpec {
        dialect: Dialect::PostgreSql,
        name: "postgresql",
        sample: SampleSyntax::Limit { random: "random()" },
        key_catalog: Some(postgres_key_catalog),
    },
    DialectSpec {
        dialect: Dialect::Oracle,
        name: "oracle",
        sample: SampleSyntax::Rownum {
            random: "DBMS_RANDOM.VALUE",
        },
        key_catalog: Some(oracle_key_catalog),
    },
    DialectSpec {
        dialect: Dialect::SqlServer,
        name: "sqlserver",
        sample: SampleSyntax::Top { random: "NEWID()" },
        key_catalog: Some(sqlserver_key_catalog),
    },
    DialectSpec {
        dialect: Dialect::Sybase,
        name: "sybase",
        sample: SampleSyntax::Top { random: "NEWID()" },
        key_catalog: None,
    },
    DialectSpec {
        dialect: Dialect::Sqlite,
        name: "sqlite",
        sample: SampleSyntax::Limit { random: "random()" },
        key_catalog: None,
    },
    DialectSpec {
        dialect: Dialect::Db2,
        name: "db2",
        sample: SampleSyntax::Limit { random: "rand()" },
        key_catalog: None,
    },
];

impl Dialect {
    /// Look up this dialect's row; unknown dialects behave as [`Dialect::Generic`].
    #[must_use]
    pub fn spec(self) -> &'static DialectSpec {
        DIALECTS
            .iter()
            .find(|s| s.dialect == self)
            .unwrap_or(&GENERIC)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase();
        let dialect = match tag.as_str() {
            "mysql" | "mariadb" => Self::MySql,
            "postgresql" | "postgres" | "pg" => Self::PostgreSql,
            "oracle" => Self::Oracle,
            "sqlserver" | "mssql" => Self::SqlServer,
            "sybase" => Self::Sybase,
            "sqlite" => Self::Sqlite,
            "db2" => Self::Db2,
            "generic" => Self::Generic,
            _ => bail!("unknown dialect tag {s:?}"),
        };
        Ok(dialect)
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(self.name())
    }
}

impl SampleSyntax {
    /// Render a statement that returns up to `limit` random values of `column`
    /// from `table` restricted by `where_clause`.
    #[must_use]
    pub fn render(self, column: &str, table: &str, where_clause: &str, limit: usize) -> String {
        match self {
            Self::Limit { random } => format!(
                "SELECT {column} FROM {table} WHERE {where_clause} ORDER BY {random} LIMIT {limit}"
            ),
            Self::Top { random } => format!(
                "SELECT TOP {limit} {column} FROM {table} WHERE {where_clause} ORDER BY {random}"
            ),
            Self::Rownum { random } => format!(
                "SELECT {column} FROM (SELECT {column} FROM {table} WHERE {where_clause} \
                 ORDER BY {random}) WHERE ROWNUM <= {limit}"
            ),
        }
    }
}

// ============================================================================
// Table references
// ============================================================================

/// A possibly schema-qualified table name as written in the job configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    /// Split `schema.table` at the last dot. Identifier quoting (`"`, `` ` ``,
    /// `[...]`) is stripped from each part.
    #[must_use]
    pub fn parse(qualified: &str) -> Self {
        let qualified = qualified.trim();
        match qualified.rsplit_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => Self {
                schema: Some(unquote(schema)),
                name: unquote(name),
            },
            _ => Self {
                schema: None,
                name: unquote(qualified),
            },
        }
    }
}

fn unquote(ident: &str) -> String {
    let ident = ident.trim();
    let stripped = ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| ident.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .or_else(|| ident.strip_prefix('[').and_then(|s| s.strip_suffix(']')));
    stripped.unwrap_or(ident).to_string()
}

/* ---------- Key catalog statements ---------- */

fn mysql_key_catalog(table: &TableRef) -> String {
    let schema = table
        .schema
        .as_deref()
        .map_or_else(|| "DATABASE()".to_string(), quote_text);
    format!(
        "SELECT s.index_name, \
         CASE WHEN s.index_name = 'PRIMARY' THEN 'PRIMARY KEY' ELSE 'UNIQUE' END, \
         s.column_name, c.data_type \
         FROM information_schema.statistics s \
         JOIN information_schema.columns c ON c.table_schema = s.table_schema \
         AND c.table_name = s.table_name AND c.column_name = s.column_name \
         WHERE s.non_unique = 0 AND s.table_schema = {schema} AND s.table_name = {} \
         ORDER BY s.index_name, s.seq_in_index",
        quote_text(&table.name)
    )
}

fn postgres_key_catalog(table: &TableRef) -> String {
    let qualified = match &table.schema {
        Some(schema) => format!("\"{schema}\".\"{}\"", table.name),
        None => format!("\"{}\"", table.name),
    };
    format!(
        "SELECT i.indexrelid::regclass::text, \
         CASE WHEN i.indisprimary THEN 'PRIMARY KEY' ELSE 'UNIQUE' END, \
         a.attname, format_type(a.atttypid, a.atttypmod) \
         FROM pg_index i \
         JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
         WHERE i.indrelid = {}::regclass AND i.indisunique \
         ORDER BY i.indexrelid, array_position(i.indkey::int2[], a.attnum)",
        quote_text(&qualified)
    )
}

fn oracle_key_catalog(table: &TableRef) -> String {
    let owner = table
        .schema
        .as_deref()
        .map(|s| format!(" AND c.owner = UPPER({})", quote_text(s)))
        .unwrap_or_default();
    format!(
        "SELECT c.constraint_name, \
         CASE c.constraint_type WHEN 'P' THEN 'PRIMARY KEY' ELSE 'UNIQUE' END, \
         cc.column_name, tc.data_type \
         FROM all_constraints c \
         JOIN all_cons_columns cc ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name \
         JOIN all_tab_columns tc ON tc.owner = cc.owner AND tc.table_name = cc.table_name \
         AND tc.column_name = cc.column_name \
         WHERE c.constraint_type IN ('P', 'U') AND c.table_name = UPPER({}){owner} \
         ORDER BY c.constraint_name, cc.position",
        quote_text(&table.name)
    )
}

fn sqlserver_key_catalog(table: &TableRef) -> String {
    let schema = table
        .schema
        .as_deref()
        .map(|s| format!(" AND tc.TABLE_SCHEMA = {}", quote_text(s)))
        .unwrap_or_default();
    format!(
        "SELECT tc.CONSTRAINT_NAME, tc.CONSTRAINT_TYPE, kcu.COLUMN_NAME, col.DATA_TYPE \
         FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
         JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
         AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA AND kcu.TABLE_NAME = tc.TABLE_NAME \
         JOIN INFORMATION_SCHEMA.COLUMNS col ON col.TABLE_SCHEMA = kcu.TABLE_SCHEMA \
         AND col.TABLE_NAME = kcu.TABLE_NAME AND col.COLUMN_NAME = kcu.COLUMN_NAME \
         WHERE tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE') AND tc.TABLE_NAME = {}{schema} \
         ORDER BY tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION",
        quote_text(&table.name)
    )
}

// ============================================================================
// Resource keys
// ============================================================================

static HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:@|//)(?://)?(?:[^/@\s]+@)?([A-Za-z0-9_.\-]+)").expect("valid host regex")
});

/// Extract the host from a JDBC-style connection URL, for example
/// `jdbc:mysql://10.0.0.5:3306/db` or `jdbc:oracle:thin:@//db1:1521/svc`.
#[must_use]
pub fn host_of(jdbc_url: &str) -> Option<String> {
    HOST_RE
        .captures(jdbc_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resource key used by the execution engine for load balancing: the host when
/// one can be parsed, otherwise the URL itself.
#[must_use]
pub fn resource_key(jdbc_url: &str) -> String {
    host_of(jdbc_url).unwrap_or_else(|| jdbc_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_sql_per_dialect() {
        let w = "name IS NOT NULL";
        assert_eq!(
            Dialect::PostgreSql.spec().sample.render("name", "t", w, 3),
            "SELECT name FROM t WHERE name IS NOT NULL ORDER BY random() LIMIT 3"
        );
        assert_eq!(
            Dialect::MySql.spec().sample.render("name", "t", w, 3),
            "SELECT name FROM t WHERE name IS NOT NULL ORDER BY rand() LIMIT 3"
        );
        assert_eq!(
            Dialect::SqlServer.spec().sample.render("name", "t", w, 3),
            "SELECT TOP 3 name FROM t WHERE name IS NOT NULL ORDER BY NEWID()"
        );
        assert_eq!(
            Dialect::Oracle.spec().sample.render("name", "t", w, 3),
            "SELECT name FROM (SELECT name FROM t WHERE name IS NOT NULL \
             ORDER BY DBMS_RANDOM.VALUE) WHERE ROWNUM <= 3"
        );
        assert_eq!(Dialect::Sybase.spec().sample, Dialect::SqlServer.spec().sample);
        assert_eq!(Dialect::Sqlite.spec().sample, Dialect::PostgreSql.spec().sample);
        assert_eq!(Dialect::Generic.spec().sample, Dialect::MySql.spec().sample);
    }

    #[test]
    fn dialect_tags() -> Result<()> {
        assert_eq!("Postgres".parse::<Dialect>()?, Dialect::PostgreSql);
        assert_eq!("mssql".parse::<Dialect>()?, Dialect::SqlServer);
        assert!("cobol".parse::<Dialect>().is_err());
        let d: Dialect = serde_json::from_str("\"mariadb\"")?;
        assert_eq!(d, Dialect::MySql);
        Ok(())
    }

    #[test]
    fn table_refs() {
        assert_eq!(
            TableRef::parse("sales.\"Orders\""),
            TableRef {
                schema: Some("sales".into()),
                name: "Orders".into()
            }
        );
        assert_eq!(TableRef::parse("`orders`").name, "orders");
        assert_eq!(TableRef::parse("[dbo].[orders]").schema.as_deref(), Some("dbo"));
    }

    #[test]
    fn hosts_from_urls() {
        assert_eq!(host_of("jdbc:mysql://10.0.0.5:3306/db").as_deref(), Some("10.0.0.5"));
        assert_eq!(
            host_of("jdbc:oracle:thin:@//db1.example.com:1521/svc").as_deref(),
            Some("db1.example.com")
        );
        assert_eq!(host_of("jdbc:oracle:thin:@ora2:1521:orcl").as_deref(), Some("ora2"));
        assert_eq!(
            host_of("jdbc:sqlserver://sql1:1433;databaseName=x").as_deref(),
            Some("sql1")
        );
        assert_eq!(host_of("jdbc:postgresql://etl@pg3/db").as_deref(), Some("pg3"));
        assert_eq!(resource_key("jdbc:sqlite:/tmp/x.db"), "jdbc:sqlite:/tmp/x.db");
    }
}
