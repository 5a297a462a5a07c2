use anyhow::Result;
use rangeslice::source::{Column, ColumnType, SourceErrorKind};
use rangeslice::splitter::{Sampler, arithmetic_boundaries, interpolate_text};
use rangeslice::testing::{FakeSource, assert_strictly_increasing, float_stats, int_stats, text_stats};
use rangeslice::{Dialect, QueryResult, SplitPointPlanner, Strategy, Value};

fn ints(v: &[i64]) -> Vec<Value> {
    v.iter().copied().map(Value::Int).collect()
}

#[test]
fn integer_range_splits_evenly() -> Result<()> {
    let plan = SplitPointPlanner::new().plan(&int_stats(1, 100, false), 3)?;
    assert_eq!(plan.strategy, Strategy::Arithmetic);
    assert_eq!(plan.boundaries, ints(&[34, 67]));
    Ok(())
}

#[test]
fn narrow_integer_range_shrinks_partition_count() -> Result<()> {
    let plan = SplitPointPlanner::new().plan(&int_stats(0, 3, false), 10)?;
    assert_eq!(plan.boundaries, ints(&[1, 2]));

    let plan = SplitPointPlanner::new().plan(&int_stats(7, 8, false), 10)?;
    assert!(plan.is_empty());
    Ok(())
}

#[test]
fn extreme_integer_range_does_not_overflow() -> Result<()> {
    let plan = SplitPointPlanner::new().plan(&int_stats(i64::MIN, i64::MAX, false), 4)?;
    assert_eq!(plan.boundaries.len(), 3);
    assert_strictly_increasing(&plan.boundaries);
    Ok(())
}

#[test]
fn float_spread_not_above_count_stays_unsplit() -> Result<()> {
    let plan = SplitPointPlanner::new().plan(&float_stats(0.0, 3.0, false), 4)?;
    assert!(plan.is_empty());
    Ok(())
}

#[test]
fn float_boundaries_use_rounded_step() {
    let b = arithmetic_boundaries(&Value::float(0.0), &Value::float(100.0), 4);
    assert_eq!(b, vec![Value::float(25.0), Value::float(50.0), Value::float(75.0)]);
}

#[test]
fn desired_below_two_is_unsplit() -> Result<()> {
    for desired in [0, 1] {
        let plan = SplitPointPlanner::new().plan(&int_stats(1, 1000, true), desired)?;
        assert_eq!(plan.strategy, Strategy::Unsplit);
        assert!(plan.is_empty());
    }
    Ok(())
}

#[test]
fn text_interpolation_stays_inside_extremes() -> Result<()> {
    let stats = text_stats("apple", "zebra", false);
    let plan = SplitPointPlanner::new().plan(&stats, 4)?;
    assert_eq!(plan.strategy, Strategy::Interpolation);
    assert_eq!(plan.boundaries.len(), 3);
    assert_strictly_increasing(&plan.boundaries);
    for b in &plan.boundaries {
        assert!(*b > stats.min && *b < stats.max, "{b}");
    }
    Ok(())
}

#[test]
fn text_prefix_interpolates_lengths() {
    assert_eq!(
        interpolate_text("ab", "abcdefgh", 3),
        vec!["abcd".to_string(), "abcdef".to_string()]
    );
}

#[test]
fn adjacent_text_widens_resolution() {
    let b = interpolate_text("abc", "abd", 8);
    assert_eq!(b.len(), 7);
    assert!(b.windows(2).all(|w| w[0] < w[1]));
    assert!(b.iter().all(|s| s.as_str() > "abc" && s.as_str() < "abd"));
}

#[test]
fn reversed_text_yields_nothing() {
    assert!(interpolate_text("zebra", "apple", 4).is_empty());
    assert!(interpolate_text("same", "same", 4).is_empty());
}

#[test]
fn sampling_sorts_and_filters_sample() -> Result<()> {
    let sample = QueryResult::new(
        vec![Column::new("name", ColumnType::Varchar)],
        vec![
            vec![Value::text("mango")],
            vec![Value::text("apple")],
            vec![Value::text("fig")],
            vec![Value::text("mango")],
            vec![Value::Null],
        ],
    );
    let source = FakeSource::new().on("ORDER BY random()", sample);
    let sampler = Sampler {
        executor: &source,
        dialect: Dialect::PostgreSql,
        table: "fruit",
        column: "name",
        filter: None,
    };
    let plan = SplitPointPlanner::with_sampler(sampler).plan(&text_stats("apple", "pear", false), 4)?;
    assert_eq!(plan.strategy, Strategy::Sampling);
    assert_eq!(plan.boundaries, vec![Value::text("fig"), Value::text("mango")]);
    assert_eq!(
        source.queries(),
        vec!["SELECT name FROM fruit WHERE name IS NOT NULL ORDER BY random() LIMIT 3".to_string()]
    );
    Ok(())
}

#[test]
fn failed_sample_falls_back_to_interpolation() -> Result<()> {
    let source = FakeSource::new().fail_on("ORDER BY", SourceErrorKind::Permission, "denied");
    let sampler = Sampler {
        executor: &source,
        dialect: Dialect::MySql,
        table: "fruit",
        column: "name",
        filter: Some("origin = 'es'"),
    };
    let plan = SplitPointPlanner::with_sampler(sampler).plan(&text_stats("apple", "zebra", false), 4)?;
    assert_eq!(plan.strategy, Strategy::Interpolation);
    assert_eq!(plan.boundaries.len(), 3);
    Ok(())
}

#[test]
fn sampling_statement_per_dialect() {
    let source = FakeSource::new();
    let sql = |dialect| {
        Sampler {
            executor: &source,
            dialect,
            table: "t",
            column: "k",
            filter: None,
        }
        .sql(4)
    };
    assert_eq!(
        sql(Dialect::MySql),
        "SELECT k FROM t WHERE k IS NOT NULL ORDER BY rand() LIMIT 4"
    );
    assert_eq!(
        sql(Dialect::SqlServer),
        "SELECT TOP 4 k FROM t WHERE k IS NOT NULL ORDER BY NEWID()"
    );
    assert_eq!(
        sql(Dialect::Oracle),
        "SELECT k FROM (SELECT k FROM t WHERE k IS NOT NULL ORDER BY DBMS_RANDOM.VALUE) WHERE ROWNUM <= 4"
    );
}

#[test]
fn large_float_keys_plan_without_error() -> Result<()> {
    let stats = float_stats(1e17, 1e17 + 64.0, false);
    let plan = SplitPointPlanner::new().plan(&stats, 10)?;
    assert!(!plan.is_empty());
    assert_strictly_increasing(&plan.boundaries);
    for b in &plan.boundaries {
        assert!(*b > stats.min && *b < stats.max, "{b}");
    }
    Ok(())
}

#[test]
fn planning_is_repeatable() -> Result<()> {
    let planner = SplitPointPlanner::new();
    for (stats, desired) in [
        (int_stats(-1_000, 1_000_000, true), 7),
        (float_stats(0.25, 9_999.75, false), 12),
        (text_stats("aardvark", "zymurgy", false), 9),
        (text_stats("abc", "abd", false), 5),
    ] {
        let first = planner.plan(&stats, desired)?;
        let second = planner.plan(&stats, desired)?;
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
    Ok(())
}

#[test]
fn sample_with_only_extremes_falls_back_to_interpolation() -> Result<()> {
    let sample = QueryResult::new(
        vec![Column::new("name", ColumnType::Varchar)],
        vec![vec![Value::text("apple")], vec![Value::text("zebra")]],
    );
    let source = FakeSource::new().on("ORDER BY rand()", sample);
    let sampler = Sampler {
        executor: &source,
        dialect: Dialect::MySql,
        table: "fruit",
        column: "name",
        filter: None,
    };
    let plan = SplitPointPlanner::with_sampler(sampler).plan(&text_stats("apple", "zebra", false), 4)?;
    assert_eq!(plan.strategy, Strategy::Interpolation);
    assert_eq!(plan.boundaries.len(), 3);
    assert_eq!(source.queries().len(), 1);
    Ok(())
}
