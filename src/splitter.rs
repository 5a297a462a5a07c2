//! Split-point planning.
//!
//! Given [`RangeStats`] and a desired partition count `n`, the planner produces up
//! to `n - 1` interior boundaries, strictly increasing and strictly between `min`
//! and `max`. Three strategies exist, selected by key class:
//!
//! 1. **Arithmetic** (integer and float keys) -- `min + i * step`, no round trip.
//!    Float keys round the step to an integer and skip splitting entirely when the
//!    spread does not exceed `n`.
//! 2. **Interpolation** (text keys) -- synthetic strings between `min` and `max`
//!    derived from their longest common prefix. Boundaries need not exist as rows.
//! 3. **Sampling** (text keys, opt-in) -- a dialect-specific random sample of the
//!    column, sorted. Boundaries then follow the real distribution at the price of
//!    one more statement. A failed or empty sample falls back to interpolation.
//!
//! Every plan is checked before it is returned; a boundary outside `(min, max)` or
//! a non-increasing pair is a bug, reported as [`PlanError`].

use crate::dialect::Dialect;
use crate::probe::RangeStats;
use crate::query::and_filter;
use crate::source::{SourceResult, SqlExecutor};
use crate::value::{KeyKind, Value};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter, Result as FormatResult};
use tracing::{debug, warn};

/// How text keys are split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringSplit {
    #[default]
    Interpolate,
    Sample,
}

/// Strategy that produced a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Arithmetic,
    Interpolation,
    Sampling,
    /// No split was attempted (`n < 2`).
    Unsplit,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let s = match self {
            Self::Arithmetic => "arithmetic",
            Self::Interpolation => "interpolation",
            Self::Sampling => "sampling",
            Self::Unsplit => "unsplit",
        };
        f.write_str(s)
    }
}

/// Ordered interior boundaries, excluding `min` and `max`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub boundaries: Vec<Value>,
    pub strategy: Strategy,
}

impl SplitPlan {
    #[must_use]
    pub const fn unsplit() -> Self {
        Self {
            boundaries: Vec::new(),
            strategy: Strategy::Unsplit,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

/// A plan violated its own contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanError {
    OutOfRange { boundary: Value, min: Value, max: Value },
    NotIncreasing { left: Value, right: Value },
}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::OutOfRange { boundary, min, max } => {
                write!(f, "split boundary {boundary} outside ({min}, {max})")
            }
            Self::NotIncreasing { left, right } => {
                write!(f, "split boundaries not strictly increasing: {left} then {right}")
            }
        }
    }
}

impl Error for PlanError {}

/// Where sampling statements go, and what they sample.
#[derive(Clone, Copy)]
pub struct Sampler<'a> {
    pub executor: &'a dyn SqlExecutor,
    pub dialect: Dialect,
    pub table: &'a str,
    pub column: &'a str,
    pub filter: Option<&'a str>,
}

impl Sampler<'_> {
    /// The sampling statement for up to `limit` values.
    #[must_use]
    pub fn sql(&self, limit: usize) -> String {
        let where_clause = and_filter(self.filter, &format!("{} IS NOT NULL", self.column));
        self.dialect
            .spec()
            .sample
            .render(self.column, self.table, &where_clause, limit)
    }

    /// Sample up to `desired - 1` distinct values strictly between the extremes.
    ///
    /// # Errors
    ///
    /// Returns the connection layer's error if the sampling statement fails.
    pub fn sample(&self, stats: &RangeStats, desired: usize) -> SourceResult<Vec<Value>> {
        let limit = desired.saturating_sub(1);
        let sql = self.sql(limit);
        let result = self.executor.query(&sql)?;
        let mut values: Vec<Value> = result
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter_map(|v| v.coerce(stats.kind))
            .filter(|v| *v > stats.min && *v < stats.max)
            .collect();
        values.sort();
        values.dedup();
        values.truncate(limit);
        Ok(values)
    }
}

/// Produces split plans; see the module docs for the strategies.
#[derive(Clone, Copy, Default)]
pub struct SplitPointPlanner<'a> {
    sampler: Option<Sampler<'a>>,
}

impl<'a> SplitPointPlanner<'a> {
    /// A planner that never touches the source.
    #[must_use]
    pub const fn new() -> Self {
        Self { sampler: None }
    }

    /// A planner that samples text keys through `sampler`.
    #[must_use]
    pub const fn with_sampler(sampler: Sampler<'a>) -> Self {
        Self {
            sampler: Some(sampler),
        }
    }

    /// Plan boundaries for `desired` partitions.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] if the produced boundaries break the plan contract.
    pub fn plan(&self, stats: &RangeStats, desired: usize) -> Result<SplitPlan, PlanError> {
        if desired < 2 {
            return Ok(SplitPlan::unsplit());
        }
        let plan = match stats.kind {
            KeyKind::Integer | KeyKind::Float => SplitPlan {
                boundaries: arithmetic_boundaries(&stats.min, &stats.max, desired),
                strategy: Strategy::Arithmetic,
            },
            KeyKind::Text => self.plan_text(stats, desired),
        };
        validate(stats, &plan)?;
        Ok(plan)
    }

    fn plan_text(&self, stats: &RangeStats, desired: usize) -> SplitPlan {
        if let Some(sampler) = &self.sampler {
            match sampler.sample(stats, desired) {
                Ok(boundaries) if boundaries.is_empty() => {
                    debug!(
                        table = sampler.table,
                        "sample held no value inside the range, interpolating boundaries instead"
                    );
                }
                Ok(boundaries) => {
                    debug!(
                        table = sampler.table,
                        sampled = boundaries.len(),
                        "sampled text boundaries"
                    );
                    return SplitPlan {
                        boundaries,
                        strategy: Strategy::Sampling,
                    };
                }
                Err(err) => {
                    warn!(
                        table = sampler.table,
                        error = %err,
                        "sampling failed, interpolating boundaries instead"
                    );
                }
            }
        }
        let boundaries = match (stats.min.as_text(), stats.max.as_text()) {
            (Some(min), Some(max)) => interpolate_text(min, max, desired)
                .into_iter()
                .map(Value::Text)
                .collect(),
            _ => Vec::new(),
        };
        SplitPlan {
            boundaries,
            strategy: Strategy::Interpolation,
        }
    }
}

fn validate(stats: &RangeStats, plan: &SplitPlan) -> Result<(), PlanError> {
    if let Some(boundary) = plan
        .boundaries
        .iter()
        .find(|b| **b <= stats.min || **b >= stats.max)
    {
        return Err(PlanError::OutOfRange {
            boundary: boundary.clone(),
            min: stats.min.clone(),
            max: stats.max.clone(),
        });
    }
    if let Some(pair) = plan.boundaries.windows(2).find(|w| w[0] >= w[1]) {
        return Err(PlanError::NotIncreasing {
            left: pair[0].clone(),
            right: pair[1].clone(),
        });
    }
    Ok(())
}

/* ---------- Arithmetic ---------- */

/// Closed-form boundaries for numeric extremes.
///
/// Integers: `step = floor((max - min) / n)` computed in 128-bit arithmetic. When
/// the spread is smaller than `n` the partition count shrinks to the spread so
/// that every boundary is distinct.
///
/// Floats: empty when `max - min <= n`; otherwise `step` is rounded to the nearest
/// integer and boundaries at or past `max` are dropped.
#[must_use]
pub fn arithmetic_boundaries(min: &Value, max: &Value, desired: usize) -> Vec<Value> {
    match (min, max) {
        (Value::Int(lo), Value::Int(hi)) => integer_boundaries(*lo, *hi, desired),
        _ => match (min.as_f64(), max.as_f64()) {
            (Some(lo), Some(hi)) => float_boundaries(lo, hi, desired),
            _ => Vec::new(),
        },
    }
}

fn integer_boundaries(min: i64, max: i64, desired: usize) -> Vec<Value> {
    let span = i128::from(max) - i128::from(min);
    let parts = i128::try_from(desired).unwrap_or(i128::MAX).min(span);
    if parts < 2 {
        return Vec::new();
    }
    let step = span / parts;
    (1..parts)
        .filter_map(|i| i64::try_from(i128::from(min) + i * step).ok())
        .map(Value::Int)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn float_boundaries(min: f64, max: f64, desired: usize) -> Vec<Value> {
    let spread = max - min;
    let n = desired as f64;
    if spread <= n {
        return Vec::new();
    }
    let step = (spread / n).round();
    // Far from zero `min + i * step` can round onto `min` or an earlier boundary.
    let mut out: Vec<f64> = Vec::with_capacity(desired - 1);
    for i in 1..desired {
        let b = min + i as f64 * step;
        if b >= max {
            break;
        }
        if b > out.last().copied().unwrap_or(min) {
            out.push(b);
        }
    }
    out.into_iter().map(Value::float).collect()
}

/* ---------- Lexicographic interpolation ---------- */

/// Widest suffix, in characters, considered when the first differing character
/// alone cannot separate `n - 1` boundaries.
const MAX_WIDTH: usize = 6;

/// Synthetic text boundaries between `min` and `max`.
///
/// With `p` the longest common prefix:
/// - if `min == p` (a strict prefix of `max`), boundaries are prefixes of `max`
///   whose lengths are interpolated between the two lengths;
/// - otherwise the first differing code point is interpolated by `i / n` and the
///   result is truncated after it.
///
/// When either rule yields fewer than `n - 1` distinct boundaries the suffixes are
/// read as base-`k` numbers over the characters both bounds use, and widened one
/// character at a time until enough distinct values exist or [`MAX_WIDTH`] is
/// reached. Width one is exactly the first-differing-character rule.
#[must_use]
pub fn interpolate_text(min: &str, max: &str, desired: usize) -> Vec<String> {
    if desired < 2 || min >= max {
        return Vec::new();
    }
    let wanted = desired - 1;
    let split = common_prefix_len(min, max);
    let prefix = &min[..split];
    let lo: Vec<char> = min[split..].chars().collect();
    let hi: Vec<char> = max[split..].chars().collect();

    let mut best = Vec::new();
    if lo.is_empty() {
        best = by_length(prefix, &hi, desired);
        if best.len() >= wanted {
            return best;
        }
    }
    let alphabet = Alphabet::covering(min, max);
    for width in 1..=MAX_WIDTH {
        let candidates = by_code_point(prefix, &lo, &hi, desired, width, alphabet)
            .into_iter()
            .filter(|s| s.as_str() > min && s.as_str() < max)
            .collect::<Vec<_>>();
        let candidates = dedup_sorted(candidates);
        if candidates.len() > best.len() {
            best = candidates;
        }
        if best.len() >= wanted {
            break;
        }
    }
    best
}

/// Byte length of the longest common prefix, on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map_or_else(|| a.len().min(b.len()), |((i, _), _)| i)
}

fn by_length(prefix: &str, hi: &[char], desired: usize) -> Vec<String> {
    let extra = hi.len();
    let out = (1..desired)
        .map(|i| i * extra / desired)
        .filter(|len| *len >= 1 && *len < extra)
        .map(|len| {
            let mut s = prefix.to_string();
            s.extend(&hi[..len]);
            s
        })
        .collect();
    dedup_sorted(out)
}

fn by_code_point(
    prefix: &str,
    lo: &[char],
    hi: &[char],
    desired: usize,
    width: usize,
    alphabet: Alphabet,
) -> Vec<String> {
    let lo_num = alphabet.number(lo, width);
    let hi_num = alphabet.number(hi, width);
    if hi_num <= lo_num {
        return Vec::new();
    }
    let gap = hi_num - lo_num;
    let n = desired as u128;
    (1..desired)
        .map(|i| {
            let i = i as u128;
            lo_num + gap / n * i + (gap % n) * i / n
        })
        .map(|x| {
            let mut s = prefix.to_string();
            s.extend(alphabet.chars(x, width));
            s
        })
        .collect()
}

fn dedup_sorted(mut v: Vec<String>) -> Vec<String> {
    v.dedup();
    v
}

/// A contiguous range of code points (surrogates excluded) read as digits
/// `1..radix`, with digit `0` meaning "end of string". Under this encoding
/// numeric order of fixed-width digit strings matches lexicographic order of
/// the strings they encode.
#[derive(Clone, Copy, Debug)]
struct Alphabet {
    first: u32,
    last: u32,
}

const PRINTABLE: Alphabet = Alphabet {
    first: 0x20,
    last: 0x7E,
};
const ASCII: Alphabet = Alphabet {
    first: 0x00,
    last: 0x7F,
};
const UNICODE: Alphabet = Alphabet {
    first: 0x00,
    last: 0x10_FFFF,
};

impl Alphabet {
    fn covering(a: &str, b: &str) -> Self {
        let mut chars = a.chars().chain(b.chars());
        if chars.clone().all(|c| (' '..='~').contains(&c)) {
            PRINTABLE
        } else if chars.all(|c| c.is_ascii()) {
            ASCII
        } else {
            UNICODE
        }
    }

    const fn compact(v: u32) -> u32 {
        if v >= 0xE000 { v - 0x800 } else { v }
    }

    const fn radix(self) -> u128 {
        (Self::compact(self.last) - Self::compact(self.first)) as u128 + 2
    }

    fn digit(self, c: Option<&char>) -> u128 {
        c.map_or(0, |c| {
            u128::from(Self::compact(u32::from(*c)) - Self::compact(self.first)) + 1
        })
    }

    fn char_of(self, digit: u128) -> Option<char> {
        let ordinal = u32::try_from(digit.checked_sub(1)?).ok()?;
        let compact = ordinal + Self::compact(self.first);
        let v = if compact >= 0xD800 {
            compact + 0x800
        } else {
            compact
        };
        char::from_u32(v)
    }

    fn number(self, s: &[char], width: usize) -> u128 {
        let radix = self.radix();
        (0..width).fold(0u128, |acc, k| acc * radix + self.digit(s.get(k)))
    }

    /// Decode `x` into characters, stopping at the first end-of-string digit.
    fn chars(self, mut x: u128, width: usize) -> Vec<char> {
        let radix = self.radix();
        let mut digits = vec![0u128; width];
        for d in digits.iter_mut().rev() {
            *d = x % radix;
            x /= radix;
        }
        digits
            .into_iter()
            .map_while(|d| self.char_of(d))
            .collect()
    }
}
