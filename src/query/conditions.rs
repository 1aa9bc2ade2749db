//! WHERE clause model and rendering.

use tracing::{debug, warn};

use crate::column::{CleanValue, Column, time_token};
use crate::table::ColumnKey;
use crate::value::Value;

use super::Query;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonOp {
    #[default]
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "=" | "==" => Some(ComparisonOp::Eq),
            "!=" | "<>" => Some(ComparisonOp::Ne),
            "<" => Some(ComparisonOp::Lt),
            "<=" => Some(ComparisonOp::Lte),
            ">" => Some(ComparisonOp::Gt),
            ">=" => Some(ComparisonOp::Gte),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connective between conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Joiner {
    #[default]
    And,
    Or,
}

impl Joiner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Joiner::And => "and",
            Joiner::Or => "or",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "and" | "&&" => Some(Joiner::And),
            "or" | "||" => Some(Joiner::Or),
            _ => None,
        }
    }
}

impl std::fmt::Display for Joiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Joiner {
    /// Unknown tokens fall back to `and`.
    fn from(token: &str) -> Self {
        Joiner::from_token(token).unwrap_or_else(|| {
            debug!("unknown joiner '{}', using 'and'", token);
            Joiner::And
        })
    }
}

/// How a column is compared with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(ComparisonOp),
    In,
    NotIn,
    /// One comparison per array element, connected by `joiners`.
    Each {
        ops: Vec<ComparisonOp>,
        joiners: Vec<Joiner>,
    },
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Compare(ComparisonOp::Eq)
    }
}

impl From<ComparisonOp> for Condition {
    fn from(op: ComparisonOp) -> Self {
        Condition::Compare(op)
    }
}

impl From<&str> for Condition {
    /// Unknown tokens fall back to `=`.
    fn from(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "in" => Condition::In,
            "not in" => Condition::NotIn,
            other => match ComparisonOp::from_token(other) {
                Some(op) => Condition::Compare(op),
                None => {
                    debug!("unknown condition '{}', using '='", token);
                    Condition::default()
                }
            },
        }
    }
}

/// Filter as parallel lists: entry `i` of each list describes condition `i`.
///
/// Missing conditions mean `=`, missing joiners mean `and`. `joiners[0]` is
/// never rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    pub columns: Vec<ColumnKey>,
    pub values: Vec<Value>,
    pub conditions: Vec<Condition>,
    pub joiners: Vec<Joiner>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        column: impl Into<ColumnKey>,
        condition: impl Into<Condition>,
        value: impl Into<Value>,
        joiner: Joiner,
    ) {
        self.columns.push(column.into());
        self.conditions.push(condition.into());
        self.values.push(value.into());
        self.joiners.push(joiner);
    }

    pub fn and(
        mut self,
        column: impl Into<ColumnKey>,
        condition: impl Into<Condition>,
        value: impl Into<Value>,
    ) -> Self {
        self.push(column, condition, value, Joiner::And);
        self
    }

    pub fn or(
        mut self,
        column: impl Into<ColumnKey>,
        condition: impl Into<Condition>,
        value: impl Into<Value>,
    ) -> Self {
        self.push(column, condition, value, Joiner::Or);
        self
    }

    /// `column = value`, joined with `and`.
    pub fn eq(self, column: impl Into<ColumnKey>, value: impl Into<Value>) -> Self {
        self.and(column, ComparisonOp::Eq, value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Query {
    /// Render `filter` as `where ...`, or an empty string.
    ///
    /// Columns that do not resolve are skipped. Lists of different lengths
    /// yield no clause at all.
    pub fn create_where_conditions(&self, filter: &Where) -> String {
        let n = filter.columns.len();
        if n == 0 {
            return String::new();
        }
        if filter.values.len() != n || filter.conditions.len() > n || filter.joiners.len() > n {
            warn!(
                "inconsistent filter: {} columns, {} values, {} conditions, {} joiners",
                n,
                filter.values.len(),
                filter.conditions.len(),
                filter.joiners.len()
            );
            return String::new();
        }

        let qualify = self.relation().is_join();
        let mut clause = String::new();
        for (i, key) in filter.columns.iter().enumerate() {
            let Some(col) = self.resolve(key) else {
                warn!("filter column '{}' not found in '{}'", key, self.relation().name());
                continue;
            };
            let condition = filter.conditions.get(i).cloned().unwrap_or_default();
            let Some(fragment) =
                condition_sql(&col, &col.sql_ref(qualify), &condition, &filter.values[i])
            else {
                continue;
            };
            if !clause.is_empty() {
                let joiner = filter.joiners.get(i).copied().unwrap_or_default();
                clause.push_str(&format!(" {} ", joiner));
            }
            clause.push_str(&fragment);
        }

        if clause.is_empty() {
            String::new()
        } else {
            format!("where {}", clause)
        }
    }
}

fn condition_sql(
    col: &Column,
    col_ref: &str,
    condition: &Condition,
    value: &Value,
) -> Option<String> {
    if let Value::String(s) = value {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered == "is null" || lowered == "is not null" {
            return Some(format!("{} {}", col_ref, lowered));
        }
    }
    if let Value::Array(items) = value {
        return list_condition(col, col_ref, condition, items);
    }
    let op = match condition {
        Condition::Compare(op) => *op,
        Condition::In => ComparisonOp::Eq,
        Condition::NotIn => ComparisonOp::Ne,
        Condition::Each { ops, .. } => ops.first().copied().unwrap_or_default(),
    };
    scalar_condition(col, col_ref, op, value)
}

fn scalar_condition(
    col: &Column,
    col_ref: &str,
    op: ComparisonOp,
    value: &Value,
) -> Option<String> {
    match col.clean_value(value, false) {
        CleanValue::Null => Some(match op {
            ComparisonOp::Ne => format!("{} is not null", col_ref),
            _ => format!("{} is null", col_ref),
        }),
        CleanValue::Literal(start) => {
            // A date without a time token matches the whole day.
            if col.datatype().is_date() && time_token(&start).is_none() {
                let end = col.clean_value(value, true);
                match op {
                    ComparisonOp::Eq => {
                        return Some(format!("({c} >= {start} and {c} <= {end})", c = col_ref));
                    }
                    ComparisonOp::Ne => {
                        return Some(format!("({c} < {start} or {c} > {end})", c = col_ref));
                    }
                    _ => {}
                }
            }
            Some(format!("{} {} {}", col_ref, op, start))
        }
        CleanValue::List(_) => None,
    }
}

fn list_condition(
    col: &Column,
    col_ref: &str,
    condition: &Condition,
    items: &[Value],
) -> Option<String> {
    if items.is_empty() {
        warn!("empty value list for '{}'", col.name());
        return None;
    }
    let in_list = |keyword: &str| {
        let cleaned = col.clean_value(&Value::Array(items.to_vec()), false);
        Some(format!("{} {} {}", col_ref, keyword, cleaned))
    };
    match condition {
        Condition::In | Condition::Compare(ComparisonOp::Eq) => in_list("in"),
        Condition::NotIn | Condition::Compare(ComparisonOp::Ne) => in_list("not in"),
        Condition::Compare(op) => each_condition(col, col_ref, &vec![*op; items.len()], &[], items),
        Condition::Each { ops, joiners } => each_condition(col, col_ref, ops, joiners, items),
    }
}

fn each_condition(
    col: &Column,
    col_ref: &str,
    ops: &[ComparisonOp],
    joiners: &[Joiner],
    items: &[Value],
) -> Option<String> {
    let mut parts = String::new();
    for (j, item) in items.iter().enumerate() {
        let op = ops.get(j).copied().unwrap_or_default();
        let Some(fragment) = scalar_condition(col, col_ref, op, item) else {
            continue;
        };
        if !parts.is_empty() {
            parts.push_str(&format!(" {} ", joiners.get(j).copied().unwrap_or_default()));
        }
        parts.push_str(&fragment);
    }
    (!parts.is_empty()).then(|| format!("({})", parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnSpec;
    use crate::table::{DefaultColumns, Table};
    use pretty_assertions::assert_eq;

    fn query() -> Query {
        let mut t = Table::new("events").unwrap();
        t.add_default_cols(&DefaultColumns::default());
        t.add_column("title", ColumnSpec::new("varchar(100)")).unwrap();
        t.add_column("seats", ColumnSpec::new("int")).unwrap();
        Query::new(t)
    }

    #[test]
    fn test_simple_equality() {
        let filter = Where::new().eq("title", "o'brien");
        assert_eq!(
            query().create_where_conditions(&filter),
            "where `title` = 'o\\'brien'"
        );
    }

    #[test]
    fn test_joiners_and_first_joiner_ignored() {
        let filter = Where::new()
            .or("seats", ">", 10)
            .or("seats", "<", 2)
            .and("title", "!=", "x");
        assert_eq!(
            query().create_where_conditions(&filter),
            "where `seats` > 10 or `seats` < 2 and `title` != 'x'"
        );
    }

    #[test]
    fn test_date_equality_spans_day() {
        let filter = Where::new().eq("created_on", "2023-05-01 10:00:00");
        assert_eq!(
            query().create_where_conditions(&filter),
            "where (`created_on` >= '2023-05-01 10:00:00' and `created_on` <= '2023-05-01 23:59:59')"
        );
    }

    #[test]
    fn test_date_inequality_excludes_day() {
        let filter = Where::new().and("last_updated", "<>", "2023-05-01");
        assert_eq!(
            query().create_where_conditions(&filter),
            "where (`last_updated` < '2023-05-01 00:00:00' or `last_updated` > '2023-05-01 23:59:59')"
        );
    }

    #[test]
    fn test_date_now_token_stays_plain() {
        let filter = Where::new().and("created_on", "<", "now()");
        assert_eq!(
            query().create_where_conditions(&filter),
            "where `created_on` < now()"
        );
    }

    #[test]
    fn test_lists() {
        let q = query();
        let filter = Where::new().and("seats", Condition::In, vec![1, 2, 3]);
        assert_eq!(q.create_where_conditions(&filter), "where `seats` in (1, 2, 3)");

        let filter = Where::new().and("title", Condition::NotIn, vec!["a", "b"]);
        assert_eq!(q.create_where_conditions(&filter), "where `title` not in ('a', 'b')");

        let filter = Where::new().and(
            "seats",
            Condition::Each {
                ops: vec![ComparisonOp::Gt, ComparisonOp::Lt],
                joiners: vec![Joiner::And, Joiner::Or],
            },
            vec![10, 2],
        );
        assert_eq!(
            q.create_where_conditions(&filter),
            "where (`seats` > 10 or `seats` < 2)"
        );
    }

    #[test]
    fn test_null_handling() {
        let q = query();
        let filter = Where::new().eq("title", "IS NOT NULL");
        assert_eq!(q.create_where_conditions(&filter), "where `title` is not null");
        let filter = Where::new().and("seats", "!=", Value::Null);
        assert_eq!(q.create_where_conditions(&filter), "where `seats` is not null");
    }

    #[test]
    fn test_padding_and_inconsistent_lengths() {
        let q = query();
        let filter = Where {
            columns: vec!["seats".into(), "title".into()],
            values: vec![Value::Int(4), Value::from("x")],
            conditions: vec![Condition::Compare(ComparisonOp::Gte)],
            joiners: vec![],
        };
        assert_eq!(
            q.create_where_conditions(&filter),
            "where `seats` >= 4 and `title` = 'x'"
        );

        let broken = Where {
            columns: vec!["seats".into()],
            values: vec![],
            ..Where::default()
        };
        assert_eq!(q.create_where_conditions(&broken), "");
    }

    #[test]
    fn test_unknown_column_skipped() {
        let filter = Where::new().eq("ghost", 1).eq("seats", 1);
        assert_eq!(query().create_where_conditions(&filter), "where `seats` = 1");
    }

    #[test]
    fn test_lenient_tokens() {
        assert_eq!(Condition::from("like"), Condition::Compare(ComparisonOp::Eq));
        assert_eq!(Condition::from("NOT IN"), Condition::NotIn);
        assert_eq!(Joiner::from("xor"), Joiner::And);
        assert_eq!(Joiner::from("OR"), Joiner::Or);
    }
}
