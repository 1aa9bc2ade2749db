//! Joined relations.
//!
//! A [`JoinTable`] merges the columns of its two sides into one table.
//! Names present on both sides are exposed as `left_<name>` and
//! `right_<name>` unless the caller supplies aliases.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::column::Column;
use crate::error::TabulaError;
use crate::query::{ComparisonOp, Joiner};
use crate::table::{ColumnKey, Table};

/// Join flavour, rendered as its SQL keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    Left,
    Right,
    Cross,
    #[default]
    Inner,
    Natural,
    NaturalLeft,
    NaturalRight,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Left => "left join",
            JoinType::Right => "right join",
            JoinType::Cross => "cross join",
            JoinType::Inner => "join",
            JoinType::Natural => "natural join",
            JoinType::NaturalLeft => "natural left join",
            JoinType::NaturalRight => "natural right join",
        }
    }

    /// Natural and cross joins take no `on` clause.
    pub fn takes_condition(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Right | JoinType::Inner)
    }
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinType {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<String> = s
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .filter(|w| w != "join" && w != "outer")
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["left"] => Ok(JoinType::Left),
            ["right"] => Ok(JoinType::Right),
            ["cross"] => Ok(JoinType::Cross),
            [] | ["inner"] => Ok(JoinType::Inner),
            ["natural"] => Ok(JoinType::Natural),
            ["natural", "left"] => Ok(JoinType::NaturalLeft),
            ["natural", "right"] => Ok(JoinType::NaturalRight),
            _ => Err(TabulaError::Config(format!("unknown join type '{}'", s))),
        }
    }
}

/// One side of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn prefix(&self) -> &'static str {
        match self {
            Side::Left => "left_",
            Side::Right => "right_",
        }
    }
}

/// Caller-chosen aliases, original key → alias, per side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinAliases {
    pub left: BTreeMap<String, String>,
    pub right: BTreeMap<String, String>,
}

impl JoinAliases {
    fn side(&self, side: Side) -> &BTreeMap<String, String> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Anything a query can select from.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    Table(Table),
    Join(Box<JoinTable>),
}

impl Relation {
    /// The table itself, or the merged table of a join.
    pub fn table(&self) -> &Table {
        match self {
            Relation::Table(t) => t,
            Relation::Join(j) => &j.table,
        }
    }

    pub fn table_mut(&mut self) -> &mut Table {
        match self {
            Relation::Table(t) => t,
            Relation::Join(j) => &mut j.table,
        }
    }

    pub fn name(&self) -> &str {
        self.table().name()
    }

    pub fn is_join(&self) -> bool {
        matches!(self, Relation::Join(_))
    }

    pub fn as_join(&self) -> Option<&JoinTable> {
        match self {
            Relation::Join(j) => Some(j),
            Relation::Table(_) => None,
        }
    }

    /// Column lookup; joins check their alias map first.
    pub fn get_col(&self, key: impl Into<ColumnKey>) -> Option<&Column> {
        match self {
            Relation::Table(t) => t.get_col(key),
            Relation::Join(j) => j.get_col(key),
        }
    }

    /// Text following `from`.
    pub fn from_clause(&self) -> String {
        match self {
            Relation::Table(t) => t.qualified_name(),
            Relation::Join(j) => j.from_clause(),
        }
    }
}

impl From<Table> for Relation {
    fn from(table: Table) -> Self {
        Relation::Table(table)
    }
}

impl From<&Table> for Relation {
    fn from(table: &Table) -> Self {
        Relation::Table(table.clone())
    }
}

impl From<JoinTable> for Relation {
    fn from(join: JoinTable) -> Self {
        Relation::Join(Box::new(join))
    }
}

/// Two relations joined, with their columns merged.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTable {
    table: Table,
    left: Relation,
    right: Relation,
    join_type: JoinType,
    condition: Option<String>,
    common_names: BTreeSet<String>,
    /// alias → (side, key on that side)
    key_map: BTreeMap<String, (Side, String)>,
    /// (side, key on that side) → key in the merged table
    merged_keys: BTreeMap<(Side, String), String>,
}

impl JoinTable {
    pub fn new(
        left: impl Into<Relation>,
        right: impl Into<Relation>,
        join_type: JoinType,
        aliases: &JoinAliases,
    ) -> Self {
        let left = left.into();
        let right = right.into();
        let left_names: BTreeSet<&str> = left.table().columns().map(Column::name).collect();
        let right_names: BTreeSet<&str> = right.table().columns().map(Column::name).collect();
        let common_names: BTreeSet<String> = left_names
            .intersection(&right_names)
            .map(|n| n.to_string())
            .collect();

        let name = format!("{}_{}", left.name(), right.name());
        let mut table = Table::merged(name, left.table().mysql_version());
        let mut key_map = BTreeMap::new();
        let mut merged_keys = BTreeMap::new();

        for (side, relation) in [(Side::Left, &left), (Side::Right, &right)] {
            for (key, col) in relation.table().entries() {
                let mut col = col.clone();
                let explicit = aliases.side(side).get(key);
                let mut merged_key = match explicit {
                    Some(alias) => alias.clone(),
                    None if common_names.contains(col.name()) => {
                        format!("{}{}", side.prefix(), col.name())
                    }
                    None => key.clone(),
                };
                if table.has_col(merged_key.as_str()) {
                    merged_key = format!("{}{}", side.prefix(), key);
                }
                if explicit.is_some() || common_names.contains(col.name()) {
                    col.alias_as(merged_key.clone());
                    key_map.insert(merged_key.clone(), (side, key.clone()));
                }
                if table.insert_merged(merged_key.clone(), col) {
                    merged_keys.insert((side, key.clone()), merged_key);
                } else {
                    warn!("join '{}': column key '{}' is taken", table.name(), merged_key);
                }
            }
        }
        debug!(
            "joined '{}' and '{}' into {} columns",
            left.name(),
            right.name(),
            table.len()
        );

        Self {
            table,
            left,
            right,
            join_type,
            condition: None,
            common_names,
            key_map,
            merged_keys,
        }
    }

    /// The merged column set.
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn left(&self) -> &Relation {
        &self.left
    }

    pub fn right(&self) -> &Relation {
        &self.right
    }

    pub fn side(&self, side: Side) -> &Relation {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// Rendered `on ...` clause, if set.
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// Column names found on both sides.
    pub fn common_names(&self) -> &BTreeSet<String> {
        &self.common_names
    }

    /// Key of a side's column inside the merged table.
    pub fn merged_key(&self, side: Side, key: &str) -> Option<&str> {
        self.merged_keys
            .get(&(side, key.to_string()))
            .map(String::as_str)
    }

    /// Alias map first, then the merged set. Aliased lookups return the
    /// side's own column.
    pub fn get_col(&self, key: impl Into<ColumnKey>) -> Option<&Column> {
        let key = key.into();
        if let ColumnKey::Key(k) = &key {
            if let Some((side, original)) = self.key_map.get(k) {
                return self.side(*side).get_col(original.as_str());
            }
        }
        self.table.get_col(key)
    }

    /// Resolve a column for use in a query: left side, right side, then the
    /// merged set. The result carries the merged alias, if any.
    pub fn resolve(&self, key: &ColumnKey) -> Option<Column> {
        if let ColumnKey::Key(k) = key {
            for side in [Side::Left, Side::Right] {
                if !self.side(side).table().has_col(k.as_str()) {
                    continue;
                }
                if let Some(col) = self
                    .merged_key(side, k)
                    .and_then(|mk| self.table.get_col(mk))
                {
                    return Some(col.clone());
                }
            }
        }
        self.table.get_col(key).cloned()
    }

    /// Build the `on` clause from `(left key, right key)` pairs.
    ///
    /// `ops[i]` and `joiners[i]` belong to pair `i`; missing or unknown
    /// entries default to `=` and `and`. The clause is left unchanged if any
    /// column is missing or the types of a pair differ.
    pub fn set_join_condition(
        &mut self,
        pairs: &[(&str, &str)],
        ops: &[&str],
        joiners: &[&str],
    ) -> bool {
        if pairs.is_empty() {
            warn!("join '{}': no column pairs for the join condition", self.table.name());
            return false;
        }
        let mut clause = String::new();
        for (i, (l, r)) in pairs.iter().enumerate() {
            let Some(left) = self.left.get_col(*l) else {
                warn!("join condition: '{}' not found in '{}'", l, self.left.name());
                return false;
            };
            let Some(right) = self.right.get_col(*r) else {
                warn!("join condition: '{}' not found in '{}'", r, self.right.name());
                return false;
            };
            if left.datatype() != right.datatype() {
                let err = TabulaError::TypeMismatch {
                    left: format!("{} {}", left.name(), left.datatype()),
                    right: format!("{} {}", right.name(), right.datatype()),
                };
                warn!("join condition: {}", err);
                return false;
            }
            let op = ops
                .get(i)
                .and_then(|op| ComparisonOp::from_token(op))
                .unwrap_or_default();
            if i > 0 {
                let joiner = joiners
                    .get(i)
                    .and_then(|j| Joiner::from_token(j))
                    .unwrap_or_default();
                clause.push_str(&format!(" {} ", joiner));
            }
            clause.push_str(&format!("{} {} {}", left.sql_ref(true), op, right.sql_ref(true)));
        }
        if !self.join_type.takes_condition() {
            debug!("{} ignores its join condition", self.join_type);
        }
        self.condition = Some(format!("on {}", clause));
        true
    }

    /// `left <join> right [on ...]`; a joined right side is parenthesized.
    pub fn from_clause(&self) -> String {
        let right = match &self.right {
            Relation::Join(_) => format!("({})", self.right.from_clause()),
            Relation::Table(_) => self.right.from_clause(),
        };
        let mut sql = format!("{} {} {}", self.left.from_clause(), self.join_type, right);
        if self.join_type.takes_condition() {
            if let Some(condition) = &self.condition {
                sql.push(' ');
                sql.push_str(condition);
            }
        }
        sql
    }
}
