//! `insert`, `update` and `delete` statements.

use tracing::warn;

use crate::column::Column;
use crate::join::Relation;
use crate::table::{DefaultColumn, Table};
use crate::value::{Record, Value, quote_bytes};

use super::{Query, QueryType, Where};

impl Query {
    /// Build an `insert` for one record.
    ///
    /// Columns are taken in table order. Record entries match a column key
    /// or a column name. Absent auto-increment columns are left to the
    /// server, an absent creation column gets its default. For blob columns
    /// a string value names a file whose bytes are inserted.
    pub fn insert_record(&mut self, record: &Record) -> String {
        self.insert_records(std::slice::from_ref(record))
    }

    /// Multi-row `insert`. Rows lacking a column use `default`.
    pub fn insert_records(&mut self, records: &[Record]) -> String {
        let Relation::Table(table) = &self.relation else {
            warn!("insert needs a plain table, not join '{}'", self.relation.name());
            return self.finish(QueryType::Insert, String::new(), Vec::new());
        };
        warn_unknown_keys(table, records);

        let created_on = table.default_key(DefaultColumn::CreatedOn);
        let mut columns: Vec<&Column> = Vec::new();
        let mut keys: Vec<&str> = Vec::new();
        for (key, col) in table.entries() {
            let present = records.iter().any(|r| lookup(r, key, col).is_some());
            if present || created_on == Some(key.as_str()) {
                columns.push(col);
                keys.push(key);
            }
        }
        if columns.is_empty() || records.is_empty() {
            warn!("insert into '{}': nothing to insert", table.name());
            return self.finish(QueryType::Insert, String::new(), Vec::new());
        }

        let mut is_blob = false;
        let rows: Vec<String> = records
            .iter()
            .map(|record| {
                let values: Vec<String> = columns
                    .iter()
                    .zip(&keys)
                    .map(|(col, key)| match lookup(record, key, col) {
                        Some(value) => {
                            is_blob |= col.datatype().is_blob();
                            value_literal(col, value)
                        }
                        None if created_on == Some(*key) => col
                            .default_value()
                            .unwrap_or("current_timestamp")
                            .to_string(),
                        None => "default".to_string(),
                    })
                    .collect();
                format!("({})", values.join(", "))
            })
            .collect();

        let names: Vec<String> = columns.iter().map(|c| c.sql_ref(false)).collect();
        let sql = format!(
            "insert into {} ({}) values {};",
            table.qualified_name(),
            names.join(", "),
            rows.join(", ")
        );
        let affected = columns.iter().map(|c| c.name().to_string()).collect();
        self.is_blob = is_blob;
        self.finish(QueryType::Insert, sql, affected)
    }

    /// Build an `update` setting the record's columns.
    ///
    /// The registered last-update column is refreshed to the current time
    /// unless the record sets it.
    pub fn update_record(&mut self, record: &Record, filter: &Where) -> String {
        let Relation::Table(table) = &self.relation else {
            warn!("update needs a plain table, not join '{}'", self.relation.name());
            return self.finish(QueryType::Update, String::new(), Vec::new());
        };
        warn_unknown_keys(table, std::slice::from_ref(record));

        let mut sets = Vec::new();
        let mut affected = Vec::new();
        let mut is_blob = false;
        for (key, col) in table.entries() {
            if let Some(value) = lookup(record, key, col) {
                is_blob |= col.datatype().is_blob();
                sets.push(format!("{} = {}", col.sql_ref(false), value_literal(col, value)));
                affected.push(col.name().to_string());
            }
        }
        if sets.is_empty() {
            warn!("update '{}': no matching columns in record", table.name());
            return self.finish(QueryType::Update, String::new(), Vec::new());
        }
        if let Some(col) = table.default_column(DefaultColumn::LastUpdated) {
            if !affected.iter().any(|n| n == col.name()) {
                let now = col.now_expression().unwrap_or("now()");
                sets.push(format!("{} = {}", col.sql_ref(false), now));
                affected.push(col.name().to_string());
            }
        }

        let mut sql = format!("update {} set {}", table.qualified_name(), sets.join(", "));
        let filter = self.create_where_conditions(filter);
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(&filter);
        }
        sql.push(';');
        self.is_blob = is_blob;
        self.finish(QueryType::Update, sql, affected)
    }

    /// Build a `delete`. An empty filter deletes every row.
    pub fn delete_record(&mut self, filter: &Where) -> String {
        let Relation::Table(table) = &self.relation else {
            warn!("delete needs a plain table, not join '{}'", self.relation.name());
            return self.finish(QueryType::Delete, String::new(), Vec::new());
        };
        let mut sql = format!("delete from {}", table.qualified_name());
        let filter = self.create_where_conditions(filter);
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(&filter);
        }
        sql.push(';');
        self.finish(QueryType::Delete, sql, Vec::new())
    }
}

fn lookup<'a>(record: &'a Record, key: &str, col: &Column) -> Option<&'a Value> {
    record.get(key).or_else(|| record.get(col.name()))
}

fn warn_unknown_keys(table: &Table, records: &[Record]) {
    for record in records {
        for key in record.keys() {
            if !table.has_col(key) && table.get_col_by_name(key).is_none() {
                warn!("'{}' is not a column of '{}'", key, table.name());
            }
        }
    }
}

/// Literal for `value` in `col`; blob paths are read from disk.
fn value_literal(col: &Column, value: &Value) -> String {
    if col.datatype().is_blob() {
        if let Value::String(path) = value {
            return match std::fs::read(path) {
                Ok(bytes) => quote_bytes(&bytes),
                Err(e) => {
                    warn!("cannot read blob file '{}' for '{}': {}", path, col.name(), e);
                    "null".to_string()
                }
            };
        }
    }
    col.clean_value(value, false).to_string()
}
