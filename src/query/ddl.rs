//! Schema statements: create, alter, drop, show and joins.

use tracing::warn;

use crate::foreign_key::ForeignKey;
use crate::ident::is_valid_name;
use crate::join::{JoinAliases, JoinTable, JoinType, Relation};
use crate::table::{ColumnKey, Table};
use crate::value::{quote_ident, quote_str};

use super::{Query, QueryType};

/// Options for [`Query::create_table`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOptions {
    /// Prefix sections with `--` summary comments.
    pub with_comments: bool,
    pub if_not_exists: bool,
}

/// A single `alter table` change.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterOp {
    /// Add a column already present in the bound table.
    AddColumn(ColumnKey),
    DropColumn(String),
    /// Re-emit a column's current definition.
    ModifyColumn(ColumnKey),
    /// Rename `from` to the column at `to`, using its current definition.
    RenameColumn { from: String, to: ColumnKey },
    RenameTable(String),
    SetEngine(String),
    DropForeignKey(String),
}

/// Options for [`Query::join`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinOptions {
    pub join_type: JoinType,
    pub aliases: JoinAliases,
    /// `(left key, right key)` pairs for the `on` clause.
    pub on: Vec<(String, String)>,
    pub ops: Vec<String>,
    pub joiners: Vec<String>,
}

impl JoinOptions {
    pub fn new(join_type: JoinType) -> Self {
        Self {
            join_type,
            ..Self::default()
        }
    }

    pub fn on(mut self, left: &str, right: &str) -> Self {
        self.on.push((left.to_string(), right.to_string()));
        self
    }

    /// Additional pair with its own operator and joiner.
    pub fn on_with(mut self, joiner: &str, left: &str, op: &str, right: &str) -> Self {
        while self.ops.len() < self.on.len() {
            self.ops.push("=".to_string());
        }
        while self.joiners.len() < self.on.len() {
            self.joiners.push("and".to_string());
        }
        self.on.push((left.to_string(), right.to_string()));
        self.ops.push(op.to_string());
        self.joiners.push(joiner.to_string());
        self
    }

    pub fn alias_left(mut self, key: &str, alias: &str) -> Self {
        self.aliases.left.insert(key.to_string(), alias.to_string());
        self
    }

    pub fn alias_right(mut self, key: &str, alias: &str) -> Self {
        self.aliases.right.insert(key.to_string(), alias.to_string());
        self
    }
}

impl Query {
    /// Build `create table` followed by any composite primary key and
    /// foreign key statements.
    pub fn create_table(&mut self, options: &CreateOptions) -> String {
        let Relation::Table(table) = &self.relation else {
            warn!("create table needs a plain table, not join '{}'", self.relation.name());
            return self.finish(QueryType::Create, String::new(), Vec::new());
        };
        if table.is_empty() {
            warn!("table '{}' has no columns", table.name());
            return self.finish(QueryType::Create, String::new(), Vec::new());
        }

        let mut sql = String::new();
        if options.with_comments {
            sql.push_str(&format!(
                "-- table {}: {} columns, {} primary key columns, {} foreign keys\n",
                table.name(),
                table.len(),
                table.primary_key_count(),
                table.foreign_keys().len()
            ));
        }
        sql.push_str(&format!(
            "create table {}{} (\n",
            if options.if_not_exists { "if not exists " } else { "" },
            table.qualified_name()
        ));
        let definitions: Vec<String> = table.columns().map(|c| format!("  {}", c)).collect();
        sql.push_str(&definitions.join(",\n"));
        sql.push_str(&format!(
            "\n) engine = {} default charset = {} collate = {}",
            table.engine(),
            table.charset(),
            table.collation()
        ));
        if let Some(comment) = table.comment() {
            sql.push_str(&format!(" comment = {}", quote_str(comment)));
        }
        sql.push(';');

        if table.primary_key_count() > 1 {
            if options.with_comments {
                sql.push_str("\n-- composite primary key");
            }
            sql.push('\n');
            sql.push_str(&primary_key_sql(table));
        }
        if !table.foreign_keys().is_empty() && options.with_comments {
            sql.push_str(&format!("\n-- foreign keys ({})", table.foreign_keys().len()));
        }
        for fk in table.foreign_keys() {
            match foreign_key_sql(table, fk) {
                Some(stmt) => {
                    sql.push('\n');
                    sql.push_str(&stmt);
                }
                None => warn!("skipping foreign key '{}'", fk.name()),
            }
        }

        let affected = table.columns().map(|c| c.name().to_string()).collect();
        self.finish(QueryType::Create, sql, affected)
    }

    /// `alter table ... add primary key (...)` over every primary column.
    pub fn add_primary_key(&mut self) -> String {
        let table = self.relation.table();
        if table.primary_key_count() == 0 {
            warn!("table '{}' has no primary key columns", table.name());
            return self.finish(QueryType::Alter, String::new(), Vec::new());
        }
        let sql = primary_key_sql(table);
        let affected = table
            .primary_key_cols()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        self.finish(QueryType::Alter, sql, affected)
    }

    /// `alter table ... add constraint ... foreign key ... references ...`.
    pub fn add_foreign_key(&mut self, fk: &ForeignKey) -> String {
        let rendered = foreign_key_sql(self.relation.table(), fk);
        match rendered {
            Some(sql) => {
                let affected = fk.owner_columns().to_vec();
                self.finish(QueryType::Alter, sql, affected)
            }
            None => {
                warn!("foreign key '{}' has no usable references", fk.name());
                self.finish(QueryType::Alter, String::new(), Vec::new())
            }
        }
    }

    /// Build one `alter table` statement.
    pub fn alter(&mut self, op: &AlterOp) -> String {
        let table = self.relation.table();
        let target = table.qualified_name();
        let (sql, affected) = match op {
            AlterOp::AddColumn(key) => match table.get_col(key) {
                Some(col) => {
                    let placement = match col.index() {
                        Some(0) => " first".to_string(),
                        Some(i) => table
                            .get_col(i - 1)
                            .map(|prev| format!(" after {}", quote_ident(prev.name())))
                            .unwrap_or_default(),
                        None => String::new(),
                    };
                    (
                        format!("alter table {} add column {}{};", target, col, placement),
                        vec![col.name().to_string()],
                    )
                }
                None => missing_column(table, key),
            },
            AlterOp::DropColumn(name) if is_valid_name(name) => (
                format!("alter table {} drop column {};", target, quote_ident(name)),
                vec![name.clone()],
            ),
            AlterOp::ModifyColumn(key) => match table.get_col(key) {
                Some(col) => (
                    format!(
                        "alter table {} modify column {};",
                        target,
                        col.definition_without_keys()
                    ),
                    vec![col.name().to_string()],
                ),
                None => missing_column(table, key),
            },
            AlterOp::RenameColumn { from, to } if is_valid_name(from) => match table.get_col(to) {
                Some(col) => (
                    format!(
                        "alter table {} change column {} {};",
                        target,
                        quote_ident(from),
                        col.definition_without_keys()
                    ),
                    vec![from.clone(), col.name().to_string()],
                ),
                None => missing_column(table, to),
            },
            AlterOp::RenameTable(name) if is_valid_name(name) => (
                format!("alter table {} rename to {};", target, quote_ident(name)),
                Vec::new(),
            ),
            AlterOp::SetEngine(engine) if is_valid_name(engine) => {
                (format!("alter table {} engine = {};", target, engine), Vec::new())
            }
            AlterOp::DropForeignKey(name) if is_valid_name(name) => (
                format!("alter table {} drop foreign key {};", target, quote_ident(name)),
                Vec::new(),
            ),
            other => {
                warn!("invalid name in {:?}", other);
                (String::new(), Vec::new())
            }
        };
        self.finish(QueryType::Alter, sql, affected)
    }

    pub fn drop_table(&mut self, if_exists: bool) -> String {
        let sql = format!(
            "drop table {}{};",
            if if_exists { "if exists " } else { "" },
            self.relation.table().qualified_name()
        );
        self.finish(QueryType::Drop, sql, Vec::new())
    }

    pub fn drop_view(&mut self, view: &str) -> String {
        if !is_valid_name(view) {
            warn!("invalid view name '{}'", view);
            return self.finish(QueryType::Drop, String::new(), Vec::new());
        }
        let sql = format!("drop view if exists {};", quote_ident(view));
        self.finish(QueryType::Drop, sql, Vec::new())
    }

    pub fn show_create_table(&mut self) -> String {
        let sql = format!("show create table {};", self.relation.table().qualified_name());
        self.finish(QueryType::Show, sql, Vec::new())
    }

    pub fn show_columns(&mut self) -> String {
        let sql = format!("show columns from {};", self.relation.table().qualified_name());
        self.finish(QueryType::Show, sql, Vec::new())
    }

    /// Base tables of the bound schema, or of `database()` when unset.
    pub fn list_tables(&mut self) -> String {
        let sql = self.schema_listing("`table_name`", "BASE TABLE");
        self.finish(QueryType::Show, sql, Vec::new())
    }

    pub fn list_views(&mut self) -> String {
        let sql = self.schema_listing("`table_name`", "VIEW");
        self.finish(QueryType::Show, sql, Vec::new())
    }

    pub fn count_tables(&mut self) -> String {
        let sql = self.schema_listing("count(*) as `count`", "BASE TABLE");
        self.finish(QueryType::Show, sql, Vec::new())
    }

    pub fn count_views(&mut self) -> String {
        let sql = self.schema_listing("count(*) as `count`", "VIEW");
        self.finish(QueryType::Show, sql, Vec::new())
    }

    fn schema_listing(&self, projection: &str, table_type: &str) -> String {
        let schema = match self.relation.table().schema() {
            Some(schema) => quote_str(schema),
            None => "database()".to_string(),
        };
        format!(
            "select {} from `information_schema`.`tables` where `table_schema` = {} and `table_type` = {};",
            projection,
            schema,
            quote_str(table_type)
        )
    }

    /// A new query over this relation joined with `right`.
    pub fn join(&self, right: impl Into<Relation>, options: &JoinOptions) -> Query {
        let mut join = JoinTable::new(
            self.relation.clone(),
            right,
            options.join_type,
            &options.aliases,
        );
        if !options.on.is_empty() {
            let pairs: Vec<(&str, &str)> = options
                .on
                .iter()
                .map(|(l, r)| (l.as_str(), r.as_str()))
                .collect();
            let ops: Vec<&str> = options.ops.iter().map(String::as_str).collect();
            let joiners: Vec<&str> = options.joiners.iter().map(String::as_str).collect();
            if !join.set_join_condition(&pairs, &ops, &joiners) {
                warn!("join '{}': condition not set", join.table().name());
            }
        }
        Query::new(join)
    }
}

fn missing_column(table: &Table, key: &ColumnKey) -> (String, Vec<String>) {
    warn!("column '{}' not found in '{}'", key, table.name());
    (String::new(), Vec::new())
}

fn primary_key_sql(table: &Table) -> String {
    let cols: Vec<String> = table
        .primary_key_cols()
        .iter()
        .map(|c| c.sql_ref(false))
        .collect();
    format!(
        "alter table {} add primary key ({});",
        table.qualified_name(),
        cols.join(", ")
    )
}

fn foreign_key_sql(current: &Table, fk: &ForeignKey) -> Option<String> {
    if fk.is_empty() {
        return None;
    }
    let source = fk.source()?;
    let owner = current.qualified_name();
    let quote_all = |names: &[String]| -> String {
        names
            .iter()
            .map(|n| quote_ident(n))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut sql = format!(
        "alter table {} add constraint {} foreign key ({}) references {}({})",
        owner,
        quote_ident(fk.name()),
        quote_all(fk.owner_columns()),
        source.qualified_name(),
        quote_all(fk.source_columns())
    );
    if let Some(action) = fk.on_delete() {
        sql.push_str(&format!(" on delete {}", action));
    }
    if let Some(action) = fk.on_update() {
        sql.push_str(&format!(" on update {}", action));
    }
    sql.push(';');
    Some(sql)
}
