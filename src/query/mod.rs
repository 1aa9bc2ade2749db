//! SQL statement generation.
//!
//! A [`Query`] is bound to a table or a join and turns structured requests
//! into MySQL text. Every builder stores the generated text, the statement
//! kind and the affected columns on the query, and also returns the text.

mod conditions;
mod ddl;
mod dml;
mod select;

pub use conditions::{ComparisonOp, Condition, Joiner, Where};
pub use ddl::{AlterOp, CreateOptions, JoinOptions};
pub use select::{OrderBy, SelectColumn, SelectOptions, SortOrder};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::column::Column;
use crate::error::{TabulaError, TabulaResult};
use crate::join::Relation;
use crate::table::{ColumnKey, Table};

/// Statement kind of the last generated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Select,
    Update,
    Delete,
    Insert,
    Show,
    Create,
    Alter,
    Drop,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Select => "select",
            QueryType::Update => "update",
            QueryType::Delete => "delete",
            QueryType::Insert => "insert",
            QueryType::Show => "show",
            QueryType::Create => "create",
            QueryType::Alter => "alter",
            QueryType::Drop => "drop",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(QueryType::Select),
            "update" => Ok(QueryType::Update),
            "delete" => Ok(QueryType::Delete),
            "insert" => Ok(QueryType::Insert),
            "show" => Ok(QueryType::Show),
            "create" => Ok(QueryType::Create),
            "alter" => Ok(QueryType::Alter),
            "drop" => Ok(QueryType::Drop),
            _ => Err(TabulaError::UnsupportedQueryType(s.to_string())),
        }
    }
}

/// A query builder bound to one relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    relation: Relation,
    sql: String,
    query_type: Option<QueryType>,
    map_result_to: Option<String>,
    is_blob: bool,
    affected_columns: Vec<String>,
}

impl Query {
    pub fn new(relation: impl Into<Relation>) -> Self {
        Self {
            relation: relation.into(),
            sql: String::new(),
            query_type: None,
            map_result_to: None,
            is_blob: false,
            affected_columns: Vec::new(),
        }
    }

    /// Query over a new, empty table.
    pub fn for_table(name: &str) -> TabulaResult<Self> {
        Ok(Self::new(Table::new(name)?))
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// The bound table, or the merged table of a join.
    pub fn table(&self) -> &Table {
        self.relation.table()
    }

    pub fn table_mut(&mut self) -> &mut Table {
        self.relation.table_mut()
    }

    /// Last generated statement.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn query_type(&self) -> Option<QueryType> {
        self.query_type
    }

    /// Override the statement kind; unknown kinds are an error.
    pub fn set_query_type(&mut self, kind: &str) -> TabulaResult<()> {
        self.query_type = Some(kind.parse()?);
        Ok(())
    }

    /// Result-mapping hint recorded by the last select.
    pub fn map_result_to(&self) -> Option<&str> {
        self.map_result_to.as_deref()
    }

    /// Whether the last insert or update carried blob data.
    pub fn is_blob(&self) -> bool {
        self.is_blob
    }

    /// Database names of the columns the last statement touched.
    pub fn affected_columns(&self) -> &[String] {
        &self.affected_columns
    }

    pub fn set_schema(&mut self, schema: Option<&str>) -> TabulaResult<()> {
        self.relation.table_mut().set_schema(schema)
    }

    pub fn set_mysql_version(&mut self, version: f32) {
        self.relation.table_mut().set_mysql_version(version);
    }

    /// Look a column up the way every builder does: in a join, the left
    /// side, then the right side, then the merged columns.
    pub fn resolve(&self, key: &ColumnKey) -> Option<Column> {
        match &self.relation {
            Relation::Table(t) => t.get_col(key).cloned(),
            Relation::Join(join) => join.resolve(key),
        }
    }

    fn finish(&mut self, query_type: QueryType, sql: String, affected: Vec<String>) -> String {
        debug!("{} on '{}': {}", query_type, self.relation.name(), sql);
        self.query_type = Some(query_type);
        self.affected_columns = affected;
        self.sql = sql;
        self.sql.clone()
    }
}

impl From<&Query> for Relation {
    fn from(query: &Query) -> Self {
        query.relation.clone()
    }
}

impl From<Query> for Relation {
    fn from(query: Query) -> Self {
        query.relation
    }
}

impl From<&Query> for crate::table::ReferenceTarget {
    fn from(query: &Query) -> Self {
        crate::table::ReferenceTarget::Relation(query.relation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_query_type() {
        let mut query = Query::for_table("users").unwrap();
        assert_eq!(query.query_type(), None);
        query.set_query_type("SELECT").unwrap();
        assert_eq!(query.query_type(), Some(QueryType::Select));
        assert_eq!(
            query.set_query_type("merge"),
            Err(TabulaError::UnsupportedQueryType("merge".into()))
        );
        assert_eq!(query.query_type(), Some(QueryType::Select));
    }

    #[test]
    fn test_for_table_validates_name() {
        assert!(Query::for_table("users; drop").is_err());
    }

    #[test]
    fn test_query_as_reference_target() {
        use crate::column::ColumnSpec;
        use crate::join::{JoinAliases, JoinTable, JoinType};

        let mut users = Table::new("users").unwrap();
        users.add_column("id", ColumnSpec::new("int").primary()).unwrap();
        let users_query = Query::new(users.clone());

        let mut orders = Table::new("orders").unwrap();
        orders.add_column("user_id", ColumnSpec::new("int")).unwrap();
        assert!(orders.add_reference("user_id", &users_query, "id", None, None));
        let fk = orders.get_foreign_key("fk_orders_user_id").unwrap();
        assert_eq!(fk.source_name(), Some("users"));

        let join = JoinTable::new(users, orders, JoinType::Inner, &JoinAliases::default());
        let mut items = Table::new("items").unwrap();
        items.add_column("user_id", ColumnSpec::new("int")).unwrap();
        assert!(!items.add_reference("user_id", &Query::new(join), "id", None, None));
        assert!(items.foreign_keys().is_empty());
    }
}
