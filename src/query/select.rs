//! `select` statements.

use tracing::warn;

use crate::column::Column;
use crate::ident::is_valid_name;
use crate::table::ColumnKey;
use crate::value::quote_ident;

use super::{Query, QueryType, Where};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One projected column, optionally renamed.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub key: ColumnKey,
    pub alias: Option<String>,
}

impl SelectColumn {
    pub fn aliased(key: impl Into<ColumnKey>, alias: &str) -> Self {
        Self {
            key: key.into(),
            alias: Some(alias.to_string()),
        }
    }
}

impl From<ColumnKey> for SelectColumn {
    fn from(key: ColumnKey) -> Self {
        Self { key, alias: None }
    }
}

impl From<&str> for SelectColumn {
    fn from(key: &str) -> Self {
        ColumnKey::from(key).into()
    }
}

impl From<usize> for SelectColumn {
    fn from(index: usize) -> Self {
        ColumnKey::from(index).into()
    }
}

/// One `order by` entry. Without a direction the server default applies.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub key: ColumnKey,
    pub direction: Option<SortOrder>,
}

impl OrderBy {
    /// Unknown direction tokens are dropped.
    pub fn new(key: impl Into<ColumnKey>, direction: &str) -> Self {
        Self {
            key: key.into(),
            direction: SortOrder::from_token(direction),
        }
    }
}

/// Options for [`Query::select`].
///
/// `limit` and `offset` of zero mean "not set".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub columns: Vec<SelectColumn>,
    pub filter: Where,
    pub group_by: Vec<ColumnKey>,
    pub order_by: Vec<OrderBy>,
    pub limit: u64,
    pub offset: u64,
    pub distinct: bool,
    pub map_result_to: Option<String>,
    pub as_view: Option<String>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, key: impl Into<ColumnKey>) -> Self {
        self.columns.push(SelectColumn {
            key: key.into(),
            alias: None,
        });
        self
    }

    pub fn column_as(mut self, key: impl Into<ColumnKey>, alias: &str) -> Self {
        self.columns.push(SelectColumn::aliased(key, alias));
        self
    }

    pub fn filter(mut self, filter: Where) -> Self {
        self.filter = filter;
        self
    }

    pub fn group_by(mut self, key: impl Into<ColumnKey>) -> Self {
        self.group_by.push(key.into());
        self
    }

    pub fn order_by(mut self, key: impl Into<ColumnKey>, direction: &str) -> Self {
        self.order_by.push(OrderBy::new(key, direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn map_result_to(mut self, target: &str) -> Self {
        self.map_result_to = Some(target.to_string());
        self
    }

    pub fn as_view(mut self, view: &str) -> Self {
        self.as_view = Some(view.to_string());
        self
    }
}

impl Query {
    /// Build a `select`.
    ///
    /// Without columns a plain table selects `*`; a join lists every merged
    /// column qualified with its table. With `as_view` the select is
    /// wrapped in `create view`.
    pub fn select(&mut self, options: &SelectOptions) -> String {
        let qualify = self.relation.is_join();
        let mut affected = Vec::new();

        let mut projection: Vec<String> = if options.columns.is_empty() {
            if qualify {
                self.table()
                    .columns()
                    .map(|col| {
                        affected.push(col.name().to_string());
                        projection_item(col, None, true)
                    })
                    .collect()
            } else {
                Vec::new()
            }
        } else {
            let mut items = Vec::new();
            for wanted in &options.columns {
                let Some(col) = self.resolve(&wanted.key) else {
                    warn!(
                        "select: column '{}' not found in '{}'",
                        wanted.key,
                        self.relation.name()
                    );
                    continue;
                };
                affected.push(col.name().to_string());
                items.push(projection_item(&col, wanted.alias.as_deref(), qualify));
            }
            items
        };
        if projection.is_empty() {
            projection.push("*".to_string());
        }

        let mut sql = format!(
            "select {}{} from {}",
            if options.distinct { "distinct " } else { "" },
            projection.join(", "),
            self.relation.from_clause()
        );
        let filter = self.create_where_conditions(&options.filter);
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(&filter);
        }

        let group_by: Vec<String> = options
            .group_by
            .iter()
            .filter_map(|key| self.resolve(key))
            .map(|col| col.sql_ref(qualify))
            .collect();
        if !group_by.is_empty() {
            sql.push_str(&format!(" group by {}", group_by.join(", ")));
        }

        let order_by: Vec<String> = options
            .order_by
            .iter()
            .filter_map(|order| {
                let col = self.resolve(&order.key)?;
                Some(match order.direction {
                    Some(direction) => format!("{} {}", col.sql_ref(qualify), direction.as_str()),
                    None => col.sql_ref(qualify),
                })
            })
            .collect();
        if !order_by.is_empty() {
            sql.push_str(&format!(" order by {}", order_by.join(", ")));
        }

        if options.limit > 0 {
            sql.push_str(&format!(" limit {}", options.limit));
            if options.offset > 0 {
                sql.push_str(&format!(" offset {}", options.offset));
            }
        }

        let mut query_type = QueryType::Select;
        match options.as_view.as_deref() {
            Some(view) if is_valid_name(view) => {
                sql = format!("create or replace view {} as ({})", quote_ident(view), sql);
                query_type = QueryType::Create;
            }
            Some(view) => warn!("ignoring invalid view name '{}'", view),
            None => {}
        }
        sql.push(';');

        self.map_result_to = options.map_result_to.clone();
        self.finish(query_type, sql, affected)
    }

    /// `select max(col)`. Only the filter of `options` is used.
    pub fn select_max(
        &mut self,
        key: impl Into<ColumnKey>,
        alias: Option<&str>,
        options: &SelectOptions,
    ) -> String {
        self.aggregate("max", key.into(), alias, &options.filter)
    }

    /// `select min(col)`. Only the filter of `options` is used.
    pub fn select_min(
        &mut self,
        key: impl Into<ColumnKey>,
        alias: Option<&str>,
        options: &SelectOptions,
    ) -> String {
        self.aggregate("min", key.into(), alias, &options.filter)
    }

    /// `select count(*) as `count``.
    pub fn count(&mut self, filter: &Where) -> String {
        let mut sql = format!("select count(*) as `count` from {}", self.relation.from_clause());
        let filter = self.create_where_conditions(filter);
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(&filter);
        }
        sql.push(';');
        self.finish(QueryType::Select, sql, Vec::new())
    }

    fn aggregate(
        &mut self,
        func: &str,
        key: ColumnKey,
        alias: Option<&str>,
        filter: &Where,
    ) -> String {
        let Some(col) = self.resolve(&key) else {
            warn!("{}: column '{}' not found in '{}'", func, key, self.relation.name());
            return self.finish(QueryType::Select, String::new(), Vec::new());
        };
        let mut sql = format!("select {}({})", func, col.sql_ref(self.relation.is_join()));
        match alias {
            Some(alias) if is_valid_name(alias) => {
                sql.push_str(&format!(" as {}", quote_ident(alias)))
            }
            Some(alias) => warn!("ignoring invalid alias '{}'", alias),
            None => {}
        }
        sql.push_str(&format!(" from {}", self.relation.from_clause()));
        let filter = self.create_where_conditions(filter);
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(&filter);
        }
        sql.push(';');
        self.finish(QueryType::Select, sql, vec![col.name().to_string()])
    }
}

fn projection_item(col: &Column, alias: Option<&str>, qualify: bool) -> String {
    let alias = match alias {
        Some(alias) if is_valid_name(alias) => Some(alias),
        Some(alias) => {
            warn!("ignoring invalid alias '{}'", alias);
            col.alias()
        }
        None => col.alias(),
    };
    match alias {
        Some(alias) => format!("{} as {}", col.sql_ref(qualify), quote_ident(alias)),
        None => col.sql_ref(qualify),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnSpec;
    use crate::table::Table;
    use pretty_assertions::assert_eq;

    fn products() -> Query {
        let mut t = Table::new("products").unwrap();
        t.add_column("id", ColumnSpec::new("int").primary().auto_increment()).unwrap();
        t.add_column("name", ColumnSpec::new("varchar(80)")).unwrap();
        t.add_column("price", ColumnSpec::new("decimal(10,2)")).unwrap();
        t.add_column("category", ColumnSpec::new("varchar(20)")).unwrap();
        Query::new(t)
    }

    #[test]
    fn test_select_star() {
        let mut q = products();
        assert_eq!(q.select(&SelectOptions::new()), "select * from `products`;");
        assert_eq!(q.query_type(), Some(QueryType::Select));
    }

    #[test]
    fn test_select_full() {
        let mut q = products();
        let options = SelectOptions::new()
            .column("name")
            .column_as("price", "cost")
            .filter(Where::new().and("price", ">", 5))
            .order_by("price", "DESC")
            .order_by("name", "sideways")
            .limit(10)
            .offset(20)
            .distinct();
        assert_eq!(
            q.select(&options),
            "select distinct `name`, `price` as `cost` from `products` where `price` > '5' \
             order by `price` desc, `name` limit 10 offset 20;"
        );
        assert_eq!(q.affected_columns(), &["name".to_string(), "price".to_string()]);
    }

    #[test]
    fn test_offset_needs_limit() {
        let mut q = products();
        let sql = q.select(&SelectOptions::new().offset(5));
        assert_eq!(sql, "select * from `products`;");
    }

    #[test]
    fn test_group_by() {
        let mut q = products();
        let sql = q.select(&SelectOptions::new().column("category").group_by("category"));
        assert_eq!(sql, "select `category` from `products` group by `category`;");
    }

    #[test]
    fn test_select_max_ignores_limit() {
        let mut q = products();
        let options = SelectOptions::new().limit(3).offset(1);
        assert_eq!(
            q.select_max("price", Some("highest"), &options),
            "select max(`price`) as `highest` from `products`;"
        );
        assert_eq!(
            q.select_min("price", None, &SelectOptions::new().filter(Where::new().eq("category", "tea"))),
            "select min(`price`) from `products` where `category` = 'tea';"
        );
    }

    #[test]
    fn test_count_and_view() {
        let mut q = products();
        assert_eq!(q.count(&Where::new()), "select count(*) as `count` from `products`;");

        let sql = q.select(&SelectOptions::new().column("name").as_view("product_names"));
        assert_eq!(
            sql,
            "create or replace view `product_names` as (select `name` from `products`);"
        );
        assert_eq!(q.query_type(), Some(QueryType::Create));
    }

    #[test]
    fn test_map_result_to_recorded() {
        let mut q = products();
        q.select(&SelectOptions::new().map_result_to("Product"));
        assert_eq!(q.map_result_to(), Some("Product"));
    }
}
