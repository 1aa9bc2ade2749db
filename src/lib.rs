//! # tabula — MySQL tables as values, SQL as output
//!
//! tabula models MySQL tables, columns and foreign keys in memory and
//! generates the SQL to create, query and change them. It never talks to a
//! server; every operation returns the statement text.
//!
//! ## Quick Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut users = Table::new("users")?;
//! users.add_default_cols(&DefaultColumns::default());
//! users.add_column("email", ColumnSpec::new("varchar(128)").unique())?;
//!
//! let mut query = Query::new(users);
//! let sql = query.select(
//!     &SelectOptions::new()
//!         .column("email")
//!         .filter(Where::new().eq("id", 7))
//!         .limit(1),
//! );
//! assert_eq!(sql, "select `email` from `users` where `id` = 7 limit 1;");
//! # Ok::<(), tabula::TabulaError>(())
//! ```
//!
//! ## Layout
//!
//! | Module        | Role                                        |
//! |---------------|---------------------------------------------|
//! | `column`      | datatype rules, value cleaning, definitions |
//! | `table`       | keyed column set, defaults, foreign keys    |
//! | `join`        | merged relations with collision aliases     |
//! | `query`       | select / insert / update / delete / DDL     |
//! | `schema`      | declarative TOML or JSON schema files       |

pub mod column;
pub mod config;
pub mod datatype;
pub mod error;
pub mod foreign_key;
pub mod ident;
pub mod join;
pub mod parser;
pub mod query;
pub mod schema;
pub mod table;
pub mod value;

pub use error::{TabulaError, TabulaResult};

pub mod prelude {
    pub use crate::column::{Column, ColumnSpec};
    pub use crate::config::TabulaConfig;
    pub use crate::datatype::DataType;
    pub use crate::error::*;
    pub use crate::foreign_key::{ForeignKey, ReferenceAction};
    pub use crate::join::{JoinAliases, JoinTable, JoinType, Relation};
    pub use crate::parser::{parse_filter, parse_type_decl};
    pub use crate::query::{
        AlterOp, ComparisonOp, Condition, CreateOptions, JoinOptions, Joiner, OrderBy, Query,
        QueryType, SelectColumn, SelectOptions, SortOrder, Where,
    };
    pub use crate::schema::SchemaFile;
    pub use crate::table::{ColumnKey, DefaultColumn, DefaultColumns, Table};
    pub use crate::value::{Record, Value};
}
