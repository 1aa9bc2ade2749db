//! Declarative schema files.
//!
//! ```toml
//! [[tables]]
//! name = "users"
//! default-columns = ["id", "created-on"]
//!
//! [[tables.columns]]
//! key = "email"
//! datatype = "varchar(128)"
//! is-unique = true
//! ```
//!
//! TOML is the default; files ending in `.json` are read as JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::column::ColumnSpec;
use crate::config::TabulaConfig;
use crate::error::{TabulaError, TabulaResult};
use crate::foreign_key::{ForeignKey, ReferenceAction};
use crate::table::{DefaultColumn, Table};

/// Column entry: the table key plus the column spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub key: String,
    #[serde(flatten)]
    pub spec: ColumnSpec,
}

/// Foreign key entry. `columns` holds `[owner column, source column]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForeignKeyDef {
    #[serde(default)]
    pub name: Option<String>,
    pub references: String,
    pub columns: Vec<(String, String)>,
    #[serde(default)]
    pub on_delete: Option<ReferenceAction>,
    #[serde(default)]
    pub on_update: Option<ReferenceAction>,
}

/// Table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub default_columns: Vec<DefaultColumn>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

/// A whole schema file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub tables: Vec<TableDef>,
}

impl SchemaFile {
    pub fn from_toml(content: &str) -> TabulaResult<Self> {
        toml::from_str(content).map_err(|e| TabulaError::Config(format!("schema: {}", e)))
    }

    pub fn from_json(content: &str) -> TabulaResult<Self> {
        serde_json::from_str(content).map_err(|e| TabulaError::Config(format!("schema: {}", e)))
    }

    pub fn load(path: &Path) -> TabulaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let schema = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        info!("loaded {} table definitions from {}", schema.tables.len(), path.display());
        Ok(schema)
    }

    /// Build every table, in file order.
    ///
    /// Foreign keys are resolved after all tables exist, so a table may
    /// reference one declared later or itself.
    pub fn build(&self, config: &TabulaConfig) -> TabulaResult<Vec<Table>> {
        let mut tables = Vec::with_capacity(self.tables.len());
        for def in &self.tables {
            tables.push(build_table(def, config)?);
        }

        for (i, def) in self.tables.iter().enumerate() {
            for fk_def in &def.foreign_keys {
                let source = tables
                    .iter()
                    .find(|t| t.name() == fk_def.references)
                    .cloned()
                    .ok_or_else(|| {
                        TabulaError::Config(format!(
                            "table '{}' references unknown table '{}'",
                            def.name, fk_def.references
                        ))
                    })?;
                let fk = build_foreign_key(fk_def, &tables[i], &source)?;
                let name = fk.name().to_string();
                if !tables[i].add_foreign_key(fk) {
                    return Err(TabulaError::Config(format!(
                        "foreign key '{}' on '{}' was rejected",
                        name, def.name
                    )));
                }
            }
        }
        Ok(tables)
    }
}

fn build_table(def: &TableDef, config: &TabulaConfig) -> TabulaResult<Table> {
    let mut table = Table::new(&def.name)?;
    config.apply(&mut table)?;
    if let Some(schema) = &def.schema {
        table.set_schema(Some(schema))?;
    }
    if let Some(engine) = &def.engine {
        table.set_engine(engine)?;
    }
    table.set_comment(def.comment.as_deref());
    table.add_default_cols(&config.default_columns().only(&def.default_columns));
    for col in &def.columns {
        table.add_column(&col.key, col.spec.clone())?;
    }
    debug!("built table '{}' with {} columns", table.name(), table.len());
    Ok(table)
}

fn build_foreign_key(
    def: &ForeignKeyDef,
    owner: &Table,
    source: &Table,
) -> TabulaResult<ForeignKey> {
    let name = match &def.name {
        Some(name) => name.clone(),
        None => {
            let first = def.columns.first().map(|(c, _)| c.as_str()).unwrap_or("ref");
            format!("fk_{}_{}", owner.name(), first)
        }
    };
    let mut fk = ForeignKey::with_tables(&name, owner, source)?;
    for (owner_col, source_col) in &def.columns {
        if !fk.add_reference(owner_col, source_col) {
            return Err(TabulaError::Config(format!(
                "foreign key '{}': cannot reference {}.{} from {}.{}",
                name,
                source.name(),
                source_col,
                owner.name(),
                owner_col
            )));
        }
    }
    fk.set_on_delete(def.on_delete);
    fk.set_on_update(def.on_update);
    Ok(fk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::DataType;
    use pretty_assertions::assert_eq;

    const SHOP: &str = r#"
[[tables]]
name = "orders"
default-columns = ["id", "created-on"]

[[tables.columns]]
key = "user_id"
datatype = "int"

[[tables.columns]]
key = "total"
datatype = "decimal(10,2)"
default = 0

[[tables.foreign-keys]]
references = "users"
columns = [["user_id", "id"]]
on-delete = "cascade"

[[tables]]
name = "users"
engine = "MyISAM"
default-columns = ["id"]

[[tables.columns]]
key = "email"
datatype = "varchar(128)"
is-unique = true
"#;

    #[test]
    fn test_build_from_toml() {
        let tables = SchemaFile::from_toml(SHOP)
            .unwrap()
            .build(&TabulaConfig::default())
            .unwrap();
        assert_eq!(tables.len(), 2);

        let orders = &tables[0];
        let keys: Vec<_> = orders.keys().collect();
        assert_eq!(keys, vec!["id", "created_on", "user_id", "total"]);
        assert_eq!(orders.get_col("total").unwrap().datatype(), DataType::Decimal);
        assert_eq!(orders.get_col("total").unwrap().scale(), 2);

        let fk = orders.get_foreign_key("fk_orders_user_id").unwrap();
        assert_eq!(fk.source_name(), Some("users"));
        assert_eq!(fk.on_delete(), Some(ReferenceAction::Cascade));

        assert_eq!(tables[1].engine(), "MyISAM");
        assert!(tables[1].get_col("email").unwrap().is_unique());
    }

    #[test]
    fn test_unknown_reference() {
        let schema = SchemaFile::from_toml(
            r#"
[[tables]]
name = "orders"
[[tables.columns]]
key = "user_id"
datatype = "int"
[[tables.foreign-keys]]
references = "ghosts"
columns = [["user_id", "id"]]
"#,
        )
        .unwrap();
        assert!(matches!(
            schema.build(&TabulaConfig::default()),
            Err(TabulaError::Config(_))
        ));
    }

    #[test]
    fn test_bad_datatype_fails() {
        let schema = SchemaFile::from_toml(
            "[[tables]]\nname = \"t\"\n[[tables.columns]]\nkey = \"c\"\ndatatype = \"uuid\"\n",
        )
        .unwrap();
        assert_eq!(
            schema.build(&TabulaConfig::default()),
            Err(TabulaError::UnsupportedDatatype("uuid".into()))
        );
    }

    #[test]
    fn test_json() {
        let schema = SchemaFile::from_json(
            r#"{"tables": [{"name": "tags", "columns": [{"key": "label", "datatype": "char(8)"}]}]}"#,
        )
        .unwrap();
        let tables = schema.build(&TabulaConfig::default()).unwrap();
        assert_eq!(tables[0].get_col("label").unwrap().size(), 8);
    }
}
