//! Foreign key constraints between two tables.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::column::Column;
use crate::error::{TabulaError, TabulaResult};
use crate::ident::validate_name;
use crate::table::Table;

/// Referential action for `on delete` / `on update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReferenceAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl ReferenceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceAction::Cascade => "cascade",
            ReferenceAction::Restrict => "restrict",
            ReferenceAction::SetNull => "set null",
            ReferenceAction::SetDefault => "set default",
            ReferenceAction::NoAction => "no action",
        }
    }
}

impl std::fmt::Display for ReferenceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceAction {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], " ");
        match normalized.as_str() {
            "cascade" => Ok(ReferenceAction::Cascade),
            "restrict" => Ok(ReferenceAction::Restrict),
            "set null" => Ok(ReferenceAction::SetNull),
            "set default" => Ok(ReferenceAction::SetDefault),
            "no action" => Ok(ReferenceAction::NoAction),
            _ => Err(TabulaError::Config(format!("unknown reference action '{}'", s))),
        }
    }
}

impl TryFrom<String> for ReferenceAction {
    type Error = TabulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReferenceAction> for String {
    fn from(action: ReferenceAction) -> Self {
        action.as_str().to_string()
    }
}

/// A named reference from columns of an owner table to columns of a source
/// table.
///
/// Both tables are held as snapshots (columns only) so the key can resolve
/// and type-check column pairs without pointing back into its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    name: String,
    owner: Option<Table>,
    source: Option<Table>,
    owner_cols: Vec<String>,
    source_cols: Vec<String>,
    on_delete: Option<ReferenceAction>,
    on_update: Option<ReferenceAction>,
}

impl ForeignKey {
    /// Create an empty key; tables are set later with
    /// [`ForeignKey::set_owner`] and [`ForeignKey::set_source`].
    pub fn new(name: &str) -> TabulaResult<Self> {
        Ok(Self {
            name: validate_name(name)?,
            owner: None,
            source: None,
            owner_cols: Vec::new(),
            source_cols: Vec::new(),
            on_delete: None,
            on_update: None,
        })
    }

    pub fn with_tables(name: &str, owner: &Table, source: &Table) -> TabulaResult<Self> {
        let mut fk = Self::new(name)?;
        fk.set_owner(owner);
        fk.set_source(source);
        Ok(fk)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&Table> {
        self.owner.as_ref()
    }

    pub fn source(&self) -> Option<&Table> {
        self.source.as_ref()
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.owner.as_ref().map(Table::name)
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().map(Table::name)
    }

    /// Replacing the owner drops the existing references.
    pub fn set_owner(&mut self, owner: &Table) {
        if self.owner_name() != Some(owner.name()) {
            self.clear_references();
        }
        self.owner = Some(owner.snapshot());
    }

    /// Replacing the source drops the existing references.
    pub fn set_source(&mut self, source: &Table) {
        if self.source_name() != Some(source.name()) {
            self.clear_references();
        }
        self.source = Some(source.snapshot());
    }

    /// Follow a rename or schema change of `table`, keeping the references.
    pub(crate) fn retarget(&mut self, previous: &str, table: &Table) {
        if self.owner_name() == Some(previous) {
            self.owner = Some(table.snapshot());
        }
        if self.source_name() == Some(previous) {
            self.source = Some(table.snapshot());
        }
    }

    /// Owner column names, in reference order.
    pub fn owner_columns(&self) -> &[String] {
        &self.owner_cols
    }

    /// Source column names, in reference order.
    pub fn source_columns(&self) -> &[String] {
        &self.source_cols
    }

    /// `(owner column, source column)` pairs.
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.owner_cols
            .iter()
            .zip(&self.source_cols)
            .map(|(o, s)| (o.as_str(), s.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.owner_cols.is_empty()
    }

    pub fn on_delete(&self) -> Option<ReferenceAction> {
        self.on_delete
    }

    pub fn on_update(&self) -> Option<ReferenceAction> {
        self.on_update
    }

    pub fn set_on_delete(&mut self, action: Option<ReferenceAction>) {
        self.on_delete = action;
    }

    pub fn set_on_update(&mut self, action: Option<ReferenceAction>) {
        self.on_update = action;
    }

    /// Reference `owner_col` to `source_col`, each given by key or name.
    ///
    /// Nothing is added when either table is missing, a column does not
    /// exist, the owner column is already referenced or the datatypes
    /// differ.
    pub fn add_reference(&mut self, owner_col: &str, source_col: &str) -> bool {
        let (Some(owner), Some(source)) = (&self.owner, &self.source) else {
            warn!("foreign key '{}' needs both an owner and a source table", self.name);
            return false;
        };
        let Some(owner_column) = lookup(owner, owner_col) else {
            warn!(
                "foreign key '{}': column '{}' not found in '{}'",
                self.name,
                owner_col,
                owner.name()
            );
            return false;
        };
        let Some(source_column) = lookup(source, source_col) else {
            warn!(
                "foreign key '{}': column '{}' not found in '{}'",
                self.name,
                source_col,
                source.name()
            );
            return false;
        };
        if owner_column.datatype() != source_column.datatype() {
            let err = TabulaError::TypeMismatch {
                left: format!(
                    "{}.{} {}",
                    owner.name(),
                    owner_column.name(),
                    owner_column.datatype()
                ),
                right: format!(
                    "{}.{} {}",
                    source.name(),
                    source_column.name(),
                    source_column.datatype()
                ),
            };
            warn!("foreign key '{}': {}", self.name, err);
            return false;
        }
        if self.owner_cols.iter().any(|c| c == owner_column.name()) {
            warn!(
                "foreign key '{}' already references '{}'",
                self.name,
                owner_column.name()
            );
            return false;
        }

        self.owner_cols.push(owner_column.name().to_string());
        self.source_cols.push(source_column.name().to_string());
        true
    }

    /// Remove the pair whose owner column matches `owner_col` (key or name).
    pub fn remove_reference(&mut self, owner_col: &str) -> bool {
        let name = self
            .owner
            .as_ref()
            .and_then(|owner| lookup(owner, owner_col))
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| owner_col.to_string());
        match self.owner_cols.iter().position(|c| *c == name) {
            Some(pos) => {
                self.owner_cols.remove(pos);
                self.source_cols.remove(pos);
                true
            }
            None => false,
        }
    }

    fn clear_references(&mut self) {
        self.owner_cols.clear();
        self.source_cols.clear();
    }
}

fn lookup<'a>(table: &'a Table, col: &str) -> Option<&'a Column> {
    table.get_col(col).or_else(|| table.get_col_by_name(col))
}
