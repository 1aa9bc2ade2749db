//! Tables: an ordered, keyed set of columns plus foreign keys.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::column::{Column, ColumnSpec, DEFAULT_MYSQL_VERSION, charset_for, collation_for};
use crate::error::{TabulaError, TabulaResult};
use crate::foreign_key::{ForeignKey, ReferenceAction};
use crate::ident::validate_name;
use crate::join::Relation;
use crate::value::{Value, quote_ident};

pub const DEFAULT_ENGINE: &str = "InnoDB";

/// Column lookup by caller key or by position.
///
/// A key that is not found but parses as an integer falls back to
/// positional lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    Key(String),
    Index(usize),
}

impl From<&str> for ColumnKey {
    fn from(key: &str) -> Self {
        ColumnKey::Key(key.to_string())
    }
}

impl From<String> for ColumnKey {
    fn from(key: String) -> Self {
        ColumnKey::Key(key)
    }
}

impl From<&String> for ColumnKey {
    fn from(key: &String) -> Self {
        ColumnKey::Key(key.clone())
    }
}

impl From<usize> for ColumnKey {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

impl From<&ColumnKey> for ColumnKey {
    fn from(key: &ColumnKey) -> Self {
        key.clone()
    }
}

impl std::fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKey::Key(k) => f.write_str(k),
            ColumnKey::Index(i) => write!(f, "#{}", i),
        }
    }
}

/// What [`Table::add_column`] accepts: a finished column or a spec to build.
#[derive(Debug, Clone)]
pub enum ColumnSource {
    Column(Column),
    Spec(ColumnSpec),
}

impl From<Column> for ColumnSource {
    fn from(col: Column) -> Self {
        ColumnSource::Column(col)
    }
}

impl From<ColumnSpec> for ColumnSource {
    fn from(spec: ColumnSpec) -> Self {
        ColumnSource::Spec(spec)
    }
}

/// The standard bookkeeping columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultColumn {
    Id,
    CreatedOn,
    LastUpdated,
}

/// Which default columns to add and under which keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DefaultColumns {
    pub id: bool,
    pub created_on: bool,
    pub last_updated: bool,
    pub id_key: String,
    pub created_on_key: String,
    pub last_updated_key: String,
}

impl Default for DefaultColumns {
    fn default() -> Self {
        Self {
            id: true,
            created_on: true,
            last_updated: true,
            id_key: "id".to_string(),
            created_on_key: "created_on".to_string(),
            last_updated_key: "last_updated".to_string(),
        }
    }
}

impl DefaultColumns {
    /// Only the listed columns, with the keys of `self`.
    pub fn only(&self, which: &[DefaultColumn]) -> Self {
        Self {
            id: which.contains(&DefaultColumn::Id),
            created_on: which.contains(&DefaultColumn::CreatedOn),
            last_updated: which.contains(&DefaultColumn::LastUpdated),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct DefaultKeys {
    id: Option<String>,
    created_on: Option<String>,
    last_updated: Option<String>,
}

impl DefaultKeys {
    fn slot(&self, which: DefaultColumn) -> &Option<String> {
        match which {
            DefaultColumn::Id => &self.id,
            DefaultColumn::CreatedOn => &self.created_on,
            DefaultColumn::LastUpdated => &self.last_updated,
        }
    }

    fn slot_mut(&mut self, which: DefaultColumn) -> &mut Option<String> {
        match which {
            DefaultColumn::Id => &mut self.id,
            DefaultColumn::CreatedOn => &mut self.created_on,
            DefaultColumn::LastUpdated => &mut self.last_updated,
        }
    }

    fn forget(&mut self, key: &str) {
        for slot in [&mut self.id, &mut self.created_on, &mut self.last_updated] {
            if slot.as_deref() == Some(key) {
                *slot = None;
            }
        }
    }
}

/// Where [`Table::add_reference`] finds the referenced table.
#[derive(Debug, Clone)]
pub enum ReferenceTarget {
    Table(Table),
    Relation(Relation),
    Factory(fn() -> Table),
}

impl ReferenceTarget {
    fn resolve(self) -> Option<Table> {
        match self {
            ReferenceTarget::Table(t) => Some(t),
            ReferenceTarget::Relation(Relation::Table(t)) => Some(t),
            ReferenceTarget::Relation(Relation::Join(join)) => {
                warn!("cannot reference join '{}'", join.table().name());
                None
            }
            ReferenceTarget::Factory(build) => Some(build()),
        }
    }
}

impl From<Table> for ReferenceTarget {
    fn from(table: Table) -> Self {
        ReferenceTarget::Table(table)
    }
}

impl From<&Table> for ReferenceTarget {
    fn from(table: &Table) -> Self {
        ReferenceTarget::Table(table.clone())
    }
}

impl From<Relation> for ReferenceTarget {
    fn from(relation: Relation) -> Self {
        ReferenceTarget::Relation(relation)
    }
}

impl From<fn() -> Table> for ReferenceTarget {
    fn from(build: fn() -> Table) -> Self {
        ReferenceTarget::Factory(build)
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    schema: Option<String>,
    columns: Vec<(String, Column)>,
    foreign_keys: Vec<ForeignKey>,
    engine: String,
    comment: Option<String>,
    mysql_version: f32,
    default_keys: DefaultKeys,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            name: "table".to_string(),
            schema: None,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            engine: DEFAULT_ENGINE.to_string(),
            comment: None,
            mysql_version: DEFAULT_MYSQL_VERSION,
            default_keys: DefaultKeys::default(),
        }
    }
}

impl Table {
    pub fn new(name: &str) -> TabulaResult<Self> {
        Ok(Self {
            name: validate_name(name)?,
            ..Self::default()
        })
    }

    /// Merged table of a join; `name` is built from already-valid names.
    pub(crate) fn merged(name: String, mysql_version: f32) -> Self {
        Self {
            name,
            mysql_version,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the table; attached columns follow.
    pub fn set_name(&mut self, name: &str) -> TabulaResult<()> {
        let name = validate_name(name)?;
        let previous = std::mem::replace(&mut self.name, name);
        for (_, col) in &mut self.columns {
            col.set_owner(&self.name);
        }
        self.retarget_foreign_keys(&previous);
        Ok(())
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn set_schema(&mut self, schema: Option<&str>) -> TabulaResult<()> {
        self.schema = schema.map(validate_name).transpose()?;
        let name = self.name.clone();
        self.retarget_foreign_keys(&name);
        Ok(())
    }

    /// `` `schema`.`name` `` or `` `name` ``.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&self.name)),
            None => quote_ident(&self.name),
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn set_engine(&mut self, engine: &str) -> TabulaResult<()> {
        self.engine = validate_name(engine)?;
        Ok(())
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<&str>) {
        self.comment = comment.map(str::to_string);
    }

    pub fn mysql_version(&self) -> f32 {
        self.mysql_version
    }

    /// Set the engine version on the table and every column.
    pub fn set_mysql_version(&mut self, version: f32) {
        self.mysql_version = version;
        for (_, col) in &mut self.columns {
            col.set_mysql_version(version);
        }
    }

    pub fn charset(&self) -> &'static str {
        charset_for(self.mysql_version)
    }

    pub fn collation(&self) -> &'static str {
        collation_for(self.mysql_version)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `(key, column)` pairs in declaration order.
    pub fn entries(&self) -> &[(String, Column)] {
        &self.columns
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(|(_, c)| c)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// Position of a column by key, falling back to a numeric index.
    pub fn position(&self, key: impl Into<ColumnKey>) -> Option<usize> {
        match key.into() {
            ColumnKey::Key(key) => self
                .columns
                .iter()
                .position(|(k, _)| *k == key)
                .or_else(|| key.parse::<usize>().ok().filter(|i| *i < self.columns.len())),
            ColumnKey::Index(i) => (i < self.columns.len()).then_some(i),
        }
    }

    pub fn has_col(&self, key: impl Into<ColumnKey>) -> bool {
        self.position(key).is_some()
    }

    pub fn get_col(&self, key: impl Into<ColumnKey>) -> Option<&Column> {
        self.position(key).map(|i| &self.columns[i].1)
    }

    /// Mutable access to a column.
    ///
    /// Key flags are recomputed when the guard drops, and a rename that
    /// clashes with another column is rolled back. Use
    /// [`Table::update_column`] to get the clash as an error instead.
    pub fn get_col_mut(&mut self, key: impl Into<ColumnKey>) -> Option<ColumnMut<'_>> {
        let pos = self.position(key)?;
        let name = self.columns[pos].1.name().to_string();
        Some(ColumnMut {
            table: self,
            pos,
            name,
        })
    }

    pub fn get_col_by_name(&self, name: &str) -> Option<&Column> {
        self.columns().find(|c| c.name() == name)
    }

    /// Key under which the column named `name` is stored.
    pub fn key_of(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, c)| c.name() == name)
            .map(|(k, _)| k.as_str())
    }

    /// Add a column under `key`.
    ///
    /// Fails when the key or the column name is already taken, or when a
    /// spec does not build.
    pub fn add_column(&mut self, key: &str, column: impl Into<ColumnSource>) -> TabulaResult<()> {
        let key = validate_name(key)?;
        if self.columns.iter().any(|(k, _)| *k == key) {
            return Err(TabulaError::DuplicateColumn(key));
        }
        let mut column = match column.into() {
            ColumnSource::Column(col) => col,
            ColumnSource::Spec(spec) => spec.build(&key)?,
        };
        if self.get_col_by_name(column.name()).is_some() {
            return Err(TabulaError::DuplicateColumn(column.name().to_string()));
        }

        column.attach(&self.name, self.columns.len(), self.mysql_version);
        debug!("table '{}': added column '{}' as '{}'", self.name, column.name(), key);
        self.columns.push((key, column));
        self.refresh_primary_keys();
        Ok(())
    }

    /// Remove a column, reindexing the ones after it.
    pub fn remove_column(&mut self, key: impl Into<ColumnKey>) -> Option<Column> {
        let pos = self.position(key)?;
        let (key, mut col) = self.columns.remove(pos);
        col.detach();
        for (i, (_, c)) in self.columns.iter_mut().enumerate().skip(pos) {
            c.set_index(i);
        }
        self.default_keys.forget(&key);
        self.refresh_primary_keys();
        Some(col)
    }

    /// Push a join column as-is, keeping its source owner.
    pub(crate) fn insert_merged(&mut self, key: String, mut col: Column) -> bool {
        if self.columns.iter().any(|(k, _)| *k == key) {
            return false;
        }
        col.set_index(self.columns.len());
        self.columns.push((key, col));
        true
    }

    /// Apply a change to a column in place, then recompute key flags.
    pub fn update_column<F>(&mut self, key: impl Into<ColumnKey>, change: F) -> TabulaResult<()>
    where
        F: FnOnce(&mut Column) -> TabulaResult<()>,
    {
        let key = key.into();
        let pos = self
            .position(key.clone())
            .ok_or_else(|| TabulaError::ColumnNotFound(key.to_string()))?;
        let mut next = self.columns[pos].1.clone();
        change(&mut next)?;
        if self.name_taken(next.name(), pos) {
            return Err(TabulaError::DuplicateColumn(next.name().to_string()));
        }
        self.columns[pos].1 = next;
        self.refresh_primary_keys();
        Ok(())
    }

    pub fn primary_key_cols(&self) -> Vec<&Column> {
        self.columns().filter(|c| c.is_primary()).collect()
    }

    pub fn primary_key_count(&self) -> usize {
        self.columns().filter(|c| c.is_primary()).count()
    }

    /// More than one primary column makes every one of them composite.
    fn name_taken(&self, name: &str, except: usize) -> bool {
        self.columns
            .iter()
            .enumerate()
            .any(|(i, (_, c))| i != except && c.name() == name)
    }

    /// Point this table's foreign keys at its current name and schema.
    fn retarget_foreign_keys(&mut self, previous: &str) {
        if self.foreign_keys.is_empty() {
            return;
        }
        let current = self.snapshot();
        for fk in &mut self.foreign_keys {
            fk.retarget(previous, &current);
        }
    }

    fn refresh_primary_keys(&mut self) {
        let composite = self.primary_key_count() > 1;
        for (_, col) in &mut self.columns {
            col.set_composite_key(composite);
        }
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn get_foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.name() == name)
    }

    /// Attach a foreign key owned by this table.
    ///
    /// Keys without references, owned elsewhere, or whose name is taken are
    /// not added.
    pub fn add_foreign_key(&mut self, mut fk: ForeignKey) -> bool {
        match fk.owner_name() {
            Some(owner) if owner != self.name => {
                warn!("foreign key '{}' belongs to '{}', not '{}'", fk.name(), owner, self.name);
                return false;
            }
            Some(_) => {}
            None => fk.set_owner(self),
        }
        if fk.is_empty() {
            warn!("foreign key '{}' has no references", fk.name());
            return false;
        }
        if self.get_foreign_key(fk.name()).is_some() {
            warn!("table '{}' already has foreign key '{}'", self.name, fk.name());
            return false;
        }
        self.foreign_keys.push(fk);
        true
    }

    pub fn remove_foreign_key(&mut self, name: &str) -> Option<ForeignKey> {
        let pos = self.foreign_keys.iter().position(|fk| fk.name() == name)?;
        Some(self.foreign_keys.remove(pos))
    }

    /// Reference `owner_col` of this table to `source_col` of `target`.
    ///
    /// The key is named `fk_<table>_<owner_col>`. Returns false, leaving the
    /// table unchanged, when the reference cannot be made.
    pub fn add_reference(
        &mut self,
        owner_col: &str,
        target: impl Into<ReferenceTarget>,
        source_col: &str,
        on_delete: Option<ReferenceAction>,
        on_update: Option<ReferenceAction>,
    ) -> bool {
        let Some(source) = target.into().resolve() else {
            return false;
        };
        let name = format!("fk_{}_{}", self.name, owner_col);
        let mut fk = match ForeignKey::with_tables(&name, self, &source) {
            Ok(fk) => fk,
            Err(e) => {
                warn!("cannot reference '{}': {}", source.name(), e);
                return false;
            }
        };
        if !fk.add_reference(owner_col, source_col) {
            return false;
        }
        fk.set_on_delete(on_delete);
        fk.set_on_update(on_update);
        self.add_foreign_key(fk)
    }

    /// Add the requested default columns that are not present yet.
    ///
    /// Returns how many were added; calling it twice adds nothing the
    /// second time.
    pub fn add_default_cols(&mut self, options: &DefaultColumns) -> usize {
        let mut added = 0;
        if options.id {
            let spec = ColumnSpec::new("int").size(11).primary().auto_increment();
            added += self.add_default(DefaultColumn::Id, &options.id_key, spec) as usize;
        }
        if options.created_on {
            let spec = ColumnSpec::new("timestamp").default_value(Value::Null);
            added +=
                self.add_default(DefaultColumn::CreatedOn, &options.created_on_key, spec) as usize;
        }
        if options.last_updated {
            let spec = ColumnSpec::new("datetime").nullable().auto_update();
            let key = &options.last_updated_key;
            added += self.add_default(DefaultColumn::LastUpdated, key, spec) as usize;
        }
        added
    }

    fn add_default(&mut self, which: DefaultColumn, key: &str, spec: ColumnSpec) -> bool {
        if self.default_keys.slot(which).is_some() {
            return false;
        }
        match self.add_column(key, spec) {
            Ok(()) => {
                *self.default_keys.slot_mut(which) = Some(key.to_string());
                true
            }
            Err(e) => {
                warn!("table '{}': default column '{}' not added: {}", self.name, key, e);
                false
            }
        }
    }

    /// Key of a registered default column.
    pub fn default_key(&self, which: DefaultColumn) -> Option<&str> {
        self.default_keys.slot(which).as_deref()
    }

    pub fn default_column(&self, which: DefaultColumn) -> Option<&Column> {
        self.default_key(which).and_then(|k| self.get_col(k))
    }

    /// Copy without foreign keys, as stored inside a [`ForeignKey`].
    pub fn snapshot(&self) -> Table {
        Table {
            name: self.name.clone(),
            schema: self.schema.clone(),
            columns: self.columns.clone(),
            foreign_keys: Vec::new(),
            engine: self.engine.clone(),
            comment: self.comment.clone(),
            mysql_version: self.mysql_version,
            default_keys: self.default_keys.clone(),
        }
    }
}

/// Guard returned by [`Table::get_col_mut`].
pub struct ColumnMut<'a> {
    table: &'a mut Table,
    pos: usize,
    name: String,
}

impl std::ops::Deref for ColumnMut<'_> {
    type Target = Column;

    fn deref(&self) -> &Column {
        &self.table.columns[self.pos].1
    }
}

impl std::ops::DerefMut for ColumnMut<'_> {
    fn deref_mut(&mut self) -> &mut Column {
        &mut self.table.columns[self.pos].1
    }
}

impl Drop for ColumnMut<'_> {
    fn drop(&mut self) {
        let table = &mut *self.table;
        let renamed = table.columns[self.pos].1.name().to_string();
        if renamed != self.name && table.name_taken(&renamed, self.pos) {
            warn!(
                "column '{}' already exists in '{}', keeping '{}'",
                renamed, table.name, self.name
            );
            table.columns[self.pos].1.restore_name(std::mem::take(&mut self.name));
        }
        table.refresh_primary_keys();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::DataType;
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        let mut t = Table::new("users").unwrap();
        t.add_default_cols(&DefaultColumns::default());
        t.add_column("email", ColumnSpec::new("varchar(255)").unique()).unwrap();
        t
    }

    #[test]
    fn test_default_cols_idempotent() {
        let mut t = users();
        assert_eq!(t.len(), 4);
        assert_eq!(t.add_default_cols(&DefaultColumns::default()), 0);
        assert_eq!(t.len(), 4);

        let id = t.default_column(DefaultColumn::Id).unwrap();
        assert!(id.is_primary());
        assert!(id.is_auto_increment());
        assert_eq!(
            t.default_column(DefaultColumn::CreatedOn).unwrap().default_value(),
            Some("current_timestamp")
        );
        assert!(t.default_column(DefaultColumn::LastUpdated).unwrap().is_auto_update());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut t = users();
        assert_eq!(
            t.add_column("email", ColumnSpec::new("text")),
            Err(TabulaError::DuplicateColumn("email".into()))
        );
        assert_eq!(
            t.add_column("mail", ColumnSpec::new("text").named("email")),
            Err(TabulaError::DuplicateColumn("email".into()))
        );
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_lookup_by_key_index_and_numeric_key() {
        let t = users();
        assert_eq!(t.get_col("email").unwrap().name(), "email");
        assert_eq!(t.get_col(3).unwrap().name(), "email");
        assert_eq!(t.get_col("0").unwrap().name(), "id");
        assert!(t.get_col(9).is_none());
        assert_eq!(t.get_col("email").unwrap().owner(), Some("users"));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut t = users();
        let removed = t.remove_column("created_on").unwrap();
        assert_eq!(removed.index(), None);
        assert_eq!(removed.owner(), None);
        let indexes: Vec<_> = t.columns().map(|c| c.index().unwrap()).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(t.default_key(DefaultColumn::CreatedOn), None);
        assert!(t.remove_column("nope").is_none());
    }

    #[test]
    fn test_remove_by_position() {
        let mut t = users();
        let removed = t.remove_column(1).unwrap();
        assert_eq!(removed.name(), "created_on");
        assert_eq!(t.default_key(DefaultColumn::CreatedOn), None);
        let keys: Vec<_> = t.keys().collect();
        assert_eq!(keys, vec!["id", "last_updated", "email"]);

        // A numeric key that is not a column key is read as a position.
        assert_eq!(t.remove_column("2").unwrap().name(), "email");
        assert!(t.remove_column(5).is_none());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_col_mut_keeps_keys_consistent() {
        let mut t = users();
        t.get_col_mut("email").unwrap().set_primary(true);
        assert_eq!(t.primary_key_count(), 2);
        assert!(t.get_col("id").unwrap().is_composite_key());
        assert!(t.get_col("email").unwrap().is_composite_key());

        t.get_col_mut("email").unwrap().set_name("id").unwrap();
        assert_eq!(t.get_col("email").unwrap().name(), "email");

        {
            let mut col = t.get_col_mut("email").unwrap();
            col.set_name("contact").unwrap();
            col.set_primary(false);
        }
        assert_eq!(t.get_col("email").unwrap().name(), "contact");
        assert_eq!(t.primary_key_count(), 1);
        assert!(!t.get_col("id").unwrap().is_composite_key());
        assert!(t.get_col_mut("missing").is_none());
    }

    #[test]
    fn test_composite_primary_key() {
        let mut t = Table::new("user_roles").unwrap();
        t.add_column("user_id", ColumnSpec::new("int").primary()).unwrap();
        assert!(t.get_col("user_id").unwrap().is_unique());
        t.add_column("role_id", ColumnSpec::new("int").primary()).unwrap();
        assert_eq!(t.primary_key_count(), 2);
        for col in t.primary_key_cols() {
            assert!(col.is_composite_key());
            assert!(!col.is_unique());
        }
        t.remove_column("role_id");
        assert!(!t.get_col("user_id").unwrap().is_composite_key());
        assert!(t.get_col("user_id").unwrap().is_unique());
    }

    #[test]
    fn test_update_column() {
        let mut t = users();
        t.update_column("email", |c| c.set_type("varchar", Some(30000), None))
            .unwrap();
        assert_eq!(t.get_col("email").unwrap().datatype(), DataType::MediumText);
        assert_eq!(
            t.update_column("email", |c| c.set_name("id")),
            Err(TabulaError::DuplicateColumn("id".into()))
        );
        assert!(t.update_column("missing", |_| Ok(())).is_err());
    }

    #[test]
    fn test_add_reference() {
        let mut orders = Table::new("orders").unwrap();
        orders.add_default_cols(&DefaultColumns::default().only(&[DefaultColumn::Id]));
        orders.add_column("user_id", ColumnSpec::new("int")).unwrap();
        orders.add_column("note", ColumnSpec::new("text")).unwrap();

        assert!(!orders.add_reference("note", &users(), "id", None, None));
        assert!(orders.foreign_keys().is_empty());

        assert!(orders.add_reference(
            "user_id",
            &users(),
            "id",
            Some(ReferenceAction::Cascade),
            None
        ));
        let fk = orders.get_foreign_key("fk_orders_user_id").unwrap();
        assert_eq!(fk.source_name(), Some("users"));
        assert_eq!(fk.on_delete(), Some(ReferenceAction::Cascade));

        assert!(!orders.add_reference("user_id", &users(), "id", None, None));
        assert!(orders.remove_foreign_key("fk_orders_user_id").is_some());
    }

    #[test]
    fn test_add_reference_from_factory() {
        let mut orders = Table::new("orders").unwrap();
        orders.add_column("user_id", ColumnSpec::new("int")).unwrap();
        assert!(orders.add_reference("user_id", users as fn() -> Table, "id", None, None));
        let fk = orders.get_foreign_key("fk_orders_user_id").unwrap();
        assert_eq!(fk.source_name(), Some("users"));
        assert_eq!(fk.source_columns(), ["id".to_string()]);
    }

    #[test]
    fn test_version_propagates() {
        let mut t = users();
        t.set_mysql_version(5.5);
        assert_eq!(t.get_col("email").unwrap().collation(), "utf8_general_ci");
        assert_eq!(t.charset(), "utf8");
    }

    #[test]
    fn test_rename_moves_owner() {
        let mut t = users();
        t.set_name("members").unwrap();
        assert_eq!(t.get_col("email").unwrap().owner(), Some("members"));
        assert!(t.set_name("bad name").is_err());
        t.set_schema(Some("shop")).unwrap();
        assert_eq!(t.qualified_name(), "`shop`.`members`");
    }
}
