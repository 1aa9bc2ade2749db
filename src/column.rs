//! Column metamodel: datatype rules, value cleaning and DDL rendering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::datatype::{
    BIT_MAX_SIZE, CHAR_MAX_SIZE, DataType, INT_MAX_SIZE, VARCHAR_PROMOTION_THRESHOLD,
};
use crate::error::{TabulaError, TabulaResult};
use crate::ident::validate_name;
use crate::parser::parse_type_decl;
use crate::value::{Value, quote_bytes, quote_ident, quote_str};

/// Engine version assumed until a table or query says otherwise.
pub const DEFAULT_MYSQL_VERSION: f32 = 5.7;

const DECIMAL_MAX_SIZE: u32 = 65;
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Collation used for string columns on the given engine version.
pub fn collation_for(version: f32) -> &'static str {
    if version <= 5.5 {
        "utf8_general_ci"
    } else {
        "utf8mb4_unicode_ci"
    }
}

/// Character set matching [`collation_for`].
pub fn charset_for(version: f32) -> &'static str {
    if version <= 5.5 { "utf8" } else { "utf8mb4" }
}

/// A value after cleaning, ready to be embedded in SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanValue {
    Null,
    Literal(String),
    List(Vec<CleanValue>),
}

impl CleanValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CleanValue::Null)
    }
}

impl std::fmt::Display for CleanValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanValue::Null => write!(f, "null"),
            CleanValue::Literal(s) => write!(f, "{}", s),
            CleanValue::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Whether `s` is one of the unquoted "insertion time" tokens.
pub(crate) fn time_token(s: &str) -> Option<&'static str> {
    match s.trim().to_ascii_lowercase().as_str() {
        "current_timestamp" | "current_timestamp()" => Some("current_timestamp"),
        "now()" | "now" => Some("now()"),
        _ => None,
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`, optionally wrapped in quotes.
///
/// Returns the timestamp and whether only a date was given. Years before
/// 1970 are rejected.
pub(crate) fn parse_date_literal(input: &str) -> Option<(NaiveDateTime, bool)> {
    let s = input.trim().trim_matches('\'').trim();
    let (parsed, date_only) = match NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
        Ok(dt) => (dt, false),
        Err(_) => {
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
            (date.and_time(NaiveTime::MIN), true)
        }
    };
    if chrono::Datelike::year(&parsed) > 1969 {
        Some((parsed, date_only))
    } else {
        None
    }
}

fn end_of_day(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date().and_hms_opt(23, 59, 59).unwrap_or(dt)
}

/// A table column.
///
/// Columns are plain values: tables own them, joins copy them. The owner is
/// recorded by name only.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    datatype: DataType,
    size: u32,
    scale: u32,
    nullable: bool,
    unique: bool,
    primary: bool,
    auto_increment: bool,
    auto_update: bool,
    default: Option<String>,
    comment: Option<String>,
    alias: Option<String>,
    owner: Option<String>,
    index: Option<usize>,
    mysql_version: f32,
    composite_key: bool,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            name: "col".to_string(),
            datatype: DataType::Varchar,
            size: 1,
            scale: 0,
            nullable: false,
            unique: false,
            primary: false,
            auto_increment: false,
            auto_update: false,
            default: None,
            comment: None,
            alias: None,
            owner: None,
            index: None,
            mysql_version: DEFAULT_MYSQL_VERSION,
            composite_key: false,
        }
    }
}

impl Column {
    /// Create a column with the given name, datatype and size.
    pub fn new(name: &str, datatype: &str, size: Option<i64>) -> TabulaResult<Self> {
        let mut col = Column::default();
        col.set_name(name)?;
        col.set_type(datatype, size, None)?;
        Ok(col)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn is_auto_update(&self) -> bool {
        self.auto_update
    }

    /// Default as rendered SQL (already quoted/escaped).
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name of the owning table, if attached.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Position within the owning table, `None` when detached.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn mysql_version(&self) -> f32 {
        self.mysql_version
    }

    /// Whether this column is one of several primary key columns.
    pub fn is_composite_key(&self) -> bool {
        self.composite_key
    }

    pub fn collation(&self) -> &'static str {
        collation_for(self.mysql_version)
    }

    pub fn charset(&self) -> &'static str {
        charset_for(self.mysql_version)
    }

    pub fn set_name(&mut self, name: &str) -> TabulaResult<()> {
        self.name = validate_name(name)?;
        Ok(())
    }

    /// Change the datatype, resetting size, scale and default.
    ///
    /// Sizes given for datatypes without one are ignored. On any error the
    /// column is left as it was.
    pub fn set_type(
        &mut self,
        datatype: &str,
        size: Option<i64>,
        default: Option<Value>,
    ) -> TabulaResult<()> {
        let datatype: DataType = datatype.parse()?;
        let mut next = self.clone();
        next.datatype = datatype;
        next.scale = 0;
        next.default = None;
        next.size = datatype.default_size().unwrap_or(0);
        if datatype != DataType::Int {
            next.auto_increment = false;
        }
        if !datatype.is_date() {
            next.auto_update = false;
        }
        match size {
            Some(size) if takes_size(datatype) => next.set_size(size)?,
            Some(size) => debug!("ignoring size {} for {}", size, datatype),
            None => {}
        }
        if let Some(default) = default {
            next.set_default(default)?;
        }
        *self = next;
        Ok(())
    }

    /// Typed shorthand for [`Column::set_type`] without size or default.
    pub fn set_datatype(&mut self, datatype: DataType) -> TabulaResult<()> {
        self.set_type(datatype.as_str(), None, None)
    }

    /// Set the size according to the datatype's rules.
    ///
    /// `int` sizes above 11 clamp to 11; `varchar`/`text` sizes above
    /// 21845 promote the column to `mediumtext`.
    pub fn set_size(&mut self, size: i64) -> TabulaResult<()> {
        let datatype = self.datatype.to_string();
        let out_of_range = || TabulaError::SizeOutOfRange {
            datatype: datatype.clone(),
            size,
        };
        match self.datatype {
            DataType::Int => {
                if size <= 0 {
                    return Err(out_of_range());
                }
                self.size = (size.min(INT_MAX_SIZE as i64)) as u32;
            }
            DataType::Varchar | DataType::Text => {
                if size <= 0 || size > u32::MAX as i64 {
                    return Err(out_of_range());
                }
                if size > VARCHAR_PROMOTION_THRESHOLD as i64 {
                    debug!(
                        "{} size {} promotes '{}' to mediumtext",
                        self.datatype, size, self.name
                    );
                    self.datatype = DataType::MediumText;
                }
                self.size = size as u32;
            }
            DataType::MediumText => {
                if size <= 0 || size > u32::MAX as i64 {
                    return Err(out_of_range());
                }
                self.size = size as u32;
            }
            DataType::Char => {
                if size <= 0 || size > CHAR_MAX_SIZE as i64 {
                    return Err(out_of_range());
                }
                self.size = size as u32;
            }
            DataType::Decimal | DataType::Float | DataType::Double => {
                if size < 0 || size > DECIMAL_MAX_SIZE as i64 {
                    return Err(out_of_range());
                }
                let size = size as u32;
                if size > 0 && self.scale >= size {
                    return Err(out_of_range());
                }
                self.size = size;
            }
            DataType::Bit => {
                if size <= 0 || size > BIT_MAX_SIZE as i64 {
                    return Err(out_of_range());
                }
                self.size = size as u32;
            }
            other => return Err(TabulaError::SizeNotSupported(other.to_string())),
        }
        Ok(())
    }

    /// Digits right of the decimal point, for decimal/float/double only.
    pub fn set_scale(&mut self, scale: u32) -> TabulaResult<()> {
        if !self.datatype.is_real() || (self.size > 0 && scale >= self.size) {
            return Err(TabulaError::InvalidScale {
                datatype: self.datatype.to_string(),
                scale,
            });
        }
        self.scale = scale;
        Ok(())
    }

    /// Set a type-checked default value.
    ///
    /// For timestamp/datetime a `Null` default means "insertion time".
    pub fn set_default(&mut self, value: Value) -> TabulaResult<()> {
        let datatype = self.datatype;
        let rendered = match (&value, datatype) {
            (_, dt) if dt.is_blob() => {
                return Err(TabulaError::invalid_default(dt, "blob columns take no default"));
            }
            (Value::Null, dt) if dt.is_date() => dt.now_token().map(str::to_string),
            (Value::Null, _) if self.nullable => Some("null".to_string()),
            (Value::Null, dt) => {
                return Err(TabulaError::invalid_default(dt, "column is not nullable"));
            }
            (Value::String(s), dt) if dt.is_string() => Some(quote_str(s)),
            (Value::Int(n), DataType::Int) => Some(n.to_string()),
            (Value::Int(_) | Value::Float(_), dt) if dt.is_real() => {
                match self.clean_value(&value, false) {
                    CleanValue::Literal(s) => Some(s),
                    _ => None,
                }
            }
            (Value::String(s), dt) if dt.is_real() && s.trim().parse::<f64>().is_ok() => {
                Some(quote_str(s.trim()))
            }
            (Value::Bool(b), dt) if dt.is_boolean() => Some(if *b { "1" } else { "0" }.to_string()),
            (Value::Int(n @ (0 | 1)), dt) if dt.is_boolean() => Some(n.to_string()),
            (Value::String(s), dt) if dt.is_date() => match time_token(s) {
                Some(token) => Some(token.to_string()),
                None => parse_date_literal(s)
                    .map(|(dt, _)| format!("'{}'", dt.format(DATETIME_FORMAT))),
            },
            _ => None,
        };
        match rendered {
            Some(rendered) => {
                self.default = Some(rendered);
                Ok(())
            }
            None => Err(TabulaError::invalid_default(
                datatype,
                format!("{} does not fit", value),
            )),
        }
    }

    pub fn clear_default(&mut self) {
        self.default = None;
    }

    /// Allow or forbid NULL. Primary columns can never be nullable.
    pub fn set_nullable(&mut self, nullable: bool) -> bool {
        if nullable && self.primary {
            return false;
        }
        self.nullable = nullable;
        true
    }

    /// Clearing uniqueness on a single-column primary key also drops the key.
    pub fn set_unique(&mut self, unique: bool) -> bool {
        if !unique && self.primary && !self.composite_key {
            self.set_primary(false);
        }
        self.unique = unique;
        true
    }

    /// Primary implies unique and not nullable.
    pub fn set_primary(&mut self, primary: bool) -> bool {
        self.primary = primary;
        if primary {
            self.unique = !self.composite_key;
            self.nullable = false;
        } else {
            self.auto_increment = false;
            self.composite_key = false;
        }
        true
    }

    /// Only `int` primary columns may auto-increment.
    pub fn set_auto_increment(&mut self, auto_increment: bool) -> bool {
        if auto_increment && !(self.primary && self.datatype == DataType::Int) {
            return false;
        }
        self.auto_increment = auto_increment;
        true
    }

    /// Refresh to the current time on every update; date types only.
    pub fn set_auto_update(&mut self, auto_update: bool) -> bool {
        if auto_update && !self.datatype.is_date() {
            return false;
        }
        self.auto_update = auto_update;
        true
    }

    pub fn set_comment(&mut self, comment: Option<&str>) {
        self.comment = comment.map(str::to_string);
    }

    pub fn set_alias(&mut self, alias: Option<&str>) -> TabulaResult<()> {
        self.alias = alias.map(validate_name).transpose()?;
        Ok(())
    }

    /// Put back a name that was valid before.
    pub(crate) fn restore_name(&mut self, name: String) {
        self.name = name;
    }

    /// Alias chosen by a join; keys are validated already.
    pub(crate) fn alias_as(&mut self, alias: String) {
        self.alias = Some(alias);
    }

    pub(crate) fn attach(&mut self, owner: &str, index: usize, mysql_version: f32) {
        self.owner = Some(owner.to_string());
        self.index = Some(index);
        self.mysql_version = mysql_version;
    }

    pub(crate) fn detach(&mut self) {
        self.owner = None;
        self.index = None;
        self.composite_key = false;
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = Some(index);
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = Some(owner.to_string());
    }

    pub(crate) fn set_mysql_version(&mut self, version: f32) {
        self.mysql_version = version;
    }

    /// Move the column in or out of a composite primary key.
    ///
    /// Inside a composite key the column is not individually unique.
    pub(crate) fn set_composite_key(&mut self, composite: bool) {
        if !self.primary {
            return;
        }
        self.composite_key = composite;
        self.unique = !composite;
    }

    /// Backtick-quoted name, qualified with the owner table when `qualify`.
    pub fn sql_ref(&self, qualify: bool) -> String {
        match (&self.owner, qualify) {
            (Some(owner), true) => format!("{}.{}", quote_ident(owner), quote_ident(&self.name)),
            _ => quote_ident(&self.name),
        }
    }

    /// Expression that refreshes a date column to the current time.
    pub fn now_expression(&self) -> Option<&'static str> {
        self.datatype.now_token()
    }

    /// Convert `value` into a SQL literal appropriate for this column.
    ///
    /// Arrays are cleaned element-wise. Input that cannot represent a value
    /// of the column's type becomes `null`. With `end_of_day`, date columns
    /// take the last second of the given day.
    pub fn clean_value(&self, value: &Value, end_of_day: bool) -> CleanValue {
        if let Value::Array(items) = value {
            return CleanValue::List(
                items
                    .iter()
                    .map(|item| self.clean_value(item, end_of_day))
                    .collect(),
            );
        }
        if value.is_null() {
            return CleanValue::Null;
        }

        let literal = match self.datatype {
            DataType::Int => clean_int(value).map(|n| n.to_string()),
            dt if dt.is_real() => clean_real(value).map(|s| quote_str(&s)),
            dt if dt.is_string() => match value {
                Value::String(s) => Some(quote_str(s)),
                Value::Int(n) => Some(quote_str(&n.to_string())),
                Value::Float(n) => Some(quote_str(&n.to_string())),
                Value::Bool(b) => Some(quote_str(if *b { "1" } else { "0" })),
                Value::Bytes(b) => Some(quote_str(&String::from_utf8_lossy(b))),
                _ => None,
            },
            dt if dt.is_date() => self.clean_date(value, end_of_day),
            dt if dt.is_blob() => match value {
                Value::Bytes(b) => Some(quote_bytes(b)),
                Value::String(s) => Some(quote_str(s)),
                _ => None,
            },
            _ => clean_bool(value, self.datatype),
        };

        match literal {
            Some(literal) => CleanValue::Literal(literal),
            None => {
                debug!("value {} does not fit {} column '{}'", value, self.datatype, self.name);
                CleanValue::Null
            }
        }
    }

    fn clean_date(&self, value: &Value, end_of_day_wanted: bool) -> Option<String> {
        let parsed = match value {
            Value::String(s) => {
                if let Some(token) = time_token(s) {
                    return Some(token.to_string());
                }
                parse_date_literal(s)
            }
            Value::Int(secs) => {
                DateTime::from_timestamp(*secs, 0).map(|dt| (dt.naive_utc(), false))
            }
            _ => None,
        };
        let (dt, _) = parsed?;
        let dt = if end_of_day_wanted { end_of_day(dt) } else { dt };
        Some(format!("'{}'", dt.format(DATETIME_FORMAT)))
    }
}

fn takes_size(datatype: DataType) -> bool {
    matches!(
        datatype,
        DataType::Int
            | DataType::Varchar
            | DataType::Char
            | DataType::Text
            | DataType::MediumText
            | DataType::Decimal
            | DataType::Float
            | DataType::Double
            | DataType::Bit
    )
}

fn clean_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Value::Bool(b) => Some(*b as i64),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
        }
        _ => None,
    }
}

fn clean_real(value: &Value) -> Option<String> {
    match value {
        Value::Int(n) => Some(n.to_string()),
        Value::Float(f) if f.is_finite() => Some(f.to_string()),
        Value::Bool(b) => Some((*b as i64).to_string()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|_| s.to_string())
        }
        _ => None,
    }
}

fn clean_bool(value: &Value, datatype: DataType) -> Option<String> {
    match value {
        Value::Bool(b) => Some((*b as i64).to_string()),
        Value::Int(n) if datatype == DataType::Bit => Some(n.to_string()),
        Value::Int(n) => Some(((*n != 0) as i64).to_string()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some("1".to_string()),
            "false" | "0" => Some("0".to_string()),
            _ => None,
        },
        _ => None,
    }
}

impl Column {
    /// Definition without `primary key` or `unique`, for `modify column`
    /// and `change column` where the key already exists.
    pub fn definition_without_keys(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_definition(&mut out, false);
        out
    }

    fn write_definition(
        &self,
        f: &mut impl std::fmt::Write,
        with_keys: bool,
    ) -> std::fmt::Result {
        write!(f, "{} {}", quote_ident(&self.name), self.datatype)?;

        match self.datatype {
            DataType::Int | DataType::Varchar | DataType::Char | DataType::Bit => {
                write!(f, "({})", self.size)?
            }
            dt if dt.is_real() && self.size > 0 => {
                if self.scale > 0 {
                    write!(f, "({},{})", self.size, self.scale)?
                } else {
                    write!(f, "({})", self.size)?
                }
            }
            _ => {}
        }

        f.write_str(if self.nullable { " null" } else { " not null" })?;

        if with_keys && self.primary && !self.composite_key {
            f.write_str(" primary key")?;
        }
        if self.auto_increment {
            f.write_str(" auto_increment")?;
        }
        if with_keys && self.unique && !self.primary {
            f.write_str(" unique")?;
        }
        if self.datatype.is_string() {
            write!(f, " collate {}", self.collation())?;
        }
        if let Some(default) = &self.default {
            write!(f, " default {}", default)?;
        }
        if self.auto_update {
            f.write_str(" on update current_timestamp")?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " comment {}", quote_str(comment))?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Column {
    /// Column definition as used inside `create table` and `add column`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_definition(f, true)
    }
}

/// Declarative column description, as found in schema files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ColumnSpec {
    /// Database name; the table key is used when absent.
    pub name: Option<String>,
    /// `name`, `name(size)` or `name(size,scale)`.
    pub datatype: String,
    pub size: Option<i64>,
    pub scale: Option<u32>,
    pub default: Option<Value>,
    pub is_null: bool,
    pub is_primary: bool,
    pub auto_inc: bool,
    pub is_unique: bool,
    pub auto_update: bool,
    pub comment: Option<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            name: None,
            datatype: DataType::Varchar.to_string(),
            size: None,
            scale: None,
            default: None,
            is_null: false,
            is_primary: false,
            auto_inc: false,
            is_unique: false,
            auto_update: false,
            comment: None,
        }
    }
}

impl ColumnSpec {
    pub fn new(datatype: &str) -> Self {
        Self {
            datatype: datatype.to_string(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_null = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_inc = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn auto_update(mut self) -> Self {
        self.auto_update = true;
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Build the column, using `key` as the name when none is given.
    pub fn build(&self, key: &str) -> TabulaResult<Column> {
        let decl = parse_type_decl(&self.datatype)?;
        let mut col = Column::default();
        col.set_name(self.name.as_deref().unwrap_or(key))?;
        col.set_type(decl.datatype.as_str(), self.size.or(decl.size), None)?;
        if let Some(scale) = self.scale.or(decl.scale) {
            col.set_scale(scale)?;
        }

        if self.is_primary {
            col.set_primary(true);
        } else {
            col.set_unique(self.is_unique);
            col.set_nullable(self.is_null);
        }
        if self.auto_inc && !col.set_auto_increment(true) {
            warn!("auto-increment ignored on '{}': needs an int primary key", col.name());
        }
        if self.auto_update && !col.set_auto_update(true) {
            warn!("auto-update ignored on '{}': needs a date column", col.name());
        }
        if let Some(default) = &self.default {
            col.set_default(default.clone())?;
        }
        col.set_comment(self.comment.as_deref());
        Ok(col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(datatype: &str, size: Option<i64>) -> Column {
        Column::new("c", datatype, size).unwrap()
    }

    #[test]
    fn test_defaults() {
        let col = Column::default();
        assert_eq!(col.name(), "col");
        assert_eq!(col.datatype(), DataType::Varchar);
        assert_eq!(col.size(), 1);
        assert_eq!(col.index(), None);
    }

    #[test]
    fn test_size_kept_in_range() {
        assert_eq!(column("int", Some(5)).size(), 5);
        assert_eq!(column("varchar", Some(200)).size(), 200);
        assert_eq!(column("decimal", Some(12)).size(), 12);
        assert_eq!(column("char", Some(36)).size(), 36);
    }

    #[test]
    fn test_int_size_clamps() {
        assert_eq!(column("int", Some(50)).size(), 11);
        let mut col = column("int", None);
        assert!(matches!(
            col.set_size(0),
            Err(TabulaError::SizeOutOfRange { .. })
        ));
        assert_eq!(col.size(), 11);
    }

    #[test]
    fn test_varchar_promotes_to_mediumtext() {
        let col = column("varchar", Some(30000));
        assert_eq!(col.datatype(), DataType::MediumText);
        assert_eq!(column("varchar", Some(21845)).datatype(), DataType::Varchar);
    }

    #[test]
    fn test_size_not_supported() {
        let mut col = column("datetime", None);
        assert_eq!(
            col.set_size(4),
            Err(TabulaError::SizeNotSupported("datetime".into()))
        );
    }

    #[test]
    fn test_set_type_failure_keeps_state() {
        let mut col = column("int", Some(8));
        assert!(col.set_type("geometry", None, None).is_err());
        assert_eq!(col.datatype(), DataType::Int);
        assert_eq!(col.size(), 8);

        assert!(col.set_type("char", Some(999), None).is_err());
        assert_eq!(col.datatype(), DataType::Int);
    }

    #[test]
    fn test_scale_must_be_below_size() {
        let mut col = column("decimal", Some(10));
        assert!(col.set_scale(2).is_ok());
        assert!(col.set_scale(10).is_err());
        assert_eq!(col.scale(), 2);
        assert!(column("int", None).clone().set_scale(1).is_err());
    }

    #[test]
    fn test_primary_invariants() {
        let mut col = column("int", None);
        assert!(col.set_nullable(true));
        col.set_primary(true);
        assert!(col.is_unique());
        assert!(!col.is_nullable());
        assert!(!col.set_nullable(true));
        assert!(col.set_auto_increment(true));

        col.set_unique(false);
        assert!(!col.is_primary());
        assert!(!col.is_auto_increment());
    }

    #[test]
    fn test_auto_increment_requires_int_primary() {
        let mut col = column("varchar", Some(36));
        col.set_primary(true);
        assert!(!col.set_auto_increment(true));
        let mut col = column("int", None);
        assert!(!col.set_auto_increment(true));
    }

    #[test]
    fn test_string_default_escaped() {
        let mut col = column("varchar", Some(20));
        col.set_default(Value::from("it's")).unwrap();
        assert_eq!(col.default_value(), Some("'it\\'s'"));
        assert!(col.set_default(Value::Int(3)).is_err());
    }

    #[test]
    fn test_date_defaults() {
        let mut col = column("timestamp", None);
        col.set_default(Value::Null).unwrap();
        assert_eq!(col.default_value(), Some("current_timestamp"));

        let mut col = column("datetime", None);
        col.set_default(Value::Null).unwrap();
        assert_eq!(col.default_value(), Some("now()"));

        col.set_default(Value::from("2021-02-03")).unwrap();
        assert_eq!(col.default_value(), Some("'2021-02-03 00:00:00'"));

        assert!(col.set_default(Value::from("1969-12-31 10:00:00")).is_err());
        assert!(col.set_default(Value::from("2021-13-01 10:00:00")).is_err());
        assert!(col.set_default(Value::from("2021-01-01 24:00:00")).is_err());
    }

    #[test]
    fn test_clean_values() {
        assert_eq!(
            column("int", None).clean_value(&Value::from("42"), false),
            CleanValue::Literal("42".into())
        );
        assert_eq!(
            column("decimal", Some(10)).clean_value(&Value::Float(9.5), false),
            CleanValue::Literal("'9.5'".into())
        );
        assert_eq!(
            column("int", None).clean_value(&Value::from("abc"), false),
            CleanValue::Null
        );
        assert_eq!(
            column("varchar", Some(10)).clean_value(&Value::from(vec!["a", "b"]), false)
                .to_string(),
            "('a', 'b')"
        );
    }

    #[test]
    fn test_clean_date_end_of_day() {
        let col = column("datetime", None);
        assert_eq!(
            col.clean_value(&Value::from("2023-05-01 10:00:00"), true),
            CleanValue::Literal("'2023-05-01 23:59:59'".into())
        );
        assert_eq!(
            col.clean_value(&Value::from("2023-05-01"), false),
            CleanValue::Literal("'2023-05-01 00:00:00'".into())
        );
        assert_eq!(
            col.clean_value(&Value::from("NOW()"), false),
            CleanValue::Literal("now()".into())
        );
    }

    #[test]
    fn test_collation_follows_version() {
        let mut col = column("varchar", Some(5));
        col.set_mysql_version(5.5);
        assert_eq!(col.collation(), "utf8_general_ci");
        col.set_mysql_version(8.0);
        assert_eq!(col.collation(), "utf8mb4_unicode_ci");
    }

    #[test]
    fn test_render_definitions() {
        let id = ColumnSpec::new("int")
            .size(11)
            .primary()
            .auto_increment()
            .build("id")
            .unwrap();
        assert_eq!(id.to_string(), "`id` int(11) not null primary key auto_increment");

        let price = ColumnSpec::new("decimal(10,2)")
            .nullable()
            .comment("in cents")
            .build("price")
            .unwrap();
        assert_eq!(
            price.to_string(),
            "`price` decimal(10,2) null comment 'in cents'"
        );
    }
}
