//! Backend-neutral query description.
//!
//! Repositories describe what they want with a [`Query`] (conditions, trash visibility, ordering
//! and a window); every [`Backend`](crate::db::storage::Backend) turns that into its own access
//! path. Column names are validated against the entity's [`Schema`] before any backend sees them,
//! so the SQL backend can safely splice identifiers into statements.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::errors::{DbError, Result};
use crate::db::models::Schema;
use crate::db::order::OrderField;

/// A single column value, as read from an entity or bound into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Option<Uuid>),
    Text(Option<String>),
    Int(Option<i64>),
    Bool(Option<bool>),
    Timestamp(Option<DateTime<Utc>>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Uuid(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::Int(v) => v.is_none(),
            Value::Bool(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(v) => *v,
            _ => None,
        }
    }

    /// SQL equality: NULL never equals anything, values of different types never match.
    pub fn sql_eq(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self == other
    }

    /// Total order used when sorting in memory.
    ///
    /// NULL sorts after every non-null value, which is PostgreSQL's default (`NULLS LAST` for
    /// ascending, `NULLS FIRST` for descending).
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        match (self, other) {
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(Some(value))
    }
}

impl From<Option<Uuid>> for Value {
    fn from(value: Option<Uuid>) -> Self {
        Value::Uuid(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(Some(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(Some(value))
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(Some(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(Some(value))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(Some(value))
    }
}

impl From<Option<DateTime<Utc>>> for Value {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        Value::Timestamp(value)
    }
}

/// Which rows a read sees with respect to soft deletion.
///
/// - `None`: only live rows (the default)
/// - `All`: live and soft-deleted rows
/// - `Only`: only soft-deleted rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrashMode {
    #[default]
    None,
    All,
    Only,
}

impl TrashMode {
    /// Whether a row with the given `deleted_at` state is visible in this mode.
    pub fn admits(&self, deleted: bool) -> bool {
        match self {
            TrashMode::None => !deleted,
            TrashMode::All => true,
            TrashMode::Only => deleted,
        }
    }
}

impl fmt::Display for TrashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrashMode::None => "none",
            TrashMode::All => "all",
            TrashMode::Only => "only",
        })
    }
}

impl FromStr for TrashMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(TrashMode::None),
            "all" => Ok(TrashMode::All),
            "only" => Ok(TrashMode::Only),
            other => Err(format!("unknown trash mode '{other}', expected one of: none, all, only")),
        }
    }
}

/// A filter predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq(column.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull(column.into())
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Condition::NotNull(column.into())
    }

    pub fn column(&self) -> &str {
        match self {
            Condition::Eq(c, _)
            | Condition::In(c, _)
            | Condition::IsNull(c)
            | Condition::NotNull(c) => c,
        }
    }

    /// Evaluate against a row, given a column accessor.
    pub fn matches(&self, row: impl Fn(&str) -> Option<Value>) -> bool {
        let Some(actual) = row(self.column()) else {
            return false;
        };
        match self {
            Condition::Eq(_, expected) => actual.sql_eq(expected),
            Condition::In(_, expected) => expected.iter().any(|v| actual.sql_eq(v)),
            Condition::IsNull(_) => actual.is_null(),
            Condition::NotNull(_) => !actual.is_null(),
        }
    }
}

/// A complete read request against one entity kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub trashed: TrashMode,
    pub order: Vec<OrderField>,
    pub skip: Option<i64>,
    pub take: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn filters(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn trashed(mut self, trashed: TrashMode) -> Self {
        self.trashed = trashed;
        self
    }

    pub fn order_by(mut self, order: Vec<OrderField>) -> Self {
        self.order = order;
        self
    }

    pub fn window(mut self, skip: i64, take: i64) -> Self {
        self.skip = Some(skip);
        self.take = Some(take);
        self
    }

    /// Drop ordering and window, keeping only what decides membership. Used for counts.
    pub fn for_count(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            trashed: self.trashed,
            order: Vec::new(),
            skip: None,
            take: None,
        }
    }

    /// Reject any column the schema doesn't declare.
    pub fn check_columns(&self, schema: &Schema) -> Result<()> {
        let columns = self
            .conditions
            .iter()
            .map(Condition::column)
            .chain(self.order.iter().map(|o| o.column.as_str()));
        for column in columns {
            if !schema.has_column(column) {
                return Err(DbError::UnknownColumn {
                    table: schema.table,
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{OnDelete, TreeLink};
    use crate::db::order::OrderDirection;

    const SCHEMA: Schema = Schema {
        table: "things",
        resource: "thing",
        columns: &["id", "name", "parent_id", "deleted_at"],
        deleted_at: Some("deleted_at"),
        tree: Some(TreeLink {
            parent_column: "parent_id",
            on_delete: OnDelete::Cascade,
        }),
    };

    #[test]
    fn test_null_never_equals() {
        assert!(!Value::Uuid(None).sql_eq(&Value::Uuid(None)));
        assert!(Value::from(1i64).sql_eq(&Value::from(1i64)));
        assert!(!Value::from(1i64).sql_eq(&Value::from("1")));
    }

    #[test]
    fn test_nulls_sort_last() {
        let null = Value::Int(None);
        assert_eq!(null.compare(&Value::from(5i64)), Ordering::Greater);
        assert_eq!(Value::from(5i64).compare(&null), Ordering::Less);
        assert_eq!(Value::from(3i64).compare(&Value::from(5i64)), Ordering::Less);
    }

    #[test]
    fn test_trash_mode_admits() {
        assert!(TrashMode::None.admits(false));
        assert!(!TrashMode::None.admits(true));
        assert!(TrashMode::All.admits(true));
        assert!(TrashMode::All.admits(false));
        assert!(TrashMode::Only.admits(true));
        assert!(!TrashMode::Only.admits(false));
    }

    #[test]
    fn test_trash_mode_parse() {
        assert_eq!("ONLY".parse::<TrashMode>().unwrap(), TrashMode::Only);
        assert_eq!(" all ".parse::<TrashMode>().unwrap(), TrashMode::All);
        assert!("trash".parse::<TrashMode>().is_err());
        let mode: TrashMode = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(mode, TrashMode::None);
    }

    #[test]
    fn test_condition_matches() {
        let id = Uuid::new_v4();
        let row = |column: &str| match column {
            "id" => Some(Value::from(id)),
            "parent_id" => Some(Value::Uuid(None)),
            _ => None,
        };
        assert!(Condition::eq("id", id).matches(row));
        assert!(Condition::is_in("id", [Uuid::new_v4(), id]).matches(row));
        assert!(!Condition::is_in("id", Vec::<Uuid>::new()).matches(row));
        assert!(Condition::is_null("parent_id").matches(row));
        assert!(!Condition::not_null("parent_id").matches(row));
        // Unknown columns never match
        assert!(!Condition::is_null("missing").matches(row));
    }

    #[test]
    fn test_check_columns() {
        let ok = Query::new()
            .filter(Condition::is_null("parent_id"))
            .order_by(vec![OrderField::new("name", OrderDirection::Asc)]);
        assert!(ok.check_columns(&SCHEMA).is_ok());

        let injected = OrderField::new("name; DROP TABLE things", OrderDirection::Asc);
        let bad = Query::new().order_by(vec![injected]);
        assert!(matches!(
            bad.check_columns(&SCHEMA),
            Err(DbError::UnknownColumn { table: "things", .. })
        ));
    }

    #[test]
    fn test_for_count_drops_window_and_order() {
        let query = Query::new()
            .filter(Condition::is_null("parent_id"))
            .trashed(TrashMode::Only)
            .order_by(vec![OrderField::new("name", OrderDirection::Desc)])
            .window(10, 5);
        let count = query.for_count();
        assert_eq!(count.conditions, query.conditions);
        assert_eq!(count.trashed, TrashMode::Only);
        assert!(count.order.is_empty());
        assert_eq!(count.skip, None);
        assert_eq!(count.take, None);
    }
}
