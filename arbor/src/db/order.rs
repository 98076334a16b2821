//! Ordering specifications and their resolution against a repository default.
//!
//! An [`OrderBy`] is an ordered list of columns, each with a direction; the first is the primary
//! sort key and the rest break ties in the order given. A bare column name sorts descending.
//!
//! Orderings appear in configuration as strings:
//!
//! ```text
//! custom_order:asc, created_at
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::db::errors::{DbError, Result};
use crate::db::models::Schema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            other => Err(format!("unknown order direction '{other}', expected asc or desc")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderField {
    pub column: String,
    pub direction: OrderDirection,
}

impl OrderField {
    pub fn new(column: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct OrderBy(Vec<OrderField>);

impl OrderBy {
    /// Sort by one column in the default (descending) direction.
    pub fn column(column: impl Into<String>) -> Self {
        Self(vec![OrderField::new(column, OrderDirection::default())])
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self(vec![OrderField::new(column, OrderDirection::Asc)])
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self(vec![OrderField::new(column, OrderDirection::Desc)])
    }

    /// Append a tie-breaker.
    pub fn then(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.0.push(OrderField::new(column, direction));
        self
    }

    pub fn fields(&self) -> &[OrderField] {
        &self.0
    }

    /// Reject columns the schema doesn't declare.
    pub fn check(&self, schema: &Schema) -> Result<()> {
        match self.0.iter().find(|f| !schema.has_column(&f.column)) {
            Some(field) => Err(DbError::UnknownColumn {
                table: schema.table,
                column: field.column.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl From<Vec<OrderField>> for OrderBy {
    fn from(fields: Vec<OrderField>) -> Self {
        Self(fields)
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|field| {
                let direction = match field.direction {
                    OrderDirection::Asc => "asc",
                    OrderDirection::Desc => "desc",
                };
                format!("{}:{}", field.column, direction)
            })
            .collect();
        f.write_str(&parts.join(","))
    }
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut fields = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let field = match part.split_once(':') {
                Some((column, direction)) => OrderField::new(column.trim(), direction.parse()?),
                None => OrderField::new(part, OrderDirection::default()),
            };
            if field.column.is_empty() {
                return Err(format!("missing column name in ordering '{s}'"));
            }
            fields.push(field);
        }
        if fields.is_empty() {
            return Err("ordering must name at least one column".to_string());
        }
        Ok(Self(fields))
    }
}

/// Pick the ordering for a call: the per-call one when given, else the repository default, else
/// none at all (storage order). The result is checked against the schema.
pub fn resolve_order(
    requested: Option<&OrderBy>,
    default: Option<&OrderBy>,
    schema: &Schema,
) -> Result<Vec<OrderField>> {
    match requested.or(default) {
        Some(order) => {
            order.check(schema)?;
            Ok(order.fields().to_vec())
        }
        None => Ok(Vec::new()),
    }
}
