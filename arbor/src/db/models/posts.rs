//! Database models for posts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::models::categories::CategoryId;
use crate::db::models::{Entity, Schema};
use crate::db::order::{OrderBy, OrderDirection};
use crate::db::query::Value;
use crate::types::{EntityId, now};

pub type PostId = EntityId;

/// Markup the post body is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Html,
    #[default]
    Markdown,
}

impl BodyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Self::Html),
            "markdown" => Ok(Self::Markdown),
            _ => Err(format!("Unknown body type: {}", s)),
        }
    }
}

impl TryFrom<String> for BodyType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A post. Posts are flat and support trash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub summary: Option<String>,
    #[sqlx(try_from = "String")]
    pub body_type: BodyType,
    pub published_at: Option<DateTime<Utc>>,
    pub custom_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let created_at = now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            summary: None,
            body_type: BodyType::default(),
            published_at: None,
            custom_order: 0,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

impl Entity for Post {
    const SCHEMA: Schema = Schema {
        table: "content_posts",
        resource: "post",
        columns: &[
            "id",
            "title",
            "body",
            "summary",
            "body_type",
            "published_at",
            "custom_order",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
        deleted_at: Some("deleted_at"),
        tree: None,
    };

    fn id(&self) -> EntityId {
        self.id
    }

    fn value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "id" => self.id.into(),
            "title" => self.title.as_str().into(),
            "body" => self.body.as_str().into(),
            "summary" => self.summary.clone().into(),
            "body_type" => self.body_type.as_str().into(),
            "published_at" => self.published_at.into(),
            "custom_order" => self.custom_order.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "deleted_at" => self.deleted_at.into(),
            _ => return None,
        })
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }
}

/// Which timestamp (or manual position) a post listing sorts by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostOrderType {
    #[default]
    Created,
    Updated,
    Published,
    Custom,
}

impl PostOrderType {
    /// Column ordering for this order type, highest first. Ties fall back to newest first.
    pub fn order_by(&self) -> OrderBy {
        let column = match self {
            Self::Created => return OrderBy::desc("created_at"),
            Self::Updated => "updated_at",
            Self::Published => "published_at",
            Self::Custom => "custom_order",
        };
        OrderBy::desc(column).then("created_at", OrderDirection::Desc)
    }
}

impl FromStr for PostOrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "published" => Ok(Self::Published),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Unknown post order type: {}", s)),
        }
    }
}

/// Database request for creating a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreateDBRequest {
    pub title: String,
    pub body: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub body_type: BodyType,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub custom_order: i64,
    /// Categories to file the post under. Ids that don't name a live category are skipped.
    #[serde(default)]
    pub categories: Vec<CategoryId>,
}

/// Database request for updating a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdateDBRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    /// Summary (None = no change, Some(None) = clear, Some(text) = set)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub summary: Option<Option<String>>,
    pub body_type: Option<BodyType>,
    /// Publication time (None = no change, Some(None) = unpublish)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub published_at: Option<Option<DateTime<Utc>>>,
    pub custom_order: Option<i64>,
    /// Replacement category set (None = no change, Some(vec![]) = file under nothing)
    pub categories: Option<Vec<CategoryId>>,
}
