//! Database models for post comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::models::{Entity, OnDelete, Schema, TreeEntity, TreeLink};
use crate::db::query::Value;
use crate::types::{EntityId, now};

pub type CommentId = EntityId;

/// A comment on a post. Replies hang off their parent comment and go with it when it is deleted.
/// Comments have no trash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub body: String,
    pub post_id: EntityId,
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: EntityId, body: impl Into<String>, parent_id: Option<CommentId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: body.into(),
            post_id,
            parent_id,
            created_at: now(),
        }
    }
}

impl Entity for Comment {
    const SCHEMA: Schema = Schema {
        table: "content_comments",
        resource: "comment",
        columns: &["id", "body", "post_id", "parent_id", "created_at"],
        deleted_at: None,
        tree: Some(TreeLink {
            parent_column: "parent_id",
            on_delete: OnDelete::Cascade,
        }),
    };

    fn id(&self) -> EntityId {
        self.id
    }

    fn value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "id" => self.id.into(),
            "body" => self.body.as_str().into(),
            "post_id" => self.post_id.into(),
            "parent_id" => self.parent_id.into(),
            "created_at" => self.created_at.into(),
            _ => return None,
        })
    }
}

impl TreeEntity for Comment {
    fn parent_id(&self) -> Option<EntityId> {
        self.parent_id
    }

    fn set_parent_id(&mut self, parent: Option<EntityId>) {
        self.parent_id = parent;
    }
}

/// Database request for creating a comment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateDBRequest {
    pub post_id: EntityId,
    pub body: String,
    pub parent_id: Option<CommentId>,
}

/// Comments can't be edited; the type exists so the service surface stays uniform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUpdateDBRequest {
    pub body: Option<String>,
}
