use std::ops::Deref;

use async_trait::async_trait;
use tracing::instrument;

use crate::db::handlers::{FindOptions, Repository, TreeRepository};
use crate::db::models::comments::{Comment, CommentCreateDBRequest, CommentUpdateDBRequest};
use crate::db::models::TreeNode;
use crate::db::query::Condition;
use crate::db::storage::Backend;
use crate::errors::{Error, Result};
use crate::service::base::{BaseService, Crud};
use crate::types::{EntityId, abbrev_uuid};

/// Comments: a tree without trash. Replies go down with their parent; comments can't be edited.
pub struct CommentService<B> {
    base: BaseService<Comment, TreeRepository<Comment, B>>,
}

impl<B: Backend<Comment>> CommentService<B> {
    pub fn new(repository: TreeRepository<Comment, B>, enable_trash: bool) -> Self {
        Self {
            base: BaseService::new(repository).with_trash(enable_trash),
        }
    }

    /// The threads under one post, nested.
    #[instrument(skip(self, post_id), fields(post_id = %abbrev_uuid(&post_id)), err)]
    pub async fn find_threads(&self, post_id: EntityId) -> Result<Vec<TreeNode<Comment>>> {
        let options = FindOptions::new().filter(Condition::eq("post_id", post_id));
        self.repository().find_trees(&options).await
    }
}

impl<B> Deref for CommentService<B> {
    type Target = BaseService<Comment, TreeRepository<Comment, B>>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[async_trait]
impl<B: Backend<Comment>> Crud for CommentService<B> {
    type Entity = Comment;
    type CreateRequest = CommentCreateDBRequest;
    type UpdateRequest = CommentUpdateDBRequest;

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&request.post_id)), err)]
    async fn create(&self, request: CommentCreateDBRequest) -> Result<Comment> {
        if let Some(parent_id) = request.parent_id {
            let parent = self.detail(parent_id).await?;
            if parent.post_id != request.post_id {
                return Err(Error::BadRequest {
                    message: format!("comment {parent_id} belongs to another post"),
                });
            }
        }
        let comment = Comment::new(request.post_id, request.body, request.parent_id);
        let created = self.repository().insert(&comment).await?;
        self.detail(created.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::storage::InMemoryBackend;
    use crate::errors::ErrorKind;

    fn service() -> CommentService<InMemoryBackend<Comment>> {
        CommentService::new(TreeRepository::new(InMemoryBackend::new()), true)
    }

    fn request(
        post_id: EntityId,
        body: &str,
        parent_id: Option<EntityId>,
    ) -> CommentCreateDBRequest {
        CommentCreateDBRequest {
            post_id,
            body: body.to_string(),
            parent_id,
        }
    }

    #[tokio::test]
    async fn test_threads_per_post() {
        let service = service();
        let (first, second) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
        let top = service.create(request(first, "top", None)).await.unwrap();
        service.create(request(first, "reply", Some(top.id))).await.unwrap();
        service.create(request(second, "elsewhere", None)).await.unwrap();

        let threads = service.find_threads(first).await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].size(), 2);
        assert_eq!(threads[0].children[0].item.body, "reply");
    }

    #[tokio::test]
    async fn test_reply_to_missing_or_foreign_comment() {
        let service = service();
        let post = uuid::Uuid::new_v4();

        let dangling = request(post, "reply", Some(uuid::Uuid::new_v4()));
        let err = service.create(dangling).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let other = service.create(request(uuid::Uuid::new_v4(), "top", None)).await.unwrap();
        let err = service.create(request(post, "reply", Some(other.id))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_comments_are_not_editable() {
        let service = service();
        let top = service.create(request(uuid::Uuid::new_v4(), "top", None)).await.unwrap();

        let update = CommentUpdateDBRequest {
            body: Some("edited".to_string()),
        };
        let err = service.update(top.id, update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(service.detail(top.id).await.unwrap().body, "top");
    }

    #[tokio::test]
    async fn test_no_trash() {
        let service = service();
        assert!(!service.trash_enabled());
        let top = service.create(request(uuid::Uuid::new_v4(), "top", None)).await.unwrap();

        let err = service.restore(&[top.id]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let deleted = service.delete(&[top.id], true).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(service.detail(top.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    }
}
