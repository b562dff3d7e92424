//! Comment endpoints, always scoped to a post when listing

use reqwest::Method;

use super::client::{segment, ApiClient};
use super::dto::{Comment, CommentInit, CommentPatch, CommentQuery, Id, Listing};
use super::error::ApiResult;

impl ApiClient {
    /// `GET /comments?post_id=<id>`
    pub async fn list_comments(&self, post_id: &Id) -> ApiResult<Vec<Comment>> {
        let query = CommentQuery {
            post_id: Some(post_id.clone()),
        };
        let listing: Listing<Comment> = self.get_json_query("/comments", &query).await?;
        Ok(listing.into_items("comments"))
    }

    /// `GET /comments/{id}`
    pub async fn get_comment(&self, id: &Id) -> ApiResult<Comment> {
        self.get_json(&format!("/comments/{}", segment(id.as_str())))
            .await
    }

    /// `POST /comments`
    ///
    /// Some backend builds answer with just the new id, so the created
    /// record is not decoded.
    pub async fn create_comment(&self, init: &CommentInit) -> ApiResult<()> {
        self.fetch_empty(Method::POST, "/comments", |r| r.json(init))
            .await
    }

    /// `PATCH /comments/{id}`
    pub async fn update_comment(&self, id: &Id, patch: &CommentPatch) -> ApiResult<()> {
        self.fetch_empty(
            Method::PATCH,
            &format!("/comments/{}", segment(id.as_str())),
            |r| r.json(patch),
        )
        .await
    }

    /// `DELETE /comments/{id}`
    pub async fn delete_comment(&self, id: &Id) -> ApiResult<()> {
        self.fetch_empty(
            Method::DELETE,
            &format!("/comments/{}", segment(id.as_str())),
            |r| r,
        )
        .await
    }
}
