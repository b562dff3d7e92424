//! Post endpoints

use reqwest::Method;

use super::client::{segment, ApiClient};
use super::dto::{Id, Listing, Post, PostInit, PostPatch, PostQuery};
use super::error::ApiResult;

impl ApiClient {
    /// `GET /posts`, or `GET /posts?user_id=<id>` for one author's posts
    pub async fn list_posts(&self, query: &PostQuery) -> ApiResult<Vec<Post>> {
        let listing: Listing<Post> = self.get_json_query("/posts", query).await?;
        Ok(listing.into_items("posts"))
    }

    /// `GET /posts/{id}`
    pub async fn get_post(&self, id: &Id) -> ApiResult<Post> {
        self.get_json(&format!("/posts/{}", segment(id.as_str())))
            .await
    }

    /// `POST /posts`
    pub async fn create_post(&self, init: &PostInit) -> ApiResult<Post> {
        self.send_json(Method::POST, "/posts", init).await
    }

    /// `PATCH /posts/{id}`
    pub async fn update_post(&self, id: &Id, patch: &PostPatch) -> ApiResult<()> {
        self.fetch_empty(
            Method::PATCH,
            &format!("/posts/{}", segment(id.as_str())),
            |r| r.json(patch),
        )
        .await
    }

    /// `DELETE /posts/{id}`
    pub async fn delete_post(&self, id: &Id) -> ApiResult<()> {
        self.fetch_empty(
            Method::DELETE,
            &format!("/posts/{}", segment(id.as_str())),
            |r| r,
        )
        .await
    }
}
