//! User endpoints

use reqwest::Method;

use super::client::{segment, ApiClient};
use super::dto::{Id, Listing, User, UserPatch, UserQuery};
use super::error::ApiResult;

impl ApiClient {
    /// `GET /users`, optionally restricted to followers of a user
    pub async fn list_users(&self, query: &UserQuery) -> ApiResult<Vec<User>> {
        let listing: Listing<User> = self.get_json_query("/users", query).await?;
        Ok(listing.into_items("users"))
    }

    /// `GET /users/{id}`
    pub async fn get_user(&self, id: &Id) -> ApiResult<User> {
        self.get_json(&format!("/users/{}", segment(id.as_str())))
            .await
    }

    /// `GET /users/me`; answers 404 when the caller is anonymous
    pub async fn current_user(&self) -> ApiResult<User> {
        self.get_json("/users/me").await
    }

    /// `PATCH /users/{id}` with only the fields that changed
    pub async fn update_user(&self, id: &Id, patch: &UserPatch) -> ApiResult<()> {
        self.fetch_empty(
            Method::PATCH,
            &format!("/users/{}", segment(id.as_str())),
            |r| r.json(patch),
        )
        .await
    }

    /// `DELETE /users/{id}`
    pub async fn delete_user(&self, id: &Id) -> ApiResult<()> {
        self.fetch_empty(
            Method::DELETE,
            &format!("/users/{}", segment(id.as_str())),
            |r| r,
        )
        .await
    }

    /// `PUT /users/{id}/password`; the body is the bare JSON string
    pub async fn change_password(&self, id: &Id, password: &str) -> ApiResult<()> {
        self.fetch_empty(
            Method::PUT,
            &format!("/users/{}/password", segment(id.as_str())),
            |r| r.json(password),
        )
        .await
    }
}
