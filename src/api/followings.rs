//! Follow edges between users
//!
//! Both mutations are idempotent on the server: following twice leaves one
//! edge, unfollowing an absent edge is a no-op.

use reqwest::Method;

use super::client::{segment, ApiClient};
use super::dto::{Id, Listing, User, UserQuery};
use super::error::ApiResult;

impl ApiClient {
    /// Users that `user_id` follows
    pub async fn followings(&self, user_id: &Id) -> ApiResult<Vec<User>> {
        let listing: Listing<User> = self
            .get_json(&format!("/users/{}/followings", segment(user_id.as_str())))
            .await?;
        Ok(listing.into_items("users"))
    }

    /// Users following `user_id`
    pub async fn followers(&self, user_id: &Id) -> ApiResult<Vec<User>> {
        let listing: Listing<User> = self
            .get_json(&format!("/users/{}/followers", segment(user_id.as_str())))
            .await?;
        Ok(listing.into_items("users"))
    }

    /// Followers through the filtered users listing,
    /// `GET /users?following_id=<id>`
    pub async fn followers_by_query(&self, user_id: &Id) -> ApiResult<Vec<User>> {
        self.list_users(&UserQuery {
            following_id: Some(user_id.clone()),
        })
        .await
    }

    /// `PUT /users/{follower}/followings/{followee}`
    pub async fn follow(&self, follower: &Id, followee: &Id) -> ApiResult<()> {
        self.fetch_empty(Method::PUT, &edge_path(follower, followee), |r| r)
            .await
    }

    /// `DELETE /users/{follower}/followings/{followee}`
    pub async fn unfollow(&self, follower: &Id, followee: &Id) -> ApiResult<()> {
        self.fetch_empty(Method::DELETE, &edge_path(follower, followee), |r| r)
            .await
    }
}

fn edge_path(follower: &Id, followee: &Id) -> String {
    format!(
        "/users/{}/followings/{}",
        segment(follower.as_str()),
        segment(followee.as_str())
    )
}
