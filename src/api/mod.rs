//! Social REST API Client
//!
//! Typed bindings for the social backend.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /users` - Sign up
//! - `POST /login` - Log in, returns `{user, jwt}`
//!
//! ## Users
//! - `GET /users` - All users (`?following_id=` for followers of a user)
//! - `GET /users/me` - Current user
//! - `GET /users/:id` - One user
//! - `PATCH /users/:id` - Partial update (owner only)
//! - `DELETE /users/:id` - Delete account (owner only)
//! - `PUT /users/:id/password` - Change password
//!
//! ## Followings
//! - `GET /users/:id/followings` - Users followed by a user
//! - `GET /users/:id/followers` - Users following a user
//! - `PUT /users/:follower/followings/:followee` - Follow
//! - `DELETE /users/:follower/followings/:followee` - Unfollow
//!
//! ## Posts
//! - `GET /posts` - All posts (`?user_id=` for one author)
//! - `POST /posts`, `GET|PATCH|DELETE /posts/:id`
//!
//! ## Comments
//! - `GET /comments?post_id=` - Comments of a post
//! - `POST /comments`, `GET|PATCH|DELETE /comments/:id`
//!
//! Authenticated calls carry `Authorization: Bearer <jwt>`, attached by the
//! session's interceptor rather than by the call sites.
//!
//! # Example
//!
//! ```rust,no_run
//! use social::api::{ApiClient, ClientConfig, PostQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ClientConfig::default())?;
//!     for post in client.list_posts(&PostQuery::default()).await? {
//!         println!("{}: {}", post.author.name, post.content);
//!     }
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod comments;
pub mod dto;
pub mod error;
mod followings;
pub mod interceptor;
mod posts;
mod users;

pub use client::{ApiClient, ClientConfig};
pub use dto::{
    AuthnRequest, AuthnResponse, Comment, CommentInit, CommentPatch, CommentQuery, Id, Post,
    PostInit, PostPatch, PostQuery, SignupResponse, User, UserInit, UserPatch, UserQuery,
};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use interceptor::{BearerAuth, InterceptorId, Interceptors, RequestInterceptor};
