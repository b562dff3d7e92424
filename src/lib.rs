//! # Social
//!
//! Typed client and terminal front end for a small social posting service:
//! users sign up, publish posts, comment on them and follow each other.
//!
//! ## Modules
//!
//! - [`api`]: REST client, DTOs and the request interceptor chain
//! - [`session`]: the authenticated identity and its bearer token
//! - [`effect`]: keyed fetches that drop stale responses
//! - [`views`]: per-entity ownership checks and inline editing
//! - [`pages`]: feed, post, profile and auth controllers
//! - [`app`]: composition root
//! - [`shell`]: interactive terminal front end
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use social::config::Config;
//! use social::pages::FeedScope;
//! use social::App;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::install(Config::from_env())?;
//!
//!     // Sign in; every later request carries the bearer token
//!     app.auth().login("ada@example.com", "secret").await?;
//!
//!     // Publish, then read the refreshed feed
//!     let feed = app.feed();
//!     feed.open(FeedScope::All).await;
//!     feed.create_post("hello").await?;
//!
//!     for post in feed.posts().iter() {
//!         println!("{}", post);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod effect;
pub mod pages;
pub mod session;
pub mod shell;
pub mod telemetry;
pub mod views;

// Re-export top-level types for convenience
pub use api::{ApiClient, ApiError, ApiResult, ClientConfig, Comment, Id, Post, User};

pub use app::{App, AppError};

pub use effect::{Commit, LoadState, Resource, Snapshot};

pub use pages::{
    Affordances, AuthPage, FeedPage, FeedScope, PageError, PostPage, ProfilePage, ProfileTarget,
    Tab,
};

pub use session::{Session, SessionHandle};

pub use views::{Controls, EntityView, FollowControls, MutationOutcome, ViewError};
