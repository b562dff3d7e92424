//! Post feed

use std::sync::Arc;

use super::{Affordances, ErrorSlot, PageError};
use crate::api::{ApiClient, ApiResult, Id, Post, PostInit, PostQuery};
use crate::effect::{Commit, Resource, Snapshot};
use crate::session::SessionHandle;
use crate::views::{EntityView, MutationOutcome};

/// Which posts the feed shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    All,
    ByAuthor(Id),
}

impl FeedScope {
    fn query(&self) -> PostQuery {
        match self {
            FeedScope::All => PostQuery::default(),
            FeedScope::ByAuthor(id) => PostQuery {
                user_id: Some(id.clone()),
            },
        }
    }
}

async fn fetch_posts(client: ApiClient, scope: FeedScope) -> ApiResult<Vec<Post>> {
    client.list_posts(&scope.query()).await
}

/// List of posts with a composer for new ones
pub struct FeedPage {
    session: SessionHandle,
    posts: Resource<FeedScope, Vec<Post>>,
    errors: ErrorSlot,
}

impl FeedPage {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            posts: Resource::new("feed"),
            errors: ErrorSlot::default(),
        }
    }

    /// Show `scope`; fetches only if the scope changed
    pub async fn open(&self, scope: FeedScope) -> Commit {
        let client = self.session.client().clone();
        self.posts
            .load(scope, |scope| fetch_posts(client, scope))
            .await
    }

    pub async fn refresh(&self) -> Commit {
        let client = self.session.client().clone();
        self.posts.reload(|scope| fetch_posts(client, scope)).await
    }

    pub fn scope(&self) -> Option<FeedScope> {
        self.posts.key()
    }

    pub fn snapshot(&self) -> Snapshot<Vec<Post>> {
        self.posts.snapshot()
    }

    pub fn posts(&self) -> Arc<Vec<Post>> {
        self.posts.data().unwrap_or_default()
    }

    /// A view for one listed post, for editing or deleting it
    pub fn view(&self, id: &Id) -> Option<EntityView<Post>> {
        self.posts()
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .map(|post| EntityView::new(post, self.session.clone()))
    }

    pub fn affordances(&self) -> Affordances {
        Affordances::for_session(&self.session)
    }

    /// Last failed mutation on this page
    pub fn last_error(&self) -> Option<String> {
        self.errors.get()
    }

    /// Publish a post as the session user, then re-fetch the feed
    pub async fn create_post(&self, content: &str) -> Result<MutationOutcome, PageError> {
        let result = self.try_create_post(content).await;
        self.errors.track(&result);
        if result.is_ok() {
            self.refresh().await;
        }
        result
    }

    async fn try_create_post(&self, content: &str) -> Result<MutationOutcome, PageError> {
        let author = self.session.user_id().ok_or(PageError::Anonymous)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(PageError::EmptyContent);
        }

        let post = self
            .session
            .client()
            .create_post(&PostInit {
                content: content.to_string(),
                author,
            })
            .await?;
        tracing::info!(post_id = %post.id, "Post created");
        Ok(MutationOutcome::Created)
    }

    /// React to a mutation made through one of this page's views
    pub async fn apply(&self, outcome: Result<MutationOutcome, PageError>) -> Option<Commit> {
        self.errors.track(&outcome);
        match outcome {
            Ok(outcome) if outcome.needs_refresh() => Some(self.refresh().await),
            _ => None,
        }
    }
}

impl Drop for FeedPage {
    fn drop(&mut self) {
        self.posts.dispose();
    }
}
