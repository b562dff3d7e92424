//! Single post with its comment thread

use futures_util::future::join;
use std::sync::Arc;

use super::{Affordances, ErrorSlot, PageError};
use crate::api::{ApiClient, ApiResult, Comment, CommentInit, Id, Post};
use crate::effect::{Commit, Resource, Snapshot};
use crate::session::SessionHandle;
use crate::views::{EntityView, MutationOutcome};

/// Comments are fetched only while shown
#[derive(Debug, Clone, PartialEq, Eq)]
struct Thread {
    post_id: Id,
    shown: bool,
}

async fn fetch_thread(client: ApiClient, thread: Thread) -> ApiResult<Vec<Comment>> {
    if !thread.shown {
        return Ok(Vec::new());
    }
    client.list_comments(&thread.post_id).await
}

pub struct PostPage {
    session: SessionHandle,
    post: Resource<Id, Post>,
    comments: Resource<Thread, Vec<Comment>>,
    errors: ErrorSlot,
}

impl PostPage {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            post: Resource::new("post"),
            comments: Resource::new("comments"),
            errors: ErrorSlot::default(),
        }
    }

    /// Fetch the post by id; the comment thread keeps its visibility
    ///
    /// Post and thread are re-keyed together before either fetch resolves,
    /// so a superseded open cannot pair one post with another's thread.
    pub async fn open(&self, id: Id) -> Commit {
        let client = self.session.client().clone();
        let post = self
            .post
            .load(id.clone(), |id| async move { client.get_post(&id).await });
        let (commit, _) = join(post, self.retarget_thread(id)).await;
        commit
    }

    /// Show a post already at hand (e.g. from a feed) without fetching it
    pub async fn show(&self, post: Post) -> Commit {
        let id = post.id.clone();
        let commit = self.post.put(id.clone(), post);
        self.retarget_thread(id).await;
        commit
    }

    async fn retarget_thread(&self, post_id: Id) -> Commit {
        let shown = self.comments_shown();
        let client = self.session.client().clone();
        self.comments
            .load(Thread { post_id, shown }, |thread| fetch_thread(client, thread))
            .await
    }

    pub fn comments_shown(&self) -> bool {
        self.comments.key().is_some_and(|t| t.shown)
    }

    /// Show or hide the comment thread
    pub async fn toggle_comments(&self) -> Commit {
        let Some(post_id) = self.post.key() else {
            return Commit::Unchanged;
        };
        let shown = !self.comments_shown();
        let client = self.session.client().clone();
        self.comments
            .load(Thread { post_id, shown }, |thread| fetch_thread(client, thread))
            .await
    }

    pub async fn refresh(&self) -> Commit {
        let client = self.session.client().clone();
        self.post
            .reload(|id| async move { client.get_post(&id).await })
            .await
    }

    pub async fn refresh_comments(&self) -> Commit {
        let client = self.session.client().clone();
        self.comments
            .reload(|thread| fetch_thread(client, thread))
            .await
    }

    pub fn snapshot(&self) -> Snapshot<Post> {
        self.post.snapshot()
    }

    pub fn post(&self) -> Option<Arc<Post>> {
        self.post.data()
    }

    pub fn comments(&self) -> Arc<Vec<Comment>> {
        self.comments.data().unwrap_or_default()
    }

    pub fn comments_snapshot(&self) -> Snapshot<Vec<Comment>> {
        self.comments.snapshot()
    }

    pub fn view(&self) -> Option<EntityView<Post>> {
        self.post()
            .map(|post| EntityView::new(Post::clone(&post), self.session.clone()))
    }

    pub fn comment_view(&self, id: &Id) -> Option<EntityView<Comment>> {
        self.comments()
            .iter()
            .find(|c| c.id == *id)
            .cloned()
            .map(|comment| EntityView::new(comment, self.session.clone()))
    }

    pub fn affordances(&self) -> Affordances {
        Affordances::for_session(&self.session)
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors.get()
    }

    /// Comment on the shown post, then re-fetch the thread
    ///
    /// A hidden thread is opened so the new comment is visible.
    pub async fn create_comment(&self, content: &str) -> Result<MutationOutcome, PageError> {
        let result = self.try_create_comment(content).await;
        self.errors.track(&result);
        if result.is_ok() {
            if self.comments_shown() {
                self.refresh_comments().await;
            } else {
                self.toggle_comments().await;
            }
        }
        result
    }

    async fn try_create_comment(&self, content: &str) -> Result<MutationOutcome, PageError> {
        let author = self.session.user_id().ok_or(PageError::Anonymous)?;
        let post = self.post.key().ok_or(PageError::NotLoaded)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(PageError::EmptyContent);
        }

        self.session
            .client()
            .create_comment(&CommentInit {
                content: content.to_string(),
                author,
                post,
            })
            .await?;
        Ok(MutationOutcome::Created)
    }

    /// React to a mutation of the post itself
    ///
    /// A deleted post is not re-fetched; the page is left showing the last
    /// copy until the caller navigates away.
    pub async fn apply(&self, outcome: Result<MutationOutcome, PageError>) -> Option<Commit> {
        self.errors.track(&outcome);
        match outcome {
            Ok(MutationOutcome::Deleted) => None,
            Ok(outcome) if outcome.needs_refresh() => Some(self.refresh().await),
            _ => None,
        }
    }

    /// React to a mutation of one of the comments
    pub async fn apply_comment(
        &self,
        outcome: Result<MutationOutcome, PageError>,
    ) -> Option<Commit> {
        self.errors.track(&outcome);
        match outcome {
            Ok(outcome) if outcome.needs_refresh() => Some(self.refresh_comments().await),
            _ => None,
        }
    }
}

impl Drop for PostPage {
    fn drop(&mut self) {
        self.post.dispose();
        self.comments.dispose();
    }
}
