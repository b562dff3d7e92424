//! Follow/unfollow controls shown on another user's profile
//!
//! No local edge state is kept: whether the edge exists is whatever the next
//! followers/followings fetch reports.

use super::{MutationOutcome, ViewError};
use crate::api::Id;
use crate::session::SessionHandle;

#[derive(Debug, Clone)]
pub struct FollowControls {
    session: SessionHandle,
    target: Id,
}

impl FollowControls {
    pub fn new(session: SessionHandle, target: Id) -> Self {
        Self { session, target }
    }

    pub fn target(&self) -> &Id {
        &self.target
    }

    /// Shown to logged-in viewers looking at someone else
    pub fn visible(&self) -> bool {
        self.session.is_authenticated() && !self.session.owns(&self.target)
    }

    pub async fn follow(&self) -> Result<MutationOutcome, ViewError> {
        let follower = self.viewer()?;
        self.session.client().follow(&follower, &self.target).await?;
        tracing::info!(follower = %follower, followee = %self.target, "Followed");
        Ok(MutationOutcome::Followed)
    }

    pub async fn unfollow(&self) -> Result<MutationOutcome, ViewError> {
        let follower = self.viewer()?;
        self.session
            .client()
            .unfollow(&follower, &self.target)
            .await?;
        tracing::info!(follower = %follower, followee = %self.target, "Unfollowed");
        Ok(MutationOutcome::Unfollowed)
    }

    fn viewer(&self) -> Result<Id, ViewError> {
        let follower = self.session.user_id().ok_or(ViewError::Anonymous)?;
        if follower == self.target {
            return Err(ViewError::Invalid("cannot follow yourself".to_string()));
        }
        Ok(follower)
    }
}
