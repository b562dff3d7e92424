//! Pages
//!
//! Page controllers compose entity views with their own fetched
//! collections. Every page follows the same cycle:
//!
//! 1. on open (and whenever a dependency changes) fetch a collection
//! 2. render the committed snapshot
//! 3. on any mutation, wait for the server's answer, then re-fetch the
//!    whole collection and replace the snapshot
//!
//! Pages never patch their collections locally and never share them with
//! other pages. Dropping a page discards whatever it still had in flight.

mod auth;
mod feed;
mod post;
mod profile;

pub use auth::{AuthAction, AuthPage};
pub use feed::{FeedPage, FeedScope};
pub use post::PostPage;
pub use profile::{ProfilePage, ProfileTarget, Tab};

use std::sync::Mutex;
use thiserror::Error;

use crate::api::ApiError;
use crate::session::SessionHandle;
use crate::views::ViewError;

/// Mutation affordances a page renders for the current viewer
///
/// Read affordances are always present; these appear only with a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    pub create_post: bool,
    pub comment: bool,
    pub edit_own: bool,
    pub follow: bool,
}

impl Affordances {
    pub fn for_session(session: &SessionHandle) -> Self {
        let signed_in = session.is_authenticated();
        Self {
            create_post: signed_in,
            comment: signed_in,
            edit_own: signed_in,
            follow: signed_in,
        }
    }

    pub fn any(&self) -> bool {
        self.create_post || self.comment || self.edit_own || self.follow
    }
}

/// Page-level failures
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Log in first")]
    Anonymous,

    #[error("Content must not be empty")]
    EmptyContent,

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Nothing loaded yet")]
    NotLoaded,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    View(#[from] ViewError),
}

/// Last failed mutation, shown until the next successful one
#[derive(Debug, Default)]
pub(crate) struct ErrorSlot(Mutex<Option<String>>);

impl ErrorSlot {
    /// Record the outcome of a mutation
    pub(crate) fn track<T, E: std::fmt::Display>(&self, result: &Result<T, E>) {
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *slot = result.as_ref().err().map(|e| e.to_string());
    }

    pub(crate) fn get(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, AuthnResponse, ClientConfig, Id, User};

    #[test]
    fn test_affordances_follow_session() {
        let session = SessionHandle::new(ApiClient::new(ClientConfig::default()).unwrap());
        assert!(!Affordances::for_session(&session).any());

        session.sign_in(AuthnResponse {
            user: User {
                id: Id::from("u1"),
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
            jwt: "t".into(),
        });
        let affordances = Affordances::for_session(&session);
        assert!(affordances.create_post && affordances.comment && affordances.follow);

        session.clear();
        assert!(!Affordances::for_session(&session).any());
    }

    #[test]
    fn test_error_slot_clears_on_success() {
        let slot = ErrorSlot::default();
        slot.track::<(), _>(&Err(PageError::EmptyContent));
        assert_eq!(slot.get().as_deref(), Some("Content must not be empty"));

        slot.track::<_, PageError>(&Ok(()));
        assert!(slot.get().is_none());
    }
}
