//! Entity Views
//!
//! One view per rendered User, Post or Comment. A view knows who owns its
//! entity, which controls the current viewer gets, and how to turn an
//! inline edit into a partial update.
//!
//! ## Ownership
//!
//! Edit and delete controls exist only when the viewer's user id equals the
//! entity's owner id. This is a courtesy check; the backend enforces
//! authorization and its rejection is final.
//!
//! ## Mutations
//!
//! Mutating calls return a [`MutationOutcome`] instead of notifying a
//! callback. The page that owns the view decides from it whether to
//! re-fetch its collection.

mod comment;
mod follow;
mod post;
mod user;

pub use comment::ContentDraft;
pub use follow::FollowControls;
pub use user::{is_valid_email, UserDraft};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::api::{ApiClient, ApiError, ApiResult, Id};
use crate::session::SessionHandle;

/// Anything with an owning user
pub trait Owned {
    fn owner_id(&self) -> &Id;
}

/// Controls the viewer may see for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub edit: bool,
    pub delete: bool,
    pub follow: bool,
}

impl Controls {
    /// Controls for an entity owned by `owner_id`
    ///
    /// `followable` marks user entities: non-owners who are logged in get
    /// follow controls for them.
    pub fn for_owner(session: &SessionHandle, owner_id: &Id, followable: bool) -> Self {
        let owner = session.owns(owner_id);
        Self {
            edit: owner,
            delete: owner,
            follow: followable && session.is_authenticated() && !owner,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// What a mutation did, so the caller can decide whether to refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Created,
    Updated,
    Deleted,
    Followed,
    Unfollowed,
    /// The draft matched the entity; nothing was sent
    Unchanged,
    /// The viewer deleted their own account and is now anonymous
    SessionCleared,
}

impl MutationOutcome {
    /// Whether the owning page should re-fetch its collection
    pub fn needs_refresh(self) -> bool {
        !matches!(self, MutationOutcome::Unchanged | MutationOutcome::SessionCleared)
    }
}

/// View-level failures
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Only the owner can change this")]
    NotOwner,

    #[error("Not in edit mode")]
    NotEditing,

    #[error("Log in first")]
    Anonymous,

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// An entity that supports inline editing and deletion
#[async_trait]
pub trait Editable: Owned + Send + Sync {
    /// Mutable form state while editing
    type Draft: Clone + fmt::Debug + Send + Sync;
    /// Partial update carrying changed fields only
    type Patch: fmt::Debug + Send + Sync;

    fn id(&self) -> &Id;

    /// Draft pre-filled from the entity
    fn draft(&self) -> Self::Draft;

    fn validate(draft: &Self::Draft) -> Result<(), ViewError>;

    /// Patch for the fields that differ, `None` if nothing changed
    fn diff(&self, draft: &Self::Draft) -> Option<Self::Patch>;

    async fn submit(client: &ApiClient, id: &Id, patch: &Self::Patch) -> ApiResult<()>;

    async fn remove(client: &ApiClient, id: &Id) -> ApiResult<()>;

    /// Whether deleting this entity (as its owner) ends the session
    fn ends_session_on_delete() -> bool {
        false
    }
}

#[derive(Debug, Clone)]
enum Mode<D> {
    Display,
    Editing(D),
}

/// A rendered entity plus its inline edit state
pub struct EntityView<E: Editable> {
    entity: E,
    mode: Mode<E::Draft>,
    session: SessionHandle,
}

impl<E: Editable> EntityView<E> {
    pub fn new(entity: E, session: SessionHandle) -> Self {
        Self {
            entity,
            mode: Mode::Display,
            session,
        }
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn into_entity(self) -> E {
        self.entity
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Editing(_))
    }

    pub fn is_owner(&self) -> bool {
        self.session.owns(self.entity.owner_id())
    }

    /// Enter edit mode with a draft of the current fields
    pub fn begin_edit(&mut self) -> Result<&mut E::Draft, ViewError> {
        if !self.is_owner() {
            return Err(ViewError::NotOwner);
        }
        if !self.is_editing() {
            self.mode = Mode::Editing(self.entity.draft());
        }
        self.draft_mut()
    }

    pub fn draft(&self) -> Option<&E::Draft> {
        match &self.mode {
            Mode::Editing(draft) => Some(draft),
            Mode::Display => None,
        }
    }

    pub fn draft_mut(&mut self) -> Result<&mut E::Draft, ViewError> {
        match &mut self.mode {
            Mode::Editing(draft) => Ok(draft),
            Mode::Display => Err(ViewError::NotEditing),
        }
    }

    /// Leave edit mode, dropping the draft
    pub fn cancel_edit(&mut self) {
        self.mode = Mode::Display;
    }

    /// "Done": send the changed fields and leave edit mode
    ///
    /// On failure the view stays in edit mode with the draft intact.
    pub async fn commit(&mut self) -> Result<MutationOutcome, ViewError> {
        let draft = match &self.mode {
            Mode::Editing(draft) => draft.clone(),
            Mode::Display => return Err(ViewError::NotEditing),
        };
        E::validate(&draft)?;

        let Some(patch) = self.entity.diff(&draft) else {
            self.mode = Mode::Display;
            return Ok(MutationOutcome::Unchanged);
        };

        if let Err(e) = E::submit(self.session.client(), self.entity.id(), &patch).await {
            tracing::warn!(id = %self.entity.id(), error = %e, "Update rejected");
            return Err(e.into());
        }

        tracing::info!(id = %self.entity.id(), "Updated");
        self.mode = Mode::Display;
        Ok(MutationOutcome::Updated)
    }

    /// "Delete": remove the entity on the server
    pub async fn delete(&self) -> Result<MutationOutcome, ViewError> {
        if !self.is_owner() {
            return Err(ViewError::NotOwner);
        }

        if let Err(e) = E::remove(self.session.client(), self.entity.id()).await {
            tracing::warn!(id = %self.entity.id(), error = %e, "Delete rejected");
            return Err(e.into());
        }

        tracing::info!(id = %self.entity.id(), "Deleted");
        if E::ends_session_on_delete() {
            self.session.clear();
            return Ok(MutationOutcome::SessionCleared);
        }
        Ok(MutationOutcome::Deleted)
    }
}

impl<E: Editable + fmt::Display> fmt::Display for EntityView<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity)
    }
}

impl<E: Editable + fmt::Debug> fmt::Debug for EntityView<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityView")
            .field("entity", &self.entity)
            .field("mode", &self.mode)
            .finish()
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ViewError> {
    if value.trim().is_empty() {
        return Err(ViewError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}
