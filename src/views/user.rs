//! User view: name/email edits and account deletion

use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use super::{require_text, Editable, Owned, ViewError};
use crate::api::{ApiClient, ApiResult, Id, User, UserPatch};

/// Edit form for a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Regex should compile"))
}

/// Loose email shape check, the same one a browser applies to
/// `<input type="email">`
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

impl Owned for User {
    fn owner_id(&self) -> &Id {
        &self.id
    }
}

#[async_trait]
impl Editable for User {
    type Draft = UserDraft;
    type Patch = UserPatch;

    fn id(&self) -> &Id {
        &self.id
    }

    fn draft(&self) -> UserDraft {
        UserDraft {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    fn validate(draft: &UserDraft) -> Result<(), ViewError> {
        require_text("name", &draft.name)?;
        if !is_valid_email(&draft.email) {
            return Err(ViewError::Invalid(format!(
                "{:?} is not an email address",
                draft.email
            )));
        }
        Ok(())
    }

    fn diff(&self, draft: &UserDraft) -> Option<UserPatch> {
        let name = draft.name.trim();
        let email = draft.email.trim();
        let patch = UserPatch {
            name: (name != self.name).then(|| name.to_string()),
            email: (email != self.email).then(|| email.to_string()),
        };
        (!patch.is_empty()).then_some(patch)
    }

    async fn submit(client: &ApiClient, id: &Id, patch: &UserPatch) -> ApiResult<()> {
        client.update_user(id, patch).await
    }

    async fn remove(client: &ApiClient, id: &Id) -> ApiResult<()> {
        client.delete_user(id).await
    }

    fn ends_session_on_delete() -> bool {
        true
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> [{}]", self.name, self.email, self.id)
    }
}
