//! Comment view

use async_trait::async_trait;
use std::fmt;

use super::{require_text, Editable, Owned, ViewError};
use crate::api::{ApiClient, ApiResult, Comment, CommentPatch, Id};

/// Edit form for posts and comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDraft {
    pub content: String,
}

impl ContentDraft {
    pub(crate) fn changed_from(&self, current: &str) -> Option<String> {
        let content = self.content.trim();
        (content != current).then(|| content.to_string())
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> &Id {
        &self.author.id
    }
}

#[async_trait]
impl Editable for Comment {
    type Draft = ContentDraft;
    type Patch = CommentPatch;

    fn id(&self) -> &Id {
        &self.id
    }

    fn draft(&self) -> ContentDraft {
        ContentDraft {
            content: self.content.clone(),
        }
    }

    fn validate(draft: &ContentDraft) -> Result<(), ViewError> {
        require_text("content", &draft.content)
    }

    fn diff(&self, draft: &ContentDraft) -> Option<CommentPatch> {
        draft.changed_from(&self.content).map(|content| CommentPatch {
            content: Some(content),
        })
    }

    async fn submit(client: &ApiClient, id: &Id, patch: &CommentPatch) -> ApiResult<()> {
        client.update_comment(id, patch).await
    }

    async fn remove(client: &ApiClient, id: &Id) -> ApiResult<()> {
        client.delete_comment(id).await
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  [{}] {}: {}", self.id, self.author.name, self.content)?;
        if self.is_modified() {
            write!(f, " (modified)")?;
        }
        Ok(())
    }
}
