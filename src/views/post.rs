//! Post view
//!
//! Rendering shows a "modified" marker once the modification time moves
//! past the creation time.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::fmt;

use super::{require_text, ContentDraft, Editable, Owned, ViewError};
use crate::api::{ApiClient, ApiResult, Id, Post, PostPatch};

impl Owned for Post {
    fn owner_id(&self) -> &Id {
        &self.author.id
    }
}

#[async_trait]
impl Editable for Post {
    type Draft = ContentDraft;
    type Patch = PostPatch;

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

    fn diff(&self, draft: &ContentDraft) -> Option<PostPatch> {
        draft.changed_from(&self.content).map(|content| PostPatch {
            content: Some(content),
        })
    }

    async fn submit(client: &ApiClient, id: &Id, patch: &PostPatch) -> ApiResult<()> {
        client.update_post(id, patch).await
    }

    async fn remove(client: &ApiClient, id: &Id) -> ApiResult<()> {
        client.delete_post(id).await
    }
}

fn local(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} · {}",
            self.id,
            self.author.name,
            local(&self.creation_time)
        )?;
        if self.is_modified() {
            write!(f, " (modified {})", local(&self.modification_time))?;
        }
        write!(f, "\n  {}", self.content)
    }
}
