//! User profile with followers/followings tabs

use futures_util::future::join;
use std::sync::{Arc, Mutex};

use super::{Affordances, ErrorSlot, PageError};
use crate::api::{ApiClient, ApiResult, Id, User};
use crate::effect::{Commit, Resource, Snapshot};
use crate::session::{Session, SessionHandle};
use crate::views::{EntityView, FollowControls, MutationOutcome};

/// Who the profile is about
///
/// Callers holding a full record skip the user fetch; callers holding only
/// an id get it fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileTarget {
    Identified(Id),
    Resolved(User),
}

impl ProfileTarget {
    pub fn id(&self) -> &Id {
        match self {
            ProfileTarget::Identified(id) => id,
            ProfileTarget::Resolved(user) => &user.id,
        }
    }
}

impl From<Id> for ProfileTarget {
    fn from(id: Id) -> Self {
        ProfileTarget::Identified(id)
    }
}

impl From<User> for ProfileTarget {
    fn from(user: User) -> Self {
        ProfileTarget::Resolved(user)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Followers,
    Followings,
}

async fn fetch_tab(client: ApiClient, tab: Tab, user_id: Id) -> ApiResult<Vec<User>> {
    match tab {
        Tab::Followers => client.followers(&user_id).await,
        Tab::Followings => client.followings(&user_id).await,
    }
}

pub struct ProfilePage {
    session: SessionHandle,
    user: Resource<Id, User>,
    tab: Mutex<Option<Tab>>,
    followers: Resource<Id, Vec<User>>,
    followings: Resource<Id, Vec<User>>,
    errors: ErrorSlot,
}

impl ProfilePage {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            user: Resource::new("profile"),
            tab: Mutex::new(None),
            followers: Resource::new("followers"),
            followings: Resource::new("followings"),
            errors: ErrorSlot::default(),
        }
    }

    /// Show `target`, re-keying the open tab to it
    pub async fn open(&self, target: impl Into<ProfileTarget>) -> Commit {
        let target = target.into();
        let id = target.id().clone();
        let client = self.session.client().clone();

        let user = {
            let id = id.clone();
            async move {
                match target {
                    ProfileTarget::Resolved(user) => self.user.put(id, user),
                    ProfileTarget::Identified(id) => {
                        self.user
                            .load(id, |id| async move { client.get_user(&id).await })
                            .await
                    }
                }
            }
        };
        let (commit, _) = join(user, self.load_tab(id.clone())).await;
        commit
    }

    pub async fn refresh(&self) -> Commit {
        let client = self.session.client().clone();
        self.user
            .reload(|id| async move { client.get_user(&id).await })
            .await
    }

    /// Switch tabs; the shown list is always fetched again
    pub async fn select_tab(&self, tab: Tab) -> Commit {
        *self.tab.lock().unwrap_or_else(|e| e.into_inner()) = Some(tab);
        let Some(id) = self.user.key() else {
            return Commit::Unchanged;
        };
        let client = self.session.client().clone();
        self.tab_resource(tab)
            .mount(id, |id| fetch_tab(client, tab, id))
            .await
    }

    pub fn tab(&self) -> Option<Tab> {
        *self.tab.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn load_tab(&self, user_id: Id) -> Commit {
        let Some(tab) = self.tab() else {
            return Commit::Unchanged;
        };
        let client = self.session.client().clone();
        self.tab_resource(tab)
            .load(user_id, |id| fetch_tab(client, tab, id))
            .await
    }

    pub async fn refresh_tab(&self) -> Commit {
        let Some(tab) = self.tab() else {
            return Commit::Unchanged;
        };
        let client = self.session.client().clone();
        self.tab_resource(tab)
            .reload(|id| fetch_tab(client, tab, id))
            .await
    }

    fn tab_resource(&self, tab: Tab) -> &Resource<Id, Vec<User>> {
        match tab {
            Tab::Followers => &self.followers,
            Tab::Followings => &self.followings,
        }
    }

    pub fn snapshot(&self) -> Snapshot<User> {
        self.user.snapshot()
    }

    pub fn user(&self) -> Option<Arc<User>> {
        self.user.data()
    }

    /// Users listed under `tab`
    pub fn listed(&self, tab: Tab) -> Arc<Vec<User>> {
        self.tab_resource(tab).data().unwrap_or_default()
    }

    pub fn tab_snapshot(&self, tab: Tab) -> Snapshot<Vec<User>> {
        self.tab_resource(tab).snapshot()
    }

    /// View of the profile's user, for editing or deleting one's own account
    pub fn view(&self) -> Option<EntityView<User>> {
        self.user()
            .map(|user| EntityView::new(User::clone(&user), self.session.clone()))
    }

    /// Follow controls, present only for someone else's profile
    pub fn follow_controls(&self) -> Option<FollowControls> {
        let target = self.user.key()?;
        let controls = FollowControls::new(self.session.clone(), target);
        controls.visible().then_some(controls)
    }

    pub fn affordances(&self) -> Affordances {
        Affordances::for_session(&self.session)
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors.get()
    }

    pub async fn follow(&self) -> Result<MutationOutcome, PageError> {
        let result = match self.follow_controls() {
            Some(controls) => controls.follow().await.map_err(PageError::from),
            None => Err(self.no_controls()),
        };
        self.settle(result).await
    }

    pub async fn unfollow(&self) -> Result<MutationOutcome, PageError> {
        let result = match self.follow_controls() {
            Some(controls) => controls.unfollow().await.map_err(PageError::from),
            None => Err(self.no_controls()),
        };
        self.settle(result).await
    }

    async fn settle(
        &self,
        result: Result<MutationOutcome, PageError>,
    ) -> Result<MutationOutcome, PageError> {
        self.errors.track(&result);
        if let Ok(outcome) = &result {
            self.refresh_for(*outcome).await;
        }
        result
    }

    /// Set a new password for the session's own account
    pub async fn change_password(&self, password: &str) -> Result<(), PageError> {
        let result = self.try_change_password(password).await;
        self.errors.track(&result);
        result
    }

    async fn try_change_password(&self, password: &str) -> Result<(), PageError> {
        let user_id = self.session.user_id().ok_or(PageError::Anonymous)?;
        if password.is_empty() {
            return Err(PageError::Invalid("password must not be empty".to_string()));
        }
        self.session
            .client()
            .change_password(&user_id, password)
            .await?;
        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// React to a mutation made from this page
    pub async fn apply(&self, outcome: Result<MutationOutcome, PageError>) -> Option<Commit> {
        self.errors.track(&outcome);
        self.refresh_for(outcome.ok()?).await
    }

    // Follow edges change the open tab; profile edits change the user.
    async fn refresh_for(&self, outcome: MutationOutcome) -> Option<Commit> {
        match outcome {
            MutationOutcome::Followed | MutationOutcome::Unfollowed => {
                Some(self.refresh_tab().await)
            }
            MutationOutcome::Updated => {
                let commit = self.refresh().await;
                if commit == Commit::Applied {
                    self.sync_session_user();
                }
                Some(commit)
            }
            _ => None,
        }
    }

    // The session carries its own copy of the viewer's record; replace it
    // once an edit of that record is fetched back.
    fn sync_session_user(&self) {
        let (Some(current), Some(user)) = (self.session.auth(), self.user()) else {
            return;
        };
        if current.user.id == user.id && current.user != *user {
            self.session.set(Some(Session {
                user: User::clone(&user),
                jwt: current.jwt.clone(),
            }));
        }
    }

    fn no_controls(&self) -> PageError {
        if !self.session.is_authenticated() {
            PageError::Anonymous
        } else if self.user.key().is_none() {
            PageError::NotLoaded
        } else {
            PageError::Invalid("cannot follow yourself".to_string())
        }
    }
}

impl Drop for ProfilePage {
    fn drop(&mut self) {
        self.user.dispose();
        self.followers.dispose();
        self.followings.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AuthnResponse, ClientConfig};

    fn user(id: &str) -> User {
        User {
            id: Id::from(id),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    fn page() -> ProfilePage {
        ProfilePage::new(SessionHandle::new(
            ApiClient::new(ClientConfig::default()).unwrap(),
        ))
    }

    #[test]
    fn test_target_id() {
        assert_eq!(ProfileTarget::from(Id::from("u1")).id(), &Id::from("u1"));
        assert_eq!(ProfileTarget::from(user("u2")).id(), &Id::from("u2"));
    }

    #[tokio::test]
    async fn test_resolved_target_skips_fetch() {
        let page = page();
        assert_eq!(page.open(user("u1")).await, Commit::Applied);
        assert_eq!(page.user().unwrap().id, Id::from("u1"));
        assert!(page.tab().is_none());
    }

    #[tokio::test]
    async fn test_follow_controls_hidden_on_own_profile() {
        let page = page();
        page.open(user("u1")).await;
        assert!(page.follow_controls().is_none());
        assert!(matches!(page.follow().await, Err(PageError::Anonymous)));

        page.session.sign_in(AuthnResponse {
            user: user("u1"),
            jwt: "t".into(),
        });
        assert!(page.follow_controls().is_none());
        assert!(matches!(page.follow().await, Err(PageError::Invalid(_))));
        assert_eq!(
            page.last_error().as_deref(),
            Some("Invalid input: cannot follow yourself")
        );

        page.open(user("u2")).await;
        assert_eq!(page.follow_controls().unwrap().target(), &Id::from("u2"));
    }

    #[tokio::test]
    async fn test_password_requires_session() {
        let page = page();
        assert!(matches!(
            page.change_password("pw").await,
            Err(PageError::Anonymous)
        ));
    }
}
