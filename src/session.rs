//! Session
//!
//! Holds zero-or-one authenticated identity for the lifetime of the process
//! and keeps the API client's bearer interceptor in step with it.
//!
//! A [`SessionHandle`] is passed explicitly to every page. The only global is
//! the root slot filled once by the composition root ([`install`]); reading
//! it before that is a programming error and panics.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;
use tokio::sync::watch;

use crate::api::{ApiClient, AuthnResponse, BearerAuth, Id, InterceptorId, User};

/// Authenticated identity plus its bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub jwt: String,
}

impl Session {
    pub fn user_id(&self) -> &Id {
        &self.user.id
    }

    /// Whether this session's user owns an entity owned by `owner_id`
    pub fn owns(&self, owner_id: &Id) -> bool {
        self.user.id == *owner_id
    }
}

impl From<AuthnResponse> for Session {
    fn from(auth: AuthnResponse) -> Self {
        Self {
            user: auth.user,
            jwt: auth.jwt,
        }
    }
}

// Keep tokens out of logs and panic messages.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("jwt", &"<redacted>")
            .finish()
    }
}

/// Shared handle to the current session
///
/// Clones observe and replace the same session. Replacement is always
/// wholesale; there is no partial mutation.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    state: watch::Sender<Option<Arc<Session>>>,
    installed: Mutex<Option<InterceptorId>>,
}

impl SessionHandle {
    /// Create an anonymous session bound to `client`
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner {
                client,
                state,
                installed: Mutex::new(None),
            }),
        }
    }

    /// Client whose requests carry this session's token
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Current session, if any
    pub fn auth(&self) -> Option<Arc<Session>> {
        self.inner.state.borrow().clone()
    }

    /// Replace the session
    ///
    /// The previous bearer interceptor is ejected and, when `session` is
    /// present, a new one is installed before subscribers are notified, so
    /// any request issued in reaction to the change already sees it.
    pub fn set(&self, session: Option<Session>) {
        self.replace(session.map(Arc::new));
    }

    fn replace(&self, session: Option<Arc<Session>>) {
        {
            let mut installed = self
                .inner
                .installed
                .lock()
                .unwrap_or_else(|e| e.into_inner());

            if let Some(id) = installed.take() {
                self.inner.client.interceptors().eject(id);
            }

            if let Some(session) = &session {
                *installed = Some(
                    self.inner
                        .client
                        .interceptors()
                        .install(Arc::new(BearerAuth::new(session.jwt.clone()))),
                );
            }
        }

        match &session {
            Some(session) => tracing::info!(user_id = %session.user.id, "Session started"),
            None => tracing::info!("Session cleared"),
        }

        self.inner.state.send_replace(session);
    }

    /// Start a session from a login/sign-up response
    pub fn sign_in(&self, auth: AuthnResponse) -> Arc<Session> {
        let session = Arc::new(Session::from(auth));
        self.replace(Some(Arc::clone(&session)));
        session
    }

    /// Drop back to anonymous mode
    pub fn clear(&self) {
        self.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    pub fn user_id(&self) -> Option<Id> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .map(|s| s.user.id.clone())
    }

    /// Whether the current viewer owns an entity owned by `owner_id`
    pub fn owns(&self, owner_id: &Id) -> bool {
        self.inner
            .state
            .borrow()
            .as_ref()
            .is_some_and(|s| s.owns(owner_id))
    }

    /// Watch session changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Session>>> {
        self.inner.state.subscribe()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &self.auth())
            .finish()
    }
}

// ============================================
// Root slot
// ============================================

static ROOT: OnceLock<SessionHandle> = OnceLock::new();

/// Errors from the root slot
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A session provider is already installed")]
    AlreadyInstalled,
}

/// Install the process-wide session; only the composition root does this
pub fn install(handle: SessionHandle) -> Result<(), SessionError> {
    ROOT.set(handle).map_err(|_| SessionError::AlreadyInstalled)
}

/// The installed session
///
/// # Panics
///
/// When called before [`install`]; there is no anonymous fallback.
pub fn current() -> SessionHandle {
    match ROOT.get() {
        Some(handle) => handle.clone(),
        None => panic!("session read outside of the session provider: install() was never called"),
    }
}

/// The installed session, if the composition root has run
pub fn try_current() -> Option<SessionHandle> {
    ROOT.get().cloned()
}
