//! Login and sign-up

use std::sync::Arc;

use super::{ErrorSlot, PageError};
use crate::api::{AuthnRequest, SignupResponse, UserInit};
use crate::session::{Session, SessionHandle};
use crate::views::is_valid_email;

/// Which form the auth page shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthAction {
    #[default]
    Login,
    Signup,
}

pub struct AuthPage {
    session: SessionHandle,
    errors: ErrorSlot,
}

impl AuthPage {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            errors: ErrorSlot::default(),
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors.get()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Arc<Session>, PageError> {
        let result = self.try_login(email, password).await;
        self.errors.track(&result);
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<Arc<Session>, PageError> {
        let auth = self
            .session
            .client()
            .login(&AuthnRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        Ok(self.session.sign_in(auth))
    }

    /// Create an account and sign in as it
    ///
    /// Backends that answer with only the new record get a follow-up login
    /// with the same credentials.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Arc<Session>, PageError> {
        let result = self.try_signup(name, email, password).await;
        self.errors.track(&result);
        result
    }

    async fn try_signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Arc<Session>, PageError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(PageError::Invalid("name must not be empty".to_string()));
        }
        if !is_valid_email(email) {
            return Err(PageError::Invalid(format!("{email:?} is not an email address")));
        }
        if password.is_empty() {
            return Err(PageError::Invalid("password must not be empty".to_string()));
        }

        let response = self
            .session
            .client()
            .signup(&UserInit {
                name: name.to_string(),
                email: email.to_string(),
                password: Some(password.to_string()),
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Sign-up failed");
                e
            })?;

        match response {
            SignupResponse::Authenticated(auth) => Ok(self.session.sign_in(auth)),
            SignupResponse::Registered(user) => {
                tracing::info!(user_id = %user.id, "Account created");
                self.try_login(email, password).await
            }
        }
    }

    /// Run the form selected by `action`; `name` is ignored for logins
    pub async fn submit(
        &self,
        action: AuthAction,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Arc<Session>, PageError> {
        match action {
            AuthAction::Login => self.login(email, password).await,
            AuthAction::Signup => self.signup(name, email, password).await,
        }
    }

    pub fn logout(&self) {
        self.session.clear();
    }
}
