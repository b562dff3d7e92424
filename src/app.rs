//! Composition root
//!
//! Builds the API client and the session from configuration and hands the
//! session explicitly to every page it opens.

use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::config::{Config, ConfigError};
use crate::pages::{AuthPage, FeedPage, PostPage, ProfilePage};
use crate::session::{self, SessionError, SessionHandle};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One client run: one backend, one session
#[derive(Debug, Clone)]
pub struct App {
    config: Config,
    session: SessionHandle,
}

impl App {
    /// Build an app without touching the process-wide session slot
    pub fn new(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let client = ApiClient::new(config.client_config())?;
        tracing::debug!(base_url = %client.base_url(), "API client ready");

        Ok(Self {
            config,
            session: SessionHandle::new(client),
        })
    }

    /// Build the app and install its session as the process-wide one
    pub fn install(config: Config) -> Result<Self, AppError> {
        let app = Self::new(config)?;
        session::install(app.session.clone())?;
        Ok(app)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn client(&self) -> &ApiClient {
        self.session.client()
    }

    pub fn feed(&self) -> FeedPage {
        FeedPage::new(self.session.clone())
    }

    pub fn post_page(&self) -> PostPage {
        PostPage::new(self.session.clone())
    }

    pub fn profile(&self) -> ProfilePage {
        ProfilePage::new(self.session.clone())
    }

    pub fn auth(&self) -> AuthPage {
        AuthPage::new(self.session.clone())
    }
}
