//! Sign-up and login

use reqwest::Method;

use super::client::ApiClient;
use super::dto::{AuthnRequest, AuthnResponse, SignupResponse, UserInit};
use super::error::ApiResult;

impl ApiClient {
    /// `POST /users`
    pub async fn signup(&self, init: &UserInit) -> ApiResult<SignupResponse> {
        self.send_json(Method::POST, "/users", init).await
    }

    /// `POST /login`
    pub async fn login(&self, request: &AuthnRequest) -> ApiResult<AuthnResponse> {
        self.send_json(Method::POST, "/login", request).await
    }
}
