use platformops_core::auth::{LoginRequest, TokenResponse, UserInfo};

use super::PlatformApi;
use crate::error::ApiError;
use crate::query::QueryParams;

impl PlatformApi {
    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let token: TokenResponse = self
            .http
            .post_as("/api/auth/login", &QueryParams::new(), Some(&request))
            .await?;
        Ok(token.access_token)
    }

    /// Profile of the user the current token belongs to.
    pub async fn fetch_current_user(&self) -> Result<UserInfo, ApiError> {
        self.http.get_as("/api/auth/me", &QueryParams::new()).await
    }

    /// Profile for a freshly issued token that is not stored yet.
    pub async fn fetch_user_for_token(&self, token: &str) -> Result<UserInfo, ApiError> {
        self.http
            .get_as_with_token("/api/auth/me", &QueryParams::new(), token)
            .await
    }
}
