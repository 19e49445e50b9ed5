//! The server operations the session layer depends on.

use async_trait::async_trait;
use deskhub_api::{ApiResult, AuthApi, LoginRequest, LoginResponse, UserProfile};
use deskhub_storage::Credential;

/// Auth endpoints used by [`Bootstrap`](crate::Bootstrap) and
/// [`SessionController`](crate::SessionController).
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse>;

    /// Confirm the stored credential and return its user.
    async fn verify(&self) -> ApiResult<UserProfile>;

    /// Revoke `credential` on the server. It is no longer in the store.
    async fn logout(&self, credential: &Credential) -> ApiResult<()>;

    async fn logout_all(&self, credential: &Credential) -> ApiResult<()>;
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        AuthApi::login(self, request).await
    }

    async fn verify(&self) -> ApiResult<UserProfile> {
        AuthApi::verify(self).await
    }

    async fn logout(&self, credential: &Credential) -> ApiResult<()> {
        AuthApi::logout(self, credential).await
    }

    async fn logout_all(&self, credential: &Credential) -> ApiResult<()> {
        AuthApi::logout_all(self, credential).await
    }
}
