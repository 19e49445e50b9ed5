//! `/auth/*` endpoints.

use crate::types::{
    DeviceSession, Id, LoginRequest, LoginResponse, PasswordChange, ProfileUpdate,
    SessionsResponse, UserEnvelope, UserProfile,
};
use crate::{ApiClient, ApiResult, PendingRequest};
use deskhub_storage::Credential;

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `POST /auth/login`. A 401 here means bad credentials, not an expired token.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        let pending = PendingRequest::post("/auth/login")
            .with_json(request)?
            .skip_refresh();
        self.client.send(pending).await
    }

    /// `POST /auth/refresh` with the stored credential. Persists the new one.
    pub async fn refresh(&self) -> ApiResult<Credential> {
        let current = self.client.credentials().get().await;
        self.client.refresh(current.as_ref()).await
    }

    /// `GET /auth/verify`
    pub async fn verify(&self) -> ApiResult<UserProfile> {
        let envelope: UserEnvelope = self
            .client
            .send(PendingRequest::get("/auth/verify"))
            .await?;
        Ok(envelope.user)
    }

    /// `POST /auth/logout` with `credential`, which the caller may already
    /// have removed from the store. An expired token has nothing left to
    /// revoke, so this never refreshes.
    pub async fn logout(&self, credential: &Credential) -> ApiResult<()> {
        self.client
            .send_empty_as(PendingRequest::post("/auth/logout"), credential)
            .await
    }

    /// `POST /auth/logout-all`
    pub async fn logout_all(&self, credential: &Credential) -> ApiResult<()> {
        self.client
            .send_empty_as(PendingRequest::post("/auth/logout-all"), credential)
            .await
    }

    /// `GET /auth/profile`
    pub async fn profile(&self) -> ApiResult<UserProfile> {
        let envelope: UserEnvelope = self
            .client
            .send(PendingRequest::get("/auth/profile"))
            .await?;
        Ok(envelope.user)
    }

    /// `PUT /auth/profile` with name/phone; returns the updated user.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        let envelope: UserEnvelope = self
            .client
            .send(PendingRequest::put("/auth/profile").with_json(update)?)
            .await?;
        Ok(envelope.user)
    }

    /// `PUT /auth/profile` with a password change.
    pub async fn change_password(&self, change: &PasswordChange) -> ApiResult<()> {
        self.client
            .send_empty(PendingRequest::put("/auth/profile").with_json(change)?)
            .await
    }

    /// `GET /auth/sessions`
    pub async fn sessions(&self) -> ApiResult<Vec<DeviceSession>> {
        let response: SessionsResponse = self
            .client
            .send(PendingRequest::get("/auth/sessions"))
            .await?;
        Ok(response.sessions)
    }

    /// `DELETE /auth/sessions/{id}`
    pub async fn revoke_session(&self, id: &Id) -> ApiResult<()> {
        self.client
            .send_empty(PendingRequest::delete(format!("/auth/sessions/{}", id)))
            .await
    }
}
