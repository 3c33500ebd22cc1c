//! Auth and guest session endpoints.

use async_trait::async_trait;
use larder::credentials::Credential;
use mockall::automock;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    domain::sessions::models::{IssuedGuestSession, TokenPair, User},
    http::{ApiClient, ApiError, routes},
};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

#[derive(Debug, Serialize)]
struct MergeRequest<'a> {
    guest_session_key: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: ApiClient,
}

impl HttpSessionApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn create_guest_session(&self) -> Result<IssuedGuestSession, ApiError> {
        let request = self
            .client
            .request(Method::POST, routes::GUEST_SESSION, None);

        self.client.send_json(request).await
    }

    async fn merge_guest_cart(&self, token: &str, guest_session_key: &str) -> Result<(), ApiError> {
        let credential = Credential::Bearer(token.to_string());

        let request = self
            .client
            .request(Method::POST, routes::MERGE_GUEST_CART, Some(&credential))
            .json(&MergeRequest { guest_session_key });

        self.client.send_empty(request).await
    }

    async fn obtain_token(&self, email: &str, password: &str) -> Result<TokenPair, ApiError> {
        let request = self
            .client
            .request(Method::POST, routes::TOKEN, None)
            .json(&LoginRequest { email, password });

        self.client.send_json(request).await
    }

    async fn refresh_token(&self, refresh: &str) -> Result<String, ApiError> {
        let request = self
            .client
            .request(Method::POST, routes::TOKEN_REFRESH, None)
            .json(&RefreshRequest { refresh });

        let response: RefreshResponse = self.client.send_json(request).await?;

        Ok(response.access)
    }

    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        let credential = Credential::Bearer(token.to_string());

        let request = self
            .client
            .request(Method::GET, routes::CURRENT_USER, Some(&credential));

        self.client.send_json(request).await
    }
}

#[automock]
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Ask the shop for a new guest session.
    async fn create_guest_session(&self) -> Result<IssuedGuestSession, ApiError>;

    /// Move the guest cart into the cart of the user owning `token`.
    async fn merge_guest_cart(&self, token: &str, guest_session_key: &str) -> Result<(), ApiError>;

    /// Exchange credentials for an access and refresh token.
    async fn obtain_token(&self, email: &str, password: &str) -> Result<TokenPair, ApiError>;

    /// Exchange a refresh token for a new access token.
    async fn refresh_token(&self, refresh: &str) -> Result<String, ApiError>;

    /// Profile of the user owning `token`.
    async fn current_user(&self, token: &str) -> Result<User, ApiError>;
}
