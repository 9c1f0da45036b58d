//! Google OAuth 2.0 authorization-code flow with PKCE.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::auth::session::SessionUser;

pub const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
pub const SCOPES: &str = "openid email profile";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider rejected request: {0}")]
    Provider(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

pub struct GoogleOAuth {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuth {
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            client_id,
            client_secret,
            redirect_uri,
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        })
    }

    /// Points the code exchange and userinfo calls at other endpoints.
    pub fn with_endpoints(mut self, token_url: &str, userinfo_url: &str) -> Self {
        self.token_url = token_url.trim_end_matches('/').to_string();
        self.userinfo_url = userinfo_url.trim_end_matches('/').to_string();
        self
    }

    pub fn authorize_url(&self, state: &str, code_challenge: &str) -> Result<Url, OAuthError> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| OAuthError::InvalidUrl(e.to_string()))?;
        Ok(url)
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<TokenResponse, OAuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code_verifier", verifier),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Provider(format!("token endpoint {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::Provider(e.to_string()))
    }

    pub async fn fetch_user(&self, access_token: &str) -> Result<SessionUser, OAuthError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(OAuthError::Provider(format!("userinfo endpoint {}", status)));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| OAuthError::Provider(e.to_string()))?;

        Ok(SessionUser {
            sub: info.sub,
            email: info.email,
            name: info.name,
            picture: info.picture,
        })
    }
}

pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// S256 PKCE challenge for `verifier`.
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
