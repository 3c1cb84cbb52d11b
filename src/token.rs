use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::config::TrelloOauthConfig;

const TOKEN_URL: &str = "https://trello.com/oauth2/token";

/// A refreshed access token and when it stops being valid. Cached by the
/// caller; the store never writes tokens into ambient process state.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Seam for the 401 retry path in `sync`; implemented by
/// `TrelloTokenStore` and by test doubles.
#[async_trait]
pub trait RefreshTokens: Send {
    async fn refresh(&mut self) -> Result<AccessToken>;
}

/// Exchanges a Trello OAuth refresh token for a fresh access token.
/// Refresh is explicit; the caller decides when (on authorization failure).
pub struct TrelloTokenStore {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    client: reqwest::Client,
}

impl TrelloTokenStore {
    pub fn new(oauth: &TrelloOauthConfig) -> Self {
        Self {
            client_id: oauth.client_id.clone(),
            client_secret: oauth.client_secret.clone(),
            refresh_token: oauth.refresh_token.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn refresh(&mut self) -> Result<AccessToken> {
        let resp = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .context("Trello token refresh request failed")?;

        if !resp.status().is_success() {
            bail!("Trello token refresh returned {}", resp.status());
        }

        let tokens: TokenResponse = resp
            .json()
            .await
            .context("Failed to parse Trello token response")?;

        // The endpoint may rotate the refresh token; keep the newest one for
        // the next refresh in this process.
        if let Some(rotated) = tokens.refresh_token {
            self.refresh_token = rotated;
        }

        Ok(AccessToken {
            token: tokens.access_token,
            expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
        })
    }
}

#[async_trait]
impl RefreshTokens for TrelloTokenStore {
    async fn refresh(&mut self) -> Result<AccessToken> {
        TrelloTokenStore::refresh(self).await
    }
}
