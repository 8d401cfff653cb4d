//! Token authentication
//!
//! The auth endpoint is queried with the account credentials in
//! `X-Auth-User` / `X-Auth-Key` and answers with the storage URL and a token
//! valid for `X-Expire-Auth-Token` seconds.

use cs_core::{Account, Error, Result};
use jiff::{SignedDuration, Timestamp};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};

use crate::client::network_error;

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    storage_url: String,
    token: String,
    expires_at: Option<Timestamp>,
}

impl Session {
    pub fn new(
        storage_url: impl Into<String>,
        token: impl Into<String>,
        expires_at: Option<Timestamp>,
    ) -> Self {
        Self {
            storage_url: storage_url.into(),
            token: token.into(),
            expires_at,
        }
    }

    /// Root URL of the account's storage
    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Whether the token has run out; sessions without an expiry never do
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Exchange the account credentials for a session
pub async fn authenticate(client: &Client, account: &Account) -> Result<Session> {
    let response = client
        .get(&account.auth_url)
        .header("X-Auth-User", &account.user)
        .header("X-Auth-Key", &account.key)
        .send()
        .await
        .map_err(network_error)?;

    let status = response.status();
    tracing::debug!(account = %account.name, status = status.as_u16(), "Authenticate");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(Error::Auth(format!(
                "Credentials rejected for account '{}'",
                account.name
            )));
        }
        s if !s.is_success() => {
            return Err(Error::Network(format!(
                "Authentication endpoint answered HTTP {}",
                s.as_u16()
            )));
        }
        _ => {}
    }

    session_from_headers(response.headers(), Timestamp::now())
}

fn session_from_headers(headers: &HeaderMap, now: Timestamp) -> Result<Session> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let storage_url = header("x-storage-url")
        .ok_or_else(|| Error::Auth("Response carried no X-Storage-Url".into()))?;
    let token = header("x-auth-token")
        .ok_or_else(|| Error::Auth("Response carried no X-Auth-Token".into()))?;
    let expires_at = header("x-expire-auth-token")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| now.checked_add(SignedDuration::from_secs(secs)).ok());

    Ok(Session::new(storage_url, token, expires_at))
}
