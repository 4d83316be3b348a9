//! Client-credential token acquisition for the Microsoft Graph mail API

use serde::Deserialize;
use std::env;

use crate::error::{ReportError, Result};

pub const CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
pub const TENANT_ID_ENV: &str = "AZURE_TENANT_ID";

/// Application credentials for the client-credentials grant
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl ClientCredentials {
    /// Read credentials from `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and `AZURE_TENANT_ID`
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: required_env(CLIENT_ID_ENV)?,
            client_secret: required_env(CLIENT_SECRET_ENV)?,
            tenant_id: required_env(TENANT_ID_ENV)?,
        })
    }
}

fn required_env(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ReportError::Auth(format!("Environment variable {} is not set", name)))
}

/// Bearer token for the mail API. Expiry is recorded but not managed.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

pub fn token_endpoint(authority_base: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        authority_base.trim_end_matches('/'),
        tenant_id
    )
}

/// Exchange client credentials for a bearer token.
///
/// Any response without a non-empty `access_token` is an auth failure,
/// whatever its HTTP status.
pub async fn acquire_token(
    http: &reqwest::Client,
    credentials: &ClientCredentials,
    authority_base: &str,
    scope: &str,
) -> Result<AccessToken> {
    let url = token_endpoint(authority_base, &credentials.tenant_id);

    let response = http
        .post(&url)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("scope", scope),
            ("grant_type", "client_credentials"),
        ])
        .send()
        .await
        .map_err(|e| ReportError::Auth(format!("Token request to {} failed: {}", url, e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ReportError::Auth(format!("Failed to read token response: {}", e)))?;

    let payload: TokenResponse = serde_json::from_str(&body).map_err(|_| {
        ReportError::Auth(format!(
            "Token endpoint returned HTTP {} with an unreadable body",
            status.as_u16()
        ))
    })?;

    match payload.access_token.filter(|t| !t.is_empty()) {
        Some(token) => Ok(AccessToken {
            token,
            expires_in: payload.expires_in,
        }),
        None => Err(ReportError::Auth(format!(
            "No access token in response (HTTP {}): {} {}",
            status.as_u16(),
            payload.error.unwrap_or_else(|| "unknown_error".to_string()),
            payload.error_description.unwrap_or_default()
        ))),
    }
}
