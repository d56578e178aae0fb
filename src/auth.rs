use chrono::Utc;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::backend::BackendError;
use crate::rest::read_body;

/// Seconds before expiry at which a stored session stops opening the admin area.
const EXPIRY_SLACK_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
    #[serde(default)]
    pub email: String,
}

impl Session {
    pub fn is_active_at(&self, now: i64) -> bool {
        !self.access_token.is_empty() && self.expires_at - EXPIRY_SLACK_SECS > now
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now().timestamp())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Public,
    Login,
    Admin,
}

/// Admin requires an active session; without one the user lands on Login.
pub fn gate(route: Route, session: Option<&Session>, now: i64) -> Route {
    match route {
        Route::Admin if !session.is_some_and(|s| s.is_active_at(now)) => Route::Login,
        other => other,
    }
}

pub trait Auth: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    fn sign_out(&self, session: &Session) -> Result<(), BackendError>;
}

/// GoTrue endpoint of a hosted project (`{base}/auth/v1`).
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(client: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

impl Auth for AuthClient {
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let resp = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let body = read_body(resp)?;
        parse_token_response(&body, Utc::now().timestamp())
    }

    fn sign_out(&self, session: &Session) -> Result<(), BackendError> {
        let resp = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        read_body(resp).map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    #[serde(default)]
    email: Option<String>,
}

pub fn parse_token_response(raw: &str, now: i64) -> Result<Session, BackendError> {
    let parsed: TokenResponse =
        serde_json::from_str(raw.trim()).map_err(|e| BackendError::Decode(e.to_string()))?;
    let expires_at = parsed
        .expires_at
        .or_else(|| parsed.expires_in.map(|secs| now + secs))
        .unwrap_or(now + 3600);
    Ok(Session {
        access_token: parsed.access_token,
        refresh_token: parsed.refresh_token,
        expires_at,
        email: parsed.user.and_then(|u| u.email).unwrap_or_default(),
    })
}

/// Fixed-credential auth for demo mode.
pub struct DemoAuth {
    email: String,
    password: String,
}

impl DemoAuth {
    pub const EMAIL: &'static str = "admin@demo.club";
    pub const PASSWORD: &'static str = "admin123";

    pub fn new() -> Self {
        Self {
            email: Self::EMAIL.to_string(),
            password: Self::PASSWORD.to_string(),
        }
    }
}

impl Default for DemoAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl Auth for DemoAuth {
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        if !email.trim().eq_ignore_ascii_case(&self.email) || password != self.password {
            return Err(BackendError::Http {
                status: 400,
                code: Some("invalid_credentials".to_string()),
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(Session {
            access_token: "demo-token".to_string(),
            refresh_token: String::new(),
            expires_at: Utc::now().timestamp() + 8 * 3600,
            email: self.email.clone(),
        })
    }

    fn sign_out(&self, _session: &Session) -> Result<(), BackendError> {
        Ok(())
    }
}
