//! Auth backend client and the session gate in front of the editor.
//!
//! Thin HTTP wrapper for `/login`, `/register` and `/handleSession`. Response
//! decoding lives in pure `parse_*` functions for testability; the
//! [`AuthBackend`] trait lets the gate run against an in-memory fake.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::HostConfig;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
    #[error("auth request failed: {0}")]
    Transport(String),
    #[error("auth backend returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("malformed auth response: {0}")]
    Decode(String),
    #[error("session for {email} is not authenticated")]
    Rejected { email: String },
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of a login attempt. Failure carries a user-facing message and no token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterOutcome {
    pub success: bool,
    pub message: String,
}

/// Bearer token plus the email it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub token: String,
    pub email: String,
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// The external auth service. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<LoginOutcome, SessionError>;

    async fn register(&self, email: &str, password: &str, role: Option<&str>) -> Result<RegisterOutcome, SessionError>;

    /// Whether `token` is a live session for `email`.
    async fn validate_session(&self, token: &str, email: &str) -> Result<bool, SessionError>;
}

/// Gate the editor on a valid session.
///
/// A rejected session and a failed check are treated alike: the editor must
/// not mount.
pub async fn require_session(backend: &dyn AuthBackend, creds: &SessionCredentials) -> Result<(), SessionError> {
    match backend.validate_session(&creds.token, &creds.email).await {
        Ok(true) => {
            tracing::info!(email = %creds.email, "session validated");
            Ok(())
        }
        Ok(false) => {
            tracing::warn!(email = %creds.email, "session rejected");
            Err(SessionError::Rejected { email: creds.email.clone() })
        }
        Err(err) => {
            tracing::warn!(email = %creds.email, error = %err, "session check failed; treating as unauthenticated");
            Err(SessionError::Rejected { email: creds.email.clone() })
        }
    }
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpAuthBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(config: &HostConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| SessionError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(u16, String), SessionError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "auth request");
        let response = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn authenticate(&self, email: &str, password: &str) -> Result<LoginOutcome, SessionError> {
        let (status, body) = self.post("/login", &LoginRequest { email, password }).await?;
        parse_login_response(status, &body)
    }

    async fn register(&self, email: &str, password: &str, role: Option<&str>) -> Result<RegisterOutcome, SessionError> {
        let (status, body) = self.post("/register", &RegisterRequest { email, password, role }).await?;
        parse_register_response(status, &body)
    }

    async fn validate_session(&self, token: &str, email: &str) -> Result<bool, SessionError> {
        let (status, body) = self.post("/handleSession", &SessionRequest { token, email }).await?;
        parse_session_response(status, &body)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    token: &'a str,
    email: &'a str,
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct ValidationBody {
    errors: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct SessionBody {
    #[serde(rename = "isAuthenticated")]
    is_authenticated: bool,
}

// =============================================================================
// PARSING
// =============================================================================

fn decode<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, SessionError> {
    serde_json::from_str(body).map_err(|e| SessionError::Decode(e.to_string()))
}

/// Flatten a field → messages map into one line, fields in name order.
fn validation_message(body: &str) -> Result<String, SessionError> {
    let parsed: ValidationBody = decode(body)?;
    let parts: Vec<String> = parsed
        .errors
        .into_iter()
        .flat_map(|(field, messages)| messages.into_iter().map(move |m| format!("{field}: {m}")))
        .collect();
    Ok(parts.join("; "))
}

/// Decode a `/login` response.
pub fn parse_login_response(status: u16, body: &str) -> Result<LoginOutcome, SessionError> {
    match status {
        200 => {
            let parsed: MessageBody = decode(body)?;
            let token = parsed
                .token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| SessionError::Decode("login succeeded without a token".into()))?;
            Ok(LoginOutcome {
                success: true,
                token: Some(token),
                message: parsed.message.unwrap_or_else(|| "Login successful".into()),
            })
        }
        401 => {
            let parsed: MessageBody = decode(body)?;
            Ok(LoginOutcome {
                success: false,
                token: None,
                message: parsed.message.unwrap_or_else(|| "Invalid email or password".into()),
            })
        }
        422 => Ok(LoginOutcome { success: false, token: None, message: validation_message(body)? }),
        status => Err(SessionError::UnexpectedStatus { status, body: body.to_string() }),
    }
}

/// Decode a `/register` response.
pub fn parse_register_response(status: u16, body: &str) -> Result<RegisterOutcome, SessionError> {
    match status {
        200 | 201 => {
            let parsed: MessageBody = decode(body)?;
            Ok(RegisterOutcome {
                success: true,
                message: parsed.message.unwrap_or_else(|| "User registered successfully!".into()),
            })
        }
        422 => Ok(RegisterOutcome { success: false, message: validation_message(body)? }),
        status => Err(SessionError::UnexpectedStatus { status, body: body.to_string() }),
    }
}

/// Decode a `/handleSession` response. HTTP 401 means "not authenticated"
/// whatever the body says.
pub fn parse_session_response(status: u16, body: &str) -> Result<bool, SessionError> {
    match status {
        200 => Ok(decode::<SessionBody>(body)?.is_authenticated),
        401 => Ok(false),
        status => Err(SessionError::UnexpectedStatus { status, body: body.to_string() }),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
