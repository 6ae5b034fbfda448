use crate::script::ScriptError;
use crate::session::SessionError;

/// Top-level failure of a `layoutpad` command.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("missing session token; pass --token or set LAYOUTPAD_TOKEN")]
    MissingToken,
    #[error("missing email; pass --email or set LAYOUTPAD_EMAIL")]
    MissingEmail,
    #[error("auth backend refused the request: {0}")]
    Denied(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
