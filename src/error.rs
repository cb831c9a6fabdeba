use std::ops::Range;

/// All errors that can come out of a Roblox API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A non-2xx response, surfaced verbatim. Never retried here.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Json(#[from] serde_json::Error),

    #[error("user {user_id} is not a member of group {group_id}")]
    NotInGroup { user_id: u64, group_id: u64 },

    #[error("group has no role with rank number {0}")]
    RoleNotFound(u8),

    #[error("target role index {requested} is outside the valid range {valid:?}")]
    RankOutOfBounds { requested: i64, valid: Range<i64> },

    #[error("unrecognized audit action kind {0:?}")]
    UnrecognizedActionKind(String),

    #[error("audit entry tagged {kind:?} is missing key {key:?}")]
    MalformedAuditEntry { kind: String, key: String },

    #[error("ROBLOSECURITY is not set")]
    MissingCookie,

    #[error("{0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
