use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TOKEN_EXPIRY_SKEW;
use crate::models::MsTokenResponse;

/// The cached state of an authentication session.
///
/// This is the only artifact the chain persists: it is written as the
/// sole contents of the token cache file after a successful Microsoft
/// exchange and flagged (not deleted) after a failed refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialChain {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Set after a failed refresh; the artifact stays on disk for audit
    /// but no longer short-circuits the interactive flow.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub invalidated: bool,
}

impl CredentialChain {
    pub fn from_response(response: MsTokenResponse) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(response.expires_in as i64);
        Self {
            token_type: response.token_type,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            scope: response.scope,
            user_id: response.user_id,
            invalidated: false,
        }
    }

    pub fn is_expired(&self) -> bool {
        let skew = chrono::Duration::from_std(TOKEN_EXPIRY_SKEW)
            .unwrap_or(chrono::Duration::seconds(300));
        Utc::now() + skew >= self.expires_at
    }

    /// Whether the artifact is worth a silent refresh attempt
    pub fn can_refresh(&self) -> bool {
        !self.invalidated && !self.refresh_token.is_empty()
    }
}

/// Xbox Live token. Transient: produced and consumed within a single
/// chain execution, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XblToken {
    pub token: String,
    pub uhs: String,
    pub issue_instant: Option<String>,
    pub not_after: Option<String>,
}

/// XSTS token. Transient, in-memory only, like [`XblToken`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XstsToken {
    pub token: String,
    pub uhs: String,
    pub issue_instant: Option<String>,
    pub not_after: Option<String>,
}

/// The bearer token the session API hands back at the end of the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn new(access_token: String, expires_in: u64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in as i64);
        Self {
            access_token,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        let skew = chrono::Duration::from_std(TOKEN_EXPIRY_SKEW)
            .unwrap_or(chrono::Duration::seconds(300));
        Utc::now() + skew >= self.expires_at
    }
}
