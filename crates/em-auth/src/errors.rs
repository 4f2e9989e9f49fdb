use thiserror::Error;

/// Token chain error types.
///
/// Every protocol hop has its own variant carrying the upstream
/// response body and the token or claim that was being exchanged, so a
/// failure can be audited without unwinding anything.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User cancelled the authentication flow")]
    UserCancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("Microsoft token exchange failed for client '{client_id}': {body}")]
    MicrosoftExchange {
        client_id: String,
        /// The authorization code or refresh token that was submitted
        grant: String,
        body: String,
    },

    #[error("Xbox Live authentication failed: {body}")]
    XboxLive {
        /// The RPS ticket ("d=<identity token>") that was submitted
        rps_ticket: String,
        body: String,
    },

    #[error("XSTS authorization failed: {body}")]
    Xsts {
        /// The Xbox Live token that was submitted
        xbl_token: String,
        body: String,
        denial: Option<XstsDenial>,
    },

    #[error("Session bearer exchange failed: {body}")]
    SessionBearer {
        /// The XSTS token that was submitted
        xsts_token: String,
        body: String,
    },

    #[error("Authorization redirect did not carry a 'code' parameter")]
    MissingCode,

    #[error("Redirect listener timed out waiting for the browser")]
    RedirectTimeout,

    #[error("Failed to gather entropy for the code verifier: {0}")]
    Entropy(String),

    #[error("Token cache is locked by another process")]
    CacheLocked,

    #[error("JSON serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// XSTS-specific denial codes from the XErr field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XstsDenial {
    #[error("Account doesn't have an Xbox account (XErr: 2148916233)")]
    NoXboxAccount,

    #[error("Xbox Live not available in this country (XErr: 2148916235)")]
    RegionNotSupported,

    #[error("Adult verification required on Xbox page (XErr: 2148916236/2148916237)")]
    AdultVerificationRequired,

    #[error("Child account requires Family (XErr: 2148916238)")]
    ChildAccountRequiresFamily,

    #[error("Unknown XSTS error code: {0}")]
    Unknown(u64),
}

impl XstsDenial {
    /// Parse an XErr code from an XSTS response
    pub fn from_xerr(code: u64) -> Self {
        match code {
            2148916233 => Self::NoXboxAccount,
            2148916235 => Self::RegionNotSupported,
            2148916236 | 2148916237 => Self::AdultVerificationRequired,
            2148916238 => Self::ChildAccountRequiresFamily,
            code => Self::Unknown(code),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
