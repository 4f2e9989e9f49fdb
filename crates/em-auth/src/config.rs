use std::time::Duration;

use url::Url;

/// Default production endpoints for the token chain
pub mod endpoints {
    pub const MS_AUTHORIZE: &str = "https://login.live.com/oauth20_authorize.srf";
    pub const MS_TOKEN: &str = "https://login.live.com/oauth20_token.srf";
    pub const XBL_AUTHENTICATE: &str = "https://user.auth.xboxlive.com/user/authenticate";
    pub const XSTS_AUTHORIZE: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
    pub const MC_LOGIN: &str = "https://api.minecraftservices.com/authentication/login_with_xbox";
    pub const MC_PROFILE: &str = "https://api.minecraftservices.com/minecraft/profile";
}

/// OAuth scope for the Microsoft identity hop
pub const STANDARD_SCOPE: &str = "XboxLive.signin offline_access";

/// Relying parties for the two federated hops
pub const RP_XBOXLIVE: &str = "http://auth.xboxlive.com";
pub const RP_MINECRAFT: &str = "rp://api.minecraftservices.com/";

/// Sandbox identifier sent on the XSTS hop
pub const SANDBOX_RETAIL: &str = "RETAIL";

/// Site name claimed in the Xbox Live authenticate request
pub const XBL_SITE_NAME: &str = "user.auth.xboxlive.com";

/// Time skew for token expiration (refresh 5 minutes early)
pub const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(300);

/// Fixed loopback port the authorization redirect lands on.
///
/// The port is reused across attempts, which is why the listener is
/// single-accept and unbinds as soon as the code arrives.
pub const DEFAULT_REDIRECT_PORT: u16 = 43319;

/// Path component of the redirect URI
pub const DEFAULT_REDIRECT_PATH: &str = "/msa";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Configuration for [`AuthClient`](crate::AuthClient).
///
/// Constructed once per launch attempt and never mutated afterwards.
/// Endpoint URLs are plain fields so tests can point the chain at a
/// local mock server.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth client ID registered for the launcher
    pub client_id: String,

    /// Loopback port the authorization redirect is captured on
    pub redirect_port: u16,

    /// Path component of the redirect URI
    pub redirect_path: String,

    /// Optional bound on how long the redirect listener waits for the
    /// browser. `None` preserves the unbounded wait; callers that need
    /// a user-initiated abort should set this.
    pub redirect_timeout: Option<Duration>,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Custom user agent (optional)
    pub user_agent: Option<String>,

    pub authorize_endpoint: Url,
    pub token_endpoint: Url,
    pub xbl_endpoint: Url,
    pub xsts_endpoint: Url,
    pub session_endpoint: Url,
    pub profile_endpoint: Url,
}

impl AuthConfig {
    /// Create a config with the production endpoints
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_port: DEFAULT_REDIRECT_PORT,
            redirect_path: DEFAULT_REDIRECT_PATH.to_string(),
            redirect_timeout: None,
            http_timeouts: HttpTimeouts::default(),
            user_agent: Some("ember-mc".to_string()),
            authorize_endpoint: Url::parse(endpoints::MS_AUTHORIZE).expect("valid authorize URL"),
            token_endpoint: Url::parse(endpoints::MS_TOKEN).expect("valid token URL"),
            xbl_endpoint: Url::parse(endpoints::XBL_AUTHENTICATE).expect("valid XBL URL"),
            xsts_endpoint: Url::parse(endpoints::XSTS_AUTHORIZE).expect("valid XSTS URL"),
            session_endpoint: Url::parse(endpoints::MC_LOGIN).expect("valid login URL"),
            profile_endpoint: Url::parse(endpoints::MC_PROFILE).expect("valid profile URL"),
        }
    }

    /// The redirect URI the provider sends the authorization code to
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.redirect_port, self.redirect_path)
    }
}
