use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{
    AuthConfig, RP_MINECRAFT, RP_XBOXLIVE, SANDBOX_RETAIL, STANDARD_SCOPE, XBL_SITE_NAME,
};
use crate::errors::{AuthError, Result, XstsDenial};
use crate::models::*;
use crate::pkce;
use crate::redirect::CodeProvider;
use crate::session::{CredentialChain, SessionToken, XblToken, XstsToken};
use crate::store::TokenStore;

/// Client for the four-hop token chain.
///
/// Each hop depends on the previous one's output and fails closed: a
/// non-success response becomes a typed error carrying the upstream
/// body and the token that was being exchanged, and the chain aborts.
/// The only retry path is refresh-then-interactive on the first hop.
#[derive(Debug, Clone)]
pub struct AuthClient {
    config: AuthConfig,
    http: Client,
}

impl AuthClient {
    /// Create a new authentication client
    pub fn new(config: AuthConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("ember-mc"))
            .build()?;

        Ok(Self { config, http })
    }

    /// Build the authorization URL for the user to visit
    #[instrument(skip(self, challenge))]
    pub fn build_authorize_url(&self, challenge: &str, state: Option<&str>) -> Url {
        let mut url = self.config.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.config.redirect_uri())
            .append_pair("scope", STANDARD_SCOPE)
            .append_pair("prompt", "select_account")
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", "S256");

        if let Some(s) = state {
            url.query_pairs_mut().append_pair("state", s);
        }

        debug!("Built authorize URL: {}", url);
        url
    }

    /// Exchange an authorization code for the identity token
    #[instrument(skip(self, code, verifier))]
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<CredentialChain> {
        debug!("Exchanging authorization code for identity tokens");
        let response = self
            .http
            .post(self.config.token_endpoint.clone())
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("code", code),
                ("code_verifier", verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", &self.config.redirect_uri()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::MicrosoftExchange {
                client_id: self.config.client_id.clone(),
                grant: code.to_string(),
                body,
            });
        }

        let token_response: MsTokenResponse = response.json().await?;
        Ok(CredentialChain::from_response(token_response))
    }

    /// Silently refresh the identity token from a cached artifact
    #[instrument(skip(self, chain))]
    pub async fn refresh(&self, chain: &CredentialChain) -> Result<CredentialChain> {
        debug!("Refreshing identity token");
        let response = self
            .http
            .post(self.config.token_endpoint.clone())
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", chain.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
                ("redirect_uri", &self.config.redirect_uri()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::MicrosoftExchange {
                client_id: self.config.client_id.clone(),
                grant: chain.refresh_token.clone(),
                body,
            });
        }

        let token_response: MsTokenResponse = response.json().await?;
        Ok(CredentialChain::from_response(token_response))
    }

    /// Federated exchange #1: identity token for an Xbox Live token
    #[instrument(skip(self, ms_access_token))]
    pub async fn xbl_authenticate(&self, ms_access_token: &str) -> Result<XblToken> {
        let rps_ticket = format!("d={}", ms_access_token);
        let request = XblAuthRequest {
            properties: XblAuthProperties {
                auth_method: "RPS".to_string(),
                site_name: XBL_SITE_NAME.to_string(),
                rps_ticket: rps_ticket.clone(),
            },
            relying_party: RP_XBOXLIVE.to_string(),
            token_type: "JWT".to_string(),
        };

        debug!("Authenticating with Xbox Live");
        let response = self
            .http
            .post(self.config.xbl_endpoint.clone())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::XboxLive { rps_ticket, body });
        }

        let xbl_response: XblAuthResponse = response.json().await?;
        let uhs = xbl_response
            .display_claims
            .xui
            .first()
            .ok_or_else(|| AuthError::InvalidResponse("Missing XUI claims".to_string()))?
            .uhs
            .clone();

        Ok(XblToken {
            token: xbl_response.token,
            uhs,
            issue_instant: xbl_response.issue_instant,
            not_after: xbl_response.not_after,
        })
    }

    /// Federated exchange #2: Xbox Live token for an XSTS token
    #[instrument(skip(self, xbl))]
    pub async fn xsts_authorize(&self, xbl: &XblToken) -> Result<XstsToken> {
        let request = XstsAuthRequest {
            properties: XstsAuthProperties {
                sandbox_id: SANDBOX_RETAIL.to_string(),
                user_tokens: vec![xbl.token.clone()],
            },
            relying_party: RP_MINECRAFT.to_string(),
            token_type: "JWT".to_string(),
        };

        debug!("Authorizing with XSTS");
        let response = self
            .http
            .post(self.config.xsts_endpoint.clone())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            let denial = serde_json::from_str::<XstsErrorResponse>(&body)
                .ok()
                .map(|e| XstsDenial::from_xerr(e.xerr));
            return Err(AuthError::Xsts {
                xbl_token: xbl.token.clone(),
                body,
                denial,
            });
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Xsts {
                xbl_token: xbl.token.clone(),
                body,
                denial: None,
            });
        }

        let xsts_response: XstsAuthResponse = response.json().await?;
        let uhs = xsts_response
            .display_claims
            .xui
            .first()
            .ok_or_else(|| AuthError::InvalidResponse("Missing XUI claims".to_string()))?
            .uhs
            .clone();

        Ok(XstsToken {
            token: xsts_response.token,
            uhs,
            issue_instant: xsts_response.issue_instant,
            not_after: xsts_response.not_after,
        })
    }

    /// Final hop: XSTS token for the session bearer token
    #[instrument(skip(self, xsts))]
    pub async fn session_login(&self, xsts: &XstsToken) -> Result<SessionToken> {
        let request = SessionLoginRequest {
            identity_token: format!("XBL3.0 x={};{}", xsts.uhs, xsts.token),
            ensure_legacy_enabled: true,
        };

        debug!("Logging in to the session API");
        let response = self
            .http
            .post(self.config.session_endpoint.clone())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::SessionBearer {
                xsts_token: xsts.token.clone(),
                body,
            });
        }

        let login: SessionLoginResponse = response.json().await?;
        Ok(SessionToken::new(login.access_token, login.expires_in))
    }

    /// Fetch the game profile for a session bearer token
    #[instrument(skip(self, session))]
    pub async fn fetch_profile(&self, session: &SessionToken) -> Result<Profile> {
        debug!("Fetching game profile");
        let response = self
            .http
            .get(self.config.profile_endpoint.clone())
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Http {
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }

        let profile: Profile = response.json().await?;
        Ok(profile)
    }

    /// Run the whole chain: identity token (refresh-first, interactive
    /// fallback) → Xbox Live → XSTS → session bearer.
    ///
    /// The cached artifact is refreshed silently when possible; a failed
    /// refresh invalidates the cache and falls back to the interactive
    /// flow exactly once. Cache write failures are logged, not fatal:
    /// the freshly exchanged tokens are still usable.
    #[instrument(skip(self, store, interactive))]
    pub async fn acquire_session_token(
        &self,
        store: &dyn TokenStore,
        interactive: &dyn CodeProvider,
    ) -> Result<SessionToken> {
        let chain = self.identity_token(store, interactive).await?;
        let xbl = self.xbl_authenticate(&chain.access_token).await?;
        let xsts = self.xsts_authorize(&xbl).await?;
        self.session_login(&xsts).await
    }

    async fn identity_token(
        &self,
        store: &dyn TokenStore,
        interactive: &dyn CodeProvider,
    ) -> Result<CredentialChain> {
        if let Some(cached) = store.load().await
            && cached.can_refresh()
        {
            match self.refresh(&cached).await {
                Ok(fresh) => {
                    self.persist(store, &fresh).await;
                    return Ok(fresh);
                }
                Err(e) => {
                    warn!("Silent refresh failed, falling back to interactive flow: {}", e);
                    if let Err(e) = store.invalidate().await {
                        warn!("Failed to invalidate token cache: {}", e);
                    }
                }
            }
        }

        self.interactive_exchange(store, interactive).await
    }

    async fn interactive_exchange(
        &self,
        store: &dyn TokenStore,
        interactive: &dyn CodeProvider,
    ) -> Result<CredentialChain> {
        let verifier = pkce::generate_verifier()?;
        let challenge = pkce::code_challenge(&verifier);
        let authorize_url = self.build_authorize_url(&challenge, None);

        let code = interactive.obtain_code(&authorize_url).await?;
        let chain = self.exchange_code(&code, &verifier).await?;
        self.persist(store, &chain).await;

        Ok(chain)
    }

    async fn persist(&self, store: &dyn TokenStore, chain: &CredentialChain) {
        if let Err(e) = store.save(chain).await {
            warn!("Failed to write token cache, continuing with in-memory tokens: {}", e);
        }
    }
}
