//! Microsoft account authentication for the launcher
//!
//! Implements the four-hop token chain Minecraft launchers use to turn a
//! Microsoft account into a game session:
//!
//! 1. OAuth2 authorization code + PKCE against Microsoft identity
//! 2. Xbox Live user authentication
//! 3. XSTS authorization
//! 4. Minecraft Services login (session bearer token)
//!
//! The identity-hop artifact is cached on disk between runs; everything
//! downstream is re-derived per launch.
//!
//! # Example
//!
//! ```no_run
//! use em_auth::{AuthClient, AuthConfig, BrowserCodeProvider, FileTokenStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AuthConfig::new("my-client-id");
//!     let provider = BrowserCodeProvider::new(config.redirect_port, config.redirect_timeout);
//!     let client = AuthClient::new(config)?;
//!
//!     let store = FileTokenStore::new(FileTokenStore::default_storage_dir()?).await?;
//!
//!     // Refreshes silently when the cache allows it, otherwise opens
//!     // the browser once for the interactive flow.
//!     let session = client.acquire_session_token(&store, &provider).await?;
//!     let profile = client.fetch_profile(&session).await?;
//!     println!("Logged in as {}", profile.name);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Token Storage
//!
//! Persistence sits behind the [`TokenStore`] trait. [`FileTokenStore`]
//! keeps the cached artifact in a single JSON file with owner-only
//! permissions and an advisory lock; [`MemoryTokenStore`] backs tests
//! and single-run tools. A failed refresh invalidates the cached
//! artifact in place rather than deleting it, so the file remains
//! inspectable after the fallback.

pub mod client;
pub mod config;
pub mod errors;
pub mod file_store;
pub mod models;
pub mod pkce;
pub mod redirect;
pub mod session;
pub mod store;

// Re-export main types
pub use client::AuthClient;
pub use config::{AuthConfig, HttpTimeouts};
pub use errors::{AuthError, Result, XstsDenial};
pub use file_store::FileTokenStore;
pub use models::Profile;
pub use redirect::{BrowserCodeProvider, CodeProvider};
pub use session::{CredentialChain, SessionToken, XblToken, XstsToken};
pub use store::{MemoryTokenStore, TokenStore};
