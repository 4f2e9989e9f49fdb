use std::sync::{Arc, RwLock};

use crate::errors::Result;
use crate::session::CredentialChain;

/// Persistence seam for the credential chain artifact.
///
/// The artifact is read once at chain start and written once per
/// successful exchange; `invalidate` flags it after a failed refresh
/// without deleting anything.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Option<CredentialChain>;

    async fn save(&self, chain: &CredentialChain) -> Result<()>;

    async fn invalidate(&self) -> Result<()>;
}

/// In-memory token store for testing and simple use cases
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<CredentialChain>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(chain: CredentialChain) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(chain))),
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Option<CredentialChain> {
        self.slot.read().ok()?.clone()
    }

    async fn save(&self, chain: &CredentialChain) -> Result<()> {
        self.slot
            .write()
            .map_err(|_| crate::errors::AuthError::InvalidResponse("Lock poisoned".to_string()))?
            .replace(chain.clone());
        Ok(())
    }

    async fn invalidate(&self) -> Result<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| crate::errors::AuthError::InvalidResponse("Lock poisoned".to_string()))?;
        if let Some(chain) = slot.as_mut() {
            chain.invalidated = true;
        }
        Ok(())
    }
}
