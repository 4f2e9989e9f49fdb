use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{MetaError, Result};

/// Base URL assets are served from, addressed purely by content hash
pub const RESOURCES_BASE_URL: &str = "https://resources.download.minecraft.net";

/// Asset index: logical asset names mapped to content-addressed objects.
///
/// Multiple logical names may share one hash; on disk those collapse to
/// a single object file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// Path of the object below the game root:
    /// `assets/objects/<first two hash chars>/<hash>`
    pub fn relative_path(&self) -> Result<String> {
        let prefix = self
            .hash
            .get(..2)
            .ok_or_else(|| MetaError::MalformedAssetHash(self.hash.clone()))?;
        Ok(format!("assets/objects/{}/{}", prefix, self.hash))
    }

    /// Download URL for the object
    pub fn url(&self, base: &Url) -> Result<Url> {
        let prefix = self
            .hash
            .get(..2)
            .ok_or_else(|| MetaError::MalformedAssetHash(self.hash.clone()))?;
        Ok(base.join(&format!("{}/{}", prefix, self.hash))?)
    }
}
