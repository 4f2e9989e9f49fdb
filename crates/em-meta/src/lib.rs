//! Game version metadata: manifest resolution and artifact descriptors
//!
//! Turns the remote version catalog into a flat list of
//! [`ArtifactDescriptor`]s (assets, libraries, client jar) that the
//! validation and acquisition passes consume. Resolution is pure
//! network-and-parse; nothing in this crate touches the disk.

pub mod artifact;
pub mod assets;
pub mod errors;
pub mod manifest;
pub mod piston;
pub mod resolver;
pub mod rules;

pub use artifact::ArtifactDescriptor;
pub use assets::{AssetIndex, AssetObject, RESOURCES_BASE_URL};
pub use errors::{MetaError, Result};
pub use manifest::{LatestVersions, VersionEntry, VersionManifest};
pub use piston::{DownloadEntry, Library, VersionDetail};
pub use resolver::{ManifestResolver, MetaConfig, VERSION_MANIFEST_URL};
pub use rules::{Arch, HostPlatform, OsFamily, OsRule, Rule, RuleAction, rules_allow};
