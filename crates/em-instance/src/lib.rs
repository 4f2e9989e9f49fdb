//! Instance definitions and on-disk catalog
//!
//! An instance is a named game directory plus its `instance.toml`
//! settings: game version, window size, Java runtime, modloader and
//! extra launch arguments.

pub mod config;
mod instance;
mod manager;

pub use config::{InstanceConfig, JavaConfig, ModLoader, ModLoaderConfig, WindowConfig};
pub use instance::{Instance, default_instances_dir};
pub use manager::{InstanceManager, InstanceManagerError};
