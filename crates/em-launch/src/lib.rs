//! Validation, acquisition and launch-command assembly
//!
//! The flow for one launch attempt:
//!
//! 1. [`Launcher::prepare`] resolves the version metadata, validates
//!    the game root and concurrently downloads whatever is missing,
//!    leaving behind a [`ValidationRecord`].
//! 2. [`LaunchCommandBuilder::build`] renders a [`LaunchSpec`] from the
//!    record, the instance configuration and the session identity.
//!    Building is pure; spawning the process is the caller's move.
//!
//! Download failures are collected per artifact rather than raised, so
//! a retry can target exactly the files that failed.

pub mod acquire;
pub mod command;
pub mod errors;
pub mod launcher;
pub mod record;
pub mod validate;

pub use acquire::{AcquireOutcome, Acquirer, ProgressCallback};
pub use command::{
    Branding, CLASSPATH_SEPARATOR, LaunchCommandBuilder, LaunchSpec, SessionArgs,
};
pub use errors::{LaunchError, Result};
pub use launcher::{Launcher, PrepareReport};
pub use record::ValidationRecord;
pub use validate::{ValidationOutcome, Validator};
