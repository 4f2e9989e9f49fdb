use serde::{Deserialize, Serialize};

use crate::errors::{MetaError, Result};

/// OS family as named in manifest rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    Linux,
    Osx,
}

impl OsFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Windows => "windows",
            OsFamily::Linux => "linux",
            OsFamily::Osx => "osx",
        }
    }
}

/// Processor architecture as named in manifest rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64", alias = "x64")]
    X64,
    #[serde(rename = "arm64", alias = "aarch64")]
    Arm64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X64 => "x86_64",
            Arch::Arm64 => "arm64",
        }
    }
}

/// The host an artifact's applicability rules are evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: OsFamily,
    pub arch: Arch,
}

impl HostPlatform {
    /// Detect the platform this process is running on
    pub fn current() -> Self {
        #[cfg(target_os = "windows")]
        let os = OsFamily::Windows;
        #[cfg(target_os = "macos")]
        let os = OsFamily::Osx;
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let os = OsFamily::Linux;

        #[cfg(target_arch = "x86")]
        let arch = Arch::X86;
        #[cfg(target_arch = "aarch64")]
        let arch = Arch::Arm64;
        #[cfg(not(any(target_arch = "x86", target_arch = "aarch64")))]
        let arch = Arch::X64;

        Self { os, arch }
    }

    /// Key into the Java runtime catalog for this host.
    ///
    /// The catalog only publishes runtimes for a fixed set of platform
    /// keys; anything else is an unsupported host, not a fallback.
    pub fn java_runtime_key(&self) -> Result<&'static str> {
        match (self.os, self.arch) {
            (OsFamily::Windows, Arch::X64) => Ok("windows-x64"),
            (OsFamily::Windows, Arch::X86) => Ok("windows-x86"),
            (OsFamily::Windows, Arch::Arm64) => Ok("windows-arm64"),
            (OsFamily::Linux, Arch::X64) => Ok("linux"),
            (OsFamily::Osx, Arch::X64) => Ok("mac-os"),
            (OsFamily::Osx, Arch::Arm64) => Ok("mac-os-arm64"),
            (os, arch) => Err(MetaError::UnsupportedHost {
                os: os.as_str().to_string(),
                arch: arch.as_str().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

/// OS predicate within a rule; absent fields match any value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<OsFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Arch>,
}

impl OsRule {
    fn matches(&self, host: &HostPlatform) -> bool {
        self.name.is_none_or(|name| name == host.os)
            && self.arch.is_none_or(|arch| arch == host.arch)
    }
}

/// One platform-applicability predicate on an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
}

impl Rule {
    /// Whether this predicate holds on `host`.
    ///
    /// An `allow` rule holds when its OS predicate matches (or is
    /// absent); a `disallow` rule holds when it does not match.
    pub fn evaluate(&self, host: &HostPlatform) -> bool {
        let matches = self.os.as_ref().is_none_or(|os| os.matches(host));
        match self.action {
            RuleAction::Allow => matches,
            RuleAction::Disallow => !matches,
        }
    }
}

/// An artifact applies when every rule in its set holds; an empty set
/// always applies.
pub fn rules_allow(rules: &[Rule], host: &HostPlatform) -> bool {
    rules.iter().all(|rule| rule.evaluate(host))
}
