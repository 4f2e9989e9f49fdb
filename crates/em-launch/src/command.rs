use std::path::{Path, PathBuf};

use em_instance::InstanceConfig;
use em_meta::HostPlatform;

use crate::record::ValidationRecord;

/// Separator the game expects between classpath entries
pub const CLASSPATH_SEPARATOR: char = ';';

const DEFAULT_WINDOW_WIDTH: u64 = 854;
const DEFAULT_WINDOW_HEIGHT: u64 = 480;
const DEFAULT_STACK_SIZE_MB: u64 = 1;

/// Session identity substituted into the game arguments.
///
/// The bearer token enters the launch path only here, as an opaque
/// string; nothing else in validation or acquisition sees it.
#[derive(Debug, Clone)]
pub struct SessionArgs {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
    pub client_id: String,
}

/// Launcher brand/version advertised to the game via system properties
#[derive(Debug, Clone)]
pub struct Branding {
    pub name: String,
    pub version: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "ember".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The final process invocation, built fresh on every launch and never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSpec {
    pub java: PathBuf,
    pub jvm_args: Vec<String>,
    pub main_class: String,
    pub game_args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchSpec {
    /// Space-joined rendering of everything after the executable
    pub fn argument_string(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.jvm_args.iter().map(String::as_str));
        parts.push(&self.main_class);
        parts.extend(self.game_args.iter().map(String::as_str));
        parts.join(" ")
    }

    /// Ready-to-spawn process handle
    pub fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.java);
        command
            .args(&self.jvm_args)
            .arg(&self.main_class)
            .args(&self.game_args)
            .current_dir(&self.working_dir);
        command
    }
}

/// Deterministically renders a [`LaunchSpec`] from validated state.
///
/// Building performs no I/O: every path is derived from the record and
/// configuration, and the natives directory is named, not created.
#[derive(Debug, Clone)]
pub struct LaunchCommandBuilder {
    root: PathBuf,
    host: HostPlatform,
    branding: Branding,
    java: PathBuf,
}

impl LaunchCommandBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            host: HostPlatform::current(),
            branding: Branding::default(),
            java: PathBuf::from("java"),
        }
    }

    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    pub fn with_branding(mut self, branding: Branding) -> Self {
        self.branding = branding;
        self
    }

    pub fn build(
        &self,
        config: &InstanceConfig,
        record: &ValidationRecord,
        session: &SessionArgs,
    ) -> LaunchSpec {
        // Loader substitution happens before classpath assembly: the
        // rendered classpath must already name the loader jar.
        let client_jar = match &config.modloader {
            Some(loader) => self.resolve(&format!(
                "versions/{}/{}.jar",
                loader.version_id, loader.version_id
            )),
            None => self.resolve(&record.client_jar),
        };

        let mut classpath: Vec<String> = record
            .libraries
            .iter()
            .filter(|lib| lib.applies_to(&self.host))
            .map(|lib| lib.destination(&self.root).display().to_string())
            .collect();
        classpath.extend(config.additional_class_paths.iter().cloned());
        classpath.push(client_jar);
        let classpath = classpath.join(&CLASSPATH_SEPARATOR.to_string());

        let (min_memory, max_memory, stack_size) = match &config.java {
            Some(java) => (
                java.min_memory,
                java.max_memory,
                java.stack_size.unwrap_or(DEFAULT_STACK_SIZE_MB),
            ),
            None => (1024, 2048, DEFAULT_STACK_SIZE_MB),
        };

        let natives = self.resolve(&format!("natives/{}", record.version_id));
        let mut jvm_args = vec![
            format!("-Xms{}M", min_memory),
            format!("-Xmx{}M", max_memory),
            format!("-Xss{}M", stack_size),
            format!("-Djava.library.path={}", natives),
            format!("-Djna.tmpdir={}", natives),
            format!("-Dorg.lwjgl.system.SharedLibraryExtractPath={}", natives),
            format!("-Dio.netty.native.workdir={}", natives),
            format!("-Dminecraft.launcher.brand={}", self.branding.name),
            format!("-Dminecraft.launcher.version={}", self.branding.version),
            "-cp".to_string(),
            classpath,
        ];
        jvm_args.extend(config.extra_jvm_args.iter().cloned());

        let (width, height) = match &config.window {
            Some(window) => (window.width, window.height),
            None => (DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT),
        };

        let mut game_args = vec![
            "--uuid".to_string(),
            session.uuid.clone(),
            "--username".to_string(),
            session.username.clone(),
            "--version".to_string(),
            config.game_version.clone(),
            "--gameDir".to_string(),
            self.root.display().to_string(),
            "--assetsDir".to_string(),
            self.resolve("assets"),
            "--assetIndex".to_string(),
            record.asset_index.clone(),
            "--accessToken".to_string(),
            session.access_token.clone(),
            "--clientId".to_string(),
            session.client_id.clone(),
            "--width".to_string(),
            width.to_string(),
            "--height".to_string(),
            height.to_string(),
        ];
        game_args.extend(config.extra_game_args.iter().cloned());

        let main_class = config
            .modloader
            .as_ref()
            .and_then(|loader| loader.main_class.clone())
            .unwrap_or_else(|| record.main_class.clone());

        let java = config
            .java
            .as_ref()
            .map(|java| PathBuf::from(&java.path))
            .unwrap_or_else(|| self.java.clone());

        LaunchSpec {
            java,
            jvm_args,
            main_class,
            game_args,
            working_dir: self.root.clone(),
        }
    }

    fn resolve(&self, logical: &str) -> String {
        logical
            .split('/')
            .fold(self.root.clone(), |p, seg| p.join(seg))
            .display()
            .to_string()
    }
}
