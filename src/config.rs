use anyhow::{Context, Result, bail};
use argocd::ClientOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Provider config used when neither the record nor the command names one
pub const DEFAULT_PROVIDER: &str = "default";

/// Environment variable read by `source = "env"` when no `env` is given
pub const DEFAULT_TOKEN_ENV: &str = "ARGOCD_AUTH_TOKEN";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("projsync"))
}

/// Get the local project store used when no server is configured
pub fn default_store_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".local").join("share").join("projsync").join("store"))
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// Named connection settings; records pick one by name
    #[serde(default)]
    pub provider_configs: BTreeMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_provider")]
    pub provider_config: String,

    /// Passes to run in parallel
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Deadline for the remote calls of one reconcile pass; every record in a
    /// batch gets the full budget
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_jobs() -> usize {
    4
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            provider_config: default_provider(),
            jobs: default_jobs(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Server address, e.g. `file://~/argocd-store`
    pub server: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub source: CredentialSource,

    /// Variable to read for `source = "env"`
    #[serde(default)]
    pub env: Option<String>,

    /// File to read for `source = "file"`
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    #[default]
    None,
    Env,
    File,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load config from `path` (or the default path)
    ///
    /// A missing file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Look up a provider config, falling back to the configured default
    ///
    /// The default provider is built in when the file does not define it.
    pub fn provider(&self, name: Option<&str>) -> Result<ProviderConfig> {
        let name = name.unwrap_or(&self.defaults.provider_config);
        if let Some(provider) = self.provider_configs.get(name) {
            return Ok(provider.clone());
        }
        if name == DEFAULT_PROVIDER {
            return ProviderConfig::local();
        }
        bail!("Unknown provider config '{name}'")
    }

    /// Deadline for remote calls, if configured
    pub fn timeout(&self) -> Option<Duration> {
        self.defaults.timeout_secs.map(Duration::from_secs)
    }
}

impl ProviderConfig {
    /// Local store under the user's data directory
    pub fn local() -> Result<Self> {
        Ok(Self {
            server: format!("file://{}", default_store_dir()?.display()),
            insecure: false,
            credentials: Credentials::default(),
        })
    }

    /// Resolve credentials and build client options
    pub fn client_options(&self) -> Result<ClientOptions> {
        Ok(ClientOptions {
            server_addr: expand_server(&self.server),
            auth_token: self.credentials.resolve()?,
            insecure: self.insecure,
        })
    }
}

impl Credentials {
    /// Read the auth token from its source
    pub fn resolve(&self) -> Result<Option<String>> {
        match self.source {
            CredentialSource::None => Ok(None),
            CredentialSource::Env => {
                let var = self.env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
                let token = std::env::var(var)
                    .with_context(|| format!("Credentials variable {var} is not set"))?;
                Ok(Some(token.trim().to_string()))
            }
            CredentialSource::File => {
                let Some(path) = self.path.as_deref() else {
                    bail!("Credentials source is 'file' but no path is set");
                };
                let path = shellexpand::tilde(path);
                let token = fs::read_to_string(path.as_ref())
                    .with_context(|| format!("Failed to read credentials file: {path}"))?;
                Ok(Some(token.trim().to_string()))
            }
        }
    }
}

/// Expand `~` in the path of a `file://` address
fn expand_server(server: &str) -> String {
    match server.strip_prefix("file://") {
        Some(path) => format!("file://{}", shellexpand::tilde(path)),
        None => server.to_string(),
    }
}
