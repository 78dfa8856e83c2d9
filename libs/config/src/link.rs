//! Link Configuration Module
//!
//! Provides configuration loading for a single MAVLink link: the identity
//! this end stamps into outgoing headers, the wire version, signing and the
//! dictionaries that make up its schema registry. Loaded from TOML with
//! `GROUNDLINK_` environment overrides.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use groundlink_codec::{HeaderContext, MavlinkVersion, SecretKeySafe};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default environment prefix (`GROUNDLINK_LINK__SYSTEM_ID=42`)
pub const ENV_PREFIX: &str = "GROUNDLINK";

/// Top-level configuration file
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct GroundlinkConfig {
    pub link: LinkSettings,
    pub logging: LoggingSettings,
}

/// Wire version written by the encoder
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WireVersion {
    V1,
    #[default]
    V2,
}

impl From<WireVersion> for MavlinkVersion {
    fn from(version: WireVersion) -> Self {
        match version {
            WireVersion::V1 => MavlinkVersion::V1,
            WireVersion::V2 => MavlinkVersion::V2,
        }
    }
}

/// `[link]` table
#[derive(Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LinkSettings {
    pub system_id: u8,
    pub component_id: u8,
    pub link_id: u8,
    pub compat_flags: u8,
    pub signing: bool,
    pub version: WireVersion,

    /// Shared signing key, hex encoded. `$VAR` references are expanded.
    /// Cleared by [`LinkSettings::take_secret_key_safe`].
    pub secret_key_hex: Option<String>,

    /// Dictionary files; relative paths resolve against the config file
    pub dictionaries: Vec<PathBuf>,

    /// Register the bundled HEARTBEAT dictionary
    pub include_minimal: bool,
}

/// `[logging]` table
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            // ground control station identity
            system_id: 255,
            component_id: 190,
            link_id: 0,
            compat_flags: 0,
            signing: false,
            version: WireVersion::V2,
            secret_key_hex: None,
            dictionaries: Vec::new(),
            include_minimal: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl fmt::Debug for LinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkSettings")
            .field("system_id", &self.system_id)
            .field("component_id", &self.component_id)
            .field("link_id", &self.link_id)
            .field("compat_flags", &self.compat_flags)
            .field("signing", &self.signing)
            .field("version", &self.version)
            .field(
                "secret_key_hex",
                &self.secret_key_hex.as_ref().map(|_| "<redacted>"),
            )
            .field("dictionaries", &self.dictionaries)
            .field("include_minimal", &self.include_minimal)
            .finish()
    }
}

impl GroundlinkConfig {
    /// Load configuration from a file with `GROUNDLINK_` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    /// Load configuration with a custom environment prefix
    pub fn load_with_env_prefix(path: &Path, prefix: &str) -> Result<Self> {
        info!("Loading link config: {:?}", path);

        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to build configuration from {:?}", path))?;

        let mut settings: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.expand_env_vars()?;
        if let Some(base) = path.parent() {
            settings.link.resolve_dictionaries(base);
        }
        settings.link.validate()?;
        Ok(settings)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .context("Failed to parse configuration")?;

        let mut settings: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        settings.expand_env_vars()?;
        settings.link.validate()?;
        Ok(settings)
    }

    /// Expand environment variables in key material and dictionary paths
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(key) = self.link.secret_key_hex.take() {
            let expanded = match shellexpand::env(&key) {
                Ok(expanded) => expanded,
                Err(error) => {
                    wipe_string(key);
                    return Err(error).context("Failed to expand secret_key_hex");
                }
            };
            let trimmed = expanded.trim().to_string();
            if let Cow::Owned(owned) = expanded {
                wipe_string(owned);
            }
            wipe_string(key);
            self.link.secret_key_hex = Some(trimmed);
        }

        for path in &mut self.link.dictionaries {
            let raw = path.to_string_lossy().into_owned();
            let expanded = shellexpand::env(&raw)
                .with_context(|| format!("Failed to expand dictionary path {:?}", raw))?;
            *path = PathBuf::from(expanded.as_ref());
        }

        Ok(())
    }
}

impl LinkSettings {
    /// Check settings that would otherwise only fail at the first encode
    pub fn validate(&self) -> Result<()> {
        if self.signing && self.version == WireVersion::V1 {
            bail!("Signing requires MAVLink v2 (link.version = \"v2\")");
        }
        if self.signing && self.secret_key_hex.is_none() {
            bail!("Signing is enabled but link.secret_key_hex is not set");
        }
        if let Some(key) = &self.secret_key_hex {
            let mut decoded = hex::decode(key).context("link.secret_key_hex is not valid hex")?;
            let empty = decoded.is_empty();
            wipe(&mut decoded);
            if empty {
                bail!("link.secret_key_hex is empty");
            }
            if !self.signing {
                warn!("Secret key configured with signing disabled; it will only verify inbound frames");
            }
        }
        if !self.include_minimal && self.dictionaries.is_empty() {
            warn!("No dictionaries configured; every frame will decode as an unknown message id");
        }
        Ok(())
    }

    /// Make relative dictionary paths relative to `base`
    pub fn resolve_dictionaries(&mut self, base: &Path) {
        for path in &mut self.dictionaries {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Wire version for the encoder
    pub fn wire_version(&self) -> MavlinkVersion {
        self.version.into()
    }

    /// Header state for this link's outgoing frames
    pub fn header_context(&self) -> HeaderContext {
        HeaderContext::new(self.system_id, self.component_id)
            .with_compat_flags(self.compat_flags)
            .with_link_id(self.link_id)
            .with_signing(self.signing)
    }

    /// Move the configured secret into a key safe
    ///
    /// The hex text is zero-filled and `secret_key_hex` left as `None`, so the
    /// safe holds the only copy; later calls return `Ok(None)`.
    pub fn take_secret_key_safe(&mut self) -> Result<Option<SecretKeySafe>> {
        let Some(key) = self.secret_key_hex.take() else {
            return Ok(None);
        };
        let safe = SecretKeySafe::from_hex(&key);
        wipe_string(key);
        let safe = safe.context("link.secret_key_hex is not valid hex")?;
        debug!(key_id = safe.id(), key_len = safe.key_len(), "secret key provisioned");
        Ok(Some(safe))
    }
}

fn wipe(bytes: &mut [u8]) {
    bytes.fill(0);
    // keep the stores from being elided as dead writes
    let _ = std::hint::black_box(bytes);
}

fn wipe_string(text: String) {
    let mut bytes = text.into_bytes();
    wipe(&mut bytes);
}
