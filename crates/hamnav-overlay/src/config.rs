#![forbid(unsafe_code)]

//! Policy-as-data configuration for the overlay controller.
//!
//! Captures the per-instance parameters the host would otherwise hand over
//! ad hoc — accessible labels, the hue-animation default, the shape-wrapper
//! fallback policy, and the transition-duration fallback — as a single
//! [`OverlayConfig`] that can be loaded from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # hamnav.toml
//! open_label = "Open menu"
//! close_label = "Close menu"
//! hue_anim_default = false
//! fallback_policy = "strict"
//! default_transition_ms = 400
//! ```
//!
//! ```rust,ignore
//! let config = OverlayConfig::from_toml_file("hamnav.toml")?;
//! let config = OverlayConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! Every field has a default matching the behavior the controller exhibits
//! when no host configuration object exists at all, so
//! `OverlayConfig::default()` is always a working configuration.

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use web_time::Duration;

/// Fallback transition duration when a panel's computed value is unreadable
/// or zero.
pub const DEFAULT_TRANSITION_MS: u64 = 600;

/// What to do when a trigger has no `data-open-shape` ancestor to record the
/// open/closed state on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "lowercase"))]
pub enum FallbackPolicy {
    /// Record the state on the document body instead. Keeps degraded markup
    /// functional; the primary behavior.
    #[default]
    Permissive,

    /// Skip wiring the instance entirely.
    Strict,
}

/// Per-controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct OverlayConfig {
    /// Accessible label for a closed trigger ("press to open").
    pub open_label: String,

    /// Accessible label for an open trigger ("press to close").
    pub close_label: String,

    /// Whether the panel hue animation is enabled by default. When false,
    /// every wired panel gets the `hue-off` class at setup.
    pub hue_anim_default: bool,

    /// Shape-wrapper fallback policy.
    pub fallback_policy: FallbackPolicy,

    /// Hide-delay base used when a panel's computed transition duration is
    /// unreadable or zero, in milliseconds.
    pub default_transition_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            open_label: "Open menu".to_string(),
            close_label: "Close menu".to_string(),
            hue_anim_default: true,
            fallback_policy: FallbackPolicy::default(),
            default_transition_ms: DEFAULT_TRANSITION_MS,
        }
    }
}

impl OverlayConfig {
    /// The transition-duration fallback as a [`Duration`].
    #[must_use]
    pub fn default_transition(&self) -> Duration {
        Duration::from_millis(self.default_transition_ms)
    }
}

#[cfg(feature = "config-file")]
impl OverlayConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }
}

/// Errors that can occur when loading an overlay configuration.
#[cfg(feature = "config-file")]
#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read.
    Io(std::io::Error),

    /// TOML parse failure.
    Toml(toml::de::Error),

    /// JSON parse failure.
    Json(serde_json::Error),
}

#[cfg(feature = "config-file")]
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {e}"),
            Self::Toml(e) => write!(f, "failed to parse TOML config: {e}"),
            Self::Json(e) => write!(f, "failed to parse JSON config: {e}"),
        }
    }
}

#[cfg(feature = "config-file")]
impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}
