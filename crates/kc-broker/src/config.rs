//! Identity provider mapper configuration.
//!
//! Mapper instances are persisted as a generic key-value model (the shape a
//! realm export uses). Each mapper turns that model into a typed
//! configuration once, when it is constructed.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BrokerError, BrokerResult};

// ============================================================================
// Sync Mode
// ============================================================================

/// How mappers treat users that already exist locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentityProviderSyncMode {
    /// Behavior inherited from before sync modes existed.
    #[default]
    Legacy,

    /// Import on first login only; never refresh afterwards.
    Import,

    /// Refresh the local user on every login.
    Force,
}

impl IdentityProviderSyncMode {
    /// All sync modes.
    pub const ALL: [Self; 3] = [Self::Legacy, Self::Import, Self::Force];

    /// Returns the wire name of this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "LEGACY",
            Self::Import => "IMPORT",
            Self::Force => "FORCE",
        }
    }
}

impl FromStr for IdentityProviderSyncMode {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BrokerError::config(format!("unknown sync mode: {s}")))
    }
}

// ============================================================================
// Mapper Model
// ============================================================================

/// Persisted configuration of one identity provider mapper instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderMapperModel {
    /// Mapper ID.
    #[serde(default = "Uuid::now_v7")]
    pub id: Uuid,

    /// Mapper name (user-defined).
    pub name: String,

    /// Alias of the identity provider this mapper belongs to.
    pub identity_provider_alias: String,

    /// Mapper type (provider ID of the mapper implementation).
    pub identity_provider_mapper: String,

    /// Mapper-specific configuration.
    #[serde(default)]
    pub config: HashMap<String, String>,
}

impl IdentityProviderMapperModel {
    /// Config key holding the sync mode.
    pub const SYNC_MODE: &'static str = "syncMode";

    /// Creates a new mapper model.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        identity_provider_alias: impl Into<String>,
        identity_provider_mapper: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            identity_provider_alias: identity_provider_alias.into(),
            identity_provider_mapper: identity_provider_mapper.into(),
            config: HashMap::new(),
        }
    }

    /// Adds a config value.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Gets a config value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Gets a config value, treating an empty string as absent.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Returns the configured sync mode, defaulting to [`IdentityProviderSyncMode::Legacy`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the stored value is not a known mode.
    pub fn sync_mode(&self) -> BrokerResult<IdentityProviderSyncMode> {
        self.get_non_empty(Self::SYNC_MODE)
            .map_or(Ok(IdentityProviderSyncMode::default()), str::parse)
    }
}

// ============================================================================
// Config Properties
// ============================================================================

/// Configuration property definition for mapper UIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigProperty {
    /// Property name (config key).
    pub name: String,

    /// Display label.
    pub label: String,

    /// Help text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,

    /// Property type.
    #[serde(rename = "type")]
    pub property_type: ConfigPropertyType,
}

/// Configuration property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigPropertyType {
    /// Text input.
    String,
}

impl ConfigProperty {
    /// Creates a new string property.
    #[must_use]
    pub fn string(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            help_text: None,
            property_type: ConfigPropertyType::String,
        }
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_help(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }
}
