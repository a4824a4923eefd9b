//! Advanced SAML attribute importer.
//!
//! Copies one attribute from a SAML assertion into a user, after checking the
//! asserted value against an administrator-supplied pattern.
//!
//! ## Flow
//!
//! 1. Locate: collect every value of the attribute whose name or friendly
//!    name equals the configured key ([`find_attribute_values`]).
//! 2. Gate: the first located value must fully match [`ValueRegex`].
//! 3. Write: on first login the value is written unconditionally
//!    ([`AdvancedAttributeImporter::import_attribute`]); on resync only
//!    differences are written ([`AdvancedAttributeImporter::update_attribute`]).
//!
//! ## NIST 800-53 Rev5: SI-10 (Information Input Validation)
//!
//! A value rejected by the gate never reaches the user record.

use std::fmt;

use kc_model::User;
use kc_protocol_saml::{Assertion, Attribute};
use regex::Regex;
use regex_syntax::hir::{Hir, Look};

use crate::config::{ConfigProperty, IdentityProviderMapperModel, IdentityProviderSyncMode};
use crate::context::{BrokeredIdentityContext, BrokeredUser};
use crate::error::{BrokerError, BrokerResult};
use crate::mapper::IdentityProviderMapper;

// ============================================================================
// Target Field
// ============================================================================

/// Where an imported value is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetField {
    /// The user's email.
    Email,
    /// The user's first name.
    FirstName,
    /// The user's last name.
    LastName,
    /// A generic attribute, keyed exactly as configured.
    Attribute(String),
}

impl TargetField {
    /// Resolves a configured target. Reserved names match case-insensitively.
    ///
    /// Returns `None` for an empty target, which disables the mapper.
    #[must_use]
    pub fn resolve(target: &str) -> Option<Self> {
        if target.is_empty() {
            return None;
        }
        let field = if target.eq_ignore_ascii_case("email") {
            Self::Email
        } else if target.eq_ignore_ascii_case("firstName") {
            Self::FirstName
        } else if target.eq_ignore_ascii_case("lastName") {
            Self::LastName
        } else {
            Self::Attribute(target.to_string())
        };
        Some(field)
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::FirstName => f.write_str("firstName"),
            Self::LastName => f.write_str("lastName"),
            Self::Attribute(key) => f.write_str(key),
        }
    }
}

// ============================================================================
// Regex Gate
// ============================================================================

/// Pattern an asserted value must fully match.
///
/// An empty pattern accepts everything, including the empty string.
#[derive(Debug, Clone, Default)]
pub struct ValueRegex {
    pattern: String,
    compiled: Option<Regex>,
}

impl ValueRegex {
    /// Compiles a pattern, anchoring it at both ends.
    ///
    /// The pattern is validated on its own first, then anchored on its parsed
    /// form so that nothing in it can escape the anchors.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidRegex`] if the pattern does not compile.
    pub fn new(pattern: impl Into<String>) -> BrokerResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Ok(Self::default());
        }
        let invalid = |source: regex::Error| BrokerError::InvalidRegex {
            pattern: pattern.clone(),
            source,
        };
        Regex::new(&pattern).map_err(invalid)?;

        let hir = regex_syntax::Parser::new()
            .parse(&pattern)
            .map_err(|err| BrokerError::config(format!("cannot parse regex '{pattern}': {err}")))?;
        let anchored = Hir::concat(vec![Hir::look(Look::Start), hir, Hir::look(Look::End)]);
        let compiled = Regex::new(&anchored.to_string()).map_err(invalid)?;

        Ok(Self {
            pattern,
            compiled: Some(compiled),
        })
    }

    /// Checks a value against the pattern.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.compiled.as_ref().map_or(true, |re| re.is_match(value))
    }

    /// The pattern as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Gates a value, returning a mismatch error if it is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::RegexMismatch`] carrying the value and pattern.
    pub fn check(&self, value: &str) -> BrokerResult<()> {
        if self.is_match(value) {
            Ok(())
        } else {
            tracing::warn!(value, pattern = %self.pattern, "asserted attribute value rejected");
            Err(BrokerError::regex_mismatch(value, &self.pattern))
        }
    }
}

// ============================================================================
// Attribute Locator
// ============================================================================

/// Collects the values of every attribute whose name or friendly name equals `key`.
///
/// Statements and attributes are visited in document order and every match
/// contributes all of its values; nil values are skipped. Matching is exact
/// and case-sensitive.
#[must_use]
pub fn find_attribute_values(key: &str, assertion: &Assertion) -> Vec<String> {
    assertion
        .attributes()
        .filter(|attribute| attribute.is_named(key))
        .flat_map(Attribute::text_values)
        .collect()
}

// ============================================================================
// Configuration
// ============================================================================

/// Typed configuration of an [`AdvancedAttributeImporter`].
#[derive(Debug, Clone, Default)]
pub struct AttributeImporterConfig {
    /// Attribute name to search for.
    pub attribute_name: Option<String>,

    /// Friendly name to search for when no name is configured.
    pub friendly_name: Option<String>,

    /// Destination of the imported value; `None` disables the mapper.
    pub target: Option<TargetField>,

    /// Pattern the first located value must match.
    pub regex: ValueRegex,
}

impl AttributeImporterConfig {
    /// Creates a configuration writing to `target`.
    #[must_use]
    pub fn new(target: &str) -> Self {
        Self {
            target: TargetField::resolve(target),
            ..Self::default()
        }
    }

    /// Sets the attribute name.
    #[must_use]
    pub fn with_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = Some(name.into());
        self
    }

    /// Sets the friendly name.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Sets the value pattern.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidRegex`] if the pattern does not compile.
    pub fn with_regex(mut self, pattern: impl Into<String>) -> BrokerResult<Self> {
        self.regex = ValueRegex::new(pattern)?;
        Ok(self)
    }

    /// Builds the typed configuration from a persisted mapper model.
    ///
    /// Empty strings count as unset.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the model belongs to another mapper
    /// type, or [`BrokerError::InvalidRegex`] if the pattern does not compile.
    pub fn from_model(model: &IdentityProviderMapperModel) -> BrokerResult<Self> {
        if model.identity_provider_mapper != AdvancedAttributeImporter::PROVIDER_ID {
            return Err(BrokerError::config(format!(
                "mapper '{}' has type '{}', expected '{}'",
                model.name,
                model.identity_provider_mapper,
                AdvancedAttributeImporter::PROVIDER_ID
            )));
        }

        let config = Self {
            attribute_name: model
                .get_non_empty(AdvancedAttributeImporter::ATTRIBUTE_NAME)
                .map(str::to_string),
            friendly_name: model
                .get_non_empty(AdvancedAttributeImporter::ATTRIBUTE_FRIENDLY_NAME)
                .map(str::to_string),
            target: model
                .get(AdvancedAttributeImporter::USER_ATTRIBUTE)
                .and_then(TargetField::resolve),
            regex: ValueRegex::new(
                model
                    .get(AdvancedAttributeImporter::ATTRIBUTE_REGEX_MATCH)
                    .unwrap_or_default(),
            )?,
        };

        if config.target.is_some() && config.lookup_key().is_none() {
            tracing::warn!(
                mapper = %model.name,
                "attribute importer has neither a name nor a friendly name and will never match"
            );
        }

        Ok(config)
    }

    /// The key searched for: the name if set, otherwise the friendly name.
    #[must_use]
    pub fn lookup_key(&self) -> Option<&str> {
        self.attribute_name
            .as_deref()
            .or(self.friendly_name.as_deref())
    }

    /// Locates the configured attribute's values in an assertion.
    #[must_use]
    pub fn matched_values(&self, assertion: &Assertion) -> Vec<String> {
        self.lookup_key()
            .map(|key| find_attribute_values(key, assertion))
            .unwrap_or_default()
    }
}

// ============================================================================
// Mapper
// ============================================================================

/// Imports a declared SAML attribute into a user property or attribute.
#[derive(Debug, Clone)]
pub struct AdvancedAttributeImporter {
    config: AttributeImporterConfig,
}

impl AdvancedAttributeImporter {
    /// Provider ID of this mapper.
    pub const PROVIDER_ID: &'static str = "saml-advanced-user-attribute-idp-mapper";

    /// Identity providers this mapper works with.
    pub const COMPATIBLE_PROVIDERS: &'static [&'static str] = &["saml"];

    /// Config key for the attribute name.
    pub const ATTRIBUTE_NAME: &'static str = "attribute.name";

    /// Config key for the attribute friendly name.
    pub const ATTRIBUTE_FRIENDLY_NAME: &'static str = "attribute.friendly.name";

    /// Config key for the target user property or attribute.
    pub const USER_ATTRIBUTE: &'static str = "user.attribute";

    /// Config key for the value pattern.
    pub const ATTRIBUTE_REGEX_MATCH: &'static str = "attribute.regex.match";

    /// Creates an importer from a typed configuration.
    #[must_use]
    pub const fn new(config: AttributeImporterConfig) -> Self {
        Self { config }
    }

    /// Creates an importer from a persisted mapper model.
    ///
    /// # Errors
    ///
    /// See [`AttributeImporterConfig::from_model`].
    pub fn from_model(model: &IdentityProviderMapperModel) -> BrokerResult<Self> {
        AttributeImporterConfig::from_model(model).map(Self::new)
    }

    /// The typed configuration.
    #[must_use]
    pub const fn config(&self) -> &AttributeImporterConfig {
        &self.config
    }

    /// First-login import: writes the first located value into `target`.
    ///
    /// Generic attributes receive every located value. Nothing happens if the
    /// mapper has no target or the attribute is absent from the assertion.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::RegexMismatch`] if the first value is rejected;
    /// `target` is left untouched in that case.
    pub fn import_attribute<U>(&self, assertion: &Assertion, target: &mut U) -> BrokerResult<()>
    where
        U: BrokeredUser + ?Sized,
    {
        if self.config.target.is_none() {
            return Ok(());
        }
        let values = self.config.matched_values(assertion);
        self.import_values(values, target)
    }

    /// Resync: brings `user` in line with the assertion, writing only what changed.
    ///
    /// Reserved fields are rewritten when the first value differs. Generic
    /// attributes are rewritten when the full value list differs, and removed
    /// when the assertion no longer carries the attribute. Running it twice
    /// against the same assertion performs no writes the second time.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::RegexMismatch`] if the first value is rejected;
    /// `user` is left untouched in that case.
    pub fn update_attribute<U>(&self, assertion: &Assertion, user: &mut U) -> BrokerResult<()>
    where
        U: BrokeredUser + ?Sized,
    {
        let Some(target) = &self.config.target else {
            return Ok(());
        };
        let values = self.config.matched_values(assertion);

        let Some(first) = values.first().cloned() else {
            if let TargetField::Attribute(key) = target {
                if user.attribute(key).is_some() {
                    tracing::debug!(attribute = %key, "attribute no longer asserted, removing");
                    user.remove_attribute(key);
                }
            }
            return Ok(());
        };
        self.config.regex.check(&first)?;

        match target {
            TargetField::Email => {
                if user.email() != Some(first.as_str()) {
                    tracing::debug!(field = %target, "updating user field");
                    user.set_email(first);
                }
            }
            TargetField::FirstName => {
                if user.first_name() != Some(first.as_str()) {
                    tracing::debug!(field = %target, "updating user field");
                    user.set_first_name(first);
                }
            }
            TargetField::LastName => {
                if user.last_name() != Some(first.as_str()) {
                    tracing::debug!(field = %target, "updating user field");
                    user.set_last_name(first);
                }
            }
            TargetField::Attribute(key) => {
                if user.attribute(key) != Some(values.as_slice()) {
                    tracing::debug!(attribute = %key, count = values.len(), "updating user attribute");
                    user.set_attribute(key, values);
                }
            }
        }
        Ok(())
    }

    fn import_values<U>(&self, values: Vec<String>, target: &mut U) -> BrokerResult<()>
    where
        U: BrokeredUser + ?Sized,
    {
        let Some(field) = &self.config.target else {
            return Ok(());
        };
        let Some(first) = values.first().cloned() else {
            tracing::debug!(target_field = %field, "attribute not asserted, nothing to import");
            return Ok(());
        };
        self.config.regex.check(&first)?;

        tracing::debug!(target_field = %field, count = values.len(), "importing asserted attribute");
        match field {
            TargetField::Email => target.set_email(first),
            TargetField::FirstName => target.set_first_name(first),
            TargetField::LastName => target.set_last_name(first),
            TargetField::Attribute(key) => target.set_attribute(key, values),
        }
        Ok(())
    }
}

impl IdentityProviderMapper for AdvancedAttributeImporter {
    fn id(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    fn display_category(&self) -> &'static str {
        "Advanced Attribute Importer"
    }

    fn display_type(&self) -> &'static str {
        "Advanced Attribute Importer"
    }

    fn help_text(&self) -> &'static str {
        "Import declared saml attribute if it exists in assertion into the specified user property or attribute."
    }

    fn compatible_providers(&self) -> &'static [&'static str] {
        Self::COMPATIBLE_PROVIDERS
    }

    fn config_properties(&self) -> Vec<ConfigProperty> {
        vec![
            ConfigProperty::string(Self::ATTRIBUTE_NAME, "Attribute Name").with_help(
                "Name of attribute to search for in assertion.  You can leave this blank and specify a friendly name instead.",
            ),
            ConfigProperty::string(Self::ATTRIBUTE_FRIENDLY_NAME, "Friendly Name").with_help(
                "Friendly name of attribute to search for in assertion.  You can leave this blank and specify a name instead.",
            ),
            ConfigProperty::string(Self::USER_ATTRIBUTE, "User Attribute Name").with_help(
                "User attribute name to store saml attribute.  Use email, lastName, and firstName to map to those predefined user properties.",
            ),
            ConfigProperty::string(Self::ATTRIBUTE_REGEX_MATCH, "Attribute Value Regex").with_help(
                "The regex to match the attribute value against. For example: ^.*@example\\.com$",
            ),
        ]
    }

    fn supports_sync_mode(&self, mode: IdentityProviderSyncMode) -> bool {
        IdentityProviderSyncMode::ALL.contains(&mode)
    }

    fn preprocess_federated_identity(&self, context: &mut BrokeredIdentityContext) -> BrokerResult<()> {
        let values = self.config.matched_values(context.assertion());
        self.import_values(values, context)
    }

    fn update_brokered_user(&self, user: &mut User, context: &BrokeredIdentityContext) -> BrokerResult<()> {
        self.update_attribute(context.assertion(), user)
    }
}
