//! Identity provider mapper SPI.
//!
//! Mappers run during identity brokering. Each one sees the data asserted by
//! the external identity provider and copies part of it onto the local user:
//!
//! - [`IdentityProviderMapper::preprocess_federated_identity`] runs before the
//!   local user exists and writes into the [`BrokeredIdentityContext`].
//! - [`IdentityProviderMapper::update_brokered_user`] runs on later logins
//!   and writes into the existing [`User`].
//!
//! [`IdentityProviderMapperRegistry`] turns persisted
//! [`IdentityProviderMapperModel`]s into ready-to-run mapper instances.

use std::collections::HashMap;
use std::fmt;

use kc_model::User;

use crate::attribute_importer::AdvancedAttributeImporter;
use crate::config::{ConfigProperty, IdentityProviderMapperModel, IdentityProviderSyncMode};
use crate::context::BrokeredIdentityContext;
use crate::error::{BrokerError, BrokerResult};

/// Base trait for identity provider mappers.
pub trait IdentityProviderMapper: Send + Sync {
    /// Returns the mapper provider ID.
    fn id(&self) -> &'static str;

    /// Returns the category shown in the admin console.
    fn display_category(&self) -> &'static str;

    /// Returns the type name shown in the admin console.
    fn display_type(&self) -> &'static str;

    /// Returns help text describing this mapper.
    fn help_text(&self) -> &'static str;

    /// Identity provider types this mapper can be attached to.
    fn compatible_providers(&self) -> &'static [&'static str];

    /// Returns the configuration properties for the admin UI.
    fn config_properties(&self) -> Vec<ConfigProperty>;

    /// Whether the mapper can run under the given sync mode.
    fn supports_sync_mode(&self, mode: IdentityProviderSyncMode) -> bool;

    /// Imports data into the context on first login.
    ///
    /// # Errors
    ///
    /// Returns an error if the asserted data is rejected.
    fn preprocess_federated_identity(&self, context: &mut BrokeredIdentityContext) -> BrokerResult<()>;

    /// Refreshes an existing user from the context.
    ///
    /// # Errors
    ///
    /// Returns an error if the asserted data is rejected.
    fn update_brokered_user(&self, user: &mut User, context: &BrokeredIdentityContext) -> BrokerResult<()>;
}

type MapperConstructor =
    fn(&IdentityProviderMapperModel) -> BrokerResult<Box<dyn IdentityProviderMapper>>;

/// Registry of mapper implementations keyed by provider ID.
#[derive(Default)]
pub struct IdentityProviderMapperRegistry {
    constructors: HashMap<&'static str, MapperConstructor>,
}

impl IdentityProviderMapperRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in mappers.
    #[must_use]
    pub fn with_builtin_mappers() -> Self {
        let mut registry = Self::new();
        registry.register(AdvancedAttributeImporter::PROVIDER_ID, create_attribute_importer);
        registry
    }

    /// Registers a mapper constructor.
    pub fn register(&mut self, provider_id: &'static str, constructor: MapperConstructor) {
        self.constructors.insert(provider_id, constructor);
    }

    /// Returns true if a mapper is registered under `provider_id`.
    #[must_use]
    pub fn contains(&self, provider_id: &str) -> bool {
        self.constructors.contains_key(provider_id)
    }

    /// Lists registered provider IDs, sorted.
    #[must_use]
    pub fn mapper_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.constructors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Builds a mapper instance from a persisted model.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::UnknownMapper`] if no implementation is
    /// registered for the model's mapper type, or whatever the
    /// implementation reports for a malformed configuration.
    pub fn create(
        &self,
        model: &IdentityProviderMapperModel,
    ) -> BrokerResult<Box<dyn IdentityProviderMapper>> {
        let constructor = self
            .constructors
            .get(model.identity_provider_mapper.as_str())
            .ok_or_else(|| BrokerError::UnknownMapper(model.identity_provider_mapper.clone()))?;

        let mapper = constructor(model)?;
        tracing::debug!(
            mapper = %model.name,
            mapper_type = mapper.id(),
            identity_provider = %model.identity_provider_alias,
            "identity provider mapper created"
        );
        Ok(mapper)
    }
}

/// Refreshes an existing user according to the mapper's sync mode.
///
/// [`IdentityProviderSyncMode::Import`] mappers only act on first login, so
/// they are skipped here. Legacy and force mappers run
/// [`IdentityProviderMapper::update_brokered_user`].
///
/// # Errors
///
/// Returns a configuration error if the mapper does not support `mode`, or
/// whatever the mapper reports while updating.
pub fn sync_brokered_user(
    mapper: &dyn IdentityProviderMapper,
    mode: IdentityProviderSyncMode,
    user: &mut User,
    context: &BrokeredIdentityContext,
) -> BrokerResult<()> {
    if !mapper.supports_sync_mode(mode) {
        return Err(BrokerError::config(format!(
            "mapper '{}' does not support sync mode {}",
            mapper.id(),
            mode.as_str()
        )));
    }
    match mode {
        IdentityProviderSyncMode::Import => {
            tracing::debug!(mapper_type = mapper.id(), "import-only mapper skipped on resync");
            Ok(())
        }
        IdentityProviderSyncMode::Legacy | IdentityProviderSyncMode::Force => {
            mapper.update_brokered_user(user, context)
        }
    }
}

fn create_attribute_importer(
    model: &IdentityProviderMapperModel,
) -> BrokerResult<Box<dyn IdentityProviderMapper>> {
    let mapper = AdvancedAttributeImporter::from_model(model)?;
    Ok(Box::new(mapper))
}

impl fmt::Debug for IdentityProviderMapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityProviderMapperRegistry")
            .field("mappers", &self.mapper_ids())
            .finish()
    }
}
