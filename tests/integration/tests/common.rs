//! Common test utilities and fixtures.

use kc_broker::{
    sync_brokered_user, BrokeredIdentityContext, IdentityProviderMapper,
    IdentityProviderMapperModel, IdentityProviderMapperRegistry, IdentityProviderSyncMode,
};
use kc_model::User;
use kc_protocol_saml::{Assertion, Attribute, AttributeStatement};
use uuid::Uuid;

/// Alias of the SAML identity provider used by every test.
pub const IDP_ALIAS: &str = "corp-saml";

/// Test environment holding instantiated mappers.
pub struct TestEnv {
    /// Realm the brokered users belong to.
    pub realm_id: Uuid,
    /// Mappers configured for [`IDP_ALIAS`], with their sync modes.
    pub mappers: Vec<(IdentityProviderSyncMode, Box<dyn IdentityProviderMapper>)>,
}

impl TestEnv {
    /// Builds mappers from a JSON array of mapper models.
    pub fn from_json(models: &str) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("kc_broker=debug")
            .with_test_writer()
            .try_init();

        let models: Vec<IdentityProviderMapperModel> = serde_json::from_str(models)?;
        let registry = IdentityProviderMapperRegistry::with_builtin_mappers();

        let mut mappers = Vec::with_capacity(models.len());
        for model in &models {
            mappers.push((model.sync_mode()?, registry.create(model)?));
        }

        Ok(Self {
            realm_id: Uuid::now_v7(),
            mappers,
        })
    }

    /// Runs every mapper against a first-login context, failing fast.
    pub fn first_login(&self, assertion: Assertion) -> anyhow::Result<BrokeredIdentityContext> {
        let mut context = BrokeredIdentityContext::new("jdoe", IDP_ALIAS, assertion);
        for (_, mapper) in &self.mappers {
            mapper.preprocess_federated_identity(&mut context)?;
        }
        Ok(context)
    }

    /// Creates the local user from a first-login context.
    pub fn create_user(&self, context: &BrokeredIdentityContext) -> User {
        let mut user = User::new(self.realm_id, context.username.as_deref().unwrap_or(&context.id));
        user.email.clone_from(&context.email);
        user.first_name.clone_from(&context.first_name);
        user.last_name.clone_from(&context.last_name);
        user.attributes.clone_from(&context.attributes);
        user
    }

    /// Runs every mapper against an existing user per its sync mode, failing fast.
    pub fn resync(&self, user: &mut User, assertion: Assertion) -> anyhow::Result<()> {
        let context = BrokeredIdentityContext::new(user.username.clone(), IDP_ALIAS, assertion);
        for (mode, mapper) in &self.mappers {
            sync_brokered_user(mapper.as_ref(), *mode, user, &context)?;
        }
        Ok(())
    }
}

/// Builds an assertion with one attribute statement.
pub fn assertion(attributes: Vec<Attribute>) -> Assertion {
    let statement = attributes
        .into_iter()
        .fold(AttributeStatement::new(), AttributeStatement::with_attribute);
    Assertion::new("https://idp.corp.example.com").with_attribute_statement(statement)
}

/// Converts string slices into owned values.
pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}
