//! User domain model.
//!
//! Users are the primary identity entities in Keycloak.
//! They belong to a realm, carry a small set of fixed profile fields,
//! a free-form attribute bag, and links to external identity providers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A federated identity link (e.g. a SAML or social identity provider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedIdentity {
    /// Identity provider alias (e.g., "saml", "google").
    pub identity_provider: String,
    /// User ID at the identity provider.
    pub user_id: String,
    /// Username at the identity provider.
    pub user_name: Option<String>,
}

impl FederatedIdentity {
    /// Creates a new federated identity.
    #[must_use]
    pub fn new(provider: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            identity_provider: provider.into(),
            user_id: user_id.into(),
            user_name: None,
        }
    }

    /// Sets the username at the identity provider.
    #[must_use]
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }
}

/// A Keycloak user.
///
/// Every mutator that changes stored state bumps [`User::updated_at`], so a
/// caller can tell whether an operation actually wrote anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    // === Identity ===
    /// Unique identifier.
    pub id: Uuid,
    /// Realm this user belongs to.
    pub realm_id: Uuid,
    /// Unique username within the realm.
    pub username: String,
    /// Whether the user account is enabled.
    pub enabled: bool,

    // === Profile ===
    /// User's first name.
    pub first_name: Option<String>,
    /// User's last name.
    pub last_name: Option<String>,
    /// User's email address.
    pub email: Option<String>,
    /// Whether the email has been verified.
    pub email_verified: bool,

    // === Timestamps ===
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,

    // === Custom Attributes ===
    /// Custom user attributes.
    pub attributes: HashMap<String, Vec<String>>,

    // === Federated Identities ===
    /// Linked external identities.
    pub federated_identities: Vec<FederatedIdentity>,
}

impl User {
    /// Creates a new user with the given username.
    #[must_use]
    pub fn new(realm_id: Uuid, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            realm_id,
            username: username.into(),
            enabled: true,
            first_name: None,
            last_name: None,
            email: None,
            email_verified: false,
            created_at: now,
            updated_at: now,
            attributes: HashMap::new(),
            federated_identities: Vec::new(),
        }
    }

    /// Sets the user's email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the user's first name.
    #[must_use]
    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    /// Sets the user's last name.
    #[must_use]
    pub fn with_last_name(mut self, name: impl Into<String>) -> Self {
        self.last_name = Some(name.into());
        self
    }

    /// Sets an attribute at construction time.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }

    /// Replaces the email address.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = Some(email.into());
        self.touch();
    }

    /// Replaces the first name.
    pub fn set_first_name(&mut self, name: impl Into<String>) {
        self.first_name = Some(name.into());
        self.touch();
    }

    /// Replaces the last name.
    pub fn set_last_name(&mut self, name: impl Into<String>) {
        self.last_name = Some(name.into());
        self.touch();
    }

    /// Gets all values of an attribute.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Sets an attribute, replacing any previous values.
    pub fn set_attribute(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.attributes.insert(name.into(), values);
        self.touch();
    }

    /// Removes an attribute, returning its previous values.
    ///
    /// `updated_at` is left alone when the attribute was not present.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Vec<String>> {
        let removed = self.attributes.remove(name);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Adds a federated identity.
    pub fn add_federated_identity(&mut self, identity: FederatedIdentity) {
        self.federated_identities.push(identity);
        self.touch();
    }

    /// Finds a federated identity by provider.
    #[must_use]
    pub fn get_federated_identity(&self, provider: &str) -> Option<&FederatedIdentity> {
        self.federated_identities
            .iter()
            .find(|fi| fi.identity_provider == provider)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
