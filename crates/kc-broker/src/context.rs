//! Brokered identity context and the user handle mappers write through.

use std::collections::HashMap;

use kc_model::User;
use kc_protocol_saml::Assertion;
use serde::{Deserialize, Serialize};

// ============================================================================
// User Handle
// ============================================================================

/// Mutable view over the profile fields and attribute bag of a user.
///
/// Implemented by [`BrokeredIdentityContext`] (a user that does not exist
/// yet) and by [`User`] (a local user being refreshed), so import and update
/// policies can target either.
pub trait BrokeredUser {
    /// Current email.
    fn email(&self) -> Option<&str>;

    /// Replaces the email.
    fn set_email(&mut self, email: String);

    /// Current first name.
    fn first_name(&self) -> Option<&str>;

    /// Replaces the first name.
    fn set_first_name(&mut self, first_name: String);

    /// Current last name.
    fn last_name(&self) -> Option<&str>;

    /// Replaces the last name.
    fn set_last_name(&mut self, last_name: String);

    /// Current values of a generic attribute.
    fn attribute(&self, key: &str) -> Option<&[String]>;

    /// Replaces all values of a generic attribute.
    fn set_attribute(&mut self, key: &str, values: Vec<String>);

    /// Removes a generic attribute.
    fn remove_attribute(&mut self, key: &str);
}

impl BrokeredUser for User {
    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn set_email(&mut self, email: String) {
        User::set_email(self, email);
    }

    fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    fn set_first_name(&mut self, first_name: String) {
        User::set_first_name(self, first_name);
    }

    fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    fn set_last_name(&mut self, last_name: String) {
        User::set_last_name(self, last_name);
    }

    fn attribute(&self, key: &str) -> Option<&[String]> {
        self.get_attribute(key)
    }

    fn set_attribute(&mut self, key: &str, values: Vec<String>) {
        User::set_attribute(self, key, values);
    }

    fn remove_attribute(&mut self, key: &str) {
        User::remove_attribute(self, key);
    }
}

// ============================================================================
// Brokered Identity Context
// ============================================================================

/// Identity data gathered from an external identity provider during login.
///
/// Mappers run against this context before a local user exists; whatever
/// they write here seeds the user created on first login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokeredIdentityContext {
    /// User ID at the identity provider.
    pub id: String,

    /// Alias of the identity provider that authenticated the user.
    pub identity_provider: String,

    /// Username proposed by the identity provider.
    pub username: Option<String>,

    /// Email to import.
    pub email: Option<String>,

    /// First name to import.
    pub first_name: Option<String>,

    /// Last name to import.
    pub last_name: Option<String>,

    /// Attributes to import.
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,

    assertion: Assertion,
}

impl BrokeredIdentityContext {
    /// Creates a context for a SAML login.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        identity_provider: impl Into<String>,
        assertion: Assertion,
    ) -> Self {
        Self {
            id: id.into(),
            identity_provider: identity_provider.into(),
            username: None,
            email: None,
            first_name: None,
            last_name: None,
            attributes: HashMap::new(),
            assertion,
        }
    }

    /// Sets the proposed username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// The assertion received from the identity provider.
    #[must_use]
    pub const fn assertion(&self) -> &Assertion {
        &self.assertion
    }
}

impl BrokeredUser for BrokeredIdentityContext {
    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn set_email(&mut self, email: String) {
        self.email = Some(email);
    }

    fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    fn set_first_name(&mut self, first_name: String) {
        self.first_name = Some(first_name);
    }

    fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    fn set_last_name(&mut self, last_name: String) {
        self.last_name = Some(last_name);
    }

    fn attribute(&self, key: &str) -> Option<&[String]> {
        self.attributes.get(key).map(Vec::as_slice)
    }

    fn set_attribute(&mut self, key: &str, values: Vec<String>) {
        self.attributes.insert(key.to_string(), values);
    }

    fn remove_attribute(&mut self, key: &str) {
        self.attributes.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use kc_protocol_saml::{Attribute, AttributeStatement};
    use uuid::Uuid;

    use super::*;

    fn exercise(user: &mut dyn BrokeredUser) {
        user.set_email("a@example.com".to_string());
        user.set_first_name("Ann".to_string());
        user.set_last_name("Lee".to_string());
        user.set_attribute("dept", vec!["ENG".to_string()]);
        user.set_attribute("gone", vec!["x".to_string()]);
        user.remove_attribute("gone");
    }

    fn check(user: &dyn BrokeredUser) {
        assert_eq!(user.email(), Some("a@example.com"));
        assert_eq!(user.first_name(), Some("Ann"));
        assert_eq!(user.last_name(), Some("Lee"));
        assert_eq!(user.attribute("dept"), Some(&["ENG".to_string()][..]));
        assert_eq!(user.attribute("gone"), None);
    }

    #[test]
    fn user_is_a_brokered_user() {
        let mut user = User::new(Uuid::now_v7(), "ann");
        exercise(&mut user);
        check(&user);
    }

    #[test]
    fn context_is_a_brokered_user() {
        let assertion = Assertion::new("https://idp.example.com").with_attribute_statement(
            AttributeStatement::new().with_attribute(Attribute::single("uid", "ann")),
        );
        let mut context =
            BrokeredIdentityContext::new("ann", "corp-saml", assertion).with_username("ann");
        exercise(&mut context);
        check(&context);

        assert_eq!(context.username.as_deref(), Some("ann"));
        assert_eq!(context.assertion().attributes().count(), 1);
    }
}
