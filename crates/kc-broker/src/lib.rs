//! # kc-broker
//!
//! Identity broker mappers for Keycloak Rust.
//!
//! When a user logs in through an external identity provider, mappers copy
//! asserted data onto the local user. This crate provides:
//!
//! - [`IdentityProviderMapper`] - the mapper contract and its registry
//! - [`BrokeredUser`] - the mutable user handle mappers write through
//! - [`BrokeredIdentityContext`] - the first-login staging area
//! - [`AdvancedAttributeImporter`] - regex-gated SAML attribute import
//!
//! # Example
//!
//! ```rust
//! use kc_broker::{AdvancedAttributeImporter, AttributeImporterConfig};
//! use kc_model::User;
//! use kc_protocol_saml::{Assertion, Attribute, AttributeStatement};
//! use uuid::Uuid;
//!
//! let importer = AdvancedAttributeImporter::new(
//!     AttributeImporterConfig::new("email")
//!         .with_attribute_name("mail")
//!         .with_regex(r".*@example\.com")?,
//! );
//!
//! let assertion = Assertion::new("https://idp.example.com").with_attribute_statement(
//!     AttributeStatement::new().with_attribute(Attribute::single("mail", "alice@example.com")),
//! );
//!
//! let mut user = User::new(Uuid::now_v7(), "alice");
//! importer.update_attribute(&assertion, &mut user)?;
//! assert_eq!(user.email.as_deref(), Some("alice@example.com"));
//! # Ok::<(), kc_broker::BrokerError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod attribute_importer;
pub mod config;
pub mod context;
pub mod error;
pub mod mapper;

pub use attribute_importer::{
    find_attribute_values, AdvancedAttributeImporter, AttributeImporterConfig, TargetField,
    ValueRegex,
};
pub use config::{
    ConfigProperty, ConfigPropertyType, IdentityProviderMapperModel, IdentityProviderSyncMode,
};
pub use context::{BrokeredIdentityContext, BrokeredUser};
pub use error::{BrokerError, BrokerResult};
pub use mapper::{sync_brokered_user, IdentityProviderMapper, IdentityProviderMapperRegistry};
