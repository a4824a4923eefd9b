//! SAML 2.0 assertion types for Keycloak Rust.
//!
//! This crate provides the in-memory representation of a SAML assertion as
//! handed to identity broker mappers:
//!
//! - [`Assertion`] - issuer metadata plus zero or more attribute statements
//! - [`AttributeStatement`] - an ordered list of attributes
//! - [`Attribute`] - a named, optionally friendly-named, multi-valued attribute
//! - [`AttributeValue`] - a typed value, including `xsi:nil`
//!
//! Parsing and signature validation happen upstream; by the time a mapper
//! sees an [`Assertion`] it has been fully materialized.
//!
//! # Example
//!
//! ```rust
//! use kc_protocol_saml::{Assertion, Attribute, AttributeStatement};
//!
//! let assertion = Assertion::new("https://idp.example.com").with_attribute_statement(
//!     AttributeStatement::new()
//!         .with_attribute(Attribute::single("urn:oid:2.5.4.42", "Alice").with_friendly_name("givenName")),
//! );
//!
//! assert_eq!(assertion.attributes().count(), 1);
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod types;

pub use types::*;
