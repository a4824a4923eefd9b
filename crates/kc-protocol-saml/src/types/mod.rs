//! SAML 2.0 types and data structures.
//!
//! This module contains the SAML types consumed during identity brokering.

mod assertion;

pub use assertion::*;
