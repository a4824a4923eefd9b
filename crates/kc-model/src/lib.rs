//! # kc-model
//!
//! Domain models for Keycloak Rust.
//!
//! Identity brokering only needs the [`User`] record: its fixed profile
//! fields, its attribute bag, and its federated identity links.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod user;

pub use user::{FederatedIdentity, User};
