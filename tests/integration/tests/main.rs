//! End-to-End Integration Tests
//!
//! These tests drive identity broker mappers the way a login flow does:
//! mapper models are loaded from realm-export JSON, instantiated through the
//! registry, then run against SAML assertions for first login and resync.

mod common;
mod broker_flows;
