//! Core types and utilities for LDAP control encoding
//!
//! This crate provides the error type shared by the BER codec and the control
//! schemas, together with the OIDs that name each supported control.

pub mod error;
pub mod oid;

pub use error::{LdapError, LdapResult};
pub use oid::is_valid_oid;
