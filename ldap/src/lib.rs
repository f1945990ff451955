//! BER codec and LDAP extended controls
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ldap-core`: Error handling and control OIDs
//! - `ldap-asn1`: BER encoding/decoding of ASN.1 value trees
//! - `ldap-controls`: Sort, virtual list view and persistent search controls
//!
//! Encoded controls are opaque byte strings handed to an LDAP message layer,
//! which is not part of this workspace.
//!
//! # Usage
//!
//! ```rust
//! use ldap::ber::{self, Value};
//! use ldap::controls::VirtualListResponse;
//!
//! let bytes = ber::encode(&Value::Sequence(vec![Value::Boolean(true), Value::Integer(5)]));
//! assert_eq!(bytes, [0x30, 0x06, 0x01, 0x01, 0xFF, 0x02, 0x01, 0x05]);
//!
//! let response = VirtualListResponse::decode(&[
//!     0x30, 0x09, 0x02, 0x01, 0x05, 0x02, 0x01, 0x0A, 0x0A, 0x01, 0x00,
//! ])?;
//! assert_eq!((response.first_position, response.content_count), (5, 10));
//! # Ok::<(), ldap::LdapError>(())
//! ```

// Re-export core types
pub use ldap_core::{LdapError, LdapResult, oid};

// Re-export the BER codec
pub mod ber {
    pub use ldap_asn1::ber::*;
}

// Re-export controls
pub mod controls {
    pub use ldap_controls::*;
}
