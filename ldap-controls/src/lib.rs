//! LDAP extended controls
//!
//! This crate builds and parses the values of the LDAP controls used for
//! server-side sorting, virtual list views and persistent searches, on top
//! of the BER codec in `ldap-asn1`.
//!
//! | Control | Request OID | Response OID |
//! |---|---|---|
//! | Sort | `1.2.840.113556.1.4.473` | `1.2.840.113556.1.4.474` |
//! | Virtual list view | `2.16.840.1.113730.3.4.9` | `2.16.840.1.113730.3.4.10` |
//! | Persistent search | `2.16.840.1.113730.3.4.3` | `2.16.840.1.113730.3.4.7` (entry change) |
//!
//! # Usage
//!
//! ```rust
//! use ldap_controls::{ControlRegistry, ResponseControl, SortControl, SortKey};
//!
//! let request = SortControl::single(SortKey::parse("-cn")?, true).to_control();
//! assert_eq!(request.oid(), "1.2.840.113556.1.4.473");
//!
//! let registry = ControlRegistry::with_defaults();
//! # let response = ldap_controls::LdapControl::new(
//! #     "1.2.840.113556.1.4.474", false, Some(vec![0x30, 0x03, 0x0A, 0x01, 0x00]))?;
//! if let ResponseControl::Sort(sort) = registry.decode(&response)? {
//!     assert_eq!(sort.result_code, 0);
//! }
//! # Ok::<(), ldap_core::LdapError>(())
//! ```

pub mod control;
pub mod persist;
pub mod registry;
pub mod sort;
pub mod vlv;

pub use control::LdapControl;
pub use persist::{ChangeType, ChangeTypes, EntryChangeControl, PersistSearchControl};
pub use registry::{ControlRegistry, ResponseControl, ResponseDecoder};
pub use sort::{SortControl, SortKey, SortResponse, SortResult};
pub use vlv::{VirtualListControl, VirtualListResponse, VlvTarget};
