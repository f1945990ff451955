//! Object identifiers of the supported LDAP controls

use once_cell::sync::Lazy;
use regex::Regex;

/// Server-side sort request (RFC 2891)
pub const SORT_REQUEST: &str = "1.2.840.113556.1.4.473";
/// Server-side sort response (RFC 2891)
pub const SORT_RESPONSE: &str = "1.2.840.113556.1.4.474";
/// Virtual list view request
pub const VLV_REQUEST: &str = "2.16.840.1.113730.3.4.9";
/// Virtual list view response
pub const VLV_RESPONSE: &str = "2.16.840.1.113730.3.4.10";
/// Persistent search request
pub const PERSISTENT_SEARCH: &str = "2.16.840.1.113730.3.4.3";
/// Entry change notification, returned with persistent search results
pub const ENTRY_CHANGE: &str = "2.16.840.1.113730.3.4.7";

static OID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-2](\.(0|[1-9][0-9]*))+$").expect("OID pattern is a valid regex")
});

/// Check that `oid` is a dotted-numeric object identifier
///
/// The first arc must be 0, 1 or 2, at least two arcs are required and no arc
/// may carry a leading zero.
pub fn is_valid_oid(oid: &str) -> bool {
    OID_PATTERN.is_match(oid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_oids_are_valid() {
        for oid in [
            SORT_REQUEST,
            SORT_RESPONSE,
            VLV_REQUEST,
            VLV_RESPONSE,
            PERSISTENT_SEARCH,
            ENTRY_CHANGE,
        ] {
            assert!(is_valid_oid(oid), "{oid}");
        }
    }

    #[test]
    fn test_invalid_oids() {
        assert!(!is_valid_oid(""));
        assert!(!is_valid_oid("1"));
        assert!(!is_valid_oid("3.1"));
        assert!(!is_valid_oid("1.2.03"));
        assert!(!is_valid_oid("1.2."));
        assert!(!is_valid_oid("cn"));
    }
}
