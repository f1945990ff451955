//! Persistent search and entry change notification controls
//!
//! ```text
//! PersistentSearch ::= SEQUENCE {
//!     changeTypes INTEGER,
//!     changesOnly BOOLEAN,
//!     returnECs BOOLEAN }
//!
//! EntryChangeNotification ::= SEQUENCE {
//!     changeType ENUMERATED { add (1), delete (2), modify (4), modDN (8) },
//!     previousDN   LDAPDN OPTIONAL,     -- modifyDN ops. only
//!     changeNumber INTEGER OPTIONAL }
//! ```
//!
//! Change codes outside the four defined ones are kept as they arrive, both
//! in a change type ([`ChangeType::Other`]) and in a subscription mask, so a
//! server extension never makes a notification undecodable.

use std::ops::{BitOr, BitOrAssign};

use ldap_asn1::ber::{self, SequenceBuilder, Value};
use ldap_core::{LdapResult, oid};
use serde::{Deserialize, Serialize};

use crate::control::LdapControl;

/// Kind of change reported for an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Add,
    Delete,
    Modify,
    ModDn,
    /// A code with no defined meaning, kept verbatim
    Other(i64),
}

impl ChangeType {
    /// Create from integer value
    pub fn from_value(value: i64) -> Self {
        match value {
            1 => ChangeType::Add,
            2 => ChangeType::Delete,
            4 => ChangeType::Modify,
            8 => ChangeType::ModDn,
            other => ChangeType::Other(other),
        }
    }

    /// Get integer value
    pub fn value(self) -> i64 {
        match self {
            ChangeType::Add => 1,
            ChangeType::Delete => 2,
            ChangeType::Modify => 4,
            ChangeType::ModDn => 8,
            ChangeType::Other(value) => value,
        }
    }
}

/// Set of change types a persistent search subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChangeTypes(i64);

impl ChangeTypes {
    pub const ADD: Self = Self(1);
    pub const DELETE: Self = Self(2);
    pub const MODIFY: Self = Self(4);
    pub const MOD_DN: Self = Self(8);
    pub const ANY: Self = Self(0x0F);

    /// Create from a bitmask; bits beyond the defined ones are kept
    pub fn from_bits(bits: i64) -> Self {
        Self(bits)
    }

    /// The mask as written on the wire
    pub fn bits(self) -> i64 {
        self.0
    }

    /// Whether every bit of `change_type` is set
    pub fn contains(self, change_type: ChangeType) -> bool {
        let bits = change_type.value();
        bits != 0 && self.0 & bits == bits
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<ChangeType> for ChangeTypes {
    fn from(change_type: ChangeType) -> Self {
        Self(change_type.value())
    }
}

impl BitOr for ChangeTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<ChangeType> for ChangeTypes {
    type Output = Self;

    fn bitor(self, rhs: ChangeType) -> Self {
        self | Self::from(rhs)
    }
}

impl BitOrAssign for ChangeTypes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

const CHANGE_TYPES_INDEX: usize = 0;
const CHANGES_ONLY_INDEX: usize = 1;
const RETURN_CONTROLS_INDEX: usize = 2;

/// Persistent search request
///
/// The encoded sequence is built once and kept; setters patch the one
/// field they change so the next `encode` reflects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistSearchControl {
    change_types: ChangeTypes,
    changes_only: bool,
    return_controls: bool,
    critical: bool,
    sequence: Value,
}

impl PersistSearchControl {
    /// Create a critical persistent search request
    ///
    /// # Arguments
    /// * `change_types` - Changes to be notified of
    /// * `changes_only` - Skip the initial search results and send changes only
    /// * `return_controls` - Attach an entry change control to each notification
    pub fn new(change_types: ChangeTypes, changes_only: bool, return_controls: bool) -> Self {
        let sequence = SequenceBuilder::with_capacity(3)
            .push(Value::Integer(change_types.bits()))
            .push(changes_only)
            .push(return_controls)
            .sequence();

        Self {
            change_types,
            changes_only,
            return_controls,
            critical: true,
            sequence,
        }
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn change_types(&self) -> ChangeTypes {
        self.change_types
    }

    pub fn changes_only(&self) -> bool {
        self.changes_only
    }

    pub fn return_controls(&self) -> bool {
        self.return_controls
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Replace the subscribed change types, patching the held sequence
    ///
    /// # Returns
    /// Fails only if the held sequence has lost its change types field.
    pub fn set_change_types(&mut self, change_types: ChangeTypes) -> LdapResult<()> {
        self.sequence
            .set_at(CHANGE_TYPES_INDEX, Value::Integer(change_types.bits()))?;
        self.change_types = change_types;
        Ok(())
    }

    pub fn set_changes_only(&mut self, changes_only: bool) -> LdapResult<()> {
        self.sequence
            .set_at(CHANGES_ONLY_INDEX, Value::Boolean(changes_only))?;
        self.changes_only = changes_only;
        Ok(())
    }

    /// Ask for (or stop asking for) entry change controls with each result
    pub fn set_return_controls(&mut self, return_controls: bool) -> LdapResult<()> {
        self.sequence
            .set_at(RETURN_CONTROLS_INDEX, Value::Boolean(return_controls))?;
        self.return_controls = return_controls;
        Ok(())
    }

    /// The request SEQUENCE as currently patched
    pub fn to_value(&self) -> &Value {
        &self.sequence
    }

    pub fn encode(&self) -> Vec<u8> {
        log::debug!(
            "encoding persistent search: change types {:#x}, changes only {}, return controls {}",
            self.change_types.bits(),
            self.changes_only,
            self.return_controls
        );
        ber::encode(&self.sequence)
    }

    /// Wrap the encoded value in a control carrying the persistent search OID
    pub fn to_control(&self) -> LdapControl {
        LdapControl::known(oid::PERSISTENT_SEARCH, self.critical, self.encode())
    }

    /// Decode a persistent search value; the result is critical
    pub fn decode(data: &[u8]) -> LdapResult<Self> {
        let value = ber::decode_all(data)?;
        let change_types = ChangeTypes::from_bits(value.get(CHANGE_TYPES_INDEX)?.as_integer()?);
        let changes_only = value.get(CHANGES_ONLY_INDEX)?.as_bool()?;
        let return_controls = value.get(RETURN_CONTROLS_INDEX)?.as_bool()?;
        Ok(Self::new(change_types, changes_only, return_controls))
    }

    pub fn from_control(control: &LdapControl) -> LdapResult<Self> {
        Ok(Self::decode(control.value_for(oid::PERSISTENT_SEARCH)?)?
            .with_critical(control.is_critical()))
    }
}

/// Entry change notification, returned with each persistent search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryChangeControl {
    pub change_type: ChangeType,
    /// DN before a modify DN operation, empty otherwise
    pub previous_dn: String,
    pub change_number: i64,
    pub has_change_number: bool,
}

impl EntryChangeControl {
    /// Decode an entry change notification value
    ///
    /// `previousDN` is read only for modify DN changes whose sequence holds
    /// more than the change type. `changeNumber` is read only when the
    /// sequence holds exactly three elements.
    pub fn decode(data: &[u8]) -> LdapResult<Self> {
        let value = ber::decode_all(data)?;
        let len = value.len()?;

        let change_type = ChangeType::from_value(value.get(0)?.as_enumerated()?);

        let previous_dn = if change_type == ChangeType::ModDn && len > 1 {
            value.get(1)?.as_str()?
        } else {
            String::new()
        };

        let (change_number, has_change_number) = if len == 3 {
            (value.get(2)?.as_integer()?, true)
        } else {
            (0, false)
        };

        log::debug!(
            "decoded entry change: {:?}, previous DN {:?}, change number {:?}",
            change_type,
            previous_dn,
            has_change_number.then_some(change_number)
        );
        Ok(Self {
            change_type,
            previous_dn,
            change_number,
            has_change_number,
        })
    }

    pub fn from_control(control: &LdapControl) -> LdapResult<Self> {
        Self::decode(control.value_for(oid::ENTRY_CHANGE)?)
    }

    /// The change number, if the server sent one
    pub fn change_number(&self) -> Option<i64> {
        self.has_change_number.then_some(self.change_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldap_core::LdapError;

    #[test]
    fn test_change_types_mask() {
        let types = ChangeTypes::ADD | ChangeType::Modify;
        assert_eq!(types.bits(), 5);
        assert!(types.contains(ChangeType::Add));
        assert!(!types.contains(ChangeType::Delete));

        let mut all = ChangeTypes::default();
        assert!(all.is_empty());
        all |= ChangeTypes::ADD | ChangeTypes::DELETE | ChangeTypes::MODIFY | ChangeTypes::MOD_DN;
        assert_eq!(all, ChangeTypes::ANY);

        assert_eq!(ChangeTypes::from_bits(15), ChangeTypes::ANY);
        assert!(ChangeTypes::from_bits(0x10).contains(ChangeType::Other(0x10)));
        assert!(!ChangeTypes::from_bits(0x10).contains(ChangeType::Add));
    }

    #[test]
    fn test_unknown_mask_bits_are_kept() {
        let data = [0x30, 0x09, 0x02, 0x01, 0x3F, 0x01, 0x01, 0x00, 0x01, 0x01, 0xFF];
        let psearch = PersistSearchControl::decode(&data).unwrap();
        assert_eq!(psearch.change_types().bits(), 0x3F);
        assert!(psearch.change_types().contains(ChangeType::ModDn));
        assert_eq!(psearch.encode(), data);
    }

    #[test]
    fn test_encoding() {
        let psearch = PersistSearchControl::new(ChangeTypes::ANY, true, false);
        assert_eq!(
            psearch.encode(),
            vec![0x30, 0x09, 0x02, 0x01, 0x0F, 0x01, 0x01, 0xFF, 0x01, 0x01, 0x00]
        );
        assert!(psearch.is_critical());
    }

    #[test]
    fn test_setters_patch_encoding() {
        let mut psearch = PersistSearchControl::new(ChangeTypes::ANY, true, true);
        psearch.set_change_types(ChangeTypes::MOD_DN).unwrap();
        psearch.set_changes_only(false).unwrap();
        psearch.set_return_controls(false).unwrap();

        assert_eq!(psearch.change_types(), ChangeTypes::MOD_DN);
        assert_eq!(
            psearch.encode(),
            PersistSearchControl::new(ChangeTypes::MOD_DN, false, false).encode()
        );
        assert_eq!(
            psearch.to_value().get(0).unwrap(),
            &Value::Integer(8)
        );
    }

    #[test]
    fn test_control_round_trip() {
        let psearch =
            PersistSearchControl::new(ChangeTypes::ADD | ChangeTypes::DELETE, false, true)
                .with_critical(false);
        let control = psearch.to_control();
        assert_eq!(control.oid(), oid::PERSISTENT_SEARCH);
        assert_eq!(PersistSearchControl::from_control(&control).unwrap(), psearch);
    }

    #[test]
    fn test_entry_change_add() {
        let data = ber::encode(&Value::Sequence(vec![Value::Enumerated(1)]));
        let change = EntryChangeControl::decode(&data).unwrap();
        assert_eq!(change.change_type, ChangeType::Add);
        assert_eq!(change.previous_dn, "");
        assert!(!change.has_change_number);
        assert_eq!(change.change_number(), None);
    }

    #[test]
    fn test_entry_change_mod_dn() {
        let data = ber::encode(&Value::Sequence(vec![
            Value::Enumerated(8),
            Value::octet_string_from_str("ou=old"),
            Value::Integer(42),
        ]));
        let change = EntryChangeControl::decode(&data).unwrap();
        assert_eq!(change.change_type, ChangeType::ModDn);
        assert_eq!(change.previous_dn, "ou=old");
        assert_eq!(change.change_number, 42);
        assert!(change.has_change_number);
    }

    #[test]
    fn test_entry_change_mod_dn_without_number() {
        let data = ber::encode(&Value::Sequence(vec![
            Value::Enumerated(8),
            Value::octet_string_from_str("cn=x,ou=old"),
        ]));
        let change = EntryChangeControl::decode(&data).unwrap();
        assert_eq!(change.previous_dn, "cn=x,ou=old");
        assert_eq!(change.change_number(), None);
    }

    #[test]
    fn test_entry_change_number_needs_three_elements() {
        // a modify with only a change number carries two elements, which
        // leaves the number unread
        let data = ber::encode(&Value::Sequence(vec![
            Value::Enumerated(4),
            Value::Integer(7),
        ]));
        let change = EntryChangeControl::decode(&data).unwrap();
        assert_eq!(change.change_type, ChangeType::Modify);
        assert_eq!(change.previous_dn, "");
        assert!(!change.has_change_number);
    }

    #[test]
    fn test_entry_change_errors() {
        let wrong_type = ber::encode(&Value::Sequence(vec![Value::Integer(1)]));
        assert!(matches!(
            EntryChangeControl::decode(&wrong_type),
            Err(LdapError::TypeMismatch { .. })
        ));

        let bad_dn = ber::encode(&Value::Sequence(vec![
            Value::Enumerated(8),
            Value::Integer(1),
        ]));
        assert!(matches!(
            EntryChangeControl::decode(&bad_dn),
            Err(LdapError::TypeMismatch { .. })
        ));

        let empty = ber::encode(&Value::Sequence(vec![]));
        assert_eq!(
            EntryChangeControl::decode(&empty),
            Err(LdapError::MissingField { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_entry_change_unknown_type_is_kept() {
        let data = ber::encode(&Value::Sequence(vec![Value::Enumerated(16)]));
        let change = EntryChangeControl::decode(&data).unwrap();
        assert_eq!(change.change_type, ChangeType::Other(16));
        assert_eq!(change.change_type.value(), 16);
        assert_eq!(change.previous_dn, "");
    }
}
