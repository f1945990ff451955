//! Raw LDAP controls
//!
//! A control travels with an LDAP request or response as an OID, a
//! criticality flag and an optional opaque value. The typed controls in this
//! crate produce and consume that value; the message layer carrying it is
//! out of scope.
//!
//! ```text
//! Control ::= SEQUENCE {
//!     controlType     LDAPOID,
//!     criticality     BOOLEAN DEFAULT FALSE,
//!     controlValue    OCTET STRING OPTIONAL }
//! ```

use ldap_asn1::ber::{self, SequenceBuilder, Value};
use ldap_core::{LdapError, LdapResult, is_valid_oid};
use serde::{Deserialize, Deserializer, Serialize};

/// An LDAP control with an opaque value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LdapControl {
    #[serde(deserialize_with = "deserialize_oid")]
    oid: String,
    critical: bool,
    #[serde(with = "serde_bytes")]
    value: Option<Vec<u8>>,
}

impl LdapControl {
    /// Create a control, checking that `oid` is dotted-numeric
    ///
    /// # Arguments
    /// * `oid` - Control type
    /// * `critical` - Whether the server must reject an operation it cannot honour the control for
    /// * `value` - Encoded control value, if the control carries one
    pub fn new(oid: impl Into<String>, critical: bool, value: Option<Vec<u8>>) -> LdapResult<Self> {
        let oid = oid.into();
        if !is_valid_oid(&oid) {
            return Err(LdapError::InvalidOid(oid));
        }
        Ok(Self {
            oid,
            critical,
            value,
        })
    }

    /// Create a control for one of the OIDs defined in `ldap_core::oid`
    pub(crate) fn known(oid: &'static str, critical: bool, value: Vec<u8>) -> Self {
        Self {
            oid: oid.to_string(),
            critical,
            value: Some(value),
        }
    }

    /// Control type OID
    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Encoded control value
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// The value of a control that must be `expected_oid` and must carry one
    pub(crate) fn value_for(&self, expected_oid: &str) -> LdapResult<&[u8]> {
        if self.oid != expected_oid {
            return Err(LdapError::InvalidData(format!(
                "expected control {}, got {}",
                expected_oid, self.oid
            )));
        }
        self.value.as_deref().ok_or_else(|| {
            LdapError::InvalidData(format!("control {} carries no value", self.oid))
        })
    }

    /// Build the control's envelope; criticality is left out when false
    pub fn to_value(&self) -> Value {
        SequenceBuilder::with_capacity(3)
            .push(self.oid.as_str())
            .push_opt(self.critical.then_some(true))
            .push_opt(self.value.clone())
            .sequence()
    }

    /// Encode the control's envelope
    pub fn encode(&self) -> Vec<u8> {
        ber::encode(&self.to_value())
    }

    /// Read a control from its envelope
    pub fn from_value(value: &Value) -> LdapResult<Self> {
        let items = value.as_elements()?;
        let oid = value.get(0)?.as_str()?;

        let mut critical = false;
        let mut control_value = None;
        for item in &items[1..] {
            match item {
                Value::Boolean(b) if control_value.is_none() => critical = *b,
                Value::OctetString(bytes) if control_value.is_none() => {
                    control_value = Some(bytes.clone())
                }
                other => {
                    return Err(LdapError::TypeMismatch {
                        expected: "OctetString",
                        found: other.kind(),
                    });
                }
            }
        }

        Self::new(oid, critical, control_value)
    }

    /// Decode a control's envelope
    pub fn decode(data: &[u8]) -> LdapResult<Self> {
        Self::from_value(&ber::decode_all(data)?)
    }
}

/// Deserialize an OID, rejecting anything that is not dotted-numeric
fn deserialize_oid<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let oid = String::deserialize(deserializer)?;
    if !is_valid_oid(&oid) {
        return Err(serde::de::Error::custom(LdapError::InvalidOid(oid)));
    }
    Ok(oid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldap_core::oid;

    #[test]
    fn test_rejects_invalid_oid() {
        assert_eq!(
            LdapControl::new("sort", false, None),
            Err(LdapError::InvalidOid("sort".to_string()))
        );
    }

    #[test]
    fn test_deserialized_oid_is_checked() {
        use serde::de::IntoDeserializer;
        use serde::de::value::{Error, StrDeserializer};

        let valid: StrDeserializer<Error> = oid::SORT_REQUEST.into_deserializer();
        assert_eq!(deserialize_oid(valid).unwrap(), oid::SORT_REQUEST);

        let invalid: StrDeserializer<Error> = "sort".into_deserializer();
        let err = deserialize_oid(invalid).unwrap_err();
        assert!(err.to_string().contains("sort"));
    }

    #[test]
    fn test_envelope_omits_default_criticality() {
        let control = LdapControl::new("1.2.3", false, None).unwrap();
        assert_eq!(
            control.encode(),
            vec![0x30, 0x07, 0x04, 0x05, b'1', b'.', b'2', b'.', b'3']
        );
    }

    #[test]
    fn test_envelope_round_trip() {
        let control = LdapControl::new(oid::SORT_REQUEST, true, Some(vec![0x30, 0x00])).unwrap();
        let decoded = LdapControl::decode(&control.encode()).unwrap();
        assert_eq!(decoded, control);
        assert!(decoded.is_critical());
        assert_eq!(decoded.value(), Some(&[0x30, 0x00][..]));

        let control = LdapControl::new(oid::VLV_RESPONSE, false, Some(vec![1])).unwrap();
        assert_eq!(LdapControl::decode(&control.encode()).unwrap(), control);
    }

    #[test]
    fn test_envelope_type_mismatch() {
        let value = SequenceBuilder::new()
            .push("1.2.3")
            .push(Value::Integer(1))
            .sequence();
        assert!(matches!(
            LdapControl::from_value(&value),
            Err(LdapError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_value_for() {
        let control = LdapControl::known(oid::SORT_RESPONSE, false, vec![0x05, 0x00]);
        assert_eq!(control.value_for(oid::SORT_RESPONSE).unwrap(), &[0x05, 0x00]);
        assert!(control.value_for(oid::VLV_RESPONSE).is_err());

        let empty = LdapControl::new(oid::SORT_RESPONSE, false, None).unwrap();
        assert!(matches!(
            empty.value_for(oid::SORT_RESPONSE),
            Err(LdapError::InvalidData(_))
        ));
    }
}
