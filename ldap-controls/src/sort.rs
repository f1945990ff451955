//! Server-side sorting controls (RFC 2891)
//!
//! ```text
//! SortKeyList ::= SEQUENCE OF SEQUENCE {
//!     attributeType   AttributeDescription,
//!     orderingRule    [0] MatchingRuleId OPTIONAL,
//!     reverseOrder    [1] BOOLEAN DEFAULT FALSE }
//!
//! SortResult ::= SEQUENCE {
//!     sortResult      ENUMERATED,
//!     attributeType   [0] AttributeDescription OPTIONAL }
//! ```

use std::fmt;
use std::str::FromStr;

use ldap_asn1::ber::{self, Identifier, SequenceBuilder, Tagged, UniversalTag, Value};
use ldap_core::{LdapError, LdapResult, oid};
use serde::{Deserialize, Serialize};

use crate::control::LdapControl;

const ORDERING_RULE: u32 = 0;
const REVERSE_ORDER: u32 = 1;
const FAILED_ATTRIBUTE: u32 = 0;

/// One attribute to sort on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    attribute: String,
    reverse: bool,
    matching_rule: Option<String>,
}

impl SortKey {
    pub fn new(attribute: impl Into<String>, reverse: bool) -> Self {
        Self {
            attribute: attribute.into(),
            reverse,
            matching_rule: None,
        }
    }

    /// Order values with the named matching rule instead of the attribute's own
    pub fn with_matching_rule(mut self, rule: impl Into<String>) -> Self {
        self.matching_rule = Some(rule.into());
        self
    }

    /// Parse a key description of the form `[-]attribute[:matchingRule]`
    ///
    /// A leading `-` asks for reverse order.
    pub fn parse(description: &str) -> LdapResult<Self> {
        let (reverse, rest) = match description.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, description),
        };

        let (attribute, matching_rule) = match rest.split_once(':') {
            Some((attribute, rule)) => (attribute, Some(rule)),
            None => (rest, None),
        };

        if attribute.is_empty() {
            return Err(LdapError::InvalidData(format!(
                "sort key has no attribute: {:?}",
                description
            )));
        }
        if matching_rule.is_some_and(str::is_empty) {
            return Err(LdapError::InvalidData(format!(
                "sort key has an empty matching rule: {:?}",
                description
            )));
        }

        let key = Self::new(attribute, reverse);
        Ok(match matching_rule {
            Some(rule) => key.with_matching_rule(rule),
            None => key,
        })
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn matching_rule(&self) -> Option<&str> {
        self.matching_rule.as_deref()
    }

    /// Build the key's SEQUENCE; optional fields appear only when set
    pub fn to_value(&self) -> Value {
        let ordering_rule = self.matching_rule.as_deref().map(|rule| {
            Tagged::implicit(
                Identifier::context(false, ORDERING_RULE),
                Value::octet_string_from_str(rule),
            )
        });
        let reverse_order = self.reverse.then(|| {
            Tagged::implicit(
                Identifier::context(false, REVERSE_ORDER),
                Value::Boolean(true),
            )
        });

        SequenceBuilder::with_capacity(3)
            .push(self.attribute.as_str())
            .push_opt(ordering_rule)
            .push_opt(reverse_order)
            .sequence()
    }

    pub fn from_value(value: &Value) -> LdapResult<Self> {
        let items = value.as_elements()?;
        let mut key = Self::new(value.get(0)?.as_str()?, false);

        for item in &items[1..] {
            let tagged = item.as_tagged()?;
            match tagged.identifier.tag() {
                ORDERING_RULE => {
                    key.matching_rule =
                        Some(tagged.resolve_implicit(UniversalTag::OctetString)?.as_str()?)
                }
                REVERSE_ORDER => {
                    key.reverse = tagged.resolve_implicit(UniversalTag::Boolean)?.as_bool()?
                }
                other => {
                    return Err(LdapError::InvalidData(format!(
                        "unexpected tag [{}] in sort key",
                        other
                    )));
                }
            }
        }

        Ok(key)
    }
}

impl FromStr for SortKey {
    type Err = LdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reverse {
            write!(f, "-")?;
        }
        write!(f, "{}", self.attribute)?;
        if let Some(rule) = &self.matching_rule {
            write!(f, ":{}", rule)?;
        }
        Ok(())
    }
}

/// Server-side sort request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortControl {
    keys: Vec<SortKey>,
    critical: bool,
}

impl SortControl {
    /// Create a sort request
    ///
    /// # Arguments
    /// * `keys` - Sort keys, most significant first
    /// * `critical` - Whether the server must refuse the search if it cannot sort
    pub fn new(keys: Vec<SortKey>, critical: bool) -> Self {
        Self { keys, critical }
    }

    /// Sort on a single key
    pub fn single(key: SortKey, critical: bool) -> Self {
        Self::new(vec![key], critical)
    }

    /// Keys in order of significance
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Build the SEQUENCE OF sort keys
    pub fn to_value(&self) -> Value {
        Value::SequenceOf(self.keys.iter().map(SortKey::to_value).collect())
    }

    /// Encode the control value
    pub fn encode(&self) -> Vec<u8> {
        log::debug!("encoding sort control with {} keys", self.keys.len());
        ber::encode(&self.to_value())
    }

    /// Wrap the encoded value in a control carrying the sort request OID
    pub fn to_control(&self) -> LdapControl {
        LdapControl::known(oid::SORT_REQUEST, self.critical, self.encode())
    }

    /// Decode a sort request value; the result is not critical
    pub fn decode(data: &[u8]) -> LdapResult<Self> {
        let value = ber::decode_all(data)?;
        let keys = value
            .as_elements()?
            .iter()
            .map(SortKey::from_value)
            .collect::<LdapResult<Vec<_>>>()?;
        Ok(Self::new(keys, false))
    }

    /// Read a sort request, taking criticality from the control
    pub fn from_control(control: &LdapControl) -> LdapResult<Self> {
        let mut sort = Self::decode(control.value_for(oid::SORT_REQUEST)?)?;
        sort.critical = control.is_critical();
        Ok(sort)
    }
}

/// Result codes a server reports for a sort request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortResult {
    Success = 0,
    OperationsError = 1,
    TimeLimitExceeded = 3,
    StrongAuthRequired = 8,
    AdminLimitExceeded = 11,
    NoSuchAttribute = 16,
    InappropriateMatching = 18,
    InsufficientAccessRights = 50,
    Busy = 51,
    UnwillingToPerform = 53,
    Other = 80,
}

impl SortResult {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SortResult::Success),
            1 => Some(SortResult::OperationsError),
            3 => Some(SortResult::TimeLimitExceeded),
            8 => Some(SortResult::StrongAuthRequired),
            11 => Some(SortResult::AdminLimitExceeded),
            16 => Some(SortResult::NoSuchAttribute),
            18 => Some(SortResult::InappropriateMatching),
            50 => Some(SortResult::InsufficientAccessRights),
            51 => Some(SortResult::Busy),
            53 => Some(SortResult::UnwillingToPerform),
            80 => Some(SortResult::Other),
            _ => None,
        }
    }
}

/// Server-side sort response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortResponse {
    pub result_code: i64,
    pub failed_attribute: Option<String>,
}

impl SortResponse {
    /// Named result, if the code is one RFC 2891 lists
    pub fn result(&self) -> Option<SortResult> {
        SortResult::from_code(self.result_code)
    }

    /// Decode a sort response value
    ///
    /// The failed attribute, when present, may arrive either as a plain
    /// OCTET STRING or under its `[0]` context tag.
    pub fn decode(data: &[u8]) -> LdapResult<Self> {
        let value = ber::decode_all(data)?;
        let result_code = value.get(0)?.as_enumerated()?;

        let failed_attribute = if value.len()? > 1 {
            let field = value.get(1)?;
            let text = match field {
                Value::Tagged(tagged) if tagged.identifier.tag() == FAILED_ATTRIBUTE => tagged
                    .resolve_implicit(UniversalTag::OctetString)?
                    .as_str()?,
                other => other.as_str()?,
            };
            Some(text)
        } else {
            None
        };

        log::debug!(
            "decoded sort response: result {}, failed attribute {:?}",
            result_code,
            failed_attribute
        );
        Ok(Self {
            result_code,
            failed_attribute,
        })
    }

    pub fn from_control(control: &LdapControl) -> LdapResult<Self> {
        Self::decode(control.value_for(oid::SORT_RESPONSE)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key_encoding() {
        let sort = SortControl::single(SortKey::new("cn", false), true);
        assert_eq!(
            sort.encode(),
            vec![0x30, 0x06, 0x30, 0x04, 0x04, 0x02, b'c', b'n']
        );
    }

    #[test]
    fn test_value_survives_wire() {
        let sort = SortControl::new(
            vec![
                SortKey::new("cn", false),
                SortKey::new("sn", true).with_matching_rule("2.5.13.3"),
            ],
            true,
        );
        let value = sort.to_value();
        let bytes = ber::encode(&value);
        assert_eq!(ber::decode(&bytes).unwrap(), (value, bytes.len()));
    }

    #[test]
    fn test_optional_fields_are_implicitly_tagged() {
        let key = SortKey::new("sn", true).with_matching_rule("2.5.13.3");
        let bytes = SortControl::single(key, false).encode();
        assert_eq!(
            bytes,
            vec![
                0x30, 0x13, 0x30, 0x11, //
                0x04, 0x02, b's', b'n', //
                0x80, 0x08, b'2', b'.', b'5', b'.', b'1', b'3', b'.', b'3', //
                0x81, 0x01, 0xFF,
            ]
        );
    }

    #[test]
    fn test_control_round_trip() {
        let sort = SortControl::new(
            vec![
                SortKey::parse("cn").unwrap(),
                SortKey::parse("-sn:caseIgnoreOrderingMatch").unwrap(),
                SortKey::parse("-uid").unwrap(),
            ],
            true,
        );

        let control = sort.to_control();
        assert_eq!(control.oid(), oid::SORT_REQUEST);
        assert_eq!(SortControl::from_control(&control).unwrap(), sort);
    }

    #[test]
    fn test_key_descriptions() {
        let key: SortKey = "-cn:caseExactOrderingMatch".parse().unwrap();
        assert_eq!(key.attribute(), "cn");
        assert!(key.is_reverse());
        assert_eq!(key.matching_rule(), Some("caseExactOrderingMatch"));
        assert_eq!(key.to_string(), "-cn:caseExactOrderingMatch");

        let key = SortKey::parse("mail").unwrap();
        assert!(!key.is_reverse());
        assert_eq!(key.matching_rule(), None);

        assert!(SortKey::parse("").is_err());
        assert!(SortKey::parse("-").is_err());
        assert!(SortKey::parse("cn:").is_err());
    }

    #[test]
    fn test_sort_response() {
        let response = SortResponse::decode(&[0x30, 0x03, 0x0A, 0x01, 0x00]).unwrap();
        assert_eq!(response.result_code, 0);
        assert_eq!(response.result(), Some(SortResult::Success));
        assert_eq!(response.failed_attribute, None);

        let plain = [0x30, 0x07, 0x0A, 0x01, 0x10, 0x04, 0x02, b'c', b'n'];
        let response = SortResponse::decode(&plain).unwrap();
        assert_eq!(response.result(), Some(SortResult::NoSuchAttribute));
        assert_eq!(response.failed_attribute.as_deref(), Some("cn"));

        let tagged = [0x30, 0x07, 0x0A, 0x01, 0x12, 0x80, 0x02, b's', b'n'];
        let response = SortResponse::decode(&tagged).unwrap();
        assert_eq!(response.result(), Some(SortResult::InappropriateMatching));
        assert_eq!(response.failed_attribute.as_deref(), Some("sn"));
    }

    #[test]
    fn test_sort_response_type_mismatch() {
        let data = [0x30, 0x03, 0x02, 0x01, 0x00];
        assert_eq!(
            SortResponse::decode(&data),
            Err(LdapError::TypeMismatch {
                expected: "Enumerated",
                found: "Integer"
            })
        );
        assert!(matches!(
            SortResponse::decode(&[0x30, 0x00]),
            Err(LdapError::MissingField { index: 0, len: 0 })
        ));
    }
}
