//! Virtual list view controls
//!
//! ```text
//! VirtualListViewRequest ::= SEQUENCE {
//!     beforeCount    INTEGER (0..maxInt),
//!     afterCount     INTEGER (0..maxInt),
//!     target       CHOICE {
//!         byOffset        [0] SEQUENCE {
//!             offset          INTEGER (1 .. maxInt),
//!             contentCount    INTEGER (0 .. maxInt) },
//!         greaterThanOrEqual [1] AssertionValue },
//!     contextID     OCTET STRING OPTIONAL }
//!
//! VirtualListViewResponse ::= SEQUENCE {
//!     targetPosition    INTEGER (0 .. maxInt),
//!     contentCount     INTEGER (0 .. maxInt),
//!     virtualListViewResult ENUMERATED,
//!     contextID     OCTET STRING OPTIONAL }
//! ```

use ldap_asn1::ber::{self, Identifier, SequenceBuilder, Tagged, UniversalTag, Value};
use ldap_core::{LdapError, LdapResult, oid};
use serde::{Deserialize, Serialize};

use crate::control::LdapControl;

const BY_OFFSET: u32 = 0;
const GREATER_THAN_OR_EQUAL: u32 = 1;

/// Where the requested window of the list is anchored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlvTarget {
    /// 1-based position of the target entry within a list of `content_count`
    ByOffset { offset: i64, content_count: i64 },
    /// First entry whose sort key is greater than or equal to the assertion
    GreaterThanOrEqual(String),
}

impl VlvTarget {
    fn to_value(&self) -> Value {
        match self {
            VlvTarget::ByOffset {
                offset,
                content_count,
            } => Tagged::implicit(
                Identifier::context(true, BY_OFFSET),
                Value::Sequence(vec![
                    Value::Integer(*offset),
                    Value::Integer(*content_count),
                ]),
            )
            .into(),
            VlvTarget::GreaterThanOrEqual(assertion) => Tagged::implicit(
                Identifier::context(false, GREATER_THAN_OR_EQUAL),
                Value::octet_string_from_str(assertion),
            )
            .into(),
        }
    }

    fn from_value(value: &Value) -> LdapResult<Self> {
        let tagged = value.as_tagged()?;
        match tagged.identifier.tag() {
            BY_OFFSET => {
                let by_offset = tagged.resolve_implicit(UniversalTag::Sequence)?;
                Ok(VlvTarget::ByOffset {
                    offset: by_offset.get(0)?.as_integer()?,
                    content_count: by_offset.get(1)?.as_integer()?,
                })
            }
            GREATER_THAN_OR_EQUAL => Ok(VlvTarget::GreaterThanOrEqual(
                tagged
                    .resolve_implicit(UniversalTag::OctetString)?
                    .as_str()?,
            )),
            other => Err(LdapError::InvalidData(format!(
                "unexpected virtual list target tag [{}]",
                other
            ))),
        }
    }
}

/// Virtual list view request
///
/// Asks the server for `before_count` entries before the target, the target
/// itself and `after_count` entries after it, out of a sorted result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualListControl {
    before_count: i64,
    after_count: i64,
    target: VlvTarget,
    context: Option<Vec<u8>>,
    critical: bool,
}

impl VirtualListControl {
    /// Request a window around the entry at `offset` of a list believed to
    /// hold `content_count` entries
    pub fn by_offset(offset: i64, before_count: i64, after_count: i64, content_count: i64) -> Self {
        Self {
            before_count,
            after_count,
            target: VlvTarget::ByOffset {
                offset,
                content_count,
            },
            context: None,
            critical: true,
        }
    }

    /// Request a window around the first entry not sorting before `jump_to`
    pub fn greater_than_or_equal(jump_to: impl Into<String>, before_count: i64, after_count: i64) -> Self {
        Self {
            before_count,
            after_count,
            target: VlvTarget::GreaterThanOrEqual(jump_to.into()),
            context: None,
            critical: true,
        }
    }

    /// Attach the context identifier from a previous response
    pub fn with_context(mut self, context: Vec<u8>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn before_count(&self) -> i64 {
        self.before_count
    }

    pub fn after_count(&self) -> i64 {
        self.after_count
    }

    pub fn target(&self) -> &VlvTarget {
        &self.target
    }

    pub fn context(&self) -> Option<&[u8]> {
        self.context.as_deref()
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Target offset, if the request is by offset
    pub fn list_index(&self) -> Option<i64> {
        match self.target {
            VlvTarget::ByOffset { offset, .. } => Some(offset),
            VlvTarget::GreaterThanOrEqual(_) => None,
        }
    }

    /// Content count, if the request is by offset
    pub fn list_size(&self) -> Option<i64> {
        match self.target {
            VlvTarget::ByOffset { content_count, .. } => Some(content_count),
            VlvTarget::GreaterThanOrEqual(_) => None,
        }
    }

    /// Move the window to `offset`, keeping the known content count
    pub fn set_range(&mut self, offset: i64, before_count: i64, after_count: i64) {
        let content_count = self.list_size().unwrap_or(0);
        self.before_count = before_count;
        self.after_count = after_count;
        self.target = VlvTarget::ByOffset {
            offset,
            content_count,
        };
    }

    /// Move the window to the first entry not sorting before `jump_to`
    pub fn set_jump_to(&mut self, jump_to: impl Into<String>, before_count: i64, after_count: i64) {
        self.before_count = before_count;
        self.after_count = after_count;
        self.target = VlvTarget::GreaterThanOrEqual(jump_to.into());
    }

    /// Update the content count, turning the request into a by-offset one
    ///
    /// A greater-than-or-equal request becomes a request for offset 0.
    pub fn set_list_size(&mut self, content_count: i64) {
        let offset = self.list_index().unwrap_or(0);
        self.target = VlvTarget::ByOffset {
            offset,
            content_count,
        };
    }

    /// Replace or drop the context identifier
    pub fn set_context(&mut self, context: Option<Vec<u8>>) {
        self.context = context;
    }

    /// Build the request SEQUENCE; the context is written only when set
    pub fn to_value(&self) -> Value {
        SequenceBuilder::with_capacity(4)
            .push(Value::Integer(self.before_count))
            .push(Value::Integer(self.after_count))
            .push(self.target.to_value())
            .push_opt(self.context.clone())
            .sequence()
    }

    /// Encode the control value
    pub fn encode(&self) -> Vec<u8> {
        log::debug!(
            "encoding virtual list request {:?} (-{}/+{})",
            self.target,
            self.before_count,
            self.after_count
        );
        ber::encode(&self.to_value())
    }

    /// Wrap the encoded value in a control carrying the request OID
    pub fn to_control(&self) -> LdapControl {
        LdapControl::known(oid::VLV_REQUEST, self.critical, self.encode())
    }

    /// Decode a virtual list request value; the result is critical
    pub fn decode(data: &[u8]) -> LdapResult<Self> {
        let value = ber::decode_all(data)?;

        let context = if value.len()? > 3 {
            Some(value.get(3)?.as_octet_string()?.to_vec())
        } else {
            None
        };

        Ok(Self {
            before_count: value.get(0)?.as_integer()?,
            after_count: value.get(1)?.as_integer()?,
            target: VlvTarget::from_value(value.get(2)?)?,
            context,
            critical: true,
        })
    }

    pub fn from_control(control: &LdapControl) -> LdapResult<Self> {
        Ok(Self::decode(control.value_for(oid::VLV_REQUEST)?)?.with_critical(control.is_critical()))
    }
}

/// Virtual list view response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualListResponse {
    pub first_position: i64,
    pub content_count: i64,
    pub result_code: i64,
    #[serde(with = "serde_bytes")]
    pub context: Option<Vec<u8>>,
}

impl VirtualListResponse {
    /// Decode a virtual list response value
    ///
    /// # Returns
    /// Returns `MissingField` or `TypeMismatch` when one of the three
    /// mandatory fields is absent or of the wrong type.
    pub fn decode(data: &[u8]) -> LdapResult<Self> {
        let value = ber::decode_all(data)?;

        let response = Self {
            first_position: value.get(0)?.as_integer()?,
            content_count: value.get(1)?.as_integer()?,
            result_code: value.get(2)?.as_enumerated()?,
            context: if value.len()? > 3 {
                Some(value.get(3)?.as_octet_string()?.to_vec())
            } else {
                None
            },
        };

        log::debug!(
            "decoded virtual list response: position {} of {}, result {}",
            response.first_position,
            response.content_count,
            response.result_code
        );
        Ok(response)
    }

    pub fn from_control(control: &LdapControl) -> LdapResult<Self> {
        Self::decode(control.value_for(oid::VLV_RESPONSE)?)
    }
}
