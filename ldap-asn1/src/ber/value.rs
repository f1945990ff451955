//! ASN.1 value tree
//!
//! A [`Value`] is a closed set of the value kinds LDAP controls are built
//! from. Structured values own their children, so a tree is always acyclic.
//! Values are immutable once built except for positional replacement of a
//! structured value's children through [`Value::set_at`].

use ldap_core::{LdapError, LdapResult};

use crate::ber::decoder::{BerDecoder, DecoderConfig};
use crate::ber::encoder::tagged_content;
use crate::ber::types::{Identifier, UniversalTag};

/// An ASN.1 value
///
/// Equality is structural and follows the wire form: `Sequence` and
/// `SequenceOf` compare equal when their children do, as do `Set` and
/// `SetOf`, and a `Choice` compares as the alternative it holds. Tagged
/// values compare by identifier and content octets (see [`Tagged`]).
#[derive(Debug, Clone)]
pub enum Value {
    /// BOOLEAN
    Boolean(bool),
    /// INTEGER
    Integer(i64),
    /// ENUMERATED
    Enumerated(i64),
    /// NULL
    Null,
    /// OCTET STRING
    OctetString(Vec<u8>),
    /// SEQUENCE (heterogeneous, positional)
    Sequence(Vec<Value>),
    /// SEQUENCE OF (homogeneous)
    SequenceOf(Vec<Value>),
    /// SET, children kept in caller order
    Set(Vec<Value>),
    /// SET OF, children kept in caller order
    SetOf(Vec<Value>),
    /// A value carried under a different tag
    Tagged(Tagged),
    /// Exactly one alternative of a CHOICE
    Choice(Box<Value>),
}

impl Value {
    /// Build an OCTET STRING from UTF-8 text
    pub fn octet_string_from_str(s: &str) -> Self {
        Value::OctetString(s.as_bytes().to_vec())
    }

    /// The identifier this value carries on the wire
    ///
    /// A choice never contributes its own tag: it reports the identifier of
    /// the alternative it holds.
    pub fn identifier(&self) -> Identifier {
        match self {
            Value::Boolean(_) => UniversalTag::Boolean.identifier(),
            Value::Integer(_) => UniversalTag::Integer.identifier(),
            Value::Enumerated(_) => UniversalTag::Enumerated.identifier(),
            Value::Null => UniversalTag::Null.identifier(),
            Value::OctetString(_) => UniversalTag::OctetString.identifier(),
            Value::Sequence(_) | Value::SequenceOf(_) => UniversalTag::Sequence.identifier(),
            Value::Set(_) | Value::SetOf(_) => UniversalTag::Set.identifier(),
            Value::Tagged(tagged) => tagged.identifier,
            Value::Choice(inner) => inner.identifier(),
        }
    }

    /// Name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Enumerated(_) => "Enumerated",
            Value::Null => "Null",
            Value::OctetString(_) => "OctetString",
            Value::Sequence(_) => "Sequence",
            Value::SequenceOf(_) => "SequenceOf",
            Value::Set(_) => "Set",
            Value::SetOf(_) => "SetOf",
            Value::Tagged(_) => "Tagged",
            Value::Choice(_) => "Choice",
        }
    }

    /// Follow choices down to the alternative they hold
    fn resolved(&self) -> &Value {
        match self {
            Value::Choice(inner) => inner.resolved(),
            other => other,
        }
    }

    fn mismatch(&self, expected: &'static str) -> LdapError {
        LdapError::TypeMismatch {
            expected,
            found: self.resolved().kind(),
        }
    }

    /// Read a BOOLEAN
    ///
    /// # Returns
    /// Returns `TypeMismatch` if the value (after following choices) is not
    /// a BOOLEAN. The same holds for the other `as_*` accessors.
    pub fn as_bool(&self) -> LdapResult<bool> {
        match self.resolved() {
            Value::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch("Boolean")),
        }
    }

    /// Read an INTEGER
    pub fn as_integer(&self) -> LdapResult<i64> {
        match self.resolved() {
            Value::Integer(i) => Ok(*i),
            _ => Err(self.mismatch("Integer")),
        }
    }

    /// Read an ENUMERATED; an INTEGER is not accepted in its place
    pub fn as_enumerated(&self) -> LdapResult<i64> {
        match self.resolved() {
            Value::Enumerated(e) => Ok(*e),
            _ => Err(self.mismatch("Enumerated")),
        }
    }

    /// Borrow the bytes of an OCTET STRING
    pub fn as_octet_string(&self) -> LdapResult<&[u8]> {
        match self.resolved() {
            Value::OctetString(bytes) => Ok(bytes),
            _ => Err(self.mismatch("OctetString")),
        }
    }

    /// Read an OCTET STRING as UTF-8 text
    pub fn as_str(&self) -> LdapResult<String> {
        Ok(String::from_utf8(self.as_octet_string()?.to_vec())?)
    }

    /// Borrow a tagged value, typically one the decoder left opaque
    pub fn as_tagged(&self) -> LdapResult<&Tagged> {
        match self.resolved() {
            Value::Tagged(tagged) => Ok(tagged),
            _ => Err(self.mismatch("Tagged")),
        }
    }

    /// Children of a SEQUENCE, SEQUENCE OF, SET or SET OF
    pub fn as_elements(&self) -> LdapResult<&[Value]> {
        match self.resolved() {
            Value::Sequence(items)
            | Value::SequenceOf(items)
            | Value::Set(items)
            | Value::SetOf(items) => Ok(items),
            _ => Err(self.mismatch("Sequence")),
        }
    }

    fn elements_mut(&mut self) -> LdapResult<&mut Vec<Value>> {
        match self {
            Value::Choice(inner) => inner.elements_mut(),
            Value::Sequence(items)
            | Value::SequenceOf(items)
            | Value::Set(items)
            | Value::SetOf(items) => Ok(items),
            other => Err(LdapError::TypeMismatch {
                expected: "Sequence",
                found: other.kind(),
            }),
        }
    }

    /// Number of children of a structured value
    pub fn len(&self) -> LdapResult<usize> {
        Ok(self.as_elements()?.len())
    }

    /// Whether a structured value has no children
    pub fn is_empty(&self) -> LdapResult<bool> {
        Ok(self.as_elements()?.is_empty())
    }

    /// Child at `index` of a structured value
    ///
    /// # Arguments
    /// * `index` - Zero-based position of the child
    ///
    /// # Returns
    /// Returns `MissingField` when `index` is past the last child and
    /// `TypeMismatch` when the value is not structured.
    pub fn get(&self, index: usize) -> LdapResult<&Value> {
        let items = self.as_elements()?;
        items.get(index).ok_or(LdapError::MissingField {
            index,
            len: items.len(),
        })
    }

    /// Replace the child at `index` of a structured value
    ///
    /// # Arguments
    /// * `index` - Zero-based position of an existing child
    /// * `value` - The replacement
    ///
    /// # Returns
    /// Fails like [`Value::get`]; the sequence never grows.
    pub fn set_at(&mut self, index: usize, value: Value) -> LdapResult<()> {
        let items = self.elements_mut()?;
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or(LdapError::MissingField { index, len })?;
        *slot = value;
        Ok(())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self.resolved(), other.resolved()) {
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Enumerated(a), Enumerated(b)) => a == b,
            (Null, Null) => true,
            (OctetString(a), OctetString(b)) => a == b,
            (Sequence(a) | SequenceOf(a), Sequence(b) | SequenceOf(b)) => a == b,
            (Set(a) | SetOf(a), Set(b) | SetOf(b)) => a == b,
            (Tagged(a), Tagged(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::octet_string_from_str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::OctetString(bytes)
    }
}

impl From<Tagged> for Value {
    fn from(tagged: Tagged) -> Self {
        Value::Tagged(tagged)
    }
}

/// A value carried under another, usually context-specific, identifier
///
/// With explicit tagging the inner value keeps its own TLV and is wrapped in
/// an outer one. With implicit tagging the tag's identifier replaces the
/// inner one, so a single TLV goes on the wire and the inner identifier is
/// not recoverable from the bytes.
///
/// Two tagged values are equal when they carry the same identifier and the
/// same content octets. A value decoded from the wire (opaque, holding its
/// content as an OCTET STRING) therefore equals the explicit or implicit
/// value it was encoded from.
#[derive(Debug, Clone)]
pub struct Tagged {
    pub identifier: Identifier,
    pub inner: Box<Value>,
    pub explicit: bool,
}

impl PartialEq for Tagged {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && tagged_content(self) == tagged_content(other)
    }
}

impl Eq for Tagged {}

impl Tagged {
    /// Create a tagged value with the identifier exactly as given
    ///
    /// # Arguments
    /// * `identifier` - Identifier written on the wire
    /// * `inner` - The tagged value
    /// * `explicit` - Whether `inner` keeps its own TLV inside the tag
    pub fn new(identifier: Identifier, inner: Value, explicit: bool) -> Self {
        Self {
            identifier,
            inner: Box::new(inner),
            explicit,
        }
    }

    /// Explicitly tag `inner`; the outer identifier is always constructed
    pub fn explicit(identifier: Identifier, inner: Value) -> Self {
        Self::new(identifier.with_constructed(true), inner, true)
    }

    /// Implicitly tag `inner`, taking the constructed bit from the inner value
    pub fn implicit(identifier: Identifier, inner: Value) -> Self {
        let constructed = inner.identifier().is_constructed();
        Self::new(identifier.with_constructed(constructed), inner, false)
    }

    /// Content bytes carried by a tagged value produced by the decoder
    fn carried_content(&self) -> LdapResult<&[u8]> {
        self.inner.as_octet_string()
    }

    /// Decode the carried content as one complete, explicitly tagged TLV
    pub fn resolve_explicit(&self) -> LdapResult<Value> {
        self.resolve_explicit_with(DecoderConfig::default())
    }

    /// Like [`Tagged::resolve_explicit`], decoding under `config`
    pub fn resolve_explicit_with(&self, config: DecoderConfig) -> LdapResult<Value> {
        BerDecoder::with_config(self.carried_content()?, config).decode_to_end()
    }

    /// Reinterpret the carried content as the content of universal type `tag`
    ///
    /// The decoder cannot know what an implicit tag stands for, so callers
    /// holding the schema resolve it here.
    pub fn resolve_implicit(&self, tag: UniversalTag) -> LdapResult<Value> {
        self.resolve_implicit_with(tag, DecoderConfig::default())
    }

    /// Like [`Tagged::resolve_implicit`], decoding under `config`
    ///
    /// # Arguments
    /// * `tag` - Universal type the tag stands for
    /// * `config` - Limits applied to the carried content
    pub fn resolve_implicit_with(&self, tag: UniversalTag, config: DecoderConfig) -> LdapResult<Value> {
        BerDecoder::with_config(self.carried_content()?, config).decode_implicit(tag)
    }
}

/// Builder for structured values
///
/// Children are collected in order and handed over when the builder is
/// finished, so a sequence is complete before anything can read it.
#[derive(Debug, Clone, Default)]
pub struct SequenceBuilder {
    items: Vec<Value>,
}

impl SequenceBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder with room for `capacity` children
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Append a child
    pub fn push(mut self, value: impl Into<Value>) -> Self {
        self.items.push(value.into());
        self
    }

    /// Append a child if present
    pub fn push_opt(self, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.push(value),
            None => self,
        }
    }

    /// Finish as a SEQUENCE
    pub fn sequence(self) -> Value {
        Value::Sequence(self.items)
    }

    /// Finish as a SEQUENCE OF
    pub fn sequence_of(self) -> Value {
        Value::SequenceOf(self.items)
    }

    /// Finish as a SET, keeping the children in push order
    pub fn set(self) -> Value {
        Value::Set(self.items)
    }

    /// Finish as a SET OF
    pub fn set_of(self) -> Value {
        Value::SetOf(self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        SequenceBuilder::new()
            .push(Value::Integer(1))
            .push(true)
            .push("cn")
            .sequence()
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(Value::Boolean(true).identifier().encode(), vec![0x01]);
        assert_eq!(Value::Enumerated(0).identifier().encode(), vec![0x0A]);
        assert_eq!(Value::SequenceOf(vec![]).identifier().encode(), vec![0x30]);
        assert_eq!(Value::SetOf(vec![]).identifier().encode(), vec![0x31]);

        let choice = Value::Choice(Box::new(Value::Null));
        assert_eq!(choice.identifier(), Value::Null.identifier());
    }

    #[test]
    fn test_implicit_tag_takes_constructed_bit() {
        let tagged = Tagged::implicit(Identifier::context(false, 0), sample());
        assert_eq!(tagged.identifier, Identifier::context(true, 0));

        let tagged = Tagged::implicit(Identifier::context(true, 1), Value::Boolean(true));
        assert_eq!(tagged.identifier, Identifier::context(false, 1));

        let tagged = Tagged::explicit(Identifier::context(false, 2), Value::Null);
        assert!(tagged.identifier.is_constructed());
    }

    #[test]
    fn test_positional_access() {
        let seq = sample();
        assert_eq!(seq.len().unwrap(), 3);
        assert_eq!(seq.get(0).unwrap().as_integer().unwrap(), 1);
        assert!(seq.get(1).unwrap().as_bool().unwrap());
        assert_eq!(seq.get(2).unwrap().as_str().unwrap(), "cn");
        assert_eq!(
            seq.get(3),
            Err(LdapError::MissingField { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_type_mismatch() {
        let seq = sample();
        assert_eq!(
            seq.get(0).unwrap().as_bool(),
            Err(LdapError::TypeMismatch {
                expected: "Boolean",
                found: "Integer"
            })
        );
        assert!(matches!(
            Value::Null.get(0),
            Err(LdapError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_set_at() {
        let mut seq = sample();
        seq.set_at(0, Value::Integer(15)).unwrap();
        assert_eq!(seq.get(0).unwrap().as_integer().unwrap(), 15);

        assert_eq!(
            seq.set_at(5, Value::Null),
            Err(LdapError::MissingField { index: 5, len: 3 })
        );
        assert!(Value::Integer(1).set_at(0, Value::Null).is_err());
    }

    #[test]
    fn test_wire_shape_equality() {
        let children = vec![Value::Integer(1), Value::Null];
        assert_eq!(
            Value::Sequence(children.clone()),
            Value::SequenceOf(children.clone())
        );
        assert_eq!(Value::Set(children.clone()), Value::SetOf(children.clone()));
        assert_ne!(Value::Sequence(children.clone()), Value::Set(children));
        assert_eq!(Value::Choice(Box::new(Value::Integer(3))), Value::Integer(3));
        assert_ne!(Value::Integer(3), Value::Enumerated(3));
    }

    #[test]
    fn test_invalid_utf8() {
        let value = Value::OctetString(vec![0xFF, 0xFE]);
        assert!(matches!(value.as_str(), Err(LdapError::InvalidUtf8(_))));
    }

    #[test]
    fn test_tagged_equality_follows_content() {
        let explicit = Tagged::explicit(Identifier::context(true, 0), Value::Integer(5));
        let opaque = Tagged::new(
            Identifier::context(true, 0),
            Value::OctetString(vec![0x02, 0x01, 0x05]),
            false,
        );
        assert_eq!(explicit, opaque);

        let implicit = Tagged::implicit(Identifier::context(false, 1), Value::Boolean(true));
        let opaque = Tagged::new(Identifier::context(false, 1), Value::OctetString(vec![0xFF]), false);
        assert_eq!(Value::Tagged(implicit.clone()), Value::Tagged(opaque));

        let other_tag = Tagged::implicit(Identifier::context(false, 2), Value::Boolean(true));
        assert_ne!(implicit, other_tag);
        let other_content = Tagged::implicit(Identifier::context(false, 1), Value::Boolean(false));
        assert_ne!(implicit, other_content);
    }

    #[test]
    fn test_builder_set() {
        let set = SequenceBuilder::new().push(Value::Integer(2)).push(Value::Null).set();
        assert_eq!(set.identifier(), UniversalTag::Set.identifier());
        assert_eq!(set.get(0).unwrap(), &Value::Integer(2));
        assert!(!set.is_empty().unwrap());
        assert_eq!(set, SequenceBuilder::new().push(Value::Integer(2)).push(Value::Null).set_of());
    }

    #[test]
    fn test_builder_push_opt() {
        let value = SequenceBuilder::new()
            .push(Value::Integer(0))
            .push_opt(None::<Value>)
            .push_opt(Some("ctx"))
            .sequence();
        assert_eq!(value.len().unwrap(), 2);
    }
}
