//! BER encoder for ASN.1 value trees
//!
//! # Usage Example
//!
//! ```rust
//! use ldap_asn1::ber::{BerEncoder, Value};
//!
//! let mut encoder = BerEncoder::new();
//! encoder.encode_value(&Value::Integer(12345));
//! let bytes = encoder.into_bytes();
//! assert_eq!(bytes, vec![0x02, 0x02, 0x30, 0x39]);
//! ```

use bytes::{BufMut, BytesMut};

use crate::ber::types::{Identifier, Length};
use crate::ber::value::{Tagged, Value};

/// BER encoder for ASN.1 value trees
///
/// Each value is written as a TLV (Identifier-Length-Content) triplet.
/// Structured and tagged content is serialized into a scratch buffer first
/// because its length has to be written before it. Encoding a subtree
/// therefore buffers memory proportional to its serialized size.
pub struct BerEncoder {
    buffer: BytesMut,
}

impl BerEncoder {
    /// Create a new BER encoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Create a new BER encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Encode a TLV (Identifier-Length-Content) triplet
    ///
    /// This is the fundamental BER encoding operation; every value ends up
    /// here once its content bytes are known.
    pub fn encode_tlv(&mut self, identifier: &Identifier, content: &[u8]) {
        let mut header = Vec::with_capacity(6);
        identifier.encode_into(&mut header);
        Length::encode_into(content.len(), &mut header);

        self.buffer.reserve(header.len() + content.len());
        self.buffer.put_slice(&header);
        self.buffer.put_slice(content);
    }

    /// Encode a complete value, including its own identifier and length
    pub fn encode_value(&mut self, value: &Value) {
        let content = content_octets(value);
        self.encode_tlv(&value.identifier(), &content);
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of bytes encoded so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for BerEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a value to its canonical TLV bytes
pub fn encode(value: &Value) -> Vec<u8> {
    let mut encoder = BerEncoder::new();
    encoder.encode_value(value);
    encoder.into_bytes()
}

/// Content octets of `value`, without its identifier and length
fn content_octets(value: &Value) -> Vec<u8> {
    match value {
        Value::Boolean(b) => vec![if *b { 0xFF } else { 0x00 }],
        Value::Integer(i) | Value::Enumerated(i) => integer_octets(*i),
        Value::Null => Vec::new(),
        Value::OctetString(bytes) => bytes.clone(),
        Value::Sequence(items)
        | Value::SequenceOf(items)
        | Value::Set(items)
        | Value::SetOf(items) => {
            let mut scratch = BerEncoder::new();
            for item in items {
                scratch.encode_value(item);
            }
            scratch.into_bytes()
        }
        Value::Tagged(tagged) => tagged_content(tagged),
        Value::Choice(inner) => content_octets(inner),
    }
}

/// Content octets of a tagged value, as carried under its identifier
pub(crate) fn tagged_content(tagged: &Tagged) -> Vec<u8> {
    if tagged.explicit {
        encode(&tagged.inner)
    } else {
        // implicit: the tag's identifier stands in for the inner one
        content_octets(&tagged.inner)
    }
}

/// Minimal two's complement big-endian representation of `value`
///
/// Low bytes are emitted until the remaining value is exactly the sign
/// extension of the last byte written, so `0` becomes `[0x00]`, `-1`
/// becomes `[0xFF]` and `128` needs a leading `0x00`.
pub fn integer_octets(value: i64) -> Vec<u8> {
    let mut octets = Vec::with_capacity(8);
    let mut remaining = value;
    loop {
        let byte = (remaining & 0xFF) as u8;
        octets.push(byte);
        remaining >>= 8;

        let sign_extension = if byte & 0x80 != 0 { -1 } else { 0 };
        if remaining == sign_extension {
            break;
        }
    }
    octets.reverse();
    octets
}
