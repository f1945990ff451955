//! BER decoder for ASN.1 value trees
//!
//! # Usage Example
//!
//! ```rust
//! use ldap_asn1::ber::{BerDecoder, Value};
//!
//! let data = [0x30, 0x06, 0x01, 0x01, 0xFF, 0x02, 0x01, 0x05];
//! let mut decoder = BerDecoder::new(&data);
//! let (value, consumed) = decoder.decode_value()?;
//! assert_eq!(consumed, 8);
//! assert_eq!(value, Value::Sequence(vec![Value::Boolean(true), Value::Integer(5)]));
//! # Ok::<(), ldap_core::LdapError>(())
//! ```

use ldap_core::{LdapError, LdapResult};
use serde::{Deserialize, Serialize};

use crate::ber::types::{Identifier, Length, TagClass, UniversalTag};
use crate::ber::value::{Tagged, Value};

/// Limits applied while decoding untrusted input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum nesting of structured values
    pub max_depth: usize,
    /// Maximum declared content length of a single TLV
    pub max_content_length: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_content_length: 16 * 1024 * 1024,
        }
    }
}

/// BER decoder for ASN.1 value trees
///
/// The decoder keeps a position into its buffer that advances as values are
/// decoded, so several consecutive TLVs can be read from one buffer.
///
/// # Error Handling
///
/// A failed decode is fatal for the value being decoded: no partial value
/// is returned and the position is left where the failure occurred.
pub struct BerDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
    config: DecoderConfig,
}

impl<'a> BerDecoder<'a> {
    /// Create a new BER decoder with the default limits
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_config(buffer, DecoderConfig::default())
    }

    /// Create a new BER decoder with explicit limits
    ///
    /// # Arguments
    /// * `buffer` - Buffer containing BER-encoded data
    /// * `config` - Limits applied to every value read from `buffer`
    pub fn with_config(buffer: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            buffer,
            position: 0,
            config,
        }
    }

    /// Get current position in buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there is more data to decode
    pub fn has_remaining(&self) -> bool {
        self.position < self.buffer.len()
    }

    fn read_bytes(&mut self, count: usize) -> LdapResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(LdapError::TruncatedInput(format!(
                "need {} content bytes, have {}",
                count,
                self.remaining()
            )));
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..start + count])
    }

    /// Decode an identifier at the current position
    pub fn decode_identifier(&mut self) -> LdapResult<(Identifier, usize)> {
        let (identifier, consumed) = Identifier::decode(&self.buffer[self.position..])?;
        self.position += consumed;
        Ok((identifier, consumed))
    }

    /// Decode a length at the current position
    pub fn decode_length(&mut self) -> LdapResult<(Length, usize)> {
        let (length, consumed) = Length::decode(&self.buffer[self.position..])?;
        self.position += consumed;
        Ok((length, consumed))
    }

    /// Decode a TLV header and return its identifier and content bytes
    ///
    /// # Returns
    /// Returns `Ok((identifier, content, total_bytes_consumed))`
    pub fn decode_tlv(&mut self) -> LdapResult<(Identifier, &'a [u8], usize)> {
        let start = self.position;

        let (identifier, _) = self.decode_identifier()?;
        let (length, _) = self.decode_length()?;

        let content_length = length.definite().ok_or_else(|| {
            LdapError::UnsupportedFeature("indefinite length encoding".to_string())
        })?;

        if content_length > self.config.max_content_length {
            return Err(LdapError::LengthMismatch {
                expected: self.config.max_content_length,
                actual: content_length,
            });
        }

        let content = self.read_bytes(content_length)?;
        log::trace!(
            "decoded TLV {:?} with {} content bytes at offset {}",
            identifier,
            content_length,
            start
        );

        Ok((identifier, content, self.position - start))
    }

    /// Decode one value at the current position
    ///
    /// # Returns
    /// Returns the value and the number of bytes its identifier, length and
    /// content occupied.
    pub fn decode_value(&mut self) -> LdapResult<(Value, usize)> {
        self.decode_value_at(0)
    }

    /// Decode one value that must span the rest of the buffer
    ///
    /// # Returns
    /// Returns `LengthMismatch` if bytes are left after the value.
    pub fn decode_to_end(&mut self) -> LdapResult<Value> {
        let (value, _) = self.decode_value()?;
        if self.has_remaining() {
            return Err(LdapError::LengthMismatch {
                expected: self.position,
                actual: self.buffer.len(),
            });
        }
        Ok(value)
    }

    /// Decode the rest of the buffer as the content of universal type `tag`
    ///
    /// Used to resolve implicitly tagged values, whose identifier on the wire
    /// says nothing about the type of their content.
    pub fn decode_implicit(&mut self, tag: UniversalTag) -> LdapResult<Value> {
        let content = self.read_bytes(self.remaining())?;
        self.decode_content(tag, content, 0)
    }

    fn decode_value_at(&mut self, depth: usize) -> LdapResult<(Value, usize)> {
        let (identifier, content, consumed) = self.decode_tlv()?;

        let value = match identifier.class() {
            TagClass::Universal => {
                let tag = UniversalTag::from_number(identifier.tag())?;
                self.decode_content(tag, content, depth)?
            }
            // Implicit tags can only be resolved by a caller that knows the schema
            _ => Value::Tagged(Tagged::new(
                identifier,
                Value::OctetString(content.to_vec()),
                false,
            )),
        };

        Ok((value, consumed))
    }

    fn decode_content(&self, tag: UniversalTag, content: &[u8], depth: usize) -> LdapResult<Value> {
        match tag {
            UniversalTag::Boolean => {
                if content.len() != 1 {
                    return Err(LdapError::LengthMismatch {
                        expected: 1,
                        actual: content.len(),
                    });
                }
                Ok(Value::Boolean(content[0] != 0))
            }
            UniversalTag::Integer => Ok(Value::Integer(decode_integer_octets(content)?)),
            UniversalTag::Enumerated => Ok(Value::Enumerated(decode_integer_octets(content)?)),
            UniversalTag::OctetString => Ok(Value::OctetString(content.to_vec())),
            UniversalTag::Null => {
                if !content.is_empty() {
                    return Err(LdapError::LengthMismatch {
                        expected: 0,
                        actual: content.len(),
                    });
                }
                Ok(Value::Null)
            }
            UniversalTag::Sequence => Ok(Value::Sequence(self.decode_structured(content, depth)?)),
            UniversalTag::Set => Ok(Value::Set(self.decode_structured(content, depth)?)),
        }
    }

    /// Decode the child TLVs making up a structured value's content
    fn decode_structured(&self, content: &[u8], depth: usize) -> LdapResult<Vec<Value>> {
        if depth >= self.config.max_depth {
            return Err(LdapError::NestingTooDeep(self.config.max_depth));
        }

        let mut children = BerDecoder::with_config(content, self.config);
        let mut items = Vec::new();

        while children.has_remaining() {
            let start = children.position();
            let (item, _) = children
                .decode_value_at(depth + 1)
                .map_err(|err| match err {
                    // a child running past the end of its parent's content
                    LdapError::TruncatedInput(_) => LdapError::LengthMismatch {
                        expected: content.len(),
                        actual: start + claimed_length(&content[start..]),
                    },
                    other => other,
                })?;
            items.push(item);
        }

        Ok(items)
    }
}

/// Bytes the TLV at the start of `data` claims to occupy
fn claimed_length(data: &[u8]) -> usize {
    let Ok((_, id_len)) = Identifier::decode(data) else {
        return data.len() + 1;
    };
    match Length::decode(&data[id_len..]) {
        Ok((Length::Definite(n), len_len)) => id_len + len_len + n,
        _ => data.len() + 1,
    }
}

/// Decode a value from the start of `data`
///
/// # Returns
/// Returns the value and the total number of bytes consumed.
pub fn decode(data: &[u8]) -> LdapResult<(Value, usize)> {
    BerDecoder::new(data).decode_value()
}

/// Decode a buffer that must hold exactly one value
///
/// # Arguments
/// * `data` - One complete TLV and nothing else
pub fn decode_all(data: &[u8]) -> LdapResult<Value> {
    BerDecoder::new(data).decode_to_end()
}

/// Convert big-endian two's complement bytes to i64
fn decode_integer_octets(bytes: &[u8]) -> LdapResult<i64> {
    if bytes.is_empty() {
        return Err(LdapError::InvalidData("empty integer encoding".to_string()));
    }

    if bytes.len() > 8 {
        return Err(LdapError::InvalidData(format!(
            "integer too large: {} bytes (max 8)",
            bytes.len()
        )));
    }

    // sign-extend from the top bit of the first byte
    let seed: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(bytes
        .iter()
        .fold(seed, |acc, byte| (acc << 8) | *byte as i64))
}
