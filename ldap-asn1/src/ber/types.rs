//! BER encoding types (Identifier, Length, etc.)

use ldap_core::{LdapError, LdapResult};
use serde::{Deserialize, Serialize};

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (BOOLEAN, INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    Context = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from the top two bits of an identifier octet
    pub fn from_bits(byte: u8) -> Self {
        match (byte >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::Context,
            _ => TagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Universal tag numbers understood by the codec
///
/// Only the subset LDAP uses is supported. Any other universal tag is
/// rejected by the decoder with [`LdapError::UnknownUniversalTag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniversalTag {
    Boolean = 1,
    Integer = 2,
    OctetString = 4,
    Null = 5,
    Enumerated = 10,
    Sequence = 16,
    Set = 17,
}

impl UniversalTag {
    /// Map a universal tag number onto a supported type
    pub fn from_number(number: u32) -> LdapResult<Self> {
        match number {
            1 => Ok(UniversalTag::Boolean),
            2 => Ok(UniversalTag::Integer),
            4 => Ok(UniversalTag::OctetString),
            5 => Ok(UniversalTag::Null),
            10 => Ok(UniversalTag::Enumerated),
            16 => Ok(UniversalTag::Sequence),
            17 => Ok(UniversalTag::Set),
            _ => Err(LdapError::UnknownUniversalTag(number)),
        }
    }

    /// Get the tag number
    pub fn number(self) -> u32 {
        self as u32
    }

    /// Whether values of this type are encoded in constructed form
    pub fn is_constructed(self) -> bool {
        matches!(self, UniversalTag::Sequence | UniversalTag::Set)
    }

    /// The identifier values of this type carry on the wire
    pub fn identifier(self) -> Identifier {
        Identifier::universal(self.is_constructed(), self.number())
    }
}

/// BER Identifier
///
/// An identifier names the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the content is a series of nested TLVs
/// - **Tag Number**: The actual tag number (0-30 inline, or extended)
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Extended form (tag number >= 31):
/// ```text
/// First byte:  C C P 1 1 1 1 1  (all tag bits set to 1)
/// Following bytes: 1 T T T T T T T  (continuation bytes, last byte has bit 8 = 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    class: TagClass,
    constructed: bool,
    tag: u32,
}

impl Identifier {
    /// Create a new identifier
    pub fn new(class: TagClass, constructed: bool, tag: u32) -> Self {
        Self {
            class,
            constructed,
            tag,
        }
    }

    /// Create a Universal class identifier
    pub fn universal(constructed: bool, tag: u32) -> Self {
        Self::new(TagClass::Universal, constructed, tag)
    }

    /// Create an Application class identifier
    pub fn application(constructed: bool, tag: u32) -> Self {
        Self::new(TagClass::Application, constructed, tag)
    }

    /// Create a Context-specific class identifier
    pub fn context(constructed: bool, tag: u32) -> Self {
        Self::new(TagClass::Context, constructed, tag)
    }

    /// Create a Private class identifier
    pub fn private(constructed: bool, tag: u32) -> Self {
        Self::new(TagClass::Private, constructed, tag)
    }

    /// Get tag class
    pub fn class(&self) -> TagClass {
        self.class
    }

    /// Check if the identifier is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Check whether this identifier names the given universal type
    pub fn is_universal(&self, tag: UniversalTag) -> bool {
        self.class == TagClass::Universal && self.tag == tag.number()
    }

    /// Same class and tag number with the constructed bit replaced
    pub fn with_constructed(self, constructed: bool) -> Self {
        Self {
            constructed,
            ..self
        }
    }

    /// Encode identifier into `out`
    ///
    /// Tag numbers below 31 fit in the first octet. Larger tags set all five
    /// tag bits and follow with base-128 groups, most significant first, with
    /// the continuation bit set on every group but the last.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let first = self.class.to_bits() | if self.constructed { 0x20 } else { 0x00 };

        if self.tag < 31 {
            out.push(first | self.tag as u8);
            return;
        }

        out.push(first | 0x1F);

        let mut groups = Vec::with_capacity(5);
        let mut remaining = self.tag;
        loop {
            groups.push((remaining & 0x7F) as u8);
            remaining >>= 7;
            if remaining == 0 {
                break;
            }
        }

        let last = groups.len() - 1;
        for (i, group) in groups.iter().rev().enumerate() {
            out.push(if i < last { group | 0x80 } else { *group });
        }
    }

    /// Encode identifier to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1);
        self.encode_into(&mut out);
        out
    }

    /// Decode identifier from bytes
    ///
    /// # Returns
    /// Returns `Ok((Identifier, bytes_consumed))` if successful
    ///
    /// # Error Handling
    /// Returns `TruncatedInput` if the buffer ends before the identifier
    /// does, and `InvalidData` if an extended tag does not fit in 32 bits.
    pub fn decode(data: &[u8]) -> LdapResult<(Self, usize)> {
        let first = *data
            .first()
            .ok_or_else(|| LdapError::TruncatedInput("empty buffer for identifier".to_string()))?;

        let class = TagClass::from_bits(first);
        let constructed = (first & 0x20) != 0;
        let tag_bits = first & 0x1F;

        if tag_bits != 0x1F {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        let mut tag = 0u32;
        let mut pos = 1;
        loop {
            let byte = *data.get(pos).ok_or_else(|| {
                LdapError::TruncatedInput("incomplete extended tag encoding".to_string())
            })?;
            pos += 1;

            if tag > (u32::MAX >> 7) {
                return Err(LdapError::InvalidData(
                    "extended tag number exceeds 32 bits".to_string(),
                ));
            }
            tag = (tag << 7) | (byte & 0x7F) as u32;

            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, tag), pos))
    }
}

/// BER Length
///
/// Definite lengths are encoded in one of two forms:
/// - **Short form**: lengths 0-127 in a single octet
/// - **Long form**: `0x80 | n` followed by `n` big-endian length octets
///
/// The single octet `0x80` marks an indefinite length. It is recognised but
/// the decoder refuses values that use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    /// Content length in bytes
    Definite(usize),
    /// Content terminated by an end-of-contents marker
    Indefinite,
}

/// Largest number of long form length octets accepted by the decoder
const MAX_LENGTH_OCTETS: usize = 4;

impl Length {
    /// Get the definite length value, if any
    pub fn definite(&self) -> Option<usize> {
        match self {
            Length::Definite(n) => Some(*n),
            Length::Indefinite => None,
        }
    }

    /// Encode a definite length in its minimal form into `out`
    pub fn encode_into(length: usize, out: &mut Vec<u8>) {
        if length < 0x80 {
            out.push(length as u8);
            return;
        }

        let bytes = length.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        let significant = &bytes[skip..];

        out.push(0x80 | significant.len() as u8);
        out.extend_from_slice(significant);
    }

    /// Encode a definite length to bytes
    pub fn encode(length: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(1);
        Self::encode_into(length, &mut out);
        out
    }

    /// Decode length from bytes
    ///
    /// # Returns
    /// Returns `Ok((Length, bytes_consumed))` if successful
    ///
    /// # Error Handling
    /// Returns error if:
    /// - Buffer is too short (`TruncatedInput`)
    /// - More than four length octets follow (`InvalidData`)
    pub fn decode(data: &[u8]) -> LdapResult<(Self, usize)> {
        let first = *data
            .first()
            .ok_or_else(|| LdapError::TruncatedInput("empty buffer for length".to_string()))?;

        if first == 0x80 {
            return Ok((Length::Indefinite, 1));
        }

        if first & 0x80 == 0 {
            return Ok((Length::Definite(first as usize), 1));
        }

        let count = (first & 0x7F) as usize;
        if count > MAX_LENGTH_OCTETS {
            return Err(LdapError::InvalidData(format!(
                "length encoding too large: {} octets (max {})",
                count, MAX_LENGTH_OCTETS
            )));
        }

        let octets = data.get(1..1 + count).ok_or_else(|| {
            LdapError::TruncatedInput(format!(
                "long form length needs {} octets, {} available",
                count,
                data.len() - 1
            ))
        })?;

        let length = octets
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | *byte as usize);

        Ok((Length::Definite(length), 1 + count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_short_form() {
        let id = Identifier::universal(false, 2);
        assert_eq!(id.encode(), vec![0x02]);

        let id = Identifier::universal(true, 16);
        assert_eq!(id.encode(), vec![0x30]);

        let id = Identifier::context(true, 0);
        assert_eq!(id.encode(), vec![0xA0]);
    }

    #[test]
    fn test_identifier_extended_form() {
        assert_eq!(Identifier::universal(false, 31).encode(), vec![0x1F, 0x1F]);
        assert_eq!(
            Identifier::universal(false, 128).encode(),
            vec![0x1F, 0x81, 0x00]
        );
        assert_eq!(
            Identifier::private(true, 300).encode(),
            vec![0xFF, 0x82, 0x2C]
        );
    }

    #[test]
    fn test_identifier_decode() {
        let (id, consumed) = Identifier::decode(&[0x81, 0xFF]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(id.class(), TagClass::Context);
        assert!(!id.is_constructed());
        assert_eq!(id.tag(), 1);

        let (id, consumed) = Identifier::decode(&[0x5F, 0x81, 0x00, 0x00]).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(id, Identifier::application(false, 128));
    }

    #[test]
    fn test_identifier_decode_truncated() {
        assert!(matches!(
            Identifier::decode(&[]),
            Err(LdapError::TruncatedInput(_))
        ));
        assert!(matches!(
            Identifier::decode(&[0x1F, 0x81]),
            Err(LdapError::TruncatedInput(_))
        ));
    }

    #[test]
    fn test_identifier_decode_overflow() {
        let data = [0x1F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(matches!(
            Identifier::decode(&data),
            Err(LdapError::InvalidData(_))
        ));
    }

    #[test]
    fn test_length_canonical_form() {
        assert_eq!(Length::encode(0), vec![0x00]);
        assert_eq!(Length::encode(127), vec![0x7F]);
        assert_eq!(Length::encode(128), vec![0x81, 0x80]);
        assert_eq!(Length::encode(256), vec![0x82, 0x01, 0x00]);
        assert_eq!(Length::encode(0x01_0000), vec![0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_length_decode() {
        assert_eq!(Length::decode(&[0x05]).unwrap(), (Length::Definite(5), 1));
        assert_eq!(
            Length::decode(&[0x82, 0x01, 0x00]).unwrap(),
            (Length::Definite(256), 3)
        );
        // non-minimal long form is still accepted
        assert_eq!(
            Length::decode(&[0x81, 0x05]).unwrap(),
            (Length::Definite(5), 2)
        );
        assert_eq!(Length::decode(&[0x80]).unwrap(), (Length::Indefinite, 1));
        assert_eq!(Length::Definite(300).definite(), Some(300));
        assert_eq!(Length::Indefinite.definite(), None);
    }

    #[test]
    fn test_length_decode_errors() {
        assert!(matches!(
            Length::decode(&[0x82, 0x01]),
            Err(LdapError::TruncatedInput(_))
        ));
        assert!(matches!(
            Length::decode(&[0x85, 1, 2, 3, 4, 5]),
            Err(LdapError::InvalidData(_))
        ));
    }

    #[test]
    fn test_universal_tag_lookup() {
        assert_eq!(UniversalTag::from_number(10).unwrap(), UniversalTag::Enumerated);
        assert_eq!(
            UniversalTag::from_number(6),
            Err(LdapError::UnknownUniversalTag(6))
        );
        assert_eq!(UniversalTag::Set.identifier().encode(), vec![0x31]);
    }
}
