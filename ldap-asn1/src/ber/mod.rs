//! BER (Basic Encoding Rules) encoder and decoder for ASN.1
//!
//! Each ASN.1 value is encoded as a TLV (Identifier-Length-Content) triplet:
//!
//! ```text
//! [Identifier] [Length] [Content]
//! ```
//!
//! ## Identifier Encoding
//!
//! - **Class** (2 bits): Universal (00), Application (01), Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit): 0 = Primitive, 1 = Constructed
//! - **Tag Number** (5 bits): 0-30 inline, or 11111 followed by base-128 groups
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `0x80 | n`, then `n` big-endian length bytes
//! - **Indefinite** (`0x80`): recognised, rejected as unsupported
//!
//! The encoder always writes the shortest length form and the shortest
//! two's complement integer content.
//!
//! ## Tagging
//!
//! Values under a context, application or private tag decode to
//! [`Value::Tagged`] carrying their raw content. Only a caller that knows
//! the schema can tell what an implicit tag stands for, see
//! [`Tagged::resolve_implicit`] and [`Tagged::resolve_explicit`].

pub mod decoder;
pub mod encoder;
pub mod types;
pub mod value;

pub use decoder::{decode, decode_all, BerDecoder, DecoderConfig};
pub use encoder::{encode, BerEncoder};
pub use types::{Identifier, Length, TagClass, UniversalTag};
pub use value::{SequenceBuilder, Tagged, Value};
