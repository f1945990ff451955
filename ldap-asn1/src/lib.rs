//! ASN.1 processing for LDAP controls
//!
//! This crate provides a BER codec for the subset of ASN.1 that LDAP uses:
//! BOOLEAN, INTEGER, ENUMERATED, NULL, OCTET STRING, SEQUENCE and SET,
//! plus explicitly and implicitly tagged values. It works on in-memory
//! buffers only and never touches a transport.

pub mod ber;

pub use ber::{
    decode, decode_all, encode, BerDecoder, BerEncoder, DecoderConfig, Identifier, Length,
    SequenceBuilder, TagClass, Tagged, UniversalTag, Value,
};
