//! Dispatch of raw response controls to their decoders
//!
//! A [`ControlRegistry`] maps control OIDs to decode functions. It is an
//! ordinary value: build one, register what the application understands and
//! pass it to whatever receives controls from the wire.

use std::collections::HashMap;

use ldap_core::{LdapError, LdapResult, is_valid_oid, oid};

use crate::control::LdapControl;
use crate::persist::EntryChangeControl;
use crate::sort::SortResponse;
use crate::vlv::VirtualListResponse;

/// A decoded response control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseControl {
    Sort(SortResponse),
    VirtualList(VirtualListResponse),
    EntryChange(EntryChangeControl),
    /// A control no decoder is registered for
    Other(LdapControl),
}

/// Decoder for one kind of response control
pub type ResponseDecoder = fn(&LdapControl) -> LdapResult<ResponseControl>;

#[derive(Debug, Clone, Default)]
pub struct ControlRegistry {
    decoders: HashMap<String, ResponseDecoder>,
}

impl ControlRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that knows the sort, virtual list view and entry
    /// change response controls
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(oid::SORT_RESPONSE, |control| {
            SortResponse::from_control(control).map(ResponseControl::Sort)
        });
        registry.insert(oid::VLV_RESPONSE, |control| {
            VirtualListResponse::from_control(control).map(ResponseControl::VirtualList)
        });
        registry.insert(oid::ENTRY_CHANGE, |control| {
            EntryChangeControl::from_control(control).map(ResponseControl::EntryChange)
        });
        registry
    }

    fn insert(&mut self, oid: &str, decoder: ResponseDecoder) -> Option<ResponseDecoder> {
        self.decoders.insert(oid.to_string(), decoder)
    }

    /// Register `decoder` for `oid`, replacing any earlier registration
    ///
    /// # Arguments
    /// * `oid` - Response control OID, dotted-numeric
    /// * `decoder` - Function turning a raw control into a [`ResponseControl`]
    pub fn register(&mut self, oid: &str, decoder: ResponseDecoder) -> LdapResult<()> {
        if !is_valid_oid(oid) {
            return Err(LdapError::InvalidOid(oid.to_string()));
        }
        if self.insert(oid, decoder).is_some() {
            log::debug!("replaced response control decoder for {}", oid);
        }
        Ok(())
    }

    /// Whether a decoder is registered for `oid`
    pub fn is_registered(&self, oid: &str) -> bool {
        self.decoders.contains_key(oid)
    }

    /// Decode `control` with the decoder registered for its OID
    ///
    /// Controls without a registered decoder are returned unchanged as
    /// [`ResponseControl::Other`]. A registered decoder that fails aborts
    /// the whole control.
    pub fn decode(&self, control: &LdapControl) -> LdapResult<ResponseControl> {
        match self.decoders.get(control.oid()) {
            Some(decoder) => decoder(control),
            None => {
                log::warn!(
                    "no decoder registered for response control {}, keeping raw value",
                    control.oid()
                );
                Ok(ResponseControl::Other(control.clone()))
            }
        }
    }

    /// Decode every control attached to a response
    pub fn decode_all(&self, controls: &[LdapControl]) -> LdapResult<Vec<ResponseControl>> {
        controls.iter().map(|control| self.decode(control)).collect()
    }
}
