//! `Channel`: a handle for one named process variable.
//!
//! A `Channel` is plain data plus pure command-building helpers; it
//! does not own a live reference to its `VirtualCircuit`. Per the
//! arena-ownership approach for the Channel↔Circuit cycle, the circuit
//! owns its channels in a map keyed by `cid`; a channel only remembers
//! the address of the circuit it resolved to. Helpers that need an
//! id the circuit allocates (`ioid`, `subscriptionid`) live on
//! `VirtualCircuit` instead — see `DESIGN.md`.

use bitflags::bitflags;

use crate::command::{Command, SearchReplyPolicy};
use crate::dbr::DbrType;
use crate::error::{CaError, CaprotoValueError};
use crate::state::ChannelState;

bitflags! {
    /// Read/write permission bits carried by `AccessRightsResponse`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessRights: u32 {
        const READ = 0x1;
        const WRITE = 0x2;
    }
}

/// Legacy (pre-extended-header) maximum PV name length, in bytes.
pub const MAX_NAME_LENGTH_LEGACY: usize = 40;

/// Practical ceiling on PV name length when the extended header form
/// is available. Not an EPICS protocol constant — a sanity bound this
/// crate enforces so a malicious or buggy peer can't make a host
/// allocate unbounded strings. See `DESIGN.md`.
pub const MAX_NAME_LENGTH_EXTENDED: usize = 4096;

pub(crate) fn validate_name(name: &str) -> Result<(), CaprotoValueError> {
    if name.is_empty() {
        return Err(CaprotoValueError::new("name", "channel name must not be empty"));
    }
    if name.len() > MAX_NAME_LENGTH_EXTENDED {
        return Err(CaprotoValueError::new(
            "name",
            format!(
                "channel name is {} bytes, exceeding the {} byte limit",
                name.len(),
                MAX_NAME_LENGTH_EXTENDED
            ),
        ));
    }
    Ok(())
}

/// The address of a circuit's peer: host plus TCP port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerAddress {
    pub host: String,
    pub port: u16,
}

impl PeerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

/// A handle for one named PV.
#[derive(Debug, Clone)]
pub struct Channel {
    cid: u32,
    sid: Option<u32>,
    name: String,
    priority: u16,
    native_data_type: Option<DbrType>,
    native_data_count: Option<u32>,
    access_rights: Option<AccessRights>,
    state: ChannelState,
    circuit_address: Option<PeerAddress>,
}

impl Channel {
    pub fn new(name: impl Into<String>, cid: u32, priority: u16) -> Result<Self, CaError> {
        let name = name.into();
        validate_name(&name)?;
        crate::state::circuit::validate_priority(priority)?;
        Ok(Self {
            cid,
            sid: None,
            name,
            priority,
            native_data_type: None,
            native_data_count: None,
            access_rights: None,
            state: ChannelState::new(),
            circuit_address: None,
        })
    }

    pub fn cid(&self) -> u32 {
        self.cid
    }

    pub fn sid(&self) -> Option<u32> {
        self.sid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    pub fn native_data_type(&self) -> Option<DbrType> {
        self.native_data_type
    }

    pub fn native_data_count(&self) -> Option<u32> {
        self.native_data_count
    }

    pub fn access_rights(&self) -> Option<AccessRights> {
        self.access_rights
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChannelState {
        &mut self.state
    }

    pub fn circuit_address(&self) -> Option<&PeerAddress> {
        self.circuit_address.as_ref()
    }

    /// Bind this channel to a resolved circuit address. Per the data
    /// model this happens exactly once, after a successful search.
    pub fn bind_circuit(&mut self, address: PeerAddress) {
        self.circuit_address = Some(address);
    }

    pub(crate) fn set_sid(&mut self, sid: u32) {
        self.sid = Some(sid);
    }

    pub(crate) fn set_native_type(&mut self, data_type: DbrType, data_count: u32) {
        self.native_data_type = Some(data_type);
        self.native_data_count = Some(data_count);
    }

    pub(crate) fn set_access_rights(&mut self, bits: u32) {
        self.access_rights = Some(AccessRights::from_bits_truncate(bits));
    }

    /// Build this channel's `SearchRequest`. Pure: does not mutate
    /// state or allocate ids (`cid` is already fixed).
    pub fn search_request(&self, version: u16, reply: SearchReplyPolicy) -> Command {
        Command::SearchRequest {
            name: self.name.clone(),
            cid: self.cid,
            version,
            reply,
        }
    }

    /// Build this channel's `CreateChannelRequest`.
    pub fn create_request(&self, version: u16) -> Command {
        Command::CreateChannelRequest {
            name: self.name.clone(),
            cid: self.cid,
            version,
        }
    }

    /// Build this channel's `ClearChannelRequest`. Requires a `sid`,
    /// which only exists once the channel is connected.
    pub fn clear_request(&self) -> Result<Command, CaError> {
        let sid = self.sid.ok_or(crate::error::CaprotoKeyError::UnknownSid(self.cid))?;
        Ok(Command::ClearChannelRequest { sid, cid: self.cid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(Channel::new("", 0, 0).is_err());
    }

    #[test]
    fn rejects_oversized_name() {
        let name = "a".repeat(MAX_NAME_LENGTH_EXTENDED + 1);
        assert!(Channel::new(name, 0, 0).is_err());
    }

    #[test]
    fn accepts_name_at_max() {
        let name = "a".repeat(MAX_NAME_LENGTH_EXTENDED);
        assert!(Channel::new(name, 0, 0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_priority() {
        assert!(Channel::new("simple:A", 0, 100).is_err());
    }

    #[test]
    fn clear_request_needs_sid() {
        let channel = Channel::new("simple:A", 0, 0).unwrap();
        assert!(channel.clear_request().is_err());
    }

    #[test]
    fn access_rights_decode_read_write() {
        let mut channel = Channel::new("simple:A", 0, 0).unwrap();
        channel.set_access_rights(0x3);
        let rights = channel.access_rights().unwrap();
        assert!(rights.contains(AccessRights::READ));
        assert!(rights.contains(AccessRights::WRITE));
    }

    #[test]
    fn clear_request_after_sid_bound() {
        let mut channel = Channel::new("simple:A", 0, 0).unwrap();
        channel.set_sid(17);
        let cmd = channel.clear_request().unwrap();
        assert_eq!(cmd, Command::ClearChannelRequest { sid: 17, cid: 0 });
    }
}
