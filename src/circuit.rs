//! `VirtualCircuit`: the state and bookkeeping for one TCP connection
//! carrying Channel Access traffic between exactly two peers.
//!
//! Owns the channels multiplexed over it, the ids it has allocated on
//! their behalf, and the circuit-level state machine. Sans-I/O: `feed`
//! appends bytes a caller read off a real socket, `next_command` hands
//! back parsed commands (or says how many more bytes are needed), and
//! `send` turns an outgoing `Command` into bytes after validating it
//! against both state machines.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::channel::{Channel, PeerAddress};
use crate::command::Command;
use crate::dbr::{DbrType, DbrValue};
use crate::error::{CaError, CaprotoKeyError, CaprotoValueError, LocalProtocolError};
use crate::framer::{self, FrameResult};
use crate::header;
use crate::ids::IdGenerator;
use crate::role::Role;
use crate::state::{CircuitState, circuit::validate_priority};

/// Outcome of asking a connection object to parse its next command.
#[derive(Debug, Clone, PartialEq)]
pub enum Next {
    Command(Command),
    NeedData(usize),
}

/// One TCP circuit: a version-negotiated connection to a single peer,
/// multiplexing any number of channels.
pub struct VirtualCircuit {
    our_role: Role,
    address: PeerAddress,
    priority: u16,
    recv_buffer: BytesMut,
    state: CircuitState,
    channels_by_cid: HashMap<u32, Channel>,
    sid_to_cid: HashMap<u32, u32>,
    ioids_in_flight: HashMap<u32, u32>,
    subscriptions_in_flight: HashMap<u32, (u32, Command)>,
    cid_ids: IdGenerator,
    sid_ids: IdGenerator,
    ioid_ids: IdGenerator,
    subscriptionid_ids: IdGenerator,
}

impl VirtualCircuit {
    pub fn new(our_role: Role, address: PeerAddress, priority: u16) -> Result<Self, CaError> {
        validate_priority(priority)?;
        Ok(Self {
            our_role,
            address,
            priority,
            recv_buffer: BytesMut::new(),
            state: CircuitState::new(),
            channels_by_cid: HashMap::new(),
            sid_to_cid: HashMap::new(),
            ioids_in_flight: HashMap::new(),
            subscriptions_in_flight: HashMap::new(),
            cid_ids: IdGenerator::new("cid"),
            sid_ids: IdGenerator::new("sid"),
            ioid_ids: IdGenerator::new("ioid"),
            subscriptionid_ids: IdGenerator::new("subscriptionid"),
        })
    }

    pub fn our_role(&self) -> Role {
        self.our_role
    }

    pub fn address(&self) -> &PeerAddress {
        &self.address
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    pub fn state(&self) -> &CircuitState {
        &self.state
    }

    pub fn channel(&self, cid: u32) -> Option<&Channel> {
        self.channels_by_cid.get(&cid)
    }

    /// Register a channel this circuit will carry, allocating its
    /// `cid`. Returns the new `cid`.
    pub fn create_channel(&mut self, name: impl Into<String>) -> Result<u32, CaError> {
        let name = name.into();
        let channels = &self.channels_by_cid;
        let cid = self.cid_ids.next_id(|id| channels.contains_key(&id))?;
        let mut channel = Channel::new(name, cid, self.priority)?;
        channel.bind_circuit(self.address.clone());
        self.channels_by_cid.insert(cid, channel);
        Ok(cid)
    }

    /// Adopt a `Channel` whose `cid` was already assigned elsewhere —
    /// typically by a `Broadcaster`'s `search`, resolved to this
    /// circuit's address. Binds the channel to this circuit and
    /// registers it under its existing `cid`. Returns that `cid`.
    ///
    /// Errors if a channel with the same `cid` is already registered
    /// on this circuit.
    pub fn adopt_channel(&mut self, mut channel: Channel) -> Result<u32, CaError> {
        let cid = channel.cid();
        if self.channels_by_cid.contains_key(&cid) {
            return Err(CaError::Value(CaprotoValueError::new(
                "cid",
                format!("cid {cid} is already registered on this circuit"),
            )));
        }
        channel.bind_circuit(self.address.clone());
        self.channels_by_cid.insert(cid, channel);
        Ok(cid)
    }

    /// Append bytes read from the underlying transport.
    pub fn feed(&mut self, bytes: &[u8]) {
        trace!(peer = %self.address.host, len = bytes.len(), "fed bytes to circuit");
        self.recv_buffer.extend_from_slice(bytes);
    }

    /// Parse and consume the next command from the receive buffer, if
    /// one is complete; otherwise report how many more bytes are
    /// needed. Applies the command's effect to the relevant state
    /// machine(s) before returning it.
    pub fn next_command(&mut self) -> Result<Next, CaError> {
        let from_server = self.our_role == Role::Client;
        match framer::parse_stream(&self.recv_buffer, from_server)? {
            FrameResult::Command { command, consumed } => {
                let _ = self.recv_buffer.split_to(consumed);
                self.apply(&command, self.our_role.other())?;
                Ok(Next::Command(command))
            }
            FrameResult::NeedData(n) => Ok(Next::NeedData(n)),
        }
    }

    /// Validate `cmd` against the circuit and (if applicable) channel
    /// state machines, apply its side effects, and encode it.
    pub fn send(&mut self, cmd: Command) -> Result<Bytes, CaError> {
        self.apply(&cmd, self.our_role)?;
        Ok(Bytes::from(cmd.to_bytes()))
    }

    fn apply(&mut self, cmd: &Command, originator: Role) -> Result<(), CaError> {
        self.state.process(cmd, originator, self.our_role)?;

        if let Some(cid) = self.route_cid(cmd) {
            let channel = self
                .channels_by_cid
                .get_mut(&cid)
                .ok_or(CaprotoKeyError::UnknownCid(cid))?;
            channel.state_mut().process(cmd, originator, self.our_role)?;
        }

        self.apply_side_effects(cmd, originator)
    }

    /// Find which channel (by `cid`) a channel-scoped command belongs
    /// to. Circuit-level commands (version/echo/host name/...) return
    /// `None`.
    fn route_cid(&self, cmd: &Command) -> Option<u32> {
        use Command::*;
        match cmd {
            SearchRequest { cid, .. }
            | SearchResponse { cid, .. }
            | NotFoundResponse { cid, .. }
            | CreateChannelRequest { cid, .. }
            | CreateChannelResponse { cid, .. }
            | CreateChannelFailure { cid }
            | AccessRightsResponse { cid, .. }
            | ServerDisconnResponse { cid }
            | ClearChannelRequest { cid, .. }
            | ClearChannelResponse { cid, .. } => Some(*cid),
            ReadNotifyRequest { sid, .. } | WriteRequest { sid, .. } | WriteNotifyRequest { sid, .. } => {
                self.sid_to_cid.get(sid).copied()
            }
            ReadNotifyResponse { ioid, .. } | WriteNotifyResponse { ioid, .. } => {
                self.ioids_in_flight.get(ioid).copied()
            }
            EventAddRequest { sid, .. } | EventCancelRequest { sid, .. } => {
                self.sid_to_cid.get(sid).copied()
            }
            EventAddResponse { subscriptionid, .. } | EventCancelResponse { subscriptionid, .. } => self
                .subscriptions_in_flight
                .get(subscriptionid)
                .map(|(cid, _)| *cid),
            ErrorResponse { cid, .. } => Some(*cid),
            _ => None,
        }
    }

    fn apply_side_effects(&mut self, cmd: &Command, _originator: Role) -> Result<(), CaError> {
        use Command::*;
        match cmd {
            CreateChannelResponse { cid, sid, data_type, data_count } => {
                debug!(cid, sid, "channel bound to sid");
                if let Some(channel) = self.channels_by_cid.get_mut(cid) {
                    channel.set_sid(*sid);
                    if let Ok(dt) = DbrType::from_id(*data_type) {
                        channel.set_native_type(dt, *data_count);
                    }
                }
                self.sid_to_cid.insert(*sid, *cid);
            }
            AccessRightsResponse { cid, access_rights } => {
                if let Some(channel) = self.channels_by_cid.get_mut(cid) {
                    channel.set_access_rights(*access_rights);
                }
            }
            ReadNotifyRequest { sid, ioid, .. } | WriteNotifyRequest { sid, ioid, .. } => {
                let cid = *self
                    .sid_to_cid
                    .get(sid)
                    .ok_or(CaprotoKeyError::UnknownSid(*sid))?;
                self.ioids_in_flight.insert(*ioid, cid);
            }
            ReadNotifyResponse { ioid, .. } | WriteNotifyResponse { ioid, .. } => {
                self.ioids_in_flight.remove(ioid);
            }
            EventAddRequest { sid, subscriptionid, .. } => {
                let cid = *self
                    .sid_to_cid
                    .get(sid)
                    .ok_or(CaprotoKeyError::UnknownSid(*sid))?;
                self.subscriptions_in_flight
                    .insert(*subscriptionid, (cid, cmd.clone()));
            }
            EventCancelResponse { subscriptionid, .. } => {
                self.subscriptions_in_flight.remove(subscriptionid);
            }
            ErrorResponse { original_request, status_code, .. } => {
                if let Some(ioid) = extract_ioid(original_request) {
                    debug!(ioid, status_code, "releasing ioid after error response");
                    self.ioids_in_flight.remove(&ioid);
                }
            }
            ServerDisconnResponse { cid } => {
                if let Some(channel) = self.channels_by_cid.get_mut(cid) {
                    if let Some(sid) = channel.sid() {
                        self.sid_to_cid.remove(&sid);
                    }
                }
            }
            ClearChannelResponse { cid, sid } => {
                self.channels_by_cid.remove(cid);
                self.sid_to_cid.remove(sid);
            }
            _ => {}
        }
        Ok(())
    }

    /// Allocate an `ioid` and build + validate a `ReadNotifyRequest`
    /// for `cid`.
    pub fn read(&mut self, cid: u32, data_type: DbrType, data_count: u32) -> Result<Bytes, CaError> {
        let sid = self
            .channels_by_cid
            .get(&cid)
            .ok_or(CaprotoKeyError::UnknownCid(cid))?
            .sid()
            .ok_or_else(|| LocalProtocolError::for_command("ReadNotifyRequest", "channel has no sid yet"))?;
        let ioids = &self.ioids_in_flight;
        let ioid = self.ioid_ids.next_id(|id| ioids.contains_key(&id))?;
        self.send(Command::ReadNotifyRequest { data_type, data_count, sid, ioid })
    }

    /// Allocate an `ioid` and build + validate a `WriteNotifyRequest`
    /// for `cid`.
    pub fn write_notify(
        &mut self,
        cid: u32,
        data_type: DbrType,
        data: Vec<DbrValue>,
    ) -> Result<Bytes, CaError> {
        let sid = self
            .channels_by_cid
            .get(&cid)
            .ok_or(CaprotoKeyError::UnknownCid(cid))?
            .sid()
            .ok_or_else(|| LocalProtocolError::for_command("WriteNotifyRequest", "channel has no sid yet"))?;
        let ioids = &self.ioids_in_flight;
        let ioid = self.ioid_ids.next_id(|id| ioids.contains_key(&id))?;
        let data_count = data.len() as u32;
        self.send(Command::WriteNotifyRequest { data_type, data_count, sid, ioid, data })
    }

    /// Allocate a `subscriptionid` and build + validate an
    /// `EventAddRequest` for `cid`. Returns the subscription id
    /// alongside the encoded bytes.
    pub fn subscribe(
        &mut self,
        cid: u32,
        data_type: DbrType,
        data_count: u32,
        mask: u32,
    ) -> Result<(u32, Bytes), CaError> {
        let sid = self
            .channels_by_cid
            .get(&cid)
            .ok_or(CaprotoKeyError::UnknownCid(cid))?
            .sid()
            .ok_or_else(|| LocalProtocolError::for_command("EventAddRequest", "channel has no sid yet"))?;
        let subs = &self.subscriptions_in_flight;
        let subscriptionid = self.subscriptionid_ids.next_id(|id| subs.contains_key(&id))?;
        let bytes = self.send(Command::EventAddRequest {
            data_type,
            data_count,
            sid,
            subscriptionid,
            low: 0.0,
            high: 0.0,
            to: 0.0,
            mask,
        })?;
        Ok((subscriptionid, bytes))
    }

    /// Build + validate an `EventCancelRequest` cancelling
    /// `subscriptionid`.
    pub fn unsubscribe(&mut self, subscriptionid: u32) -> Result<Bytes, CaError> {
        let (cid, _) = self
            .subscriptions_in_flight
            .get(&subscriptionid)
            .copied()
            .ok_or(CaprotoKeyError::UnknownSubscriptionId(subscriptionid))?;
        let data_type = self
            .channels_by_cid
            .get(&cid)
            .and_then(Channel::native_data_type)
            .unwrap_or(DbrType::Long);
        let sid = self
            .channels_by_cid
            .get(&cid)
            .and_then(Channel::sid)
            .ok_or(CaprotoKeyError::UnknownCid(cid))?;
        self.send(Command::EventCancelRequest { data_type, sid, subscriptionid })
    }

    /// Build + validate a `ClearChannelRequest` for `cid`.
    pub fn clear_channel(&mut self, cid: u32) -> Result<Bytes, CaError> {
        let channel = self
            .channels_by_cid
            .get(&cid)
            .ok_or(CaprotoKeyError::UnknownCid(cid))?;
        let cmd = channel.clear_request()?;
        self.send(cmd)
    }
}

/// Best-effort extraction of the `ioid` embedded in the header of an
/// `ERROR_RESPONSE`'s `original_request` payload, for the read/write
/// family where parameter2 carries the ioid.
fn extract_ioid(original_request: &[u8]) -> Option<u32> {
    match header::parse_header(original_request).ok()? {
        header::HeaderParse::Complete { header, .. } => match header.command {
            crate::command::CA_PROTO_READ_NOTIFY | crate::command::CA_PROTO_WRITE_NOTIFY => {
                Some(header.parameter2)
            }
            _ => None,
        },
        header::HeaderParse::NeedMore(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SearchReplyPolicy;

    fn handshake(circuit: &mut VirtualCircuit) {
        circuit
            .send(Command::VersionRequest { priority: 0, version: 13 })
            .unwrap();
        circuit
            .apply(&Command::VersionResponse { version: 13 }, Role::Server)
            .unwrap();
    }

    #[test]
    fn create_channel_allocates_increasing_cids() {
        let mut circuit =
            VirtualCircuit::new(Role::Client, PeerAddress::new("127.0.0.1", 5064), 0).unwrap();
        let cid1 = circuit.create_channel("simple:A").unwrap();
        let cid2 = circuit.create_channel("simple:B").unwrap();
        assert_eq!(cid1, 0);
        assert_eq!(cid2, 1);
    }

    #[test]
    fn adopt_channel_keeps_search_assigned_cid_and_binds_address() {
        let address = PeerAddress::new("127.0.0.1", 5064);
        let mut circuit = VirtualCircuit::new(Role::Client, address.clone(), 0).unwrap();
        let channel = Channel::new("simple:A", 42, 0).unwrap();
        assert!(channel.circuit_address().is_none());

        let cid = circuit.adopt_channel(channel).unwrap();
        assert_eq!(cid, 42);
        assert_eq!(circuit.channel(42).unwrap().circuit_address(), Some(&address));
    }

    #[test]
    fn adopt_channel_rejects_duplicate_cid() {
        let mut circuit =
            VirtualCircuit::new(Role::Client, PeerAddress::new("127.0.0.1", 5064), 0).unwrap();
        circuit
            .adopt_channel(Channel::new("simple:A", 42, 0).unwrap())
            .unwrap();
        let err = circuit
            .adopt_channel(Channel::new("simple:B", 42, 0).unwrap())
            .unwrap_err();
        assert!(matches!(err, CaError::Value(_)));
    }

    #[test]
    fn read_requires_connected_channel() {
        let mut circuit =
            VirtualCircuit::new(Role::Client, PeerAddress::new("127.0.0.1", 5064), 0).unwrap();
        let cid = circuit.create_channel("simple:A").unwrap();
        assert!(circuit.read(cid, DbrType::Double, 1).is_err());
    }

    #[test]
    fn full_round_trip_to_connected_channel_enables_read() {
        let mut circuit =
            VirtualCircuit::new(Role::Client, PeerAddress::new("127.0.0.1", 5064), 0).unwrap();
        handshake(&mut circuit);
        let cid = circuit.create_channel("simple:A").unwrap();

        circuit
            .apply(
                &Command::SearchRequest {
                    name: "simple:A".into(),
                    cid,
                    version: 13,
                    reply: SearchReplyPolicy::ReplyRequired,
                },
                Role::Client,
            )
            .unwrap();
        circuit
            .apply(
                &Command::SearchResponse { port: 5064, cid, version: 13 },
                Role::Server,
            )
            .unwrap();
        circuit
            .send(Command::CreateChannelRequest { name: "simple:A".into(), cid, version: 13 })
            .unwrap();
        circuit
            .apply(
                &Command::CreateChannelResponse { data_type: 6, data_count: 1, cid, sid: 17 },
                Role::Server,
            )
            .unwrap();

        assert_eq!(circuit.channel(cid).unwrap().sid(), Some(17));
        let bytes = circuit.read(cid, DbrType::Double, 1).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(circuit.ioids_in_flight.len(), 1);
    }

    #[test]
    fn error_response_releases_ioid() {
        let mut circuit =
            VirtualCircuit::new(Role::Client, PeerAddress::new("127.0.0.1", 5064), 0).unwrap();
        handshake(&mut circuit);
        let cid = circuit.create_channel("simple:A").unwrap();
        circuit
            .apply(
                &Command::SearchRequest {
                    name: "simple:A".into(),
                    cid,
                    version: 13,
                    reply: SearchReplyPolicy::ReplyRequired,
                },
                Role::Client,
            )
            .unwrap();
        circuit
            .apply(
                &Command::SearchResponse { port: 5064, cid, version: 13 },
                Role::Server,
            )
            .unwrap();
        circuit
            .send(Command::CreateChannelRequest { name: "simple:A".into(), cid, version: 13 })
            .unwrap();
        circuit
            .apply(
                &Command::CreateChannelResponse { data_type: 6, data_count: 1, cid, sid: 17 },
                Role::Server,
            )
            .unwrap();
        circuit.read(cid, DbrType::Double, 1).unwrap();
        assert_eq!(circuit.ioids_in_flight.len(), 1);

        let original_request = Command::ReadNotifyRequest {
            data_type: DbrType::Double,
            data_count: 1,
            sid: 17,
            ioid: 0,
        }
        .to_bytes();
        circuit
            .apply(
                &Command::ErrorResponse {
                    original_request,
                    cid,
                    status_code: 0xa,
                    message: "ECA_TIMEOUT".into(),
                },
                Role::Server,
            )
            .unwrap();
        assert!(circuit.ioids_in_flight.is_empty());
    }
}
