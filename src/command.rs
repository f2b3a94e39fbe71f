//! The closed catalog of Channel Access protocol messages.
//!
//! Each variant pairs a command code with the concrete fields its
//! header and payload carry. `_commands.py` is treated as the
//! authoritative source for message shape; `messages.py`, its
//! incomplete sibling, is not consulted.

use crate::dbr::{DbrType, DbrValue, STRING_SIZE};
use crate::error::RemoteProtocolError;
use crate::header::{Header, STANDARD_HEADER_SIZE};

// Wire command codes, in the CA protocol's own numbering. Several
// command classes multiplex a request and its response onto the same
// code; direction and payload shape disambiguate them.
pub const CA_PROTO_VERSION: u16 = 0;
pub const CA_PROTO_EVENT_ADD: u16 = 1;
pub const CA_PROTO_EVENT_CANCEL: u16 = 2;
pub const CA_PROTO_WRITE: u16 = 4;
pub const CA_PROTO_SEARCH: u16 = 6;
pub const CA_PROTO_EVENTS_OFF: u16 = 8;
pub const CA_PROTO_EVENTS_ON: u16 = 9;
pub const CA_PROTO_READ_SYNC: u16 = 10;
pub const CA_PROTO_ERROR: u16 = 11;
pub const CA_PROTO_CLEAR_CHANNEL: u16 = 12;
pub const CA_PROTO_RSRV_IS_UP: u16 = 13;
pub const CA_PROTO_NOT_FOUND: u16 = 14;
pub const CA_PROTO_READ_NOTIFY: u16 = 15;
pub const CA_REPEATER_CONFIRM: u16 = 17;
pub const CA_PROTO_CREATE_CHAN: u16 = 18;
pub const CA_PROTO_WRITE_NOTIFY: u16 = 19;
pub const CA_PROTO_CLIENT_NAME: u16 = 20;
pub const CA_PROTO_HOST_NAME: u16 = 21;
pub const CA_PROTO_ACCESS_RIGHTS: u16 = 22;
pub const CA_PROTO_ECHO: u16 = 23;
pub const CA_REPEATER_REGISTER: u16 = 24;
pub const CA_PROTO_CREATE_CH_FAIL: u16 = 26;
pub const CA_PROTO_SERVER_DISCONN: u16 = 27;

/// Reply-policy sentinel carried in a `SearchRequest`'s `data_type`
/// field: whether the server should reply only on a match, or always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchReplyPolicy {
    NoReplyIfNotFound,
    ReplyRequired,
}

impl SearchReplyPolicy {
    pub const NO_REPLY: u16 = 5;
    pub const DO_REPLY: u16 = 10;

    pub fn to_wire(self) -> u16 {
        match self {
            SearchReplyPolicy::NoReplyIfNotFound => Self::NO_REPLY,
            SearchReplyPolicy::ReplyRequired => Self::DO_REPLY,
        }
    }

    pub fn from_wire(value: u16) -> Result<Self, RemoteProtocolError> {
        match value {
            Self::NO_REPLY => Ok(SearchReplyPolicy::NoReplyIfNotFound),
            Self::DO_REPLY => Ok(SearchReplyPolicy::ReplyRequired),
            other => Err(RemoteProtocolError::new(format!(
                "invalid search reply policy {other}"
            ))),
        }
    }
}

fn padded_len(n: usize) -> usize {
    (n + 7) & !7
}

fn encode_padded_name(name: &str) -> Vec<u8> {
    let size = padded_len(name.len().max(1));
    let mut buf = vec![0u8; size];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    buf
}

fn decode_padded_name(payload: &[u8]) -> Result<String, RemoteProtocolError> {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    String::from_utf8(payload[..end].to_vec())
        .map_err(|e| RemoteProtocolError::new(format!("non-UTF8 name: {e}")))
}

fn encode_data(data_type: DbrType, values: &[DbrValue]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * data_type.element_size());
    for v in values {
        v.encode(&mut buf);
    }
    buf
}

fn decode_data(
    data_type: DbrType,
    data_count: u32,
    payload: &[u8],
) -> Result<Vec<DbrValue>, RemoteProtocolError> {
    let mut pos = 0;
    let mut out = Vec::with_capacity(data_count as usize);
    for _ in 0..data_count {
        out.push(DbrValue::decode(data_type, payload, &mut pos)?);
    }
    Ok(out)
}

/// One protocol message: a header paired with its (already decoded,
/// or yet to be encoded) typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    VersionRequest { priority: u16, version: u16 },
    VersionResponse { version: u16 },
    SearchRequest { name: String, cid: u32, version: u16, reply: SearchReplyPolicy },
    SearchResponse { port: u16, cid: u32, version: u16 },
    NotFoundResponse { version: u16, cid: u32 },
    EchoRequest,
    EchoResponse,
    RsrvIsUp { server_port: u16, beacon_id: u32, address: u32 },
    RepeaterRegister { client_ip_address: u32 },
    RepeaterConfirm { repeater_address: u32 },
    CreateChannelRequest { name: String, cid: u32, version: u16 },
    CreateChannelResponse { data_type: u16, data_count: u32, cid: u32, sid: u32 },
    CreateChannelFailure { cid: u32 },
    HostNameRequest { name: String },
    ClientNameRequest { name: String },
    AccessRightsResponse { cid: u32, access_rights: u32 },
    ServerDisconnResponse { cid: u32 },
    ReadNotifyRequest { data_type: DbrType, data_count: u32, sid: u32, ioid: u32 },
    ReadNotifyResponse {
        data_type: DbrType,
        data_count: u32,
        status: u32,
        ioid: u32,
        data: Vec<DbrValue>,
    },
    WriteRequest {
        data_type: DbrType,
        data_count: u32,
        sid: u32,
        ioid: u32,
        data: Vec<DbrValue>,
    },
    WriteNotifyRequest {
        data_type: DbrType,
        data_count: u32,
        sid: u32,
        ioid: u32,
        data: Vec<DbrValue>,
    },
    WriteNotifyResponse { data_type: DbrType, data_count: u32, status: u32, ioid: u32 },
    EventAddRequest {
        data_type: DbrType,
        data_count: u32,
        sid: u32,
        subscriptionid: u32,
        low: f32,
        high: f32,
        to: f32,
        mask: u32,
    },
    EventAddResponse {
        data_type: DbrType,
        data_count: u32,
        status: u32,
        subscriptionid: u32,
        data: Vec<DbrValue>,
    },
    EventCancelRequest { data_type: DbrType, sid: u32, subscriptionid: u32 },
    EventCancelResponse { data_type: DbrType, sid: u32, subscriptionid: u32 },
    EventsOffRequest,
    EventsOnRequest,
    ReadSyncRequest,
    ErrorResponse {
        original_request: Vec<u8>,
        cid: u32,
        status_code: u32,
        message: String,
    },
    ClearChannelRequest { sid: u32, cid: u32 },
    ClearChannelResponse { sid: u32, cid: u32 },
}

impl Command {
    /// The wire command code (offset 0 of the header).
    pub fn code(&self) -> u16 {
        use Command::*;
        match self {
            VersionRequest { .. } | VersionResponse { .. } => CA_PROTO_VERSION,
            SearchRequest { .. } | SearchResponse { .. } => CA_PROTO_SEARCH,
            NotFoundResponse { .. } => CA_PROTO_NOT_FOUND,
            EchoRequest | EchoResponse => CA_PROTO_ECHO,
            RsrvIsUp { .. } => CA_PROTO_RSRV_IS_UP,
            RepeaterRegister { .. } => CA_REPEATER_REGISTER,
            RepeaterConfirm { .. } => CA_REPEATER_CONFIRM,
            CreateChannelRequest { .. } | CreateChannelResponse { .. } => CA_PROTO_CREATE_CHAN,
            CreateChannelFailure { .. } => CA_PROTO_CREATE_CH_FAIL,
            HostNameRequest { .. } => CA_PROTO_HOST_NAME,
            ClientNameRequest { .. } => CA_PROTO_CLIENT_NAME,
            AccessRightsResponse { .. } => CA_PROTO_ACCESS_RIGHTS,
            ServerDisconnResponse { .. } => CA_PROTO_SERVER_DISCONN,
            ReadNotifyRequest { .. } | ReadNotifyResponse { .. } => CA_PROTO_READ_NOTIFY,
            WriteRequest { .. } => CA_PROTO_WRITE,
            WriteNotifyRequest { .. } | WriteNotifyResponse { .. } => CA_PROTO_WRITE_NOTIFY,
            EventAddRequest { .. } | EventAddResponse { .. } => CA_PROTO_EVENT_ADD,
            EventCancelRequest { .. } | EventCancelResponse { .. } => CA_PROTO_EVENT_CANCEL,
            EventsOffRequest => CA_PROTO_EVENTS_OFF,
            EventsOnRequest => CA_PROTO_EVENTS_ON,
            ReadSyncRequest => CA_PROTO_READ_SYNC,
            ErrorResponse { .. } => CA_PROTO_ERROR,
            ClearChannelRequest { .. } | ClearChannelResponse { .. } => CA_PROTO_CLEAR_CHANNEL,
        }
    }

    /// Short, stable name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        use Command::*;
        match self {
            VersionRequest { .. } => "VersionRequest",
            VersionResponse { .. } => "VersionResponse",
            SearchRequest { .. } => "SearchRequest",
            SearchResponse { .. } => "SearchResponse",
            NotFoundResponse { .. } => "NotFoundResponse",
            EchoRequest => "EchoRequest",
            EchoResponse => "EchoResponse",
            RsrvIsUp { .. } => "RsrvIsUp",
            RepeaterRegister { .. } => "RepeaterRegister",
            RepeaterConfirm { .. } => "RepeaterConfirm",
            CreateChannelRequest { .. } => "CreateChannelRequest",
            CreateChannelResponse { .. } => "CreateChannelResponse",
            CreateChannelFailure { .. } => "CreateChannelFailure",
            HostNameRequest { .. } => "HostNameRequest",
            ClientNameRequest { .. } => "ClientNameRequest",
            AccessRightsResponse { .. } => "AccessRightsResponse",
            ServerDisconnResponse { .. } => "ServerDisconnResponse",
            ReadNotifyRequest { .. } => "ReadNotifyRequest",
            ReadNotifyResponse { .. } => "ReadNotifyResponse",
            WriteRequest { .. } => "WriteRequest",
            WriteNotifyRequest { .. } => "WriteNotifyRequest",
            WriteNotifyResponse { .. } => "WriteNotifyResponse",
            EventAddRequest { .. } => "EventAddRequest",
            EventAddResponse { .. } => "EventAddResponse",
            EventCancelRequest { .. } => "EventCancelRequest",
            EventCancelResponse { .. } => "EventCancelResponse",
            EventsOffRequest => "EventsOffRequest",
            EventsOnRequest => "EventsOnRequest",
            ReadSyncRequest => "ReadSyncRequest",
            ErrorResponse { .. } => "ErrorResponse",
            ClearChannelRequest { .. } => "ClearChannelRequest",
            ClearChannelResponse { .. } => "ClearChannelResponse",
        }
    }

    /// True for commands that only ever flow over a UDP datagram.
    pub fn is_datagram_only(&self) -> bool {
        matches!(
            self,
            Command::SearchRequest { .. }
                | Command::SearchResponse { .. }
                | Command::NotFoundResponse { .. }
                | Command::RsrvIsUp { .. }
                | Command::RepeaterRegister { .. }
                | Command::RepeaterConfirm { .. }
        )
    }

    /// Encode header + payload + zero padding to an 8-byte boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        use Command::*;
        let (header, payload): (Header, Vec<u8>) = match self {
            VersionRequest { priority, version } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: *priority,
                    data_count: *version as u32,
                    parameter1: 0,
                    parameter2: 0,
                },
                Vec::new(),
            ),
            VersionResponse { version } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: *version as u32,
                    parameter1: 0,
                    parameter2: 0,
                },
                Vec::new(),
            ),
            SearchRequest { name, cid, version, reply } => {
                let payload = encode_padded_name(name);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: reply.to_wire(),
                        data_count: *version as u32,
                        parameter1: *cid,
                        parameter2: *cid,
                    },
                    payload,
                )
            }
            SearchResponse { port, cid, version } => {
                let payload = {
                    let mut b = Vec::new();
                    DbrValue::Int(crate::dbr::DbrInt { value: *version as i16 }).encode(&mut b);
                    b
                };
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: DbrType::Int.id(),
                        data_count: 0,
                        parameter1: *port as u32,
                        parameter2: *cid,
                    },
                    payload,
                )
            }
            NotFoundResponse { version, cid } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: SearchReplyPolicy::DO_REPLY,
                    data_count: *version as u32,
                    parameter1: 0,
                    parameter2: *cid,
                },
                Vec::new(),
            ),
            EchoRequest | EchoResponse => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: 0,
                    parameter1: 0,
                    parameter2: 0,
                },
                Vec::new(),
            ),
            RsrvIsUp { server_port, beacon_id, address } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: *server_port as u32,
                    parameter1: *beacon_id,
                    parameter2: *address,
                },
                Vec::new(),
            ),
            RepeaterRegister { client_ip_address } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: 0,
                    parameter1: 0,
                    parameter2: *client_ip_address,
                },
                Vec::new(),
            ),
            RepeaterConfirm { repeater_address } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: 0,
                    parameter1: 0,
                    parameter2: *repeater_address,
                },
                Vec::new(),
            ),
            CreateChannelRequest { name, cid, version } => {
                let payload = encode_padded_name(name);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: 0,
                        data_count: *version as u32,
                        parameter1: *cid,
                        parameter2: crate::MIN_PROTOCOL_VERSION as u32,
                    },
                    payload,
                )
            }
            CreateChannelResponse { data_type, data_count, cid, sid } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: *data_type,
                    data_count: *data_count,
                    parameter1: *cid,
                    parameter2: *sid,
                },
                Vec::new(),
            ),
            CreateChannelFailure { cid } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: 0,
                    parameter1: *cid,
                    parameter2: 0,
                },
                Vec::new(),
            ),
            HostNameRequest { name } | ClientNameRequest { name } => {
                let payload = encode_padded_name(name);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: 0,
                        data_count: 0,
                        parameter1: 0,
                        parameter2: 0,
                    },
                    payload,
                )
            }
            AccessRightsResponse { cid, access_rights } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: 0,
                    parameter1: *cid,
                    parameter2: *access_rights,
                },
                Vec::new(),
            ),
            ServerDisconnResponse { cid } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: 0,
                    parameter1: *cid,
                    parameter2: 0,
                },
                Vec::new(),
            ),
            ReadNotifyRequest { data_type, data_count, sid, ioid } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: data_type.id(),
                    data_count: *data_count,
                    parameter1: *sid,
                    parameter2: *ioid,
                },
                Vec::new(),
            ),
            ReadNotifyResponse { data_type, data_count, status, ioid, data } => {
                let payload = encode_data(*data_type, data);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: data_type.id(),
                        data_count: *data_count,
                        parameter1: *status,
                        parameter2: *ioid,
                    },
                    payload,
                )
            }
            WriteRequest { data_type, data_count, sid, ioid, data } => {
                let payload = encode_data(*data_type, data);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: data_type.id(),
                        data_count: *data_count,
                        parameter1: *sid,
                        parameter2: *ioid,
                    },
                    payload,
                )
            }
            WriteNotifyRequest { data_type, data_count, sid, ioid, data } => {
                let payload = encode_data(*data_type, data);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: data_type.id(),
                        data_count: *data_count,
                        parameter1: *sid,
                        parameter2: *ioid,
                    },
                    payload,
                )
            }
            WriteNotifyResponse { data_type, data_count, status, ioid } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: data_type.id(),
                    data_count: *data_count,
                    parameter1: *status,
                    parameter2: *ioid,
                },
                Vec::new(),
            ),
            EventAddRequest {
                data_type,
                data_count,
                sid,
                subscriptionid,
                low,
                high,
                to,
                mask,
            } => {
                let mut payload = Vec::new();
                DbrValue::Float(crate::dbr::DbrFloat { value: *low }).encode(&mut payload);
                DbrValue::Float(crate::dbr::DbrFloat { value: *high }).encode(&mut payload);
                DbrValue::Float(crate::dbr::DbrFloat { value: *to }).encode(&mut payload);
                DbrValue::Long(crate::dbr::DbrLong { value: *mask as i32 }).encode(&mut payload);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: data_type.id(),
                        data_count: *data_count,
                        parameter1: *sid,
                        parameter2: *subscriptionid,
                    },
                    payload,
                )
            }
            EventAddResponse { data_type, data_count, status, subscriptionid, data } => {
                let payload = encode_data(*data_type, data);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: data_type.id(),
                        data_count: *data_count,
                        parameter1: *status,
                        parameter2: *subscriptionid,
                    },
                    payload,
                )
            }
            EventCancelRequest { data_type, sid, subscriptionid }
            | EventCancelResponse { data_type, sid, subscriptionid } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: data_type.id(),
                    data_count: 0,
                    parameter1: *sid,
                    parameter2: *subscriptionid,
                },
                Vec::new(),
            ),
            EventsOffRequest | EventsOnRequest | ReadSyncRequest => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: 0,
                    parameter1: 0,
                    parameter2: 0,
                },
                Vec::new(),
            ),
            ErrorResponse { original_request, cid, status_code, message } => {
                // Wire format is the failed request's standard header
                // (fixed size, not the variable-length command it came
                // from) followed by a fixed `STRING_SIZE`-byte,
                // null-padded message, a `DBR_STRING` rather than a
                // bare null-terminated string. Both halves are fixed
                // width so decode never has to guess where one ends
                // and the other begins.
                let mut payload = Vec::with_capacity(STANDARD_HEADER_SIZE + STRING_SIZE);
                let header_len = original_request.len().min(STANDARD_HEADER_SIZE);
                payload.extend_from_slice(&original_request[..header_len]);
                payload.resize(STANDARD_HEADER_SIZE, 0);
                let msg_bytes = message.as_bytes();
                let msg_len = msg_bytes.len().min(STRING_SIZE);
                payload.extend_from_slice(&msg_bytes[..msg_len]);
                payload.resize(payload.len() + (STRING_SIZE - msg_len), 0);
                (
                    Header {
                        command: self.code(),
                        payload_size: payload.len() as u32,
                        data_type: 0,
                        data_count: 0,
                        parameter1: *cid,
                        parameter2: *status_code,
                    },
                    payload,
                )
            }
            ClearChannelRequest { sid, cid } | ClearChannelResponse { sid, cid } => (
                Header {
                    command: self.code(),
                    payload_size: 0,
                    data_type: 0,
                    data_count: 0,
                    parameter1: *sid,
                    parameter2: *cid,
                },
                Vec::new(),
            ),
        };

        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(&payload);
        let pad = header.padded_payload_size() - payload.len();
        bytes.extend(std::iter::repeat(0u8).take(pad));
        bytes
    }

    /// Reconstruct a `Command` from a decoded header and its (already
    /// padding-stripped) payload. `from_server` indicates whether the
    /// peer that produced these bytes is acting as the server.
    pub fn from_header_and_payload(
        header: &Header,
        payload: &[u8],
        from_server: bool,
    ) -> Result<Command, RemoteProtocolError> {
        Ok(match header.command {
            CA_PROTO_VERSION => {
                if from_server {
                    Command::VersionResponse {
                        version: header.data_count as u16,
                    }
                } else {
                    Command::VersionRequest {
                        priority: header.data_type,
                        version: header.data_count as u16,
                    }
                }
            }
            CA_PROTO_SEARCH => {
                if from_server {
                    let mut pos = 0;
                    let version = match DbrValue::decode(DbrType::Int, payload, &mut pos)? {
                        DbrValue::Int(v) => v.value as u16,
                        _ => unreachable!("DbrType::Int always decodes to DbrValue::Int"),
                    };
                    Command::SearchResponse {
                        port: header.parameter1 as u16,
                        cid: header.parameter2,
                        version,
                    }
                } else {
                    Command::SearchRequest {
                        name: decode_padded_name(payload)?,
                        cid: header.parameter2,
                        version: header.data_count as u16,
                        reply: SearchReplyPolicy::from_wire(header.data_type)?,
                    }
                }
            }
            CA_PROTO_NOT_FOUND => Command::NotFoundResponse {
                version: header.data_count as u16,
                cid: header.parameter2,
            },
            CA_PROTO_ECHO => {
                if from_server {
                    Command::EchoResponse
                } else {
                    Command::EchoRequest
                }
            }
            CA_PROTO_RSRV_IS_UP => Command::RsrvIsUp {
                server_port: header.data_count as u16,
                beacon_id: header.parameter1,
                address: header.parameter2,
            },
            CA_REPEATER_REGISTER => Command::RepeaterRegister {
                client_ip_address: header.parameter2,
            },
            CA_REPEATER_CONFIRM => Command::RepeaterConfirm {
                repeater_address: header.parameter2,
            },
            CA_PROTO_CREATE_CHAN => {
                if from_server {
                    Command::CreateChannelResponse {
                        data_type: header.data_type,
                        data_count: header.data_count,
                        cid: header.parameter1,
                        sid: header.parameter2,
                    }
                } else {
                    Command::CreateChannelRequest {
                        name: decode_padded_name(payload)?,
                        cid: header.parameter1,
                        version: header.data_count as u16,
                    }
                }
            }
            CA_PROTO_CREATE_CH_FAIL => Command::CreateChannelFailure {
                cid: header.parameter1,
            },
            CA_PROTO_HOST_NAME => Command::HostNameRequest {
                name: decode_padded_name(payload)?,
            },
            CA_PROTO_CLIENT_NAME => Command::ClientNameRequest {
                name: decode_padded_name(payload)?,
            },
            CA_PROTO_ACCESS_RIGHTS => Command::AccessRightsResponse {
                cid: header.parameter1,
                access_rights: header.parameter2,
            },
            CA_PROTO_SERVER_DISCONN => Command::ServerDisconnResponse {
                cid: header.parameter1,
            },
            CA_PROTO_READ_NOTIFY => {
                let data_type = DbrType::from_id(header.data_type)?;
                if from_server {
                    Command::ReadNotifyResponse {
                        data_type,
                        data_count: header.data_count,
                        status: header.parameter1,
                        ioid: header.parameter2,
                        data: decode_data(data_type, header.data_count, payload)?,
                    }
                } else {
                    Command::ReadNotifyRequest {
                        data_type,
                        data_count: header.data_count,
                        sid: header.parameter1,
                        ioid: header.parameter2,
                    }
                }
            }
            CA_PROTO_WRITE => {
                let data_type = DbrType::from_id(header.data_type)?;
                Command::WriteRequest {
                    data_type,
                    data_count: header.data_count,
                    sid: header.parameter1,
                    ioid: header.parameter2,
                    data: decode_data(data_type, header.data_count, payload)?,
                }
            }
            CA_PROTO_WRITE_NOTIFY => {
                let data_type = DbrType::from_id(header.data_type)?;
                if from_server {
                    Command::WriteNotifyResponse {
                        data_type,
                        data_count: header.data_count,
                        status: header.parameter1,
                        ioid: header.parameter2,
                    }
                } else {
                    Command::WriteNotifyRequest {
                        data_type,
                        data_count: header.data_count,
                        sid: header.parameter1,
                        ioid: header.parameter2,
                        data: decode_data(data_type, header.data_count, payload)?,
                    }
                }
            }
            CA_PROTO_EVENT_ADD => {
                let data_type = DbrType::from_id(header.data_type)?;
                if from_server {
                    Command::EventAddResponse {
                        data_type,
                        data_count: header.data_count,
                        status: header.parameter1,
                        subscriptionid: header.parameter2,
                        data: decode_data(data_type, header.data_count, payload)?,
                    }
                } else {
                    let mut pos = 0;
                    let low = match DbrValue::decode(DbrType::Float, payload, &mut pos)? {
                        DbrValue::Float(f) => f.value,
                        _ => unreachable!(),
                    };
                    let high = match DbrValue::decode(DbrType::Float, payload, &mut pos)? {
                        DbrValue::Float(f) => f.value,
                        _ => unreachable!(),
                    };
                    let to = match DbrValue::decode(DbrType::Float, payload, &mut pos)? {
                        DbrValue::Float(f) => f.value,
                        _ => unreachable!(),
                    };
                    let mask = match DbrValue::decode(DbrType::Long, payload, &mut pos)? {
                        DbrValue::Long(l) => l.value as u32,
                        _ => unreachable!(),
                    };
                    Command::EventAddRequest {
                        data_type,
                        data_count: header.data_count,
                        sid: header.parameter1,
                        subscriptionid: header.parameter2,
                        low,
                        high,
                        to,
                        mask,
                    }
                }
            }
            CA_PROTO_EVENT_CANCEL => {
                let data_type = DbrType::from_id(header.data_type)?;
                if from_server {
                    Command::EventCancelResponse {
                        data_type,
                        sid: header.parameter1,
                        subscriptionid: header.parameter2,
                    }
                } else {
                    Command::EventCancelRequest {
                        data_type,
                        sid: header.parameter1,
                        subscriptionid: header.parameter2,
                    }
                }
            }
            CA_PROTO_EVENTS_OFF => Command::EventsOffRequest,
            CA_PROTO_EVENTS_ON => Command::EventsOnRequest,
            CA_PROTO_READ_SYNC => Command::ReadSyncRequest,
            CA_PROTO_ERROR => {
                // Mirror of the encode side: a fixed-size header
                // followed by a fixed-size, null-padded message, not a
                // variable-length request plus a null-terminated tail.
                let header_len = STANDARD_HEADER_SIZE.min(payload.len());
                let original_request = payload[..header_len].to_vec();
                let rest = &payload[header_len..];
                let msg_len = STRING_SIZE.min(rest.len());
                let raw_message = &rest[..msg_len];
                let end = raw_message.iter().position(|&b| b == 0).unwrap_or(raw_message.len());
                let message = String::from_utf8_lossy(&raw_message[..end]).into_owned();
                Command::ErrorResponse {
                    original_request,
                    cid: header.parameter1,
                    status_code: header.parameter2,
                    message,
                }
            }
            CA_PROTO_CLEAR_CHANNEL => {
                if from_server {
                    Command::ClearChannelResponse {
                        sid: header.parameter1,
                        cid: header.parameter2,
                    }
                } else {
                    Command::ClearChannelRequest {
                        sid: header.parameter1,
                        cid: header.parameter2,
                    }
                }
            }
            other => {
                return Err(RemoteProtocolError::new(format!(
                    "unknown command code {other}"
                )));
            }
        })
    }
}
