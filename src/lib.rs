//! # caproto-core
//!
//! A sans-I/O protocol engine for EPICS Channel Access (CA): the wire
//! protocol used across particle accelerators, telescopes, and
//! industrial control systems to move process-variable values between
//! clients and servers (IOCs).
//!
//! This crate owns parsing, encoding, and state-machine validation. It
//! never touches a socket, a clock, or a thread — callers supply bytes
//! read from the network and receive back bytes to write, or commands
//! to act on. This crate contains:
//! - **Wire primitives**: `Header`, the DBR type catalog (`DbrType`,
//!   `DbrValue`)
//! - **Command catalog**: `Command`, the typed, round-trippable form
//!   of every message on the wire
//! - **Framer**: `parse_stream`/`parse_datagram`, turning buffered
//!   bytes into `Command`s
//! - **State machines**: `CircuitState`/`ChannelState`, validating
//!   that a command is legal before it is sent or accepted
//! - **Connection objects**: `VirtualCircuit`, `Broadcaster`, and
//!   `Channel` — the stateful objects a host actually drives
//! - **Error**: `CaError` — typed, `thiserror`-based error hierarchy

pub mod broadcaster;
pub mod channel;
pub mod circuit;
pub mod command;
pub mod dbr;
pub mod error;
pub mod framer;
pub mod header;
pub mod ids;
pub mod role;
pub mod state;

pub use broadcaster::Broadcaster;
pub use channel::{AccessRights, Channel, PeerAddress};
pub use circuit::VirtualCircuit;
pub use command::{Command, SearchReplyPolicy};
pub use dbr::{DbrType, DbrValue};
pub use error::{
    CaError, CaprotoKeyError, CaprotoValueError, ErrorResponseReceived, LocalProtocolError,
    RemoteProtocolError,
};
pub use framer::{FrameResult, parse_datagram, parse_stream};
pub use header::{EXTENDED_HEADER_SIZE, Header, STANDARD_HEADER_SIZE};
pub use role::Role;
pub use state::{ChannelState, ChannelStateError, ChannelSubState, CircuitState, CircuitStateError, CircuitSubState};

/// Default TCP port a Channel Access server listens on.
pub const DEFAULT_SERVER_PORT: u16 = 5064;

/// Default UDP port the Channel Access repeater listens on.
pub const DEFAULT_REPEATER_PORT: u16 = 5065;

/// Oldest protocol version this crate will negotiate.
pub const MIN_PROTOCOL_VERSION: u16 = 13;

/// PV name length limit under the legacy (non-extended) header form.
pub const MAX_NAME_LENGTH_LEGACY: usize = channel::MAX_NAME_LENGTH_LEGACY;

/// PV name length ceiling this crate enforces when the extended
/// header form is available.
pub const MAX_NAME_LENGTH_EXTENDED: usize = channel::MAX_NAME_LENGTH_EXTENDED;
