//! Per-channel state machine.
//!
//! Like [`crate::state::circuit::CircuitState`], this tracks one
//! sub-state per role, advanced independently by each role's
//! transition table keyed on the same command. `ChannelState` only
//! ever sees commands that are scoped to one channel (by `cid`/`sid`);
//! the `VirtualCircuit` is responsible for routing.

use tracing::warn;

use crate::command::Command;
use crate::error::{LocalProtocolError, RemoteProtocolError};
use crate::role::Role;

/// One role's view of a channel's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSubState {
    NeverConnected,
    SendSearchRequest,
    AwaitSearchResponse,
    SendCreateRequest,
    AwaitCreateResponse,
    Connected,
    MustClose,
    Closed,
    Destroyed,
}

impl std::fmt::Display for ChannelSubState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ChannelSubState::*;
        let s = match self {
            NeverConnected => "NEVER_CONNECTED",
            SendSearchRequest => "SEND_SEARCH_REQUEST",
            AwaitSearchResponse => "AWAIT_SEARCH_RESPONSE",
            SendCreateRequest => "SEND_CREATE_REQUEST",
            AwaitCreateResponse => "AWAIT_CREATE_RESPONSE",
            Connected => "CONNECTED",
            MustClose => "MUST_CLOSE",
            Closed => "CLOSED",
            Destroyed => "DESTROYED",
        };
        write!(f, "{s}")
    }
}

impl ChannelSubState {
    pub fn is_connected(self) -> bool {
        matches!(self, ChannelSubState::Connected)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ChannelSubState::Closed | ChannelSubState::Destroyed)
    }
}

/// Commands that merely confirm a channel already in `Connected`
/// remains there: reads, writes, and subscription traffic don't
/// change the channel's lifecycle phase.
fn is_data_traffic(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::ReadNotifyRequest { .. }
            | Command::ReadNotifyResponse { .. }
            | Command::WriteRequest { .. }
            | Command::WriteNotifyRequest { .. }
            | Command::WriteNotifyResponse { .. }
            | Command::EventAddRequest { .. }
            | Command::EventAddResponse { .. }
            | Command::EventCancelRequest { .. }
            | Command::EventCancelResponse { .. }
            | Command::AccessRightsResponse { .. }
    )
}

fn client_transition(current: ChannelSubState, cmd: &Command) -> Option<ChannelSubState> {
    use ChannelSubState::*;
    if current == Connected && is_data_traffic(cmd) {
        return Some(Connected);
    }
    match (current, cmd) {
        (NeverConnected | SendSearchRequest, Command::SearchRequest { .. }) => {
            Some(AwaitSearchResponse)
        }
        (AwaitSearchResponse, Command::SearchResponse { .. }) => Some(SendCreateRequest),
        (AwaitSearchResponse, Command::NotFoundResponse { .. }) => Some(Closed),
        (SendCreateRequest, Command::CreateChannelRequest { .. }) => Some(AwaitCreateResponse),
        (AwaitCreateResponse, Command::CreateChannelResponse { .. }) => Some(Connected),
        (AwaitCreateResponse, Command::CreateChannelFailure { .. }) => Some(Closed),
        (Connected, Command::ClearChannelRequest { .. }) => Some(MustClose),
        (MustClose, Command::ClearChannelResponse { .. }) => Some(Closed),
        (Connected, Command::ServerDisconnResponse { .. }) => Some(Closed),
        _ => None,
    }
}

fn server_transition(current: ChannelSubState, cmd: &Command) -> Option<ChannelSubState> {
    use ChannelSubState::*;
    if current == Connected && is_data_traffic(cmd) {
        return Some(Connected);
    }
    match (current, cmd) {
        (NeverConnected, Command::SearchRequest { .. }) => Some(NeverConnected),
        (NeverConnected, Command::CreateChannelRequest { .. }) => Some(AwaitCreateResponse),
        (AwaitCreateResponse, Command::CreateChannelResponse { .. }) => Some(Connected),
        (AwaitCreateResponse, Command::CreateChannelFailure { .. }) => Some(Closed),
        (Connected, Command::ClearChannelRequest { .. }) => Some(MustClose),
        (MustClose, Command::ClearChannelResponse { .. }) => Some(Closed),
        (Connected, Command::ServerDisconnResponse { .. }) => Some(Closed),
        _ => None,
    }
}

fn transition_for(role: Role, current: ChannelSubState, cmd: &Command) -> Option<ChannelSubState> {
    match role {
        Role::Client => client_transition(current, cmd),
        Role::Server => server_transition(current, cmd),
    }
}

/// The full channel state machine: one sub-state per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    client: ChannelSubState,
    server: ChannelSubState,
}

impl ChannelState {
    pub fn new() -> Self {
        Self {
            client: ChannelSubState::NeverConnected,
            server: ChannelSubState::NeverConnected,
        }
    }

    pub fn state_of(&self, role: Role) -> ChannelSubState {
        match role {
            Role::Client => self.client,
            Role::Server => self.server,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected() && self.server.is_connected()
    }

    /// Validate and, if legal, apply the effect of `cmd` having been
    /// produced by `originator`. Mirrors
    /// [`crate::state::circuit::CircuitState::process`]: both roles'
    /// tables are consulted; neither matching is a protocol violation.
    pub fn process(
        &mut self,
        cmd: &Command,
        originator: Role,
        us: Role,
    ) -> Result<(), ChannelStateError> {
        if self.client.is_terminal() || self.server.is_terminal() {
            return Err(self.violation(cmd, originator, us, "channel is closed"));
        }

        let next_client = transition_for(Role::Client, self.client, cmd);
        let next_server = transition_for(Role::Server, self.server, cmd);

        if next_client.is_none() && next_server.is_none() {
            return Err(self.violation(
                cmd,
                originator,
                us,
                &format!(
                    "not legal in states (client={}, server={})",
                    self.client, self.server
                ),
            ));
        }

        if let Some(s) = next_client {
            self.client = s;
        }
        if let Some(s) = next_server {
            self.server = s;
        }
        Ok(())
    }

    fn violation(
        &self,
        cmd: &Command,
        originator: Role,
        us: Role,
        detail: &str,
    ) -> ChannelStateError {
        warn!(command = cmd.name(), %originator, detail, "channel protocol violation");
        if originator == us {
            ChannelStateError::Local(LocalProtocolError::for_command(
                cmd.name(),
                detail.to_string(),
            ))
        } else {
            ChannelStateError::Remote(RemoteProtocolError::new(format!(
                "{}: {detail}",
                cmd.name()
            )))
        }
    }

    /// Mark both roles `DESTROYED`. Terminal; used when the owning
    /// `VirtualCircuit` drops the channel outright.
    pub fn destroy(&mut self) {
        self.client = ChannelSubState::Destroyed;
        self.server = ChannelSubState::Destroyed;
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Error raised by [`ChannelState::process`].
#[derive(Debug, thiserror::Error)]
pub enum ChannelStateError {
    #[error("{0}")]
    Local(#[from] LocalProtocolError),
    #[error("{0}")]
    Remote(#[from] RemoteProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SearchReplyPolicy;

    #[test]
    fn starts_never_connected() {
        let state = ChannelState::new();
        assert_eq!(state.state_of(Role::Client), ChannelSubState::NeverConnected);
    }

    #[test]
    fn happy_path_to_connected() {
        let mut state = ChannelState::new();
        state
            .process(
                &Command::SearchRequest {
                    name: "simple:A".into(),
                    cid: 0,
                    version: 13,
                    reply: SearchReplyPolicy::ReplyRequired,
                },
                Role::Client,
                Role::Client,
            )
            .unwrap();
        assert_eq!(
            state.state_of(Role::Client),
            ChannelSubState::AwaitSearchResponse
        );

        state
            .process(
                &Command::SearchResponse {
                    port: 5064,
                    cid: 0,
                    version: 13,
                },
                Role::Server,
                Role::Client,
            )
            .unwrap();
        assert_eq!(state.state_of(Role::Client), ChannelSubState::SendCreateRequest);

        state
            .process(
                &Command::CreateChannelRequest {
                    name: "simple:A".into(),
                    cid: 0,
                    version: 13,
                },
                Role::Client,
                Role::Client,
            )
            .unwrap();
        assert_eq!(
            state.state_of(Role::Client),
            ChannelSubState::AwaitCreateResponse
        );

        state
            .process(
                &Command::CreateChannelResponse {
                    data_type: 6,
                    data_count: 1,
                    cid: 0,
                    sid: 17,
                },
                Role::Server,
                Role::Client,
            )
            .unwrap();
        assert!(state.is_connected());
    }

    #[test]
    fn read_before_connected_is_illegal() {
        let mut state = ChannelState::new();
        let err = state
            .process(
                &Command::ReadNotifyRequest {
                    data_type: crate::dbr::DbrType::Double,
                    data_count: 1,
                    sid: 17,
                    ioid: 0,
                },
                Role::Client,
                Role::Client,
            )
            .unwrap_err();
        assert!(matches!(err, ChannelStateError::Local(_)));
    }

    #[test]
    fn server_disconnect_closes_channel() {
        let mut state = ChannelState::new();
        state.client = ChannelSubState::Connected;
        state.server = ChannelSubState::Connected;
        state
            .process(
                &Command::ServerDisconnResponse { cid: 0 },
                Role::Server,
                Role::Client,
            )
            .unwrap();
        assert_eq!(state.state_of(Role::Client), ChannelSubState::Closed);
    }

    #[test]
    fn destroy_is_terminal() {
        let mut state = ChannelState::new();
        state.destroy();
        let err = state
            .process(
                &Command::SearchRequest {
                    name: "x".into(),
                    cid: 0,
                    version: 13,
                    reply: SearchReplyPolicy::ReplyRequired,
                },
                Role::Client,
                Role::Client,
            )
            .unwrap_err();
        assert!(matches!(err, ChannelStateError::Local(_)));
    }
}
