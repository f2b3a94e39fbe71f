//! Per-circuit state machine.
//!
//! Tracks one sub-state per role (`CLIENT`, `SERVER`) on a single TCP
//! circuit. Every command observed on the circuit — sent or received —
//! is checked against both roles' transition tables using the same
//! command as the lookup key; a role's sub-state only moves if that
//! role's table has a rule for (current sub-state, command). A command
//! accepted by neither table is a protocol violation.
//!
//! `RESPONSIVE` is collapsed into `CONNECTED`: the distilled transition
//! table never distinguishes them (an established circuit is always
//! "responsive" until an echo timeout says otherwise), so there is no
//! observable state between them. See `DESIGN.md`.

use tracing::warn;

use crate::command::Command;
use crate::error::{CaprotoValueError, LocalProtocolError, RemoteProtocolError};
use crate::role::Role;

/// One role's view of a circuit's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitSubState {
    /// Circuit opened; `VersionRequest`/`VersionResponse` not yet seen
    /// for this role.
    Init,
    /// Version handshake complete for this role; live and responsive.
    Connected,
    /// An echo sent to this role's peer went unanswered past the
    /// caller's deadline.
    Unresponsive,
    /// Terminal. No further commands are legal.
    Disconnected,
}

impl CircuitSubState {
    pub fn is_connected(self) -> bool {
        matches!(self, CircuitSubState::Connected)
    }

    pub fn is_disconnected(self) -> bool {
        matches!(self, CircuitSubState::Disconnected)
    }
}

impl std::fmt::Display for CircuitSubState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitSubState::Init => write!(f, "INIT"),
            CircuitSubState::Connected => write!(f, "CONNECTED"),
            CircuitSubState::Unresponsive => write!(f, "UNRESPONSIVE"),
            CircuitSubState::Disconnected => write!(f, "DISCONNECTED"),
        }
    }
}

fn client_transition(current: CircuitSubState, cmd: &Command) -> Option<CircuitSubState> {
    use CircuitSubState::*;
    match (current, cmd) {
        (Init, Command::VersionRequest { .. }) => Some(Connected),
        (Connected, Command::EchoRequest | Command::EchoResponse) => Some(Connected),
        (Unresponsive, Command::EchoResponse) => Some(Connected),
        _ => None,
    }
}

fn server_transition(current: CircuitSubState, cmd: &Command) -> Option<CircuitSubState> {
    use CircuitSubState::*;
    match (current, cmd) {
        (Init, Command::VersionResponse { .. }) => Some(Connected),
        (Connected, Command::EchoRequest | Command::EchoResponse) => Some(Connected),
        (Unresponsive, Command::EchoResponse) => Some(Connected),
        _ => None,
    }
}

fn transition_for(role: Role, current: CircuitSubState, cmd: &Command) -> Option<CircuitSubState> {
    match role {
        Role::Client => client_transition(current, cmd),
        Role::Server => server_transition(current, cmd),
    }
}

/// The full circuit state machine: one sub-state per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitState {
    client: CircuitSubState,
    server: CircuitSubState,
}

impl CircuitState {
    pub fn new() -> Self {
        Self {
            client: CircuitSubState::Init,
            server: CircuitSubState::Init,
        }
    }

    pub fn state_of(&self, role: Role) -> CircuitSubState {
        match role {
            Role::Client => self.client,
            Role::Server => self.server,
        }
    }

    /// True once both roles have completed the version handshake.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected() && self.server.is_connected()
    }

    pub fn is_disconnected(&self) -> bool {
        self.client.is_disconnected() || self.server.is_disconnected()
    }

    /// Validate and, if legal, apply the effect of `cmd` having been
    /// produced by `originator`.
    ///
    /// Both roles' tables are consulted with the same command; a role
    /// whose table has no rule for its current state simply does not
    /// move. If *neither* table has a rule, the command is illegal:
    /// a `LocalProtocolError` if `originator` is `us`, else a
    /// `RemoteProtocolError`.
    pub fn process(
        &mut self,
        cmd: &Command,
        originator: Role,
        us: Role,
    ) -> Result<(), CircuitStateError> {
        if self.is_disconnected() {
            return Err(self.violation(cmd, originator, us, "circuit is disconnected"));
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
    ) -> CircuitStateError {
        warn!(command = cmd.name(), %originator, detail, "circuit protocol violation");
        if originator == us {
            CircuitStateError::Local(LocalProtocolError::for_command(
                cmd.name(),
                detail.to_string(),
            ))
        } else {
            CircuitStateError::Remote(RemoteProtocolError::new(format!(
                "{}: {detail}",
                cmd.name()
            )))
        }
    }

    /// Mark a role's side unresponsive after the caller's echo timeout
    /// heuristic fires. Not triggered by any wire command — the core
    /// has no clock of its own.
    pub fn mark_unresponsive(&mut self, role: Role) {
        let sub = match role {
            Role::Client => &mut self.client,
            Role::Server => &mut self.server,
        };
        if *sub == CircuitSubState::Connected {
            *sub = CircuitSubState::Unresponsive;
        }
    }

    /// Force the circuit to `DISCONNECTED` for both roles. Terminal;
    /// the caller is expected to drop the `VirtualCircuit` afterward.
    pub fn disconnect(&mut self) {
        self.client = CircuitSubState::Disconnected;
        self.server = CircuitSubState::Disconnected;
    }
}

impl Default for CircuitState {
    fn default() -> Self {
        Self::new()
    }
}

/// Error raised by [`CircuitState::process`].
#[derive(Debug, thiserror::Error)]
pub enum CircuitStateError {
    #[error("{0}")]
    Local(#[from] LocalProtocolError),
    #[error("{0}")]
    Remote(#[from] RemoteProtocolError),
}

/// Validate a circuit priority is within the legal range.
pub fn validate_priority(priority: u16) -> Result<(), CaprotoValueError> {
    if priority > 99 {
        Err(CaprotoValueError::new(
            "priority",
            format!("priority {priority} is out of range [0, 99]"),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_init() {
        let state = CircuitState::new();
        assert_eq!(state.state_of(Role::Client), CircuitSubState::Init);
        assert_eq!(state.state_of(Role::Server), CircuitSubState::Init);
        assert!(!state.is_connected());
    }

    #[test]
    fn version_request_connects_client_only() {
        let mut state = CircuitState::new();
        state
            .process(
                &Command::VersionRequest { priority: 0, version: 13 },
                Role::Client,
                Role::Client,
            )
            .unwrap();
        assert_eq!(state.state_of(Role::Client), CircuitSubState::Connected);
        assert_eq!(state.state_of(Role::Server), CircuitSubState::Init);
        assert!(!state.is_connected());
    }

    #[test]
    fn full_handshake_connects_both() {
        let mut state = CircuitState::new();
        state
            .process(
                &Command::VersionRequest { priority: 0, version: 13 },
                Role::Client,
                Role::Client,
            )
            .unwrap();
        state
            .process(
                &Command::VersionResponse { version: 13 },
                Role::Server,
                Role::Client,
            )
            .unwrap();
        assert!(state.is_connected());
    }

    #[test]
    fn unresponsive_clears_on_echo_response() {
        let mut state = CircuitState::new();
        state
            .process(
                &Command::VersionRequest { priority: 0, version: 13 },
                Role::Client,
                Role::Client,
            )
            .unwrap();
        state.mark_unresponsive(Role::Client);
        assert_eq!(state.state_of(Role::Client), CircuitSubState::Unresponsive);
        state
            .process(&Command::EchoResponse, Role::Client, Role::Client)
            .unwrap();
        assert_eq!(state.state_of(Role::Client), CircuitSubState::Connected);
    }

    #[test]
    fn illegal_command_before_handshake_is_local_error() {
        let mut state = CircuitState::new();
        let err = state
            .process(
                &Command::EchoRequest,
                Role::Client,
                Role::Client,
            )
            .unwrap_err();
        assert!(matches!(err, CircuitStateError::Local(_)));
    }

    #[test]
    fn illegal_peer_command_is_remote_error() {
        let mut state = CircuitState::new();
        let err = state
            .process(&Command::EchoRequest, Role::Server, Role::Client)
            .unwrap_err();
        assert!(matches!(err, CircuitStateError::Remote(_)));
    }

    #[test]
    fn disconnect_is_terminal() {
        let mut state = CircuitState::new();
        state.disconnect();
        assert!(state.is_disconnected());
        let err = state
            .process(
                &Command::VersionRequest { priority: 0, version: 13 },
                Role::Client,
                Role::Client,
            )
            .unwrap_err();
        assert!(matches!(err, CircuitStateError::Local(_)));
    }

    #[test]
    fn priority_validation() {
        assert!(validate_priority(0).is_ok());
        assert!(validate_priority(99).is_ok());
        assert!(validate_priority(100).is_err());
    }
}
