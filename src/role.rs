//! The two participant roles in a Channel Access conversation.
//!
//! Every `VirtualCircuit`, `Broadcaster`, and the state machines they
//! own track state for both roles independently, regardless of which
//! one the local process is actually playing.

use crate::error::CaprotoValueError;

/// Which side of the protocol a participant is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    /// The opposite role.
    pub fn other(self) -> Role {
        match self {
            Role::Client => Role::Server,
            Role::Server => Role::Client,
        }
    }

    pub fn is_client(self) -> bool {
        matches!(self, Role::Client)
    }

    pub fn is_server(self) -> bool {
        matches!(self, Role::Server)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "CLIENT"),
            Role::Server => write!(f, "SERVER"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = CaprotoValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CLIENT" => Ok(Role::Client),
            "SERVER" => Ok(Role::Server),
            other => Err(CaprotoValueError::new(
                "role",
                format!("expected CLIENT or SERVER, got {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_is_involution() {
        assert_eq!(Role::Client.other(), Role::Server);
        assert_eq!(Role::Server.other(), Role::Client);
        assert_eq!(Role::Client.other().other(), Role::Client);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("client".parse::<Role>().unwrap(), Role::Client);
        assert_eq!("SERVER".parse::<Role>().unwrap(), Role::Server);
        assert!("peer".parse::<Role>().is_err());
    }
}
