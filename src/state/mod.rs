//! The two layered state machines the spec calls for: one per circuit,
//! one per channel. Each tracks an independent sub-state per role and
//! validates every command against both roles' transition tables.

pub mod channel;
pub mod circuit;

pub use channel::{ChannelState, ChannelStateError, ChannelSubState};
pub use circuit::{CircuitState, CircuitStateError, CircuitSubState};
