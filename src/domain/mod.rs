//! Domain layer: the transaction record and its delivery state machine,
//! dispatch configuration, batch selection, and the ports the engine
//! depends on.

pub mod config;
pub mod ports;
pub mod selector;
pub mod transaction;
