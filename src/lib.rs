mod autopilot;
mod board;
mod client;
mod common;
mod config;
mod game;
mod logging;
mod player;
pub mod protocol;
mod server;
mod ship;
pub mod transport;

pub use autopilot::*;
pub use board::*;
pub use client::*;
pub use common::*;
pub use config::*;
pub use game::*;
pub use logging::{init_logging, init_logging_with};
pub use player::*;
pub use protocol::{BoardDump, FleetPlacement, Notice, ProtocolError, ShipPlacement};
pub use server::*;
pub use ship::*;
pub use transport::{TcpTransport, Transport, TransportError};
