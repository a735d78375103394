use std::time::Duration;

use crate::ship::ShipDef;

pub const BOARD_SIZE: u8 = 10;
pub const NUM_SHIPS: usize = 5;
pub const SHIPS: [ShipDef; NUM_SHIPS] = [
    ShipDef::new("Destroyer", 2),
    ShipDef::new("Submarine", 3),
    ShipDef::new("Cruiser", 3),
    ShipDef::new("Battleship", 4),
    ShipDef::new("Aircraft Carrier", 5),
];

/// Port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 9850;

/// Client receive timeout. Huge, since the opponent may think for a long time.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(1000);

/// Maximum payload size (10 MB) accepted from a peer.
pub const MAX_PAYLOAD_SIZE: usize = 10_000_000;

/// Board dimension and fleet template shared by both participants of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub board_size: u8,
    pub fleet: Vec<ShipDef>,
}

impl GameConfig {
    pub fn new(board_size: u8, fleet: Vec<ShipDef>) -> Self {
        Self { board_size, fleet }
    }

    /// Look up a fleet entry by ship name.
    pub fn ship_def(&self, name: &str) -> Option<ShipDef> {
        self.fleet.iter().copied().find(|def| def.name() == name)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(BOARD_SIZE, SHIPS.to_vec())
    }
}

/// Safeguards applied to every framed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// `None` waits for the peer forever.
    pub receive_timeout: Option<Duration>,
    pub max_payload: usize,
}

impl TransportConfig {
    /// Same payload cap, no receive deadline. The server waits on a thinking
    /// player for as long as it takes.
    pub fn without_timeout() -> Self {
        Self {
            receive_timeout: None,
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            receive_timeout: Some(DEFAULT_RECEIVE_TIMEOUT),
            max_payload: MAX_PAYLOAD_SIZE,
        }
    }
}

/// Everything the server needs to host one game.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub game: GameConfig,
    pub transport: TransportConfig,
    /// Stop after this many rounds; `None` keeps offering rematches.
    pub rounds: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: format!("0.0.0.0:{DEFAULT_PORT}"),
            game: GameConfig::default(),
            transport: TransportConfig::without_timeout(),
            rounds: None,
        }
    }
}
