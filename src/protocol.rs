//! Messages exchanged between the server and its two participants.
//!
//! The wire format is plain JSON: bare strings for status words, arrays for
//! shots and fleet placements, objects for turn notices and board dumps.

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use crate::board::{Board, ShotLog, ShotOutcome};
use crate::common::Point;
use crate::ship::Ship;

/// Sent to both participants once both fleets are in.
pub const STARTING: &str = "starting";
/// Sent to participant 0 when a round opens: take the first shot.
pub const YOUR_MOVE: &str = "waiting for move";
pub const HIT: &str = "hit";
pub const MISS: &str = "miss";
pub const NO_SHIP_SANK: &str = "no ship sank";
const SUNK_PREFIX: &str = "sunk ";
pub const YOU_WON: &str = "You won";
pub const YOU_LOST: &str = "You lost";

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("expected {expected}, got {got}")]
    UnexpectedMessage { expected: &'static str, got: Value },
    #[error("invalid board size {0:?}")]
    InvalidBoardSize(String),
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProtocolError {
    pub fn unexpected(expected: &'static str, got: Value) -> Self {
        ProtocolError::UnexpectedMessage { expected, got }
    }
}

/// Decode a received value into a typed message.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ProtocolError> {
    Ok(serde_json::from_value(value)?)
}

/// Board size announcement, sent as a decimal string.
pub fn board_size_message(size: u8) -> Value {
    Value::String(size.to_string())
}

pub fn parse_board_size(value: Value) -> Result<u8, ProtocolError> {
    match value {
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| ProtocolError::InvalidBoardSize(text)),
        other => Err(ProtocolError::unexpected("board size", other)),
    }
}

/// One ship of a fleet placement: `["Cruiser", [x, y], [x, y], [x, y]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipPlacement {
    pub name: String,
    pub cells: Vec<Point>,
}

impl Serialize for ShipPlacement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.cells.len() + 1))?;
        seq.serialize_element(&self.name)?;
        for cell in &self.cells {
            seq.serialize_element(cell)?;
        }
        seq.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlacementItem {
    Name(String),
    Cell(Point),
}

impl<'de> Deserialize<'de> for ShipPlacement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut items = Vec::<PlacementItem>::deserialize(deserializer)?.into_iter();
        let name = match items.next() {
            Some(PlacementItem::Name(name)) => name,
            _ => return Err(D::Error::custom("ship entry must start with the ship name")),
        };
        let cells = items
            .map(|item| match item {
                PlacementItem::Cell(p) => Ok(p),
                PlacementItem::Name(other) => Err(D::Error::custom(format!(
                    "unexpected name {other:?} inside the cells of {name:?}"
                ))),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { name, cells })
    }
}

impl From<&Ship> for ShipPlacement {
    fn from(ship: &Ship) -> Self {
        Self {
            name: ship.name().to_string(),
            cells: ship.cells().collect(),
        }
    }
}

impl From<ShipPlacement> for Ship {
    fn from(placement: ShipPlacement) -> Self {
        Ship::new(placement.name, placement.cells)
    }
}

/// Whole fleet as sent by a participant during setup.
pub type FleetPlacement = Vec<ShipPlacement>;

pub fn fleet_placement(ships: &[Ship]) -> FleetPlacement {
    ships.iter().map(ShipPlacement::from).collect()
}

/// Wire form of a turn notice: `{"game_status": ..., "move": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnNotice {
    pub game_status: Option<String>,
    #[serde(rename = "move")]
    pub shot: Option<Point>,
}

/// What the non-mover (or, at the end, both sides) learns after a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Round opens and you shoot first.
    YourMove,
    /// The opponent fired at you; your turn now.
    OpponentMove(Point),
    /// Your last shot sank the opponent's fleet.
    Won,
    /// The opponent's shot at this point sank your fleet.
    Lost(Point),
}

impl Notice {
    pub fn to_value(self) -> Value {
        match self {
            Notice::YourMove => Value::String(YOUR_MOVE.to_string()),
            Notice::OpponentMove(p) => json!({ "game_status": null, "move": p }),
            Notice::Won => json!({ "game_status": YOU_WON, "move": null }),
            Notice::Lost(p) => json!({ "game_status": YOU_LOST, "move": p }),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        if value.as_str() == Some(YOUR_MOVE) {
            return Ok(Notice::YourMove);
        }
        let notice: TurnNotice = match serde_json::from_value(value.clone()) {
            Ok(notice) => notice,
            Err(_) => return Err(ProtocolError::unexpected("turn notice", value)),
        };
        match (notice.game_status.as_deref(), notice.shot) {
            (None, Some(p)) => Ok(Notice::OpponentMove(p)),
            (Some(YOU_WON), _) => Ok(Notice::Won),
            (Some(YOU_LOST), Some(p)) => Ok(Notice::Lost(p)),
            _ => Err(ProtocolError::unexpected("turn notice", value)),
        }
    }
}

impl ShotOutcome {
    /// First reply to the mover: `"hit"` or `"miss"`.
    pub fn hit_message(&self) -> &'static str {
        if self.is_hit() {
            HIT
        } else {
            MISS
        }
    }

    /// Second reply to the mover: `"sunk <Name>"` or `"no ship sank"`.
    pub fn sink_message(&self) -> String {
        match self {
            ShotOutcome::Sunk(name) => format!("{SUNK_PREFIX}{name}"),
            _ => NO_SHIP_SANK.to_string(),
        }
    }
}

pub fn parse_hit(value: Value) -> Result<bool, ProtocolError> {
    match value.as_str() {
        Some(HIT) => Ok(true),
        Some(MISS) => Ok(false),
        _ => Err(ProtocolError::unexpected("\"hit\" or \"miss\"", value)),
    }
}

/// Name of the ship reported sunk, `None` for `"no ship sank"`.
pub fn parse_sink(value: Value) -> Result<Option<String>, ProtocolError> {
    if let Some(text) = value.as_str() {
        if text == NO_SHIP_SANK {
            return Ok(None);
        }
        if let Some(name) = text.strip_prefix(SUNK_PREFIX) {
            return Ok(Some(name.to_string()));
        }
    }
    Err(ProtocolError::unexpected("sunk status", value))
}

/// A participant's board revealed at the end of a round.
///
/// `ships` are the sender's own ship cells, `hits`/`misses` the shots its
/// board received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDump {
    pub hits: Vec<Point>,
    pub misses: Vec<Point>,
    pub ships: Vec<Vec<Point>>,
}

impl BoardDump {
    pub fn new(board: &Board, received: &ShotLog) -> Self {
        Self {
            hits: received.hits().to_vec(),
            misses: received.misses().to_vec(),
            ships: board.ships().iter().map(|s| s.cells().collect()).collect(),
        }
    }

    pub fn shots(&self) -> ShotLog {
        ShotLog::from_parts(self.hits.clone(), self.misses.clone())
    }
}
