use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::board::Board;
use crate::game::GameError;
use crate::protocol;
use crate::ship::Ship;
use crate::transport::Transport;

/// Server-side session of one participant: its connection and its board.
pub struct Player {
    id: usize,
    transport: Box<dyn Transport>,
    board: Board,
}

impl Player {
    pub fn new(id: usize, transport: Box<dyn Transport>, board_size: u8) -> Self {
        Self {
            id,
            transport,
            board: Board::new(board_size),
        }
    }

    /// Participant index, 0 or 1.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn assign_ships(&mut self, ships: Vec<Ship>) {
        self.board.assign_ships(ships);
    }

    pub async fn send<T: Serialize + Sync + ?Sized>(&mut self, msg: &T) -> Result<(), GameError> {
        let value = serde_json::to_value(msg).map_err(|e| GameError::Protocol {
            player: self.id,
            source: e.into(),
        })?;
        self.send_value(&value).await
    }

    pub async fn send_value(&mut self, value: &Value) -> Result<(), GameError> {
        log::debug!("player {} <- {}", self.id, value);
        self.transport
            .send(value)
            .await
            .map_err(|source| GameError::Transport {
                player: self.id,
                source,
            })
    }

    pub async fn receive_value(&mut self) -> Result<Value, GameError> {
        let value = self
            .transport
            .recv()
            .await
            .map_err(|source| GameError::Transport {
                player: self.id,
                source,
            })?;
        log::debug!("player {} -> {}", self.id, value);
        Ok(value)
    }

    /// Receive one message and decode it as `T`.
    pub async fn receive<T: DeserializeOwned>(&mut self) -> Result<T, GameError> {
        let value = self.receive_value().await?;
        protocol::decode(value).map_err(|source| GameError::Protocol {
            player: self.id,
            source,
        })
    }
}
