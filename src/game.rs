//! Authoritative two-player game loop.
//!
//! The orchestrator owns both participants and is the only code that touches
//! their boards. It talks to them strictly in turn: setup, alternating shots
//! until a fleet is gone, board exchange, then the next round on the same
//! connections.

use serde_json::Value;

use crate::board::{Board, ShotOutcome};
use crate::common::{BoardError, Point};
use crate::config::GameConfig;
use crate::player::Player;
use crate::protocol::{self, BoardDump, FleetPlacement, Notice, ProtocolError};
use crate::ship::Ship;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("player {player}: {source}")]
    Transport {
        player: usize,
        #[source]
        source: TransportError,
    },
    #[error("player {player}: {source}")]
    Protocol {
        player: usize,
        #[source]
        source: ProtocolError,
    },
    #[error("player {player} sent an invalid fleet: {source}")]
    InvalidFleet {
        player: usize,
        #[source]
        source: BoardError,
    },
}

impl GameError {
    /// Participant whose connection or message caused the error.
    pub fn player(&self) -> usize {
        match self {
            GameError::Transport { player, .. }
            | GameError::Protocol { player, .. }
            | GameError::InvalidFleet { player, .. } => *player,
        }
    }
}

/// Where the orchestrator is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    InProgress,
    RoundOver,
    Terminated,
}

/// One resolved shot of the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotRecord {
    pub mover: usize,
    pub target: Point,
    pub outcome: ShotOutcome,
}

/// The other participant of the fixed two-player roster.
pub const fn opponent_of(index: usize) -> usize {
    match index {
        0 => 1,
        _ => 0,
    }
}

pub struct Game {
    players: [Player; 2],
    config: GameConfig,
    phase: Phase,
    history: Vec<ShotRecord>,
    rounds_played: usize,
}

impl Game {
    pub fn new(players: [Player; 2], config: GameConfig) -> Self {
        Self {
            players,
            config,
            phase: Phase::Setup,
            history: Vec::new(),
            rounds_played: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self, index: usize) -> &Player {
        &self.players[index]
    }

    /// Shots of the current (or last finished) round, in the order resolved.
    pub fn history(&self) -> &[ShotRecord] {
        &self.history
    }

    pub fn rounds_played(&self) -> usize {
        self.rounds_played
    }

    /// Play rounds until a connection fails or `rounds` have been completed.
    ///
    /// Any error is fatal: the game moves to [`Phase::Terminated`] and the
    /// error is returned.
    pub async fn run(&mut self, rounds: Option<usize>) -> Result<(), GameError> {
        self.send_board_size().await?;
        while rounds.map_or(true, |limit| self.rounds_played < limit) {
            let winner = self.run_round().await?;
            log::info!(
                "round {} won by player {} in {} shots",
                self.rounds_played,
                winner,
                self.history.len()
            );
        }
        Ok(())
    }

    /// Announce the board size to both participants. Done once per game.
    pub async fn send_board_size(&mut self) -> Result<(), GameError> {
        let size = protocol::board_size_message(self.config.board_size);
        let result = self.broadcast(&size).await;
        self.settle(result)
    }

    /// Setup, play and board exchange. Returns the winner's index.
    pub async fn run_round(&mut self) -> Result<usize, GameError> {
        self.collect_fleets().await?;
        let winner = self.play_round().await?;
        self.exchange_boards().await?;
        Ok(winner)
    }

    /// Receive and validate both fleets, then tell both sides the round starts.
    pub async fn collect_fleets(&mut self) -> Result<(), GameError> {
        self.phase = Phase::Setup;
        let result = self.collect_fleets_inner().await;
        self.settle(result)
    }

    async fn collect_fleets_inner(&mut self) -> Result<(), GameError> {
        for player in self.players.iter_mut() {
            let placement: FleetPlacement = player.receive().await?;
            let ships: Vec<Ship> = placement.into_iter().map(Ship::from).collect();
            Board::validate_fleet(&ships, &self.config).map_err(|source| GameError::InvalidFleet {
                player: player.id(),
                source,
            })?;
            log::info!("player {} placed {} ships", player.id(), ships.len());
            player.assign_ships(ships);
        }
        self.broadcast(&Value::String(protocol::STARTING.to_string()))
            .await
    }

    /// Alternate shots until one fleet is sunk. Returns the winner's index.
    pub async fn play_round(&mut self) -> Result<usize, GameError> {
        self.phase = Phase::InProgress;
        self.history.clear();
        let result = self.play_round_inner().await;
        self.settle(result)
    }

    async fn play_round_inner(&mut self) -> Result<usize, GameError> {
        self.players[0].send_value(&Notice::YourMove.to_value()).await?;

        let mut mover = 0;
        loop {
            let target_index = opponent_of(mover);
            let shot: Point = self.players[mover].receive().await?;
            let outcome = self.players[target_index].board_mut().resolve_shot(shot);
            log::debug!("player {} fired at {}: {:?}", mover, shot, outcome);

            self.players[mover].send(outcome.hit_message()).await?;
            self.players[mover].send(&outcome.sink_message()).await?;
            self.history.push(ShotRecord {
                mover,
                target: shot,
                outcome,
            });

            if self.players[target_index].board().is_lost() {
                self.players[mover].send_value(&Notice::Won.to_value()).await?;
                self.players[target_index]
                    .send_value(&Notice::Lost(shot).to_value())
                    .await?;
                self.phase = Phase::RoundOver;
                self.rounds_played += 1;
                return Ok(mover);
            }

            self.players[target_index]
                .send_value(&Notice::OpponentMove(shot).to_value())
                .await?;
            mover = target_index;
        }
    }

    /// Receive both board dumps and hand each to the other participant.
    pub async fn exchange_boards(&mut self) -> Result<(), GameError> {
        let result = self.exchange_boards_inner().await;
        self.settle(result)?;
        self.phase = Phase::Setup;
        Ok(())
    }

    async fn exchange_boards_inner(&mut self) -> Result<(), GameError> {
        let first: BoardDump = self.players[0].receive().await?;
        let second: BoardDump = self.players[1].receive().await?;
        self.players[1].send(&first).await?;
        self.players[0].send(&second).await
    }

    async fn broadcast(&mut self, value: &Value) -> Result<(), GameError> {
        for player in self.players.iter_mut() {
            player.send_value(value).await?;
        }
        Ok(())
    }

    fn settle<T>(&mut self, result: Result<T, GameError>) -> Result<T, GameError> {
        if let Err(e) = &result {
            log::error!("game terminated: {}", e);
            self.phase = Phase::Terminated;
        }
        result
    }
}
