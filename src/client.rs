//! Client-side mirror of the server's turn state.
//!
//! The session never decides whose turn it is on its own: it only moves to
//! [`Mode::SelectingMove`] when the server says so, and goes back to
//! [`Mode::AwaitingOpponent`] as soon as its own shot is resolved. Inbound
//! messages arrive through an [`Inbox`], so a render loop can call
//! [`ClientSession::poll`] every tick without ever blocking.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::ToSocketAddrs;

use serde_json::Value;

use crate::board::{Board, ShotLog};
use crate::common::{BoardError, Point};
use crate::config::{GameConfig, TransportConfig};
use crate::protocol::{self, BoardDump, Notice, ProtocolError};
use crate::ship::Ship;
use crate::transport::{FrameWriter, Inbox, StreamTransport, TcpTransport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("invalid fleet: {0}")]
    Fleet(#[from] BoardError),
    #[error("not your turn")]
    NotYourTurn,
    #[error("{0} is off the board")]
    OutOfBounds(Point),
    #[error("{0} was already targeted")]
    AlreadyTargeted(Point),
    #[error("the round is not over")]
    RoundNotOver,
    #[error("a round is in progress; finish it before placing a new fleet")]
    RoundInProgress,
    #[error("boards were already exchanged for this round")]
    AlreadyRevealed,
    #[error("board size has not been received")]
    NoBoardSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    AwaitingOpponent,
    SelectingMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Won,
    Lost,
}

/// Where the session is in the round cycle.
///
/// `Setup` → `Playing` (fleet sent) → `Over` (won/lost notice) → `Revealed`
/// (boards exchanged) → `Playing` again on the next fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Setup,
    Playing,
    Over,
    Revealed,
}

/// What changed after handling one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Nothing to handle this tick.
    Idle,
    /// Both fleets are in; the round is about to start.
    Started,
    /// Our turn. Carries the opponent's shot at our fleet, if there was one,
    /// and whether it hit.
    YourTurn { opponent_shot: Option<(Point, bool)> },
    RoundOver(RoundOutcome),
}

/// Result of one of our own shots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotReport {
    pub target: Point,
    pub hit: bool,
    pub sunk: Option<String>,
}

pub struct ClientSession<W> {
    writer: FrameWriter<W>,
    inbox: Inbox,
    config: GameConfig,
    board_size: Option<u8>,
    fleet: Board,
    /// Opponent shots at our fleet.
    own_shots: ShotLog,
    /// Our shots at the opponent.
    opponent_shots: ShotLog,
    mode: Mode,
    round: RoundPhase,
    outcome: Option<RoundOutcome>,
    last_sunk: Option<String>,
    revealed: Option<BoardDump>,
}

pub type TcpClient = ClientSession<OwnedWriteHalf>;

impl TcpClient {
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        config: GameConfig,
        transport: TransportConfig,
    ) -> Result<Self, ClientError> {
        let stream = tokio::net::TcpStream::connect(addr)
            .await
            .map_err(TransportError::from)?;
        Ok(Self::new(TcpTransport::with_config(stream, transport), config))
    }
}

impl<W: AsyncWrite + Unpin + Send> ClientSession<W> {
    /// Take over `transport`; its read half moves to a background inbox task.
    pub fn new<R>(transport: StreamTransport<R, W>, config: GameConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (reader, writer) = transport.into_split();
        Self {
            writer,
            inbox: Inbox::spawn(reader),
            fleet: Board::new(config.board_size),
            config,
            board_size: None,
            own_shots: ShotLog::new(),
            opponent_shots: ShotLog::new(),
            mode: Mode::AwaitingOpponent,
            round: RoundPhase::Setup,
            outcome: None,
            last_sunk: None,
            revealed: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn round_phase(&self) -> RoundPhase {
        self.round
    }

    pub fn board_size(&self) -> Option<u8> {
        self.board_size
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Our own ships, with the opponent's hits applied.
    pub fn fleet(&self) -> &Board {
        &self.fleet
    }

    pub fn own_shots(&self) -> &ShotLog {
        &self.own_shots
    }

    pub fn opponent_shots(&self) -> &ShotLog {
        &self.opponent_shots
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    /// Name of the last opponent ship our shots sank this round.
    pub fn last_sunk(&self) -> Option<&str> {
        self.last_sunk.as_deref()
    }

    /// The opponent's board, once exchanged at the end of the round.
    pub fn revealed_opponent(&self) -> Option<&BoardDump> {
        self.revealed.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        !self.inbox.has_failed()
    }

    /// Whether `target` may be fired at now.
    pub fn can_target(&self, target: Point) -> bool {
        self.mode == Mode::SelectingMove
            && self.outcome.is_none()
            && self.board_size.is_some_and(|size| target.within(size))
            && !self.opponent_shots.is_targeted(target)
    }

    /// Wait for the board size the server sends right after connecting.
    pub async fn receive_board_size(&mut self) -> Result<u8, ClientError> {
        let size = protocol::parse_board_size(self.inbox.next().await?)?;
        log::info!("board size is {}", size);
        self.board_size = Some(size);
        self.config.board_size = size;
        self.fleet = Board::new(size);
        Ok(size)
    }

    /// Send our fleet for the next round and reset per-round state.
    ///
    /// Only before the first round or once the boards of the last round have
    /// been exchanged; anywhere else the server expects a different message.
    pub async fn submit_fleet(&mut self, ships: Vec<Ship>) -> Result<(), ClientError> {
        let size = self.board_size.ok_or(ClientError::NoBoardSize)?;
        if !matches!(self.round, RoundPhase::Setup | RoundPhase::Revealed) {
            return Err(ClientError::RoundInProgress);
        }
        Board::validate_fleet(&ships, &self.config)?;
        self.writer
            .write_value(&protocol::fleet_placement(&ships))
            .await?;

        self.fleet = Board::with_ships(size, ships);
        self.own_shots.clear();
        self.opponent_shots.clear();
        self.mode = Mode::AwaitingOpponent;
        self.round = RoundPhase::Playing;
        self.outcome = None;
        self.last_sunk = None;
        self.revealed = None;
        Ok(())
    }

    /// Handle at most one queued message without waiting. Call once per tick.
    pub fn poll(&mut self) -> Result<Update, ClientError> {
        if !self.is_listening() {
            return Ok(Update::Idle);
        }
        match self.inbox.try_next() {
            Some(received) => self.handle(received?),
            None => Ok(Update::Idle),
        }
    }

    /// Wait for the next message and handle it.
    pub async fn next_update(&mut self) -> Result<Update, ClientError> {
        if !self.is_listening() {
            return Ok(Update::Idle);
        }
        let value = self.inbox.next().await?;
        self.handle(value)
    }

    /// Fire at `target`, wait for the hit and sunk reports, and hand the turn back.
    pub async fn fire(&mut self, target: Point) -> Result<ShotReport, ClientError> {
        if self.mode != Mode::SelectingMove || self.outcome.is_some() {
            return Err(ClientError::NotYourTurn);
        }
        let size = self.board_size.ok_or(ClientError::NoBoardSize)?;
        if !target.within(size) {
            return Err(ClientError::OutOfBounds(target));
        }
        if self.opponent_shots.is_targeted(target) {
            return Err(ClientError::AlreadyTargeted(target));
        }

        self.writer.write_value(&target).await?;
        let hit = protocol::parse_hit(self.inbox.next().await?)?;
        let sunk = protocol::parse_sink(self.inbox.next().await?)?;

        self.opponent_shots.record(target, hit);
        if let Some(name) = &sunk {
            log::info!("sunk {}", name);
            self.last_sunk = Some(name.clone());
        }
        self.mode = Mode::AwaitingOpponent;
        Ok(ShotReport { target, hit, sunk })
    }

    /// Reveal our board and receive the opponent's. Once per finished round.
    pub async fn finish_round(&mut self) -> Result<BoardDump, ClientError> {
        match self.round {
            RoundPhase::Over => {}
            RoundPhase::Revealed => return Err(ClientError::AlreadyRevealed),
            RoundPhase::Setup | RoundPhase::Playing => return Err(ClientError::RoundNotOver),
        }
        let ours = BoardDump::new(&self.fleet, &self.own_shots);
        self.writer.write_value(&ours).await?;
        let theirs: BoardDump = protocol::decode(self.inbox.next().await?)?;
        self.revealed = Some(theirs.clone());
        self.round = RoundPhase::Revealed;
        Ok(theirs)
    }

    /// Stop the background reader.
    pub fn shutdown(self) {
        self.inbox.cancel();
    }

    fn is_listening(&self) -> bool {
        self.round == RoundPhase::Playing && self.mode == Mode::AwaitingOpponent
    }

    fn handle(&mut self, value: Value) -> Result<Update, ClientError> {
        if value.as_str() == Some(protocol::STARTING) {
            return Ok(Update::Started);
        }
        let update = match Notice::from_value(value)? {
            Notice::YourMove => {
                self.mode = Mode::SelectingMove;
                Update::YourTurn {
                    opponent_shot: None,
                }
            }
            Notice::OpponentMove(p) => {
                let hit = self.replay(p);
                self.mode = Mode::SelectingMove;
                Update::YourTurn {
                    opponent_shot: Some((p, hit)),
                }
            }
            Notice::Won => {
                self.outcome = Some(RoundOutcome::Won);
                self.round = RoundPhase::Over;
                Update::RoundOver(RoundOutcome::Won)
            }
            Notice::Lost(p) => {
                self.replay(p);
                self.outcome = Some(RoundOutcome::Lost);
                self.round = RoundPhase::Over;
                Update::RoundOver(RoundOutcome::Lost)
            }
        };
        log::debug!("{:?}", update);
        Ok(update)
    }

    /// Apply an opponent shot to our fleet, the same way the server resolved it.
    fn replay(&mut self, p: Point) -> bool {
        let hit = self.fleet.fire_at(p.x, p.y).is_some();
        self.own_shots.record(p, hit);
        hit
    }
}
