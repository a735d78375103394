use std::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;
use tokio::io::AsyncWrite;
use tokio::time::{interval, MissedTickBehavior};

use crate::board::Board;
use crate::client::{ClientSession, Mode, RoundOutcome, Update};
use crate::common::Point;

/// Default tick rate, 60 per second.
pub const DEFAULT_TICK: Duration = Duration::from_micros(16_667);

/// Headless player: random fleet, random untargeted shots, one poll per tick.
pub struct Autopilot {
    rng: SmallRng,
    tick: Duration,
}

impl Autopilot {
    pub fn new(rng: SmallRng) -> Self {
        Self {
            rng,
            tick: DEFAULT_TICK,
        }
    }

    pub fn with_tick(rng: SmallRng, tick: Duration) -> Self {
        Self { rng, tick }
    }

    /// Play `rounds` rounds on an already connected session.
    pub async fn play<W>(
        &mut self,
        session: &mut ClientSession<W>,
        rounds: usize,
    ) -> anyhow::Result<Vec<RoundOutcome>>
    where
        W: AsyncWrite + Unpin + Send,
    {
        if session.board_size().is_none() {
            session.receive_board_size().await?;
        }
        let mut outcomes = Vec::with_capacity(rounds);
        for round in 0..rounds {
            let outcome = self.play_round(session).await?;
            log::info!("round {}: {:?}", round + 1, outcome);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn play_round<W>(
        &mut self,
        session: &mut ClientSession<W>,
    ) -> anyhow::Result<RoundOutcome>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let fleet = Board::random_fleet(&mut self.rng, session.config())?;
        session.submit_fleet(fleet).await?;

        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match session.poll()? {
                Update::RoundOver(outcome) => {
                    let revealed = session.finish_round().await?;
                    log::debug!("opponent fleet: {:?}", revealed.ships);
                    return Ok(outcome);
                }
                Update::YourTurn {
                    opponent_shot: Some((p, hit)),
                } => {
                    log::debug!("opponent fired at {}: {}", p, if hit { "hit" } else { "miss" });
                }
                _ => {}
            }
            if session.mode() == Mode::SelectingMove {
                let target = self.pick_target(session)?;
                let report = session.fire(target).await?;
                log::debug!("fired at {}: {:?}", target, report);
            }
        }
    }

    fn pick_target<W>(&mut self, session: &ClientSession<W>) -> anyhow::Result<Point>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let size = session
            .board_size()
            .ok_or_else(|| anyhow::anyhow!("no board size"))? as i32;
        let open: Vec<Point> = (0..size)
            .flat_map(|y| (0..size).map(move |x| Point::new(x, y)))
            .filter(|p| session.can_target(*p))
            .collect();
        if open.is_empty() {
            anyhow::bail!("no untargeted cells left");
        }
        Ok(open[self.rng.random_range(0..open.len())])
    }
}
