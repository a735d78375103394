use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::game::Game;
use crate::player::Player;
use crate::transport::TcpTransport;

/// Listening socket that admits exactly two participants.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&config.bind).await?;
        log::info!("listening on {}", listener.local_addr()?);
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept two connections, stop listening, and build the game.
    pub async fn accept(self) -> anyhow::Result<Game> {
        let mut players = Vec::with_capacity(2);
        while players.len() < 2 {
            let (stream, addr) = self.listener.accept().await?;
            log::info!("player {} connected from {}", players.len(), addr);
            let transport = TcpTransport::with_config(stream, self.config.transport);
            players.push(Player::new(
                players.len(),
                Box::new(transport),
                self.config.game.board_size,
            ));
        }
        drop(self.listener);

        let players: [Player; 2] = players
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected exactly two players"))?;
        Ok(Game::new(players, self.config.game))
    }

    /// Serve one game for the life of the process.
    pub async fn run(self) -> anyhow::Result<()> {
        let rounds = self.config.rounds;
        let mut game = self.accept().await?;
        game.run(rounds).await?;
        Ok(())
    }
}
