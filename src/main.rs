use broadside::transport::StreamTransport;
use broadside::{
    init_logging, Autopilot, ClientSession, Game, GameConfig, Player, RoundOutcome, Server,
    ServerConfig, TcpClient, TransportConfig, DEFAULT_PORT,
};

use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a game: accept two players and referee it.
    Server {
        #[arg(long, default_value_t = format!("0.0.0.0:{DEFAULT_PORT}"))]
        bind: String,
        #[arg(long, help = "Stop after this many rounds instead of offering rematches forever")]
        rounds: Option<usize>,
    },
    /// Connect to a server and let the autopilot play.
    Client {
        #[arg(long, default_value_t = format!("127.0.0.1:{DEFAULT_PORT}"))]
        connect: String,
        #[arg(long, default_value_t = 1)]
        rounds: usize,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Run a server and two autopilot clients in this process.
    Local {
        #[arg(long, default_value_t = 1)]
        rounds: usize,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_rng(&mut rand::rng()),
    }
}

fn report(outcomes: &[RoundOutcome]) {
    let won = outcomes.iter().filter(|o| **o == RoundOutcome::Won).count();
    println!("Played {} round(s): won {}, lost {}", outcomes.len(), won, outcomes.len() - won);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Server { bind, rounds } => {
            let config = ServerConfig {
                bind,
                rounds,
                ..ServerConfig::default()
            };
            let server = Server::bind(config).await?;
            println!("Waiting for two players on {}...", server.local_addr()?);
            if let Err(e) = server.run().await {
                log::error!("server stopped: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Client {
            connect,
            rounds,
            seed,
        } => {
            println!("Connecting to {}...", connect);
            let mut session =
                TcpClient::connect(&connect, GameConfig::default(), TransportConfig::default())
                    .await?;
            println!("Connected, waiting for the game to start");
            let mut autopilot = Autopilot::new(make_rng(seed));
            let outcomes = autopilot.play(&mut session, rounds).await?;
            report(&outcomes);
            session.shutdown();
        }
        Commands::Local { rounds, seed } => {
            let config = GameConfig::default();
            let mut players = Vec::with_capacity(2);
            let mut clients = Vec::with_capacity(2);
            for id in 0..2 {
                let (server_end, client_end) = tokio::io::duplex(64 * 1024);
                players.push(Player::new(
                    id,
                    Box::new(StreamTransport::from_stream(
                        server_end,
                        TransportConfig::without_timeout(),
                    )),
                    config.board_size,
                ));
                clients.push(ClientSession::new(
                    StreamTransport::from_stream(client_end, TransportConfig::default()),
                    config.clone(),
                ));
            }
            let players: [Player; 2] = players
                .try_into()
                .map_err(|_| anyhow::anyhow!("expected two players"))?;
            let mut game = Game::new(players, config);
            let referee = tokio::spawn(async move { game.run(Some(rounds)).await });

            let mut handles = Vec::new();
            for (i, mut session) in clients.into_iter().enumerate() {
                let rng = make_rng(seed.map(|s| s.wrapping_add(i as u64)));
                handles.push(tokio::spawn(async move {
                    let mut autopilot = Autopilot::new(rng);
                    autopilot.play(&mut session, rounds).await
                }));
            }
            for (i, handle) in handles.into_iter().enumerate() {
                let outcomes = handle.await??;
                print!("Player {}: ", i);
                report(&outcomes);
            }
            referee.await??;
        }
    }
    Ok(())
}
