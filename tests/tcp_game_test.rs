use std::time::Duration;

use broadside::{
    Autopilot, Board, GameConfig, Phase, RoundOutcome, Server, ServerConfig, TcpClient, TransportConfig,
};
use rand::{rngs::SmallRng, SeedableRng};

async fn autopilot_client(
    addr: std::net::SocketAddr,
    seed: u64,
    rounds: usize,
) -> anyhow::Result<Vec<RoundOutcome>> {
    let mut session = TcpClient::connect(addr, GameConfig::default(), TransportConfig::default()).await?;
    let mut autopilot = Autopilot::with_tick(SmallRng::seed_from_u64(seed), Duration::from_millis(1));
    let outcomes = autopilot.play(&mut session, rounds).await?;
    session.shutdown();
    Ok(outcomes)
}

#[test]
fn test_server_players_have_no_receive_deadline() {
    let config = ServerConfig::default();
    assert_eq!(config.transport.receive_timeout, None);
    assert_eq!(config.transport.max_payload, TransportConfig::default().max_payload);
    assert!(TransportConfig::default().receive_timeout.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_autopilot_vs_autopilot_tcp_game() -> anyhow::Result<()> {
    let config = ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        rounds: Some(2),
        ..ServerConfig::default()
    };
    let server = Server::bind(config).await?;
    let addr = server.local_addr()?;

    let referee = tokio::spawn(async move {
        let mut game = server.accept().await?;
        game.run(Some(2)).await?;
        Ok::<_, anyhow::Error>((game.phase(), game.rounds_played()))
    });

    let first = tokio::spawn(autopilot_client(addr, 1, 2));
    let second = tokio::spawn(autopilot_client(addr, 2, 2));

    let (first, second, referee) = tokio::time::timeout(Duration::from_secs(60), async {
        tokio::try_join!(first, second, referee)
    })
    .await??;
    let (first, second) = (first?, second?);
    let (phase, rounds_played) = referee?;

    assert_eq!(rounds_played, 2);
    assert_eq!(phase, Phase::Setup);
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    // One must win, one must lose, every round.
    for (a, b) in first.iter().zip(&second) {
        assert_ne!(a, b);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_run_ends_after_rounds() -> anyhow::Result<()> {
    let config = ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        rounds: Some(1),
        ..ServerConfig::default()
    };
    let server = Server::bind(config).await?;
    let addr = server.local_addr()?;
    let referee = tokio::spawn(server.run());

    let (a, b) = tokio::join!(autopilot_client(addr, 7, 1), autopilot_client(addr, 8, 1));
    let (a, b) = (a?, b?);
    assert_ne!(a[0], b[0]);
    tokio::time::timeout(Duration::from_secs(10), referee).await???;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_reports_player_leaving() -> anyhow::Result<()> {
    let config = ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        ..ServerConfig::default()
    };
    let server = Server::bind(config).await?;
    let addr = server.local_addr()?;
    let referee = tokio::spawn(server.run());

    let mut first = TcpClient::connect(addr, GameConfig::default(), TransportConfig::default()).await?;
    let second = TcpClient::connect(addr, GameConfig::default(), TransportConfig::default()).await?;
    first.receive_board_size().await?;
    drop(second);
    // whichever side became player 0, the server ends up reading from the closed one;
    // our own write may already fail if the server gave up first
    let fleet = Board::random_fleet(&mut SmallRng::seed_from_u64(3), first.config())?;
    let _ = first.submit_fleet(fleet).await;

    let result = tokio::time::timeout(Duration::from_secs(10), referee).await??;
    assert!(result.is_err());
    first.shutdown();
    Ok(())
}
