use std::time::Duration;

use broadside::transport::{StreamTransport, Transport};
use broadside::{
    ClientError, ClientSession, GameConfig, Mode, Point, RoundOutcome, RoundPhase, Ship, ShipDef,
    TransportConfig, TransportError, Update,
};
use serde_json::json;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

type Scripted = StreamTransport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;
type Session = ClientSession<WriteHalf<DuplexStream>>;

fn connect() -> (Session, Scripted) {
    let (client_end, server_end) = tokio::io::duplex(4096);
    let config = GameConfig::new(10, vec![ShipDef::new("Destroyer", 2)]);
    let session = ClientSession::new(
        StreamTransport::from_stream(client_end, TransportConfig::default()),
        config,
    );
    let server = StreamTransport::from_stream(server_end, TransportConfig::default());
    (session, server)
}

fn destroyer() -> Vec<Ship> {
    vec![Ship::new("Destroyer", [Point::new(0, 0), Point::new(1, 0)])]
}

/// Poll once per millisecond until something other than `Idle` comes in.
async fn wait_update(session: &mut Session) -> Result<Update, ClientError> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match session.poll() {
                Ok(Update::Idle) => tokio::time::sleep(Duration::from_millis(1)).await,
                other => return other,
            }
        }
    })
    .await
    .expect("no update within 5s")
}

/// Connected session that has received the board size and placed its Destroyer.
async fn ready() -> (Session, Scripted) {
    let (mut session, mut server) = connect();
    server.send(&json!("10")).await.unwrap();
    assert_eq!(session.receive_board_size().await.unwrap(), 10);
    session.submit_fleet(destroyer()).await.unwrap();
    assert_eq!(
        server.recv().await.unwrap(),
        json!([["Destroyer", [0, 0], [1, 0]]])
    );
    server.send(&json!("starting")).await.unwrap();
    assert_eq!(wait_update(&mut session).await.unwrap(), Update::Started);
    (session, server)
}

#[tokio::test]
async fn test_fleet_needs_board_size() {
    let (mut session, _server) = connect();
    assert!(matches!(
        session.submit_fleet(destroyer()).await,
        Err(ClientError::NoBoardSize)
    ));
}

#[tokio::test]
async fn test_invalid_fleet_not_sent() {
    let (mut session, mut server) = connect();
    server.send(&json!("10")).await.unwrap();
    session.receive_board_size().await.unwrap();
    let bent = vec![Ship::new("Destroyer", [Point::new(0, 0), Point::new(1, 1)])];
    assert!(matches!(
        session.submit_fleet(bent).await,
        Err(ClientError::Fleet(_))
    ));
}

#[tokio::test]
async fn test_opening_move_and_fire() {
    let (mut session, mut server) = ready().await;
    assert_eq!(session.mode(), Mode::AwaitingOpponent);
    assert!(matches!(
        session.fire(Point::new(3, 3)).await,
        Err(ClientError::NotYourTurn)
    ));

    server.send(&json!("waiting for move")).await.unwrap();
    assert_eq!(
        wait_update(&mut session).await.unwrap(),
        Update::YourTurn { opponent_shot: None }
    );
    assert_eq!(session.mode(), Mode::SelectingMove);
    assert!(session.can_target(Point::new(3, 3)));
    assert!(!session.can_target(Point::new(10, 3)));
    assert!(matches!(
        session.fire(Point::new(-1, 3)).await,
        Err(ClientError::OutOfBounds(_))
    ));

    let (report, shot) = tokio::join!(session.fire(Point::new(3, 3)), async {
        let shot = server.recv().await.unwrap();
        server.send(&json!("hit")).await.unwrap();
        server.send(&json!("sunk Destroyer")).await.unwrap();
        shot
    });
    assert_eq!(shot, json!([3, 3]));
    let report = report.unwrap();
    assert!(report.hit);
    assert_eq!(report.sunk.as_deref(), Some("Destroyer"));
    assert_eq!(session.mode(), Mode::AwaitingOpponent);
    assert_eq!(session.last_sunk(), Some("Destroyer"));
    assert!(session.opponent_shots().hit_at(Point::new(3, 3)));
}

#[tokio::test]
async fn test_poll_waits_while_selecting() {
    let (mut session, mut server) = ready().await;
    server.send(&json!("waiting for move")).await.unwrap();
    wait_update(&mut session).await.unwrap();

    // a stray message stays queued until our shot is resolved
    server.send(&json!("miss")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.poll().unwrap(), Update::Idle);
    assert_eq!(session.mode(), Mode::SelectingMove);
}

#[tokio::test]
async fn test_opponent_shots_are_replayed() {
    let (mut session, mut server) = ready().await;

    server
        .send(&json!({"game_status": null, "move": [0, 0]}))
        .await
        .unwrap();
    assert_eq!(
        wait_update(&mut session).await.unwrap(),
        Update::YourTurn {
            opponent_shot: Some((Point::new(0, 0), true))
        }
    );
    assert!(session.own_shots().hit_at(Point::new(0, 0)));

    let (report, _) = tokio::join!(session.fire(Point::new(5, 5)), async {
        server.recv().await.unwrap();
        server.send(&json!("miss")).await.unwrap();
        server.send(&json!("no ship sank")).await.unwrap();
    });
    let report = report.unwrap();
    assert!(!report.hit);
    assert_eq!(report.sunk, None);

    server
        .send(&json!({"game_status": null, "move": [7, 7]}))
        .await
        .unwrap();
    assert_eq!(
        wait_update(&mut session).await.unwrap(),
        Update::YourTurn {
            opponent_shot: Some((Point::new(7, 7), false))
        }
    );
    assert!(session.own_shots().miss_at(Point::new(7, 7)));
    assert!(matches!(
        session.fire(Point::new(5, 5)).await,
        Err(ClientError::AlreadyTargeted(_))
    ));
    assert!(!session.can_target(Point::new(5, 5)));
}

#[tokio::test]
async fn test_lost_round_and_board_exchange() {
    let (mut session, mut server) = ready().await;
    assert!(matches!(
        session.finish_round().await,
        Err(ClientError::RoundNotOver)
    ));

    server
        .send(&json!({"game_status": null, "move": [0, 0]}))
        .await
        .unwrap();
    wait_update(&mut session).await.unwrap();
    let (_, _) = tokio::join!(session.fire(Point::new(9, 9)), async {
        server.recv().await.unwrap();
        server.send(&json!("miss")).await.unwrap();
        server.send(&json!("no ship sank")).await.unwrap();
    });

    server
        .send(&json!({"game_status": "You lost", "move": [1, 0]}))
        .await
        .unwrap();
    assert_eq!(
        wait_update(&mut session).await.unwrap(),
        Update::RoundOver(RoundOutcome::Lost)
    );
    assert_eq!(session.outcome(), Some(RoundOutcome::Lost));
    assert!(session.fleet().is_lost());
    assert!(matches!(
        session.fire(Point::new(4, 4)).await,
        Err(ClientError::NotYourTurn)
    ));

    let theirs = json!({"hits": [], "misses": [[9, 9]], "ships": [[[5, 5], [5, 6]]]});
    let (revealed, ours) = tokio::join!(session.finish_round(), async {
        let ours = server.recv().await.unwrap();
        server.send(&theirs).await.unwrap();
        ours
    });
    assert_eq!(
        ours,
        json!({"hits": [[0, 0], [1, 0]], "misses": [], "ships": [[[0, 0], [1, 0]]]})
    );
    let revealed = revealed.unwrap();
    assert_eq!(revealed.ships, vec![vec![Point::new(5, 5), Point::new(5, 6)]]);
    assert_eq!(session.revealed_opponent(), Some(&revealed));

    // rematch resets the round
    session.submit_fleet(destroyer()).await.unwrap();
    server.recv().await.unwrap();
    assert_eq!(session.outcome(), None);
    assert!(session.own_shots().is_empty());
    assert!(session.opponent_shots().is_empty());
    assert!(session.revealed_opponent().is_none());
}

#[tokio::test]
async fn test_won_notice() {
    let (mut session, mut server) = ready().await;
    server
        .send(&json!({"game_status": "You won", "move": null}))
        .await
        .unwrap();
    assert_eq!(
        wait_update(&mut session).await.unwrap(),
        Update::RoundOver(RoundOutcome::Won)
    );
    // nothing else is read once the round is over
    assert_eq!(session.poll().unwrap(), Update::Idle);
}

#[tokio::test]
async fn test_unexpected_message_is_protocol_error() {
    let (mut session, mut server) = ready().await;
    server.send(&json!(42)).await.unwrap();
    assert!(matches!(
        wait_update(&mut session).await,
        Err(ClientError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_server_disconnect() {
    let (mut session, server) = ready().await;
    drop(server);
    assert!(matches!(
        wait_update(&mut session).await,
        Err(ClientError::Transport(TransportError::Disconnected))
    ));
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_next_update_blocks_until_message() {
    let (mut session, mut server) = ready().await;
    let (update, _) = tokio::join!(session.next_update(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        server.send(&json!("waiting for move")).await.unwrap();
    });
    assert_eq!(
        update.unwrap(),
        Update::YourTurn { opponent_shot: None }
    );
}

#[tokio::test]
async fn test_fleet_refused_mid_round() {
    let (mut session, mut server) = ready().await;
    assert!(matches!(
        session.submit_fleet(destroyer()).await,
        Err(ClientError::RoundInProgress)
    ));

    server.send(&json!("waiting for move")).await.unwrap();
    wait_update(&mut session).await.unwrap();
    assert!(matches!(
        session.submit_fleet(destroyer()).await,
        Err(ClientError::RoundInProgress)
    ));
    assert_eq!(session.mode(), Mode::SelectingMove);
    assert_eq!(session.round_phase(), RoundPhase::Playing);

    // the next frame the server sees is the shot, not a stray placement
    let (report, shot) = tokio::join!(session.fire(Point::new(4, 4)), async {
        let shot = server.recv().await.unwrap();
        server.send(&json!("miss")).await.unwrap();
        server.send(&json!("no ship sank")).await.unwrap();
        shot
    });
    report.unwrap();
    assert_eq!(shot, json!([4, 4]));

    // still refused after the won notice, until boards are exchanged
    server
        .send(&json!({"game_status": "You won", "move": null}))
        .await
        .unwrap();
    wait_update(&mut session).await.unwrap();
    assert!(matches!(
        session.submit_fleet(destroyer()).await,
        Err(ClientError::RoundInProgress)
    ));
}

#[tokio::test]
async fn test_boards_exchanged_once_per_round() {
    let (mut session, mut server) = ready().await;
    server
        .send(&json!({"game_status": "You won", "move": null}))
        .await
        .unwrap();
    wait_update(&mut session).await.unwrap();
    assert_eq!(session.round_phase(), RoundPhase::Over);

    let theirs = json!({"hits": [], "misses": [], "ships": [[[5, 5], [5, 6]]]});
    let (revealed, _) = tokio::join!(session.finish_round(), async {
        server.recv().await.unwrap();
        server.send(&theirs).await.unwrap();
    });
    revealed.unwrap();
    assert_eq!(session.round_phase(), RoundPhase::Revealed);

    assert!(matches!(
        session.finish_round().await,
        Err(ClientError::AlreadyRevealed)
    ));
    // nothing was written for the refused call
    assert!(tokio::time::timeout(Duration::from_millis(50), server.recv())
        .await
        .is_err());

    session.submit_fleet(destroyer()).await.unwrap();
    assert_eq!(
        server.recv().await.unwrap(),
        json!([["Destroyer", [0, 0], [1, 0]]])
    );
    assert_eq!(session.round_phase(), RoundPhase::Playing);
}
