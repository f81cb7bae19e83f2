//! Integration tests for the arena actor, driven through its handle on a
//! paused clock so lobby timers and ticks run instantly.

use std::time::Duration;

use blastforge::prelude::*;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    id: PlayerId,
    rx: mpsc::Receiver<Outbound>,
}

fn start_arena() -> ArenaHandle {
    spawn_arena(
        LobbyConfig::default(),
        SimConfig::default(),
        TickConfig::default(),
        64,
    )
}

async fn connect(arena: &ArenaHandle, id: u64) -> Client {
    let (tx, rx) = mpsc::channel(CLIENT_QUEUE_SIZE);
    let id = PlayerId(id);
    arena.connect(id, tx).await.expect("arena running");
    Client { id, rx }
}

async fn join(arena: &ArenaHandle, client: &Client, nickname: &str) {
    arena
        .send_message(
            client.id,
            ClientMessage::Join {
                nickname: nickname.to_string(),
            },
        )
        .await
        .expect("arena running");
}

async fn next_outbound(client: &mut Client) -> Outbound {
    tokio::time::timeout(Duration::from_secs(120), client.rx.recv())
        .await
        .expect("timed out waiting for outbound")
        .expect("arena dropped the client")
}

async fn next_msg(client: &mut Client) -> ServerMessage {
    match next_outbound(client).await {
        Outbound::Frame(frame) => serde_json::from_str(&frame).expect("valid server frame"),
        Outbound::Close => panic!("unexpected close"),
    }
}

/// Collects messages up to and including the first one matching `stop`.
async fn collect_until(
    client: &mut Client,
    stop: impl Fn(&ServerMessage) -> bool,
) -> Vec<ServerMessage> {
    let mut seen = Vec::new();
    loop {
        let msg = next_msg(client).await;
        let done = stop(&msg);
        seen.push(msg);
        if done {
            return seen;
        }
    }
}

/// Everything already queued for the client, without waiting.
fn drain(client: &mut Client) -> Vec<ServerMessage> {
    let mut seen = Vec::new();
    while let Ok(outbound) = client.rx.try_recv() {
        if let Outbound::Frame(frame) = outbound {
            seen.push(serde_json::from_str(&frame).expect("valid server frame"));
        }
    }
    seen
}

fn is_countdown(msg: &ServerMessage, n: u32) -> bool {
    matches!(msg, ServerMessage::Countdown { countdown } if *countdown == n)
}

fn is_game_start(msg: &ServerMessage) -> bool {
    matches!(msg, ServerMessage::GameStart {})
}

/// Joins two players and runs the clock until the match starts.
async fn start_two_player_match(arena: &ArenaHandle) -> (Client, Client) {
    let mut a = connect(arena, 1).await;
    let b = connect(arena, 2).await;
    join(arena, &a, "a").await;
    join(arena, &b, "b").await;
    collect_until(&mut a, is_game_start).await;
    (a, b)
}

// =========================================================================
// Lobby flow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_join_confirms_and_broadcasts_roster() {
    let arena = start_arena();
    let mut a = connect(&arena, 1).await;
    let mut watcher = connect(&arena, 9).await;
    join(&arena, &a, "  Ann  ").await;

    assert_eq!(next_msg(&mut a).await, ServerMessage::PlayerId(PlayerId(1)));
    let roster = vec![blastforge_protocol::LobbyPlayer {
        id: PlayerId(1),
        nickname: "Ann".into(),
    }];
    assert_eq!(next_msg(&mut a).await, ServerMessage::PlayerList(roster.clone()));
    assert_eq!(
        next_msg(&mut a).await,
        ServerMessage::Chat {
            nickname: "System".into(),
            message: "Ann joined".into()
        }
    );

    // Unjoined connections see broadcasts too.
    assert_eq!(next_msg(&mut watcher).await, ServerMessage::PlayerList(roster));
}

#[tokio::test(start_paused = true)]
async fn test_four_joins_start_countdown_without_waiting_broadcast() {
    let arena = start_arena();
    let mut clients = Vec::new();
    for id in 1..=4 {
        clients.push(connect(&arena, id).await);
    }
    for (i, client) in clients.iter().enumerate() {
        join(&arena, client, &format!("p{i}")).await;
    }

    let seen = collect_until(&mut clients[0], |m| is_countdown(m, 10)).await;
    let full_roster = seen
        .iter()
        .position(|m| matches!(m, ServerMessage::PlayerList(list) if list.len() == 4))
        .expect("roster of four");
    assert!(
        !seen[full_roster..]
            .iter()
            .any(|m| matches!(m, ServerMessage::Waiting { .. })),
        "waiting broadcast after the fourth join: {seen:?}"
    );

    let rest = collect_until(&mut clients[0], is_game_start).await;
    let counts: Vec<u32> = rest
        .iter()
        .filter_map(|m| match m {
            ServerMessage::Countdown { countdown } => Some(*countdown),
            _ => None,
        })
        .collect();
    assert_eq!(counts, (0..10).rev().collect::<Vec<_>>());
    assert!(!rest.iter().any(|m| matches!(m, ServerMessage::Waiting { .. })));

    let status = arena.status().await.expect("status");
    assert_eq!(status.phase, LobbyPhase::Running);
    assert_eq!(status.alive_in_match, Some(4));
    assert_eq!(status.lobby_players, 0);
}

#[tokio::test(start_paused = true)]
async fn test_two_joins_wait_then_count_down() {
    let arena = start_arena();
    let mut a = connect(&arena, 1).await;
    let b = connect(&arena, 2).await;
    join(&arena, &a, "a").await;
    join(&arena, &b, "b").await;

    let seen = collect_until(&mut a, |m| is_countdown(m, 10)).await;
    let waits: Vec<u32> = seen
        .iter()
        .filter_map(|m| match m {
            ServerMessage::Waiting { waiting } => Some(*waiting),
            _ => None,
        })
        .collect();
    assert_eq!(waits, (0..=20).rev().collect::<Vec<_>>());
    assert_eq!(arena.status().await.expect("status").phase, LobbyPhase::Countdown);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_below_minimum_cancels_countdown() {
    let arena = start_arena();
    let mut a = connect(&arena, 1).await;
    let b = connect(&arena, 2).await;
    join(&arena, &a, "a").await;
    join(&arena, &b, "b").await;
    collect_until(&mut a, |m| is_countdown(m, 10)).await;

    arena.disconnect(b.id).await.expect("arena running");
    let status = arena.status().await.expect("status");
    assert_eq!(status.phase, LobbyPhase::Waiting);
    assert_eq!(status.lobby_players, 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    let seen = drain(&mut a);
    assert!(seen.iter().any(|m| matches!(m, ServerMessage::PlayerList(list) if list.len() == 1)));
    assert!(seen.iter().any(
        |m| matches!(m, ServerMessage::Chat { message, .. } if message == "b left")
    ));
    assert!(!seen.iter().any(|m| matches!(
        m,
        ServerMessage::Countdown { .. } | ServerMessage::Waiting { .. } | ServerMessage::GameStart {}
    )));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_nickname_rejected_but_connection_kept() {
    let arena = start_arena();
    let a = connect(&arena, 1).await;
    let mut b = connect(&arena, 2).await;
    join(&arena, &a, "Ann").await;
    join(&arena, &b, " ann ").await;

    let seen = collect_until(&mut b, |m| matches!(m, ServerMessage::Error { .. })).await;
    match seen.last() {
        Some(ServerMessage::Error { message }) => assert!(message.contains("already taken")),
        other => panic!("expected error, got {other:?}"),
    }

    join(&arena, &b, "Bob").await;
    let seen = collect_until(&mut b, |m| matches!(m, ServerMessage::PlayerId(_))).await;
    assert_eq!(seen.last(), Some(&ServerMessage::PlayerId(PlayerId(2))));
    assert_eq!(arena.status().await.expect("status").lobby_players, 2);
}

#[tokio::test(start_paused = true)]
async fn test_fifth_player_rejected_and_closed() {
    let arena = start_arena();
    let mut clients = Vec::new();
    for id in 1..=5 {
        clients.push(connect(&arena, id).await);
    }
    for (i, client) in clients.iter().enumerate() {
        join(&arena, client, &format!("p{i}")).await;
    }

    let fifth = &mut clients[4];
    let error = loop {
        if let ServerMessage::Error { message } = next_msg(fifth).await {
            break message;
        }
    };
    assert_eq!(error, "Lobby is full (4/4 players)");
    assert_eq!(next_outbound(fifth).await, Outbound::Close);
    assert_eq!(arena.status().await.expect("status").lobby_players, 4);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_join_is_ignored() {
    let arena = start_arena();
    let mut a = connect(&arena, 1).await;
    join(&arena, &a, "a").await;
    join(&arena, &a, "other").await;
    let status = arena.status().await.expect("status");
    assert_eq!(status.lobby_players, 1);
    let seen = drain(&mut a);
    assert_eq!(
        seen.iter()
            .filter(|m| matches!(m, ServerMessage::PlayerId(_)))
            .count(),
        1
    );
    assert!(!seen.iter().any(|m| matches!(m, ServerMessage::Error { .. })));
}

// =========================================================================
// Chat
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_chat_from_joined_player_is_broadcast_truncated() {
    let arena = start_arena();
    let mut a = connect(&arena, 1).await;
    let stranger = connect(&arena, 2).await;
    join(&arena, &a, "a").await;

    arena
        .send_message(stranger.id, ClientMessage::Chat { message: "hi".into() })
        .await
        .expect("arena running");
    arena
        .send_message(a.id, ClientMessage::Chat { message: "   ".into() })
        .await
        .expect("arena running");
    arena
        .send_message(a.id, ClientMessage::Chat { message: "x".repeat(300) })
        .await
        .expect("arena running");

    arena.status().await.expect("status");
    let chats: Vec<_> = drain(&mut a)
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::Chat { nickname, message } if nickname == "a" => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(chats, vec!["x".repeat(200)]);
}

// =========================================================================
// Running match
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_running_match_streams_state_and_applies_moves() {
    let arena = start_arena();
    let (mut a, _b) = start_two_player_match(&arena).await;

    let first = loop {
        if let ServerMessage::State(snapshot) = next_msg(&mut a).await {
            break snapshot;
        }
    };
    assert_eq!(first.players.len(), 2);
    assert_eq!((first.players[0].x, first.players[0].y), (4.0, 4.0));
    assert_eq!(first.walls.len(), 63);

    arena
        .send_message(a.id, ClientMessage::Action(Action::Move { dx: 1.0, dy: 0.0 }))
        .await
        .expect("arena running");
    let moved = loop {
        if let ServerMessage::State(snapshot) = next_msg(&mut a).await {
            if snapshot.players[0].x != 4.0 {
                break snapshot;
            }
        }
    };
    assert_eq!(moved.players[0].x, 6.0);
}

#[tokio::test(start_paused = true)]
async fn test_due_tick_fires_before_queued_commands() {
    let arena = start_arena();
    let (mut a, _b) = start_two_player_match(&arena).await;
    let first = loop {
        if let ServerMessage::State(snapshot) = next_msg(&mut a).await {
            break snapshot;
        }
    };
    assert_eq!(first.players[0].x, 4.0);

    // Make the next tick due, then queue moves before the arena runs again.
    tokio::time::advance(TickConfig::default().tick_duration() + Duration::from_millis(1)).await;
    for _ in 0..10 {
        arena
            .send_message(a.id, ClientMessage::Action(Action::Move { dx: 1.0, dy: 0.0 }))
            .await
            .expect("arena running");
    }

    let due = loop {
        if let ServerMessage::State(snapshot) = next_msg(&mut a).await {
            break snapshot;
        }
    };
    assert_eq!(due.players[0].x, 4.0, "tick waited behind the command queue");

    let after = loop {
        if let ServerMessage::State(snapshot) = next_msg(&mut a).await {
            break snapshot;
        }
    };
    assert!(after.players[0].x > 4.0);
}

#[tokio::test(start_paused = true)]
async fn test_join_refused_while_match_runs() {
    let arena = start_arena();
    let (_a, _b) = start_two_player_match(&arena).await;
    let mut late = connect(&arena, 3).await;

    join(&arena, &late, "A").await;
    let taken = loop {
        if let ServerMessage::Error { message } = next_msg(&mut late).await {
            break message;
        }
    };
    assert!(taken.contains("already taken"), "{taken}");

    join(&arena, &late, "carol").await;
    let refused = loop {
        if let ServerMessage::Error { message } = next_msg(&mut late).await {
            break message;
        }
    };
    assert!(refused.contains("in progress"), "{refused}");

    // Still connected: keeps receiving snapshots.
    loop {
        if let ServerMessage::State(_) = next_msg(&mut late).await {
            break;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_last_player_standing_wins_once_and_lobby_resets() {
    let arena = start_arena();
    let (mut a, b) = start_two_player_match(&arena).await;

    arena.disconnect(b.id).await.expect("arena running");
    let seen = collect_until(&mut a, |m| matches!(m, ServerMessage::Winner { .. })).await;
    assert_eq!(
        seen.last(),
        Some(&ServerMessage::Winner {
            id: Some(PlayerId(1)),
            nickname: Some("a".into())
        })
    );
    assert_eq!(next_msg(&mut a).await, ServerMessage::PlayerList(Vec::new()));

    let status = arena.status().await.expect("status");
    assert_eq!(status.phase, LobbyPhase::Waiting);
    assert_eq!(status.lobby_players, 0);
    assert_eq!(status.alive_in_match, None);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let after = drain(&mut a);
    assert!(!after.iter().any(|m| matches!(
        m,
        ServerMessage::Winner { .. } | ServerMessage::State(_)
    )));

    // The winner may join the next match under the same name.
    join(&arena, &a, "a").await;
    assert_eq!(next_msg(&mut a).await, ServerMessage::PlayerId(PlayerId(1)));
}

#[tokio::test(start_paused = true)]
async fn test_actions_before_match_are_ignored() {
    let arena = start_arena();
    let mut a = connect(&arena, 1).await;
    join(&arena, &a, "a").await;
    arena
        .send_message(a.id, ClientMessage::Action(Action::PlaceBomb))
        .await
        .expect("arena running");
    let status = arena.status().await.expect("status");
    assert_eq!(status.alive_in_match, None);
    assert!(!drain(&mut a).iter().any(|m| matches!(m, ServerMessage::State(_))));
}

#[tokio::test(start_paused = true)]
async fn test_client_with_full_queue_is_dropped() {
    let arena = start_arena();
    let mut a = connect(&arena, 1).await;
    let (tx, _never_read) = mpsc::channel(4);
    arena.connect(PlayerId(2), tx).await.expect("arena running");

    join(&arena, &a, "a").await;
    arena
        .send_message(
            PlayerId(2),
            ClientMessage::Join {
                nickname: "b".into(),
            },
        )
        .await
        .expect("arena running");

    collect_until(&mut a, |m| {
        matches!(m, ServerMessage::Chat { message, .. } if message == "b left")
    })
    .await;
    let status = arena.status().await.expect("status");
    assert_eq!(status.connected, 1);
    assert_eq!(status.lobby_players, 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_tile_size_falls_back_to_default() {
    let arena = spawn_arena(
        LobbyConfig::default(),
        SimConfig {
            tile_size: 0,
            ..SimConfig::default()
        },
        TickConfig::default(),
        64,
    );
    let (mut a, _b) = start_two_player_match(&arena).await;
    let state = loop {
        if let ServerMessage::State(snapshot) = next_msg(&mut a).await {
            break snapshot;
        }
    };
    assert_eq!(state.tile_size, 40);
}
