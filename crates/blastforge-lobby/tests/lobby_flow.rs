//! Matchmaking scenarios driven through the public `Lobby` API.
//!
//! Timers are not involved here: the tests call `waiting_elapsed` and
//! `countdown_elapsed` directly, standing in for the server's timers.

use blastforge_lobby::{JoinError, Lobby, LobbyConfig, LobbyEffect, LobbyPhase};
use blastforge_protocol::PlayerId;

fn join(lobby: &mut Lobby, id: u64, nick: &str) -> Option<LobbyEffect> {
    let entry = lobby
        .validate_join(PlayerId(id), nick, &[])
        .expect("join should validate");
    lobby.commit_join(entry)
}

#[test]
fn test_four_joins_go_straight_to_countdown() {
    let mut lobby = Lobby::new(LobbyConfig::default());

    assert_eq!(join(&mut lobby, 1, "a"), None);
    assert_eq!(
        join(&mut lobby, 2, "b"),
        Some(LobbyEffect::StartWaiting { seconds: 20 })
    );
    assert_eq!(join(&mut lobby, 3, "c"), None);
    assert_eq!(
        join(&mut lobby, 4, "d"),
        Some(LobbyEffect::StartCountdown { seconds: 10 })
    );
    assert_eq!(lobby.phase(), LobbyPhase::Countdown);
    assert!(!lobby.is_waiting_armed());
}

#[test]
fn test_waiting_elapsed_with_two_players_starts_countdown() {
    let mut lobby = Lobby::new(LobbyConfig::default());
    join(&mut lobby, 1, "a");
    join(&mut lobby, 2, "b");

    assert_eq!(
        lobby.waiting_elapsed(),
        Some(LobbyEffect::StartCountdown { seconds: 10 })
    );
    assert_eq!(lobby.phase(), LobbyPhase::Countdown);
}

#[test]
fn test_waiting_elapsed_after_drop_below_minimum_does_nothing() {
    let mut lobby = Lobby::new(LobbyConfig::default());
    join(&mut lobby, 1, "a");
    join(&mut lobby, 2, "b");
    let departure = lobby.leave(PlayerId(2)).expect("was a member");
    assert_eq!(departure.effect, Some(LobbyEffect::CancelTimers));

    assert_eq!(lobby.waiting_elapsed(), None);
    assert_eq!(lobby.phase(), LobbyPhase::Waiting);
}

#[test]
fn test_leave_during_countdown_below_minimum_falls_back_to_waiting() {
    let mut lobby = Lobby::new(LobbyConfig::default());
    join(&mut lobby, 1, "a");
    join(&mut lobby, 2, "b");
    lobby.waiting_elapsed();
    assert_eq!(lobby.phase(), LobbyPhase::Countdown);

    let departure = lobby.leave(PlayerId(1)).expect("was a member");
    assert_eq!(departure.effect, Some(LobbyEffect::CancelTimers));
    assert_eq!(lobby.phase(), LobbyPhase::Waiting);

    // A new second player re-arms the waiting timer.
    assert_eq!(
        join(&mut lobby, 3, "c"),
        Some(LobbyEffect::StartWaiting { seconds: 20 })
    );
}

#[test]
fn test_leave_during_countdown_above_minimum_keeps_counting() {
    let mut lobby = Lobby::new(LobbyConfig::default());
    for (id, nick) in [(1, "a"), (2, "b"), (3, "c")] {
        join(&mut lobby, id, nick);
    }
    lobby.waiting_elapsed();

    let departure = lobby.leave(PlayerId(3)).expect("was a member");
    assert_eq!(departure.effect, None);
    assert_eq!(lobby.phase(), LobbyPhase::Countdown);
}

#[test]
fn test_join_during_countdown_is_accepted_without_new_timer() {
    let mut lobby = Lobby::new(LobbyConfig::default());
    join(&mut lobby, 1, "a");
    join(&mut lobby, 2, "b");
    lobby.waiting_elapsed();

    assert_eq!(join(&mut lobby, 3, "c"), None);
    assert_eq!(join(&mut lobby, 4, "d"), None);
    assert_eq!(lobby.phase(), LobbyPhase::Countdown);
}

#[test]
fn test_countdown_elapsed_hands_roster_to_match() {
    let mut lobby = Lobby::new(LobbyConfig::default());
    join(&mut lobby, 1, "a");
    join(&mut lobby, 2, "b");
    lobby.waiting_elapsed();

    match lobby.countdown_elapsed() {
        Some(LobbyEffect::StartMatch(roster)) => {
            let ids: Vec<_> = roster.iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![PlayerId(1), PlayerId(2)]);
        }
        other => panic!("expected StartMatch, got {other:?}"),
    }
    assert_eq!(lobby.phase(), LobbyPhase::Running);
    assert!(lobby.is_empty());
}

#[test]
fn test_join_while_running_is_refused_but_duplicate_names_win() {
    let mut lobby = Lobby::new(LobbyConfig::default());
    join(&mut lobby, 1, "a");
    join(&mut lobby, 2, "b");
    lobby.waiting_elapsed();
    lobby.countdown_elapsed();

    assert_eq!(
        lobby.validate_join(PlayerId(3), "c", &["a", "b"]),
        Err(JoinError::MatchInProgress)
    );
    assert_eq!(
        lobby.validate_join(PlayerId(3), "A", &["a", "b"]),
        Err(JoinError::NicknameTaken("A".into()))
    );
}

#[test]
fn test_finish_and_reset_returns_to_fresh_waiting() {
    let mut lobby = Lobby::new(LobbyConfig::default());
    join(&mut lobby, 1, "a");
    join(&mut lobby, 2, "b");
    lobby.waiting_elapsed();
    lobby.countdown_elapsed();

    lobby.finish_match();
    assert_eq!(lobby.phase(), LobbyPhase::Ended);
    lobby.reset();
    assert_eq!(lobby.phase(), LobbyPhase::Waiting);
    assert!(lobby.is_empty());

    // Former nicknames are free again.
    assert_eq!(join(&mut lobby, 1, "a"), None);
}

#[test]
fn test_custom_capacity_is_respected() {
    let mut lobby = Lobby::new(LobbyConfig {
        min_players: 2,
        max_players: 2,
        ..LobbyConfig::default()
    });
    join(&mut lobby, 1, "a");
    assert_eq!(
        join(&mut lobby, 2, "b"),
        Some(LobbyEffect::StartCountdown { seconds: 10 })
    );
}
