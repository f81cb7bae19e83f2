//! Arena actor: the single owner of the lobby and the running match.
//!
//! Connection tasks never touch game state. They forward commands through an
//! mpsc channel, and the actor applies them one at a time, interleaved with
//! the tick clock and the two lobby timers on the same task. That ordering is
//! what lets a chain reaction see a consistent bomb set.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use blastforge_lobby::{JoinError, Lobby, LobbyConfig, LobbyEffect, LobbyEntry, LobbyPhase};
use blastforge_protocol::{ClientMessage, Codec, JsonCodec, PlayerId, ServerMessage};
use blastforge_sim::{MatchOutcome, Session, SimConfig};
use blastforge_tick::{SecondsTimer, TickConfig, TickInfo, TickScheduler};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::BlastforgeError;

/// Nickname used for server announcements in chat.
const SYSTEM_NICKNAME: &str = "System";

/// An outbound item for one client's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// An encoded frame. Broadcasts share one allocation across clients.
    Frame(Arc<str>),
    /// Close the connection after the frames queued before this.
    Close,
}

/// Outbound items a client may have queued before it counts as stalled.
///
/// About twelve seconds of snapshots at the default tick rate.
pub const CLIENT_QUEUE_SIZE: usize = 256;

/// Channel sender for delivering outbound items to a client.
///
/// The arena only ever uses `try_send`. A client whose queue is full is
/// dropped as if it had disconnected.
pub type ClientSender = mpsc::Sender<Outbound>;

enum ArenaCommand {
    Connect {
        player_id: PlayerId,
        sender: ClientSender,
    },
    Disconnect {
        player_id: PlayerId,
    },
    Message {
        player_id: PlayerId,
        msg: ClientMessage,
    },
    Status {
        reply: oneshot::Sender<ArenaStatus>,
    },
}

/// A snapshot of arena bookkeeping (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaStatus {
    pub phase: LobbyPhase,
    /// Players holding a lobby slot.
    pub lobby_players: usize,
    /// Open connections, joined or not.
    pub connected: usize,
    /// Players still alive in the running match, if any.
    pub alive_in_match: Option<usize>,
}

/// Handle to the running arena actor. Cheap to clone.
#[derive(Clone)]
pub struct ArenaHandle {
    sender: mpsc::Sender<ArenaCommand>,
}

impl ArenaHandle {
    /// Registers a connection. Broadcasts reach it from now on, even before
    /// it joins.
    pub async fn connect(
        &self,
        player_id: PlayerId,
        sender: ClientSender,
    ) -> Result<(), BlastforgeError> {
        self.send(ArenaCommand::Connect { player_id, sender }).await
    }

    /// Unregisters a connection and releases its lobby slot or match entity.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), BlastforgeError> {
        self.send(ArenaCommand::Disconnect { player_id }).await
    }

    /// Forwards a decoded client message (fire-and-forget).
    pub async fn send_message(
        &self,
        player_id: PlayerId,
        msg: ClientMessage,
    ) -> Result<(), BlastforgeError> {
        self.send(ArenaCommand::Message { player_id, msg }).await
    }

    pub async fn status(&self) -> Result<ArenaStatus, BlastforgeError> {
        let (reply, rx) = oneshot::channel();
        self.send(ArenaCommand::Status { reply }).await?;
        rx.await.map_err(|_| BlastforgeError::ArenaUnavailable)
    }

    async fn send(&self, cmd: ArenaCommand) -> Result<(), BlastforgeError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| BlastforgeError::ArenaUnavailable)
    }
}

struct Member {
    sender: ClientSender,
    /// Set once the client has joined; cleared when the match it joined for
    /// is over.
    nickname: Option<String>,
}

struct ArenaActor {
    lobby: Lobby,
    sim_config: SimConfig,
    session: Option<Session>,
    members: BTreeMap<PlayerId, Member>,
    ticker: TickScheduler,
    waiting: SecondsTimer,
    countdown: SecondsTimer,
    codec: JsonCodec,
    receiver: mpsc::Receiver<ArenaCommand>,
    /// Clients whose queue overflowed, dropped once the current event is
    /// fully handled.
    stalled: BTreeSet<PlayerId>,
}

impl ArenaActor {
    async fn run(mut self) {
        tracing::info!(tick_rate_hz = self.ticker.tick_rate_hz(), "arena started");

        loop {
            // Deadlines first: a busy command queue must not push ticks or
            // lobby seconds past their due time.
            tokio::select! {
                biased;

                info = self.ticker.wait_for_tick() => {
                    self.on_tick(&info);
                    self.ticker.record_tick_end();
                }
                left = self.countdown.next_second() => self.on_countdown_second(left),
                left = self.waiting.next_second() => self.on_waiting_second(left),
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
            }
            self.drop_stalled();
        }

        tracing::info!("arena stopped");
    }

    fn handle_command(&mut self, cmd: ArenaCommand) {
        match cmd {
            ArenaCommand::Connect { player_id, sender } => {
                tracing::debug!(%player_id, "client connected to arena");
                self.members.insert(
                    player_id,
                    Member {
                        sender,
                        nickname: None,
                    },
                );
            }
            ArenaCommand::Disconnect { player_id } => self.handle_disconnect(player_id),
            ArenaCommand::Message { player_id, msg } => match msg {
                ClientMessage::Join { nickname } => self.handle_join(player_id, &nickname),
                ClientMessage::Action(action) => {
                    if !self.is_joined(player_id) {
                        return;
                    }
                    if let Some(session) = &mut self.session {
                        if !session.apply_action(player_id, &action) {
                            tracing::trace!(%player_id, ?action, "action dropped");
                        }
                    }
                }
                ClientMessage::Chat { message } => self.handle_chat(player_id, &message),
            },
            ArenaCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn handle_join(&mut self, player_id: PlayerId, raw_nickname: &str) {
        if !self.members.contains_key(&player_id) {
            tracing::warn!(%player_id, "join from unknown connection, ignoring");
            return;
        }
        if self.is_joined(player_id) {
            tracing::debug!(%player_id, "repeated join, ignoring");
            return;
        }

        let alive = self
            .session
            .as_ref()
            .map(Session::alive_nicknames)
            .unwrap_or_default();
        let entry = match self.lobby.validate_join(player_id, raw_nickname, &alive) {
            Ok(entry) => entry,
            Err(err) => {
                self.reject_join(player_id, &err);
                return;
            }
        };

        if let Some(member) = self.members.get_mut(&player_id) {
            member.nickname = Some(entry.nickname.clone());
        }
        let nickname = entry.nickname.clone();
        let effect = self.lobby.commit_join(entry);

        self.send_to(player_id, &ServerMessage::PlayerId(player_id));
        self.broadcast(&ServerMessage::PlayerList(self.lobby.roster()));
        self.announce(format!("{nickname} joined"));

        if let Some(effect) = effect {
            self.apply_effect(effect);
        }
    }

    fn reject_join(&mut self, player_id: PlayerId, err: &JoinError) {
        tracing::debug!(%player_id, error = %err, "join refused");
        self.send_to(
            player_id,
            &ServerMessage::Error {
                message: err.to_string(),
            },
        );
        if err.closes_connection() {
            self.deliver(player_id, Outbound::Close);
        }
    }

    fn handle_chat(&mut self, player_id: PlayerId, raw: &str) {
        let Some(nickname) = self
            .members
            .get(&player_id)
            .and_then(|m| m.nickname.clone())
        else {
            tracing::debug!(%player_id, "chat before join, ignoring");
            return;
        };
        let Some(message) = self.lobby.clean_chat(raw) else {
            return;
        };
        self.broadcast(&ServerMessage::Chat { nickname, message });
    }

    fn handle_disconnect(&mut self, player_id: PlayerId) {
        let Some(member) = self.members.remove(&player_id) else {
            return;
        };
        let Some(nickname) = member.nickname else {
            tracing::debug!(%player_id, "unjoined client disconnected");
            return;
        };

        if let Some(departure) = self.lobby.leave(player_id) {
            if let Some(effect) = departure.effect {
                self.apply_effect(effect);
            }
            self.broadcast(&ServerMessage::PlayerList(self.lobby.roster()));
        }
        if let Some(session) = &mut self.session {
            session.remove_player(player_id);
        }

        self.announce(format!("{nickname} left"));
    }

    fn apply_effect(&mut self, effect: LobbyEffect) {
        match effect {
            LobbyEffect::StartWaiting { seconds } => {
                tracing::info!(seconds, "waiting timer started");
                self.waiting.arm(seconds);
                self.broadcast(&ServerMessage::Waiting { waiting: seconds });
            }
            LobbyEffect::StartCountdown { seconds } => {
                tracing::info!(seconds, players = self.lobby.len(), "countdown started");
                self.waiting.disarm();
                self.countdown.arm(seconds);
                self.broadcast(&ServerMessage::Countdown { countdown: seconds });
            }
            LobbyEffect::CancelTimers => {
                let waiting = self.waiting.disarm();
                let countdown = self.countdown.disarm();
                tracing::info!(waiting, countdown, "lobby timers cancelled");
            }
            LobbyEffect::StartMatch(entries) => self.start_match(entries),
        }
    }

    fn on_waiting_second(&mut self, left: u32) {
        self.broadcast(&ServerMessage::Waiting { waiting: left });
        if left == 0 {
            if let Some(effect) = self.lobby.waiting_elapsed() {
                self.apply_effect(effect);
            }
        }
    }

    fn on_countdown_second(&mut self, left: u32) {
        self.broadcast(&ServerMessage::Countdown { countdown: left });
        if left == 0 {
            if let Some(effect) = self.lobby.countdown_elapsed() {
                self.apply_effect(effect);
            }
        }
    }

    fn start_match(&mut self, entries: Vec<LobbyEntry>) {
        let seed: u64 = rand::random();
        let roster = entries.into_iter().map(|e| (e.id, e.nickname));
        self.session = Some(Session::new(self.sim_config.clone(), seed, roster));
        tracing::info!(seed, "match started");

        self.broadcast(&ServerMessage::GameStart {});
        self.ticker.resume();
    }

    fn on_tick(&mut self, info: &TickInfo) {
        let Some(session) = self.session.as_mut() else {
            self.ticker.pause();
            return;
        };

        let dt = info.dt;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let report = session.tick(dt);
            (report.outcome, session.snapshot())
        }));

        match result {
            Ok((outcome, snapshot)) => {
                self.broadcast(&ServerMessage::State(Box::new(snapshot)));
                if let Some(outcome) = outcome {
                    self.end_match(Some(outcome));
                }
            }
            Err(_) => {
                tracing::error!(tick = info.tick, "session tick panicked, abandoning match");
                self.end_match(None);
            }
        }
    }

    /// Announces the result (if any) and returns to a fresh waiting lobby.
    fn end_match(&mut self, outcome: Option<MatchOutcome>) {
        match outcome {
            Some(MatchOutcome::Winner { id, nickname }) => {
                tracing::info!(winner = %id, %nickname, "match won");
                self.broadcast(&ServerMessage::Winner {
                    id: Some(id),
                    nickname: Some(nickname),
                });
            }
            Some(MatchOutcome::Tie) => {
                tracing::info!("match tied");
                self.broadcast(&ServerMessage::Winner {
                    id: None,
                    nickname: None,
                });
            }
            None => {}
        }

        self.ticker.pause();
        self.session = None;
        self.lobby.finish_match();
        self.lobby.reset();
        self.waiting.disarm();
        self.countdown.disarm();
        for member in self.members.values_mut() {
            member.nickname = None;
        }
        self.broadcast(&ServerMessage::PlayerList(self.lobby.roster()));
    }

    fn is_joined(&self, player_id: PlayerId) -> bool {
        self.members
            .get(&player_id)
            .is_some_and(|m| m.nickname.is_some())
    }

    fn announce(&mut self, message: String) {
        self.broadcast(&ServerMessage::Chat {
            nickname: SYSTEM_NICKNAME.to_string(),
            message,
        });
    }

    fn encode(&self, msg: &ServerMessage) -> Option<Arc<str>> {
        match self.codec.encode(msg) {
            Ok(text) => Some(Arc::from(text)),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode server message");
                None
            }
        }
    }

    /// Sends to every connected client.
    fn broadcast(&mut self, msg: &ServerMessage) {
        let Some(frame) = self.encode(msg) else {
            return;
        };
        let ids: Vec<PlayerId> = self.members.keys().copied().collect();
        for player_id in ids {
            self.deliver(player_id, Outbound::Frame(Arc::clone(&frame)));
        }
    }

    fn send_to(&mut self, player_id: PlayerId, msg: &ServerMessage) {
        if let Some(frame) = self.encode(msg) {
            self.deliver(player_id, Outbound::Frame(frame));
        }
    }

    /// Queues one item without waiting. A closed queue means the writer is
    /// gone and its guard will disconnect; a full one marks the client stalled.
    fn deliver(&mut self, player_id: PlayerId, outbound: Outbound) {
        let Some(member) = self.members.get(&player_id) else {
            return;
        };
        if let Err(TrySendError::Full(_)) = member.sender.try_send(outbound) {
            self.stalled.insert(player_id);
        }
    }

    /// Disconnects every stalled client. Departures broadcast too, so this
    /// repeats until no new client stalls.
    fn drop_stalled(&mut self) {
        while let Some(player_id) = self.stalled.pop_first() {
            tracing::warn!(%player_id, "client queue full, dropping client");
            self.handle_disconnect(player_id);
        }
    }

    fn status(&self) -> ArenaStatus {
        ArenaStatus {
            phase: self.lobby.phase(),
            lobby_players: self.lobby.len(),
            connected: self.members.len(),
            alive_in_match: self.session.as_ref().map(Session::alive_count),
        }
    }
}

/// Spawns the arena actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; connection tasks wait when it is
/// full. `sim_config` is passed through [`SimConfig::validated`].
pub fn spawn_arena(
    lobby_config: LobbyConfig,
    sim_config: SimConfig,
    tick_config: TickConfig,
    channel_size: usize,
) -> ArenaHandle {
    let (sender, receiver) = mpsc::channel(channel_size);
    let actor = ArenaActor {
        lobby: Lobby::new(lobby_config),
        sim_config: sim_config.validated(),
        session: None,
        members: BTreeMap::new(),
        ticker: TickScheduler::paused(tick_config),
        waiting: SecondsTimer::new(),
        countdown: SecondsTimer::new(),
        codec: JsonCodec,
        receiver,
        stalled: BTreeSet::new(),
    };
    tokio::spawn(actor.run());
    ArenaHandle { sender }
}
