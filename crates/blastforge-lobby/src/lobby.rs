//! The lobby roster and its matchmaking rules.

use blastforge_protocol::{LobbyPlayer, PlayerId};

use crate::{JoinError, LobbyConfig, LobbyPhase};

/// A player holding a lobby slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyEntry {
    pub id: PlayerId,
    pub nickname: String,
}

/// Something the owner of the lobby must do in response to a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEffect {
    /// Arm the waiting timer for `seconds`.
    StartWaiting { seconds: u32 },
    /// Disarm the waiting timer and arm the countdown for `seconds`.
    StartCountdown { seconds: u32 },
    /// Disarm every lobby timer; the lobby is back to plain waiting.
    CancelTimers,
    /// The countdown finished. Start a match with these players, in slot
    /// order. The lobby roster is now empty.
    StartMatch(Vec<LobbyEntry>),
}

/// The result of removing a player from the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub entry: LobbyEntry,
    pub effect: Option<LobbyEffect>,
}

/// The pre-match roster and phase.
///
/// Not thread-safe by itself; the arena actor owns it and serialises every
/// call.
#[derive(Debug)]
pub struct Lobby {
    config: LobbyConfig,
    phase: LobbyPhase,
    entries: Vec<LobbyEntry>,
    waiting_armed: bool,
}

impl Lobby {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            phase: LobbyPhase::Waiting,
            entries: Vec::new(),
            waiting_armed: false,
        }
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub fn entries(&self) -> &[LobbyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Whether the waiting timer should currently be running.
    pub fn is_waiting_armed(&self) -> bool {
        self.waiting_armed
    }

    /// The roster in the shape sent to clients.
    pub fn roster(&self) -> Vec<LobbyPlayer> {
        self.entries
            .iter()
            .map(|e| LobbyPlayer {
                id: e.id,
                nickname: e.nickname.clone(),
            })
            .collect()
    }

    /// Cuts a nickname to the configured length and trims it.
    pub fn clean_nickname(&self, raw: &str) -> String {
        truncate_chars(raw.trim(), self.config.max_nickname_len)
            .trim_end()
            .to_owned()
    }

    /// Cuts a chat line to the configured length. Blank lines yield `None`.
    pub fn clean_chat(&self, raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }
        Some(truncate_chars(raw, self.config.max_chat_len).to_owned())
    }

    /// Decides whether `id` may join as `raw_nickname` without changing
    /// anything.
    ///
    /// `alive_in_match` lists the nicknames of players still alive in a
    /// running match; they are reserved just like lobby nicknames.
    ///
    /// # Errors
    /// The checks run in this order: [`JoinError::AlreadyJoined`],
    /// [`JoinError::EmptyNickname`], [`JoinError::LobbyFull`],
    /// [`JoinError::NicknameTaken`], [`JoinError::MatchInProgress`]. A full
    /// lobby wins over every refusal that keeps the connection open.
    pub fn validate_join(
        &self,
        id: PlayerId,
        raw_nickname: &str,
        alive_in_match: &[&str],
    ) -> Result<LobbyEntry, JoinError> {
        if self.contains(id) {
            return Err(JoinError::AlreadyJoined(id));
        }

        let nickname = self.clean_nickname(raw_nickname);
        if nickname.is_empty() {
            return Err(JoinError::EmptyNickname);
        }

        if self.entries.len() >= self.config.max_players {
            return Err(JoinError::LobbyFull {
                max: self.config.max_players,
            });
        }

        let wanted = nickname.to_lowercase();
        let taken = self
            .entries
            .iter()
            .map(|e| e.nickname.as_str())
            .chain(alive_in_match.iter().copied())
            .any(|other| other.trim().to_lowercase() == wanted);
        if taken {
            return Err(JoinError::NicknameTaken(nickname));
        }

        if !self.phase.is_pre_match() {
            return Err(JoinError::MatchInProgress);
        }

        Ok(LobbyEntry { id, nickname })
    }

    /// Adds a validated entry and returns what the owner should do next.
    ///
    /// Reaching capacity moves straight to the countdown (cancelling any
    /// waiting timer). Reaching the minimum arms the waiting timer unless a
    /// timer is already running.
    pub fn commit_join(&mut self, entry: LobbyEntry) -> Option<LobbyEffect> {
        tracing::info!(
            player_id = %entry.id,
            nickname = %entry.nickname,
            players = self.entries.len() + 1,
            "player joined lobby"
        );
        self.entries.push(entry);

        if self.phase != LobbyPhase::Waiting {
            return None;
        }

        if self.entries.len() >= self.config.max_players {
            return Some(self.enter_countdown());
        }

        if self.entries.len() >= self.config.min_players && !self.waiting_armed {
            self.waiting_armed = true;
            return Some(LobbyEffect::StartWaiting {
                seconds: self.config.waiting_secs,
            });
        }

        None
    }

    /// Removes a player. Returns `None` if they held no slot.
    ///
    /// Falling below the minimum before the match cancels every lobby timer
    /// and returns to [`LobbyPhase::Waiting`].
    pub fn leave(&mut self, id: PlayerId) -> Option<Departure> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(index);
        tracing::info!(
            player_id = %entry.id,
            players = self.entries.len(),
            "player left lobby"
        );

        let mut effect = None;
        if self.phase.is_pre_match() && self.entries.len() < self.config.min_players {
            let had_timer = self.waiting_armed || self.phase == LobbyPhase::Countdown;
            self.waiting_armed = false;
            if self.phase == LobbyPhase::Countdown {
                self.transition(LobbyPhase::Waiting);
            }
            if had_timer {
                effect = Some(LobbyEffect::CancelTimers);
            }
        }

        Some(Departure { entry, effect })
    }

    /// The waiting timer ran out.
    ///
    /// Starts the countdown if membership is still within
    /// `min_players..max_players`.
    pub fn waiting_elapsed(&mut self) -> Option<LobbyEffect> {
        self.waiting_armed = false;
        let count = self.entries.len();
        if self.phase == LobbyPhase::Waiting
            && count >= self.config.min_players
            && count < self.config.max_players
        {
            Some(self.enter_countdown())
        } else {
            None
        }
    }

    /// The countdown reached zero. Hands the roster over to a new match.
    pub fn countdown_elapsed(&mut self) -> Option<LobbyEffect> {
        if self.phase != LobbyPhase::Countdown {
            return None;
        }
        self.transition(LobbyPhase::Running);
        Some(LobbyEffect::StartMatch(std::mem::take(&mut self.entries)))
    }

    /// The running match produced a result.
    pub fn finish_match(&mut self) {
        if self.phase == LobbyPhase::Running {
            self.transition(LobbyPhase::Ended);
        }
    }

    /// Discards all membership and returns to a fresh waiting lobby.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.waiting_armed = false;
        if self.phase != LobbyPhase::Waiting {
            self.phase = LobbyPhase::Waiting;
            tracing::info!("lobby reset");
        }
    }

    fn enter_countdown(&mut self) -> LobbyEffect {
        self.waiting_armed = false;
        self.transition(LobbyPhase::Countdown);
        LobbyEffect::StartCountdown {
            seconds: self.config.countdown_secs,
        }
    }

    fn transition(&mut self, to: LobbyPhase) {
        debug_assert!(
            self.phase.can_transition_to(to),
            "illegal lobby transition {} -> {}",
            self.phase,
            to
        );
        tracing::info!(from = %self.phase, %to, players = self.entries.len(), "lobby phase changed");
        self.phase = to;
    }
}

/// Returns the prefix of `s` holding at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
