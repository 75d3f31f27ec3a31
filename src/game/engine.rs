//! Authoritative game task
//!
//! One task owns every piece of mutable game state. Connection handlers and
//! timers only enqueue `GameInput`s; each input is validated, applied and
//! broadcast to completion before the next one is looked at, so compound
//! invariants (one relic holder, one score per delivery) hold without locks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::Config;
use crate::util::time::{unix_millis, GAME_RESET_DELAY, RELIC_RESPAWN_DELAY};
use crate::ws::protocol::{ClientMsg, RejectReason, ServerMsg};

use super::exploration::{ExplorationLedger, TileKey};
use super::outbox::Outbox;
use super::physics::CollisionSystem;
use super::relic::{RelicError, RelicState};
use super::score::ScoreTable;
use super::session::{JoinError, SessionRegistry};
use super::snapshot::SnapshotBuilder;
use super::world::{WorldConfig, SCORE_RANGE};

/// Depth of the shared inbound queue
pub const INPUT_QUEUE_CAPACITY: usize = 1024;

/// Everything the game task reacts to, processed strictly in arrival order
#[derive(Debug)]
pub enum GameInput {
    /// A socket opened; its outbound queue is registered for broadcasts
    Connect {
        conn_id: Uuid,
        outbox: mpsc::Sender<ServerMsg>,
    },
    /// A parsed client message
    Client {
        conn_id: Uuid,
        msg: ClientMsg,
        received_at: u64,
    },
    /// The socket closed
    Disconnect { conn_id: Uuid },
    /// A deferred transition came due
    Timer { kind: TimerKind, epoch: u64 },
}

/// Deferred transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    RelicRespawn,
    GameReset,
}

impl TimerKind {
    pub fn delay(self) -> Duration {
        match self {
            TimerKind::RelicRespawn => RELIC_RESPAWN_DELAY,
            TimerKind::GameReset => GAME_RESET_DELAY,
        }
    }
}

/// A timer requested by a handler, armed by the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub kind: TimerKind,
    /// Game epoch at scheduling time; a reset makes it stale
    pub epoch: u64,
}

/// Tunables that come from configuration rather than the rules
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub max_move_delta: Option<f64>,
    pub max_chat_length: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GameSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_move_delta: config.max_move_delta,
            max_chat_length: config.max_chat_length,
        }
    }
}

/// Reasons a client action was dropped. None of these are sent back to the
/// client; the absence of a state update is the only feedback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("connection has not joined")]
    UnknownPlayer,

    #[error("join refused: {0}")]
    Join(#[from] JoinError),

    #[error("zero movement delta")]
    ZeroDelta,

    #[error("non-finite movement delta")]
    NonFinite,

    #[error("movement delta {distance:.1} exceeds cap {limit:.1}")]
    TooFar { distance: f64, limit: f64 },

    #[error("destination is blocked")]
    Blocked,

    #[error("player has no base")]
    NoBase,

    #[error("base is {distance:.1} units away")]
    BaseOutOfRange { distance: f64 },

    #[error(transparent)]
    Relic(#[from] RelicError),

    #[error("empty chat message")]
    EmptyChat,
}

/// Cheap handle for connection tasks and HTTP routes
#[derive(Clone)]
pub struct GameHandle {
    pub input_tx: mpsc::Sender<GameInput>,
    pub player_count: Arc<AtomicUsize>,
    pub connection_count: Arc<AtomicUsize>,
}

impl GameHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn connection_count(&self) -> usize {
        self.connection_count.load(Ordering::Relaxed)
    }
}

/// The authoritative game
pub struct Game {
    world: WorldConfig,
    settings: GameSettings,
    sessions: SessionRegistry,
    relic: RelicState,
    scores: ScoreTable,
    ledger: ExplorationLedger,
    outbox: Outbox,
    /// Bumped on every reset; timers from older epochs are ignored
    epoch: u64,
    pending_timers: Vec<ScheduledTimer>,
    player_count: Arc<AtomicUsize>,
    connection_count: Arc<AtomicUsize>,
}

impl Game {
    pub fn new(world: WorldConfig, settings: GameSettings) -> Self {
        let (columns, rows) = world.tile_grid();
        Self {
            relic: RelicState::new(world.center()),
            ledger: ExplorationLedger::new(columns, rows),
            world,
            settings,
            sessions: SessionRegistry::new(),
            scores: ScoreTable::new(),
            outbox: Outbox::new(),
            epoch: 0,
            pending_timers: Vec::new(),
            player_count: Arc::new(AtomicUsize::new(0)),
            connection_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start the game task and return a handle to feed it
    pub fn spawn(self) -> GameHandle {
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
        let handle = GameHandle {
            input_tx: input_tx.clone(),
            player_count: self.player_count.clone(),
            connection_count: self.connection_count.clone(),
        };

        // Timers hold a weak sender so they never keep the task alive
        tokio::spawn(self.run(input_rx, input_tx.downgrade()));
        handle
    }

    /// Consume inputs one at a time until every sender is gone
    pub async fn run(
        mut self,
        mut input_rx: mpsc::Receiver<GameInput>,
        timer_tx: mpsc::WeakSender<GameInput>,
    ) {
        info!("Game task started");

        while let Some(input) = input_rx.recv().await {
            self.handle(input);

            for timer in self.take_timers() {
                arm_timer(timer, timer_tx.clone());
            }
        }

        info!("Game task stopped");
    }

    /// Apply one input to completion
    pub fn handle(&mut self, input: GameInput) {
        match input {
            GameInput::Connect { conn_id, outbox } => {
                self.outbox.register(conn_id, outbox);
                self.sync_counts();
                debug!(conn_id = %conn_id, "Connection registered");
            }
            GameInput::Client {
                conn_id,
                msg,
                received_at,
            } => {
                trace!(conn_id = %conn_id, received_at, ?msg, "Client message");
                if let Err(e) = self.handle_client(conn_id, msg) {
                    debug!(conn_id = %conn_id, error = %e, "Dropped client action");
                }
            }
            GameInput::Disconnect { conn_id } => {
                self.handle_disconnect(conn_id);
            }
            GameInput::Timer { kind, epoch } => {
                self.handle_timer(kind, epoch);
            }
        }
    }

    /// Timers requested since the last call
    pub fn take_timers(&mut self) -> Vec<ScheduledTimer> {
        std::mem::take(&mut self.pending_timers)
    }

    fn handle_client(&mut self, conn_id: Uuid, msg: ClientMsg) -> Result<(), ActionError> {
        match msg {
            ClientMsg::Join { name } => self.handle_join(conn_id, &name),
            ClientMsg::Move {
                dir,
                dx,
                dy,
                timestamp,
            } => {
                trace!(conn_id = %conn_id, dir = dir.as_deref().unwrap_or("-"), "Move");
                self.handle_move(conn_id, dx, dy, timestamp)
            }
            ClientMsg::GrabRelic { .. } => self.handle_grab(conn_id),
            ClientMsg::ScoreRelic { .. } => self.handle_score(conn_id),
            ClientMsg::ExploreTiles { tiles, .. } => self.handle_explore(conn_id, tiles),
            ClientMsg::Chat { message, timestamp } => self.handle_chat(conn_id, message, timestamp),
            ClientMsg::Ping { t } => {
                self.outbox.send_to(
                    &conn_id,
                    ServerMsg::Pong {
                        t,
                        server_time: unix_millis(),
                    },
                );
                Ok(())
            }
        }
    }

    fn handle_join(&mut self, conn_id: Uuid, name: &str) -> Result<(), ActionError> {
        let joined = match self.sessions.join(&self.world, conn_id, name) {
            Ok(player) => SnapshotBuilder::player_info(player),
            Err(JoinError::GameFull) => {
                info!(conn_id = %conn_id, "Join rejected, game full");
                self.outbox.send_to(
                    &conn_id,
                    ServerMsg::Rejected {
                        reason: RejectReason::GameFull,
                    },
                );
                return Err(JoinError::GameFull.into());
            }
            Err(e) => return Err(e.into()),
        };
        self.scores.insert(conn_id);
        self.sync_counts();

        info!(
            conn_id = %conn_id,
            name = %joined.name,
            slot = joined.slot,
            player_count = self.sessions.len(),
            "Player joined"
        );

        let initial = self.initial_state(Some(conn_id));
        self.outbox.send_to(&conn_id, initial);
        self.outbox.broadcast(&ServerMsg::PlayerJoined { player: joined });
        Ok(())
    }

    fn handle_move(
        &mut self,
        conn_id: Uuid,
        dx: f64,
        dy: f64,
        timestamp: Option<f64>,
    ) -> Result<(), ActionError> {
        let player = self
            .sessions
            .get(&conn_id)
            .ok_or(ActionError::UnknownPlayer)?;

        if dx == 0.0 && dy == 0.0 {
            return Err(ActionError::ZeroDelta);
        }
        if !dx.is_finite() || !dy.is_finite() {
            return Err(ActionError::NonFinite);
        }
        if let Some(limit) = self.settings.max_move_delta {
            let distance = dx.hypot(dy);
            if distance > limit {
                return Err(ActionError::TooFar { distance, limit });
            }
        }

        let (x, y) = (player.x + dx, player.y + dy);
        if CollisionSystem::check_collision(&self.world, x, y) {
            return Err(ActionError::Blocked);
        }

        if let Some(player) = self.sessions.get_mut(&conn_id) {
            player.x = x;
            player.y = y;
            player.last_timestamp = timestamp.or(player.last_timestamp);
        }

        self.outbox
            .broadcast(&SnapshotBuilder::player_snapshot(&self.sessions));
        Ok(())
    }

    fn handle_grab(&mut self, conn_id: Uuid) -> Result<(), ActionError> {
        let player = self
            .sessions
            .get(&conn_id)
            .ok_or(ActionError::UnknownPlayer)?;

        self.relic.grab(conn_id, player.x, player.y)?;
        if let Some(player) = self.sessions.get_mut(&conn_id) {
            player.has_relic = true;
        }

        info!(conn_id = %conn_id, "Relic grabbed");
        self.broadcast_relic_and_players();
        Ok(())
    }

    fn handle_score(&mut self, conn_id: Uuid) -> Result<(), ActionError> {
        let player = self
            .sessions
            .get(&conn_id)
            .ok_or(ActionError::UnknownPlayer)?;

        if !player.has_relic || self.relic.holder_id() != Some(conn_id) {
            return Err(RelicError::NotHolder.into());
        }

        let base = self.world.base(player.slot).ok_or(ActionError::NoBase)?;
        let distance = CollisionSystem::distance(player.x, player.y, base.rect.x, base.rect.y);
        if distance > SCORE_RANGE {
            return Err(ActionError::BaseOutOfRange { distance });
        }
        if self.scores.get(&conn_id).is_none() {
            return Err(ActionError::UnknownPlayer);
        }

        self.relic.deliver(conn_id)?;
        if let Some(player) = self.sessions.get_mut(&conn_id) {
            player.has_relic = false;
        }
        let score = self.scores.increment(&conn_id).unwrap_or_default();
        let winner = ScoreTable::is_winning(score).then_some(conn_id);

        info!(conn_id = %conn_id, score, won = winner.is_some(), "Relic delivered");

        self.outbox.broadcast(&ServerMsg::ScoreChanged {
            score_table: self.scores.snapshot(),
            scoring_player: conn_id,
            winning_player: winner,
        });
        self.broadcast_relic_and_players();

        // A win skips the plain respawn; the reset brings the relic back
        if winner.is_some() {
            info!(conn_id = %conn_id, "Game won, reset scheduled");
            self.schedule(TimerKind::GameReset);
        } else {
            self.schedule(TimerKind::RelicRespawn);
        }
        Ok(())
    }

    fn handle_explore(&mut self, conn_id: Uuid, tiles: Vec<TileKey>) -> Result<(), ActionError> {
        if self.sessions.get(&conn_id).is_none() {
            return Err(ActionError::UnknownPlayer);
        }

        // Never broadcast: exploration stays private to each client
        let reported = tiles.len();
        let added = self.ledger.merge(tiles);
        debug!(conn_id = %conn_id, reported, added, total = self.ledger.len(), "Tiles explored");
        Ok(())
    }

    fn handle_chat(
        &mut self,
        conn_id: Uuid,
        message: String,
        timestamp: Option<f64>,
    ) -> Result<(), ActionError> {
        let player = self
            .sessions
            .get(&conn_id)
            .ok_or(ActionError::UnknownPlayer)?;

        let message: String = message
            .trim()
            .chars()
            .take(self.settings.max_chat_length)
            .collect();
        if message.is_empty() {
            return Err(ActionError::EmptyChat);
        }

        let msg = ServerMsg::Chat {
            id: conn_id,
            name: player.name.clone(),
            message,
            timestamp: timestamp.unwrap_or_else(|| unix_millis() as f64),
        };
        self.outbox.broadcast(&msg);
        Ok(())
    }

    fn handle_disconnect(&mut self, conn_id: Uuid) {
        self.outbox.unregister(&conn_id);

        if let Some(player) = self.sessions.get(&conn_id) {
            // Drop the relic where the holder stood before they vanish
            if self.relic.holder_id() == Some(conn_id) {
                let (x, y) = (player.x, player.y);
                if self.relic.drop_at(conn_id, x, y).is_ok() {
                    info!(conn_id = %conn_id, x, y, "Relic dropped by disconnect");
                    self.outbox
                        .broadcast(&SnapshotBuilder::relic_status(&self.relic, &self.sessions));
                }
            }

            self.sessions.leave(&conn_id);
            self.scores.remove(&conn_id);
            self.outbox.broadcast(&ServerMsg::PlayerLeft {
                id: conn_id,
                timestamp: unix_millis(),
            });

            info!(
                conn_id = %conn_id,
                player_count = self.sessions.len(),
                "Player left"
            );
        }

        self.sync_counts();
        debug!(conn_id = %conn_id, "Connection closed");
        if self.outbox.is_empty() {
            info!("Last connection closed, game idle");
        }
    }

    fn handle_timer(&mut self, kind: TimerKind, epoch: u64) {
        if epoch != self.epoch {
            debug!(?kind, epoch, current = self.epoch, "Stale timer ignored");
            return;
        }

        match kind {
            TimerKind::RelicRespawn => {
                if self.relic.respawn().is_ok() {
                    info!("Relic respawned");
                    self.outbox
                        .broadcast(&SnapshotBuilder::relic_status(&self.relic, &self.sessions));
                }
            }
            TimerKind::GameReset => self.reset(),
        }
    }

    /// Start a fresh game with the current roster
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.scores.reset();
        self.ledger.clear();
        self.sessions.reset_positions(&self.world);
        self.relic.reset();

        for conn_id in self.outbox.connection_ids() {
            let self_id = self.sessions.get(&conn_id).map(|p| p.id);
            let state = self.initial_state(self_id);
            self.outbox.send_to(&conn_id, state);
        }

        info!(epoch = self.epoch, player_count = self.sessions.len(), "Game reset");
    }

    fn initial_state(&self, self_id: Option<Uuid>) -> ServerMsg {
        SnapshotBuilder::initial_state(
            self_id,
            &self.world,
            &self.sessions,
            &self.relic,
            &self.scores,
            &self.ledger,
        )
    }

    fn broadcast_relic_and_players(&self) {
        self.outbox
            .broadcast(&SnapshotBuilder::relic_status(&self.relic, &self.sessions));
        self.outbox
            .broadcast(&SnapshotBuilder::player_snapshot(&self.sessions));
    }

    fn schedule(&mut self, kind: TimerKind) {
        self.pending_timers.push(ScheduledTimer {
            kind,
            epoch: self.epoch,
        });
    }

    fn sync_counts(&self) {
        self.player_count
            .store(self.sessions.len(), Ordering::Relaxed);
        self.connection_count
            .store(self.outbox.len(), Ordering::Relaxed);
    }
}

/// Sleep, then feed the timer back through the game queue
fn arm_timer(timer: ScheduledTimer, timer_tx: mpsc::WeakSender<GameInput>) {
    tokio::spawn(async move {
        tokio::time::sleep(timer.kind.delay()).await;

        let Some(tx) = timer_tx.upgrade() else {
            debug!(kind = ?timer.kind, "Game task gone, timer dropped");
            return;
        };
        let input = GameInput::Timer {
            kind: timer.kind,
            epoch: timer.epoch,
        };
        if tx.send(input).await.is_err() {
            debug!(kind = ?timer.kind, "Game queue closed, timer dropped");
        }
    });
}
