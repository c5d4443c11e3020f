//! Per-game engine actor: the single writer of a game's state.
//!
//! The actor mailbox is the game's action mailbox (capacity 32, try_send
//! with drop-on-full at the senders); turn and reconnect-window timers are
//! actor timers; all broadcasts flow through the engine-owned hub.

use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use log::{error, info, warn};
use serde::Serialize;

use crate::config::Balance;
use crate::dice::Roller;
use crate::game::{
    check_disconnect_forfeit, execute_attack, execute_buy, execute_end_turn, execute_move,
    find_structure_target, now_unix, resolve_structure_fire, run_turn_start, GameState,
};
use crate::hex::Coord;
use crate::model::{ErrorCode, GamePhase, TroopKind};
use crate::store::Store;

use super::hub::GameHub;
use super::messages::{
    envelope, AckData, Delta, DestroyCause, EmoteData, ErrorData, GameOverData, NackData,
    PlayerDisconnectedData, PlayerReconnectedData, TroopDestroyedData, MSG_ACK, MSG_EMOTE,
    MSG_GAME_OVER, MSG_GAME_STATE, MSG_NACK, MSG_PLAYER_DISCONNECTED, MSG_PLAYER_RECONNECTED,
    MSG_TURN_START,
};
use super::session::{GameSocket, ServerFrame};

/// Bounded size of the engine's action mailbox.
pub const ACTION_MAILBOX_CAPACITY: usize = 32;

const LIVE_SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const FINISHED_SNAPSHOT_TTL: Duration = Duration::from_secs(60 * 60);

/// A player intent parsed and validated by the transport bridge.
#[derive(Debug, Clone)]
pub enum ClientAction {
    JoinGame,
    Move { unit_id: String, target: Coord },
    Attack { unit_id: String, target: Coord },
    Buy { unit_type: TroopKind, structure_id: String },
    EndTurn,
    Emote { emote_id: String },
}

impl ClientAction {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientAction::JoinGame => super::messages::MSG_JOIN_GAME,
            ClientAction::Move { .. } => super::messages::MSG_MOVE,
            ClientAction::Attack { .. } => super::messages::MSG_ATTACK,
            ClientAction::Buy { .. } => super::messages::MSG_BUY,
            ClientAction::EndTurn => super::messages::MSG_END_TURN,
            ClientAction::Emote { .. } => MSG_EMOTE,
        }
    }
}

/// An action event in the engine's mailbox.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ClientCommand {
    pub player_id: String,
    pub seq: u64,
    pub action: ClientAction,
    pub addr: Addr<GameSocket>,
}

/// A player's session dropped.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub player_id: String,
}

/// A player came back within the reconnect window.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Reconnect {
    pub player_id: String,
    pub addr: Addr<GameSocket>,
}

/// Serialized state plus its TTL, for shutdown drain.
pub struct Snapshot {
    pub game_id: String,
    pub data: Vec<u8>,
    pub ttl: Duration,
}

/// Asks the engine for a final snapshot (shutdown drain).
#[derive(Message)]
#[rtype(result = "Result<Snapshot, String>")]
pub struct TakeSnapshot;

/// Stops the engine's event loop.
#[derive(Message)]
#[rtype(result = "()")]
pub struct StopEngine;

pub struct GameEngine {
    state: GameState,
    balance: Arc<Balance>,
    roller: Roller,
    hub: GameHub,
    store: Store,
    reconnect_window: Duration,
    turn_timer: Option<SpawnHandle>,
    reconnect_timer: Option<SpawnHandle>,
    disconnected_id: Option<String>,
}

impl GameEngine {
    pub fn new(
        state: GameState,
        balance: Arc<Balance>,
        store: Store,
        reconnect_window: Duration,
    ) -> Self {
        let roller = Roller::new(state.seed);
        GameEngine {
            state,
            balance,
            roller,
            hub: GameHub::new(),
            store,
            reconnect_window,
            turn_timer: None,
            reconnect_timer: None,
            disconnected_id: None,
        }
    }

    // --- Outbound plumbing ---

    fn send_frame(&self, addr: &Addr<GameSocket>, frame: String) {
        if let Err(e) = addr.try_send(ServerFrame(frame)) {
            warn!("[Engine] direct send failed game_id={}: {e}", self.state.id);
        }
    }

    fn send_ack(&self, cmd: &ClientCommand) {
        let ack = AckData { seq: cmd.seq, action_type: cmd.action.kind().to_string() };
        if let Ok(frame) = envelope(MSG_ACK, &ack) {
            self.send_frame(&cmd.addr, frame);
        }
    }

    fn send_nack(&self, cmd: &ClientCommand, error: ErrorData) {
        let nack = NackData {
            seq: cmd.seq,
            action_type: cmd.action.kind().to_string(),
            error,
        };
        if let Ok(frame) = envelope(MSG_NACK, &nack) {
            self.send_frame(&cmd.addr, frame);
        }
    }

    /// Broadcasts a typed message; sessions with a full buffer are dropped
    /// and walk the disconnect path.
    fn broadcast<T: Serialize>(&mut self, ctx: &mut Context<Self>, kind: &str, data: &T) {
        let dropped = self.hub.broadcast_message(kind, data);
        for player_id in dropped {
            self.mark_disconnected(player_id, ctx);
        }
    }

    /// Broadcasts an action's deltas as one contiguous block.
    fn broadcast_deltas(&mut self, ctx: &mut Context<Self>, deltas: &[Delta]) {
        for delta in deltas {
            match delta.payload() {
                Ok(payload) => self.broadcast(ctx, delta.message_type(), &payload),
                Err(e) => error!(
                    "[Engine] failed to serialize {} delta game_id={}: {e}",
                    delta.message_type(),
                    self.state.id
                ),
            }
        }
    }

    fn send_full_state(&mut self, player_id: &str) {
        self.hub.send_message_to(player_id, MSG_GAME_STATE, &self.state);
    }

    fn broadcast_full_state(&mut self, ctx: &mut Context<Self>) {
        let dropped = self.hub.broadcast_message(MSG_GAME_STATE, &self.state);
        for player_id in dropped {
            self.mark_disconnected(player_id, ctx);
        }
    }

    // --- Game flow ---

    fn handle_join(&mut self, cmd: ClientCommand, ctx: &mut Context<Self>) {
        if self.state.player_index(&cmd.player_id).is_none() {
            self.send_nack(
                &cmd,
                ErrorData::new(ErrorCode::GameNotFound, "you are not in this game"),
            );
            return;
        }

        self.hub.register(&cmd.player_id, cmd.addr.clone());
        if let Some(idx) = self.state.player_index(&cmd.player_id) {
            self.state.players[idx].is_disconnected = false;
        }
        self.send_ack(&cmd);
        self.send_full_state(&cmd.player_id);

        if self.hub.connected_count() >= 2 && self.state.phase == GamePhase::WaitingForPlayers {
            self.start_game(ctx);
        }
    }

    /// Both players are connected: leave the lobby phase and start turn 1.
    fn start_game(&mut self, ctx: &mut Context<Self>) {
        self.state.phase = GamePhase::GeneratingMap;
        info!("[Engine] both players connected, game starting game_id={}", self.state.id);

        // The map was generated at creation; announce the fully built state.
        self.state.phase = GamePhase::GameStarted;
        self.broadcast_full_state(ctx);

        self.state.turn_number = 1;
        let turn_start = run_turn_start(&mut self.state, &self.balance);
        self.state.phase = GamePhase::PlayerAction;
        self.broadcast(ctx, MSG_TURN_START, &turn_start);
        self.start_turn_timer(ctx);
    }

    fn handle_end_turn_result(
        &mut self,
        result: crate::game::ActionResult,
        ctx: &mut Context<Self>,
    ) {
        if let Some(handle) = self.turn_timer.take() {
            ctx.cancel_future(handle);
        }

        if let Some(game_over) = result.game_over {
            // The end-of-turn evaluation (or sudden death) decided the game;
            // broadcast whatever the executor produced, then finish.
            self.broadcast_deltas(ctx, &result.deltas);
            self.end_game(game_over, ctx);
            return;
        }

        self.run_structure_combat(ctx);
        self.broadcast_deltas(ctx, &result.deltas);
        self.snapshot_state(ctx);
        self.start_turn_timer(ctx);
    }

    /// Every structure fires once at its chosen target, in insertion order.
    fn run_structure_combat(&mut self, ctx: &mut Context<Self>) {
        self.state.phase = GamePhase::StructureCombat;

        let structure_ids: Vec<String> =
            self.state.structures.iter().map(|s| s.id.clone()).collect();

        for structure_id in structure_ids {
            let Some(target_id) = find_structure_target(&self.state, &mut self.roller, &structure_id)
            else {
                continue;
            };
            let target_hex = self
                .state
                .get_troop(&target_id)
                .map(|t| t.hex)
                .unwrap_or_else(Coord::origin);

            let result = resolve_structure_fire(
                &mut self.state,
                &self.balance,
                &mut self.roller,
                &structure_id,
                &target_id,
            );
            let killed = result.killed;
            self.broadcast(ctx, super::messages::MSG_STRUCTURE_FIRES, &result);

            if killed {
                let destroyed = TroopDestroyedData {
                    unit_id: target_id.clone(),
                    hex_q: target_hex.q,
                    hex_r: target_hex.r,
                    hex_s: target_hex.s,
                    cause: DestroyCause::StructureFire,
                };
                self.broadcast(ctx, super::messages::MSG_TROOP_DESTROYED, &destroyed);
                self.state.remove_troop(&target_id);
            }
        }

        self.state.phase = GamePhase::PlayerAction;
    }

    fn start_turn_timer(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.turn_timer.take() {
            ctx.cancel_future(handle);
        }
        let duration = Duration::from_secs(self.state.turn_timer as u64);
        self.state.turn_started_at = now_unix();
        self.turn_timer = Some(ctx.run_later(duration, |act, ctx| {
            act.turn_timer = None;
            act.handle_turn_timeout(ctx);
        }));
    }

    /// Timer expiry ends the active player's turn for them.
    fn handle_turn_timeout(&mut self, ctx: &mut Context<Self>) {
        if self.state.phase != GamePhase::PlayerAction {
            return;
        }
        let active_id = self.state.active_player_id().to_string();
        info!(
            "[Engine] turn timer expired game_id={} turn={} player_id={active_id}",
            self.state.id, self.state.turn_number
        );

        let result = execute_end_turn(&mut self.state, &self.balance, &active_id);
        if result.ack {
            self.handle_end_turn_result(result, ctx);
        }
    }

    fn mark_disconnected(&mut self, player_id: String, ctx: &mut Context<Self>) {
        // Ignore repeats for the player whose window is already counting.
        if self.reconnect_timer.is_some() && self.disconnected_id.as_deref() == Some(&player_id) {
            return;
        }

        info!("[Engine] player disconnected game_id={} player_id={player_id}", self.state.id);
        if let Some(idx) = self.state.player_index(&player_id) {
            self.state.players[idx].is_disconnected = true;
        }
        self.hub.unregister(&player_id);
        self.disconnected_id = Some(player_id.clone());

        self.broadcast(
            ctx,
            MSG_PLAYER_DISCONNECTED,
            &PlayerDisconnectedData { player_id },
        );

        if self.state.phase == GamePhase::GameOver {
            return;
        }

        if let Some(handle) = self.reconnect_timer.take() {
            ctx.cancel_future(handle);
        }
        self.reconnect_timer = Some(ctx.run_later(self.reconnect_window, |act, ctx| {
            act.reconnect_timer = None;
            act.handle_reconnect_timeout(ctx);
        }));
    }

    fn handle_reconnect_timeout(&mut self, ctx: &mut Context<Self>) {
        let Some(player_id) = self.disconnected_id.clone() else {
            return;
        };
        if self.state.phase == GamePhase::GameOver {
            return;
        }
        info!(
            "[Engine] reconnect window expired game_id={} player_id={player_id}",
            self.state.id
        );
        let game_over = check_disconnect_forfeit(&mut self.state, &player_id);
        self.end_game(game_over, ctx);
    }

    fn end_game(&mut self, game_over: GameOverData, ctx: &mut Context<Self>) {
        if let Some(handle) = self.turn_timer.take() {
            ctx.cancel_future(handle);
        }
        info!(
            "[Engine] game over game_id={} winner_id={} reason={:?}",
            self.state.id, game_over.winner_id, game_over.reason
        );
        self.broadcast(ctx, MSG_GAME_OVER, &game_over);
        self.snapshot_state(ctx);
    }

    fn snapshot_ttl(&self) -> Duration {
        if self.state.phase == GamePhase::GameOver {
            FINISHED_SNAPSHOT_TTL
        } else {
            LIVE_SNAPSHOT_TTL
        }
    }

    /// Persists the state in the background. Failures are logged and never
    /// roll anything back; the next snapshot covers the gap.
    fn snapshot_state(&mut self, ctx: &mut Context<Self>) {
        let data = match self.state.serialize() {
            Ok(data) => data,
            Err(e) => {
                error!("[Engine] failed to serialize state game_id={}: {e}", self.state.id);
                return;
            }
        };
        let ttl = self.snapshot_ttl();
        let store = self.store.clone();
        let game_id = self.state.id.clone();

        ctx.spawn(
            async move {
                if let Err(e) = store.save_game_state(&game_id, data, ttl).await {
                    error!("[Engine] snapshot failed game_id={game_id}: {e}");
                }
            }
            .into_actor(self),
        );
    }
}

impl Actor for GameEngine {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.set_mailbox_capacity(ACTION_MAILBOX_CAPACITY);
        info!(
            "[Engine] started game_id={} players=[{}, {}] map_size={:?}",
            self.state.id, self.state.players[0].id, self.state.players[1].id, self.state.map_size
        );

        // Restored games resume mid-turn with a fresh timer.
        if self.state.phase == GamePhase::PlayerAction {
            self.start_turn_timer(ctx);
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("[Engine] stopped game_id={}", self.state.id);
    }
}

impl Handler<ClientCommand> for GameEngine {
    type Result = ();

    fn handle(&mut self, cmd: ClientCommand, ctx: &mut Context<Self>) {
        match cmd.action.clone() {
            ClientAction::JoinGame => self.handle_join(cmd, ctx),
            ClientAction::Move { unit_id, target } => {
                let result =
                    execute_move(&mut self.state, &self.balance, &cmd.player_id, &unit_id, target);
                match result.error {
                    Some(error) => self.send_nack(&cmd, error),
                    None => {
                        self.send_ack(&cmd);
                        self.broadcast_deltas(ctx, &result.deltas);
                    }
                }
            }
            ClientAction::Attack { unit_id, target } => {
                let result = execute_attack(
                    &mut self.state,
                    &self.balance,
                    &mut self.roller,
                    &cmd.player_id,
                    &unit_id,
                    target,
                );
                match result.error {
                    Some(error) => self.send_nack(&cmd, error),
                    None => {
                        self.send_ack(&cmd);
                        self.broadcast_deltas(ctx, &result.deltas);
                        if let Some(game_over) = result.game_over {
                            self.end_game(game_over, ctx);
                        }
                    }
                }
            }
            ClientAction::Buy { unit_type, structure_id } => {
                let result = execute_buy(
                    &mut self.state,
                    &self.balance,
                    &cmd.player_id,
                    unit_type,
                    &structure_id,
                );
                match result.error {
                    Some(error) => self.send_nack(&cmd, error),
                    None => {
                        self.send_ack(&cmd);
                        self.broadcast_deltas(ctx, &result.deltas);
                    }
                }
            }
            ClientAction::EndTurn => {
                let result = execute_end_turn(&mut self.state, &self.balance, &cmd.player_id);
                match result.error {
                    Some(error) => self.send_nack(&cmd, error),
                    None => {
                        self.send_ack(&cmd);
                        self.handle_end_turn_result(result, ctx);
                    }
                }
            }
            ClientAction::Emote { emote_id } => {
                // Relay to the opponent untouched.
                if self.state.player_index(&cmd.player_id).is_some() {
                    let opponent = if self.state.players[0].id == cmd.player_id {
                        self.state.players[1].id.clone()
                    } else {
                        self.state.players[0].id.clone()
                    };
                    let data = EmoteData { player_id: cmd.player_id.clone(), emote_id };
                    self.hub.send_message_to(&opponent, MSG_EMOTE, &data);
                }
            }
        }
    }
}

impl Handler<Disconnect> for GameEngine {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Context<Self>) {
        self.mark_disconnected(msg.player_id, ctx);
    }
}

impl Handler<Reconnect> for GameEngine {
    type Result = ();

    fn handle(&mut self, msg: Reconnect, ctx: &mut Context<Self>) {
        info!(
            "[Engine] player reconnected game_id={} player_id={}",
            self.state.id, msg.player_id
        );

        if let Some(idx) = self.state.player_index(&msg.player_id) {
            self.state.players[idx].is_disconnected = false;
        }
        if let Some(handle) = self.reconnect_timer.take() {
            ctx.cancel_future(handle);
        }
        self.disconnected_id = None;

        self.hub.register(&msg.player_id, msg.addr);
        self.send_full_state(&msg.player_id);
        self.broadcast(
            ctx,
            MSG_PLAYER_RECONNECTED,
            &PlayerReconnectedData { player_id: msg.player_id },
        );
    }
}

impl Handler<TakeSnapshot> for GameEngine {
    type Result = Result<Snapshot, String>;

    fn handle(&mut self, _msg: TakeSnapshot, _ctx: &mut Context<Self>) -> Self::Result {
        let data = self.state.serialize().map_err(|e| e.to_string())?;
        Ok(Snapshot { game_id: self.state.id.clone(), data, ttl: self.snapshot_ttl() })
    }
}

impl Handler<StopEngine> for GameEngine {
    type Result = ();

    fn handle(&mut self, _msg: StopEngine, ctx: &mut Context<Self>) {
        self.hub.close_all();
        ctx.stop();
    }
}
