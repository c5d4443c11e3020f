//! WebSocket session actor: one per connected client. Decodes envelopes,
//! keeps the heartbeat, and forwards actions to the game engine's mailbox.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{error, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::hex::Coord;
use crate::model::ErrorCode;

use super::engine::{ClientAction, ClientCommand, GameEngine, Reconnect};
use super::messages::{
    envelope, AttackData, BuyData, EmoteData, Envelope, ErrorData, JoinGameData, MoveData,
    NackData, ReconnectData, MSG_ATTACK, MSG_BUY, MSG_EMOTE, MSG_END_TURN, MSG_JOIN_GAME,
    MSG_MOVE, MSG_NACK, MSG_PING, MSG_PONG, MSG_RECONNECT, MAX_INBOUND_SIZE,
};
use super::players::PlayerRegistry;
use super::registry::{EngineRegistry, GetEngine, GetEngineByRoom};
use super::state::AppState;

/// Bounded size of a session's outbound buffer. A full buffer means the
/// client is stuck and the session is closed.
pub const OUTBOUND_BUFFER_CAPACITY: usize = 64;

/// A pre-serialized frame to write to the socket.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ServerFrame(pub String);

/// Asks the session to close the connection.
#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseSession {
    pub reason: String,
}

pub struct GameSocket {
    player_id: String,
    game_id: Option<String>,
    engine: Option<Addr<GameEngine>>,
    registry: Addr<EngineRegistry>,
    players: Arc<PlayerRegistry>,
    ping_interval: Duration,
    pong_timeout: Duration,
    last_pong: Instant,
}

impl GameSocket {
    pub fn new(
        player_id: String,
        registry: Addr<EngineRegistry>,
        players: Arc<PlayerRegistry>,
        ping_interval: Duration,
        pong_timeout: Duration,
    ) -> Self {
        GameSocket {
            player_id,
            game_id: None,
            engine: None,
            registry,
            players,
            ping_interval,
            pong_timeout,
            last_pong: Instant::now(),
        }
    }

    fn send_nack(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        seq: u64,
        action_type: &str,
        code: ErrorCode,
        message: &str,
    ) {
        let nack = NackData {
            seq,
            action_type: action_type.to_string(),
            error: ErrorData::new(code, message),
        };
        if let Ok(frame) = envelope(MSG_NACK, &nack) {
            ctx.text(frame);
        }
    }

    /// Server-side ping plus ws-level ping; closes the session when the pong
    /// window lapses.
    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let interval = self.ping_interval;
        let timeout = self.pong_timeout;
        ctx.run_interval(interval, move |act, ctx| {
            if act.last_pong.elapsed() > interval + timeout {
                warn!("[WS] heartbeat timed out player_id={}", act.player_id);
                ctx.stop();
                return;
            }
            if let Ok(frame) = envelope(MSG_PING, &Value::Null) {
                ctx.text(frame);
            }
            ctx.ping(b"");
        });
    }

    /// Forwards an action into the engine mailbox; a full mailbox drops the
    /// action with a log line and the client retries or resyncs later.
    fn forward(&self, engine: &Addr<GameEngine>, cmd: ClientCommand) {
        if let Err(e) = engine.try_send(cmd) {
            warn!(
                "[WS] engine mailbox full, dropping action player_id={}: {e}",
                self.player_id
            );
        }
    }

    fn handle_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        if text.len() > MAX_INBOUND_SIZE {
            self.send_nack(ctx, 0, "", ErrorCode::InvalidMessage, "message too large");
            return;
        }

        let env: Envelope = match serde_json::from_str(text) {
            Ok(env) => env,
            Err(e) => {
                debug!("[WS] malformed envelope player_id={}: {e}", self.player_id);
                self.send_nack(ctx, 0, "", ErrorCode::InvalidMessage, "malformed message envelope");
                return;
            }
        };

        let kind = env.kind.clone();
        match kind.as_str() {
            MSG_PONG => {
                self.last_pong = Instant::now();
            }
            MSG_JOIN_GAME => self.handle_join_game(env, ctx),
            MSG_RECONNECT => self.handle_reconnect(env, ctx),
            MSG_MOVE | MSG_ATTACK | MSG_BUY | MSG_END_TURN | MSG_EMOTE => {
                self.handle_action(env, ctx)
            }
            other => {
                self.send_nack(ctx, env.seq, other, ErrorCode::InvalidMessage, "unknown message type");
            }
        }
    }

    /// Associates this session with the engine created for the room and
    /// submits the join to its mailbox.
    fn handle_join_game(&mut self, env: Envelope, ctx: &mut ws::WebsocketContext<Self>) {
        let seq = env.seq;
        let data: JoinGameData = match serde_json::from_value(env.data) {
            Ok(data) => data,
            Err(_) => {
                self.send_nack(ctx, seq, MSG_JOIN_GAME, ErrorCode::InvalidMessage, "invalid join_game data");
                return;
            }
        };

        self.registry
            .send(GetEngineByRoom { room_id: data.room_id })
            .into_actor(self)
            .then(move |res, act, ctx| {
                match res {
                    Ok(Ok((game_id, engine))) => {
                        act.game_id = Some(game_id);
                        act.engine = Some(engine.clone());
                        let cmd = ClientCommand {
                            player_id: act.player_id.clone(),
                            seq,
                            action: ClientAction::JoinGame,
                            addr: ctx.address(),
                        };
                        act.forward(&engine, cmd);
                    }
                    Ok(Err(_)) => {
                        act.send_nack(ctx, seq, MSG_JOIN_GAME, ErrorCode::RoomNotFound, "room not found");
                    }
                    Err(e) => {
                        warn!("[WS] registry unreachable: {e}");
                        act.send_nack(ctx, seq, MSG_JOIN_GAME, ErrorCode::GameNotFound, "registry unavailable");
                    }
                }
                actix::fut::ready(())
            })
            .wait(ctx);
    }

    /// Re-enters a live game after a drop or a server restart.
    fn handle_reconnect(&mut self, env: Envelope, ctx: &mut ws::WebsocketContext<Self>) {
        let seq = env.seq;
        let data: ReconnectData = match serde_json::from_value(env.data) {
            Ok(data) => data,
            Err(_) => {
                self.send_nack(ctx, seq, MSG_RECONNECT, ErrorCode::InvalidMessage, "invalid reconnect data");
                return;
            }
        };

        // The socket was already authenticated at upgrade; the embedded token
        // must resolve to the same player.
        let token_player = self.players.authenticate(&data.player_token).map(|s| s.id);
        if token_player.as_deref() != Some(self.player_id.as_str()) {
            self.send_nack(ctx, seq, MSG_RECONNECT, ErrorCode::InvalidMessage, "invalid player token");
            return;
        }

        let game_id = data.game_id.clone();
        self.registry
            .send(GetEngine { game_id: data.game_id })
            .into_actor(self)
            .then(move |res, act, ctx| {
                match res {
                    Ok(Ok(engine)) => {
                        act.game_id = Some(game_id);
                        act.engine = Some(engine.clone());
                        let ack = super::messages::AckData {
                            seq,
                            action_type: MSG_RECONNECT.to_string(),
                        };
                        if let Ok(frame) = envelope(super::messages::MSG_ACK, &ack) {
                            ctx.text(frame);
                        }
                        if let Err(e) = engine.try_send(Reconnect {
                            player_id: act.player_id.clone(),
                            addr: ctx.address(),
                        }) {
                            warn!("[WS] reconnect dropped player_id={}: {e}", act.player_id);
                        }
                    }
                    Ok(Err(_)) => {
                        act.send_nack(ctx, seq, MSG_RECONNECT, ErrorCode::GameNotFound, "game not found");
                    }
                    Err(e) => {
                        warn!("[WS] registry unreachable: {e}");
                        act.send_nack(ctx, seq, MSG_RECONNECT, ErrorCode::GameNotFound, "registry unavailable");
                    }
                }
                actix::fut::ready(())
            })
            .wait(ctx);
    }

    /// Parses and forwards a gameplay action to the associated engine.
    fn handle_action(&mut self, env: Envelope, ctx: &mut ws::WebsocketContext<Self>) {
        let kind = env.kind.clone();
        let Some(engine) = self.engine.clone() else {
            self.send_nack(
                ctx,
                env.seq,
                &kind,
                ErrorCode::InvalidMessage,
                "connection not associated with a game",
            );
            return;
        };

        let action = match self.parse_action(&kind, env.data) {
            Ok(action) => action,
            Err(error) => {
                self.send_nack(ctx, env.seq, &kind, error.code, &error.message);
                return;
            }
        };

        self.forward(
            &engine,
            ClientCommand {
                player_id: self.player_id.clone(),
                seq: env.seq,
                action,
                addr: ctx.address(),
            },
        );
    }

    fn parse_action(&self, kind: &str, data: Value) -> Result<ClientAction, ErrorData> {
        match kind {
            MSG_MOVE => {
                let data: MoveData = serde_json::from_value(data)
                    .map_err(|_| ErrorData::new(ErrorCode::InvalidMessage, "invalid move data"))?;
                let target = parse_target(data.target_q, data.target_r, data.target_s)?;
                Ok(ClientAction::Move { unit_id: data.unit_id, target })
            }
            MSG_ATTACK => {
                let data: AttackData = serde_json::from_value(data)
                    .map_err(|_| ErrorData::new(ErrorCode::InvalidMessage, "invalid attack data"))?;
                let target = parse_target(data.target_q, data.target_r, data.target_s)?;
                Ok(ClientAction::Attack { unit_id: data.unit_id, target })
            }
            MSG_BUY => {
                let data: BuyData = serde_json::from_value(data)
                    .map_err(|_| ErrorData::new(ErrorCode::InvalidMessage, "invalid buy data"))?;
                Ok(ClientAction::Buy { unit_type: data.unit_type, structure_id: data.structure_id })
            }
            MSG_END_TURN => Ok(ClientAction::EndTurn),
            MSG_EMOTE => {
                let data: EmoteData = serde_json::from_value(data)
                    .map_err(|_| ErrorData::new(ErrorCode::InvalidMessage, "invalid emote data"))?;
                Ok(ClientAction::Emote { emote_id: data.emote_id })
            }
            _ => Err(ErrorData::new(ErrorCode::InvalidMessage, "unknown message type")),
        }
    }
}

/// Client coordinates are user input: a triple that does not sum to zero is
/// a nack, never a panic.
fn parse_target(q: i32, r: i32, s: i32) -> Result<Coord, ErrorData> {
    if q + r + s != 0 {
        return Err(ErrorData::new(ErrorCode::InvalidMessage, "invalid target coordinate"));
    }
    Ok(Coord::new(q, r, s))
}

impl Actor for GameSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.set_mailbox_capacity(OUTBOUND_BUFFER_CAPACITY);
        info!("[WS] connected player_id={}", self.player_id);
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(
            "[WS] disconnected player_id={} game_id={}",
            self.player_id,
            self.game_id.as_deref().unwrap_or("-")
        );
        if let Some(engine) = &self.engine {
            engine.do_send(super::engine::Disconnect { player_id: self.player_id.clone() });
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GameSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => self.handle_text(&text, ctx),
            Ok(ws::Message::Ping(data)) => ctx.pong(&data),
            Ok(ws::Message::Pong(_)) => {
                self.last_pong = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                debug!("[WS] close frame player_id={}", self.player_id);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                warn!("[WS] protocol error player_id={}: {e}", self.player_id);
                ctx.stop();
            }
        }
    }
}

impl Handler<ServerFrame> for GameSocket {
    type Result = ();

    fn handle(&mut self, msg: ServerFrame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl Handler<CloseSession> for GameSocket {
    type Result = ();

    fn handle(&mut self, msg: CloseSession, ctx: &mut Self::Context) {
        info!("[WS] closing session player_id={}: {}", self.player_id, msg.reason);
        ctx.stop();
    }
}

#[derive(Deserialize)]
struct WsQuery {
    token: String,
}

/// WebSocket upgrade endpoint. The bearer token in the query string is
/// resolved to a player session before any engine event can be emitted.
pub async fn ws_game(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let query = web::Query::<WsQuery>::from_query(req.query_string())
        .map_err(|_| error::ErrorUnauthorized("missing token"))?;

    let session = state
        .players
        .authenticate(&query.token)
        .ok_or_else(|| error::ErrorUnauthorized("invalid token"))?;

    ws::start(
        GameSocket::new(
            session.id,
            state.registry.clone(),
            state.players.clone(),
            state.config.ping_interval,
            state.config.pong_timeout,
        ),
        &req,
        stream,
    )
}
