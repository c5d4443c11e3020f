//! Process-wide registry of active game engines, plus the game bootstrap
//! (lobby handoff) and restore-on-boot paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use log::{info, warn};
use uuid::Uuid;

use crate::config::Balance;
use crate::game::{new_structure, GameState};
use crate::mapgen;
use crate::model::{GamePhase, PlayerState, RoomSettings, StructureKind};
use crate::store::Store;

use super::engine::{Disconnect, GameEngine, StopEngine, TakeSnapshot};

/// game-id -> engine address, and room-id -> game-id for the join flow.
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Addr<GameEngine>>,
    rooms: HashMap<String, String>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        EngineRegistry::default()
    }
}

impl Actor for EngineRegistry {
    type Context = Context<Self>;
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct RegisterEngine {
    pub game_id: String,
    pub room_id: Option<String>,
    pub addr: Addr<GameEngine>,
}

impl Handler<RegisterEngine> for EngineRegistry {
    type Result = ();

    fn handle(&mut self, msg: RegisterEngine, _: &mut Context<Self>) {
        if let Some(room_id) = msg.room_id {
            self.rooms.insert(room_id, msg.game_id.clone());
        }
        self.engines.insert(msg.game_id, msg.addr);
    }
}

#[derive(Message)]
#[rtype(result = "Result<Addr<GameEngine>, String>")]
pub struct GetEngine {
    pub game_id: String,
}

impl Handler<GetEngine> for EngineRegistry {
    type Result = Result<Addr<GameEngine>, String>;

    fn handle(&mut self, msg: GetEngine, _: &mut Context<Self>) -> Self::Result {
        self.engines
            .get(&msg.game_id)
            .cloned()
            .ok_or_else(|| "game engine not found".to_string())
    }
}

#[derive(Message)]
#[rtype(result = "Result<(String, Addr<GameEngine>), String>")]
pub struct GetEngineByRoom {
    pub room_id: String,
}

impl Handler<GetEngineByRoom> for EngineRegistry {
    type Result = Result<(String, Addr<GameEngine>), String>;

    fn handle(&mut self, msg: GetEngineByRoom, _: &mut Context<Self>) -> Self::Result {
        let game_id = self
            .rooms
            .get(&msg.room_id)
            .cloned()
            .ok_or_else(|| "room not found".to_string())?;
        let addr = self
            .engines
            .get(&game_id)
            .cloned()
            .ok_or_else(|| "game engine not found".to_string())?;
        Ok((game_id, addr))
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct RemoveEngine {
    pub game_id: String,
}

impl Handler<RemoveEngine> for EngineRegistry {
    type Result = ();

    fn handle(&mut self, msg: RemoveEngine, _: &mut Context<Self>) {
        if let Some(addr) = self.engines.remove(&msg.game_id) {
            addr.do_send(StopEngine);
        }
        self.rooms.retain(|_, game_id| *game_id != msg.game_id);
    }
}

#[derive(Message)]
#[rtype(result = "usize")]
pub struct CountEngines;

impl Handler<CountEngines> for EngineRegistry {
    type Result = usize;

    fn handle(&mut self, _: CountEngines, _: &mut Context<Self>) -> usize {
        self.engines.len()
    }
}

/// All registered engines, for the shutdown drain.
#[derive(MessageResponse)]
pub struct Engines(pub Vec<(String, Addr<GameEngine>)>);

#[derive(Message)]
#[rtype(result = "Engines")]
pub struct ListEngines;

impl Handler<ListEngines> for EngineRegistry {
    type Result = Engines;

    fn handle(&mut self, _: ListEngines, _: &mut Context<Self>) -> Engines {
        Engines(self.engines.iter().map(|(id, addr)| (id.clone(), addr.clone())).collect())
    }
}

/// A participant handed over by the lobby.
#[derive(Debug, Clone)]
pub struct NewGamePlayer {
    pub id: String,
    pub nickname: String,
}

/// Builds a game at lobby handoff: fresh state with starting coins, a
/// generated map with HQ ownership assigned, a spawned engine, and a
/// registry entry keyed by room. Returns the game id.
pub async fn create_game(
    registry: &Addr<EngineRegistry>,
    store: &Store,
    balance: &Arc<Balance>,
    room_id: &str,
    players: [NewGamePlayer; 2],
    settings: RoomSettings,
    seed: u64,
    reconnect_window: Duration,
) -> Result<String, String> {
    let game_id = Uuid::new_v4().to_string();
    let p1 = PlayerState::new(players[0].id.clone(), players[0].nickname.clone());
    let p2 = PlayerState::new(players[1].id.clone(), players[1].nickname.clone());
    let mut state = GameState::new(game_id.clone(), settings, p1, p2, seed, balance);

    state.phase = GamePhase::GeneratingMap;
    let map = mapgen::generate(settings.map_size, seed, balance)?;
    state.terrain = map.terrain;

    let p1_id = players[0].id.clone();
    let p2_id = players[1].id.clone();
    for placement in map.structures {
        // The first HQ goes to player 0, its mirror to player 1; everything
        // else starts neutral.
        let owner = if placement.kind == StructureKind::Hq {
            if state.player_hq(&p1_id).is_none() {
                p1_id.clone()
            } else {
                p2_id.clone()
            }
        } else {
            String::new()
        };
        let structure = new_structure(
            balance,
            Uuid::new_v4().to_string(),
            placement.kind,
            &owner,
            placement.position,
        )?;
        state.add_structure(structure);
    }
    state.phase = GamePhase::WaitingForPlayers;

    let engine =
        GameEngine::new(state, balance.clone(), store.clone(), reconnect_window).start();
    registry
        .send(RegisterEngine {
            game_id: game_id.clone(),
            room_id: Some(room_id.to_string()),
            addr: engine,
        })
        .await
        .map_err(|e| e.to_string())?;

    info!("[Registry] game created game_id={game_id} room_id={room_id} seed={seed}");
    Ok(game_id)
}

/// Scans the snapshot store on boot and resurrects every unfinished game.
/// Both players start disconnected, with their reconnect windows counting.
pub async fn restore_active_games(
    registry: &Addr<EngineRegistry>,
    store: &Store,
    balance: &Arc<Balance>,
    reconnect_window: Duration,
) -> usize {
    let game_ids = match store.list_game_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            warn!("[Registry] failed to list snapshots for restore: {e}");
            return 0;
        }
    };

    let mut restored = 0;
    for game_id in game_ids {
        let data = match store.load_game_state(&game_id).await {
            Ok(Some(data)) => data,
            Ok(None) => continue,
            Err(e) => {
                warn!("[Registry] failed to load snapshot game_id={game_id}: {e}");
                continue;
            }
        };

        let mut state = match GameState::deserialize(&data) {
            Ok(state) => state,
            Err(e) => {
                warn!("[Registry] failed to deserialize snapshot game_id={game_id}: {e}");
                continue;
            }
        };

        if state.phase == GamePhase::GameOver {
            continue;
        }

        for player in state.players.iter_mut() {
            player.is_disconnected = true;
        }
        let player_ids = [state.players[0].id.clone(), state.players[1].id.clone()];

        let engine =
            GameEngine::new(state, balance.clone(), store.clone(), reconnect_window).start();

        // Start both reconnect windows immediately; the last-enqueued window
        // (player index 1) is the one that forfeits if nobody returns.
        for player_id in player_ids {
            engine.do_send(Disconnect { player_id });
        }

        if registry
            .send(RegisterEngine { game_id: game_id.clone(), room_id: None, addr: engine })
            .await
            .is_err()
        {
            warn!("[Registry] failed to register restored engine game_id={game_id}");
            continue;
        }
        restored += 1;
    }

    info!("[Registry] restored {restored} active games from snapshots");
    restored
}

/// Asks every engine for a final snapshot and persists them, bounded by the
/// drain timeout. Used on shutdown.
pub async fn drain_all(
    registry: &Addr<EngineRegistry>,
    store: &Store,
    drain_timeout: Duration,
) {
    let Ok(Engines(engines)) = registry.send(ListEngines).await else {
        warn!("[Registry] registry unavailable during drain");
        return;
    };

    let drain = async {
        for (game_id, addr) in &engines {
            match addr.send(TakeSnapshot).await {
                Ok(Ok(snapshot)) => {
                    if let Err(e) = store
                        .save_game_state(&snapshot.game_id, snapshot.data, snapshot.ttl)
                        .await
                    {
                        warn!("[Registry] drain snapshot failed game_id={game_id}: {e}");
                    }
                }
                Ok(Err(e)) => warn!("[Registry] drain serialize failed game_id={game_id}: {e}"),
                Err(e) => warn!("[Registry] engine unreachable during drain game_id={game_id}: {e}"),
            }
            addr.do_send(StopEngine);
        }
    };

    if actix_rt::time::timeout(drain_timeout, drain).await.is_err() {
        warn!("[Registry] timeout waiting for engines to drain");
    } else {
        info!("[Registry] all engines drained count={}", engines.len());
    }
}
