//! WebSocket message envelope and every client/server payload type.
//!
//! All messages travel as JSON envelopes `{"type": ..., "seq": ..., "data": ...}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ErrorCode, MatchStats, TroopKind, WinReason};

/// Maximum allowed inbound message size in bytes.
pub const MAX_INBOUND_SIZE: usize = 4096;

// Client -> server message types.
pub const MSG_JOIN_GAME: &str = "join_game";
pub const MSG_RECONNECT: &str = "reconnect";
pub const MSG_MOVE: &str = "move";
pub const MSG_ATTACK: &str = "attack";
pub const MSG_BUY: &str = "buy";
pub const MSG_END_TURN: &str = "end_turn";
pub const MSG_EMOTE: &str = "emote";
pub const MSG_PONG: &str = "pong";

// Server -> client message types.
pub const MSG_GAME_STATE: &str = "game_state";
pub const MSG_ACK: &str = "ack";
pub const MSG_NACK: &str = "nack";
pub const MSG_TROOP_MOVED: &str = "troop_moved";
pub const MSG_COMBAT_RESULT: &str = "combat_result";
pub const MSG_TROOP_PURCHASED: &str = "troop_purchased";
pub const MSG_TROOP_DESTROYED: &str = "troop_destroyed";
pub const MSG_STRUCTURE_ATTACKED: &str = "structure_attacked";
pub const MSG_STRUCTURE_FIRES: &str = "structure_fires";
pub const MSG_TURN_START: &str = "turn_start";
pub const MSG_GAME_OVER: &str = "game_over";
pub const MSG_PLAYER_DISCONNECTED: &str = "player_disconnected";
pub const MSG_PLAYER_RECONNECTED: &str = "player_reconnected";
pub const MSG_PING: &str = "ping";
pub const MSG_MATCH_FOUND: &str = "match_found";
pub const MSG_ERROR: &str = "error";

/// Top-level wrapper for all WebSocket messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "seq_is_zero")]
    pub seq: u64,
    #[serde(default)]
    pub data: Value,
}

fn seq_is_zero(seq: &u64) -> bool {
    *seq == 0
}

/// Builds a serialized envelope with no sequence number.
pub fn envelope<T: Serialize>(kind: &str, data: &T) -> Result<String, serde_json::Error> {
    let env = Envelope { kind: kind.to_string(), seq: 0, data: serde_json::to_value(data)? };
    serde_json::to_string(&env)
}

/// Builds a serialized envelope echoing a client sequence number.
pub fn envelope_with_seq<T: Serialize>(
    kind: &str,
    seq: u64,
    data: &T,
) -> Result<String, serde_json::Error> {
    let env = Envelope { kind: kind.to_string(), seq, data: serde_json::to_value(data)? };
    serde_json::to_string(&env)
}

// --- Client -> server payloads ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameData {
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectData {
    pub game_id: String,
    pub player_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveData {
    pub unit_id: String,
    pub target_q: i32,
    pub target_r: i32,
    pub target_s: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackData {
    pub unit_id: String,
    pub target_q: i32,
    pub target_r: i32,
    pub target_s: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyData {
    pub unit_type: TroopKind,
    pub structure_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmoteData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub player_id: String,
    pub emote_id: String,
}

// --- Server -> client payloads ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckData {
    pub seq: u64,
    pub action_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NackData {
    pub seq: u64,
    pub action_type: String,
    pub error: ErrorData,
}

/// Machine-readable code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorData {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorData { code, message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroopMovedData {
    pub unit_id: String,
    pub from_q: i32,
    pub from_r: i32,
    pub from_s: i32,
    pub to_q: i32,
    pub to_r: i32,
    pub to_s: i32,
    pub remaining_mobility: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatResultData {
    pub attacker_id: String,
    pub defender_id: String,
    pub hit_roll: i32,
    pub natural_roll: i32,
    pub hit: bool,
    pub damage: i32,
    pub defender_hp: i32,
    pub killed: bool,
    pub crit: bool,
    pub fumble: bool,
    // Counterattack fields; zero values when no counter triggered.
    pub has_counter: bool,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub counter_hit_roll: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub counter_natural_roll: i32,
    #[serde(default)]
    pub counter_hit: bool,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub counter_damage: i32,
    pub attacker_hp: i32,
    pub attacker_killed: bool,
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroopPurchasedData {
    pub unit_id: String,
    pub unit_type: TroopKind,
    pub hex_q: i32,
    pub hex_r: i32,
    pub hex_s: i32,
    pub owner: String,
    pub coins_remaining: i32,
}

/// What removed a troop from the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyCause {
    Combat,
    SuddenDeath,
    StructureFire,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroopDestroyedData {
    pub unit_id: String,
    pub hex_q: i32,
    pub hex_r: i32,
    pub hex_s: i32,
    pub cause: DestroyCause,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureAttackedData {
    pub structure_id: String,
    pub attacker_id: String,
    pub hit_roll: i32,
    pub damage: i32,
    pub structure_hp: i32,
    pub captured: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new_owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureFiresData {
    pub structure_id: String,
    pub target_id: String,
    pub hit_roll: i32,
    pub damage: i32,
    pub target_hp: i32,
    pub killed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealedUnit {
    pub unit_id: String,
    pub hp_before: i32,
    pub hp_after: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureRegen {
    pub structure_id: String,
    pub hp_before: i32,
    pub hp_after: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuddenDeathDamage {
    pub unit_id: String,
    pub damage: i32,
    pub hp_after: i32,
    pub killed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStartData {
    pub turn_number: u32,
    pub active_player_id: String,
    pub timer_seconds: u32,
    pub income_gained: i32,
    pub structure_income: i32,
    pub total_coins: i32,
    pub healed_units: Vec<HealedUnit>,
    pub structure_regens: Vec<StructureRegen>,
    pub sudden_death_damage: Vec<SuddenDeathDamage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOverData {
    /// Empty on a draw.
    pub winner_id: String,
    pub reason: WinReason,
    /// player_id -> stats.
    pub stats: HashMap<String, MatchStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDisconnectedData {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerReconnectedData {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFoundData {
    pub room_id: String,
}

/// One state mutation broadcast to both players. An action produces a
/// contiguous block of these.
#[derive(Debug, Clone)]
pub enum Delta {
    TroopMoved(TroopMovedData),
    CombatResult(CombatResultData),
    TroopPurchased(TroopPurchasedData),
    TroopDestroyed(TroopDestroyedData),
    StructureAttacked(StructureAttackedData),
    StructureFires(StructureFiresData),
    TurnStart(TurnStartData),
}

impl Delta {
    /// The wire message type tag for this delta.
    pub fn message_type(&self) -> &'static str {
        match self {
            Delta::TroopMoved(_) => MSG_TROOP_MOVED,
            Delta::CombatResult(_) => MSG_COMBAT_RESULT,
            Delta::TroopPurchased(_) => MSG_TROOP_PURCHASED,
            Delta::TroopDestroyed(_) => MSG_TROOP_DESTROYED,
            Delta::StructureAttacked(_) => MSG_STRUCTURE_ATTACKED,
            Delta::StructureFires(_) => MSG_STRUCTURE_FIRES,
            Delta::TurnStart(_) => MSG_TURN_START,
        }
    }

    /// The payload as a JSON value for envelope framing.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Delta::TroopMoved(d) => serde_json::to_value(d),
            Delta::CombatResult(d) => serde_json::to_value(d),
            Delta::TroopPurchased(d) => serde_json::to_value(d),
            Delta::TroopDestroyed(d) => serde_json::to_value(d),
            Delta::StructureAttacked(d) => serde_json::to_value(d),
            Delta::StructureFires(d) => serde_json::to_value(d),
            Delta::TurnStart(d) => serde_json::to_value(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trip() {
        let text = envelope_with_seq(MSG_ACK, 7, &AckData { seq: 7, action_type: "move".into() })
            .unwrap();
        let env: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(env.kind, MSG_ACK);
        assert_eq!(env.seq, 7);
        let ack: AckData = serde_json::from_value(env.data).unwrap();
        assert_eq!(ack.seq, 7);
    }

    #[test]
    fn envelope_omits_zero_seq() {
        let text = envelope(MSG_PING, &Value::Null).unwrap();
        assert!(!text.contains("seq"));
    }

    #[test]
    fn inbound_envelope_defaults() {
        let env: Envelope = serde_json::from_str(r#"{"type":"end_turn"}"#).unwrap();
        assert_eq!(env.kind, MSG_END_TURN);
        assert_eq!(env.seq, 0);
        assert!(env.data.is_null());
    }

    #[test]
    fn destroy_cause_wire_names() {
        assert_eq!(serde_json::to_string(&DestroyCause::StructureFire).unwrap(), "\"structure_fire\"");
        assert_eq!(serde_json::to_string(&DestroyCause::SuddenDeath).unwrap(), "\"sudden_death\"");
    }

    #[test]
    fn delta_tags_match_payload() {
        let delta = Delta::TroopDestroyed(TroopDestroyedData {
            unit_id: "u".into(),
            hex_q: 0,
            hex_r: 0,
            hex_s: 0,
            cause: DestroyCause::Combat,
        });
        assert_eq!(delta.message_type(), MSG_TROOP_DESTROYED);
        assert!(delta.payload().unwrap().get("cause").is_some());
    }
}
