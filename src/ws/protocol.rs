//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::exploration::TileKey;
use crate::game::world::WorldConfig;

/// Messages sent from client to server.
///
/// Client-supplied player ids and timestamps are advisory. The server acts on
/// behalf of the sending connection and orders events by arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Request a seat in the game
    Join {
        #[serde(default)]
        name: String,
    },

    /// Declared movement delta
    Move {
        /// Input direction label, informational
        #[serde(default)]
        dir: Option<String>,
        dx: f64,
        dy: f64,
        #[serde(default)]
        timestamp: Option<f64>,
    },

    /// Try to pick up the relic
    GrabRelic {
        #[serde(default)]
        timestamp: Option<f64>,
    },

    /// Try to deliver the relic at the sender's base
    ScoreRelic {
        #[serde(default)]
        timestamp: Option<f64>,
    },

    /// Tiles newly seen by this client
    ExploreTiles {
        tiles: Vec<TileKey>,
        #[serde(default)]
        timestamp: Option<f64>,
    },

    /// Chat line relayed to everyone
    Chat {
        message: String,
        #[serde(default)]
        timestamp: Option<f64>,
    },

    /// Ping for latency measurement
    Ping {
        /// Client clock reading, echoed back untouched
        t: f64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Full game state, sent to a joiner and to everyone after a reset
    #[serde(rename_all = "camelCase")]
    InitialState {
        /// Recipient's own player id, if they have joined
        self_id: Option<Uuid>,
        world: WorldInfo,
        players: Vec<PlayerInfo>,
        relic: RelicInfo,
        scores: BTreeMap<Uuid, u32>,
        explored: Vec<TileKey>,
    },

    /// Positions of every player, in join order
    PlayerSnapshot {
        players: Vec<PlayerPosition>,
    },

    /// Relic state changed
    RelicStatus {
        #[serde(flatten)]
        relic: RelicInfo,
    },

    /// A capture was scored
    #[serde(rename_all = "camelCase")]
    ScoreChanged {
        score_table: BTreeMap<Uuid, u32>,
        scoring_player: Uuid,
        winning_player: Option<Uuid>,
    },

    /// Player joined the game
    PlayerJoined {
        #[serde(flatten)]
        player: PlayerInfo,
    },

    /// Player left the game
    PlayerLeft {
        id: Uuid,
        timestamp: u64,
    },

    /// Relayed chat line
    Chat {
        id: Uuid,
        name: String,
        message: String,
        timestamp: f64,
    },

    /// Join refused
    Rejected {
        reason: RejectReason,
    },

    /// Pong response
    #[serde(rename_all = "camelCase")]
    Pong {
        /// Echo back client timestamp
        t: f64,
        server_time: u64,
    },
}

/// Why a join was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    GameFull,
}

/// Static world layout sent with the initial state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldInfo {
    pub width: f64,
    pub height: f64,
    pub tile_size: f64,
    pub obstacles: Vec<RectInfo>,
    pub bases: Vec<BaseInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectInfo {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseInfo {
    pub slot: u8,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl From<&WorldConfig> for WorldInfo {
    fn from(world: &WorldConfig) -> Self {
        Self {
            width: world.width,
            height: world.height,
            tile_size: world.tile_size,
            obstacles: world
                .obstacles
                .iter()
                .map(|r| RectInfo {
                    x: r.x,
                    y: r.y,
                    width: r.width,
                    height: r.height,
                })
                .collect(),
            bases: world
                .bases
                .iter()
                .map(|b| BaseInfo {
                    slot: b.slot,
                    x: b.rect.x,
                    y: b.rect.y,
                    width: b.rect.width,
                    height: b.rect.height,
                    color: b.color.to_string(),
                })
                .collect(),
        }
    }
}

/// Player roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub slot: u8,
    pub color: String,
    pub has_relic: bool,
}

/// Player entry in a position snapshot. Coordinates are floored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPosition {
    pub id: Uuid,
    pub x: i32,
    pub y: i32,
    pub has_relic: bool,
    pub timestamp: f64,
}

/// Relic state on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelicInfo {
    pub is_held: bool,
    pub holder_id: Option<Uuid>,
    pub is_respawning: bool,
    pub position: Position,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_messages() {
        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"move","id":"ignored","dir":"up","dx":0,"dy":-5,"timestamp":1700000000000}"#,
        )
        .unwrap();
        match msg {
            ClientMsg::Move { dx, dy, timestamp, .. } => {
                assert_eq!((dx, dy), (0.0, -5.0));
                assert_eq!(timestamp, Some(1_700_000_000_000.0));
            }
            other => panic!("unexpected {:?}", other),
        }

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"grabRelic"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::GrabRelic { timestamp: None }));

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"exploreTiles","tiles":[{"x":1,"y":2}]}"#).unwrap();
        match msg {
            ClientMsg::ExploreTiles { tiles, .. } => assert_eq!(tiles, vec![TileKey::new(1, 2)]),
            other => panic!("unexpected {:?}", other),
        }

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"ping","t":1523.75}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Ping { t } if t == 1523.75));

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Join { name } if name.is_empty()));
    }

    #[test]
    fn malformed_exploration_is_rejected() {
        for raw in [
            r#"{"type":"exploreTiles"}"#,
            r#"{"type":"exploreTiles","tiles":5}"#,
            r#"{"type":"exploreTiles","tiles":[{"x":"a","y":1}]}"#,
        ] {
            assert!(serde_json::from_str::<ClientMsg>(raw).is_err(), "{}", raw);
        }
    }

    #[test]
    fn server_messages_use_camel_case() {
        let id = Uuid::nil();
        let msg = ServerMsg::RelicStatus {
            relic: RelicInfo {
                is_held: true,
                holder_id: Some(id),
                is_respawning: false,
                position: Position { x: 1.0, y: 2.0 },
                timestamp: 5,
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "relicStatus");
        assert_eq!(json["isHeld"], true);
        assert_eq!(json["holderId"], id.to_string());
        assert_eq!(json["position"]["x"], 1.0);

        let rejected = serde_json::to_value(ServerMsg::Rejected {
            reason: RejectReason::GameFull,
        })
        .unwrap();
        assert_eq!(rejected["type"], "rejected");
        assert_eq!(rejected["reason"], "GameFull");

        let scored = serde_json::to_value(ServerMsg::ScoreChanged {
            score_table: BTreeMap::from([(id, 1)]),
            scoring_player: id,
            winning_player: None,
        })
        .unwrap();
        assert_eq!(scored["scoringPlayer"], id.to_string());
        assert!(scored["winningPlayer"].is_null());
        assert_eq!(scored["scoreTable"][id.to_string()], 1);
    }
}
