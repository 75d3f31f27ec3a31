//! Builds outbound state messages from authoritative state

use uuid::Uuid;

use crate::util::time::unix_millis;
use crate::ws::protocol::{PlayerInfo, PlayerPosition, Position, RelicInfo, ServerMsg, WorldInfo};

use super::exploration::ExplorationLedger;
use super::relic::RelicState;
use super::score::ScoreTable;
use super::session::{Player, SessionRegistry};
use super::world::WorldConfig;

/// Builds snapshots for network transmission
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    pub fn player_info(player: &Player) -> PlayerInfo {
        PlayerInfo {
            id: player.id,
            name: player.name.clone(),
            x: player.x,
            y: player.y,
            slot: player.slot,
            color: player.color.to_string(),
            has_relic: player.has_relic,
        }
    }

    /// Positions of every player, floored to whole units
    pub fn player_snapshot(sessions: &SessionRegistry) -> ServerMsg {
        let now = unix_millis() as f64;
        let players = sessions
            .all()
            .iter()
            .map(|p| PlayerPosition {
                id: p.id,
                x: p.x.floor() as i32,
                y: p.y.floor() as i32,
                has_relic: p.has_relic,
                timestamp: p.last_timestamp.unwrap_or(now),
            })
            .collect();

        ServerMsg::PlayerSnapshot { players }
    }

    /// Relic state. A held relic is reported at its holder's position.
    pub fn relic_info(relic: &RelicState, sessions: &SessionRegistry) -> RelicInfo {
        let holder = relic.holder_id().and_then(|id| sessions.get(&id));
        let (x, y) = holder.map(|p| (p.x, p.y)).unwrap_or((relic.x, relic.y));

        RelicInfo {
            is_held: relic.is_held(),
            holder_id: relic.holder_id(),
            is_respawning: relic.is_respawning(),
            position: Position { x, y },
            timestamp: unix_millis(),
        }
    }

    pub fn relic_status(relic: &RelicState, sessions: &SessionRegistry) -> ServerMsg {
        ServerMsg::RelicStatus {
            relic: Self::relic_info(relic, sessions),
        }
    }

    /// Everything a client needs to render the game from scratch
    pub fn initial_state(
        self_id: Option<Uuid>,
        world: &WorldConfig,
        sessions: &SessionRegistry,
        relic: &RelicState,
        scores: &ScoreTable,
        ledger: &ExplorationLedger,
    ) -> ServerMsg {
        ServerMsg::InitialState {
            self_id,
            world: WorldInfo::from(world),
            players: sessions.all().iter().map(Self::player_info).collect(),
            relic: Self::relic_info(relic, sessions),
            scores: scores.snapshot(),
            explored: ledger.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_floors_positions_in_join_order() {
        let world = WorldConfig::default();
        let mut sessions = SessionRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        sessions.join(&world, a, "a").unwrap();
        sessions.join(&world, b, "b").unwrap();
        {
            let p = sessions.get_mut(&a).unwrap();
            p.x = 123.9;
            p.y = 456.2;
            p.last_timestamp = Some(42.0);
        }

        match SnapshotBuilder::player_snapshot(&sessions) {
            ServerMsg::PlayerSnapshot { players } => {
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].id, a);
                assert_eq!((players[0].x, players[0].y), (123, 456));
                assert_eq!(players[0].timestamp, 42.0);
                assert_eq!(players[1].id, b);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn held_relic_follows_holder() {
        let world = WorldConfig::default();
        let mut sessions = SessionRegistry::new();
        let id = Uuid::new_v4();
        sessions.join(&world, id, "a").unwrap();

        let mut relic = RelicState::new(world.center());
        let info = SnapshotBuilder::relic_info(&relic, &sessions);
        assert_eq!(info.position, Position { x: 500.0, y: 500.0 });

        relic.grab(id, 500.0, 500.0).unwrap();
        let info = SnapshotBuilder::relic_info(&relic, &sessions);
        assert!(info.is_held);
        assert_eq!(info.holder_id, Some(id));
        assert_eq!(info.position, Position { x: 100.0, y: 100.0 });
    }
}
