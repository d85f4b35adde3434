use crate::input::FrameInput;
use crate::local_player::{LocalPlayer, PoseClock};
use crate::reconciler::{Applied, Reconciler};
use shared::{HeightField, Packet, RollingTerrain, POSE_UPDATE_INTERVAL_MS, REMOTE_SMOOTHING};

/// Per-frame client state: the authority mirror plus the predicted local
/// player.
pub struct ClientGame<H: HeightField = RollingTerrain> {
    reconciler: Reconciler,
    player: LocalPlayer,
    pose_clock: PoseClock,
    terrain: H,
}

impl<H: HeightField> ClientGame<H> {
    pub fn new(terrain: H) -> Self {
        Self {
            reconciler: Reconciler::new(),
            player: LocalPlayer::default(),
            pose_clock: PoseClock::new(POSE_UPDATE_INTERVAL_MS),
            terrain,
        }
    }

    pub fn handle_packet(&mut self, packet: Packet) {
        if let Applied::Snapshot { spawn } = self.reconciler.apply(packet) {
            self.player.reset(spawn);
        }
    }

    /// Advances one frame and returns the intents to send.
    ///
    /// Nothing moves or gets sent until the join snapshot has arrived.
    pub fn update(&mut self, dt: f32, input: &FrameInput, now_ms: u64) -> Vec<Packet> {
        let mut outbound = Vec::new();
        if !self.reconciler.is_synced() {
            return outbound;
        }

        self.player.step(input, dt, &self.terrain);
        self.reconciler.interpolate_remotes(REMOTE_SMOOTHING);

        if self.pose_clock.ready(now_ms) {
            outbound.push(Packet::PoseUpdate {
                position: self.player.position(),
                orientation: self.player.orientation(),
            });
        }

        outbound.extend(
            self.reconciler
                .nearby_claims(self.player.position())
                .into_iter()
                .map(|item_id| Packet::CollectIntent { item_id }),
        );

        if input.leaderboard {
            outbound.push(Packet::LeaderboardRequest);
        }

        outbound
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn player(&self) -> &LocalPlayer {
        &self.player
    }

    pub fn is_connected(&self) -> bool {
        self.reconciler.is_synced() && self.reconciler.disconnect_reason().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ItemState, ParticipantState, Vec3, PLAYER_HEIGHT};
    use std::collections::BTreeMap;

    fn flat(_x: f32, _z: f32) -> f32 {
        0.0
    }

    fn game() -> ClientGame<fn(f32, f32) -> f32> {
        let mut game = ClientGame::new(flat as fn(f32, f32) -> f32);
        game.handle_packet(Packet::InitSnapshot {
            self_id: 1,
            participants: vec![ParticipantState {
                id: 1,
                name: "Ada".to_string(),
                position: Vec3::new(0.0, PLAYER_HEIGHT, 0.0),
                orientation: Vec3::ZERO,
                score: 0,
                inventory: BTreeMap::new(),
            }],
            items: vec![ItemState {
                id: 0,
                position: Vec3::new(0.0, 0.1, -1.0),
                kind: "Common".to_string(),
                value: 1,
                color: 0xFFB6C1,
                collected: false,
            }],
        });
        game
    }

    #[test]
    fn test_idle_before_snapshot() {
        let mut game = ClientGame::new(flat as fn(f32, f32) -> f32);
        let input = FrameInput {
            forward: 1.0,
            ..FrameInput::default()
        };

        assert!(game.update(0.016, &input, 0).is_empty());
        assert!(!game.is_connected());
    }

    #[test]
    fn test_first_frame_sends_pose() {
        let mut game = game();
        let packets = game.update(0.016, &FrameInput::default(), 0);

        assert!(matches!(packets[0], Packet::PoseUpdate { .. }));
        assert!(game.is_connected());
    }

    #[test]
    fn test_pose_throttled_to_interval() {
        let mut game = game();
        let input = FrameInput::default();

        let poses = (0..10u64)
            .flat_map(|frame| game.update(0.016, &input, frame * 16))
            .filter(|packet| matches!(packet, Packet::PoseUpdate { .. }))
            .count();

        // frames at 0, 64 and 128 ms
        assert_eq!(poses, 3);
    }

    #[test]
    fn test_walking_onto_item_sends_one_intent() {
        let mut game = game();
        let input = FrameInput {
            forward: 1.0,
            ..FrameInput::default()
        };

        let mut intents = Vec::new();
        for frame in 0..20u64 {
            for packet in game.update(0.05, &input, frame * 50) {
                if let Packet::CollectIntent { item_id } = packet {
                    intents.push(item_id);
                }
            }
        }

        assert_eq!(intents, vec![0]);
        assert!(game.reconciler().item(0).unwrap().visible);
    }

    #[test]
    fn test_leaderboard_request() {
        let mut game = game();
        let input = FrameInput {
            leaderboard: true,
            ..FrameInput::default()
        };

        let packets = game.update(0.016, &input, 0);
        assert_eq!(packets.last(), Some(&Packet::LeaderboardRequest));
    }
}
