//! Protocol types, world constants and collaborator contracts shared by the
//! authority and every client.
//!
//! Both sides compile against this crate so the packet layout, the kind
//! catalog and the terrain height function are identical by construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod catalog;
pub mod framing;
pub mod terrain;

pub use catalog::{draw_kind, select_kind, CatalogError, ItemKind, KindCatalog};
pub use terrain::{HeightField, RollingTerrain};

pub const WORLD_SIZE: f32 = 2000.0;
pub const ITEM_FIELD_HALF_EXTENT: f32 = 90.0;
pub const ITEM_COUNT: usize = 200;
pub const ITEM_HEIGHT_OFFSET: f32 = 0.1;
pub const RESPAWN_DELAY_MS: u64 = 30_000;
pub const COLLECTION_DISTANCE: f32 = 2.0;
pub const POSE_UPDATE_INTERVAL_MS: u64 = 50;
pub const PLAYER_HEIGHT: f32 = 1.6;
pub const PLAYER_SPEED: f32 = 5.0;
pub const REMOTE_SMOOTHING: f32 = 0.2;
pub const MAX_NAME_LEN: usize = 32;

/// Spawn position for every new participant.
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, PLAYER_HEIGHT, 0.0);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Moves `t` of the way towards `target`.
    pub fn lerp(&self, target: &Vec3, t: f32) -> Vec3 {
        Vec3 {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
            z: self.z + (target.z - self.z) * t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Wire view of a single collectible.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ItemState {
    pub id: u32,
    pub position: Vec3,
    pub kind: String,
    pub value: i32,
    pub color: u32,
    pub collected: bool,
}

/// Wire view of a participant, as carried in the join snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParticipantState {
    pub id: u32,
    pub name: String,
    pub position: Vec3,
    pub orientation: Vec3,
    pub score: i32,
    pub inventory: BTreeMap<String, u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub id: u32,
    pub name: String,
    pub score: i32,
}

/// Why the authority refused a collect intent.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotFound,
    AlreadyCollected,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Client intents
    Join {
        name: String,
    },
    PoseUpdate {
        position: Vec3,
        orientation: Vec3,
    },
    CollectIntent {
        item_id: u32,
    },
    LeaderboardRequest,
    Leave,

    // Authority broadcasts and replies
    InitSnapshot {
        self_id: u32,
        participants: Vec<ParticipantState>,
        items: Vec<ItemState>,
    },
    ParticipantJoined {
        id: u32,
        name: String,
        position: Vec3,
    },
    ParticipantPose {
        id: u32,
        position: Vec3,
        orientation: Vec3,
    },
    ParticipantLeft {
        id: u32,
    },
    ItemCollected {
        item_id: u32,
        claimant_id: u32,
    },
    ItemRespawned {
        item_id: u32,
        position: Vec3,
        kind: String,
        value: i32,
        color: u32,
    },
    CollectRejected {
        item_id: u32,
        reason: RejectReason,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    Disconnected {
        reason: String,
    },
}

impl Packet {
    /// True for packets a client is allowed to send.
    pub fn is_client_intent(&self) -> bool {
        matches!(
            self,
            Packet::Join { .. }
                | Packet::PoseUpdate { .. }
                | Packet::CollectIntent { .. }
                | Packet::LeaderboardRequest
                | Packet::Leave
        )
    }

    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Largest encoded `InitSnapshot` a world of `items` items and `participants`
/// participants can produce with kinds drawn from `catalog`.
///
/// Only strings and inventories vary in size, so one item carrying the longest
/// kind name and one participant with a full-length name holding every kind
/// are sized and scaled.
pub fn snapshot_size_bound(
    catalog: &KindCatalog,
    items: usize,
    participants: usize,
) -> Result<u64, bincode::Error> {
    let longest_kind = catalog
        .kinds()
        .iter()
        .map(|kind| kind.name)
        .max_by_key(|name| name.len())
        .unwrap_or_default();

    let item = ItemState {
        id: u32::MAX,
        position: Vec3::ZERO,
        kind: longest_kind.to_string(),
        value: 0,
        color: 0,
        collected: false,
    };
    let participant = ParticipantState {
        id: u32::MAX,
        name: "x".repeat(MAX_NAME_LEN),
        position: Vec3::ZERO,
        orientation: Vec3::ZERO,
        score: 0,
        inventory: catalog
            .kinds()
            .iter()
            .map(|kind| (kind.name.to_string(), u32::MAX))
            .collect(),
    };
    let empty = Packet::InitSnapshot {
        self_id: 0,
        participants: Vec::new(),
        items: Vec::new(),
    };

    let base = bincode::serialized_size(&empty)?;
    let per_item = bincode::serialized_size(&item)?;
    let per_participant = bincode::serialized_size(&participant)?;
    Ok(base + per_item * items as u64 + per_participant * participants as u64)
}

/// Trims a client-supplied display name and caps it at `MAX_NAME_LEN` bytes.
///
/// Returns `None` for names that are blank after trimming.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut end = trimmed.len().min(MAX_NAME_LEN);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    Some(trimmed[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_vec3_distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_approx_eq!(a.distance(&b), 5.0, 0.0001);
        assert_approx_eq!(b.distance(&a), 5.0, 0.0001);
    }

    #[test]
    fn test_vec3_lerp() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, -10.0, 5.0);

        let mid = a.lerp(&b, 0.2);
        assert_approx_eq!(mid.x, 2.0, 0.0001);
        assert_approx_eq!(mid.y, -2.0, 0.0001);
        assert_approx_eq!(mid.z, 1.0, 0.0001);

        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.0), a);
    }

    #[test]
    fn test_vec3_is_finite() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Vec3::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, f32::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_spawn_position() {
        assert_eq!(SPAWN_POSITION.x, 0.0);
        assert_eq!(SPAWN_POSITION.y, PLAYER_HEIGHT);
        assert_eq!(SPAWN_POSITION.z, 0.0);
    }

    #[test]
    fn test_client_intent_classification() {
        assert!(Packet::Join {
            name: "a".to_string()
        }
        .is_client_intent());
        assert!(Packet::CollectIntent { item_id: 1 }.is_client_intent());
        assert!(Packet::LeaderboardRequest.is_client_intent());
        assert!(Packet::Leave.is_client_intent());

        assert!(!Packet::ParticipantLeft { id: 1 }.is_client_intent());
        assert!(!Packet::ItemCollected {
            item_id: 1,
            claimant_id: 2
        }
        .is_client_intent());
    }

    #[test]
    fn test_packet_serialization_snapshot() {
        let mut inventory = BTreeMap::new();
        inventory.insert("Boletus".to_string(), 2);

        let packet = Packet::InitSnapshot {
            self_id: 7,
            participants: vec![ParticipantState {
                id: 7,
                name: "Ada".to_string(),
                position: SPAWN_POSITION,
                orientation: Vec3::ZERO,
                score: 6,
                inventory,
            }],
            items: vec![ItemState {
                id: 0,
                position: Vec3::new(1.0, 2.0, 3.0),
                kind: "Boletus".to_string(),
                value: 3,
                color: 0xCD853F,
                collected: true,
            }],
        };

        let bytes = packet.encode().unwrap();
        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_snapshot_size_bound_covers_real_snapshot() {
        let catalog = KindCatalog::standard();
        let longest = catalog
            .kinds()
            .iter()
            .max_by_key(|kind| kind.name.len())
            .unwrap();

        let items: Vec<ItemState> = (0..50)
            .map(|id| ItemState {
                id,
                position: Vec3::new(id as f32, 0.1, 0.0),
                kind: longest.name.to_string(),
                value: longest.value,
                color: longest.color,
                collected: id % 2 == 0,
            })
            .collect();
        let participants: Vec<ParticipantState> = (1..=3)
            .map(|id| ParticipantState {
                id,
                name: "n".repeat(MAX_NAME_LEN),
                position: SPAWN_POSITION,
                orientation: Vec3::ZERO,
                score: -4,
                inventory: catalog
                    .kinds()
                    .iter()
                    .map(|kind| (kind.name.to_string(), id))
                    .collect(),
            })
            .collect();
        let bytes = Packet::InitSnapshot {
            self_id: 3,
            participants,
            items,
        }
        .encode()
        .unwrap();

        // Fixed-width encoding makes the bound exact for worst-case content
        assert_eq!(
            snapshot_size_bound(&catalog, 50, 3).unwrap(),
            bytes.len() as u64
        );
        assert!(snapshot_size_bound(&catalog, 51, 3).unwrap() > bytes.len() as u64);
    }

    #[test]
    fn test_truncated_packet_is_rejected() {
        let bytes = Packet::ItemCollected {
            item_id: 3,
            claimant_id: 9,
        }
        .encode()
        .unwrap();

        assert!(Packet::decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(Packet::decode(&[]).is_err());
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  Ada  "), Some("Ada".to_string()));
        assert_eq!(sanitize_name("   "), None);
        assert_eq!(sanitize_name(""), None);

        let long = "x".repeat(100);
        assert_eq!(sanitize_name(&long).unwrap().len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_sanitize_name_respects_char_boundaries() {
        // 31 ASCII bytes followed by a two-byte character straddling the cap
        let name = format!("{}é", "a".repeat(31));
        let cleaned = sanitize_name(&name).unwrap();
        assert_eq!(cleaned, "a".repeat(31));
    }
}
