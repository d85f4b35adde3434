//! Local, read-only mirror of the authority's world.
//!
//! The projection is seeded by `InitSnapshot` and afterwards only changes when
//! an authority packet is applied. Nothing the local player does mutates it
//! directly: walking onto a mushroom queues a claim, but the mushroom stays
//! visible until the `ItemCollected` broadcast arrives.
//!
//! Broadcasts that arrive before the snapshot are ignored. They describe
//! changes the snapshot already contains.

use log::{debug, info, warn};
use shared::{
    ItemState, LeaderboardEntry, Packet, ParticipantState, Vec3, COLLECTION_DISTANCE,
};
use std::collections::{BTreeMap, HashSet};

/// What applying one packet did to the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applied {
    /// The projection was (re)seeded; the local player starts at `spawn`.
    Snapshot { spawn: Vec3 },
    Changed,
    Ignored,
}

/// Another participant as seen locally.
///
/// `position` is what gets drawn. It chases `target`, the last pose the
/// authority relayed, so remote avatars trail the truth slightly.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteParticipant {
    pub id: u32,
    pub name: String,
    pub position: Vec3,
    pub orientation: Vec3,
    pub target_position: Vec3,
    pub target_orientation: Vec3,
    pub score: i32,
}

impl RemoteParticipant {
    fn from_state(state: ParticipantState) -> Self {
        Self {
            id: state.id,
            name: state.name,
            position: state.position,
            orientation: state.orientation,
            target_position: state.position,
            target_orientation: state.orientation,
            score: state.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalItem {
    pub id: u32,
    pub position: Vec3,
    pub kind: String,
    pub value: i32,
    pub color: u32,
    pub visible: bool,
}

impl From<ItemState> for LocalItem {
    fn from(state: ItemState) -> Self {
        Self {
            id: state.id,
            position: state.position,
            kind: state.kind,
            value: state.value,
            color: state.color,
            visible: !state.collected,
        }
    }
}

#[derive(Debug, Default)]
pub struct Reconciler {
    self_id: Option<u32>,
    self_name: String,
    remotes: BTreeMap<u32, RemoteParticipant>,
    items: BTreeMap<u32, LocalItem>,
    /// Items we've asked for and not yet heard back about
    pending_claims: HashSet<u32>,
    score: i32,
    inventory: BTreeMap<String, u32>,
    leaderboard: Vec<LeaderboardEntry>,
    disconnect_reason: Option<String>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, packet: Packet) -> Applied {
        match packet {
            Packet::InitSnapshot {
                self_id,
                participants,
                items,
            } => self.apply_snapshot(self_id, participants, items),
            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.disconnect_reason = Some(reason);
                Applied::Changed
            }
            _ if self.self_id.is_none() => Applied::Ignored,
            Packet::ParticipantJoined { id, name, position } => {
                if Some(id) == self.self_id {
                    return Applied::Ignored;
                }
                info!("{} joined", name);
                self.remotes.insert(
                    id,
                    RemoteParticipant::from_state(ParticipantState {
                        id,
                        name,
                        position,
                        orientation: Vec3::ZERO,
                        score: 0,
                        inventory: BTreeMap::new(),
                    }),
                );
                Applied::Changed
            }
            Packet::ParticipantPose {
                id,
                position,
                orientation,
            } => match self.remotes.get_mut(&id) {
                Some(remote) => {
                    remote.target_position = position;
                    remote.target_orientation = orientation;
                    Applied::Changed
                }
                None => {
                    debug!("Pose for unknown participant {}", id);
                    Applied::Ignored
                }
            },
            Packet::ParticipantLeft { id } => match self.remotes.remove(&id) {
                Some(remote) => {
                    info!("{} left", remote.name);
                    Applied::Changed
                }
                None => Applied::Ignored,
            },
            Packet::ItemCollected {
                item_id,
                claimant_id,
            } => self.apply_collected(item_id, claimant_id),
            Packet::ItemRespawned {
                item_id,
                position,
                kind,
                value,
                color,
            } => {
                self.pending_claims.remove(&item_id);
                let item = LocalItem {
                    id: item_id,
                    position,
                    kind,
                    value,
                    color,
                    visible: true,
                };
                self.items.insert(item_id, item);
                Applied::Changed
            }
            Packet::CollectRejected { item_id, reason } => {
                debug!("Claim on item {} rejected: {:?}", item_id, reason);
                if self.pending_claims.remove(&item_id) {
                    Applied::Changed
                } else {
                    Applied::Ignored
                }
            }
            Packet::Leaderboard { entries } => {
                self.leaderboard = entries;
                Applied::Changed
            }
            other => {
                debug!("Ignoring intent echoed by server: {:?}", other);
                Applied::Ignored
            }
        }
    }

    fn apply_snapshot(
        &mut self,
        self_id: u32,
        participants: Vec<ParticipantState>,
        items: Vec<ItemState>,
    ) -> Applied {
        let mut spawn = shared::SPAWN_POSITION;

        self.remotes.clear();
        for state in participants {
            if state.id == self_id {
                spawn = state.position;
                self.self_name = state.name;
                self.score = state.score;
                self.inventory = state.inventory;
            } else {
                self.remotes
                    .insert(state.id, RemoteParticipant::from_state(state));
            }
        }

        self.items = items
            .into_iter()
            .map(|state| (state.id, LocalItem::from(state)))
            .collect();
        self.pending_claims.clear();
        self.self_id = Some(self_id);

        info!(
            "Joined as {} with {} others and {} items",
            self_id,
            self.remotes.len(),
            self.items.len()
        );
        Applied::Snapshot { spawn }
    }

    fn apply_collected(&mut self, item_id: u32, claimant_id: u32) -> Applied {
        self.pending_claims.remove(&item_id);

        let Some(item) = self.items.get_mut(&item_id) else {
            debug!("Collected unknown item {}", item_id);
            return Applied::Ignored;
        };
        item.visible = false;

        if Some(claimant_id) == self.self_id {
            self.score = self.score.saturating_add(item.value);
            *self.inventory.entry(item.kind.clone()).or_insert(0) += 1;
            info!("Collected {} ({:+}), score {}", item.kind, item.value, self.score);
        } else if let Some(remote) = self.remotes.get_mut(&claimant_id) {
            remote.score = remote.score.saturating_add(item.value);
        }

        Applied::Changed
    }

    /// Moves every remote avatar `factor` of the way toward its target pose.
    pub fn interpolate_remotes(&mut self, factor: f32) {
        for remote in self.remotes.values_mut() {
            remote.position = remote.position.lerp(&remote.target_position, factor);
            remote.orientation = remote.orientation.lerp(&remote.target_orientation, factor);
        }
    }

    /// Visible items within reach of `position` that have no claim in
    /// flight yet. Each returned id is marked pending.
    pub fn nearby_claims(&mut self, position: Vec3) -> Vec<u32> {
        let claims: Vec<u32> = self
            .items
            .values()
            .filter(|item| item.visible && !self.pending_claims.contains(&item.id))
            .filter(|item| item.position.distance(&position) < COLLECTION_DISTANCE)
            .map(|item| item.id)
            .collect();

        self.pending_claims.extend(claims.iter().copied());
        claims
    }

    pub fn is_synced(&self) -> bool {
        self.self_id.is_some()
    }

    pub fn self_id(&self) -> Option<u32> {
        self.self_id
    }

    pub fn self_name(&self) -> &str {
        &self.self_name
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemoteParticipant> {
        self.remotes.values()
    }

    pub fn remote(&self, id: u32) -> Option<&RemoteParticipant> {
        self.remotes.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &LocalItem> {
        self.items.values()
    }

    pub fn item(&self, id: u32) -> Option<&LocalItem> {
        self.items.get(&id)
    }

    pub fn visible_item_count(&self) -> usize {
        self.items.values().filter(|item| item.visible).count()
    }

    pub fn is_pending(&self, item_id: u32) -> bool {
        self.pending_claims.contains(&item_id)
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn inventory(&self) -> &BTreeMap<String, u32> {
        &self.inventory
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn disconnect_reason(&self) -> Option<&str> {
        self.disconnect_reason.as_deref()
    }
}
