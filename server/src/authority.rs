//! The single writer of shared world state.
//!
//! Every inbound event (join, leave, pose, collect, leaderboard request,
//! respawn timer) goes through exactly one `&mut self` call that runs to
//! completion and returns the packets it wants delivered. Because the caller
//! serializes these calls, claims on the same item can never interleave.

use crate::collection::{Claim, CollectionProtocol, ItemPhase};
use crate::item_pool::{CollectError, ItemPool};
use crate::roster::{Roster, RosterError};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::framing::MAX_FRAME_PAYLOAD;
use shared::{
    sanitize_name, snapshot_size_bound, HeightField, KindCatalog, Packet, RejectReason, RollingTerrain, Vec3,
    ITEM_COUNT, RESPAWN_DELAY_MS,
};
use thiserror::Error;

/// World tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    pub item_count: usize,
    pub respawn_delay_ms: u64,
    /// Seed for item placement and kind draws; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub terrain_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            item_count: ITEM_COUNT,
            respawn_delay_ms: RESPAWN_DELAY_MS,
            seed: None,
            terrain_seed: 0,
        }
    }
}

impl WorldConfig {
    /// Checks that a full world still fits the join snapshot in one frame.
    pub fn validate(&self, max_clients: usize) -> Result<(), ConfigError> {
        let size = snapshot_size_bound(&KindCatalog::standard(), self.item_count, max_clients)
            .map_err(|e| ConfigError::Encoding(e.to_string()))?;
        if size > u64::from(MAX_FRAME_PAYLOAD) {
            return Err(ConfigError::SnapshotTooLarge {
                item_count: self.item_count,
                max_clients,
                size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error(
        "{item_count} items with {max_clients} clients need a {size} byte join snapshot, \
         over the {} byte frame limit",
        MAX_FRAME_PAYLOAD
    )]
    SnapshotTooLarge {
        item_count: usize,
        max_clients: usize,
        size: u64,
    },

    #[error("could not size join snapshot: {0}")]
    Encoding(String),
}

/// A packet addressed to one connection or fanned out to many.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Send { client_id: u32, packet: Packet },
    Broadcast { packet: Packet, exclude: Option<u32> },
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthorityError {
    #[error("unknown participant {0}")]
    UnknownParticipant(u32),

    #[error("malformed intent from {client_id}: {reason}")]
    MalformedIntent {
        client_id: u32,
        reason: &'static str,
    },

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Collect(#[from] CollectError),
}

pub struct Authority<H: HeightField = RollingTerrain> {
    pool: ItemPool,
    roster: Roster,
    protocol: CollectionProtocol,
    catalog: KindCatalog,
    terrain: H,
    rng: StdRng,
}

impl Authority<RollingTerrain> {
    /// Builds an authority on rolling terrain seeded from `config.terrain_seed`.
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config, RollingTerrain::new(config.terrain_seed))
    }
}

impl<H: HeightField> Authority<H> {
    pub fn new(config: &WorldConfig, terrain: H) -> Self {
        Self::with_catalog(config, terrain, KindCatalog::standard())
    }

    pub fn with_catalog(config: &WorldConfig, terrain: H, catalog: KindCatalog) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pool = ItemPool::initialize(config.item_count, &mut rng, &terrain, &catalog);
        info!(
            "World seeded with {} items, respawn delay {}ms",
            pool.len(),
            config.respawn_delay_ms
        );

        Self {
            pool,
            roster: Roster::new(),
            protocol: CollectionProtocol::new(config.respawn_delay_ms),
            catalog,
            terrain,
            rng,
        }
    }

    /// Routes one inbound packet from `client_id`.
    ///
    /// Failures never escape: race losers and unknown items get a
    /// `CollectRejected` notice, everything else is logged and dropped.
    pub fn handle(&mut self, client_id: u32, packet: Packet, now: u64) -> Vec<Dispatch> {
        let result = match packet {
            Packet::Join { name } => self.on_join(client_id, &name),
            Packet::PoseUpdate {
                position,
                orientation,
            } => self.on_pose_update(client_id, position, orientation),
            Packet::CollectIntent { item_id } => self.on_collect_intent(client_id, item_id, now),
            Packet::LeaderboardRequest => self.on_leaderboard_request(client_id),
            Packet::Leave => Ok(self.on_leave(client_id)),
            _ => Err(AuthorityError::MalformedIntent {
                client_id,
                reason: "server-only packet",
            }),
        };

        result.unwrap_or_else(|error| self.reject(client_id, error))
    }

    fn reject(&self, client_id: u32, error: AuthorityError) -> Vec<Dispatch> {
        match error {
            AuthorityError::Collect(collect) => {
                let (item_id, reason) = match collect {
                    CollectError::NotFound(id) => (id, RejectReason::NotFound),
                    CollectError::AlreadyCollected(id) => (id, RejectReason::AlreadyCollected),
                };
                debug!("Claim by {} rejected: {}", client_id, collect);
                vec![Dispatch::Send {
                    client_id,
                    packet: Packet::CollectRejected { item_id, reason },
                }]
            }
            AuthorityError::UnknownParticipant(id) => {
                debug!("Dropping intent from {} before join", id);
                Vec::new()
            }
            other => {
                warn!("Dropping intent from {}: {}", client_id, other);
                Vec::new()
            }
        }
    }

    /// Adds the participant, replies with a snapshot taken after the insert
    /// and announces them to everyone else.
    pub fn on_join(&mut self, client_id: u32, name: &str) -> Result<Vec<Dispatch>, AuthorityError> {
        let name = sanitize_name(name).ok_or(AuthorityError::MalformedIntent {
            client_id,
            reason: "blank name",
        })?;

        let participant = self.roster.join(client_id, name)?;
        let joined = Packet::ParticipantJoined {
            id: participant.id,
            name: participant.name.clone(),
            position: participant.position,
        };

        let snapshot = Packet::InitSnapshot {
            self_id: client_id,
            participants: self.roster.states(),
            items: self.pool.states(),
        };

        Ok(vec![
            Dispatch::Send {
                client_id,
                packet: snapshot,
            },
            Dispatch::Broadcast {
                packet: joined,
                exclude: Some(client_id),
            },
        ])
    }

    /// Removes the participant and tells everyone. Leaving twice, or leaving
    /// without ever joining, produces nothing.
    pub fn on_leave(&mut self, client_id: u32) -> Vec<Dispatch> {
        match self.roster.leave(client_id) {
            Some(_) => vec![Dispatch::Broadcast {
                packet: Packet::ParticipantLeft { id: client_id },
                exclude: None,
            }],
            None => Vec::new(),
        }
    }

    /// Stores the reported pose verbatim and relays it to everyone else.
    pub fn on_pose_update(
        &mut self,
        client_id: u32,
        position: Vec3,
        orientation: Vec3,
    ) -> Result<Vec<Dispatch>, AuthorityError> {
        if !position.is_finite() || !orientation.is_finite() {
            return Err(AuthorityError::MalformedIntent {
                client_id,
                reason: "non-finite pose",
            });
        }

        if !self.roster.update_pose(client_id, position, orientation) {
            return Err(AuthorityError::UnknownParticipant(client_id));
        }

        Ok(vec![Dispatch::Broadcast {
            packet: Packet::ParticipantPose {
                id: client_id,
                position,
                orientation,
            },
            exclude: Some(client_id),
        }])
    }

    /// Resolves a claim. Proximity is not checked here; clients only send
    /// intents for items they are standing next to.
    pub fn on_collect_intent(
        &mut self,
        client_id: u32,
        item_id: u32,
        now: u64,
    ) -> Result<Vec<Dispatch>, AuthorityError> {
        if !self.roster.contains(client_id) {
            return Err(AuthorityError::UnknownParticipant(client_id));
        }

        let Claim { claimant_id, .. } =
            self.protocol
                .claim(&mut self.pool, &mut self.roster, item_id, client_id, now)?;

        Ok(vec![Dispatch::Broadcast {
            packet: Packet::ItemCollected {
                item_id,
                claimant_id,
            },
            exclude: None,
        }])
    }

    pub fn on_leaderboard_request(&mut self, client_id: u32) -> Result<Vec<Dispatch>, AuthorityError> {
        if !self.roster.contains(client_id) {
            return Err(AuthorityError::UnknownParticipant(client_id));
        }

        Ok(vec![Dispatch::Send {
            client_id,
            packet: Packet::Leaderboard {
                entries: self.roster.leaderboard(),
            },
        }])
    }

    /// Fires every respawn due by `now`, one broadcast per item.
    pub fn on_timer(&mut self, now: u64) -> Vec<Dispatch> {
        self.protocol
            .respawn_due(
                &mut self.pool,
                now,
                &mut self.rng,
                &self.terrain,
                &self.catalog,
            )
            .into_iter()
            .map(|item| Dispatch::Broadcast {
                packet: Packet::ItemRespawned {
                    item_id: item.id,
                    position: item.position,
                    kind: item.kind.to_string(),
                    value: item.value,
                    color: item.color,
                },
                exclude: None,
            })
            .collect()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.protocol.next_deadline()
    }

    pub fn phase(&self, item_id: u32) -> Option<ItemPhase> {
        self.protocol.phase(&self.pool, item_id)
    }

    pub fn pool(&self) -> &ItemPool {
        &self.pool
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn catalog(&self) -> &KindCatalog {
        &self.catalog
    }
}
