//! The claim / respawn lifecycle of a single item.
//!
//! ```text
//! Available --claim--> Collected { respawn_at } --timer--> Available (redrawn)
//! ```
//!
//! Only the claim transition is contested. The authority runs every claim to
//! completion before looking at the next event, so the first claim to reach
//! [`ItemPool::mark_collected`] wins and every later claim for the same item
//! sees `AlreadyCollected` until the respawn fires.

use crate::item_pool::{CollectError, Item, ItemPool};
use crate::roster::Roster;
use crate::scheduler::RespawnScheduler;
use log::info;
use rand::Rng;
use shared::{HeightField, KindCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPhase {
    Available,
    /// `respawn_at` is `None` only if the timer was lost, which cannot happen
    /// within one process lifetime.
    Collected { respawn_at: Option<u64> },
}

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub item: Item,
    pub claimant_id: u32,
    pub new_score: i32,
    pub kind_count: u32,
    pub respawn_at: u64,
}

#[derive(Debug)]
pub struct CollectionProtocol {
    scheduler: RespawnScheduler,
    respawn_delay_ms: u64,
}

impl CollectionProtocol {
    pub fn new(respawn_delay_ms: u64) -> Self {
        Self {
            scheduler: RespawnScheduler::new(),
            respawn_delay_ms,
        }
    }

    /// Marks the item collected, credits the claimant and schedules the
    /// respawn `respawn_delay_ms` after `now`.
    ///
    /// Nothing is mutated when the item is missing or already collected.
    pub fn claim(
        &mut self,
        pool: &mut ItemPool,
        roster: &mut Roster,
        item_id: u32,
        claimant_id: u32,
        now: u64,
    ) -> Result<Claim, CollectError> {
        let item = pool.mark_collected(item_id)?;
        // One outstanding timer per item: it was available until now
        debug_assert!(!self.scheduler.is_pending(item_id));

        let new_score = roster.add_score(claimant_id, item.value);
        let kind_count = roster.add_to_inventory(claimant_id, item.kind);

        let respawn_at = now + self.respawn_delay_ms;
        self.scheduler.schedule(item_id, respawn_at);

        info!(
            "Participant {} collected item {} ({}, {:+}) -> score {}",
            claimant_id, item_id, item.kind, item.value, new_score
        );

        Ok(Claim {
            item,
            claimant_id,
            new_score,
            kind_count,
            respawn_at,
        })
    }

    /// Respawns every item whose timer has expired by `now` and returns the
    /// redrawn items in firing order.
    pub fn respawn_due<R: Rng + ?Sized, H: HeightField + ?Sized>(
        &mut self,
        pool: &mut ItemPool,
        now: u64,
        rng: &mut R,
        terrain: &H,
        catalog: &KindCatalog,
    ) -> Vec<Item> {
        self.scheduler
            .pop_due(now)
            .into_iter()
            .filter_map(|item_id| {
                let item = pool.respawn(item_id, &mut *rng, terrain, catalog)?.clone();
                info!(
                    "Item {} respawned as {} at ({:.1}, {:.1}, {:.1})",
                    item.id, item.kind, item.position.x, item.position.y, item.position.z
                );
                Some(item)
            })
            .collect()
    }

    pub fn phase(&self, pool: &ItemPool, item_id: u32) -> Option<ItemPhase> {
        let item = pool.get(item_id)?;
        if item.collected {
            Some(ItemPhase::Collected {
                respawn_at: self.scheduler.deadline_for(item_id),
            })
        } else {
            Some(ItemPhase::Available)
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    pub fn pending_respawns(&self) -> usize {
        self.scheduler.len()
    }
}
