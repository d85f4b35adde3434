//! Connected participants and their scores.

use log::info;
use shared::{LeaderboardEntry, ParticipantState, Vec3, SPAWN_POSITION};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RosterError {
    #[error("participant {0} has already joined")]
    AlreadyJoined(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: u32,
    pub name: String,
    pub position: Vec3,
    pub orientation: Vec3,
    pub score: i32,
    /// Per-kind collection counts; kinds appear on first collection.
    pub inventory: BTreeMap<String, u32>,
    /// Join sequence number, used as the leaderboard tie-break.
    joined_seq: u64,
}

impl Participant {
    fn new(id: u32, name: String, joined_seq: u64) -> Self {
        Self {
            id,
            name,
            position: SPAWN_POSITION,
            orientation: Vec3::ZERO,
            score: 0,
            inventory: BTreeMap::new(),
            joined_seq,
        }
    }

    pub fn to_state(&self) -> ParticipantState {
        ParticipantState {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            orientation: self.orientation,
            score: self.score,
            inventory: self.inventory.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Roster {
    participants: HashMap<u32, Participant>,
    next_join_seq: u64,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant at the spawn pose with a zero score.
    pub fn join(&mut self, id: u32, name: String) -> Result<&Participant, RosterError> {
        if self.participants.contains_key(&id) {
            return Err(RosterError::AlreadyJoined(id));
        }

        let seq = self.next_join_seq;
        self.next_join_seq += 1;

        info!("Participant {} joined as {:?}", id, name);
        let participant = self
            .participants
            .entry(id)
            .or_insert_with(|| Participant::new(id, name, seq));
        Ok(participant)
    }

    /// Removes a participant. Returns `None` if they were not present.
    pub fn leave(&mut self, id: u32) -> Option<Participant> {
        let removed = self.participants.remove(&id);
        if let Some(participant) = &removed {
            info!(
                "Participant {} ({}) left with score {}",
                id, participant.name, participant.score
            );
        }
        removed
    }

    pub fn get(&self, id: u32) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.participants.contains_key(&id)
    }

    /// Overwrites the stored pose. Returns false for unknown participants.
    pub fn update_pose(&mut self, id: u32, position: Vec3, orientation: Vec3) -> bool {
        match self.participants.get_mut(&id) {
            Some(participant) => {
                participant.position = position;
                participant.orientation = orientation;
                true
            }
            None => false,
        }
    }

    /// Adds `delta` (possibly negative) and returns the new total, or 0 for
    /// unknown participants.
    pub fn add_score(&mut self, id: u32, delta: i32) -> i32 {
        match self.participants.get_mut(&id) {
            Some(participant) => {
                participant.score = participant.score.saturating_add(delta);
                participant.score
            }
            None => 0,
        }
    }

    /// Increments the count for `kind` and returns it, or 0 for unknown
    /// participants.
    pub fn add_to_inventory(&mut self, id: u32, kind: &str) -> u32 {
        match self.participants.get_mut(&id) {
            Some(participant) => {
                let count = participant.inventory.entry(kind.to_string()).or_insert(0);
                *count += 1;
                *count
            }
            None => 0,
        }
    }

    /// Participants in join order.
    pub fn in_join_order(&self) -> Vec<&Participant> {
        let mut participants: Vec<&Participant> = self.participants.values().collect();
        participants.sort_by_key(|p| p.joined_seq);
        participants
    }

    /// Highest score first; equal scores keep join order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut participants = self.in_join_order();
        participants.sort_by(|a, b| b.score.cmp(&a.score));

        participants
            .into_iter()
            .map(|p| LeaderboardEntry {
                id: p.id,
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }

    pub fn states(&self) -> Vec<ParticipantState> {
        self.in_join_order()
            .into_iter()
            .map(Participant::to_state)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
