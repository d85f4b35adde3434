//! The fixed-size pool of collectible items.
//!
//! Ids are assigned once at initialization (0..count) and live for the whole
//! process. Collection flips an item to collected; respawn reuses the same id
//! with a fresh position and kind. Nothing is ever added or removed.

use log::debug;
use rand::Rng;
use shared::{
    draw_kind, HeightField, ItemState, KindCatalog, Vec3, ITEM_FIELD_HALF_EXTENT,
    ITEM_HEIGHT_OFFSET,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CollectError {
    #[error("item {0} does not exist")]
    NotFound(u32),
    #[error("item {0} is already collected")]
    AlreadyCollected(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: u32,
    pub position: Vec3,
    pub kind: &'static str,
    pub value: i32,
    pub color: u32,
    pub collected: bool,
}

impl Item {
    fn draw<R: Rng + ?Sized, H: HeightField + ?Sized>(
        id: u32,
        rng: &mut R,
        terrain: &H,
        catalog: &KindCatalog,
    ) -> Self {
        let x = rng.gen_range(-ITEM_FIELD_HALF_EXTENT..ITEM_FIELD_HALF_EXTENT);
        let z = rng.gen_range(-ITEM_FIELD_HALF_EXTENT..ITEM_FIELD_HALF_EXTENT);
        let y = terrain.height_at(x, z) + ITEM_HEIGHT_OFFSET;
        let kind = draw_kind(catalog, rng);

        Self {
            id,
            position: Vec3::new(x, y, z),
            kind: kind.name,
            value: kind.value,
            color: kind.color,
            collected: false,
        }
    }

    pub fn to_state(&self) -> ItemState {
        ItemState {
            id: self.id,
            position: self.position,
            kind: self.kind.to_string(),
            value: self.value,
            color: self.color,
            collected: self.collected,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemPool {
    items: Vec<Item>,
}

impl ItemPool {
    /// Places `count` items uniformly over the item field, each resting on
    /// the terrain with a kind drawn from `catalog`.
    pub fn initialize<R: Rng + ?Sized, H: HeightField + ?Sized>(
        count: usize,
        rng: &mut R,
        terrain: &H,
        catalog: &KindCatalog,
    ) -> Self {
        let items = (0..count as u32)
            .map(|id| Item::draw(id, &mut *rng, terrain, catalog))
            .collect();
        Self { items }
    }

    pub fn get(&self, id: u32) -> Option<&Item> {
        self.items.get(id as usize)
    }

    /// Flips an available item to collected and returns a copy of it.
    ///
    /// This is the only place an item leaves the available state.
    pub fn mark_collected(&mut self, id: u32) -> Result<Item, CollectError> {
        let item = self
            .items
            .get_mut(id as usize)
            .ok_or(CollectError::NotFound(id))?;

        if item.collected {
            return Err(CollectError::AlreadyCollected(id));
        }

        item.collected = true;
        Ok(item.clone())
    }

    /// Redraws position and kind for `id` and makes it available again.
    /// Unknown ids are ignored.
    pub fn respawn<R: Rng + ?Sized, H: HeightField + ?Sized>(
        &mut self,
        id: u32,
        rng: &mut R,
        terrain: &H,
        catalog: &KindCatalog,
    ) -> Option<&Item> {
        let Some(slot) = self.items.get_mut(id as usize) else {
            debug!("Ignoring respawn for unknown item {}", id);
            return None;
        };

        *slot = Item::draw(id, rng, terrain, catalog);
        Some(slot)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn states(&self) -> Vec<ItemState> {
        self.items.iter().map(Item::to_state).collect()
    }

    pub fn available_count(&self) -> usize {
        self.items.iter().filter(|item| !item.collected).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flat(_x: f32, _z: f32) -> f32 {
        1.0
    }

    fn test_pool(count: usize) -> (ItemPool, StdRng) {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = ItemPool::initialize(count, &mut rng, &flat, &KindCatalog::standard());
        (pool, rng)
    }

    #[test]
    fn test_initialize_assigns_sequential_ids() {
        let (pool, _) = test_pool(200);

        assert_eq!(pool.len(), 200);
        for (index, item) in pool.items().iter().enumerate() {
            assert_eq!(item.id, index as u32);
            assert!(!item.collected);
        }
        assert_eq!(pool.available_count(), 200);
    }

    #[test]
    fn test_initialize_places_items_on_terrain_within_field() {
        let (pool, _) = test_pool(200);
        let catalog = KindCatalog::standard();

        for item in pool.items() {
            assert!(item.position.x >= -ITEM_FIELD_HALF_EXTENT);
            assert!(item.position.x < ITEM_FIELD_HALF_EXTENT);
            assert!(item.position.z >= -ITEM_FIELD_HALF_EXTENT);
            assert!(item.position.z < ITEM_FIELD_HALF_EXTENT);
            assert_approx_eq!(item.position.y, 1.0 + ITEM_HEIGHT_OFFSET, 1e-6);

            let kind = catalog.by_name(item.kind).unwrap();
            assert_eq!(item.value, kind.value);
            assert_eq!(item.color, kind.color);
        }
    }

    #[test]
    fn test_mark_collected_once() {
        let (mut pool, _) = test_pool(5);

        let item = pool.mark_collected(2).unwrap();
        assert_eq!(item.id, 2);
        assert!(item.collected);
        assert!(pool.get(2).unwrap().collected);

        assert_eq!(pool.mark_collected(2), Err(CollectError::AlreadyCollected(2)));
        assert_eq!(pool.available_count(), 4);
    }

    #[test]
    fn test_mark_collected_unknown_id() {
        let (mut pool, _) = test_pool(5);
        assert_eq!(pool.mark_collected(5), Err(CollectError::NotFound(5)));
        assert_eq!(pool.available_count(), 5);
    }

    #[test]
    fn test_respawn_reuses_identity() {
        let (mut pool, mut rng) = test_pool(5);
        let catalog = KindCatalog::standard();
        let before = pool.get(1).unwrap().clone();

        pool.mark_collected(1).unwrap();
        let respawned = pool.respawn(1, &mut rng, &flat, &catalog).unwrap().clone();

        assert_eq!(respawned.id, 1);
        assert!(!respawned.collected);
        assert_ne!(respawned.position, before.position);
        assert!(catalog.by_name(respawned.kind).is_some());
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_respawn_unknown_id_is_noop() {
        let (mut pool, mut rng) = test_pool(3);
        let snapshot = pool.items().to_vec();

        assert!(pool
            .respawn(99, &mut rng, &flat, &KindCatalog::standard())
            .is_none());
        assert_eq!(pool.items(), snapshot.as_slice());
    }

    #[test]
    fn test_item_state_conversion() {
        let (pool, _) = test_pool(1);
        let item = pool.get(0).unwrap();
        let state = item.to_state();

        assert_eq!(state.id, 0);
        assert_eq!(state.kind, item.kind);
        assert_eq!(state.value, item.value);
        assert_eq!(state.position, item.position);
        assert!(!state.collected);
    }
}
