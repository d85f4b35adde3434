//! The fixed catalog of item kinds and the rarity-weighted kind draw.

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemKind {
    pub name: &'static str,
    pub color: u32,
    pub value: i32,
    pub rarity: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("kind catalog must contain at least one kind")]
    Empty,
}

/// Ordered list of kinds. Never empty, so the first entry is always
/// available as the selection fallback.
#[derive(Debug, Clone)]
pub struct KindCatalog {
    kinds: Vec<ItemKind>,
}

const STANDARD_KINDS: [ItemKind; 5] = [
    ItemKind {
        name: "Common",
        color: 0xFFB6C1,
        value: 1,
        rarity: 0.50,
    },
    ItemKind {
        name: "Boletus",
        color: 0xCD853F,
        value: 3,
        rarity: 0.25,
    },
    ItemKind {
        name: "Chanterelle",
        color: 0xFFD700,
        value: 5,
        rarity: 0.12,
    },
    ItemKind {
        name: "Death Cap",
        color: 0x556B2F,
        value: -10,
        rarity: 0.05,
    },
    ItemKind {
        name: "Amanita",
        color: 0xFF0000,
        value: 8,
        rarity: 0.08,
    },
];

impl KindCatalog {
    /// Builds a catalog from an arbitrary kind list. Rarities are not
    /// required to sum to one.
    pub fn new(kinds: Vec<ItemKind>) -> Result<Self, CatalogError> {
        if kinds.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { kinds })
    }

    /// The catalog both the authority and clients ship with.
    pub fn standard() -> Self {
        Self {
            kinds: STANDARD_KINDS.to_vec(),
        }
    }

    pub fn kinds(&self) -> &[ItemKind] {
        &self.kinds
    }

    pub fn first(&self) -> &ItemKind {
        &self.kinds[0]
    }

    pub fn get(&self, index: usize) -> Option<&ItemKind> {
        self.kinds.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&ItemKind> {
        self.kinds.iter().find(|kind| kind.name == name)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn rarity_sum(&self) -> f64 {
        self.kinds.iter().map(|kind| kind.rarity).sum()
    }
}

impl Default for KindCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Returns the first kind whose cumulative rarity reaches `r`, walking the
/// catalog in declared order.
///
/// When `r` exceeds the total rarity (a catalog summing below one, or float
/// drift at the top of the range) the first kind is returned instead.
pub fn select_kind(catalog: &KindCatalog, r: f64) -> &ItemKind {
    let mut cumulative = 0.0;
    for kind in catalog.kinds() {
        cumulative += kind.rarity;
        if cumulative >= r {
            return kind;
        }
    }
    catalog.first()
}

/// Draws `r` uniformly from [0, 1) and selects a kind with it.
pub fn draw_kind<'a, R: Rng + ?Sized>(catalog: &'a KindCatalog, rng: &mut R) -> &'a ItemKind {
    let r: f64 = rng.gen();
    select_kind(catalog, r)
}
