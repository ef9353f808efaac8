//! # Tile Catalog
//!
//! Static description of the tile kinds a layout is assembled from.
//!
//! Each kind carries its selection weight, footprint, clustering preferences and
//! declared adjacency rules. The catalog folds those rules into a fixed
//! compatibility table when it is built, so the solver never consults the
//! declared maps while propagating.

use crate::{CityGenError, CityGenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a tile kind. Equal to the kind's index in its catalog.
pub type KindId = usize;

/// Kind identifiers of the built-in organic city catalog.
pub mod kinds {
    use super::KindId;

    /// Unused ground, also produced by the detail scatter pass
    pub const EMPTY: KindId = 0;
    /// Lakes and rivers
    pub const WATER: KindId = 1;
    /// Open ground and the fallback kind
    pub const GRASS: KindId = 2;
    /// Single-cell house
    pub const SMALL_HOUSE: KindId = 3;
    /// 2x2 building
    pub const LARGE_BUILDING: KindId = 4;
}

/// Broad role of a tile kind.
///
/// Categories drive the density scaling of weights, the hard water/building
/// exclusion, and which kinds each post-processing pass rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileCategory {
    /// Open ground
    Open,
    /// Water bodies, never adjacent to built kinds
    Water,
    /// Structures, weighted by the density knob
    Built,
    /// Unused or decorative ground
    Vacant,
}

impl TileCategory {
    /// Whether kinds of this category count as built-up area.
    pub fn is_built(self) -> bool {
        self == TileCategory::Built
    }

    /// Whether two categories may never touch, whatever the declared rules say.
    pub fn excludes(self, other: TileCategory) -> bool {
        matches!(
            (self, other),
            (TileCategory::Water, TileCategory::Built) | (TileCategory::Built, TileCategory::Water)
        )
    }
}

/// Declared neighbour rules of a single tile kind.
///
/// Maps a neighbour kind to the list of kinds accepted beside it. A kind allows
/// neighbour `k` when `k` appears in its own entry for `k`.
///
/// # Examples
///
/// ```
/// use citygen::AdjacencyRules;
///
/// let rules = AdjacencyRules::new().with(1, &[0, 1]).with(2, &[0]);
/// assert!(rules.allows(1));
/// assert!(!rules.allows(2));
/// assert!(!rules.allows(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjacencyRules(BTreeMap<KindId, Vec<KindId>>);

impl AdjacencyRules {
    /// Creates an empty rule set. A kind without rules is compatible with everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the entry for `neighbor`.
    pub fn with(mut self, neighbor: KindId, allowed: &[KindId]) -> Self {
        self.0.insert(neighbor, allowed.to_vec());
        self
    }

    /// Whether no rules were declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this kind accepts `other` as a neighbour.
    pub fn allows(&self, other: KindId) -> bool {
        self.0
            .get(&other)
            .map_or(false, |allowed| allowed.contains(&other))
    }

    /// Iterates over the declared entries.
    pub fn entries(&self) -> impl Iterator<Item = (KindId, &[KindId])> {
        self.0.iter().map(|(&key, allowed)| (key, allowed.as_slice()))
    }
}

/// A single tile kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileKind {
    /// Identifier, equal to the kind's index in the catalog
    pub id: KindId,
    /// Human-readable name
    pub name: String,
    /// Character used by text output
    pub glyph: char,
    /// RGB colour for callers that draw the grid
    pub color: [u8; 3],
    /// Broad role of the kind
    pub category: TileCategory,
    /// Side length of the square block the kind occupies
    pub footprint: usize,
    /// Base selection weight; zero means never chosen
    pub weight: f64,
    /// Declared neighbour rules
    #[serde(default)]
    pub rules: AdjacencyRules,
    /// Radius within which same-kind cells boost this kind's weight
    #[serde(default)]
    pub cluster_size: Option<usize>,
    /// Radius within which any same-kind cell suppresses this kind's weight
    #[serde(default)]
    pub min_distance: Option<usize>,
}

impl TileKind {
    /// Creates a 1x1 kind without rules or clustering preferences.
    pub fn new(id: KindId, name: &str, category: TileCategory, weight: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            glyph: '?',
            color: [128, 128, 128],
            category,
            footprint: 1,
            weight,
            rules: AdjacencyRules::new(),
            cluster_size: None,
            min_distance: None,
        }
    }

    pub fn with_glyph(mut self, glyph: char) -> Self {
        self.glyph = glyph;
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_footprint(mut self, footprint: usize) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn with_rules(mut self, rules: AdjacencyRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_cluster_size(mut self, radius: usize) -> Self {
        self.cluster_size = Some(radius);
        self
    }

    pub fn with_min_distance(mut self, radius: usize) -> Self {
        self.min_distance = Some(radius);
        self
    }

    /// Whether the solver may ever pick this kind.
    pub fn is_selectable(&self) -> bool {
        self.weight > 0.0
    }
}

/// Plain, serialisable form of a [`TileCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub kinds: Vec<TileKind>,
    pub default_kind: KindId,
}

/// The immutable set of tile kinds used by one generation.
///
/// # Examples
///
/// ```
/// use citygen::{kinds, TileCatalog};
///
/// let catalog = TileCatalog::organic_city();
/// assert_eq!(catalog.len(), 5);
/// assert_eq!(catalog.default_kind(), kinds::GRASS);
/// assert!(!catalog.compatible(kinds::WATER, kinds::SMALL_HOUSE));
/// assert!(catalog.compatible(kinds::WATER, kinds::GRASS));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDefinition", into = "CatalogDefinition")]
pub struct TileCatalog {
    kinds: Vec<TileKind>,
    default_kind: KindId,
    /// Row-major `len() x len()` answers of `compatible`
    compatibility: Vec<bool>,
}

impl TileCatalog {
    /// Builds a catalog after validating its kinds.
    ///
    /// Fails with [`CityGenError::InvalidConfig`] when the catalog is empty,
    /// ids do not match positions, a weight is negative or not finite, no
    /// weight is positive, a footprint is zero, a rule names an unknown kind,
    /// or the default kind is missing, larger than 1x1 or unselectable.
    pub fn new(kinds: Vec<TileKind>, default_kind: KindId) -> CityGenResult<Self> {
        validate_kinds(&kinds, default_kind)?;
        Ok(Self::build(kinds, default_kind))
    }

    fn build(kinds: Vec<TileKind>, default_kind: KindId) -> Self {
        let n = kinds.len();
        let mut compatibility = vec![false; n * n];
        for a in 0..n {
            for b in 0..n {
                compatibility[a * n + b] = declared_compatible(&kinds, a, b);
            }
        }
        Self {
            kinds,
            default_kind,
            compatibility,
        }
    }

    /// The built-in catalog for organic city layouts.
    ///
    /// Every intended pairing lists the neighbour under its own key, since
    /// `allows(k)` only consults the entry for `k`. Rule lists keyed
    /// differently would leave almost no pair compatible.
    pub fn organic_city() -> Self {
        use kinds::*;

        let tiles = vec![
            TileKind::new(EMPTY, "Empty", TileCategory::Vacant, 0.15)
                .with_glyph(':')
                .with_color([140, 140, 140])
                .with_rules(
                    AdjacencyRules::new()
                        .with(GRASS, &[EMPTY, GRASS])
                        .with(SMALL_HOUSE, &[EMPTY, SMALL_HOUSE])
                        .with(LARGE_BUILDING, &[EMPTY, LARGE_BUILDING])
                        .with(WATER, &[EMPTY, WATER])
                        .with(EMPTY, &[EMPTY]),
                ),
            TileKind::new(WATER, "Water", TileCategory::Water, 0.4)
                .with_glyph('~')
                .with_color([50, 120, 200])
                .with_cluster_size(5)
                .with_rules(
                    AdjacencyRules::new()
                        .with(GRASS, &[WATER, GRASS])
                        .with(WATER, &[WATER, GRASS])
                        .with(EMPTY, &[WATER, EMPTY]),
                ),
            TileKind::new(GRASS, "Grass", TileCategory::Open, 1.2)
                .with_glyph('.')
                .with_color([100, 180, 60])
                .with_rules(
                    AdjacencyRules::new()
                        .with(WATER, &[GRASS, WATER])
                        .with(SMALL_HOUSE, &[GRASS, SMALL_HOUSE])
                        .with(LARGE_BUILDING, &[GRASS, LARGE_BUILDING])
                        .with(GRASS, &[WATER, SMALL_HOUSE, LARGE_BUILDING, EMPTY, GRASS])
                        .with(EMPTY, &[GRASS, EMPTY]),
                ),
            TileKind::new(SMALL_HOUSE, "Small House", TileCategory::Built, 0.7)
                .with_glyph('h')
                .with_color([200, 160, 120])
                .with_cluster_size(4)
                .with_min_distance(2)
                .with_rules(
                    AdjacencyRules::new()
                        .with(GRASS, &[SMALL_HOUSE, GRASS])
                        .with(EMPTY, &[SMALL_HOUSE, EMPTY])
                        .with(SMALL_HOUSE, &[GRASS, EMPTY, SMALL_HOUSE])
                        .with(LARGE_BUILDING, &[GRASS, EMPTY]),
                ),
            TileKind::new(LARGE_BUILDING, "Large Building", TileCategory::Built, 0.3)
                .with_glyph('B')
                .with_color([180, 140, 100])
                .with_footprint(2)
                .with_cluster_size(3)
                .with_min_distance(4)
                .with_rules(
                    AdjacencyRules::new()
                        .with(GRASS, &[LARGE_BUILDING, GRASS])
                        .with(EMPTY, &[LARGE_BUILDING, EMPTY])
                        .with(SMALL_HOUSE, &[GRASS, EMPTY]),
                ),
        ];

        Self::build(tiles, GRASS)
    }

    /// Number of kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always false for a validated catalog.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> &[TileKind] {
        &self.kinds
    }

    pub fn kind(&self, id: KindId) -> Option<&TileKind> {
        self.kinds.get(id)
    }

    pub fn contains(&self, id: KindId) -> bool {
        id < self.kinds.len()
    }

    /// The kind used by every fallback path.
    pub fn default_kind(&self) -> KindId {
        self.default_kind
    }

    /// Whether kinds `a` and `b` may sit on 4-adjacent cells.
    ///
    /// Water and built kinds never touch. Otherwise a kind without rules is
    /// compatible with everything, and two ruled kinds are compatible when
    /// either one allows the other.
    pub fn compatible(&self, a: KindId, b: KindId) -> bool {
        let n = self.kinds.len();
        a < n && b < n && self.compatibility[a * n + b]
    }

    /// Ids of all kinds in `category`, in catalog order.
    pub fn kinds_in(&self, category: TileCategory) -> impl Iterator<Item = KindId> + '_ {
        self.kinds
            .iter()
            .filter(move |kind| kind.category == category)
            .map(|kind| kind.id)
    }

    /// The first kind of `category`, if any.
    pub fn first_of(&self, category: TileCategory) -> Option<KindId> {
        self.kinds_in(category).next()
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::organic_city()
    }
}

impl TryFrom<CatalogDefinition> for TileCatalog {
    type Error = CityGenError;

    fn try_from(definition: CatalogDefinition) -> CityGenResult<Self> {
        Self::new(definition.kinds, definition.default_kind)
    }
}

impl From<TileCatalog> for CatalogDefinition {
    fn from(catalog: TileCatalog) -> Self {
        Self {
            kinds: catalog.kinds,
            default_kind: catalog.default_kind,
        }
    }
}

fn declared_compatible(kinds: &[TileKind], a: KindId, b: KindId) -> bool {
    let (first, second) = (&kinds[a], &kinds[b]);
    if first.category.excludes(second.category) {
        return false;
    }
    if first.rules.is_empty() || second.rules.is_empty() {
        return true;
    }
    first.rules.allows(b) || second.rules.allows(a)
}

fn validate_kinds(kinds: &[TileKind], default_kind: KindId) -> CityGenResult<()> {
    let invalid = |msg: String| Err(CityGenError::InvalidConfig(msg));

    if kinds.is_empty() {
        return invalid("tile catalog is empty".to_string());
    }

    for (index, kind) in kinds.iter().enumerate() {
        if kind.id != index {
            return invalid(format!(
                "tile kind '{}' has id {} but sits at position {}",
                kind.name, kind.id, index
            ));
        }
        if !kind.weight.is_finite() || kind.weight < 0.0 {
            return invalid(format!(
                "tile kind '{}' has invalid weight {}",
                kind.name, kind.weight
            ));
        }
        if kind.footprint == 0 {
            return invalid(format!("tile kind '{}' has a zero footprint", kind.name));
        }
        for (neighbor, allowed) in kind.rules.entries() {
            if let Some(unknown) = std::iter::once(&neighbor)
                .chain(allowed)
                .find(|&&id| id >= kinds.len())
            {
                return invalid(format!(
                    "tile kind '{}' references unknown kind {}",
                    kind.name, unknown
                ));
            }
        }
    }

    if !kinds.iter().any(TileKind::is_selectable) {
        return invalid("no tile kind has a positive weight".to_string());
    }

    match kinds.get(default_kind) {
        None => invalid(format!("default kind {} is not in the catalog", default_kind)),
        Some(kind) if kind.footprint != 1 => invalid(format!(
            "default kind '{}' must occupy a single cell",
            kind.name
        )),
        Some(kind) if !kind.is_selectable() => invalid(format!(
            "default kind '{}' must have a positive weight",
            kind.name
        )),
        Some(_) => Ok(()),
    }
}
