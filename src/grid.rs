//! Spatial model - the tile grid and its soil.

use serde::{Deserialize, Serialize};

use crate::soil::SoilField;
use crate::tile::Tile;

/// Tile position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

impl TilePos {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Fixed-size grid of tiles with hard edges (no wraparound).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    soil: SoilField,
}

impl Grid {
    /// An all-empty grid over `soil`; the grid takes the soil's dimensions.
    pub fn new(soil: SoilField) -> Self {
        let width = soil.width();
        let height = soil.height();
        Self {
            width,
            height,
            tiles: vec![Tile::Empty; width as usize * height as usize],
            soil,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn diagonal(&self) -> f64 {
        (self.width as f64).hypot(self.height as f64)
    }

    /// Bounds-checked position from signed coordinates.
    pub fn pos(&self, x: i64, y: i64) -> Option<TilePos> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            None
        } else {
            Some(TilePos::new(x as u32, y as u32))
        }
    }

    pub fn pos_to_index(&self, pos: TilePos) -> Option<usize> {
        if pos.x < self.width && pos.y < self.height {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    pub fn index_to_pos(&self, index: usize) -> Option<TilePos> {
        if index < self.tiles.len() {
            let width = self.width as usize;
            Some(TilePos::new((index % width) as u32, (index / width) as u32))
        } else {
            None
        }
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.pos_to_index(pos).map(|idx| &self.tiles[idx])
    }

    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.pos_to_index(pos).map(move |idx| &mut self.tiles[idx])
    }

    /// Overwrites a tile. Returns false when `pos` is out of bounds.
    pub fn set_tile(&mut self, pos: TilePos, tile: Tile) -> bool {
        match self.tile_mut(pos) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }

    /// Writes `tile` only if the target is currently empty.
    pub fn place_if_empty(&mut self, pos: TilePos, tile: Tile) -> bool {
        match self.tile_mut(pos) {
            Some(slot) if slot.is_empty() => {
                *slot = tile;
                true
            }
            _ => false,
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn iter(&self) -> impl Iterator<Item = (TilePos, &Tile)> + '_ {
        let width = self.width as usize;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(idx, tile)| (TilePos::new((idx % width) as u32, (idx / width) as u32), tile))
    }

    pub fn soil(&self) -> &SoilField {
        &self.soil
    }

    pub fn moisture(&self, pos: TilePos) -> Option<f64> {
        self.soil.moisture(pos.x, pos.y)
    }

    pub fn nutrients(&self, pos: TilePos) -> Option<f64> {
        self.soil.nutrients(pos.x, pos.y)
    }

    /// Replaces the soil and clears every tile.
    pub fn reset(&mut self, soil: SoilField) {
        *self = Grid::new(soil);
    }

    /// In-bounds positions of the 8-neighbourhood.
    pub fn neighbors(&self, pos: TilePos) -> impl Iterator<Item = TilePos> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.pos(pos.x as i64 + dx, pos.y as i64 + dy))
    }

    pub fn live_tree_neighbors(&self, pos: TilePos) -> usize {
        self.neighbors(pos)
            .filter(|&n| self.tile(n).is_some_and(Tile::is_tree))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::SeedOrigin;

    fn grid(width: u32, height: u32) -> Grid {
        Grid::new(SoilField::uniform(width, height, 0.5, 0.5))
    }

    #[test]
    fn test_tile_grid() {
        let grid = grid(10, 5);

        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.tile_count(), 50);
    }

    #[test]
    fn test_pos_index_conversion() {
        let grid = grid(10, 5);

        let pos = TilePos::new(3, 2);
        let idx = grid.pos_to_index(pos).unwrap();
        assert_eq!(idx, 23); // 2 * 10 + 3

        assert_eq!(grid.index_to_pos(idx), Some(pos));
        assert_eq!(grid.index_to_pos(50), None);
    }

    #[test]
    fn test_bounds_are_hard() {
        let grid = grid(10, 5);
        assert!(grid.pos(-1, 0).is_none());
        assert!(grid.pos(10, 0).is_none());
        assert!(grid.pos(0, 5).is_none());
        assert!(grid.tile(TilePos::new(10, 0)).is_none());
        assert!(grid.moisture(TilePos::new(0, 5)).is_none());
    }

    #[test]
    fn test_neighbors() {
        let grid = grid(10, 5);

        // Corner tile
        assert_eq!(grid.neighbors(TilePos::new(0, 0)).count(), 3);
        // Edge tile
        assert_eq!(grid.neighbors(TilePos::new(5, 0)).count(), 5);
        // Middle tile
        assert_eq!(grid.neighbors(TilePos::new(5, 2)).count(), 8);
    }

    #[test]
    fn test_place_if_empty_respects_occupancy() {
        let mut grid = grid(4, 4);
        let pos = TilePos::new(1, 1);
        assert!(grid.place_if_empty(pos, Tile::seed(SeedOrigin::Wind)));
        assert!(!grid.place_if_empty(pos, Tile::seed(SeedOrigin::Animal)));
        assert_eq!(grid.tile(pos), Some(&Tile::seed(SeedOrigin::Wind)));
        assert!(!grid.place_if_empty(TilePos::new(9, 9), Tile::seed(SeedOrigin::Wind)));
    }

    #[test]
    fn test_live_tree_neighbors_counts_trees_only() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        let mut grid = grid(3, 3);
        let interval = crate::config::Range::new(2.0, 7.0);
        grid.set_tile(TilePos::new(0, 0), Tile::sapling(SeedOrigin::Wind, interval, &mut rng));
        grid.set_tile(TilePos::new(2, 2), Tile::sapling(SeedOrigin::Wind, interval, &mut rng));
        grid.set_tile(TilePos::new(1, 0), Tile::seed(SeedOrigin::Wind));
        assert_eq!(grid.live_tree_neighbors(TilePos::new(1, 1)), 2);
    }
}
