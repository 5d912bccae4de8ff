//! Тайлы игрового поля
//!
//! Закрытые перечисления местности и ресурсов, статическая таблица совместимости
//! «местность → ресурсы» и сетка тайлов, которую этапы генерации заполняют по очереди.

use serde::{Deserialize, Serialize};

/// Тип местности тайла
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Terrain {
    DeepWater,
    ShallowWater,
    Coastal,
    Grassland,
    Plains,
    Forest,
    Jungle,
    Swamp,
    Hills,
    Mountains,
    Desert,
    Tundra,
    Snow,
    Glacier,
}

/// Выход тайла: (еда, производство, торговля)
pub type Output = (u32, u32, u32);

impl Terrain {
    pub const ALL: [Terrain; 14] = [
        Terrain::DeepWater,
        Terrain::ShallowWater,
        Terrain::Coastal,
        Terrain::Grassland,
        Terrain::Plains,
        Terrain::Forest,
        Terrain::Jungle,
        Terrain::Swamp,
        Terrain::Hills,
        Terrain::Mountains,
        Terrain::Desert,
        Terrain::Tundra,
        Terrain::Snow,
        Terrain::Glacier,
    ];

    #[must_use]
    pub fn is_water(self) -> bool {
        matches!(
            self,
            Terrain::DeepWater | Terrain::ShallowWater | Terrain::Coastal
        )
    }

    #[must_use]
    pub fn is_land(self) -> bool {
        !self.is_water()
    }

    /// Местность, на которой допускается стартовая позиция игрока
    #[must_use]
    pub fn is_starter(self) -> bool {
        matches!(
            self,
            Terrain::Grassland | Terrain::Plains | Terrain::Forest | Terrain::Hills
        )
    }

    /// Базовый выход тайла без ресурсов и рек
    #[must_use]
    pub fn output(self) -> Output {
        match self {
            Terrain::DeepWater | Terrain::ShallowWater | Terrain::Coastal => (1, 0, 2),
            Terrain::Grassland => (2, 0, 0),
            Terrain::Plains => (1, 1, 0),
            Terrain::Forest => (1, 2, 0),
            Terrain::Hills | Terrain::Jungle | Terrain::Swamp | Terrain::Tundra => (1, 0, 0),
            Terrain::Mountains | Terrain::Desert => (0, 1, 0),
            Terrain::Snow | Terrain::Glacier => (0, 0, 0),
        }
    }

    /// Ресурсы, которые могут появиться на данной местности.
    ///
    /// Вода и снег ресурсов не имеют — возвращается пустой срез.
    #[must_use]
    pub fn compatible_resources(self) -> &'static [Resource] {
        match self {
            Terrain::DeepWater | Terrain::ShallowWater | Terrain::Coastal | Terrain::Snow => &[],
            Terrain::Grassland => &[Resource::Horses, Resource::Wheat],
            Terrain::Plains => &[Resource::Buffalo, Resource::Wheat],
            Terrain::Forest => &[Resource::Pheasant, Resource::Silk],
            Terrain::Jungle => &[Resource::Gems, Resource::Fruit],
            Terrain::Swamp => &[Resource::Peat, Resource::Spices],
            Terrain::Hills => &[Resource::Coal, Resource::Wine],
            Terrain::Mountains => &[Resource::Gold, Resource::Iron],
            Terrain::Desert => &[Resource::Oasis, Resource::Oil],
            Terrain::Tundra => &[Resource::Game, Resource::Furs],
            Terrain::Glacier => &[Resource::Ivory, Resource::Oil],
        }
    }
}

/// Бонусный ресурс тайла (только сухопутные)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Horses,
    Wheat,
    Buffalo,
    Pheasant,
    Silk,
    Gems,
    Fruit,
    Peat,
    Spices,
    Coal,
    Wine,
    Gold,
    Iron,
    Oasis,
    Oil,
    Game,
    Furs,
    Ivory,
}

impl Resource {
    /// Прибавка к выходу тайла: (еда, производство, торговля)
    #[must_use]
    pub fn bonus(self) -> Output {
        match self {
            Resource::Wheat | Resource::Oasis | Resource::Fruit | Resource::Pheasant => (2, 0, 0),
            Resource::Horses | Resource::Buffalo | Resource::Game => (0, 2, 0),
            Resource::Silk | Resource::Spices | Resource::Furs => (0, 0, 3),
            Resource::Gems | Resource::Gold | Resource::Wine => (0, 0, 4),
            Resource::Peat | Resource::Coal | Resource::Iron | Resource::Oil => (0, 2, 0),
            Resource::Ivory => (1, 1, 2),
        }
    }
}

/// Сторона тайла. Значение — бит в `river_mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North = 1,
    East = 2,
    South = 4,
    West = 8,
}

impl Direction {
    /// Порядок обхода соседей (он же порядок разрешения ничьих)
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[must_use]
    pub fn bit(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

/// Все четыре бита рек
pub const RIVER_MASK_ALL: u8 = 0b1111;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub terrain: Terrain,
    pub elevation: u8,
    /// По биту на каждую сторону, через которую течёт река (см. [`Direction`])
    pub river_mask: u8,
    /// 0 — вода или не назначено, >0 — идентификатор материка
    pub continent_id: u32,
    pub resource: Option<Resource>,
}

impl Tile {
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            terrain: Terrain::DeepWater,
            elevation: 0,
            river_mask: 0,
            continent_id: 0,
            resource: None,
        }
    }

    #[must_use]
    pub fn has_river(&self) -> bool {
        self.river_mask != 0
    }
}

/// Прямоугольная сетка тайлов, хранение построчное
#[derive(Debug, Clone)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Tile>,
}

impl TileGrid {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let tiles = (0..height)
            .flat_map(|y| (0..width).map(move |x| Tile::new(x, y)))
            .collect();
        Self {
            width,
            height,
            tiles,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> &Tile {
        &self.tiles[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut Tile {
        let idx = self.index(x, y);
        &mut self.tiles[idx]
    }

    /// Соседи по четырём сторонам, лежащие внутри сетки, в порядке [`Direction::ALL`]
    pub fn neighbors4(&self, x: u32, y: u32) -> impl Iterator<Item = (Direction, u32, u32)> + '_ {
        Direction::ALL.into_iter().filter_map(move |dir| {
            let (dx, dy) = dir.offset();
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            self.in_bounds(nx, ny)
                .then_some((dir, nx as u32, ny as u32))
        })
    }

    #[must_use]
    pub fn land_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.terrain.is_land()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_terrain_has_no_resources() {
        for terrain in Terrain::ALL {
            if terrain.is_water() {
                assert!(terrain.compatible_resources().is_empty(), "{terrain:?}");
            }
        }
    }

    #[test]
    fn test_starter_terrain_is_land() {
        for terrain in Terrain::ALL.into_iter().filter(|t| t.is_starter()) {
            assert!(terrain.is_land());
        }
    }

    #[test]
    fn test_neighbors_respect_bounds() {
        let grid = TileGrid::new(3, 2);
        let corner: Vec<_> = grid.neighbors4(0, 0).collect();
        assert_eq!(
            corner,
            vec![(Direction::East, 1, 0), (Direction::South, 0, 1)]
        );
        assert_eq!(grid.neighbors4(1, 0).count(), 3);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_index_does_not_wrap_on_large_grids() {
        // Только арифметика индекса, тайлы не выделяются
        let grid = TileGrid {
            width: 100_000,
            height: 100_000,
            tiles: Vec::new(),
        };
        assert_eq!(grid.index(99_999, 99_999), 9_999_999_999);
    }

    #[test]
    fn test_direction_bits_fit_mask() {
        let all = Direction::ALL.iter().fold(0u8, |acc, d| acc | d.bit());
        assert_eq!(all, RIVER_MASK_ALL);
    }
}
