use crate::config::RiverSettings;
use crate::tile::{Direction, TileGrid};
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// Сколько истоков положено карте данного размера (не меньше одного на непустую карту)
#[must_use]
pub fn river_count(width: u32, height: u32, settings: &RiverSettings) -> u32 {
    let area = u64::from(width) * u64::from(height);
    let count = area.div_ceil(u64::from(settings.tiles_per_river.max(1)));
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Ищет исток: случайный тайл суши, принимаемый с вероятностью, пропорциональной высоте.
/// После `source_attempts` неудач исток пропускается.
fn pick_source<R: Rng + ?Sized>(
    grid: &TileGrid,
    settings: &RiverSettings,
    rng: &mut R,
) -> Option<(u32, u32)> {
    for _ in 0..settings.source_attempts {
        let x = rng.gen_range(0..grid.width);
        let y = rng.gen_range(0..grid.height);
        let tile = grid.get(x, y);
        if !tile.terrain.is_land() || tile.has_river() {
            continue;
        }
        if rng.gen_range(0..=u8::MAX) < tile.elevation {
            return Some((x, y));
        }
    }
    None
}

/// Прокладывает одну реку от истока вниз по склону.
///
/// Бит направления ставится только на тайле, из которого сделан шаг.
/// Возвращает длину реки в шагах.
pub fn trace_river<R: Rng + ?Sized>(
    grid: &mut TileGrid,
    source: (u32, u32),
    max_length: u32,
    downhill_bias: f64,
    rng: &mut R,
) -> u32 {
    let (mut x, mut y) = source;
    let mut visited = HashSet::from([source]);
    let mut steps = 0;

    while steps < max_length {
        // Соседи внутри карты по возрастанию высоты; при равенстве — порядок N, E, S, W
        let mut neighbors: Vec<(Direction, u32, u32)> = grid.neighbors4(x, y).collect();
        if neighbors.is_empty() {
            break;
        }
        neighbors.sort_by_key(|&(_, nx, ny)| grid.get(nx, ny).elevation);

        let (dir, nx, ny) = if rng.gen_bool(downhill_bias) {
            neighbors[0]
        } else {
            neighbors[rng.gen_range(0..neighbors.len())]
        };

        if !visited.insert((nx, ny)) {
            break;
        }

        grid.get_mut(x, y).river_mask |= dir.bit();
        steps += 1;

        if grid.get(nx, ny).terrain.is_water() {
            break;
        }
        x = nx;
        y = ny;
    }

    steps
}

/// Генерирует реки на сетке, изменяя `river_mask` тайлов суши
pub fn generate_rivers<R: Rng + ?Sized>(grid: &mut TileGrid, settings: &RiverSettings, rng: &mut R) {
    if grid.is_empty() {
        return;
    }

    let max_length = settings
        .max_length
        .unwrap_or_else(|| grid.width.max(grid.height));
    let wanted = river_count(grid.width, grid.height, settings);

    let mut placed = 0;
    let mut total_steps = 0;
    for _ in 0..wanted {
        let Some(source) = pick_source(grid, settings, rng) else {
            continue;
        };
        total_steps += trace_river(grid, source, max_length, settings.downhill_bias, rng);
        placed += 1;
    }

    debug!(wanted, placed, total_steps, "rivers generated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{RIVER_MASK_ALL, Terrain};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Полоса суши, плавно спускающаяся слева направо к воде в последнем столбце
    fn slope(width: u32) -> TileGrid {
        let mut grid = TileGrid::new(width, 3);
        for tile in &mut grid.tiles {
            tile.terrain = if tile.x == width - 1 {
                Terrain::ShallowWater
            } else {
                Terrain::Plains
            };
            tile.elevation = (200 - tile.x * 10) as u8;
            if tile.y != 1 {
                // Берега выше русла
                tile.elevation = tile.elevation.saturating_add(40);
            }
        }
        grid
    }

    #[test]
    fn test_river_count_rounds_up() {
        let settings = RiverSettings::default();
        assert_eq!(river_count(10, 10, &settings), 1);
        assert_eq!(river_count(40, 20, &settings), 1);
        assert_eq!(river_count(40, 21, &settings), 2);
        // Площадь больше u32::MAX
        assert_eq!(river_count(100_000, 100_000, &settings), 12_500_000);
    }

    #[test]
    fn test_strict_downhill_flows_to_sea() {
        let mut grid = slope(8);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let steps = trace_river(&mut grid, (0, 1), 50, 1.0, &mut rng);

        assert_eq!(steps, 7);
        for x in 0..7 {
            assert_eq!(grid.get(x, 1).river_mask, Direction::East.bit());
        }
        // Устье в воде не помечается
        assert_eq!(grid.get(7, 1).river_mask, 0);
    }

    #[test]
    fn test_max_length_bounds_the_path() {
        let mut grid = slope(8);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let steps = trace_river(&mut grid, (0, 1), 3, 1.0, &mut rng);
        assert_eq!(steps, 3);
        assert_eq!(grid.get(3, 1).river_mask, 0);
    }

    #[test]
    fn test_pit_stops_on_revisit() {
        // Яма в центре: из неё все соседи выше, река возвращается и останавливается
        let mut grid = TileGrid::new(3, 3);
        for tile in &mut grid.tiles {
            tile.terrain = Terrain::Grassland;
            tile.elevation = 100;
        }
        grid.get_mut(1, 1).elevation = 10;
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let steps = trace_river(&mut grid, (1, 0), 100, 1.0, &mut rng);
        assert!(steps <= 9);
        assert_eq!(grid.get(1, 0).river_mask, Direction::South.bit());
    }

    #[test]
    fn test_rivers_only_on_land() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut grid = crate::terrain::synthesize(
            60,
            40,
            &crate::config::TerrainSettings::default(),
            &mut rng,
        );
        let settings = RiverSettings {
            tiles_per_river: 50,
            ..RiverSettings::default()
        };
        generate_rivers(&mut grid, &settings, &mut rng);

        assert!(grid.tiles.iter().any(|t| t.has_river()));
        for tile in &grid.tiles {
            assert!(tile.river_mask <= RIVER_MASK_ALL);
            if tile.has_river() {
                assert!(tile.terrain.is_land(), "{tile:?}");
            }
        }
    }
}
