use crate::config::ResourceSettings;
use crate::tile::TileGrid;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Раскладывает бонусные ресурсы.
///
/// Каждый тайл суши, для местности которого есть совместимые ресурсы, с вероятностью
/// `resource_chance` получает один из них, выбранный равновероятно. Вода не трогается.
pub fn place_resources<R: Rng + ?Sized>(
    grid: &mut TileGrid,
    settings: &ResourceSettings,
    rng: &mut R,
) {
    let mut placed = 0usize;

    for tile in &mut grid.tiles {
        if !tile.terrain.is_land() {
            continue;
        }
        let candidates = tile.terrain.compatible_resources();
        if candidates.is_empty() {
            continue;
        }
        if !rng.gen_bool(settings.resource_chance) {
            continue;
        }
        tile.resource = candidates.choose(rng).copied();
        placed += 1;
    }

    debug!(placed, "resources placed");
}
