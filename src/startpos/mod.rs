//! Выбор стартовых позиций
//!
//! 1. Каждому тайлу сопоставляется ценность для города (только стартовая местность).
//! 2. Локальный фильтр оставляет тайлы не хуже своей окрестности.
//! 3. Материки ранжируются по сумме отфильтрованных ценностей.
//! 4. Игроки распределяются по материкам согласно [`DistributionMode`].
//! 5. На каждом материке лучшие свободные тайлы выбираются с учётом дистанции.

pub mod distribution;
pub mod placement;
pub mod valuation;

use crate::config::{DistributionMode, StartPositionSettings};
use crate::continent::Landmass;
use crate::tile::TileGrid;
use placement::PlacementTier;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Стартовая позиция игрока
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StartingPosition {
    pub x: u32,
    pub y: u32,
    pub player_id: String,
}

/// Результат выбора стартов
#[derive(Debug, Clone)]
pub struct StartSelection {
    pub positions: Vec<StartingPosition>,
    /// Режим, применённый после деградации
    pub mode: DistributionMode,
    /// Сколько игроков поставлено с ослабленными ограничениями
    pub degraded: usize,
}

/// Выбирает ровно одну стартовую позицию на каждого игрока
pub fn select_starting_positions(
    grid: &TileGrid,
    landmasses: &[Landmass],
    players: &[String],
    mode: DistributionMode,
    settings: &StartPositionSettings,
) -> StartSelection {
    let filtered = valuation::filtered_values(grid, settings.city_radius_sq);

    let mut ranked = distribution::rank_landmasses(landmasses, grid, &filtered);
    let applied = distribution::distribute(&mut ranked, players.len(), mode);
    debug!(
        requested = ?mode,
        applied = ?applied,
        best_quality = ranked.first().map_or(0, |l| l.quality_score),
        "players distributed"
    );

    let placed = placement::place_players(grid, &ranked, &filtered, players, settings);
    let degraded = placed
        .iter()
        .filter(|(_, tier)| *tier != PlacementTier::Ideal)
        .count();

    StartSelection {
        positions: placed.into_iter().map(|(position, _)| position).collect(),
        mode: applied,
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continent::label_continents;
    use crate::tile::Terrain;

    /// Два острова-квадрата 6×6, разделённые проливом
    fn two_islands() -> TileGrid {
        let mut grid = TileGrid::new(16, 8);
        for tile in &mut grid.tiles {
            let on_left = (1..7).contains(&tile.x);
            let on_right = (9..15).contains(&tile.x);
            if (1..7).contains(&tile.y) && (on_left || on_right) {
                tile.terrain = if (tile.x + tile.y) % 3 == 0 {
                    Terrain::Plains
                } else {
                    Terrain::Grassland
                };
            }
        }
        grid
    }

    #[test]
    fn test_one_player_per_island() {
        let mut grid = two_islands();
        let landmasses = label_continents(&mut grid);
        let players = vec!["red".to_string(), "blue".to_string()];
        let selection = select_starting_positions(
            &grid,
            &landmasses,
            &players,
            DistributionMode::Single,
            &StartPositionSettings::default(),
        );

        assert_eq!(selection.mode, DistributionMode::Single);
        assert_eq!(selection.degraded, 0);
        assert_eq!(selection.positions.len(), 2);
        let continents: Vec<u32> = selection
            .positions
            .iter()
            .map(|p| grid.get(p.x, p.y).continent_id)
            .collect();
        assert_ne!(continents[0], continents[1]);
        for p in &selection.positions {
            assert!(grid.get(p.x, p.y).terrain.is_starter());
        }
    }

    #[test]
    fn test_positions_follow_player_order() {
        let mut grid = two_islands();
        let landmasses = label_continents(&mut grid);
        let players: Vec<String> = ["a", "b", "c"].iter().map(ToString::to_string).collect();
        let selection = select_starting_positions(
            &grid,
            &landmasses,
            &players,
            DistributionMode::Default,
            &StartPositionSettings::default(),
        );
        let ids: Vec<&str> = selection
            .positions
            .iter()
            .map(|p| p.player_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
