use crate::config::StartPositionSettings;
use crate::continent::Landmass;
use crate::startpos::StartingPosition;
use crate::tile::TileGrid;
use std::collections::HashSet;
use tracing::warn;

/// Каким путём найдена позиция игрока
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementTier {
    /// Все ограничения соблюдены
    Ideal,
    /// Ограничение дистанции снято. Если подходящих тайлов нет нигде,
    /// берётся лучший свободный тайл суши
    Relaxed,
    /// Суши не осталось: фиксированная координата со сдвигом на номер игрока
    Emergency,
}

/// Поставленный старт (внутреннее представление)
#[derive(Debug, Clone, Copy)]
struct Placed {
    x: u32,
    y: u32,
    continent_id: u32,
}

/// Расстояние «по королю» между тайлами
fn map_distance(ax: u32, ay: u32, bx: u32, by: u32) -> u32 {
    ax.abs_diff(bx).max(ay.abs_diff(by))
}

/// Минимальная дистанция между стартами одного материка: чем больше игроков
/// делят материк, тем она меньше (∝ 1/√игроков)
#[must_use]
pub fn required_distance(landmass: &Landmass, settings: &StartPositionSettings) -> u32 {
    let assigned = landmass.assigned_starters.max(1) as f32;
    let scaled = settings.separation_factor * (landmass.size as f32 / assigned).sqrt();
    (scaled.round() as u32).max(settings.min_separation)
}

struct Placer<'a> {
    grid: &'a TileGrid,
    filtered: &'a [u64],
    settings: &'a StartPositionSettings,
    threshold: u64,
    /// Индексы всех тайлов суши по убыванию ценности
    land_by_value: Vec<usize>,
    claimed: HashSet<usize>,
    placed: Vec<Placed>,
}

impl<'a> Placer<'a> {
    fn new(grid: &'a TileGrid, filtered: &'a [u64], settings: &'a StartPositionSettings) -> Self {
        let best = filtered.iter().copied().max().unwrap_or(0);
        let threshold = ((best as f64 * f64::from(settings.min_value_fraction)) as u64).max(1);

        let mut land_by_value: Vec<usize> = grid
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.terrain.is_land())
            .map(|(i, _)| i)
            .collect();
        land_by_value.sort_by_key(|&i| (std::cmp::Reverse(filtered[i]), i));

        Self {
            grid,
            filtered,
            settings,
            threshold,
            land_by_value,
            claimed: HashSet::new(),
            placed: Vec::new(),
        }
    }

    fn is_separated(&self, idx: usize, required: u32) -> bool {
        let tile = &self.grid.tiles[idx];
        self.placed.iter().all(|p| {
            let d = map_distance(tile.x, tile.y, p.x, p.y);
            if p.continent_id == tile.continent_id {
                d >= required
            } else {
                d >= self.settings.min_separation
            }
        })
    }

    /// Свободный стартовый тайл не ниже порога ценности
    fn is_candidate(&self, idx: usize) -> bool {
        self.grid.tiles[idx].terrain.is_starter()
            && self.filtered[idx] >= self.threshold
            && !self.claimed.contains(&idx)
    }

    /// Лучший по ценности тайл суши, удовлетворяющий условию
    fn best(&self, accept: impl Fn(usize) -> bool) -> Option<usize> {
        self.land_by_value.iter().copied().find(|&idx| accept(idx))
    }

    fn ideal(&self, landmass: &Landmass) -> Option<usize> {
        let required = required_distance(landmass, self.settings);
        self.best(|idx| {
            self.grid.tiles[idx].continent_id == landmass.id
                && self.is_candidate(idx)
                && self.is_separated(idx, required)
        })
    }

    /// Без ограничения дистанции: сначала свой материк, затем любой. Только если
    /// кандидатов не осталось, берётся лучший свободный тайл суши.
    fn relaxed(&self, landmass: Option<&Landmass>) -> Option<usize> {
        let on = |idx: usize, l: &Landmass| self.grid.tiles[idx].continent_id == l.id;
        let unclaimed = |idx: usize| !self.claimed.contains(&idx);

        landmass
            .and_then(|l| self.best(|idx| on(idx, l) && self.is_candidate(idx)))
            .or_else(|| self.best(|idx| self.is_candidate(idx)))
            .or_else(|| landmass.and_then(|l| self.best(|idx| on(idx, l) && unclaimed(idx))))
            .or_else(|| self.best(unclaimed))
    }

    fn emergency(&self, player_index: usize) -> (u32, u32) {
        let (ox, oy) = self.settings.emergency_origin;
        let width = self.grid.width.max(1);
        let height = self.grid.height.max(1);
        let offset = u32::try_from(player_index % width as usize).unwrap_or(0);
        ((ox + offset) % width, oy % height)
    }

    fn place(&mut self, landmass: Option<&Landmass>, player_index: usize) -> ((u32, u32), PlacementTier) {
        let found = landmass
            .and_then(|l| self.ideal(l).map(|idx| (idx, PlacementTier::Ideal)))
            .or_else(|| {
                self.relaxed(landmass)
                    .map(|idx| (idx, PlacementTier::Relaxed))
            });

        match found {
            Some((idx, tier)) => {
                let grid = self.grid;
                let tile = &grid.tiles[idx];
                self.claimed.insert(idx);
                self.placed.push(Placed {
                    x: tile.x,
                    y: tile.y,
                    continent_id: tile.continent_id,
                });
                ((tile.x, tile.y), tier)
            }
            None => (self.emergency(player_index), PlacementTier::Emergency),
        }
    }
}

/// Ставит по одному старту на каждого игрока.
///
/// Игроки в порядке списка направляются на материки в порядке ранга согласно их
/// `assigned_starters`. Невозможность соблюсти ограничения не является ошибкой:
/// позиция ищется ослабленно, а в крайнем случае берётся аварийная координата.
pub fn place_players(
    grid: &TileGrid,
    ranked: &[Landmass],
    filtered: &[u64],
    players: &[String],
    settings: &StartPositionSettings,
) -> Vec<(StartingPosition, PlacementTier)> {
    let targets = ranked
        .iter()
        .flat_map(|l| std::iter::repeat_n(l, l.assigned_starters))
        .map(Some)
        .chain(std::iter::repeat(None));

    let mut placer = Placer::new(grid, filtered, settings);
    players
        .iter()
        .zip(targets)
        .enumerate()
        .map(|(index, (player_id, landmass))| {
            let ((x, y), tier) = placer.place(landmass, index);
            if tier != PlacementTier::Ideal {
                warn!(
                    player = %player_id,
                    x,
                    y,
                    ?tier,
                    landmass = ?landmass.map(|l| l.id),
                    "starting position placed with relaxed constraints"
                );
            }
            (
                StartingPosition {
                    x,
                    y,
                    player_id: player_id.clone(),
                },
                tier,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Terrain;

    fn island(width: u32, height: u32) -> (TileGrid, Landmass) {
        let mut grid = TileGrid::new(width, height);
        for tile in &mut grid.tiles {
            tile.terrain = Terrain::Grassland;
            tile.continent_id = 1;
        }
        let landmass = Landmass {
            id: 1,
            size: (width * height) as usize,
            quality_score: 1,
            assigned_starters: 0,
        };
        (grid, landmass)
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{i}")).collect()
    }

    #[test]
    fn test_required_distance_shrinks_with_players() {
        let settings = StartPositionSettings::default();
        let mut landmass = Landmass {
            id: 1,
            size: 400,
            quality_score: 0,
            assigned_starters: 1,
        };
        let one = required_distance(&landmass, &settings);
        landmass.assigned_starters = 4;
        let four = required_distance(&landmass, &settings);
        assert_eq!(one, 14);
        assert_eq!(four, 7);
        landmass.assigned_starters = 400;
        assert_eq!(required_distance(&landmass, &settings), settings.min_separation);
    }

    #[test]
    fn test_ideal_positions_respect_separation() {
        let (grid, mut landmass) = island(20, 20);
        landmass.assigned_starters = 3;
        let filtered = vec![200; grid.len()];
        let settings = StartPositionSettings::default();
        let placed = place_players(&grid, &[landmass.clone()], &filtered, &names(3), &settings);

        assert_eq!(placed.len(), 3);
        let required = required_distance(&landmass, &settings);
        for (i, (a, tier)) in placed.iter().enumerate() {
            assert_eq!(*tier, PlacementTier::Ideal);
            for (b, _) in &placed[i + 1..] {
                assert!(map_distance(a.x, a.y, b.x, b.y) >= required);
            }
        }
    }

    #[test]
    fn test_crowded_island_relaxes_separation() {
        let (grid, mut landmass) = island(2, 2);
        landmass.assigned_starters = 4;
        let filtered = vec![200; grid.len()];
        let settings = StartPositionSettings::default();
        let placed = place_players(&grid, &[landmass], &filtered, &names(4), &settings);

        let tiers: Vec<_> = placed.iter().map(|(_, t)| *t).collect();
        assert_eq!(tiers[0], PlacementTier::Ideal);
        assert!(tiers[1..].iter().all(|&t| t == PlacementTier::Relaxed));
        let distinct: HashSet<_> = placed.iter().map(|(p, _)| (p.x, p.y)).collect();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn test_exhausted_land_uses_emergency_coordinates() {
        let (grid, mut landmass) = island(2, 1);
        landmass.assigned_starters = 3;
        let filtered = vec![200; grid.len()];
        let settings = StartPositionSettings::default();
        let placed = place_players(&grid, &[landmass], &filtered, &names(4), &settings);

        assert_eq!(placed.len(), 4);
        assert_eq!(placed[2].1, PlacementTier::Emergency);
        assert_eq!(placed[3].1, PlacementTier::Emergency);
        for (p, _) in &placed {
            assert!(p.x < 2 && p.y < 1);
        }
    }

    #[test]
    fn test_relaxed_prefers_starter_tile_on_other_landmass() {
        // Остров 1: луг и горы, остров 2: один луг
        let mut grid = TileGrid::new(4, 1);
        let layout = [
            (Terrain::Grassland, 1),
            (Terrain::Mountains, 1),
            (Terrain::DeepWater, 0),
            (Terrain::Grassland, 2),
        ];
        for (tile, (terrain, id)) in grid.tiles.iter_mut().zip(layout) {
            tile.terrain = terrain;
            tile.continent_id = id;
        }
        let first = Landmass {
            id: 1,
            size: 2,
            quality_score: 2,
            assigned_starters: 2,
        };
        let second = Landmass {
            id: 2,
            size: 1,
            quality_score: 2,
            assigned_starters: 0,
        };
        let filtered = vec![200, 0, 0, 200];
        let settings = StartPositionSettings::default();
        let placed = place_players(&grid, &[first, second], &filtered, &names(2), &settings);

        assert_eq!((placed[0].0.x, placed[0].1), (0, PlacementTier::Ideal));
        assert_eq!((placed[1].0.x, placed[1].1), (3, PlacementTier::Relaxed));
    }

    #[test]
    fn test_relaxed_takes_any_land_when_no_candidates_left() {
        let mut grid = TileGrid::new(2, 1);
        grid.tiles[0].terrain = Terrain::Grassland;
        grid.tiles[1].terrain = Terrain::Mountains;
        for tile in &mut grid.tiles {
            tile.continent_id = 1;
        }
        let landmass = Landmass {
            id: 1,
            size: 2,
            quality_score: 2,
            assigned_starters: 2,
        };
        let filtered = vec![200, 0];
        let settings = StartPositionSettings::default();
        let placed = place_players(&grid, &[landmass], &filtered, &names(2), &settings);

        assert_eq!((placed[1].0.x, placed[1].1), (1, PlacementTier::Relaxed));
    }

    #[test]
    fn test_unassigned_players_take_best_free_land() {
        let (grid, landmass) = island(4, 4);
        let mut filtered = vec![100; grid.len()];
        filtered[grid.index(3, 3)] = 900;
        let settings = StartPositionSettings::default();
        let placed = place_players(&grid, &[landmass], &filtered, &names(1), &settings);

        assert_eq!(placed[0].1, PlacementTier::Relaxed);
        assert_eq!((placed[0].0.x, placed[0].0.y), (3, 3));
    }
}
