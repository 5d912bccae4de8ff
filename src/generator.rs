//! Оркестрация конвейера генерации
//!
//! Рельеф → материки → реки → ресурсы → стартовые позиции. Все этапы получают один и
//! тот же генератор случайных чисел в фиксированном порядке вызовов.

use crate::config::{DistributionMode, GeneratorSettings};
use crate::continent::label_continents;
use crate::error::MapGenError;
use crate::resources::place_resources;
use crate::rivers::generate_rivers;
use crate::rng::Lcg;
use crate::startpos::{StartingPosition, select_starting_positions};
use crate::terrain::synthesize;
use crate::tile::{Terrain, Tile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Готовая карта. После создания не изменяется.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapResult {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    seed: String,
    generated_at: DateTime<Utc>,
    starting_positions: Vec<StartingPosition>,
}

impl MapResult {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Все тайлы построчно
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[must_use]
    pub fn tile(&self, x: u32, y: u32) -> Option<&Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get(y as usize * self.width as usize + x as usize)
    }

    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// По одной позиции на игрока, в порядке списка игроков
    #[must_use]
    pub fn starting_positions(&self) -> &[StartingPosition] {
        &self.starting_positions
    }

    #[must_use]
    pub fn land_tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.terrain.is_land()).count()
    }

    #[must_use]
    pub fn river_tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.has_river()).count()
    }

    #[must_use]
    pub fn landmass_count(&self) -> u32 {
        self.tiles.iter().map(|t| t.continent_id).max().unwrap_or(0)
    }

    /// Количество тайлов каждого типа местности
    #[must_use]
    pub fn terrain_histogram(&self) -> BTreeMap<Terrain, usize> {
        let mut histogram = BTreeMap::new();
        for tile in &self.tiles {
            *histogram.entry(tile.terrain).or_insert(0) += 1;
        }
        histogram
    }
}

/// Генератор карт с заданными настройками
#[derive(Debug, Clone, Default)]
pub struct MapGenerator {
    settings: GeneratorSettings,
}

impl MapGenerator {
    #[must_use]
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Генерирует карту.
    ///
    /// Одинаковые `(width, height, players, seed, mode)` дают одинаковые тайлы и
    /// стартовые позиции. Повторяющиеся идентификаторы игроков учитываются один раз.
    ///
    /// # Ошибки
    /// [`MapGenError::InvalidSettings`], если настройки не проходят проверку,
    /// [`MapGenError::NoLand`], если на карте не оказалось суши.
    pub fn generate<S: AsRef<str>>(
        &self,
        width: u32,
        height: u32,
        players: &[S],
        seed: &str,
        mode: DistributionMode,
    ) -> Result<MapResult, MapGenError> {
        self.settings.validate()?;
        let players = unique_players(players);
        let mut rng = Lcg::from_seed_str(seed);

        let mut grid = synthesize(width, height, &self.settings.terrain, &mut rng);

        let landmasses = label_continents(&mut grid);
        if landmasses.is_empty() {
            return Err(MapGenError::NoLand { width, height });
        }

        generate_rivers(&mut grid, &self.settings.rivers, &mut rng);
        place_resources(&mut grid, &self.settings.resources, &mut rng);

        let selection = select_starting_positions(
            &grid,
            &landmasses,
            &players,
            mode,
            &self.settings.start_positions,
        );
        if selection.degraded > 0 {
            warn!(
                degraded = selection.degraded,
                players = players.len(),
                "some starting positions ignore separation or value constraints"
            );
        }

        info!(
            width,
            height,
            seed,
            players = players.len(),
            landmasses = landmasses.len(),
            mode = ?selection.mode,
            "map generated"
        );

        Ok(MapResult {
            width,
            height,
            tiles: grid.tiles,
            seed: seed.to_string(),
            generated_at: Utc::now(),
            starting_positions: selection.positions,
        })
    }
}

/// Упорядоченное множество игроков: первое вхождение побеждает
fn unique_players<S: AsRef<str>>(players: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    players
        .iter()
        .map(AsRef::as_ref)
        .filter(|id| seen.insert(*id))
        .map(ToString::to_string)
        .collect()
}

/// Генерирует карту с настройками по умолчанию
pub fn generate<S: AsRef<str>>(
    width: u32,
    height: u32,
    players: &[S],
    seed: &str,
    mode: DistributionMode,
) -> Result<MapResult, MapGenError> {
    MapGenerator::default().generate(width, height, players, seed, mode)
}
