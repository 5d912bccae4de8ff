//! Синтез рельефа
//!
//! Поле высот = радиальный спад от краёв карты + фрактальный шум + случайный сдвиг
//! каждого тайла, затем несколько проходов сглаживания по соседям и нормировка в 0–255.
//! После этого каждый тайл классифицируется по упорядоченным полосам высот.

use crate::config::{TerrainBands, TerrainSettings};
use crate::tile::{Terrain, TileGrid};
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Сырое поле высот до нормировки
#[derive(Debug, Clone)]
pub struct ElevationField {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ElevationField {
    /// Строит поле: спад к краям + шум + сдвиг. Все случайные значения берутся из `rng`.
    pub fn generate<R: Rng + ?Sized>(
        width: u32,
        height: u32,
        settings: &TerrainSettings,
        rng: &mut R,
    ) -> Self {
        let mut noise = FastNoiseLite::new();
        noise.set_seed(Some(rng.gen_range(i32::MIN..=i32::MAX)));
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_fractal_type(Some(FractalType::FBm));
        noise.set_fractal_octaves(Some(3));
        noise.set_frequency(Some(settings.noise_frequency));

        let jitter = settings.jitter.abs();
        let width_f = width as f32;
        let height_f = height as f32;

        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                // Координаты в [-1, 1], центр карты — 0
                let nx = (x as f32 + 0.5) / width_f * 2.0 - 1.0;
                let ny = (y as f32 + 0.5) / height_f * 2.0 - 1.0;
                let falloff = 1.0 - (nx * nx + ny * ny).sqrt().min(1.0);

                let n = (noise.get_noise_2d(x as f32, y as f32) + 1.0) * 0.5;
                let value = settings.falloff_weight * falloff
                    + settings.noise_weight * n
                    + rng.gen_range(-jitter..=jitter);
                data.push(value);
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    /// Один проход сглаживания: каждое значение заменяется средним по себе и
    /// соседям 3×3, лежащим внутри карты
    pub fn smooth(&mut self) {
        let width = self.width as i32;
        let height = self.height as i32;
        let mut smoothed = vec![0.0; self.data.len()];

        for y in 0..height {
            for x in 0..width {
                let mut sum = 0.0;
                let mut count = 0.0;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let nx = x + dx;
                        let ny = y + dy;
                        if nx >= 0 && nx < width && ny >= 0 && ny < height {
                            sum += self.data[ny as usize * width as usize + nx as usize];
                            count += 1.0;
                        }
                    }
                }
                smoothed[y as usize * width as usize + x as usize] = sum / count;
            }
        }

        self.data = smoothed;
    }

    /// Нормирует поле в 0–255. Плоское поле целиком уходит в 0.
    #[must_use]
    pub fn to_elevations(&self) -> Vec<u8> {
        let min_h = self.data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max_h = self.data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let range = max_h - min_h;

        self.data
            .iter()
            .map(|&h| {
                if range > f32::EPSILON {
                    ((h - min_h) / range * 255.0).round().clamp(0.0, 255.0) as u8
                } else {
                    0
                }
            })
            .collect()
    }
}

/// Количество полярных строк сверху и снизу
#[must_use]
pub fn polar_rows(height: u32, polar_fraction: f32) -> u32 {
    if polar_fraction <= 0.0 || height < 3 {
        return 0;
    }
    ((height as f32 * polar_fraction).round() as u32).max(1)
}

/// Климатические веса равнинной суши по широте (0 — экватор, 1 — полюс)
fn lowland_table(latitude: f32) -> &'static [(Terrain, u32)] {
    if latitude > 0.7 {
        &[
            (Terrain::Tundra, 35),
            (Terrain::Forest, 30),
            (Terrain::Plains, 20),
            (Terrain::Grassland, 15),
        ]
    } else if latitude > 0.35 {
        &[
            (Terrain::Grassland, 35),
            (Terrain::Plains, 30),
            (Terrain::Forest, 25),
            (Terrain::Swamp, 10),
        ]
    } else {
        &[
            (Terrain::Jungle, 25),
            (Terrain::Grassland, 20),
            (Terrain::Plains, 20),
            (Terrain::Desert, 20),
            (Terrain::Swamp, 10),
            (Terrain::Forest, 5),
        ]
    }
}

/// Классифицирует один тайл по высоте и строке
pub fn classify<R: Rng + ?Sized>(
    elevation: u8,
    y: u32,
    height: u32,
    polar_rows: u32,
    settings: &TerrainSettings,
    rng: &mut R,
) -> Terrain {
    let bands: &TerrainBands = &settings.bands;
    let tiebreak = i32::from(settings.band_tiebreak);
    let e = i32::from(elevation)
        + if tiebreak > 0 {
            rng.gen_range(-tiebreak..=tiebreak)
        } else {
            0
        };

    // 1. Вода
    if e < i32::from(bands.deep_water) {
        return Terrain::DeepWater;
    }
    if e < i32::from(bands.shallow_water) {
        return Terrain::ShallowWater;
    }
    if e < i32::from(bands.coastal) {
        return Terrain::Coastal;
    }

    let pole_distance = y.min(height.saturating_sub(1) - y);
    let is_polar = pole_distance < polar_rows;

    // 2. Возвышенности: у полюсов они покрыты льдом
    if e >= i32::from(bands.mountains) {
        return if is_polar {
            Terrain::Glacier
        } else {
            Terrain::Mountains
        };
    }
    if e >= i32::from(bands.hills) {
        return if is_polar { Terrain::Snow } else { Terrain::Hills };
    }

    // 3. Полярная равнина: чем ближе к краю, тем больше льда
    if is_polar {
        let closeness = 1.0 - pole_distance as f32 / polar_rows as f32;
        let roll: f32 = rng.gen_range(0.0..1.0);
        return if roll < closeness * 0.6 {
            Terrain::Glacier
        } else if roll < closeness {
            Terrain::Snow
        } else {
            Terrain::Tundra
        };
    }

    // 4. Равнина по широте
    let half = (height.saturating_sub(1) as f32 / 2.0).max(1.0);
    let latitude = ((y as f32 - half).abs() / half).min(1.0);
    lowland_table(latitude)
        .choose_weighted(rng, |&(_, weight)| weight)
        .map_or(Terrain::Grassland, |&(terrain, _)| terrain)
}

/// Строит сетку тайлов с заполненными `elevation` и `terrain`
pub fn synthesize<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    settings: &TerrainSettings,
    rng: &mut R,
) -> TileGrid {
    let mut field = ElevationField::generate(width, height, settings, rng);
    for _ in 0..settings.smoothing_passes {
        field.smooth();
    }
    let elevations = field.to_elevations();

    let polar = polar_rows(height, settings.polar_fraction);
    let mut grid = TileGrid::new(width, height);
    for (tile, &elevation) in grid.tiles.iter_mut().zip(&elevations) {
        tile.elevation = elevation;
        tile.terrain = classify(elevation, tile.y, height, polar, settings, rng);
    }

    debug!(
        width,
        height,
        land = grid.land_count(),
        polar_rows = polar,
        "terrain synthesized"
    );
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_grid_is_complete() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let grid = synthesize(17, 11, &TerrainSettings::default(), &mut rng);
        assert_eq!(grid.len(), 17 * 11);
        for (i, tile) in grid.tiles.iter().enumerate() {
            assert_eq!(grid.index(tile.x, tile.y), i);
        }
    }

    #[test]
    fn test_interior_is_higher_than_corners() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let settings = TerrainSettings {
            noise_weight: 0.0,
            jitter: 0.0,
            ..TerrainSettings::default()
        };
        let grid = synthesize(21, 21, &settings, &mut rng);
        assert!(grid.get(10, 10).elevation > grid.get(0, 0).elevation);
        assert!(grid.get(10, 10).elevation > grid.get(20, 20).elevation);
    }

    #[test]
    fn test_normalization_spans_full_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let grid = synthesize(30, 20, &TerrainSettings::default(), &mut rng);
        let max = grid.tiles.iter().map(|t| t.elevation).max().unwrap();
        let min = grid.tiles.iter().map(|t| t.elevation).min().unwrap();
        assert_eq!(max, 255);
        assert_eq!(min, 0);
        // Самая высокая точка всегда суша
        assert!(grid.land_count() > 0);
    }

    #[test]
    fn test_smoothing_reduces_spread() {
        let mut field = ElevationField {
            width: 3,
            height: 3,
            data: vec![0.0, 0.0, 0.0, 0.0, 9.0, 0.0, 0.0, 0.0, 0.0],
        };
        field.smooth();
        assert!((field.data[4] - 1.0).abs() < 1e-6);
        // Угол видит 4 значения, одно из них — пик
        assert!((field.data[0] - 9.0 / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_flat_field_normalizes_to_zero() {
        let field = ElevationField {
            width: 2,
            height: 1,
            data: vec![0.4, 0.4],
        };
        assert_eq!(field.to_elevations(), vec![0, 0]);
    }

    #[test]
    fn test_bands_without_tiebreak() {
        let settings = TerrainSettings {
            band_tiebreak: 0,
            ..TerrainSettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mid = 50;
        assert_eq!(classify(10, mid, 100, 10, &settings, &mut rng), Terrain::DeepWater);
        assert_eq!(classify(70, mid, 100, 10, &settings, &mut rng), Terrain::ShallowWater);
        assert_eq!(classify(100, mid, 100, 10, &settings, &mut rng), Terrain::Coastal);
        assert_eq!(classify(200, mid, 100, 10, &settings, &mut rng), Terrain::Hills);
        assert_eq!(classify(250, mid, 100, 10, &settings, &mut rng), Terrain::Mountains);
        assert!(classify(150, mid, 100, 10, &settings, &mut rng).is_land());
    }

    #[test]
    fn test_poles_freeze() {
        let settings = TerrainSettings {
            band_tiebreak: 0,
            ..TerrainSettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(classify(250, 0, 100, 10, &settings, &mut rng), Terrain::Glacier);
        assert_eq!(classify(200, 99, 100, 10, &settings, &mut rng), Terrain::Snow);
        for _ in 0..50 {
            let t = classify(150, 0, 100, 10, &settings, &mut rng);
            assert!(matches!(t, Terrain::Glacier | Terrain::Snow | Terrain::Tundra));
        }
    }

    #[test]
    fn test_polar_rows_scale_with_height() {
        assert_eq!(polar_rows(100, 0.1), 10);
        assert_eq!(polar_rows(10, 0.1), 1);
        assert_eq!(polar_rows(2, 0.1), 0);
        assert_eq!(polar_rows(100, 0.0), 0);
    }
}
