// src/config.rs
//! Конфигурация генерации карты
//!
//! Этот модуль определяет все параметры, управляющие генерацией игрового поля:
//! - Режимы распределения игроков по материкам
//! - Параметры рельефа и порогов местности
//! - Настройки рек и ресурсов
//! - Ограничения выбора стартовых позиций
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Ошибки загрузки и проверки конфигурации
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Режим распределения игроков по материкам
///
/// Если материков слишком мало для выбранного режима, он детерминированно
/// деградирует до более свободного: `Single` → `TwoOrThree` → `Variable` → `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
pub enum DistributionMode {
    /// Один игрок на материк
    Single,
    /// Два-три игрока на материк
    TwoOrThree,
    /// Все игроки на лучшем материке
    All,
    /// Число игроков пропорционально качеству материка
    Variable,
    /// Разрешается в `Variable`
    #[default]
    Default,
}

impl DistributionMode {
    /// Разрешает `Default` в конкретный режим.
    ///
    /// # Примеры
    /// ```
    /// use startmap::config::DistributionMode;
    /// assert_eq!(DistributionMode::Default.resolve(), DistributionMode::Variable);
    /// assert_eq!(DistributionMode::Single.resolve(), DistributionMode::Single);
    /// ```
    #[must_use]
    pub fn resolve(self) -> Self {
        match self {
            DistributionMode::Default => DistributionMode::Variable,
            other => other,
        }
    }

    /// Следующий, более свободный режим в цепочке деградации
    #[must_use]
    pub fn fallback(self) -> Option<Self> {
        match self.resolve() {
            DistributionMode::Single => Some(DistributionMode::TwoOrThree),
            DistributionMode::TwoOrThree => Some(DistributionMode::Variable),
            DistributionMode::Variable => Some(DistributionMode::All),
            DistributionMode::All | DistributionMode::Default => None,
        }
    }
}

/// Пороговые полосы высот для классификации местности
///
/// Высота нормирована в 0–255. Тайл ниже `deep_water` — глубокая вода, ниже
/// `shallow_water` — мелководье, ниже `coastal` — прибрежные воды; не ниже
/// `mountains` — горы, не ниже `hills` — холмы; всё остальное — равнинная суша.
/// Значения шире `u8`, чтобы можно было задать «всё под водой».
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainBands {
    #[serde(default = "default_deep_water")]
    pub deep_water: u16,
    #[serde(default = "default_shallow_water")]
    pub shallow_water: u16,
    #[serde(default = "default_coastal")]
    pub coastal: u16,
    #[serde(default = "default_hills")]
    pub hills: u16,
    #[serde(default = "default_mountains")]
    pub mountains: u16,
}

fn default_deep_water() -> u16 {
    60
}
fn default_shallow_water() -> u16 {
    90
}
fn default_coastal() -> u16 {
    110
}
fn default_hills() -> u16 {
    185
}
fn default_mountains() -> u16 {
    225
}

impl Default for TerrainBands {
    fn default() -> Self {
        Self {
            deep_water: 60,
            shallow_water: 90,
            coastal: 110,
            hills: 185,
            mountains: 225,
        }
    }
}

/// Настройки синтеза рельефа
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainSettings {
    /// Количество проходов сглаживания по соседям
    #[serde(default = "default_smoothing_passes")]
    pub smoothing_passes: usize,

    /// Частота фрактального шума (в тайлах)
    #[serde(default = "default_noise_frequency")]
    pub noise_frequency: f32,

    /// Вес спада высоты к краям карты
    #[serde(default = "default_falloff_weight")]
    pub falloff_weight: f32,

    /// Вес шума
    #[serde(default = "default_noise_weight")]
    pub noise_weight: f32,

    /// Амплитуда случайного сдвига высоты каждого тайла
    #[serde(default = "default_jitter")]
    pub jitter: f32,

    /// Случайный сдвиг (±) при выборе полосы — разрешает ничьи на границах полос
    #[serde(default = "default_band_tiebreak")]
    pub band_tiebreak: u8,

    /// Доля строк сверху и снизу, отданных полярному климату
    #[serde(default = "default_polar_fraction")]
    pub polar_fraction: f32,

    #[serde(default)]
    pub bands: TerrainBands,
}

fn default_smoothing_passes() -> usize {
    3
}
fn default_noise_frequency() -> f32 {
    0.08
}
fn default_falloff_weight() -> f32 {
    0.6
}
fn default_noise_weight() -> f32 {
    0.55
}
fn default_jitter() -> f32 {
    0.08
}
fn default_band_tiebreak() -> u8 {
    6
}
fn default_polar_fraction() -> f32 {
    0.1
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            smoothing_passes: 3,
            noise_frequency: 0.08,
            falloff_weight: 0.6,
            noise_weight: 0.55,
            jitter: 0.08,
            band_tiebreak: 6,
            polar_fraction: 0.1,
            bands: TerrainBands::default(),
        }
    }
}

/// Настройки рек
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiverSettings {
    /// Примерно один исток на столько тайлов
    #[serde(default = "default_tiles_per_river")]
    pub tiles_per_river: u32,

    /// Сколько случайных кандидатов пробуется на один исток
    #[serde(default = "default_source_attempts")]
    pub source_attempts: u32,

    /// Максимальная длина реки в шагах (по умолчанию — большая сторона карты)
    #[serde(default)]
    pub max_length: Option<u32>,

    /// Вероятность шага к самому низкому соседу (иначе — случайный сосед)
    #[serde(default = "default_downhill_bias")]
    pub downhill_bias: f64,
}

fn default_tiles_per_river() -> u32 {
    800
}
fn default_source_attempts() -> u32 {
    100
}
fn default_downhill_bias() -> f64 {
    0.7
}

impl Default for RiverSettings {
    fn default() -> Self {
        Self {
            tiles_per_river: 800,
            source_attempts: 100,
            max_length: None,
            downhill_bias: 0.7,
        }
    }
}

/// Настройки ресурсов
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceSettings {
    /// Вероятность появления ресурса на подходящем тайле суши
    #[serde(default = "default_resource_chance")]
    pub resource_chance: f64,
}

fn default_resource_chance() -> f64 {
    0.15
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            resource_chance: 0.15,
        }
    }
}

/// Ограничения выбора стартовых позиций
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartPositionSettings {
    /// Квадрат радиуса рабочей зоны города (окрестность для локального фильтра)
    #[serde(default = "default_city_radius_sq")]
    pub city_radius_sq: i32,

    /// Минимальная ценность тайла как доля от лучшей ценности на карте
    #[serde(default = "default_min_value_fraction")]
    pub min_value_fraction: f32,

    /// Множитель дистанции между игроками одного материка:
    /// `separation_factor * sqrt(размер / игроков)`
    #[serde(default = "default_separation_factor")]
    pub separation_factor: f32,

    /// Нижняя граница дистанции между любыми двумя стартами
    #[serde(default = "default_min_separation")]
    pub min_separation: u32,

    /// Аварийная координата, если на карте не осталось свободной суши
    #[serde(default = "default_emergency_origin")]
    pub emergency_origin: (u32, u32),
}

fn default_city_radius_sq() -> i32 {
    5
}
fn default_min_value_fraction() -> f32 {
    0.25
}
fn default_separation_factor() -> f32 {
    0.7
}
fn default_min_separation() -> u32 {
    2
}
fn default_emergency_origin() -> (u32, u32) {
    (1, 1)
}

impl Default for StartPositionSettings {
    fn default() -> Self {
        Self {
            city_radius_sq: 5,
            min_value_fraction: 0.25,
            separation_factor: 0.7,
            min_separation: 2,
            emergency_origin: (1, 1),
        }
    }
}

/// Все настраиваемые параметры конвейера генерации
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GeneratorSettings {
    #[serde(default)]
    pub terrain: TerrainSettings,
    #[serde(default)]
    pub rivers: RiverSettings,
    #[serde(default)]
    pub resources: ResourceSettings,
    #[serde(default)]
    pub start_positions: StartPositionSettings,
}

impl GeneratorSettings {
    /// Проверяет, что вероятности и множители лежат в допустимых пределах
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probability = |name: &str, p: f64| {
            if (0.0..=1.0).contains(&p) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {p}")))
            }
        };
        probability("rivers.downhill_bias", self.rivers.downhill_bias)?;
        probability("resources.resource_chance", self.resources.resource_chance)?;

        if self.rivers.tiles_per_river == 0 {
            return Err(ConfigError::Invalid(
                "rivers.tiles_per_river must be positive".into(),
            ));
        }
        if !(0.0..=0.5).contains(&self.terrain.polar_fraction) {
            return Err(ConfigError::Invalid(format!(
                "terrain.polar_fraction must be in [0, 0.5], got {}",
                self.terrain.polar_fraction
            )));
        }
        if self.start_positions.city_radius_sq < 1 {
            return Err(ConfigError::Invalid(
                "start_positions.city_radius_sq must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.start_positions.min_value_fraction) {
            return Err(ConfigError::Invalid(format!(
                "start_positions.min_value_fraction must be in [0, 1], got {}",
                self.start_positions.min_value_fraction
            )));
        }
        Ok(())
    }
}

/// Полные параметры одного вызова генерации
///
/// Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapGenerationParams {
    /// Строковый сид (детерминированная генерация)
    pub seed: String,

    /// Ширина карты в тайлах (по умолчанию 80)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота карты в тайлах (по умолчанию 50)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Идентификаторы игроков в порядке хода
    #[serde(default)]
    pub players: Vec<String>,

    /// Режим распределения игроков (по умолчанию `Default` → `Variable`)
    #[serde(default)]
    pub mode: DistributionMode,

    #[serde(default)]
    pub settings: GeneratorSettings,
}

fn default_width() -> u32 {
    80
}
fn default_height() -> u32 {
    50
}

impl MapGenerationParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # map.toml
    /// seed = "seed-A"
    /// width = 64
    /// height = 40
    /// players = ["red", "blue", "green"]
    /// mode = "TwoOrThree"
    ///
    /// [settings.rivers]
    /// tiles_per_river = 400
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(contents)?;
        params.settings.validate()?;
        Ok(params)
    }
}
