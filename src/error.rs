use crate::config::ConfigError;
use thiserror::Error;

/// Ошибки генерации карты
#[derive(Debug, Error)]
pub enum MapGenError {
    /// Настройки генератора вне допустимых диапазонов
    #[error("invalid generator settings: {0}")]
    InvalidSettings(#[from] ConfigError),

    /// На карте нет ни одного тайла суши: стартовые позиции ставить некуда
    #[error("generated {width}x{height} map contains no land tiles")]
    NoLand { width: u32, height: u32 },
}
