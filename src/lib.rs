pub mod config;
mod continent;
pub mod error;
pub mod generator;
pub mod render;
pub mod resources;
pub mod rivers;
pub mod rng;
mod startpos;
pub mod terrain;
pub mod tile;

pub use config::{DistributionMode, GeneratorSettings, MapGenerationParams};
pub use error::MapGenError;
pub use generator::{MapGenerator, MapResult, generate};
pub use startpos::StartingPosition;
pub use tile::{Direction, Resource, Terrain, Tile};
