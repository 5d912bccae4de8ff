use clap::Parser;
use startmap::render::save_preview_png;
use startmap::{DistributionMode, MapGenError, MapGenerationParams, MapGenerator, MapResult};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Генератор игрового поля и стартовых позиций
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: PathBuf,

    /// Переопределить сид из конфигурации
    #[arg(short, long)]
    seed: Option<String>,

    /// Переопределить режим распределения игроков
    #[arg(short, long, value_enum)]
    mode: Option<DistributionMode>,

    /// Путь для сохранения карты в JSON
    #[arg(short, long, default_value = "map.json")]
    output: PathBuf,

    /// Путь для PNG-превью (не сохраняется, если не указан)
    #[arg(short, long)]
    preview: Option<PathBuf>,

    /// Размер тайла в пикселях на превью
    #[arg(long, default_value_t = 8)]
    scale: u32,

    /// Сколько раз пробовать производные сиды, если на карте нет суши
    #[arg(long, default_value_t = 3)]
    retries: u32,
}

/// Цепочка повторов: исходный сид, затем `<seed>#1`, `<seed>#2`, …
fn generate_with_retries(
    generator: &MapGenerator,
    params: &MapGenerationParams,
    retries: u32,
) -> Result<MapResult, MapGenError> {
    let mut attempt = 0;
    loop {
        let seed = if attempt == 0 {
            params.seed.clone()
        } else {
            format!("{}#{attempt}", params.seed)
        };
        match generator.generate(params.width, params.height, params.players.as_slice(), &seed, params.mode) {
            Ok(map) => return Ok(map),
            Err(err @ MapGenError::NoLand { .. }) if attempt < retries => {
                warn!(%seed, attempt, error = %err, "generation failed, retrying with derived seed");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    info!(config = ?cli.config, "loading configuration");
    let mut params = MapGenerationParams::from_toml_file(&cli.config)?;
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }
    if let Some(mode) = cli.mode {
        params.mode = mode;
    }

    let generator = MapGenerator::new(params.settings.clone());
    let map = generate_with_retries(&generator, &params, cli.retries)?;

    info!(
        land = map.land_tile_count(),
        rivers = map.river_tile_count(),
        landmasses = map.landmass_count(),
        "terrain summary"
    );
    for position in map.starting_positions() {
        info!(player = %position.player_id, x = position.x, y = position.y, "starting position");
    }

    std::fs::write(&cli.output, serde_json::to_string_pretty(&map)?)?;
    info!(path = ?cli.output, "map saved");

    if let Some(preview) = cli.preview {
        let path = preview.to_str().ok_or("preview path is not valid UTF-8")?;
        save_preview_png(&map, path, cli.scale)?;
        info!(path, "preview saved");
    }

    Ok(())
}
