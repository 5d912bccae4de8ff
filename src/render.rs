//! PNG-превью сгенерированной карты (только для отладки через CLI)

use crate::generator::MapResult;
use crate::tile::{Terrain, Tile};
use image::{ImageBuffer, Rgba};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

const RIVER_COLOR: [u8; 3] = [40, 90, 220];
const START_COLOR: [u8; 3] = [220, 30, 30];

impl Terrain {
    #[must_use]
    pub fn to_rgb(self) -> [u8; 3] {
        match self {
            Terrain::DeepWater => [0, 40, 100],
            Terrain::ShallowWater => [0, 80, 160],
            Terrain::Coastal => [60, 130, 200],
            Terrain::Grassland => [150, 200, 100],
            Terrain::Plains => [200, 200, 120],
            Terrain::Forest => [60, 120, 60],
            Terrain::Jungle => [30, 100, 30],
            Terrain::Swamp => [80, 100, 60],
            Terrain::Hills => [160, 140, 100],
            Terrain::Mountains => [150, 150, 150],
            Terrain::Desert => [220, 200, 140],
            Terrain::Tundra => [200, 220, 180],
            Terrain::Snow => [240, 240, 250],
            Terrain::Glacier => [220, 220, 255],
        }
    }
}

fn tile_rgba(tile: &Tile) -> [u8; 4] {
    let rgb = if tile.has_river() {
        RIVER_COLOR
    } else {
        tile.terrain.to_rgb()
    };
    [rgb[0], rgb[1], rgb[2], 255]
}

/// RGBA-буфер: один тайл — квадрат `scale × scale` пикселей
#[must_use]
pub fn to_rgba_image(map: &MapResult, scale: u32) -> Vec<u8> {
    let scale = scale.max(1);
    let scale = scale as usize;
    let width = map.width() as usize * scale;
    let pixels = width * map.height() as usize * scale;

    let pixel = |i: usize| {
        let px = u32::try_from(i % width / scale).unwrap_or(u32::MAX);
        let py = u32::try_from(i / width / scale).unwrap_or(u32::MAX);
        map.tile(px, py).map_or([0, 0, 0, 255], tile_rgba)
    };

    #[cfg(feature = "parallel")]
    let buffer: Vec<u8> = (0..pixels).into_par_iter().flat_map_iter(pixel).collect();
    #[cfg(not(feature = "parallel"))]
    let buffer: Vec<u8> = (0..pixels).flat_map(pixel).collect();

    buffer
}

/// Сохраняет превью в PNG, отмечая стартовые позиции кружками
pub fn save_preview_png(map: &MapResult, path: &str, scale: u32) -> Result<(), Box<dyn std::error::Error>> {
    let scale = scale.max(1);
    let (Some(img_width), Some(img_height)) =
        (map.width().checked_mul(scale), map.height().checked_mul(scale))
    else {
        return Err("preview dimensions overflow u32".into());
    };
    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(img_width, img_height, to_rgba_image(map, scale))
            .ok_or("Failed to create image buffer")?;

    let color = Rgba([START_COLOR[0], START_COLOR[1], START_COLOR[2], 255]);
    let radius = (scale as i32 / 2).max(1);
    for position in map.starting_positions() {
        let center = (
            (position.x * scale + scale / 2) as i32,
            (position.y * scale + scale / 2) as i32,
        );
        draw_filled_circle_mut(&mut img, center, radius, color);
        draw_hollow_circle_mut(&mut img, center, radius * 2, color);
    }

    img.save(path)?;
    Ok(())
}
