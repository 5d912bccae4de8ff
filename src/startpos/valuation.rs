use crate::tile::{Tile, TileGrid};

/// Множитель для тайлов, переживших локальный фильтр
pub const FILTER_SCALE: u64 = 100;

/// Грубая оценка выхода города с тайла: еда + производство + торговля местности,
/// бонус ресурса и +1 торговли за реку. Не стартовая местность стоит 0.
#[must_use]
pub fn tile_value(tile: &Tile) -> u32 {
    if !tile.terrain.is_starter() {
        return 0;
    }

    let (mut food, mut shield, mut trade) = tile.terrain.output();
    if let Some(resource) = tile.resource {
        let (f, s, t) = resource.bonus();
        food += f;
        shield += s;
        trade += t;
    }
    if tile.has_river() {
        trade += 1;
    }
    food + shield + trade
}

/// Смещения клеток в пределах радиуса рабочей зоны города (`dx² + dy² <= radius_sq`)
#[must_use]
pub fn city_offsets(radius_sq: i32) -> Vec<(i32, i32)> {
    let r = f64::from(radius_sq).sqrt() as i32;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= radius_sq {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Локальный фильтр по окрестности рабочей зоны города. Тайл сохраняет ценность,
/// только если она не ниже средней по окрестности и соседей не хуже него хотя бы
/// столько же, сколько соседей хуже. Выжившие значения умножаются на [`FILTER_SCALE`].
///
/// Первое условие обнуляет провалы внутри плодородных областей, второе обнуляет
/// одиночные пики среди бедных тайлов. Кандидаты остаются в широких однородных областях.
#[must_use]
pub fn filter_local_contrast(grid: &TileGrid, raw: &[u32], radius_sq: i32) -> Vec<u64> {
    let offsets = city_offsets(radius_sq);

    grid.tiles
        .iter()
        .enumerate()
        .map(|(idx, tile)| {
            let value = u64::from(raw[idx]);
            if value == 0 {
                return 0;
            }

            let mut sum = 0u64;
            let mut count = 0u64;
            let mut not_worse = 0u32;
            let mut worse = 0u32;
            for &(dx, dy) in &offsets {
                let nx = tile.x as i32 + dx;
                let ny = tile.y as i32 + dy;
                if !grid.in_bounds(nx, ny) {
                    continue;
                }
                let neighbor = u64::from(raw[grid.index(nx as u32, ny as u32)]);
                sum += neighbor;
                count += 1;
                if dx == 0 && dy == 0 {
                    continue;
                }
                if neighbor >= value {
                    not_worse += 1;
                } else {
                    worse += 1;
                }
            }

            if value * count >= sum && not_worse >= worse {
                value * FILTER_SCALE
            } else {
                0
            }
        })
        .collect()
}

/// Ценности всех тайлов после фильтра, в порядке хранения сетки
#[must_use]
pub fn filtered_values(grid: &TileGrid, radius_sq: i32) -> Vec<u64> {
    let raw: Vec<u32> = grid.tiles.iter().map(tile_value).collect();
    filter_local_contrast(grid, &raw, radius_sq)
}
