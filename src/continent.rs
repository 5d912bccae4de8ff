use crate::tile::TileGrid;
use tracing::debug;

/// Связный по четырём сторонам участок суши
#[derive(Debug, Clone, PartialEq)]
pub struct Landmass {
    pub id: u32,
    /// Количество тайлов
    pub size: usize,
    /// Сумма отфильтрованных ценностей тайлов (заполняется при выборе стартов)
    pub quality_score: u64,
    /// Сколько игроков направлено на этот материк
    pub assigned_starters: usize,
}

impl Landmass {
    fn new(id: u32) -> Self {
        Self {
            id,
            size: 0,
            quality_score: 0,
            assigned_starters: 0,
        }
    }
}

/// Размечает материки: каждому тайлу суши присваивается `continent_id` его связной
/// компоненты, вода остаётся с нулём.
///
/// Обход — заливка с явным стеком, без рекурсии. Идентификаторы идут подряд с 1 в
/// порядке построчного сканирования; результат упорядочен по `id`.
pub fn label_continents(grid: &mut TileGrid) -> Vec<Landmass> {
    let width = grid.width;
    let height = grid.height;
    let mut landmasses: Vec<Landmass> = Vec::new();
    let mut stack: Vec<(u32, u32)> = Vec::new();

    for tile in &mut grid.tiles {
        tile.continent_id = 0;
    }

    for y in 0..height {
        for x in 0..width {
            let idx = grid.index(x, y);
            if grid.tiles[idx].continent_id != 0 || !grid.tiles[idx].terrain.is_land() {
                continue;
            }

            let mut landmass = Landmass::new(landmasses.len() as u32 + 1);
            grid.tiles[idx].continent_id = landmass.id;
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                landmass.size += 1;

                let neighbors: Vec<(u32, u32)> = grid
                    .neighbors4(cx, cy)
                    .map(|(_, nx, ny)| (nx, ny))
                    .collect();
                for (nx, ny) in neighbors {
                    let nidx = grid.index(nx, ny);
                    let neighbor = &mut grid.tiles[nidx];
                    if neighbor.continent_id == 0 && neighbor.terrain.is_land() {
                        // Метим при постановке в стек, чтобы тайл не попал туда дважды
                        neighbor.continent_id = landmass.id;
                        stack.push((nx, ny));
                    }
                }
            }

            landmasses.push(landmass);
        }
    }

    debug!(landmasses = landmasses.len(), "continents labeled");
    landmasses
}
