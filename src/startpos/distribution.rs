//! Ранжирование материков и распределение игроков между ними

use crate::config::DistributionMode;
use crate::continent::Landmass;
use crate::tile::TileGrid;
use std::cmp::Reverse;
use tracing::warn;

/// Считает качество каждого материка и возвращает новый список, отсортированный по
/// убыванию качества (при равенстве — по размеру, затем по `id`).
///
/// Исходный список не меняется: идентификаторы остаются связаны с тайлами.
#[must_use]
pub fn rank_landmasses(landmasses: &[Landmass], grid: &TileGrid, filtered: &[u64]) -> Vec<Landmass> {
    let mut quality = vec![0u64; landmasses.len()];
    for (tile, &value) in grid.tiles.iter().zip(filtered) {
        if tile.continent_id > 0 {
            if let Some(q) = quality.get_mut(tile.continent_id as usize - 1) {
                *q += value;
            }
        }
    }

    let mut ranked: Vec<Landmass> = landmasses
        .iter()
        .map(|landmass| Landmass {
            quality_score: quality
                .get(landmass.id as usize - 1)
                .copied()
                .unwrap_or_default(),
            assigned_starters: 0,
            ..landmass.clone()
        })
        .collect();
    ranked.sort_by_key(|l| (Reverse(l.quality_score), Reverse(l.size), l.id));
    ranked
}

/// Сколько игроков взять на очередной материк в режиме «два-три на материк»
fn two_or_three_share(remaining: usize) -> usize {
    match remaining {
        0..=3 => remaining,
        4 => 2,
        r if r % 2 == 1 => 3,
        _ => 2,
    }
}

/// Пытается распределить игроков в заданном режиме.
///
/// `None` — материков не хватает, нужен более свободный режим.
fn try_allocate(ranked: &[Landmass], players: usize, mode: DistributionMode) -> Option<Vec<usize>> {
    let mut counts = vec![0usize; ranked.len()];
    if players == 0 {
        return Some(counts);
    }
    let viable = ranked.iter().take_while(|l| l.quality_score > 0).count();

    match mode.resolve() {
        DistributionMode::Single => {
            if viable < players {
                return None;
            }
            counts.iter_mut().take(players).for_each(|c| *c = 1);
        }
        DistributionMode::TwoOrThree => {
            let mut remaining = players;
            for count in counts.iter_mut().take(viable) {
                if remaining == 0 {
                    break;
                }
                *count = two_or_three_share(remaining);
                remaining -= *count;
            }
            if remaining > 0 {
                return None;
            }
        }
        DistributionMode::Variable => {
            let total: u64 = ranked.iter().map(|l| l.quality_score).sum();
            if total == 0 {
                return None;
            }
            let per_player = (total / players as u64).max(1);

            let mut remaining = players;
            for (count, landmass) in counts.iter_mut().zip(ranked).take(viable) {
                let share = usize::try_from(landmass.quality_score / per_player).unwrap_or(usize::MAX);
                *count = share.min(remaining);
                remaining -= *count;
            }
            // Остаток от округления — по одному, начиная с лучших материков
            let mut i = 0;
            while remaining > 0 {
                counts[i % viable] += 1;
                remaining -= 1;
                i += 1;
            }
        }
        DistributionMode::All | DistributionMode::Default => {
            let first = counts.first_mut()?;
            *first = players;
        }
    }

    Some(counts)
}

/// Распределяет игроков по ранжированным материкам, записывая `assigned_starters`.
///
/// Если выбранный режим невыполним, он деградирует по цепочке
/// `Single` → `TwoOrThree` → `Variable` → `All`. Возвращает фактически применённый режим.
pub fn distribute(ranked: &mut [Landmass], players: usize, requested: DistributionMode) -> DistributionMode {
    let mut mode = requested.resolve();
    loop {
        if let Some(counts) = try_allocate(ranked, players, mode) {
            for (landmass, count) in ranked.iter_mut().zip(counts) {
                landmass.assigned_starters = count;
            }
            return mode;
        }
        match mode.fallback() {
            Some(next) => {
                warn!(
                    from = ?mode,
                    to = ?next,
                    players,
                    landmasses = ranked.len(),
                    "distribution mode not satisfiable, falling back"
                );
                mode = next;
            }
            None => return mode,
        }
    }
}
