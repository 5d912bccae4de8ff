//! Детерминированный генератор случайных чисел
//!
//! Простой 64-битный линейный конгруэнтный генератор. Один экземпляр создаётся из
//! строкового сида и передаётся по `&mut` через все этапы генерации в фиксированном
//! порядке, поэтому одинаковые параметры дают побитово одинаковую карту.

use rand::{RngCore, SeedableRng};

const MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const INCREMENT: u64 = 1_442_695_040_888_963_407;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Линейный конгруэнтный генератор (константы MMIX)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    #[must_use]
    pub fn new(state: u64) -> Self {
        Self { state }
    }

    /// Пересеивает генератор из строкового сида (FNV-1a по байтам UTF-8)
    #[must_use]
    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(hash_seed(seed))
    }

    fn step(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT);
        self.state
    }
}

/// FNV-1a хеш строки
#[must_use]
pub fn hash_seed(seed: &str) -> u64 {
    seed.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

impl RngCore for Lcg {
    fn next_u32(&mut self) -> u32 {
        // младшие биты LCG слабые, берём старшие
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Lcg {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }
}
