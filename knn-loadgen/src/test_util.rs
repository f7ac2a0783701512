use rand::{rngs::StdRng, SeedableRng};

use crate::sampler::{ValueGenerator, ValueSampler};

pub const TEST_SEED: u64 = 0x533D;

pub fn generator_with_seed(sampler: ValueSampler, seed: u64) -> ValueGenerator<StdRng> {
    ValueGenerator::new(sampler, StdRng::seed_from_u64(seed))
}

pub fn seeded_generator(sampler: ValueSampler) -> ValueGenerator<StdRng> {
    generator_with_seed(sampler, TEST_SEED)
}
