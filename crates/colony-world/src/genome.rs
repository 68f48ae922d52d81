//! Trait vector carried by newborns, and its mutation operator.

use crate::organism::OrganismKind;
use colony_core::GenomeSeed;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One heritable trait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    MutationRate,
    RotateSkills,
    RotateRate,
    RadioRate,
    RootRate,
    LeafRate,
    NewbornRate,
}

impl Trait {
    pub const ALL: [Trait; 7] = [
        Trait::MutationRate,
        Trait::RotateSkills,
        Trait::RotateRate,
        Trait::RadioRate,
        Trait::RootRate,
        Trait::LeafRate,
        Trait::NewbornRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Trait::MutationRate => "mutation_rate",
            Trait::RotateSkills => "rotate_skills",
            Trait::RotateRate => "rotate_rate",
            Trait::RadioRate => "radio_rate",
            Trait::RootRate => "root_rate",
            Trait::LeafRate => "leaf_rate",
            Trait::NewbornRate => "newborn_rate",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-key trait vector.
///
/// Values start in `[0, 1]` but mutation is unbounded; nothing clamps them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    values: [f64; 7],
}

impl Genome {
    /// Value of every trait not given by a seed
    pub const DEFAULT_VALUE: f64 = 0.5;
    /// Half-width of the uniform mutation perturbation
    pub const MUTATION_STEP: f64 = 0.02;
    /// Lower bound of randomized founder traits
    pub const RANDOM_MIN: f64 = 0.2;
    pub const RANDOM_MAX: f64 = 1.0;

    pub fn new() -> Self {
        Self {
            values: [Self::DEFAULT_VALUE; 7],
        }
    }

    /// Genome from externally supplied values, defaulting the missing ones
    pub fn from_seed(seed: &GenomeSeed) -> Self {
        let mut genome = Self::new();
        for (slot, value) in seed.values().into_iter().enumerate() {
            if let Some(value) = value {
                genome.values[slot] = value;
            }
        }
        genome
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut genome = Self::new();
        genome.randomize(rng);
        genome
    }

    /// Redraw every trait from `[RANDOM_MIN, RANDOM_MAX]`
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for value in &mut self.values {
            *value = rng.gen_range(Self::RANDOM_MIN..=Self::RANDOM_MAX);
        }
    }

    pub fn get(&self, t: Trait) -> f64 {
        self.values[t.slot()]
    }

    pub fn set(&mut self, t: Trait, value: f64) {
        self.values[t.slot()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trait, f64)> + '_ {
        Trait::ALL.iter().map(move |&t| (t, self.get(t)))
    }

    /// With probability `mutation_rate`, nudge one uniformly chosen trait.
    ///
    /// Returns the trait that changed, if any.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Trait> {
        if rng.gen::<f64>() >= self.get(Trait::MutationRate) {
            return None;
        }
        let choice = Trait::ALL[rng.gen_range(0..Trait::ALL.len())];
        let shift = rng.gen_range(-Self::MUTATION_STEP..=Self::MUTATION_STEP);
        self.values[choice.slot()] += shift;
        Some(choice)
    }

    /// Sampling weights over [`OrganismKind::SPAWNABLE`], not renormalized
    pub fn kind_weights(&self) -> [f64; 4] {
        [
            self.get(Trait::LeafRate),
            self.get(Trait::RootRate),
            self.get(Trait::RadioRate),
            self.get(Trait::NewbornRate),
        ]
    }

    /// Draw the kind of a branch organism.
    ///
    /// Negative weights count as zero. `None` when no kind has positive weight.
    pub fn draw_kind<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<OrganismKind> {
        let weights = self.kind_weights().map(|w| if w > 0.0 { w } else { 0.0 });
        let index = WeightedIndex::new(weights).ok()?;
        Some(OrganismKind::SPAWNABLE[index.sample(rng)])
    }
}

impl Default for Genome {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_from_seed_fills_missing_traits() {
        let seed = GenomeSeed {
            leaf_rate: Some(0.9),
            mutation_rate: Some(0.1),
            ..Default::default()
        };
        let genome = Genome::from_seed(&seed);
        assert_eq!(genome.get(Trait::LeafRate), 0.9);
        assert_eq!(genome.get(Trait::MutationRate), 0.1);
        assert_eq!(genome.get(Trait::RootRate), Genome::DEFAULT_VALUE);
        assert_eq!(genome.iter().count(), 7);
    }

    #[test]
    fn test_randomize_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let genome = Genome::random(&mut rng);
            for (_, value) in genome.iter() {
                assert!((Genome::RANDOM_MIN..=Genome::RANDOM_MAX).contains(&value));
            }
        }
    }

    #[test]
    fn test_zero_mutation_rate_never_mutates() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut genome = Genome::new();
        genome.set(Trait::MutationRate, 0.0);
        let before = genome.clone();
        for _ in 0..200 {
            assert_eq!(genome.mutate(&mut rng), None);
        }
        assert_eq!(genome, before);
    }

    #[test]
    fn test_certain_mutation_changes_one_trait() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut genome = Genome::from_seed(&GenomeSeed::uniform(1.0));
        let before = genome.clone();
        let changed = genome.mutate(&mut rng).expect("rate 1.0 always mutates");

        for t in Trait::ALL {
            let delta = (genome.get(t) - before.get(t)).abs();
            if t == changed {
                assert!(delta <= Genome::MUTATION_STEP);
            } else {
                assert_eq!(delta, 0.0);
            }
        }
    }

    #[test]
    fn test_mutation_is_deterministic_for_fixed_seed() {
        let mut a = Genome::new();
        let mut b = Genome::new();
        let mut rng_a = ChaCha8Rng::seed_from_u64(123);
        let mut rng_b = ChaCha8Rng::seed_from_u64(123);
        for _ in 0..100 {
            a.mutate(&mut rng_a);
            b.mutate(&mut rng_b);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_mutation_is_not_clamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut genome = Genome::from_seed(&GenomeSeed::uniform(1.0));
        // Drift upward until something crosses 1.0; a clamp would make this impossible.
        let mut crossed = false;
        for _ in 0..5_000 {
            genome.mutate(&mut rng);
            if genome.iter().any(|(_, v)| v > 1.0) {
                crossed = true;
                break;
            }
        }
        assert!(crossed);
    }

    #[test]
    fn test_draw_kind_follows_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut genome = Genome::new();
        genome.set(Trait::LeafRate, 0.0);
        genome.set(Trait::RootRate, -0.3);
        genome.set(Trait::RadioRate, 0.0);
        genome.set(Trait::NewbornRate, 0.4);
        for _ in 0..100 {
            assert_eq!(genome.draw_kind(&mut rng), Some(OrganismKind::Newborn));
        }

        genome.set(Trait::NewbornRate, 0.0);
        assert_eq!(genome.draw_kind(&mut rng), None);
    }

    proptest! {
        #[test]
        fn prop_single_mutation_is_bounded(seed in any::<u64>(), start in 0.0f64..1.0) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut genome = Genome::from_seed(&GenomeSeed::uniform(start));
            genome.set(Trait::MutationRate, 1.0);
            let before = genome.clone();
            genome.mutate(&mut rng);
            for (t, value) in genome.iter() {
                prop_assert!((value - before.get(t)).abs() <= Genome::MUTATION_STEP + 1e-12);
            }
        }
    }
}
