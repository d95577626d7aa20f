//! Composes concrete waves from the policy.
//!
//! A [`Wave`] draws its enemies lazily, one per due tick, so its size is
//! bounded only by its budget.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::policy::WavePolicy;
use crate::data::{EnemyCatalogue, EnemyType};
use crate::error::Result;

/// Builds [`Wave`]s from a policy and the enemy catalogue.
#[derive(Debug, Clone)]
pub struct WaveGenerator {
    policy: WavePolicy,
    catalogue: EnemyCatalogue,
}

impl WaveGenerator {
    /// Create a generator.
    #[must_use]
    pub const fn new(policy: WavePolicy, catalogue: EnemyCatalogue) -> Self {
        Self { policy, catalogue }
    }

    /// The policy waves are built from.
    #[must_use]
    pub const fn policy(&self) -> &WavePolicy {
        &self.policy
    }

    /// The enemy types waves are built from.
    #[must_use]
    pub const fn catalogue(&self) -> &EnemyCatalogue {
        &self.catalogue
    }

    /// Start the wave for `wave`.
    ///
    /// The wave draws uniformly among eligible types that still fit the
    /// remaining budget until none does. Draws come from a generator seeded
    /// once from `rng`, so `rng` advances by the same amount for every wave.
    pub fn generate<R: Rng>(&self, wave: u32, rng: &mut R) -> Result<Wave> {
        let budget = self.policy.wave_budget(wave)?;
        let cadence = self.policy.cadence(wave)?;
        let eligibility = self.policy.eligibility(wave)?;
        let candidates: Vec<EnemyType> = self
            .catalogue
            .types()
            .filter(|enemy| eligibility.allows_type(enemy))
            .copied()
            .collect();

        tracing::debug!(wave, budget, candidates = candidates.len(), "Generated wave");
        Ok(Wave {
            number: wave,
            draws: Draws {
                candidates,
                rng: ChaCha8Rng::seed_from_u64(rng.gen()),
                remaining: budget,
            },
            cadence: cadence.max(1),
            tick: 0,
            budget,
        })
    }
}

/// The enemies a wave has yet to hand out, drawn on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draws {
    candidates: Vec<EnemyType>,
    rng: ChaCha8Rng,
    remaining: u64,
}

impl Draws {
    fn affordable(&self) -> impl Iterator<Item = &EnemyType> {
        let remaining = self.remaining;
        self.candidates.iter().filter(move |enemy| enemy.power <= remaining)
    }
}

impl Iterator for Draws {
    type Item = EnemyType;

    fn next(&mut self) -> Option<EnemyType> {
        let affordable: Vec<EnemyType> = self.affordable().copied().collect();
        let choice = *affordable.choose(&mut self.rng)?;
        self.remaining -= choice.power;
        Some(choice)
    }
}

/// One wave's spawn schedule.
///
/// Yields one event per tick: `Some(enemy)` on ticks `0, cadence,
/// 2 * cadence, ...` and `None` in between. The iterator ends right after
/// the last affordable enemy is handed out. A wave cannot be restarted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    number: u32,
    draws: Draws,
    cadence: u32,
    tick: u64,
    budget: u64,
}

impl Wave {
    /// Wave number this schedule belongs to.
    #[must_use]
    pub const fn wave_number(&self) -> u32 {
        self.number
    }

    /// Whether some eligible type still fits the remaining budget.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.draws.affordable().next().is_some()
    }

    /// Power not yet spent on enemies.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.draws.remaining
    }

    /// Ticks between spawns, at least 1.
    #[must_use]
    pub const fn cadence(&self) -> u32 {
        self.cadence
    }

    /// Power allotted to the wave.
    #[must_use]
    pub const fn budget(&self) -> u64 {
        self.budget
    }

    /// Power of the enemies handed out so far.
    #[must_use]
    pub const fn spent_power(&self) -> u64 {
        self.budget - self.draws.remaining
    }

    /// Enemies still to spawn, in order. The wave itself is not advanced.
    #[must_use]
    pub fn pending(&self) -> Draws {
        self.draws.clone()
    }
}

impl Iterator for Wave {
    type Item = Option<EnemyType>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        let due = self.tick % u64::from(self.cadence) == 0;
        self.tick += 1;
        Some(if due { self.draws.next() } else { None })
    }
}
