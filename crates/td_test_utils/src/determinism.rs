//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays, balance tuning and bug reports all rely on a seed reproducing
//! the same game. Sources of non-determinism include:
//!
//! - **Floating-point math**: positions are integer sub-cell units and range
//!   queries use [`td_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Live enemies are kept in id order.
//!
//! - **System randomness**: wave composition and map generation only draw
//!   from seeded `ChaCha8Rng`s.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: movement, policy and generator determinism
//! 2. **Property tests**: random seeds and maps must still reproduce
//! 3. **Integration tests**: full campaigns are reproducible
//! 4. **Parallel tests**: running N orchestrators on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use td_core::map::{GameMap, MapConfig};
use td_core::movement::PathNavigator;
use td_core::spawner::SpawnOrchestrator;

use crate::fixtures::campaign_step;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use td_test_utils::determinism::verify_determinism;
/// use td_test_utils::fixtures::{campaign_step, sample_orchestrator};
///
/// let result = verify_determinism(
///     5,   // Run 5 times
///     300, // 300 ticks each
///     || sample_orchestrator(7),
///     |orch| { campaign_step(orch); },
///     |orch| orch.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a campaign twice from the same setup and compare final hashes.
///
/// Waves are started back to back with [`campaign_step`].
pub fn verify_campaign_determinism<N, F>(setup_fn: F, num_ticks: u64) -> bool
where
    N: PathNavigator,
    F: Fn() -> SpawnOrchestrator<N>,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |orch| {
            campaign_step(orch);
        },
        SpawnOrchestrator::state_hash,
    )
    .is_deterministic
}

/// Result of parallel campaign runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks each run simulated.
    pub ticks: u64,
    /// Number of runs.
    pub num_runs: usize,
}

impl ParallelRunResult {
    /// Check if all runs produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all runs matched.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel campaigns diverged!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_runs,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N campaigns on scoped threads and collect final hashes.
///
/// Each orchestrator is built and driven inside its own thread, so the
/// orchestrator itself need not be `Send`.
///
/// # Panics
///
/// Panics if a campaign thread panics.
pub fn run_parallel_campaigns<N, F>(
    setup_fn: F,
    num_runs: usize,
    num_ticks: u64,
) -> ParallelRunResult
where
    N: PathNavigator,
    F: Fn() -> SpawnOrchestrator<N> + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut orch = setup_fn();
                    for _ in 0..num_ticks {
                        campaign_step(&mut orch);
                    }
                    orch.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelRunResult {
        hashes,
        ticks: num_ticks,
        num_runs,
    }
}

/// Compare two campaign runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<N, F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    N: PathNavigator,
    F: Fn() -> SpawnOrchestrator<N>,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        campaign_step(&mut first);
        campaign_step(&mut second);

        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a generated map survives a RON round trip unchanged.
pub fn verify_map_roundtrip(config: &MapConfig) -> bool {
    let Ok(map) = GameMap::from_config(config) else {
        return false;
    };
    let Ok(text) = map.to_ron() else {
        return false;
    };
    GameMap::from_ron(&text).is_ok_and(|restored| restored == map)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of maps, movement and waves.
pub mod strategies {
    use proptest::prelude::*;
    use td_core::data::{EnemyArchetype, EnemyKind, EnemyLevel, EnemyType};
    use td_core::map::MapConfig;
    use td_core::math::{LogicalPosition, SCALING_FACTOR};

    /// Generate a map configuration with sides from 2 to 30 cells.
    pub fn arb_map_config() -> impl Strategy<Value = MapConfig> {
        (2u32..=30, 2u32..=30, any::<u64>())
            .prop_map(|(w, h, seed)| MapConfig::default().with_size(w, h).with_seed(seed))
    }

    /// Generate a logical position anywhere, including negative coordinates.
    pub fn arb_position() -> impl Strategy<Value = LogicalPosition> {
        (-100_000i32..100_000, -100_000i32..100_000)
            .prop_map(|(x, y)| LogicalPosition::new(x, y))
    }

    /// Generate a travel distance of up to three cells.
    pub fn arb_travel_distance() -> impl Strategy<Value = i32> {
        0..=3 * SCALING_FACTOR
    }

    /// Generate an enemy kind.
    pub fn arb_enemy_kind() -> impl Strategy<Value = EnemyKind> {
        (
            proptest::sample::select(EnemyLevel::ALL.to_vec()),
            proptest::sample::select(EnemyArchetype::ALL.to_vec()),
        )
            .prop_map(|(level, archetype)| EnemyKind::new(level, archetype))
    }

    /// Generate a valid enemy type.
    pub fn arb_enemy_type() -> impl Strategy<Value = EnemyType> {
        (arb_enemy_kind(), 1u32..1000, 1i32..60, 1u64..100).prop_map(
            |(kind, max_hp, speed, power)| EnemyType {
                kind,
                max_hp,
                speed,
                power,
            },
        )
    }

    /// Generate a list of enemy types with distinct kinds.
    pub fn arb_enemy_types(max_types: usize) -> impl Strategy<Value = Vec<EnemyType>> {
        proptest::collection::vec(arb_enemy_type(), 1..max_types).prop_map(|mut types| {
            types.sort_by_key(|t| t.kind);
            types.dedup_by_key(|t| t.kind);
            types
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_generator, sample_orchestrator, straight_map, LineNavigator};
    use proptest::prelude::*;
    use td_core::data::EnemyCatalogue;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_non_determinism() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_campaign_on_winding_map() {
        assert!(verify_campaign_determinism(|| sample_orchestrator(7), 400));
    }

    #[test]
    fn test_campaign_on_line() {
        assert!(verify_campaign_determinism(
            || SpawnOrchestrator::new(LineNavigator::new(300), sample_generator(), 3),
            400
        ));
    }

    #[test]
    fn test_parallel_campaigns_match() {
        run_parallel_campaigns(
            || SpawnOrchestrator::new(straight_map(10, 5), sample_generator(), 11),
            4,
            300,
        )
        .assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| sample_orchestrator(5), 200), None);
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1, "wave")), compute_hash(&(1, "wave")));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_generated_maps_roundtrip(config in strategies::arb_map_config()) {
            prop_assert!(verify_map_roundtrip(&config));
        }

        #[test]
        fn prop_catalogue_accepts_generated_types(types in strategies::arb_enemy_types(10)) {
            let catalogue = EnemyCatalogue::new(types.clone()).unwrap();
            prop_assert_eq!(catalogue.len(), types.len());
        }
    }
}
