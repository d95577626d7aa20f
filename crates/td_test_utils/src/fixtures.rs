//! Test fixtures and helpers.
//!
//! Sample configurations, hand-built maps and a stub navigator for
//! consistent testing.

use fixed::types::I32F32;
use td_core::data::EnemyCatalogue;
use td_core::error::Result;
use td_core::map::GameMap;
use td_core::math::{CellPos, Direction, LogicalPosition};
use td_core::movement::PathNavigator;
use td_core::spawner::{SpawnOrchestrator, TickEvents};
use td_core::waves::{WaveGenerator, WavePolicy};

/// Enemy catalogue covering the first two levels.
pub const SAMPLE_CATALOGUE_JSON: &str = r#"[
    {"type": "IA", "max_hp": 100, "speed": 10, "power": 10},
    {"type": "IB", "max_hp": 60, "speed": 20, "power": 15},
    {"type": "IC", "max_hp": 200, "speed": 5, "power": 20},
    {"type": "IIA", "max_hp": 400, "speed": 12, "power": 45},
    {"type": "IIB", "max_hp": 250, "speed": 25, "power": 50}
]"#;

/// Wave policy that unlocks stronger enemies and speeds up spawning.
pub const SAMPLE_WAVES_JSON: &str = r#"[
    {"wave": 1, "power_increment": 10, "rate": 2, "types": ["IA"]},
    {"wave": 3, "types": ["IB"]},
    {"wave": 5, "power_increment": 25, "types": ["IC"]},
    {"wave": 8, "rate": 1, "types": ["IIA", "IIB"]}
]"#;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Parsed [`SAMPLE_CATALOGUE_JSON`].
///
/// # Panics
///
/// Never, the sample is valid.
#[must_use]
pub fn sample_catalogue() -> EnemyCatalogue {
    EnemyCatalogue::from_json(SAMPLE_CATALOGUE_JSON).expect("sample catalogue is valid")
}

/// Parsed [`SAMPLE_WAVES_JSON`] against [`sample_catalogue`].
///
/// # Panics
///
/// Never, the sample is valid.
#[must_use]
pub fn sample_policy() -> WavePolicy {
    WavePolicy::from_json(SAMPLE_WAVES_JSON, &sample_catalogue()).expect("sample waves are valid")
}

/// Generator over the sample policy and catalogue.
#[must_use]
pub fn sample_generator() -> WaveGenerator {
    WaveGenerator::new(sample_policy(), sample_catalogue())
}

/// Map whose path runs straight east along the middle row.
///
/// # Panics
///
/// Panics if `width` or `height` is zero.
#[must_use]
pub fn straight_map(width: u32, height: u32) -> GameMap {
    let row = (height / 2) as i32;
    let route: Vec<_> = (0..width as i32).map(|x| CellPos::new(x, row)).collect();
    GameMap::from_route(width, height, &route, Direction::East, Direction::East)
        .expect("straight route is valid")
}

/// 4x4 map with a route that turns south, east, north and east again.
///
/// ```text
/// P . P P
/// P . P .
/// P P P .
/// . . . .
/// ```
///
/// # Panics
///
/// Never, the route is valid.
#[must_use]
pub fn winding_map() -> GameMap {
    let route = [
        (0, 0),
        (0, 1),
        (0, 2),
        (1, 2),
        (2, 2),
        (2, 1),
        (2, 0),
        (3, 0),
    ]
    .map(|(x, y)| CellPos::new(x, y));
    GameMap::from_route(4, 4, &route, Direction::East, Direction::East)
        .expect("winding route is valid")
}

/// Navigator along a straight eastward line, for orchestrator tests that do
/// not need a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNavigator {
    /// Travel from spawn to end.
    pub length: i32,
}

impl LineNavigator {
    /// Line of `length` units.
    #[must_use]
    pub const fn new(length: i32) -> Self {
        Self { length }
    }
}

impl PathNavigator for LineNavigator {
    fn spawn_position(&self) -> LogicalPosition {
        LogicalPosition::new(0, 0)
    }

    fn next_position(
        &self,
        pos: LogicalPosition,
        distance: i32,
    ) -> Result<Option<LogicalPosition>> {
        let x = pos.x + distance;
        Ok((x < self.length).then_some(LogicalPosition::new(x, pos.y)))
    }
}

/// Orchestrator on [`winding_map`] with the sample configuration.
#[must_use]
pub fn sample_orchestrator(seed: u64) -> SpawnOrchestrator<GameMap> {
    SpawnOrchestrator::new(winding_map(), sample_generator(), seed)
}

/// One tick of a campaign: start the next wave when the previous one is
/// over, then update.
///
/// # Panics
///
/// Panics if the orchestrator rejects the wave or the tick.
pub fn campaign_step<N: PathNavigator>(orchestrator: &mut SpawnOrchestrator<N>) -> TickEvents {
    if !orchestrator.is_wave_active() {
        let next = orchestrator.current_wave().map_or(1, |wave| wave + 1);
        orchestrator.spawn(next).expect("no wave is active");
        tracing::debug!(wave = next, "Campaign started wave");
    }
    orchestrator.update().expect("tick succeeds")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_load() {
        assert_eq!(sample_catalogue().len(), 5);
        assert_eq!(sample_policy().cadence(8).unwrap(), 1);
    }

    #[test]
    fn test_hand_built_maps() {
        assert_eq!(straight_map(5, 3).path_len(), 5);
        let map = winding_map();
        assert_eq!(map.path_len(), 8);
        assert_eq!(map.spawn_vector().distance_to_end, 700);
    }

    #[test]
    fn test_campaign_advances_waves() {
        let mut orchestrator =
            SpawnOrchestrator::new(LineNavigator::new(50), sample_generator(), 1);
        for _ in 0..200 {
            campaign_step(&mut orchestrator);
        }
        assert!(orchestrator.current_wave().unwrap() > 1);
    }
}
