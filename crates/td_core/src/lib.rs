//! # TD Core
//!
//! Deterministic simulation core for a grid tower defense.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (all draws come from seeded `ChaCha8Rng`s)
//! - No floating-point math (integer sub-cell units, fixed-point ranges)
//!
//! ## Crate Structure
//!
//! - [`math`] - Logical positions, directions and grid arithmetic
//! - [`map`] - Grid path model and map generation
//! - [`movement`] - Advancing positions along the path
//! - [`data`] - Enemy type definitions
//! - [`waves`] - Wave policy and wave composition
//! - [`spawner`] - Live enemies and the tick loop

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod data;
pub mod error;
pub mod map;
pub mod math;
pub mod movement;
pub mod spawner;
pub mod waves;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::data::{EnemyArchetype, EnemyCatalogue, EnemyKind, EnemyLevel, EnemyType};
    pub use crate::error::{GameError, Result};
    pub use crate::map::{Cell, GameMap, MapConfig, PathCell};
    pub use crate::math::{
        CellPos, Direction, Fixed, LogicalPosition, Vec2Fixed, HALF_CELL, SCALING_FACTOR,
    };
    pub use crate::movement::{PathNavigator, PathVector};
    pub use crate::spawner::{
        DeathCause, DeathEvent, Enemy, EnemyId, SpawnOrchestrator, SpawnState, TickEvents,
    };
    pub use crate::waves::{Eligibility, Wave, WaveGenerator, WavePolicy, WaveRecord};
}
