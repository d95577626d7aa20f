//! Data-driven enemy definitions.
//!
//! **Note:** This module contains no IO - definitions are parsed from
//! strings. File loading is handled by `td_tools`.

mod enemy_data;

pub use enemy_data::{EnemyArchetype, EnemyCatalogue, EnemyKind, EnemyLevel, EnemyType};
