//! Live enemy collection and the tick loop that feeds it.
//!
//! Each [`SpawnOrchestrator::update`] runs the same fixed order:
//!
//! 1. Movement: next positions for every live enemy are computed from a
//!    snapshot, then applied in id order. Enemies that reach the end are
//!    removed and reported.
//! 2. Spawning: while a wave is active, its next event is pulled and any
//!    enemy it yields appears at the spawn position.
//!
//! Generation finishing (`Spawning` back to `Idle`) is separate from the
//! wave being cleared; [`SpawnOrchestrator::is_wave_active`] covers both.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::{EnemyKind, EnemyType};
use crate::error::{GameError, Result};
use crate::math::{Fixed, LogicalPosition, Vec2Fixed};
use crate::movement::PathNavigator;
use crate::waves::{Wave, WaveGenerator};

/// Unique identifier of a live enemy. Never reused.
pub type EnemyId = u64;

/// A live enemy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    position: LogicalPosition,
    hp: u32,
    max_hp: u32,
    speed: i32,
    power: u64,
}

impl Enemy {
    fn spawn(id: EnemyId, enemy_type: &EnemyType, position: LogicalPosition) -> Self {
        Self {
            id,
            kind: enemy_type.kind,
            position,
            hp: enemy_type.max_hp,
            max_hp: enemy_type.max_hp,
            speed: enemy_type.speed,
            power: enemy_type.power,
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Type identity.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> LogicalPosition {
        self.position
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        self.hp
    }

    /// Hit points at spawn.
    #[must_use]
    pub const fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Travel per tick.
    #[must_use]
    pub const fn speed(&self) -> i32 {
        self.speed
    }

    /// Power value, for scoring.
    #[must_use]
    pub const fn power(&self) -> u64 {
        self.power
    }
}

/// Why an enemy left the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Hit points dropped to zero.
    Killed,
    /// Walked into the end cell.
    ReachedEnd,
}

/// Notification sent when an enemy is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathEvent {
    /// The removed enemy.
    pub enemy: EnemyId,
    /// Its type.
    pub kind: EnemyKind,
    /// Its power value.
    pub power: u64,
    /// Why it was removed.
    pub cause: DeathCause,
    /// Last position it held.
    pub position: LogicalPosition,
}

/// Events generated during a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Enemies removed this tick.
    pub deaths: Vec<DeathEvent>,
    /// Enemies spawned this tick.
    pub spawned: Vec<EnemyId>,
}

/// Whether a wave is still handing out enemies.
#[derive(Debug, Clone, Default)]
pub enum SpawnState {
    /// No wave is generating.
    #[default]
    Idle,
    /// A wave still has spawns pending.
    Spawning(Wave),
}

type DeathObserver = Box<dyn FnMut(&DeathEvent)>;

/// Owns the live enemies, drives ticks and reports deaths.
pub struct SpawnOrchestrator<N: PathNavigator> {
    navigator: N,
    generator: WaveGenerator,
    rng: ChaCha8Rng,
    state: SpawnState,
    /// Ordered by id so iteration is deterministic.
    enemies: BTreeMap<EnemyId, Enemy>,
    next_id: EnemyId,
    current_wave: Option<u32>,
    tick: u64,
    observers: Vec<DeathObserver>,
}

impl<N: PathNavigator> fmt::Debug for SpawnOrchestrator<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnOrchestrator")
            .field("state", &self.state)
            .field("enemies", &self.enemies.len())
            .field("current_wave", &self.current_wave)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

impl<N: PathNavigator> SpawnOrchestrator<N> {
    /// Create an idle orchestrator. `seed` drives wave composition.
    pub fn new(navigator: N, generator: WaveGenerator, seed: u64) -> Self {
        Self {
            navigator,
            generator,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: SpawnState::Idle,
            enemies: BTreeMap::new(),
            next_id: 1,
            current_wave: None,
            tick: 0,
            observers: Vec::new(),
        }
    }

    /// Start generating wave `wave`.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] while a wave is still spawning or any of
    /// its enemies is alive; [`GameError::InvalidArgument`] for wave 0.
    pub fn spawn(&mut self, wave: u32) -> Result<()> {
        if self.is_wave_active() {
            return Err(GameError::InvalidState(format!(
                "cannot start wave {wave}: wave {} is still active",
                self.current_wave.unwrap_or_default()
            )));
        }
        let composed = self.generator.generate(wave, &mut self.rng)?;
        tracing::debug!(
            wave,
            budget = composed.budget(),
            cadence = composed.cadence(),
            "Starting wave"
        );
        self.state = SpawnState::Spawning(composed);
        self.current_wave = Some(wave);
        Ok(())
    }

    /// Advance the simulation by one tick.
    pub fn update(&mut self) -> Result<TickEvents> {
        let mut events = TickEvents::default();

        // 1. Movement, computed from a snapshot of current positions
        let moves = self
            .enemies
            .values()
            .map(|enemy| {
                self.navigator
                    .next_position(enemy.position, enemy.speed)
                    .map(|next| (enemy.id, next))
            })
            .collect::<Result<Vec<_>>>()?;

        for (id, next) in moves {
            match next {
                Some(position) => {
                    if let Some(enemy) = self.enemies.get_mut(&id) {
                        enemy.position = position;
                    }
                }
                None => {
                    if let Some(enemy) = self.enemies.remove(&id) {
                        events
                            .deaths
                            .push(self.report_death(&enemy, DeathCause::ReachedEnd));
                    }
                }
            }
        }

        // 2. Spawning
        if let SpawnState::Spawning(wave) = &mut self.state {
            let event = wave.next().flatten();
            let drained = !wave.has_next();
            if let Some(enemy_type) = event {
                events.spawned.push(self.add_enemy(&enemy_type));
            }
            if drained {
                tracing::debug!(
                    wave = self.current_wave,
                    tick = self.tick,
                    "Wave finished spawning"
                );
                self.state = SpawnState::Idle;
            }
        }

        self.tick += 1;
        Ok(events)
    }

    /// Deal `amount` damage to an enemy.
    ///
    /// An enemy brought to zero hit points is removed at once, death
    /// observers are notified and the event is returned.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] if no live enemy has this id.
    pub fn hurt(&mut self, id: EnemyId, amount: u32) -> Result<Option<DeathEvent>> {
        let enemy = self
            .enemies
            .get_mut(&id)
            .ok_or_else(|| GameError::InvalidState(format!("enemy {id} is not alive")))?;
        enemy.hp = enemy.hp.saturating_sub(amount);
        if enemy.hp > 0 {
            return Ok(None);
        }
        let Some(enemy) = self.enemies.remove(&id) else {
            return Ok(None);
        };
        Ok(Some(self.report_death(&enemy, DeathCause::Killed)))
    }

    /// Register a callback run for every removed enemy.
    pub fn add_death_observer(&mut self, observer: impl FnMut(&DeathEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Live enemies in id order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    /// Look up a live enemy.
    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Live enemies within `radius` of `center`, both in cell units.
    pub fn enemies_within(
        &self,
        center: Vec2Fixed,
        radius: Fixed,
    ) -> impl Iterator<Item = &Enemy> {
        self.enemies
            .values()
            .filter(move |enemy| enemy.position.to_cells().within(center, radius))
    }

    /// Whether a wave is still handing out enemies.
    #[must_use]
    pub const fn is_spawning(&self) -> bool {
        matches!(self.state, SpawnState::Spawning(_))
    }

    /// Whether the current wave is still spawning or has enemies alive.
    #[must_use]
    pub fn is_wave_active(&self) -> bool {
        self.is_spawning() || !self.enemies.is_empty()
    }

    /// The wave most recently started.
    #[must_use]
    pub const fn current_wave(&self) -> Option<u32> {
        self.current_wave
    }

    /// Current generation state.
    #[must_use]
    pub const fn state(&self) -> &SpawnState {
        &self.state
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Route the enemies follow.
    #[must_use]
    pub const fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Deterministic hash of the simulation state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.current_wave.hash(&mut hasher);
        self.next_id.hash(&mut hasher);

        match &self.state {
            SpawnState::Idle => 0u8.hash(&mut hasher),
            SpawnState::Spawning(wave) => {
                1u8.hash(&mut hasher);
                wave.wave_number().hash(&mut hasher);
                wave.remaining().hash(&mut hasher);
            }
        }

        self.enemies.len().hash(&mut hasher);
        for enemy in self.enemies.values() {
            enemy.id.hash(&mut hasher);
            enemy.kind.hash(&mut hasher);
            enemy.position.hash(&mut hasher);
            enemy.hp.hash(&mut hasher);
        }

        hasher.finish()
    }

    fn add_enemy(&mut self, enemy_type: &EnemyType) -> EnemyId {
        let id = self.next_id;
        self.next_id += 1;
        let enemy = Enemy::spawn(id, enemy_type, self.navigator.spawn_position());
        tracing::debug!(id, kind = %enemy.kind, tick = self.tick, "Spawned enemy");
        self.enemies.insert(id, enemy);
        id
    }

    fn report_death(&mut self, enemy: &Enemy, cause: DeathCause) -> DeathEvent {
        let event = DeathEvent {
            enemy: enemy.id,
            kind: enemy.kind,
            power: enemy.power,
            cause,
            position: enemy.position,
        };
        tracing::debug!(id = enemy.id, ?cause, tick = self.tick, "Enemy removed");
        for observer in &mut self.observers {
            observer(&event);
        }
        event
    }
}
