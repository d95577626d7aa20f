//! Wave-indexed rules: which enemies may appear, how much power a wave
//! gets and how often enemies spawn.
//!
//! Each dimension is a sparse map of change points. A value defined at
//! wave `n` holds for every wave from `n` until the next change point.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::{EnemyCatalogue, EnemyKind, EnemyType};
use crate::error::{GameError, Result};

/// One entry of the wave configuration.
///
/// Absent fields mean the dimension does not change at this wave. Numbers
/// are signed here so that out-of-range values reach validation instead of
/// failing the parse.
///
/// # Example JSON
///
/// ```json
/// {"wave": 1, "power_increment": 10, "rate": 2, "types": ["IA"]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveRecord {
    /// Wave this record takes effect at.
    pub wave: i64,
    /// Power added per wave from here on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_increment: Option<i64>,
    /// Ticks between spawns from here on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<i64>,
    /// Enemy kinds that become eligible here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

/// Set of enemy kinds allowed to appear in a wave.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eligibility {
    kinds: BTreeSet<EnemyKind>,
}

impl Eligibility {
    /// Whether `kind` may appear.
    #[must_use]
    pub fn allows(&self, kind: EnemyKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Whether an enemy type may appear.
    #[must_use]
    pub fn allows_type(&self, enemy: &EnemyType) -> bool {
        self.allows(enemy.kind)
    }

    /// Allowed kinds in order.
    pub fn kinds(&self) -> impl Iterator<Item = EnemyKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Whether every kind allowed here is also allowed by `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.kinds.is_subset(&other.kinds)
    }
}

/// Validated wave policy.
///
/// Immutable after construction. The cumulative power at every increment
/// change point is computed up front, so queries for any wave number are
/// a floor lookup plus one multiplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavePolicy {
    /// Union of allowed kinds at each change point.
    eligibility: BTreeMap<u32, Eligibility>,
    increments: BTreeMap<u32, u64>,
    cadences: BTreeMap<u32, u32>,
    /// Cumulative power at each increment change point.
    anchors: BTreeMap<u32, u64>,
}

fn floor_lookup<V>(map: &BTreeMap<u32, V>, wave: u32) -> Result<(u32, &V)> {
    map.range(..=wave)
        .next_back()
        .map(|(&at, value)| (at, value))
        .ok_or_else(|| GameError::InvalidArgument(format!("no wave rule covers wave {wave}")))
}

fn check_wave(wave: u32) -> Result<()> {
    if wave < 1 {
        return Err(GameError::InvalidArgument(format!(
            "wave numbers start at 1, got {wave}"
        )));
    }
    Ok(())
}

impl WavePolicy {
    /// Parse and validate a JSON array of [`WaveRecord`]s.
    pub fn from_json(text: &str, catalogue: &EnemyCatalogue) -> Result<Self> {
        let records: Vec<WaveRecord> =
            serde_json::from_str(text).map_err(|source| GameError::ConfigParse {
                context: "wave".into(),
                source,
            })?;
        Self::from_records(&records, catalogue)
    }

    /// Validate records and build the policy.
    ///
    /// Every violation is collected; nothing is built unless there are none.
    /// When several records set the same dimension for one wave, the last
    /// one wins.
    pub fn from_records(records: &[WaveRecord], catalogue: &EnemyCatalogue) -> Result<Self> {
        let mut errors = Vec::new();
        let mut filters: BTreeMap<u32, BTreeSet<EnemyKind>> = BTreeMap::new();
        let mut increments = BTreeMap::new();
        let mut cadences = BTreeMap::new();

        for record in records {
            let Ok(wave) = u32::try_from(record.wave) else {
                errors.push(format!("Wave number {} is out of range", record.wave));
                continue;
            };
            if wave < 1 {
                errors.push(format!("Wave number {wave} is below 1"));
                continue;
            }

            if let Some(increment) = record.power_increment {
                match u64::try_from(increment) {
                    Ok(value) => {
                        if increments.insert(wave, value).is_some() {
                            tracing::debug!(wave, "Later power_increment replaces earlier one");
                        }
                    }
                    Err(_) => errors.push(format!(
                        "Wave {wave} has negative power_increment {increment}"
                    )),
                }
            }

            if let Some(rate) = record.rate {
                match u32::try_from(rate) {
                    Ok(value) => {
                        if cadences.insert(wave, value).is_some() {
                            tracing::debug!(wave, "Later rate replaces earlier one");
                        }
                        if value == 0 {
                            tracing::warn!(wave, "Rate 0 spawns on every tick");
                        }
                    }
                    Err(_) => errors.push(format!("Wave {wave} has invalid rate {rate}")),
                }
            }

            if let Some(tokens) = &record.types {
                let filter = filters.entry(wave).or_default();
                if !filter.is_empty() {
                    tracing::debug!(wave, "Later types replace earlier ones");
                    filter.clear();
                }
                for token in tokens {
                    match token.parse::<EnemyKind>() {
                        Ok(kind) => {
                            if !catalogue.contains(kind) {
                                tracing::warn!(wave, %kind, "Eligible kind has no catalogue entry");
                            }
                            filter.insert(kind);
                        }
                        Err(_) => {
                            errors.push(format!("Wave {wave} names unknown enemy type {token:?}"));
                        }
                    }
                }
            }
        }

        if !increments.contains_key(&1) {
            errors.push("Wave 1 must define power_increment".to_string());
        }
        if !cadences.contains_key(&1) {
            errors.push("Wave 1 must define rate".to_string());
        }
        match filters.get(&1) {
            None => errors.push("Wave 1 must define types".to_string()),
            Some(first) if !first.iter().any(|kind| catalogue.contains(*kind)) => {
                errors.push("Wave 1 types match no known enemy type".to_string());
            }
            Some(_) => {}
        }

        if !errors.is_empty() {
            return Err(GameError::config("wave", errors));
        }

        let policy = Self {
            eligibility: accumulate_eligibility(filters),
            anchors: power_anchors(&increments),
            increments,
            cadences,
        };
        tracing::info!(
            eligibility_changes = policy.eligibility.len(),
            power_changes = policy.increments.len(),
            rate_changes = policy.cadences.len(),
            "Loaded wave policy"
        );
        Ok(policy)
    }

    /// Kinds allowed in `wave`: the union of every filter defined at or
    /// before it.
    pub fn eligibility(&self, wave: u32) -> Result<&Eligibility> {
        check_wave(wave)?;
        floor_lookup(&self.eligibility, wave).map(|(_, eligibility)| eligibility)
    }

    /// Power accumulated before `wave`: zero at wave 1, growing by the
    /// increment in effect at each step.
    pub fn cumulative_power(&self, wave: u32) -> Result<u64> {
        check_wave(wave)?;
        self.power_at(u64::from(wave))
    }

    /// Power a generator may spend on `wave`, which is the cumulative power
    /// through the end of that wave.
    pub fn wave_budget(&self, wave: u32) -> Result<u64> {
        check_wave(wave)?;
        self.power_at(u64::from(wave) + 1)
    }

    /// Power increment in effect at `wave`.
    pub fn power_increment(&self, wave: u32) -> Result<u64> {
        check_wave(wave)?;
        floor_lookup(&self.increments, wave).map(|(_, increment)| *increment)
    }

    /// Ticks between spawns in `wave`.
    pub fn cadence(&self, wave: u32) -> Result<u32> {
        check_wave(wave)?;
        floor_lookup(&self.cadences, wave).map(|(_, cadence)| *cadence)
    }

    fn power_at(&self, wave: u64) -> Result<u64> {
        let floor = u32::try_from(wave).unwrap_or(u32::MAX);
        let (at, increment) = floor_lookup(&self.increments, floor)?;
        let anchor = self.anchors.get(&at).copied().unwrap_or_default();
        let steps = wave - u64::from(at);
        Ok(anchor.saturating_add(increment.saturating_mul(steps)))
    }
}

/// Turn per-wave filters into cumulative unions.
fn accumulate_eligibility(
    filters: BTreeMap<u32, BTreeSet<EnemyKind>>,
) -> BTreeMap<u32, Eligibility> {
    let mut union = BTreeSet::new();
    filters
        .into_iter()
        .map(|(wave, kinds)| {
            union.extend(kinds);
            (
                wave,
                Eligibility {
                    kinds: union.clone(),
                },
            )
        })
        .collect()
}

/// Cumulative power at each change point, starting from zero at wave 1.
fn power_anchors(increments: &BTreeMap<u32, u64>) -> BTreeMap<u32, u64> {
    let mut anchors = BTreeMap::new();
    let mut previous: Option<(u32, u64, u64)> = None;
    for (&wave, &increment) in increments {
        let power = match previous {
            None => 0,
            Some((at, anchor, rate)) => {
                anchor.saturating_add(rate.saturating_mul(u64::from(wave - at)))
            }
        };
        anchors.insert(wave, power);
        previous = Some((wave, power, increment));
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalogue() -> EnemyCatalogue {
        EnemyCatalogue::from_json(
            r#"[{"type": "IA", "max_hp": 100, "speed": 10, "power": 10},
                {"type": "IB", "max_hp": 60, "speed": 20, "power": 15},
                {"type": "IIA", "max_hp": 300, "speed": 8, "power": 40}]"#,
        )
        .unwrap()
    }

    fn policy(json: &str) -> WavePolicy {
        WavePolicy::from_json(json, &catalogue()).unwrap()
    }

    fn config_errors(json: &str) -> Vec<String> {
        match WavePolicy::from_json(json, &catalogue()) {
            Err(GameError::Config { errors, .. }) => errors,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_first_wave_scenario() {
        let p = policy(r#"[{"wave": 1, "power_increment": 10, "rate": 2, "types": ["IA"]}]"#);
        assert_eq!(p.cumulative_power(1).unwrap(), 0);
        assert_eq!(p.cumulative_power(2).unwrap(), 10);
        assert_eq!(p.wave_budget(1).unwrap(), 10);
        assert_eq!(p.cadence(1).unwrap(), 2);
        assert!(p.eligibility(1).unwrap().allows("IA".parse().unwrap()));
        assert!(!p.eligibility(1).unwrap().allows("IB".parse().unwrap()));
    }

    #[test]
    fn test_power_is_piecewise_linear() {
        let p = policy(
            r#"[{"wave": 1, "power_increment": 10, "rate": 3, "types": ["IA"]},
                {"wave": 4, "power_increment": 25},
                {"wave": 6, "power_increment": 0}]"#,
        );
        let expected = [0, 10, 20, 30, 55, 80, 80, 80];
        for (i, want) in expected.into_iter().enumerate() {
            assert_eq!(p.cumulative_power(i as u32 + 1).unwrap(), want, "wave {}", i + 1);
        }
        assert_eq!(p.power_increment(5).unwrap(), 25);
        assert_eq!(p.power_increment(100).unwrap(), 0);
    }

    #[test]
    fn test_large_wave_numbers_saturate() {
        let p = policy(
            r#"[{"wave": 1, "power_increment": 9223372036854775807, "rate": 1, "types": ["IA"]}]"#,
        );
        assert_eq!(p.cumulative_power(2).unwrap(), 9_223_372_036_854_775_807);
        assert_eq!(p.cumulative_power(u32::MAX).unwrap(), u64::MAX);
        assert_eq!(p.wave_budget(u32::MAX).unwrap(), u64::MAX);
    }

    #[test]
    fn test_eligibility_accumulates() {
        let p = policy(
            r#"[{"wave": 1, "power_increment": 10, "rate": 2, "types": ["IA"]},
                {"wave": 3, "types": ["IB"]},
                {"wave": 5, "types": ["IIA"], "rate": 1}]"#,
        );
        let ia = "IA".parse().unwrap();
        let ib = "IB".parse().unwrap();
        let iia = "IIA".parse().unwrap();
        assert!(!p.eligibility(2).unwrap().allows(ib));
        assert!(p.eligibility(3).unwrap().allows(ia));
        assert!(p.eligibility(3).unwrap().allows(ib));
        assert!(p.eligibility(7).unwrap().allows(iia));
        assert_eq!(p.cadence(4).unwrap(), 2);
        assert_eq!(p.cadence(5).unwrap(), 1);
    }

    #[test]
    fn test_wave_zero_rejected() {
        let p = policy(r#"[{"wave": 1, "power_increment": 10, "rate": 2, "types": ["IA"]}]"#);
        assert!(matches!(p.eligibility(0), Err(GameError::InvalidArgument(_))));
        assert!(matches!(p.cumulative_power(0), Err(GameError::InvalidArgument(_))));
        assert!(matches!(p.cadence(0), Err(GameError::InvalidArgument(_))));
        assert!(matches!(p.wave_budget(0), Err(GameError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_first_wave_reports_all_dimensions() {
        let errors = config_errors(r#"[{"wave": 2, "power_increment": 10}]"#);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_every_violation_reported() {
        let errors = config_errors(
            r#"[{"wave": 1, "power_increment": -1, "rate": -2, "types": ["IA", "ZZ"]},
                {"wave": 0, "rate": 1}]"#,
        );
        assert!(errors.iter().any(|e| e.contains("negative power_increment")));
        assert!(errors.iter().any(|e| e.contains("invalid rate")));
        assert!(errors.iter().any(|e| e.contains("\"ZZ\"")));
        assert!(errors.iter().any(|e| e.contains("below 1")));
    }

    #[test]
    fn test_repeated_dimension_last_record_wins() {
        let p = policy(
            r#"[{"wave": 1, "power_increment": 10, "rate": 2, "types": ["IA"]},
                {"wave": 3, "rate": 4, "types": ["IIA"]},
                {"wave": 3, "rate": 1, "power_increment": 5},
                {"wave": 3, "types": ["IB"]}]"#,
        );
        assert_eq!(p.cadence(3).unwrap(), 1);
        assert_eq!(p.power_increment(3).unwrap(), 5);
        let third = p.eligibility(3).unwrap();
        assert!(third.allows("IB".parse().unwrap()));
        assert!(!third.allows("IIA".parse().unwrap()));
    }

    #[test]
    fn test_first_wave_needs_known_type() {
        let errors = config_errors(
            r#"[{"wave": 1, "power_increment": 10, "rate": 2, "types": ["VC"]}]"#,
        );
        assert_eq!(errors, ["Wave 1 types match no known enemy type"]);
    }

    #[test]
    fn test_malformed_json() {
        let err = WavePolicy::from_json("[{\"wave\": }]", &catalogue()).unwrap_err();
        assert!(matches!(err, GameError::ConfigParse { .. }));
    }

    proptest! {
        #[test]
        fn prop_power_non_decreasing_and_eligibility_grows(
            increments in prop::collection::vec((1u32..50, 0i64..1000), 0..6),
            wave in 1u32..200,
        ) {
            let mut records = vec![WaveRecord {
                wave: 1,
                power_increment: Some(7),
                rate: Some(2),
                types: Some(vec!["IA".into()]),
            }];
            let mut seen = BTreeSet::from([1]);
            for (at, increment) in increments {
                if seen.insert(at) {
                    records.push(WaveRecord {
                        wave: i64::from(at),
                        power_increment: Some(increment),
                        types: Some(vec!["IB".into()]),
                        ..WaveRecord::default()
                    });
                }
            }
            let p = WavePolicy::from_records(&records, &catalogue()).unwrap();
            let next = p.cumulative_power(wave + 1).unwrap();
            prop_assert!(p.cumulative_power(wave).unwrap() <= next);
            prop_assert_eq!(p.wave_budget(wave).unwrap(), next);
            let eligible = p.eligibility(wave).unwrap();
            prop_assert!(eligible.is_subset(p.eligibility(wave + 1).unwrap()));
        }
    }
}
