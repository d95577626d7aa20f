//! Enemy type definitions and the catalogue that holds them.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Difficulty tier of an enemy, written as a roman numeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyLevel {
    /// Tier one.
    I,
    /// Tier two.
    II,
    /// Tier three.
    III,
    /// Tier four.
    IV,
    /// Tier five.
    V,
}

impl EnemyLevel {
    /// All levels, weakest first.
    pub const ALL: [Self; 5] = [Self::I, Self::II, Self::III, Self::IV, Self::V];

    /// Roman numeral for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
            Self::V => "V",
        }
    }
}

/// Behavioural variant within a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyArchetype {
    /// Baseline.
    A,
    /// Second variant.
    B,
    /// Third variant.
    C,
}

impl EnemyArchetype {
    /// All archetypes.
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    const fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }
}

/// Identity of an enemy type: level plus archetype.
///
/// Written as the level numeral followed by one archetype letter, for
/// example `"IA"` or `"IVC"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnemyKind {
    /// Difficulty tier.
    pub level: EnemyLevel,
    /// Variant.
    pub archetype: EnemyArchetype,
}

impl EnemyKind {
    /// Create a kind from its parts.
    #[must_use]
    pub const fn new(level: EnemyLevel, archetype: EnemyArchetype) -> Self {
        Self { level, archetype }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.level.as_str(), self.archetype.as_char())
    }
}

impl FromStr for EnemyKind {
    type Err = GameError;

    fn from_str(token: &str) -> Result<Self> {
        let invalid = || GameError::InvalidArgument(format!("unknown enemy type token {token:?}"));
        let mut chars = token.chars();
        let archetype = match chars.next_back().ok_or_else(invalid)? {
            'A' => EnemyArchetype::A,
            'B' => EnemyArchetype::B,
            'C' => EnemyArchetype::C,
            _ => return Err(invalid()),
        };
        let level = EnemyLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == chars.as_str())
            .ok_or_else(invalid)?;
        Ok(Self { level, archetype })
    }
}

impl TryFrom<String> for EnemyKind {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<EnemyKind> for String {
    fn from(kind: EnemyKind) -> Self {
        kind.to_string()
    }
}

/// Stats of one enemy type.
///
/// # Example JSON
///
/// ```json
/// {"type": "IA", "max_hp": 100, "speed": 10, "power": 10}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemyType {
    /// Identity.
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    /// Hit points at spawn.
    pub max_hp: u32,
    /// Sub-cell units travelled per tick.
    pub speed: i32,
    /// Cost against a wave's power budget.
    pub power: u64,
}

/// All enemy types known to a game, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnemyCatalogue {
    types: BTreeMap<EnemyKind, EnemyType>,
}

impl EnemyCatalogue {
    /// Build a catalogue, rejecting it if any definition is invalid.
    pub fn new(types: Vec<EnemyType>) -> Result<Self> {
        let errors = Self::check(&types);
        if !errors.is_empty() {
            return Err(GameError::config("enemy catalogue", errors));
        }
        let catalogue = Self {
            types: types.into_iter().map(|t| (t.kind, t)).collect(),
        };
        tracing::info!(types = catalogue.len(), "Loaded enemy catalogue");
        Ok(catalogue)
    }

    /// Parse a JSON array of enemy types.
    pub fn from_json(text: &str) -> Result<Self> {
        let types: Vec<EnemyType> =
            serde_json::from_str(text).map_err(|source| GameError::ConfigParse {
                context: "enemy catalogue".into(),
                source,
            })?;
        Self::new(types)
    }

    /// Every problem in a list of definitions.
    fn check(types: &[EnemyType]) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for t in types {
            if !seen.insert(t.kind) {
                errors.push(format!("Enemy type {} is defined more than once", t.kind));
            }
            if t.max_hp == 0 {
                errors.push(format!("Enemy type {} has zero hit points", t.kind));
            }
            if t.speed <= 0 {
                errors.push(format!(
                    "Enemy type {} has non-positive speed {}",
                    t.kind, t.speed
                ));
            }
            if t.power == 0 {
                errors.push(format!("Enemy type {} has zero power", t.kind));
            }
        }
        errors
    }

    /// Look up a type by kind.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> Option<&EnemyType> {
        self.types.get(&kind)
    }

    /// Whether `kind` is defined.
    #[must_use]
    pub fn contains(&self, kind: EnemyKind) -> bool {
        self.types.contains_key(&kind)
    }

    /// All types, ordered by kind.
    pub fn types(&self) -> impl Iterator<Item = &EnemyType> {
        self.types.values()
    }

    /// Number of types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(token: &str) -> EnemyKind {
        token.parse().unwrap()
    }

    #[test]
    fn test_kind_tokens() {
        assert_eq!(
            kind("IA"),
            EnemyKind::new(EnemyLevel::I, EnemyArchetype::A)
        );
        assert_eq!(
            kind("IVC"),
            EnemyKind::new(EnemyLevel::IV, EnemyArchetype::C)
        );
        assert_eq!(kind("IIIB").to_string(), "IIIB");
        for bad in ["", "A", "I", "VIA", "ID", "ia", "IIIIA"] {
            assert!(bad.parse::<EnemyKind>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_kind_ordering_is_level_first() {
        assert!(kind("IC") < kind("IIA"));
        assert!(kind("IIA") < kind("IIB"));
    }

    #[test]
    fn test_catalogue_from_json() {
        let catalogue = EnemyCatalogue::from_json(
            r#"[{"type": "IA", "max_hp": 100, "speed": 10, "power": 10},
                {"type": "IIB", "max_hp": 250, "speed": 8, "power": 25}]"#,
        )
        .unwrap();
        assert_eq!(catalogue.len(), 2);
        let heavy = catalogue.get(kind("IIB")).unwrap();
        assert_eq!(heavy.max_hp, 250);
        assert_eq!(heavy.power, 25);
        assert!(!catalogue.contains(kind("VA")));
        let order: Vec<_> = catalogue.types().map(|t| t.kind.to_string()).collect();
        assert_eq!(order, ["IA", "IIB"]);
    }

    #[test]
    fn test_catalogue_reports_every_problem() {
        let err = EnemyCatalogue::from_json(
            r#"[{"type": "IA", "max_hp": 0, "speed": 10, "power": 10},
                {"type": "IA", "max_hp": 10, "speed": 0, "power": 0}]"#,
        )
        .unwrap_err();
        match err {
            GameError::Config { errors, .. } => assert_eq!(errors.len(), 4),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_catalogue_rejects_unknown_token() {
        let err = EnemyCatalogue::from_json(
            r#"[{"type": "XA", "max_hp": 1, "speed": 1, "power": 1}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, GameError::ConfigParse { .. }));
    }
}
