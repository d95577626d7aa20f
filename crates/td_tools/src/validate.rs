//! Configuration validation.

use std::path::Path;

use crate::loader::{load_catalogue, load_policy, ToolResult};

/// What a successful validation found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Enemy types in the catalogue.
    pub enemy_types: usize,
    /// Power available to wave 1.
    pub first_wave_budget: u64,
    /// Ticks between spawns in wave 1.
    pub first_wave_cadence: u32,
}

/// Load both configuration files and check them together.
///
/// # Errors
///
/// Returns the first file that fails to load; within a file, every
/// violation is listed.
pub fn validate_configs(waves: &Path, types: &Path) -> ToolResult<ValidationSummary> {
    let catalogue = load_catalogue(types)?;
    let policy = load_policy(waves, &catalogue)?;
    let summary = ValidationSummary {
        enemy_types: catalogue.len(),
        first_wave_budget: policy.wave_budget(1)?,
        first_wave_cadence: policy.cadence(1)?,
    };
    let cheapest = policy
        .eligibility(1)?
        .kinds()
        .filter_map(|kind| catalogue.get(kind))
        .map(|enemy| enemy.power)
        .min();
    if cheapest.is_some_and(|power| power > summary.first_wave_budget) {
        tracing::warn!(
            budget = summary.first_wave_budget,
            "Wave 1 cannot afford any enemy and will be empty"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolError;
    use std::fs;
    use tempfile::tempdir;
    use td_test_utils::fixtures::{SAMPLE_CATALOGUE_JSON, SAMPLE_WAVES_JSON};

    #[test]
    fn test_sample_configs_validate() {
        let dir = tempdir().unwrap();
        let waves = dir.path().join("waves.json");
        let types = dir.path().join("types.json");
        fs::write(&waves, SAMPLE_WAVES_JSON).unwrap();
        fs::write(&types, SAMPLE_CATALOGUE_JSON).unwrap();

        let summary = validate_configs(&waves, &types).unwrap();
        assert_eq!(
            summary,
            ValidationSummary {
                enemy_types: 5,
                first_wave_budget: 10,
                first_wave_cadence: 2,
            }
        );
    }

    #[test]
    fn test_shipped_configs_validate() {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/data");
        let summary =
            validate_configs(&data.join("waves.json"), &data.join("enemies.json")).unwrap();
        assert_eq!(summary.enemy_types, 7);
        assert_eq!(summary.first_wave_budget, 10);
        assert_eq!(summary.first_wave_cadence, 2);
    }

    #[test]
    fn test_wave_errors_are_aggregated() {
        let dir = tempdir().unwrap();
        let waves = dir.path().join("waves.json");
        let types = dir.path().join("types.json");
        fs::write(&waves, r#"[{"wave": 0}, {"wave": 2, "rate": -1}]"#).unwrap();
        fs::write(&types, SAMPLE_CATALOGUE_JSON).unwrap();

        let err = validate_configs(&waves, &types).unwrap_err();
        let ToolError::Invalid { source, .. } = err else {
            panic!("expected invalid file error");
        };
        let message = source.to_string();
        assert!(message.contains("below 1"));
        assert!(message.contains("invalid rate"));
        assert!(message.contains("Wave 1 must define types"));
    }
}
