//! Loading simulation configs from YAML
//!
//! Every field is optional; a missing field takes its default:
//!
//! ```yaml
//! factors:
//!   sample_sizes: [10, 20, 40]
//!   effect_sizes: [0.0, 0.2, 0.5]
//!   outcomes: [post, change]
//!   corrections: [false, true]
//!   iterations: 1000
//! seed: 2024
//! workers: 8
//! ```

use std::fs;
use std::path::Path;

use powersim_core::SimulationConfig;

use crate::storage::StorageError;

/// Parse a config from YAML and check its factor levels
pub fn parse_config(yaml: &str) -> Result<SimulationConfig, StorageError> {
    let config: SimulationConfig =
        serde_saphyr::from_str(yaml).map_err(|e| StorageError::Parse(e.to_string()))?;
    config
        .validate()
        .map_err(|e| StorageError::Parse(format!("Invalid factor levels: {}", e)))?;
    Ok(config)
}

/// Load a config file, or the default design when no path is given
pub fn load_config(path: Option<&Path>) -> Result<SimulationConfig, StorageError> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let content = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use powersim_core::model::Outcome;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config("seed: 7\nfactors:\n  iterations: 12\n").unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.factors.iterations, 12);
        assert_eq!(config.factors.sample_sizes, (4..20).collect::<Vec<_>>());
        assert_eq!(config.factors.outcomes, Outcome::ALL.to_vec());
        assert_eq!(config.workers, None);
        assert!(!config.sequential);
    }

    #[test]
    fn test_full_config() {
        let yaml = "\
factors:
  sample_sizes: [10, 20]
  effect_sizes: [0.0, 0.5]
  outcomes: [change]
  corrections: [true]
  iterations: 3
seed: 11
workers: 2
";
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.factors.cardinality(), 2 * 2 * 1 * 1 * 3);
        assert_eq!(config.factors.outcomes, vec![Outcome::Change]);
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn test_invalid_levels_rejected() {
        let err = parse_config("factors:\n  sample_sizes: []\n").unwrap_err();
        assert!(matches!(err, StorageError::Parse(_)));

        let err = parse_config("factors:\n  sample_sizes: [1, 5]\n").unwrap_err();
        assert!(err.to_string().contains("Invalid factor levels"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sim.yaml");
        fs::write(&path, "seed: 5\n").unwrap();

        assert_eq!(load_config(Some(&path)).unwrap().seed, 5);
        assert_eq!(load_config(None).unwrap(), SimulationConfig::default());
        assert!(matches!(
            load_config(Some(&dir.path().join("missing.yaml"))),
            Err(StorageError::Io(_))
        ));
    }
}
