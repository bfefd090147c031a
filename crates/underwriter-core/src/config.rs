//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for [`crate::Underwriter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderwritingConfig {
    /// Resolve undecided cases with the classifier instead of scoring
    pub use_classifier: bool,

    /// Rule-set document (YAML or JSON). Embedded standard rules when unset.
    pub rules_path: Option<PathBuf>,

    /// Decision-tree model (JSON). Embedded model when unset.
    pub classifier_model_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: UnderwritingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, UnderwritingConfig::default());
        assert!(!config.use_classifier);
    }

    #[test]
    fn test_parse() {
        let config: UnderwritingConfig =
            serde_yaml::from_str("use_classifier: true\nrules_path: rules/custom.yaml\n").unwrap();
        assert!(config.use_classifier);
        assert_eq!(config.rules_path, Some(PathBuf::from("rules/custom.yaml")));
        assert!(config.classifier_model_path.is_none());
    }
}
