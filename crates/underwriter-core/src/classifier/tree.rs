//! Decision-tree classifier loaded from a serialized model.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::{ClassDistribution, Classification, Classifier, ClassifierError, ProfileFeatures};
use crate::types::InsuranceCategory;

/// Embedded default model.
const DEFAULT_MODEL_JSON: &str = include_str!("../../models/underwriting-tree.json");

/// Deepest tree accepted at load.
const MAX_DEPTH: usize = 64;

/// Errors that can occur when loading a model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    Invalid(String),
}

/// Numeric feature a split node tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CreditScore,
    ClaimsCount,
    Age,
    YearsLicensed,
}

impl Feature {
    fn value(&self, features: &ProfileFeatures) -> f64 {
        match self {
            Feature::CreditScore => features.credit_score,
            Feature::ClaimsCount => features.claims_count,
            Feature::Age => features.age,
            Feature::YearsLicensed => features.years_licensed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBranch {
    pub category: InsuranceCategory,
    pub node: TreeNode,
}

/// Tree node. Split nodes send `value <= threshold` to `below`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: Feature,
        threshold: f64,
        below: Box<TreeNode>,
        above: Box<TreeNode>,
    },
    Category {
        branches: Vec<CategoryBranch>,
        otherwise: Box<TreeNode>,
    },
    Leaf {
        distribution: ClassDistribution,
    },
}

impl TreeNode {
    fn validate(&self, depth: usize) -> Result<(), ModelError> {
        if depth > MAX_DEPTH {
            return Err(ModelError::Invalid(format!("tree deeper than {MAX_DEPTH}")));
        }
        match self {
            TreeNode::Split {
                threshold,
                below,
                above,
                ..
            } => {
                if !threshold.is_finite() {
                    return Err(ModelError::Invalid("split threshold must be finite".into()));
                }
                below.validate(depth + 1)?;
                above.validate(depth + 1)
            }
            TreeNode::Category {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    branch.node.validate(depth + 1)?;
                }
                otherwise.validate(depth + 1)
            }
            TreeNode::Leaf { distribution } => distribution
                .validate()
                .map_err(|e| ModelError::Invalid(e.to_string())),
        }
    }

    fn predict(&self, features: &ProfileFeatures) -> &ClassDistribution {
        let mut node = self;
        loop {
            node = match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    below,
                    above,
                } => {
                    if feature.value(features) <= *threshold {
                        &**below
                    } else {
                        &**above
                    }
                }
                TreeNode::Category {
                    branches,
                    otherwise,
                } => branches
                    .iter()
                    .find(|b| b.category == features.category)
                    .map(|b| &b.node)
                    .unwrap_or(&**otherwise),
                TreeNode::Leaf { distribution } => return distribution,
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TreeModel {
    name: String,
    version: String,
    root: TreeNode,
}

/// [`Classifier`] backed by a decision tree.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    model: TreeModel,
}

impl DecisionTreeClassifier {
    /// The embedded default model.
    pub fn standard() -> Result<Self, ModelError> {
        Self::from_json(DEFAULT_MODEL_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: TreeModel = serde_json::from_str(json)?;
        model.root.validate(0)?;
        Ok(Self { model })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn version(&self) -> &str {
        &self.model.version
    }
}

impl Classifier for DecisionTreeClassifier {
    fn name(&self) -> &str {
        &self.model.name
    }

    fn classify(&self, features: &ProfileFeatures) -> Result<Classification, ClassifierError> {
        let distribution = *self.model.root.predict(features);
        Classification::from_distribution(distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn features(credit: f64, claims: f64, category: InsuranceCategory) -> ProfileFeatures {
        ProfileFeatures {
            credit_score: credit,
            claims_count: claims,
            age: 30.0,
            years_licensed: 5.0,
            category,
        }
    }

    #[test]
    fn test_standard_model_loads() {
        let classifier = DecisionTreeClassifier::standard().unwrap();
        assert_eq!(classifier.name(), "underwriting-tree");
    }

    #[test]
    fn test_standard_model_predictions() {
        let classifier = DecisionTreeClassifier::standard().unwrap();
        let cases = [
            (750.0, 0.0, InsuranceCategory::Auto, Outcome::Approve),
            (800.0, 0.0, InsuranceCategory::Auto, Outcome::Approve),
            (550.0, 3.0, InsuranceCategory::Auto, Outcome::Reject),
            (500.0, 5.0, InsuranceCategory::Auto, Outcome::Reject),
            (650.0, 1.0, InsuranceCategory::Auto, Outcome::Approve),
            (620.0, 2.0, InsuranceCategory::Auto, Outcome::Refer),
            (700.0, 0.0, InsuranceCategory::Home, Outcome::Approve),
            (580.0, 4.0, InsuranceCategory::Home, Outcome::Reject),
            (720.0, 1.0, InsuranceCategory::Life, Outcome::Approve),
            (600.0, 2.0, InsuranceCategory::Health, Outcome::Refer),
        ];
        for (credit, claims, category, expected) in cases {
            let result = classifier.classify(&features(credit, claims, category)).unwrap();
            assert_eq!(
                result.outcome, expected,
                "credit {credit} claims {claims} {category}"
            );
        }
    }

    #[test]
    fn test_category_branch() {
        let json = r#"{
            "name": "t", "version": "1",
            "root": { "category": {
                "branches": [
                    { "category": "home", "node": { "leaf": { "distribution": { "approve": 0, "reject": 1, "refer": 0 } } } }
                ],
                "otherwise": { "leaf": { "distribution": { "approve": 1, "reject": 0, "refer": 0 } } }
            } }
        }"#;
        let classifier = DecisionTreeClassifier::from_json(json).unwrap();
        let home = classifier
            .classify(&features(700.0, 0.0, InsuranceCategory::Home))
            .unwrap();
        assert_eq!(home.outcome, Outcome::Reject);
        let auto = classifier
            .classify(&features(700.0, 0.0, InsuranceCategory::Auto))
            .unwrap();
        assert_eq!(auto.outcome, Outcome::Approve);
    }

    #[test]
    fn test_zero_sum_leaf_rejected() {
        let json = r#"{
            "name": "t", "version": "1",
            "root": { "leaf": { "distribution": { "approve": 0, "reject": 0, "refer": 0 } } }
        }"#;
        assert!(matches!(
            DecisionTreeClassifier::from_json(json),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_model_rejected() {
        assert!(matches!(
            DecisionTreeClassifier::from_json(r#"{ "name": "t" }"#),
            Err(ModelError::JsonError(_))
        ));
    }
}
